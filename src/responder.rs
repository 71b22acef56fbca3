//! The reply decision loop
//!
//! Each tick lists unread inbox messages, skips those that already carry an
//! `In-Reply-To` header, sends the canned reply to the rest and moves them
//! from the inbox to the marker label. Ticks run one after another on a
//! randomized schedule until shutdown is signalled.

use chrono::Utc;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex, RwLock};
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::client::MailClient;
use crate::config::Config;
use crate::error::Result;
use crate::models::{ResponderStatus, TickOutcome, TickReport, INBOX_LABEL};
use crate::reply::OutgoingReply;

/// Delay between ticks, drawn uniformly from an inclusive range of whole seconds
#[derive(Debug, Clone)]
pub struct PollSchedule {
    min_secs: u64,
    max_secs: u64,
    rerandomize_each_tick: bool,
    current: Duration,
}

impl PollSchedule {
    pub fn new(min_secs: u64, max_secs: u64, rerandomize_each_tick: bool) -> Self {
        let (min_secs, max_secs) = if min_secs <= max_secs {
            (min_secs, max_secs)
        } else {
            (max_secs, min_secs)
        };
        Self {
            min_secs,
            max_secs,
            rerandomize_each_tick,
            current: random_delay(min_secs, max_secs),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.poll.min_delay_secs,
            config.poll.max_delay_secs,
            config.poll.rerandomize_each_tick,
        )
    }

    /// Delay before the next tick
    ///
    /// With `rerandomize_each_tick` off, the delay drawn at construction is reused forever.
    pub fn next_delay(&mut self) -> Duration {
        if self.rerandomize_each_tick {
            self.current = random_delay(self.min_secs, self.max_secs);
        }
        self.current
    }
}

/// Uniform whole-second delay in `[min_secs, max_secs]`
pub fn random_delay(min_secs: u64, max_secs: u64) -> Duration {
    Duration::from_secs(rand::thread_rng().gen_range(min_secs..=max_secs))
}

/// What the responder looks for and what it does with it
#[derive(Debug, Clone)]
pub struct ResponderSettings {
    pub query: String,
    pub label_ids: Vec<String>,
    pub marker_label_id: String,
    pub reply_body: String,
    pub dry_run: bool,
}

impl ResponderSettings {
    pub fn from_config(config: &Config, marker_label_id: impl Into<String>) -> Self {
        Self {
            query: config.poll.query.clone(),
            label_ids: config.poll.label_ids.clone(),
            marker_label_id: marker_label_id.into(),
            reply_body: config.reply.body.clone(),
            dry_run: config.execution.dry_run,
        }
    }
}

/// What happened to a single listed message
enum MessageAction {
    Replied,
    WouldReply,
    AlreadyReplied,
}

pub struct Responder {
    client: Arc<dyn MailClient>,
    settings: ResponderSettings,
    tick_guard: Mutex<()>,
    status: RwLock<ResponderStatus>,
}

impl Responder {
    pub fn new(client: Arc<dyn MailClient>, settings: ResponderSettings) -> Self {
        let status = ResponderStatus::new(&settings.marker_label_id, settings.dry_run);
        Self {
            client,
            settings,
            tick_guard: Mutex::new(()),
            status: RwLock::new(status),
        }
    }

    pub fn settings(&self) -> &ResponderSettings {
        &self.settings
    }

    pub async fn status(&self) -> ResponderStatus {
        self.status.read().await.clone()
    }

    /// Run one tick unless another one is still in flight
    ///
    /// An error aborts the remaining messages of this tick only.
    pub async fn run_tick(&self) -> Result<TickOutcome> {
        let _guard = match self.tick_guard.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                warn!("Previous tick still running, skipping this one");
                self.status.write().await.ticks_skipped += 1;
                return Ok(TickOutcome::Skipped);
            }
        };

        self.status.write().await.in_flight = true;

        let span = info_span!("tick", tick_id = %Uuid::new_v4());
        let result = self.process_inbox().instrument(span).await;

        let mut status = self.status.write().await;
        status.in_flight = false;
        status.last_tick_at = Some(Utc::now());
        match result {
            Ok(report) => {
                status.ticks_completed += 1;
                status.last_error = None;
                Ok(TickOutcome::Completed(report))
            }
            Err(e) => {
                status.ticks_failed += 1;
                status.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    async fn process_inbox(&self) -> Result<TickReport> {
        let message_ids = self
            .client
            .list_message_ids(&self.settings.query, &self.settings.label_ids)
            .await?;

        let mut report = TickReport {
            fetched: message_ids.len(),
            ..Default::default()
        };

        if message_ids.is_empty() {
            debug!("No unread messages");
            return Ok(report);
        }

        info!("Found {} unread messages", message_ids.len());

        for id in &message_ids {
            match self.process_message(id).await? {
                MessageAction::Replied => report.replied += 1,
                MessageAction::WouldReply => report.would_reply += 1,
                MessageAction::AlreadyReplied => report.already_replied += 1,
            }
        }

        Ok(report)
    }

    async fn process_message(&self, id: &str) -> Result<MessageAction> {
        let message = self.client.get_message(id).await?;

        if message.has_been_replied() {
            debug!("Message {} already has a reply, skipping", id);
            self.status.write().await.skipped_already_replied += 1;
            return Ok(MessageAction::AlreadyReplied);
        }

        let reply = OutgoingReply::to_message(&message, &self.settings.reply_body);

        if self.settings.dry_run {
            info!(
                "[dry run] Would reply to message {} (to: {:?}, subject: {:?})",
                id, reply.to, reply.subject
            );
            return Ok(MessageAction::WouldReply);
        }

        let sent_id = self.client.send_raw(&reply.encode()).await?;
        debug!("Sent reply {} for message {}", sent_id, id);

        self.client
            .modify_labels(
                id,
                &[self.settings.marker_label_id.clone()],
                &[INBOX_LABEL.to_string()],
            )
            .await?;

        info!("Replied to message {} from {:?}", id, reply.to);
        self.status.write().await.replies_sent += 1;
        Ok(MessageAction::Replied)
    }

    /// Tick on `schedule` until `shutdown` turns true or its sender is dropped
    ///
    /// The first tick runs after the first delay. A tick in progress is
    /// finished before the loop exits so a sent reply is always relabeled.
    pub async fn run(self: Arc<Self>, mut schedule: PollSchedule, mut shutdown: watch::Receiver<bool>) {
        info!(
            "Reply loop started (marker label: {})",
            self.settings.marker_label_id
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            let delay = schedule.next_delay();
            self.status.write().await.next_delay_secs = Some(delay.as_secs());
            debug!("Next tick in {:?}", delay);

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                    continue;
                }
            }

            match self.run_tick().await {
                Ok(TickOutcome::Completed(report)) => info!(
                    "Tick complete: {} fetched, {} replied, {} would reply, {} already replied",
                    report.fetched, report.replied, report.would_reply, report.already_replied
                ),
                Ok(TickOutcome::Skipped) => {}
                Err(e) => warn!("Tick aborted: {}", e),
            }
        }

        self.status.write().await.next_delay_secs = None;
        info!("Reply loop stopped");
    }
}
