//! Startup and shutdown of the auto-reply service

use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::auth;
use crate::client::{MailClient, ProductionGmailClient};
use crate::config::Config;
use crate::error::Result;
use crate::labels::LabelResolver;
use crate::responder::{PollSchedule, Responder, ResponderSettings};

/// Authenticate against Gmail with the paths from `config`
pub async fn connect(config: &Config) -> Result<Arc<dyn MailClient>> {
    let hub = auth::initialize_gmail_hub(
        &config.auth.credentials_path,
        &config.auth.token_cache_path,
    )
    .await?;
    Ok(Arc::new(ProductionGmailClient::new(
        hub,
        config.poll.request_timeout(),
    )))
}

/// Resolve the marker label and build a responder, without starting the loop
pub async fn prepare_responder(config: &Config, client: Arc<dyn MailClient>) -> Result<Arc<Responder>> {
    let resolver = LabelResolver::new(Arc::clone(&client), &config.reply.label_name);
    let marker_label_id = resolver.ensure_marker_label().await?;

    Ok(Arc::new(Responder::new(
        client,
        ResponderSettings::from_config(config, marker_label_id),
    )))
}

/// The running reply loop and the means to stop it
pub struct ServiceHandle {
    responder: Arc<Responder>,
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl ServiceHandle {
    /// Resolve the marker label and spawn the reply loop
    pub async fn start(config: &Config, client: Arc<dyn MailClient>) -> Result<Self> {
        let responder = prepare_responder(config, client).await?;
        Ok(Self::spawn(responder, PollSchedule::from_config(config)))
    }

    /// Spawn the loop for an already prepared responder
    pub fn spawn(responder: Arc<Responder>, schedule: PollSchedule) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(Arc::clone(&responder).run(schedule, shutdown_rx));
        info!("Auto-reply service started");

        Self {
            responder,
            shutdown_tx,
            task,
        }
    }

    pub fn responder(&self) -> Arc<Responder> {
        Arc::clone(&self.responder)
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Signal the loop to stop and wait for it
    pub async fn shutdown(self) {
        // An error means the loop already exited and dropped its receiver
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.task.await {
            warn!("Reply loop task ended abnormally: {}", e);
        }
        info!("Auto-reply service stopped");
    }
}
