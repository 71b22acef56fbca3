use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Label id Gmail uses for the inbox
pub const INBOX_LABEL: &str = "INBOX";

/// Header whose presence marks a message as already answered
pub const IN_REPLY_TO_HEADER: &str = "In-Reply-To";

/// Label info returned from Gmail API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelInfo {
    pub id: String,
    pub name: String,
}

/// Request body for creating a label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLabel {
    pub name: String,
    pub label_list_visibility: String,
    pub message_list_visibility: String,
}

impl NewLabel {
    /// A label shown in the label list and in the message list
    pub fn visible(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label_list_visibility: "labelShow".to_string(),
            message_list_visibility: "show".to_string(),
        }
    }
}

/// Ordered header collection with exact, case-sensitive lookups
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageHeaders(Vec<(String, String)>);

impl MessageHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.push((name.into(), value.into()));
    }

    /// Value of the first header named exactly `name`
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(header, _)| header == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

impl<N, V> FromIterator<(N, V)> for MessageHeaders
where
    N: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(n, v)| (n.into(), v.into()))
                .collect(),
        )
    }
}

/// A fetched message as far as the responder cares about it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageDetail {
    pub id: String,
    pub thread_id: Option<String>,
    pub label_ids: Vec<String>,
    pub headers: MessageHeaders,
}

impl MessageDetail {
    /// Whether an earlier reply already exists for this message
    pub fn has_been_replied(&self) -> bool {
        self.headers.contains(IN_REPLY_TO_HEADER)
    }
}

/// Counts for one execution of the reply loop
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickReport {
    pub fetched: usize,
    /// Replies actually sent and relabeled
    pub replied: usize,
    /// Replies a dry run decided on but did not send
    pub would_reply: usize,
    pub already_replied: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Completed(TickReport),
    /// Another tick was still running
    Skipped,
}

/// Snapshot of the responder exposed over HTTP
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResponderStatus {
    pub marker_label_id: String,
    pub dry_run: bool,
    pub in_flight: bool,
    pub ticks_completed: u64,
    pub ticks_failed: u64,
    pub ticks_skipped: u64,
    pub replies_sent: u64,
    /// Times a message was skipped for carrying `In-Reply-To`
    ///
    /// Such messages stay in the inbox, so the same message is counted again
    /// on every tick that lists it.
    pub skipped_already_replied: u64,
    pub last_tick_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub next_delay_secs: Option<u64>,
}

impl ResponderStatus {
    pub fn new(marker_label_id: impl Into<String>, dry_run: bool) -> Self {
        Self {
            marker_label_id: marker_label_id.into(),
            dry_run,
            ..Default::default()
        }
    }
}
