//! Common test utilities and fixtures

#![allow(dead_code)]

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use gmail_autoreply::client::MailClient;
use gmail_autoreply::error::Result;
use gmail_autoreply::models::{LabelInfo, MessageDetail, NewLabel};
use gmail_autoreply::responder::{Responder, ResponderSettings};
use mockall::mock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

pub const MARKER_LABEL_ID: &str = "Label_7";

/// Create a message carrying the given headers
pub fn message_with_headers(id: &str, headers: &[(&str, &str)]) -> MessageDetail {
    MessageDetail {
        id: id.to_string(),
        thread_id: Some(format!("thread_{}", id)),
        label_ids: vec!["INBOX".to_string(), "UNREAD".to_string()],
        headers: headers.iter().copied().collect(),
    }
}

/// Create a fresh message from `from` with `subject`
pub fn create_test_message(id: &str, from: &str, subject: &str) -> MessageDetail {
    message_with_headers(id, &[("From", from), ("Subject", subject)])
}

/// Create a message that is itself a reply
pub fn create_replied_message(id: &str) -> MessageDetail {
    message_with_headers(
        id,
        &[
            ("From", "b@y.com"),
            ("Subject", "Re: Hi"),
            ("In-Reply-To", "<original@y.com>"),
        ],
    )
}

pub fn create_test_label_info(id: &str, name: &str) -> LabelInfo {
    LabelInfo {
        id: id.to_string(),
        name: name.to_string(),
    }
}

pub fn test_settings(dry_run: bool) -> ResponderSettings {
    ResponderSettings {
        query: "is:unread".to_string(),
        label_ids: vec!["INBOX".to_string()],
        marker_label_id: MARKER_LABEL_ID.to_string(),
        reply_body: "Away until Monday.".to_string(),
        dry_run,
    }
}

pub fn responder_with(client: impl MailClient + 'static, dry_run: bool) -> Arc<Responder> {
    Arc::new(Responder::new(Arc::new(client), test_settings(dry_run)))
}

/// Decode a raw message handed to `send_raw`
pub fn decode_raw(raw: &str) -> String {
    let bytes = STANDARD.decode(raw).expect("raw message is not standard base64");
    String::from_utf8(bytes).expect("raw message is not UTF-8")
}

// Mock implementation of MailClient for testing
mock! {
    pub MailClient {}

    #[async_trait]
    impl MailClient for MailClient {
        async fn list_message_ids(&self, query: &str, label_ids: &[String]) -> Result<Vec<String>>;
        async fn get_message(&self, id: &str) -> Result<MessageDetail>;
        async fn list_labels(&self) -> Result<Vec<LabelInfo>>;
        async fn create_label(&self, label: &NewLabel) -> Result<String>;
        async fn send_raw(&self, raw: &str) -> Result<String>;
        async fn modify_labels(&self, message_id: &str, add_label_ids: &[String], remove_label_ids: &[String]) -> Result<()>;
    }
}

/// Client whose first listing blocks until released
///
/// Later listings return immediately with no messages.
#[derive(Default)]
pub struct GatedClient {
    pub started: Notify,
    pub release: Notify,
    gated: AtomicBool,
}

#[async_trait]
impl MailClient for GatedClient {
    async fn list_message_ids(&self, _query: &str, _label_ids: &[String]) -> Result<Vec<String>> {
        if !self.gated.swap(true, Ordering::SeqCst) {
            self.started.notify_one();
            self.release.notified().await;
        }
        Ok(Vec::new())
    }

    async fn get_message(&self, id: &str) -> Result<MessageDetail> {
        Ok(create_test_message(id, "a@x.com", "Hi"))
    }

    async fn list_labels(&self) -> Result<Vec<LabelInfo>> {
        Ok(Vec::new())
    }

    async fn create_label(&self, _label: &NewLabel) -> Result<String> {
        Ok(MARKER_LABEL_ID.to_string())
    }

    async fn send_raw(&self, _raw: &str) -> Result<String> {
        Ok("sent".to_string())
    }

    async fn modify_labels(&self, _message_id: &str, _add: &[String], _remove: &[String]) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_test_message() {
        let message = create_test_message("m1", "a@x.com", "Hi");
        assert_eq!(message.headers.get("From"), Some("a@x.com"));
        assert_eq!(message.headers.get("Subject"), Some("Hi"));
        assert!(!message.has_been_replied());
    }

    #[test]
    fn test_create_replied_message() {
        assert!(create_replied_message("m2").has_been_replied());
    }
}
