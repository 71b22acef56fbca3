//! Gmail API client used by the label resolver and the responder

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use google_gmail1::api::{Label, Message, ModifyMessageRequest};
use std::future::Future;
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::auth::{GmailHub, SCOPE_FULL, SCOPE_LABELS, SCOPE_READONLY, SCOPE_SEND};
use crate::error::{GmailError, Result};
use crate::models::{LabelInfo, MessageDetail, MessageHeaders, NewLabel};

/// Trait defining the Gmail operations the service needs, for easier testing
#[async_trait]
pub trait MailClient: Send + Sync {
    /// List the ids of messages matching a query and carrying all `label_ids`
    async fn list_message_ids(&self, query: &str, label_ids: &[String]) -> Result<Vec<String>>;

    /// Get the full message
    async fn get_message(&self, id: &str) -> Result<MessageDetail>;

    /// List all labels in the account
    async fn list_labels(&self) -> Result<Vec<LabelInfo>>;

    /// Create a new label, returning its id
    async fn create_label(&self, label: &NewLabel) -> Result<String>;

    /// Send a message given as a standard-base64 encoded RFC 2822 document,
    /// returning the id of the sent message
    async fn send_raw(&self, raw: &str) -> Result<String>;

    /// Add and remove labels on a single message
    async fn modify_labels(
        &self,
        message_id: &str,
        add_label_ids: &[String],
        remove_label_ids: &[String],
    ) -> Result<()>;
}

/// Production Gmail client backed by the `google-gmail1` hub
///
/// Every call is bounded by a timeout so a hung request cannot stall a tick forever.
pub struct ProductionGmailClient {
    hub: GmailHub,
    request_timeout: Duration,
}

impl ProductionGmailClient {
    pub fn new(hub: GmailHub, request_timeout: Duration) -> Self {
        Self {
            hub,
            request_timeout,
        }
    }

    async fn with_timeout<T, Fut>(&self, operation_name: &str, call: Fut) -> Result<T>
    where
        Fut: Future<Output = Result<T>>,
    {
        with_timeout(self.request_timeout, operation_name, call).await
    }
}

/// Run an API call, mapping an elapsed timeout to a network error
async fn with_timeout<T, Fut>(timeout: Duration, operation_name: &str, call: Fut) -> Result<T>
where
    Fut: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => {
            warn!("Gmail API {} call timed out after {:?}", operation_name, timeout);
            Err(GmailError::NetworkError(format!(
                "{} timed out after {:?}",
                operation_name, timeout
            )))
        }
    }
}

/// Convert a Gmail API message into our MessageDetail
fn parse_message_detail(msg: Message) -> Result<MessageDetail> {
    let id = msg
        .id
        .ok_or_else(|| GmailError::InvalidMessageFormat("Missing message ID".to_string()))?;

    let headers: MessageHeaders = msg
        .payload
        .and_then(|p| p.headers)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|h| match (h.name, h.value) {
            (Some(name), Some(value)) => Some((name, value)),
            _ => None,
        })
        .collect();

    Ok(MessageDetail {
        id,
        thread_id: msg.thread_id,
        label_ids: msg.label_ids.unwrap_or_default(),
        headers,
    })
}

#[async_trait]
impl MailClient for ProductionGmailClient {
    async fn list_message_ids(&self, query: &str, label_ids: &[String]) -> Result<Vec<String>> {
        let mut all_ids = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut call = self.hub.users().messages_list("me").max_results(100);
            if !query.is_empty() {
                call = call.q(query);
            }
            for label_id in label_ids {
                call = call.add_label_ids(label_id);
            }
            if let Some(token) = page_token.as_ref() {
                call = call.page_token(token);
            }

            let (_, response) = self
                .with_timeout("messages.list", async {
                    Ok(call.add_scope(SCOPE_READONLY).doit().await?)
                })
                .await?;

            all_ids.extend(
                response
                    .messages
                    .unwrap_or_default()
                    .into_iter()
                    .filter_map(|m| m.id),
            );

            page_token = response.next_page_token;
            if page_token.is_none() {
                break;
            }
        }

        debug!("Listed {} messages for query {:?}", all_ids.len(), query);
        Ok(all_ids)
    }

    async fn get_message(&self, id: &str) -> Result<MessageDetail> {
        let (_, msg) = self
            .with_timeout("messages.get", async {
                Ok(self
                    .hub
                    .users()
                    .messages_get("me", id)
                    .format("full")
                    .add_scope(SCOPE_READONLY)
                    .doit()
                    .await?)
            })
            .await?;

        parse_message_detail(msg)
    }

    async fn list_labels(&self) -> Result<Vec<LabelInfo>> {
        let (_, response) = self
            .with_timeout("labels.list", async {
                Ok(self
                    .hub
                    .users()
                    .labels_list("me")
                    .add_scope(SCOPE_LABELS)
                    .doit()
                    .await?)
            })
            .await?;

        let labels: Vec<LabelInfo> = response
            .labels
            .unwrap_or_default()
            .into_iter()
            .filter_map(|label| match (label.id, label.name) {
                (Some(id), Some(name)) => Some(LabelInfo { id, name }),
                _ => None,
            })
            .collect();

        debug!("Successfully parsed {} labels", labels.len());
        Ok(labels)
    }

    async fn create_label(&self, label: &NewLabel) -> Result<String> {
        let request = Label {
            name: Some(label.name.clone()),
            label_list_visibility: Some(label.label_list_visibility.clone()),
            message_list_visibility: Some(label.message_list_visibility.clone()),
            ..Default::default()
        };

        let (_, created_label) = self
            .with_timeout("labels.create", async {
                Ok(self
                    .hub
                    .users()
                    .labels_create(request, "me")
                    .add_scope(SCOPE_LABELS)
                    .doit()
                    .await?)
            })
            .await?;

        created_label
            .id
            .ok_or_else(|| GmailError::LabelError("Created label has no ID".to_string()))
    }

    async fn send_raw(&self, raw: &str) -> Result<String> {
        let bytes = STANDARD.decode(raw).map_err(|e| {
            GmailError::InvalidMessageFormat(format!("Reply is not valid base64: {}", e))
        })?;

        // The media upload endpoint takes the RFC 2822 document as-is
        let (_, sent) = self
            .with_timeout("messages.send", async {
                Ok(self
                    .hub
                    .users()
                    .messages_send(Message::default(), "me")
                    .add_scope(SCOPE_SEND)
                    .upload(
                        Cursor::new(bytes),
                        "message/rfc822".parse().map_err(|e| {
                            GmailError::InvalidMessageFormat(format!("Invalid MIME type: {}", e))
                        })?,
                    )
                    .await?)
            })
            .await?;

        Ok(sent.id.unwrap_or_default())
    }

    async fn modify_labels(
        &self,
        message_id: &str,
        add_label_ids: &[String],
        remove_label_ids: &[String],
    ) -> Result<()> {
        let request = ModifyMessageRequest {
            add_label_ids: (!add_label_ids.is_empty()).then(|| add_label_ids.to_vec()),
            remove_label_ids: (!remove_label_ids.is_empty()).then(|| remove_label_ids.to_vec()),
        };

        self.with_timeout("messages.modify", async {
            Ok(self
                .hub
                .users()
                .messages_modify(request, "me", message_id)
                .add_scope(SCOPE_FULL)
                .doit()
                .await?)
        })
        .await?;

        Ok(())
    }
}

// Allow shared ownership between the responder task and the HTTP server
#[async_trait]
impl<C: MailClient + ?Sized> MailClient for Arc<C> {
    async fn list_message_ids(&self, query: &str, label_ids: &[String]) -> Result<Vec<String>> {
        self.as_ref().list_message_ids(query, label_ids).await
    }

    async fn get_message(&self, id: &str) -> Result<MessageDetail> {
        self.as_ref().get_message(id).await
    }

    async fn list_labels(&self) -> Result<Vec<LabelInfo>> {
        self.as_ref().list_labels().await
    }

    async fn create_label(&self, label: &NewLabel) -> Result<String> {
        self.as_ref().create_label(label).await
    }

    async fn send_raw(&self, raw: &str) -> Result<String> {
        self.as_ref().send_raw(raw).await
    }

    async fn modify_labels(
        &self,
        message_id: &str,
        add_label_ids: &[String],
        remove_label_ids: &[String],
    ) -> Result<()> {
        self.as_ref()
            .modify_labels(message_id, add_label_ids, remove_label_ids)
            .await
    }
}
