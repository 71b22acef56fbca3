//! Marker label resolution
use std::sync::Arc;

use crate::client::MailClient;
use crate::error::{GmailError, Result};
use crate::models::NewLabel;
use tracing::{debug, info};

/// Ensures the label applied to answered messages exists
pub struct LabelResolver {
    client: Arc<dyn MailClient>,
    label_name: String,
}

impl LabelResolver {
    pub fn new(client: Arc<dyn MailClient>, label_name: impl Into<String>) -> Self {
        Self {
            client,
            label_name: label_name.into(),
        }
    }

    pub fn label_name(&self) -> &str {
        &self.label_name
    }

    /// Returns the marker label id, creating the label on first use
    ///
    /// Creation is attempted first. If Gmail reports a conflict the label
    /// already exists, and its id is looked up by exact name. Any other
    /// failure is returned unchanged.
    pub async fn ensure_marker_label(&self) -> Result<String> {
        match self
            .client
            .create_label(&NewLabel::visible(&self.label_name))
            .await
        {
            Ok(label_id) => {
                info!(
                    "Created marker label '{}' with ID: {}",
                    self.label_name, label_id
                );
                Ok(label_id)
            }
            Err(e) if e.is_conflict() => {
                debug!(
                    "Marker label '{}' already exists, looking up its ID",
                    self.label_name
                );
                self.find_existing().await
            }
            Err(e) => Err(e),
        }
    }

    async fn find_existing(&self) -> Result<String> {
        let labels = self.client.list_labels().await?;

        let label = labels
            .into_iter()
            .find(|label| label.name == self.label_name)
            .ok_or_else(|| {
                GmailError::LabelError(format!(
                    "Label '{}' reported as existing but not found in label list",
                    self.label_name
                ))
            })?;

        info!(
            "Using existing marker label '{}' with ID: {}",
            self.label_name, label.id
        );
        Ok(label.id)
    }
}
