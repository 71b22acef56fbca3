//! Composition of the automatic reply

use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::models::MessageDetail;

/// A reply built from an incoming message, ready to be sent once
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingReply {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl OutgoingReply {
    /// Build the reply to `original`: addressed to its sender, subject prefixed with "Re: "
    ///
    /// Missing `From` or `Subject` headers become empty strings.
    pub fn to_message(original: &MessageDetail, body: &str) -> Self {
        let from = original.headers.get("From").unwrap_or("");
        let subject = original.headers.get("Subject").unwrap_or("");

        Self {
            to: single_line(from),
            subject: format!("Re: {}", single_line(subject)),
            body: body.to_string(),
        }
    }

    /// Render as an RFC 2822 plain-text message
    pub fn render(&self) -> String {
        format!(
            "To: {}\r\n\
             Subject: {}\r\n\
             Content-Type: text/plain; charset=\"UTF-8\"\r\n\
             Content-Transfer-Encoding: 7bit\r\n\
             \r\n\
             {}\r\n",
            self.to, self.subject, self.body
        )
    }

    /// Rendered message in standard base64, the form handed to the send call
    pub fn encode(&self) -> String {
        STANDARD.encode(self.render())
    }
}

// Header values are copied into new headers; a stray CR or LF would start a new one
fn single_line(value: &str) -> String {
    value.replace(['\r', '\n'], " ")
}
