//! Gmail Auto-Reply Service
//!
//! Watches a single Gmail inbox and answers each unread conversation that has
//! not been replied to yet with a fixed vacation message. Answered messages are
//! moved out of the inbox and tagged with a marker label so they are never
//! answered twice.
//!
//! # Overview
//!
//! - **Authentication**: OAuth2 installed-app flow with token caching
//! - **Label Resolution**: The marker label is created once or looked up by name
//! - **Reply Loop**: Unread inbox messages are processed on a randomized schedule
//! - **Status Endpoint**: A small HTTP server reports the loop's progress
//!
//! # Example Usage
//!
//! ```no_run
//! use gmail_autoreply::{config::Config, service, ServiceHandle};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml".as_ref()).await?;
//!
//!     // Authenticate and resolve the marker label
//!     let client = service::connect(&config).await?;
//!     let handle = ServiceHandle::start(&config, client).await?;
//!
//!     tokio::signal::ctrl_c().await?;
//!     handle.shutdown().await;
//!     Ok(())
//! }
//! ```
//!
//! # Module Organization
//!
//! - [`auth`] - OAuth2 authentication and Gmail API initialization
//! - [`client`] - Gmail API client trait and production implementation
//! - [`cli`] - Command-line interface and command runners
//! - [`config`] - Configuration management
//! - [`error`] - Error types and result aliases
//! - [`labels`] - Marker label creation and lookup
//! - [`models`] - Core data structures
//! - [`reply`] - Reply message construction
//! - [`responder`] - Polling schedule and per-tick reply logic
//! - [`server`] - HTTP status endpoint
//! - [`service`] - Service startup and shutdown

pub mod auth;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod labels;
pub mod models;
pub mod reply;
pub mod responder;
pub mod server;
pub mod service;

// Re-export commonly used types for convenience
pub use error::{GmailError, Result};

// Core data models
pub use models::{
    LabelInfo, MessageDetail, MessageHeaders, NewLabel, ResponderStatus, TickOutcome, TickReport,
};

// Config types
pub use config::{AuthConfig, Config, ExecutionConfig, PollConfig, ReplyConfig, ServerConfig};

// Client traits
pub use client::{MailClient, ProductionGmailClient};

// Service types
pub use labels::LabelResolver;
pub use reply::OutgoingReply;
pub use responder::{PollSchedule, Responder, ResponderSettings};
pub use service::ServiceHandle;

// CLI types (for binary usage)
pub use cli::{Cli, Commands};
