//! Resilient IMAP message retrieval
//!
//! Streams every message of a mailbox, with its raw body and ENVELOPE
//! metadata, over a single IMAP session. Records whose ENVELOPE the
//! server sent in a malformed shape are skipped instead of aborting the
//! whole retrieval. Consumers can stop early; the FETCH is always
//! released so the session stays usable.
//!
//! ```no_run
//! use mailstream::{Client, ImapConfig, Message};
//! use std::ops::ControlFlow;
//!
//! # async fn run() -> mailstream::Result<()> {
//! let mut client = Client::connect(&ImapConfig::from_env()?).await?;
//! client
//!     .messages("INBOX", async |item: mailstream::Result<Message>| match item {
//!         Ok(msg) => {
//!             println!("{} {}", msg.uid, msg.envelope.subject);
//!             ControlFlow::Continue(())
//!         }
//!         Err(e) => {
//!             eprintln!("{e}");
//!             ControlFlow::Break(())
//!         }
//!     })
//!     .await;
//! client.logout().await
//! # }
//! ```

pub mod classify;
mod client;
mod config;
mod connection;
mod error;
mod message;
pub mod session;

pub use client::Client;
pub use config::ImapConfig;
pub use connection::{ImapFetch, ImapSession};
pub use error::{Error, Result};
pub use message::{Envelope, Message};
