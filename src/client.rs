//! IMAP message stream

use crate::classify::{ErrorClass, classify};
use crate::config::ImapConfig;
use crate::connection::{self, ImapSession};
use crate::error::{Error, Result};
use crate::message::Message;
use crate::session::{FetchCommand, FetchOptions, MailSession};
use std::ops::ControlFlow;
use tracing::{debug, info, instrument, warn};

/// Retrieves messages over a single IMAP session.
pub struct Client<S = ImapSession> {
    session: S,
}

impl Client<ImapSession> {
    /// Connect and log in with `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the TCP connection, STARTTLS upgrade or LOGIN
    /// fails.
    pub async fn connect(config: &ImapConfig) -> Result<Self> {
        let session = connection::connect(config).await?;
        Ok(Self::new(session))
    }

    /// End the session with LOGOUT.
    ///
    /// # Errors
    ///
    /// Returns an error if the server rejects LOGOUT or the connection
    /// is already gone.
    pub async fn logout(mut self) -> Result<()> {
        self.session.logout().await?;
        Ok(())
    }
}

impl<S: MailSession> Client<S> {
    #[must_use]
    pub const fn new(session: S) -> Self {
        Self { session }
    }

    #[must_use]
    pub fn into_inner(self) -> S {
        self.session
    }

    /// Stream every message of `mailbox` into `yield_fn`.
    ///
    /// Each call of `yield_fn` gets either a message or an error, and is
    /// awaited before the next record is read. An error is always the last
    /// element. Returning [`ControlFlow::Break`] stops the stream; no
    /// further element is produced after it.
    ///
    /// Records with a malformed ENVELOPE are logged and skipped, so the
    /// caller may see fewer messages than the mailbox holds. The FETCH is
    /// released on every exit path, leaving the session ready for the
    /// next command.
    #[instrument(skip(self, yield_fn))]
    pub async fn messages<F>(&mut self, mailbox: &str, mut yield_fn: F)
    where
        F: AsyncFnMut(Result<Message>) -> ControlFlow<()>,
    {
        let count = match self.session.select(mailbox).await {
            Ok(count) => count,
            Err(e) => {
                let _ = yield_fn(Err(Error::Select {
                    mailbox: mailbox.to_string(),
                    source: Box::new(e),
                }))
                .await;
                return;
            }
        };

        debug!(event = "imap.mailbox_selected", count, "mailbox selected");

        if count == 0 {
            info!(event = "imap.mailbox_empty", "mailbox is empty");
            return;
        }

        debug!(event = "imap.new_messages", count, "new messages found");

        let mut command = match self.session.fetch_all(FetchOptions::MESSAGES).await {
            Ok(command) => command,
            Err(e) => {
                let _ = yield_fn(Err(Error::Fetch(Box::new(e)))).await;
                return;
            }
        };

        // Set once the consumer can no longer take another element:
        // it cancelled, or it already got the terminal error.
        let mut finished = false;
        loop {
            let msg = match fetch_next(&mut command).await {
                Ok(Some(msg)) => msg,
                Ok(None) => break,
                Err(e) => match classify(&e) {
                    ErrorClass::MalformedEnvelope => {
                        warn!(error = %e, "skipping message due to malformed ENVELOPE");
                        continue;
                    }
                    ErrorClass::Fatal => {
                        let _ = yield_fn(Err(e)).await;
                        finished = true;
                        break;
                    }
                },
            };

            if yield_fn(Ok(msg)).await.is_break() {
                debug!("consumer stopped the stream");
                finished = true;
                break;
            }
        }

        if let Err(e) = command.release().await {
            let malformed = classify(&e) == ErrorClass::MalformedEnvelope;
            if malformed {
                warn!(error = %e, "releasing fetch command failed (malformed ENVELOPE)");
            } else if finished {
                warn!(error = %e, "releasing fetch command failed");
            }
            if !finished {
                let _ = yield_fn(Err(Error::Release {
                    malformed,
                    source: Box::new(e),
                }))
                .await;
            }
        }
    }

    /// Fetch every message of `mailbox` into memory.
    ///
    /// # Errors
    ///
    /// Returns the terminal error of the stream, if any. Messages
    /// streamed before it are dropped.
    pub async fn collect_messages(&mut self, mailbox: &str) -> Result<Vec<Message>> {
        let mut messages = Vec::new();
        let mut failure = None;
        self.messages(mailbox, async |item: Result<Message>| match item {
            Ok(msg) => {
                messages.push(msg);
                ControlFlow::Continue(())
            }
            Err(e) => {
                failure = Some(e);
                ControlFlow::Break(())
            }
        })
        .await;

        match failure {
            Some(e) => Err(e),
            None => Ok(messages),
        }
    }
}

/// Pull the next record from `command` and convert it.
///
/// `Ok(None)` means the command has no more records.
async fn fetch_next<C: FetchCommand>(command: &mut C) -> Result<Option<Message>> {
    let Some(record) = command.next().await else {
        return Ok(None);
    };
    // May carry an ENVELOPE parse error; the caller decides whether to skip.
    let record = record.map_err(|e| Error::Collect(Box::new(e)))?;
    Message::try_from(record).map(Some)
}
