//! Session facade
//!
//! The message stream only needs four primitives from an IMAP session:
//! SELECT, a FETCH over the whole mailbox, pulling the next fetched
//! record, and releasing the FETCH once done. [`MailSession`] and
//! [`FetchCommand`] capture exactly that, so the stream logic can be
//! driven by `async-imap` in production and by a scripted session in
//! tests.

use crate::error::Result;
use std::future::Future;

/// Sequence set covering every message of the selected mailbox.
pub const ALL_MESSAGES: &str = "1:*";

/// Data items requested for every message of a FETCH.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchOptions {
    pub envelope: bool,
    pub uid: bool,
    /// Fetch `BODY.PEEK[]`, which leaves `\Seen` untouched.
    pub body_peek: bool,
}

impl FetchOptions {
    /// Everything needed to build a [`crate::Message`].
    pub const MESSAGES: Self = Self {
        envelope: true,
        uid: true,
        body_peek: true,
    };

    /// The parenthesized FETCH attribute list, e.g.
    /// `(UID ENVELOPE BODY.PEEK[])`.
    #[must_use]
    pub fn query(&self) -> String {
        let mut items = Vec::with_capacity(3);
        if self.uid {
            items.push("UID");
        }
        if self.envelope {
            items.push("ENVELOPE");
        }
        if self.body_peek {
            items.push("BODY.PEEK[]");
        }
        format!("({})", items.join(" "))
    }
}

/// One address of an ENVELOPE address list, as sent by the server.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawAddress {
    pub name: Option<String>,
    pub mailbox: Option<String>,
    pub host: Option<String>,
}

impl RawAddress {
    /// The `mailbox@host` form of the address.
    ///
    /// Returns an empty string when either part is missing, which is
    /// also how RFC 3501 group markers render.
    #[must_use]
    pub fn addr(&self) -> String {
        match (self.mailbox.as_deref(), self.host.as_deref()) {
            (Some(mailbox), Some(host)) if !mailbox.is_empty() && !host.is_empty() => {
                format!("{mailbox}@{host}")
            }
            _ => String::new(),
        }
    }
}

/// An ENVELOPE structure before conversion to [`crate::Envelope`].
///
/// String fields hold the raw wire value (RFC 2047 encoded words are not
/// decoded yet).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawEnvelope {
    pub date: Option<String>,
    pub subject: Option<String>,
    pub from: Vec<RawAddress>,
    pub to: Vec<RawAddress>,
    pub cc: Vec<RawAddress>,
    pub bcc: Vec<RawAddress>,
    pub message_id: Option<String>,
}

/// A fully materialised FETCH response for one message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchRecord {
    /// `0` when the server did not send a UID.
    pub uid: u32,
    pub envelope: Option<RawEnvelope>,
    /// The `BODY[]` section.
    pub body: Option<Vec<u8>>,
}

/// A single, stateful IMAP conversation.
///
/// Methods take `&mut self`: a session is never driven by two callers
/// at once.
pub trait MailSession {
    /// An in-progress FETCH. It borrows the session until released.
    type Command<'a>: FetchCommand
    where
        Self: 'a;

    /// SELECT `mailbox` and return its message count.
    fn select(&mut self, mailbox: &str) -> impl Future<Output = Result<u32>> + Send;

    /// Issue one FETCH over [`ALL_MESSAGES`].
    fn fetch_all(
        &mut self,
        options: FetchOptions,
    ) -> impl Future<Output = Result<Self::Command<'_>>> + Send;
}

/// A FETCH command advanced one record at a time.
pub trait FetchCommand {
    /// The next record, `None` once the server completed the command.
    ///
    /// `Some(Err(_))` means the record could not be materialised; the
    /// command may still have further records.
    fn next(&mut self) -> impl Future<Output = Option<Result<FetchRecord>>> + Send;

    /// Finish the command, consuming every response still pending so the
    /// session can issue the next command.
    fn release(self) -> impl Future<Output = Result<()>> + Send;
}
