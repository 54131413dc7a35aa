//! Fetched messages
//!
//! [`Message`] is what the stream hands to callers. It is built from a
//! [`FetchRecord`] once the record passed validation.

use crate::error::{Error, Result};
use crate::session::{FetchRecord, RawAddress, RawEnvelope};
use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use std::io::Cursor;
use tracing::debug;

/// One fetched mail item.
#[derive(Debug)]
pub struct Message {
    /// Never zero.
    pub uid: u32,
    /// The complete RFC 822 message, fully buffered.
    pub body: Cursor<Vec<u8>>,
    pub envelope: Envelope,
}

impl Message {
    /// The raw message bytes, regardless of the reader position.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        self.body.get_ref()
    }

    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.body.into_inner()
    }
}

/// Metadata taken from the IMAP ENVELOPE of a message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Envelope {
    /// `None` when the server sent no date or one that is not RFC 2822.
    pub date: Option<DateTime<FixedOffset>>,
    pub subject: String,
    pub from: Vec<String>,
    /// To, then Cc, then Cc again. Bcc is not included.
    pub recipients: Vec<String>,
    pub message_id: String,
}

impl From<RawEnvelope> for Envelope {
    fn from(raw: RawEnvelope) -> Self {
        let recipients = [
            addresses_to_strings(&raw.to),
            addresses_to_strings(&raw.cc),
            addresses_to_strings(&raw.cc),
        ]
        .concat();

        Self {
            date: raw.date.as_deref().and_then(parse_date),
            subject: raw.subject.as_deref().map(decode_header).unwrap_or_default(),
            from: addresses_to_strings(&raw.from),
            recipients,
            message_id: raw.message_id.unwrap_or_default(),
        }
    }
}

impl TryFrom<FetchRecord> for Message {
    type Error = Error;

    fn try_from(record: FetchRecord) -> Result<Self> {
        let uid = record.uid;
        if uid == 0 {
            return Err(Error::InvalidUid);
        }
        let Some(envelope) = record.envelope else {
            return Err(Error::MalformedEnvelope { uid });
        };
        let envelope = Envelope::from(envelope);

        debug!(mail.uid = uid, mail.subject = %envelope.subject, "fetched message");

        let body = record.body.ok_or(Error::MissingBody { uid })?;
        if body.is_empty() {
            return Err(Error::EmptyBody { uid });
        }

        Ok(Self {
            uid,
            body: Cursor::new(body),
            envelope,
        })
    }
}

/// Flatten an address list to bare addresses, dropping display names.
#[must_use]
fn addresses_to_strings(addrs: &[RawAddress]) -> Vec<String> {
    addrs.iter().map(RawAddress::addr).collect()
}

fn parse_date(raw: &str) -> Option<DateTime<FixedOffset>> {
    match DateTime::parse_from_rfc2822(raw.trim()) {
        Ok(date) => Some(date),
        Err(e) => {
            debug!(date = raw, error = %e, "ignoring unparseable envelope date");
            None
        }
    }
}

/// Decode RFC 2047 encoded words, keeping the raw text if decoding fails.
fn decode_header(raw: &str) -> String {
    rfc2047_decoder::decode(raw.as_bytes()).unwrap_or_else(|_| raw.to_string())
}
