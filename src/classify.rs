//! Malformed ENVELOPE detection
//!
//! Some servers emit ENVELOPE structures that do not follow the RFC 3501
//! grammar. The wire parser only notices while materialising a record,
//! and it reports the failure as free text rather than as a typed error.
//! Classification therefore combines two checks:
//!
//! 1. the typed sentinel [`Error::MalformedEnvelope`] anywhere in the
//!    source chain;
//! 2. a table of known parser messages, matched as substrings of every
//!    link's rendered text.
//!
//! A chain holding [`Error::Parse`] is never malformed-only. That error
//! means the wire parser gave up on the connection, so no later record
//! can be read and skipping would silently end the stream.
//!
//! Callers only see [`classify`] and [`is_malformed_envelope`], so the
//! table can change without touching them.

use crate::error::Error;
use std::error::Error as StdError;

/// A parser message known to indicate an unparseable ENVELOPE.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KnownPattern {
    /// The parser that produces the message.
    pub origin: &'static str,
    /// Substring searched for in the rendered error.
    pub pattern: &'static str,
}

/// Compatibility table of wire-parser messages.
///
/// | origin   | example message                                               |
/// |----------|---------------------------------------------------------------|
/// | imapwire | `in response-data: in envelope: imapwire: expected ')', got "7"` |
///
/// Append new rows when a parser version starts reporting the same
/// condition differently. Rows are never removed while servers running
/// the older parser may still be reached.
pub const MALFORMED_ENVELOPE_PATTERNS: &[KnownPattern] = &[
    KnownPattern {
        origin: "imapwire",
        pattern: "in envelope",
    },
    KnownPattern {
        origin: "imapwire",
        pattern: "imapwire: expected ')',",
    },
];

/// How the stream must react to an error raised while fetching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Only the current record is affected; skip it and continue.
    MalformedEnvelope,
    /// The stream cannot continue.
    Fatal,
}

/// Classify a fetch error.
#[must_use]
pub fn classify(err: &Error) -> ErrorClass {
    if is_malformed_envelope(Some(err)) {
        ErrorClass::MalformedEnvelope
    } else {
        ErrorClass::Fatal
    }
}

/// Whether `err` describes a per-record, skippable ENVELOPE defect.
///
/// `None` is never malformed, and neither is a wire parse failure.
#[must_use]
pub fn is_malformed_envelope(err: Option<&(dyn StdError + 'static)>) -> bool {
    if chain(err).any(|link| matches!(own(link), Some(Error::Parse { .. }))) {
        return false;
    }
    chain(err).any(|link| {
        matches!(own(link), Some(Error::MalformedEnvelope { .. }))
            || matches_known_pattern(&link.to_string())
    })
}

fn chain<'a>(
    err: Option<&'a (dyn StdError + 'static)>,
) -> impl Iterator<Item = &'a (dyn StdError + 'static)> {
    std::iter::successors(err, |&link| link.source())
}

fn own<'a>(link: &'a (dyn StdError + 'static)) -> Option<&'a Error> {
    // Boxed sources show up as `Box<Error>` links.
    link.downcast_ref::<Error>()
        .or_else(|| link.downcast_ref::<Box<Error>>().map(|boxed| &**boxed))
}

fn matches_known_pattern(message: &str) -> bool {
    MALFORMED_ENVELOPE_PATTERNS
        .iter()
        .any(|known| message.contains(known.pattern))
}
