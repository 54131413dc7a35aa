//! Error types for mailstream

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IMAP error: {0}")]
    Imap(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TLS error: {0}")]
    Tls(String),

    #[error("selecting mailbox {mailbox} failed: {source}")]
    Select {
        mailbox: String,
        #[source]
        source: Box<Error>,
    },

    #[error("issuing fetch command failed: {0}")]
    Fetch(#[source] Box<Error>),

    #[error("collecting message failed: {0}")]
    Collect(#[source] Box<Error>),

    /// The FETCH command could not be released cleanly.
    ///
    /// `malformed` records whether the failure looked like an ENVELOPE
    /// parse error.
    #[error("releasing fetch command failed{}: {source}", malformed_suffix(*.malformed))]
    Release {
        malformed: bool,
        #[source]
        source: Box<Error>,
    },

    /// The server returned a record without a usable ENVELOPE.
    #[error("malformed IMAP ENVELOPE: uid={uid}")]
    MalformedEnvelope { uid: u32 },

    #[error("message uid is 0")]
    InvalidUid,

    #[error("message {uid} is missing body section")]
    MissingBody { uid: u32 },

    #[error("message {uid} data reader is empty")]
    EmptyBody { uid: u32 },

    /// The wire parser rejected a server response. The connection cannot
    /// be read past it, so this always ends the stream.
    ///
    /// Only the parser's error code and the sequence number of the
    /// rejected FETCH response are kept, never the response bytes.
    #[error("server response could not be parsed{}: {code}", fetch_suffix(*.seq))]
    Parse { seq: Option<u32>, code: String },
}

impl Error {
    /// Whether this error only affects a single record and the stream
    /// may continue past it.
    #[must_use]
    pub fn is_malformed_envelope(&self) -> bool {
        crate::classify::is_malformed_envelope(Some(self))
    }
}

impl From<async_imap::error::Error> for Error {
    fn from(e: async_imap::error::Error) -> Self {
        match e {
            async_imap::error::Error::Io(io) => {
                parse_failure(&io.to_string()).unwrap_or_else(|| Self::Imap(format!("io: {io}")))
            }
            other => Self::Imap(other.to_string()),
        }
    }
}

/// Separates the parser error from the dump of the unparsed buffer in
/// the io error async-imap raises when a response fails to parse.
const PARSE_FAILURE_MARKER: &str = " during parsing of ";

/// Reduce async-imap's parse-failure text to an [`Error::Parse`].
///
/// The text looks like `Error(Error { input: [..], code: Tag }) during
/// parsing of "* 2 FETCH (..."`, where the quoted part is everything the
/// client had buffered. Returns `None` for any other io error.
fn parse_failure(text: &str) -> Option<Error> {
    let (parser, buffered) = text.split_once(PARSE_FAILURE_MARKER)?;

    let code = parser
        .split_once("code: ")
        .map_or("unknown", |(_, rest)| {
            let end = rest
                .find(|c: char| !c.is_ascii_alphanumeric())
                .unwrap_or(rest.len());
            &rest[..end]
        })
        .to_string();

    let seq = buffered
        .trim_start_matches('"')
        .strip_prefix("* ")
        .and_then(|rest| rest.split_once(' '))
        .filter(|(_, rest)| rest.starts_with("FETCH"))
        .and_then(|(num, _)| num.parse().ok());

    Some(Error::Parse { seq, code })
}

const fn malformed_suffix(malformed: bool) -> &'static str {
    if malformed { " (malformed ENVELOPE)" } else { "" }
}

fn fetch_suffix(seq: Option<u32>) -> String {
    seq.map(|n| format!(" (FETCH response {n})"))
        .unwrap_or_default()
}

pub type Result<T> = std::result::Result<T, Error>;
