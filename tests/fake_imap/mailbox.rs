//! Test data model for the fake IMAP server
//!
//! ```ignore
//! let mailbox = MailboxBuilder::new()
//!     .folder("INBOX")
//!         .email(1, raw_rfc2822_bytes)
//!         .without_envelope(2, raw_rfc2822_bytes)
//!         .broken_envelope(3, raw_rfc2822_bytes)
//!     .folder("Archive")
//!     .build();
//! ```
//!
//! The ENVELOPE served for a message is derived from its own headers,
//! the way a real server computes it.

/// A complete account: a collection of named folders.
#[derive(Debug, Clone)]
pub struct Mailbox {
    pub folders: Vec<Folder>,
}

impl Mailbox {
    /// Look up a folder by name (case-sensitive, matching real IMAP).
    pub fn get_folder(&self, name: &str) -> Option<&Folder> {
        self.folders.iter().find(|f| f.name == name)
    }
}

#[derive(Debug, Clone)]
pub struct Folder {
    pub name: String,
    pub emails: Vec<TestEmail>,
}

/// A stored message.
#[derive(Debug, Clone)]
pub struct TestEmail {
    pub uid: u32,
    pub raw: Vec<u8>,
    pub envelope: ServedEnvelope,
}

/// What the server sends as the ENVELOPE item of a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServedEnvelope {
    /// A well-formed ENVELOPE.
    Valid(TestEnvelope),
    /// No ENVELOPE item at all.
    Missing,
    /// An ENVELOPE cut short after the from list, with a bare number
    /// where the sender list should start. Carries the subject to put
    /// in it.
    Broken(Option<String>),
}

/// ENVELOPE fields as the server sends them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestEnvelope {
    pub date: Option<String>,
    pub subject: Option<String>,
    pub from: Vec<(String, String)>,
    pub to: Vec<(String, String)>,
    pub cc: Vec<(String, String)>,
    pub bcc: Vec<(String, String)>,
    pub message_id: Option<String>,
}

impl TestEnvelope {
    /// Derive the envelope from the header block of `raw`.
    pub fn from_headers(raw: &[u8]) -> Self {
        let text = String::from_utf8_lossy(raw);
        let headers = text.split("\r\n\r\n").next().unwrap_or_default();

        let mut envelope = Self::default();
        for line in headers.split("\r\n") {
            let Some((name, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim().to_string();
            match name.to_ascii_lowercase().as_str() {
                "date" => envelope.date = Some(value),
                "subject" => envelope.subject = Some(value),
                "from" => envelope.from = parse_addresses(&value),
                "to" => envelope.to = parse_addresses(&value),
                "cc" => envelope.cc = parse_addresses(&value),
                "bcc" => envelope.bcc = parse_addresses(&value),
                "message-id" => envelope.message_id = Some(value),
                _ => {}
            }
        }
        envelope
    }
}

/// Split `a@b.test, Name <c@d.test>` into `(mailbox, host)` pairs.
fn parse_addresses(value: &str) -> Vec<(String, String)> {
    value
        .split(',')
        .filter_map(|part| {
            let part = part.trim();
            let addr = match (part.find('<'), part.rfind('>')) {
                (Some(start), Some(end)) if start < end => &part[start + 1..end],
                _ => part,
            };
            let (mailbox, host) = addr.split_once('@')?;
            Some((mailbox.to_string(), host.to_string()))
        })
        .collect()
}

/// Builder for constructing a `Mailbox` step by step.
pub struct MailboxBuilder {
    folders: Vec<Folder>,
}

impl MailboxBuilder {
    pub fn new() -> Self {
        Self {
            folders: Vec::new(),
        }
    }

    /// Add a new folder. Subsequent messages go to this folder.
    pub fn folder(mut self, name: &str) -> Self {
        self.folders.push(Folder {
            name: name.to_string(),
            emails: Vec::new(),
        });
        self
    }

    /// Add a message whose ENVELOPE is derived from its headers.
    pub fn email(self, uid: u32, raw: &[u8]) -> Self {
        let envelope = TestEnvelope::from_headers(raw);
        self.push(uid, raw, ServedEnvelope::Valid(envelope))
    }

    /// Add a message the server returns without an ENVELOPE item.
    pub fn without_envelope(self, uid: u32, raw: &[u8]) -> Self {
        self.push(uid, raw, ServedEnvelope::Missing)
    }

    /// Add a message whose ENVELOPE violates the RFC 3501 grammar.
    pub fn broken_envelope(self, uid: u32, raw: &[u8]) -> Self {
        let subject = TestEnvelope::from_headers(raw).subject;
        self.push(uid, raw, ServedEnvelope::Broken(subject))
    }

    /// # Panics
    ///
    /// Panics if called before any `.folder()` call.
    fn push(mut self, uid: u32, raw: &[u8], envelope: ServedEnvelope) -> Self {
        self.folders
            .last_mut()
            .expect("call .folder() before adding messages")
            .emails
            .push(TestEmail {
                uid,
                raw: raw.to_vec(),
                envelope,
            });
        self
    }

    pub fn build(self) -> Mailbox {
        Mailbox {
            folders: self.folders,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_from_headers() {
        let raw = b"From: Alice <alice@example.com>\r\n\
                    To: bob@example.com, carol@example.com\r\n\
                    Subject: Hi\r\n\
                    Message-ID: <1@example.com>\r\n\
                    \r\n\
                    To: not-a-header@example.com";
        let env = TestEnvelope::from_headers(raw);
        assert_eq!(env.from, vec![("alice".into(), "example.com".into())]);
        assert_eq!(env.to.len(), 2);
        assert_eq!(env.subject.as_deref(), Some("Hi"));
        assert_eq!(env.message_id.as_deref(), Some("<1@example.com>"));
        assert!(env.cc.is_empty());
    }
}
