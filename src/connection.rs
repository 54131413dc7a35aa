//! `async-imap` backed session
//!
//! Opens the STARTTLS connection and implements [`MailSession`] on top
//! of the resulting `async-imap` session.

use crate::config::ImapConfig;
use crate::error::{Error, Result};
use crate::session::{
    ALL_MESSAGES, FetchCommand, FetchOptions, FetchRecord, MailSession, RawAddress, RawEnvelope,
};
use async_imap::Session;
use async_imap::types::Fetch;
use futures::{Stream, StreamExt};
use imap_proto::types::{Address, Envelope};
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::WebPkiSupportedAlgorithms;
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{DigitallySignedStruct, SignatureScheme};
use std::pin::Pin;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tokio_util::compat::{Compat, TokioAsyncReadCompatExt};
use tracing::{debug, info};

/// A TLS-wrapped IMAP session.
pub type ImapSession = Session<Compat<tokio_rustls::client::TlsStream<TcpStream>>>;

fn tls_connector() -> Result<TlsConnector> {
    let provider = rustls::crypto::ring::default_provider();
    let verifier = SelfSignedVerifier {
        algorithms: provider.signature_verification_algorithms,
    };
    let config = rustls::ClientConfig::builder_with_provider(Arc::new(provider))
        .with_safe_default_protocol_versions()
        .map_err(|e| Error::Tls(format!("Unsupported protocol versions: {e}")))?
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(verifier))
        .with_no_client_auth();
    Ok(TlsConnector::from(Arc::new(config)))
}

/// Open a fresh TLS-wrapped IMAP session.
///
/// Connects to `config.host:config.port` via TCP, issues STARTTLS,
/// performs the TLS handshake, and logs in.
pub async fn connect(config: &ImapConfig) -> Result<ImapSession> {
    let addr = format!("{}:{}", config.host, config.port);
    debug!("Connecting to IMAP server at {}", addr);

    let tcp_stream = TcpStream::connect(&addr).await?;
    let mut client = async_imap::Client::new(tcp_stream.compat());

    client
        .run_command_and_check_ok("STARTTLS", None)
        .await
        .map_err(|e| Error::Tls(format!("STARTTLS failed: {e}")))?;

    let server_name = ServerName::try_from(config.host.clone())
        .map_err(|e| Error::Tls(format!("Invalid server name: {e}")))?;

    let inner = client.into_inner().into_inner();
    let tls_stream = tls_connector()?
        .connect(server_name, inner)
        .await
        .map_err(|e| Error::Tls(e.to_string()))?;

    let session = async_imap::Client::new(tls_stream.compat())
        .login(&config.username, &config.password)
        .await
        .map_err(|(e, _)| Error::Imap(format!("Login failed: {e}")))?;

    info!(host = %config.host, "Connected to IMAP server");
    Ok(session)
}

type FetchStream<'a> =
    Pin<Box<dyn Stream<Item = async_imap::error::Result<Fetch>> + Send + 'a>>;

/// A FETCH in flight on an [`ImapSession`].
pub struct ImapFetch<'a> {
    responses: FetchStream<'a>,
}

impl MailSession for ImapSession {
    type Command<'a> = ImapFetch<'a>;

    async fn select(&mut self, mailbox: &str) -> Result<u32> {
        let selected = Session::select(self, mailbox).await?;
        Ok(selected.exists)
    }

    async fn fetch_all(&mut self, options: FetchOptions) -> Result<ImapFetch<'_>> {
        let responses = Session::fetch(self, ALL_MESSAGES, options.query()).await?;
        Ok(ImapFetch {
            responses: Box::pin(responses),
        })
    }
}

impl FetchCommand for ImapFetch<'_> {
    async fn next(&mut self) -> Option<Result<FetchRecord>> {
        let item = self.responses.next().await?;
        Some(item.map(|fetch| record_from_fetch(&fetch)).map_err(Error::from))
    }

    async fn release(mut self) -> Result<()> {
        let mut discarded = 0_usize;
        while let Some(item) = self.responses.next().await {
            item?;
            discarded += 1;
        }
        if discarded > 0 {
            debug!(discarded, "discarded unread FETCH responses");
        }
        Ok(())
    }
}

fn record_from_fetch(fetch: &Fetch) -> FetchRecord {
    FetchRecord {
        uid: fetch.uid.unwrap_or(0),
        envelope: fetch.envelope().map(envelope_from_wire),
        body: fetch.body().map(<[u8]>::to_vec),
    }
}

fn envelope_from_wire(envelope: &Envelope<'_>) -> RawEnvelope {
    RawEnvelope {
        date: text(envelope.date.as_deref()),
        subject: text(envelope.subject.as_deref()),
        from: addresses(envelope.from.as_deref()),
        to: addresses(envelope.to.as_deref()),
        cc: addresses(envelope.cc.as_deref()),
        bcc: addresses(envelope.bcc.as_deref()),
        message_id: text(envelope.message_id.as_deref()),
    }
}

fn addresses(list: Option<&[Address<'_>]>) -> Vec<RawAddress> {
    list.unwrap_or_default()
        .iter()
        .map(|addr| RawAddress {
            name: text(addr.name.as_deref()),
            mailbox: text(addr.mailbox.as_deref()),
            host: text(addr.host.as_deref()),
        })
        .collect()
}

fn text(raw: Option<&[u8]>) -> Option<String> {
    raw.map(|bytes| String::from_utf8_lossy(bytes).into_owned())
}

/// Accepts any server certificate but still checks that the handshake
/// is signed by it. Local bridges serve self-signed certificates.
#[derive(Debug)]
struct SelfSignedVerifier {
    algorithms: WebPkiSupportedAlgorithms,
}

impl ServerCertVerifier for SelfSignedVerifier {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> std::result::Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls12_signature(message, cert, dss, &self.algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls13_signature(message, cert, dss, &self.algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.algorithms.supported_schemes()
    }
}
