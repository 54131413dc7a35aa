//! LOGIN and LOGOUT handlers.
//!
//! Any credentials are accepted. LOGOUT answers with the untagged BYE
//! before the tagged OK, as RFC 3501 Section 6.1.3 requires.

use crate::fake_imap::io::write_line;
use tokio::io::{AsyncRead, AsyncWrite, BufReader};

/// Handle LOGIN. Returns `false` if the client went away.
pub async fn handle_login<S: AsyncRead + AsyncWrite + Unpin>(
    tag: &str,
    stream: &mut BufReader<S>,
) -> bool {
    write_line(stream, &format!("{tag} OK LOGIN completed\r\n"))
        .await
        .is_ok()
}

/// Handle LOGOUT.
pub async fn handle_logout<S: AsyncRead + AsyncWrite + Unpin>(
    tag: &str,
    stream: &mut BufReader<S>,
) {
    let _ = write_line(stream, &format!("* BYE logging out\r\n{tag} OK LOGOUT completed\r\n")).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, BufReader};

    async fn capture<F, Fut>(handler: F) -> String
    where
        F: FnOnce(BufReader<tokio::io::DuplexStream>) -> Fut,
        Fut: std::future::Future<Output = ()>,
    {
        let (mut client, server) = tokio::io::duplex(1024);
        handler(BufReader::new(server)).await;

        let mut buf = String::new();
        client.read_to_string(&mut buf).await.unwrap();
        buf
    }

    #[tokio::test]
    async fn login_echoes_tag() {
        let output = capture(|mut stream| async move {
            assert!(handle_login("A0001", &mut stream).await);
        })
        .await;
        assert_eq!(output, "A0001 OK LOGIN completed\r\n");
    }

    #[tokio::test]
    async fn logout_sends_bye_before_ok() {
        let output = capture(|mut stream| async move {
            handle_logout("X1", &mut stream).await;
        })
        .await;
        let bye = output.find("* BYE").unwrap();
        let ok = output.find("X1 OK LOGOUT completed").unwrap();
        assert!(bye < ok);
    }
}
