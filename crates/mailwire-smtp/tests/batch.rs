//! Batch submission tests against a scripted mock stream.
//!
//! The mock serves a fixed sequence of replies and captures everything the
//! client writes; because the client is strictly one-command-at-a-time, a
//! single response script covers an entire session.

use std::io::{self, Cursor};
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

use mailwire_mime::OutgoingMessage;
use mailwire_smtp::{Authenticated, Client, Connected, submit_batch};

const TIMEOUT: Duration = Duration::from_secs(5);

/// Mock stream that returns predefined responses and records sent bytes.
struct MockStream {
    responses: Cursor<Vec<u8>>,
    sent: Arc<Mutex<Vec<u8>>>,
}

impl MockStream {
    fn new(responses: &[u8]) -> (Self, Arc<Mutex<Vec<u8>>>) {
        let sent = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                responses: Cursor::new(responses.to_vec()),
                sent: Arc::clone(&sent),
            },
            sent,
        )
    }
}

impl AsyncRead for MockStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let pos = usize::try_from(self.responses.position()).unwrap_or(usize::MAX);
        let data = self.responses.get_ref().clone();

        if pos >= data.len() {
            // Script exhausted: behave like a closed connection.
            return Poll::Ready(Ok(()));
        }

        let remaining = &data[pos..];
        let to_read = remaining.len().min(buf.remaining());
        buf.put_slice(&remaining[..to_read]);
        self.responses.set_position((pos + to_read) as u64);

        Poll::Ready(Ok(()))
    }
}

impl AsyncWrite for MockStream {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        self.sent.lock().unwrap().extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

/// Drives the handshake to the authenticated state over the given script.
async fn authenticated_client(
    script: &[u8],
) -> (Client<MockStream, Authenticated>, Arc<Mutex<Vec<u8>>>) {
    let (stream, sent) = MockStream::new(script);
    let client = Client::<MockStream, Connected>::from_stream(stream, TIMEOUT)
        .await
        .unwrap();
    let client = client.ehlo("localhost").await.unwrap();
    let client = client.auth_login("user", "pass").await.unwrap();
    (client, sent)
}

const HANDSHAKE: &str = concat!(
    "220 smtp.example.com ready\r\n",
    "250-smtp.example.com\r\n250 AUTH LOGIN\r\n",
    "334 VXNlcm5hbWU6\r\n",
    "334 UGFzc3dvcmQ6\r\n",
    "235 ok\r\n",
);

fn message(to: &str) -> OutgoingMessage {
    OutgoingMessage::new("subject").to(to).text("body")
}

#[tokio::test]
async fn rejected_recipient_fails_only_its_own_message() {
    let script = format!(
        "{HANDSHAKE}{}",
        concat!(
            // message 1: accepted
            "250 sender ok\r\n250 rcpt ok\r\n354 go ahead\r\n250 queued as 1\r\n",
            // message 2: recipient rejected, then RSET accepted
            "250 sender ok\r\n550 5.1.1 no such user\r\n250 reset\r\n",
            // message 3: accepted
            "250 sender ok\r\n250 rcpt ok\r\n354 go ahead\r\n250 queued as 3\r\n",
            "221 bye\r\n",
        )
    );

    let (client, sent) = authenticated_client(script.as_bytes()).await;
    let messages = vec![
        message("one@example.com"),
        message("gone@example.com"),
        message("three@example.com"),
    ];

    let results = submit_batch(client, &messages, "noreply@example.com", "example.com").await;

    assert_eq!(results.len(), 3);

    assert!(results[0].success);
    assert!(results[0].attempted);
    assert_eq!(results[0].response.as_deref(), Some("queued as 1"));
    assert!(results[0].message_id.is_some());

    assert!(!results[1].success);
    assert!(results[1].attempted);
    assert!(results[1].error.as_deref().unwrap().contains("no such user"));

    assert!(results[2].success);
    assert_eq!(results[2].response.as_deref(), Some("queued as 3"));

    // The failed transaction was reset, and the session closed cleanly.
    let wire = String::from_utf8_lossy(&sent.lock().unwrap()).into_owned();
    assert!(wire.contains("RSET\r\n"));
    assert!(wire.contains("RCPT TO:<three@example.com>\r\n"));
    assert!(wire.ends_with("QUIT\r\n"));
}

#[tokio::test]
async fn dead_connection_marks_remaining_unattempted() {
    // Script ends right after message 1, so the client sees EOF when it
    // waits for message 2's MAIL FROM reply.
    let script = format!(
        "{HANDSHAKE}{}",
        "250 sender ok\r\n250 rcpt ok\r\n354 go ahead\r\n250 queued as 1\r\n",
    );

    let (client, sent) = authenticated_client(script.as_bytes()).await;
    let messages = vec![
        message("one@example.com"),
        message("two@example.com"),
        message("three@example.com"),
    ];

    let results = submit_batch(client, &messages, "noreply@example.com", "example.com").await;

    assert!(results[0].success);

    // Message 2 was attempted and hit the dead connection.
    assert!(!results[1].success);
    assert!(results[1].attempted);
    let connection_error = results[1].error.clone().unwrap();

    // Message 3 was never attempted and carries the same connection error.
    assert!(!results[2].success);
    assert!(!results[2].attempted);
    assert!(results[2].message_id.is_none());
    assert_eq!(results[2].error.as_deref(), Some(connection_error.as_str()));

    // Nothing was written for message 3, and no QUIT on a dead connection.
    let wire = String::from_utf8_lossy(&sent.lock().unwrap()).into_owned();
    assert!(!wire.contains("RCPT TO:<three@example.com>"));
    assert!(!wire.contains("QUIT"));
}

#[tokio::test]
async fn message_without_recipients_fails_locally() {
    let script = format!(
        "{HANDSHAKE}{}",
        concat!(
            // Only message 2 touches the wire.
            "250 sender ok\r\n250 rcpt ok\r\n354 go ahead\r\n250 queued\r\n",
            "221 bye\r\n",
        )
    );

    let (client, _sent) = authenticated_client(script.as_bytes()).await;
    let messages = vec![
        OutgoingMessage::new("no recipients").text("body"),
        message("ok@example.com"),
    ];

    let results = submit_batch(client, &messages, "noreply@example.com", "example.com").await;

    assert!(!results[0].success);
    assert!(results[0].attempted);
    assert!(results[0].error.as_deref().unwrap().contains("recipients"));
    assert!(results[1].success);
}

#[tokio::test]
async fn sent_data_is_dot_stuffed_and_terminated() {
    let script = format!(
        "{HANDSHAKE}{}",
        "250 ok\r\n250 ok\r\n354 go\r\n250 queued\r\n221 bye\r\n"
    );

    let (mut client, sent) = authenticated_client(script.as_bytes()).await;
    let msg = OutgoingMessage::new("dots")
        .to("a@example.com")
        .text(".leading dot\r\nplain line");

    let result = client
        .send_mail(&msg, "Notify <noreply@example.com>", "example.com")
        .await;
    assert!(result.success);
    let _ = client.quit().await;

    let wire = String::from_utf8_lossy(&sent.lock().unwrap()).into_owned();
    // Envelope uses the bare address extracted from the display form.
    assert!(wire.contains("MAIL FROM:<noreply@example.com>\r\n"));
    assert!(wire.contains("RCPT TO:<a@example.com>\r\n"));
    // The leading dot is doubled on the wire, and the body is terminated
    // by the lone-dot line.
    assert!(wire.contains("\r\n..leading dot\r\n"));
    assert!(wire.contains("\r\n.\r\nQUIT\r\n"));
}
