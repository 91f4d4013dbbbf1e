//! Integration tests for the IMAP client.
//!
//! A scripted mock stream simulates server responses without a network
//! connection; captured writes let the tests pin the exact wire commands.

use std::io::{self, Cursor};
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

use mailwire_imap::{Authenticated, Client, NotAuthenticated, Selected, Uid};

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

const GREETING: &str = "* OK [CAPABILITY IMAP4rev1 STARTTLS AUTH=LOGIN] ready\r\n";

/// Drives greeting + LOGIN; the mock script must answer tag A0000.
async fn authenticated_client(
    script: &str,
) -> (Client<MockStream, Authenticated>, Arc<Mutex<Vec<u8>>>) {
    let (stream, sent) = MockStream::new(script.as_bytes());
    let client = Client::<MockStream, NotAuthenticated>::from_stream(stream, TIMEOUT)
        .await
        .unwrap();

    assert!(client.supports_starttls());

    let client = client.login("user@example.com", "password").await.unwrap();
    (client, sent)
}

/// Builds a FETCH line carrying a header summary for one message.
fn fetch_line(seq: u32, uid: u32, subject: &str) -> String {
    format!(
        "* {seq} FETCH (UID {uid} FLAGS (\\Seen) \
         ENVELOPE (NIL \"{subject}\" ((NIL NIL \"ann\" \"x.org\")) NIL NIL \
         ((NIL NIL \"bob\" \"y.org\")) NIL NIL NIL \"<m{uid}@x.org>\") \
         RFC822.SIZE 512)\r\n"
    )
}

#[tokio::test]
async fn login_and_select_parse_mailbox_info() {
    let script = format!(
        "{GREETING}{}",
        concat!(
            "A0000 OK LOGIN completed\r\n",
            "* 25 EXISTS\r\n",
            "* 1 RECENT\r\n",
            "* FLAGS (\\Seen \\Deleted)\r\n",
            "* OK [UIDVALIDITY 1644312381] UIDs valid\r\n",
            "* OK [UIDNEXT 126] next\r\n",
            "A0001 OK [READ-WRITE] SELECT completed\r\n",
        )
    );

    let (client, sent) = authenticated_client(&script).await;
    let client = client.select("INBOX").await.unwrap();

    let info = client.info();
    assert_eq!(info.name, "INBOX");
    assert_eq!(info.exists, 25);
    assert_eq!(info.uid_next.unwrap().get(), 126);
    assert!(!info.read_only);

    let wire = String::from_utf8_lossy(&sent.lock().unwrap()).into_owned();
    assert!(wire.contains("A0000 LOGIN \"user@example.com\" \"password\"\r\n"));
    assert!(wire.contains("A0001 SELECT INBOX\r\n"));
}

#[tokio::test]
async fn fetch_page_returns_newest_first() {
    // 25 messages; page of the 10 newest maps to sequence range 16:25.
    let mut script = format!(
        "{GREETING}{}",
        "A0000 OK done\r\n* 25 EXISTS\r\nA0001 OK [READ-WRITE] done\r\n"
    );
    for seq in 16..=25 {
        script.push_str(&fetch_line(seq, 100 + seq, &format!("msg {seq}")));
    }
    script.push_str("A0002 OK FETCH completed\r\n");

    let (client, sent) = authenticated_client(&script).await;
    let mut client = client.select("INBOX").await.unwrap();

    let headers = client.fetch_page(0, 10).await.unwrap();

    let wire = String::from_utf8_lossy(&sent.lock().unwrap()).into_owned();
    assert!(wire.contains("A0002 FETCH 16:25 (UID FLAGS ENVELOPE RFC822.SIZE)\r\n"));

    // Newest (highest sequence) first.
    assert_eq!(headers.len(), 10);
    let uids: Vec<u32> = headers.iter().map(|h| h.uid.get()).collect();
    assert_eq!(uids, vec![125, 124, 123, 122, 121, 120, 119, 118, 117, 116]);
    assert_eq!(headers[0].envelope.subject.as_deref(), Some("msg 25"));
    assert_eq!(headers[0].envelope.from[0].email().unwrap(), "ann@x.org");
}

#[tokio::test]
async fn fetch_page_clamps_to_oldest_message() {
    // 25 messages, offset 20: the remaining 5 oldest map to range 1:5.
    let mut script = format!(
        "{GREETING}{}",
        "A0000 OK done\r\n* 25 EXISTS\r\nA0001 OK done\r\n"
    );
    for seq in 1..=5 {
        script.push_str(&fetch_line(seq, 100 + seq, &format!("msg {seq}")));
    }
    script.push_str("A0002 OK FETCH completed\r\n");

    let (client, sent) = authenticated_client(&script).await;
    let mut client = client.select("INBOX").await.unwrap();

    let headers = client.fetch_page(20, 10).await.unwrap();

    let wire = String::from_utf8_lossy(&sent.lock().unwrap()).into_owned();
    assert!(wire.contains("A0002 FETCH 1:5 (UID FLAGS ENVELOPE RFC822.SIZE)\r\n"));

    assert_eq!(headers.len(), 5);
    let uids: Vec<u32> = headers.iter().map(|h| h.uid.get()).collect();
    assert_eq!(uids, vec![105, 104, 103, 102, 101]);
}

#[tokio::test]
async fn fetch_page_past_the_end_is_empty() {
    let script = format!(
        "{GREETING}{}",
        "A0000 OK done\r\n* 25 EXISTS\r\nA0001 OK done\r\n"
    );

    let (client, sent) = authenticated_client(&script).await;
    let mut client = client.select("INBOX").await.unwrap();

    let headers = client.fetch_page(30, 10).await.unwrap();
    assert!(headers.is_empty());

    // No FETCH command was issued.
    let wire = String::from_utf8_lossy(&sent.lock().unwrap()).into_owned();
    assert!(!wire.contains("FETCH"));
}

#[tokio::test]
async fn search_recipients_builds_or_chain_and_sorts_descending() {
    let script = format!(
        "{GREETING}{}",
        concat!(
            "A0000 OK done\r\n* 25 EXISTS\r\nA0001 OK done\r\n",
            "* SEARCH 40 10 30 20\r\n",
            "A0002 OK SEARCH completed\r\n",
        )
    );

    let (client, sent) = authenticated_client(&script).await;
    let mut client = client.select("INBOX").await.unwrap();

    let recipients = vec![
        "a@x".to_string(),
        "b@y".to_string(),
        "c@z".to_string(),
    ];
    let uids = client.search_recipients(&recipients).await.unwrap();

    let wire = String::from_utf8_lossy(&sent.lock().unwrap()).into_owned();
    assert!(wire.contains(
        "A0002 UID SEARCH OR (OR (TO \"a@x\") (TO \"b@y\")) (TO \"c@z\")\r\n"
    ));

    let got: Vec<u32> = uids.iter().map(|u| u.get()).collect();
    assert_eq!(got, vec![40, 30, 20, 10]);
}

#[tokio::test]
async fn fetch_body_sections_extracts_literals() {
    // The TEXT literal deliberately contains CRLFs and a line that looks
    // like a tagged completion.
    let text = "line one\r\nA0002 OK fake\r\nline two";
    let header = "Subject: =?utf-8?B?SMOpbGxv?=\r\nFrom: ann@x.org\r\n\r\n";
    let script = format!(
        "{GREETING}A0000 OK done\r\n* 25 EXISTS\r\nA0001 OK done\r\n\
         * 5 FETCH (UID 42 BODY[HEADER] {{{header_len}}}\r\n{header} BODY[TEXT] {{{text_len}}}\r\n{text})\r\n\
         A0002 OK FETCH completed\r\n",
        header_len = header.len(),
        text_len = text.len(),
    );

    let (client, sent) = authenticated_client(&script).await;
    let mut client = client.select("INBOX").await.unwrap();

    let sections = client
        .fetch_body_sections(Uid::new(42).unwrap())
        .await
        .unwrap();

    assert_eq!(sections.header.as_deref(), Some(header.as_bytes()));
    assert_eq!(sections.text.as_deref(), Some(text.as_bytes()));

    let wire = String::from_utf8_lossy(&sent.lock().unwrap()).into_owned();
    assert!(wire.contains("A0002 UID FETCH 42 (BODY[HEADER] BODY[TEXT])\r\n"));
}

#[tokio::test]
async fn mark_read_and_delete_flows() {
    let script = format!(
        "{GREETING}{}",
        concat!(
            "A0000 OK done\r\n* 25 EXISTS\r\nA0001 OK done\r\n",
            // mark_read
            "* 5 FETCH (UID 42 FLAGS (\\Seen))\r\nA0002 OK STORE completed\r\n",
            // delete: store then expunge
            "A0003 OK STORE completed\r\n",
            "* 5 EXPUNGE\r\n* 24 EXISTS\r\nA0004 OK EXPUNGE completed\r\n",
        )
    );

    let (client, sent) = authenticated_client(&script).await;
    let mut client = client.select("INBOX").await.unwrap();

    let uid = Uid::new(42).unwrap();
    client.mark_read(uid).await.unwrap();
    client.delete_message(uid).await.unwrap();

    let wire = String::from_utf8_lossy(&sent.lock().unwrap()).into_owned();
    assert!(wire.contains("A0002 UID STORE 42 +FLAGS (\\Seen)\r\n"));
    assert!(wire.contains("A0003 UID STORE 42 +FLAGS (\\Deleted)\r\n"));
    assert!(wire.contains("A0004 EXPUNGE\r\n"));
}

#[tokio::test]
async fn store_rejection_surfaces_server_text() {
    let script = format!(
        "{GREETING}{}",
        concat!(
            "A0000 OK done\r\n* 25 EXISTS\r\nA0001 OK done\r\n",
            "A0002 NO [READ-ONLY] mailbox is read-only\r\n",
        )
    );

    let (client, _sent) = authenticated_client(&script).await;
    let mut client: Client<MockStream, Selected> = client.select("INBOX").await.unwrap();

    let err = client.mark_read(Uid::new(1).unwrap()).await.unwrap_err();
    assert!(err.to_string().contains("read-only"));
}

#[tokio::test]
async fn list_mailboxes() {
    let script = format!(
        "{GREETING}{}",
        concat!(
            "A0000 OK done\r\n",
            "* LIST (\\HasNoChildren) \"/\" \"INBOX\"\r\n",
            "* LIST (\\HasChildren \\Noselect) \"/\" \"[Gmail]\"\r\n",
            "* LIST (\\HasNoChildren) \"/\" \"[Gmail]/Sent Mail\"\r\n",
            "A0001 OK LIST completed\r\n",
        )
    );

    let (mut client, sent) = authenticated_client(&script).await;
    let entries = client.list("", "*").await.unwrap();

    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].mailbox.as_str(), "INBOX");
    assert!(!entries[1].is_selectable());
    assert_eq!(entries[2].mailbox.as_str(), "[Gmail]/Sent Mail");

    let wire = String::from_utf8_lossy(&sent.lock().unwrap()).into_owned();
    assert!(wire.contains("A0001 LIST \"\" \"*\"\r\n"));
}
