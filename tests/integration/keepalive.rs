//! Integration tests for the keepalive auto-responder.
//!
//! Verifies over loopback TCP:
//! 1. `PING :tmi.twitch.tv` is answered with exactly `PONG\r\n`.
//! 2. Every ping gets its own reply, without echoing the payload.
//! 3. Lines that merely contain `PING` are not answered.
//! 4. Replies and typed lines share one ordered outbound stream.

use std::io::{BufReader, Cursor, Read};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};

use rawchat::app;
use rawchat::config::{ClientConfig, ServerConfig, SessionConfig};
use rawchat::session::{self, ShutdownReason};

const STEP_TIMEOUT: Duration = Duration::from_secs(5);

/// Local input that never produces a line and never ends.
struct IdleInput;

impl Read for IdleInput {
    fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
        loop {
            std::thread::park();
        }
    }
}

type SessionHandle = tokio::task::JoinHandle<std::io::Result<ShutdownReason>>;

async fn start_session<I>(
    input: I,
) -> (tokio::io::BufReader<OwnedReadHalf>, OwnedWriteHalf, SessionHandle)
where
    I: std::io::BufRead + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let config = ClientConfig {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            plain_port: port,
            tls_port: port,
            insecure: true,
        },
        token: "abc123".to_string(),
        nick: "testbot".to_string(),
        session: SessionConfig::default(),
    };

    let (conn, accepted) = tokio::join!(app::start(&config), listener.accept());
    let (stream, _) = accepted.unwrap();
    let (read_half, write_half) = stream.into_split();
    let mut reader = tokio::io::BufReader::new(read_half);

    // Skip PASS / NICK / CAP REQ.
    for _ in 0..3 {
        read_line(&mut reader).await;
    }

    let session = tokio::spawn(session::run(conn.unwrap(), input, SessionConfig::default()));
    (reader, write_half, session)
}

async fn read_line(reader: &mut tokio::io::BufReader<OwnedReadHalf>) -> String {
    let mut line = String::new();
    tokio::time::timeout(STEP_TIMEOUT, reader.read_line(&mut line))
        .await
        .expect("server read timed out")
        .expect("server read failed");
    line
}

#[tokio::test]
async fn ping_answered_with_bare_pong() {
    let (mut reader, mut writer, _session) = start_session(BufReader::new(IdleInput)).await;

    writer.write_all(b"PING :tmi.twitch.tv\r\n").await.unwrap();
    assert_eq!(read_line(&mut reader).await, "PONG\r\n");
}

#[tokio::test]
async fn each_ping_gets_one_reply() {
    let (mut reader, mut writer, _session) = start_session(BufReader::new(IdleInput)).await;

    writer
        .write_all(b"PING :a\r\nPING :b\r\nPING :c\r\n")
        .await
        .unwrap();
    for _ in 0..3 {
        assert_eq!(read_line(&mut reader).await, "PONG\r\n");
    }
}

#[tokio::test]
async fn lines_containing_ping_are_not_answered() {
    let (mut reader, mut writer, session) = start_session(BufReader::new(IdleInput)).await;

    writer
        .write_all(b":bot!bot@bot.tmi.twitch.tv PRIVMSG #chan :PING\r\nping\r\n PING\r\nPING :real\r\n")
        .await
        .unwrap();
    assert_eq!(read_line(&mut reader).await, "PONG\r\n");

    // Half-close: the client sees end-of-stream and the session ends.
    writer.shutdown().await.unwrap();
    let reason = tokio::time::timeout(STEP_TIMEOUT, session)
        .await
        .expect("session did not end")
        .unwrap()
        .unwrap();
    assert_eq!(reason, ShutdownReason::RemoteClosed);

    // No second reply shows up afterwards.
    let mut extra = String::new();
    let late = tokio::time::timeout(Duration::from_millis(300), reader.read_line(&mut extra)).await;
    assert!(
        matches!(late, Err(_) | Ok(Ok(0)) | Ok(Err(_))),
        "unexpected extra line: {extra:?}"
    );
}

#[tokio::test]
async fn pong_and_typed_lines_share_the_queue() {
    let typed = Cursor::new("first\n");
    // Chain an idle reader so local input never ends during the test.
    let input = BufReader::new(typed.chain(IdleInput));
    let (mut reader, mut writer, _session) = start_session(input).await;

    assert_eq!(read_line(&mut reader).await, "first\r\n");
    writer.write_all(b"PING :tmi.twitch.tv\r\n").await.unwrap();
    assert_eq!(read_line(&mut reader).await, "PONG\r\n");
}
