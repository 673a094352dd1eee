use log::{debug, info, warn};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio::time::timeout;

use crate::client::connection::{Outbox, outbox, spawn_writer};
use crate::client::session::{Member, Session};
use crate::config::ServerConfig;
use crate::error::handlers::{error_reply, handle_error, is_retryable};
use crate::error::{ChatServerError, HandshakeError, RegistryError};
use crate::protocol::{RouteOutcome, parse_input, responses, route_input};
use crate::registry::Registry;

/// How long a closing connection may take to flush queued lines.
const WRITER_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Drives one client connection from accept to close.
///
/// - Splits the stream; the write half goes to a writer task fed by an `Outbox`.
/// - Runs the handshake, then reads and routes lines until the client leaves.
/// - Deregisters and closes the connection on every exit path.
pub async fn handle_client(
    stream: TcpStream,
    peer: SocketAddr,
    registry: Registry,
    config: Arc<ServerConfig>,
) {
    let mut session = Session::new(peer);

    let (read_half, write_half) = stream.into_split();
    let (outbox, rx) = outbox(config.outbox_capacity);
    let writer = spawn_writer(write_half, rx, peer);
    let mut reader = BufReader::new(read_half);

    if let Err(e) = run_session(&mut session, &mut reader, &outbox, &registry, &config).await {
        handle_error(&session.label(), &e);
    }

    let label = session.label();
    if let Some(member) = session.begin_disconnect() {
        disconnect(&member, &registry).await;
    }

    session.close();
    drop(outbox);
    drop(reader);
    close_writer(writer, peer).await;
    info!("Client {} disconnected", label);
}

async fn run_session<R>(
    session: &mut Session,
    reader: &mut R,
    outbox: &Outbox,
    registry: &Registry,
    config: &ServerConfig,
) -> Result<(), ChatServerError>
where
    R: AsyncBufRead + Unpin,
{
    session.begin_handshake();
    let member = handshake(reader, outbox, registry, config).await?;
    session.activate(member.clone());

    loop {
        let line = match next_line(reader, config.idle_timeout(), config.max_line_length).await? {
            Inbound::Line(line) => line,
            Inbound::TooLong => {
                outbox.send_line(responses::message_too_long(config.max_line_length));
                continue;
            }
            Inbound::Closed => {
                info!("Connection closed by client {}", session.label());
                return Ok(());
            }
        };

        match route_input(member.id(), outbox, parse_input(&line), registry).await {
            RouteOutcome::Continue => {}
            RouteOutcome::Disconnect => return Ok(()),
        }
    }
}

/// Prompts for an identifier until one registers or attempts run out.
async fn handshake<R>(
    reader: &mut R,
    outbox: &Outbox,
    registry: &Registry,
    config: &ServerConfig,
) -> Result<Member, ChatServerError>
where
    R: AsyncBufRead + Unpin,
{
    if registry.is_full().await {
        let err = RegistryError::ServerFull(config.max_clients);
        outbox.send_line(error_reply(&err));
        return Err(err.into());
    }

    for _ in 0..config.max_handshake_attempts {
        outbox.send_line(responses::ENTER_ID);

        let line = match next_line(reader, config.idle_timeout(), config.max_line_length).await? {
            Inbound::Line(line) => line,
            Inbound::TooLong => {
                outbox.send_line(error_reply(&RegistryError::IdTooLong(config.max_id_length)));
                continue;
            }
            Inbound::Closed => return Err(HandshakeError::Disconnected.into()),
        };
        let id = line.trim();

        match registry.register(id, outbox.clone()).await {
            Ok(joined) => {
                info!("Registered client {} (session {})", id, joined.session_id);
                if let Some(coordinator) = &joined.elected {
                    info!("New coordinator: {}", coordinator);
                }
                return Ok(Member::new(id, joined.session_id));
            }
            Err(e) => {
                outbox.send_line(error_reply(&e));
                if !is_retryable(&e) {
                    return Err(e.into());
                }
                debug!("Handshake attempt rejected: {}", e);
            }
        }
    }

    outbox.send_line(responses::TOO_MANY_ATTEMPTS);
    Err(HandshakeError::TooManyAttempts(config.max_handshake_attempts).into())
}

/// Removes `member` from the registry; the registry announces the departure.
async fn disconnect(member: &Member, registry: &Registry) {
    let Some(left) = registry.remove(member.id(), member.session_id()).await else {
        warn!("Client {} was already gone from the registry", member.id());
        return;
    };

    match &left.elected {
        Some(coordinator) => {
            info!("Coordinator {} left; new coordinator: {}", member.id(), coordinator)
        }
        None if left.was_coordinator => {
            info!("Coordinator {} left; no clients remain", member.id())
        }
        None => debug!("{} left; {} clients remain", member.id(), left.remaining),
    }
}

/// One read from a client.
#[derive(Debug, PartialEq, Eq)]
enum Inbound {
    Line(String),
    /// A line over the length limit; its bytes were skipped
    TooLong,
    Closed,
}

/// Reads one line of at most `max_len` bytes, without its terminator.
///
/// Never buffers more than `max_len` plus a `\r\n` terminator: the rest of
/// an over-long line is skipped. Invalid UTF-8 is replaced rather than
/// treated as an error.
async fn next_line<R>(
    reader: &mut R,
    idle: Option<Duration>,
    max_len: usize,
) -> Result<Inbound, ChatServerError>
where
    R: AsyncBufRead + Unpin,
{
    match idle {
        Some(limit) => timeout(limit, read_bounded_line(reader, max_len))
            .await
            .map_err(|_| ChatServerError::IdleTimeout(limit))?,
        None => read_bounded_line(reader, max_len).await,
    }
}

async fn read_bounded_line<R>(reader: &mut R, max_len: usize) -> Result<Inbound, ChatServerError>
where
    R: AsyncBufRead + Unpin,
{
    let cap = max_len as u64 + 2;
    let mut buf = Vec::new();
    let n = (&mut *reader).take(cap).read_until(b'\n', &mut buf).await?;

    if n == 0 {
        return Ok(Inbound::Closed);
    }

    if buf.last() != Some(&b'\n') && n as u64 == cap {
        skip_past_newline(reader).await?;
        return Ok(Inbound::TooLong);
    }

    while matches!(buf.last(), Some(b'\n' | b'\r')) {
        buf.pop();
    }
    if buf.len() > max_len {
        return Ok(Inbound::TooLong);
    }

    Ok(Inbound::Line(String::from_utf8_lossy(&buf).into_owned()))
}

/// Discards input up to and including the next `\n`, or to end of stream.
async fn skip_past_newline<R>(reader: &mut R) -> io::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    loop {
        let (consumed, found) = {
            let available = reader.fill_buf().await?;
            if available.is_empty() {
                return Ok(());
            }
            match available.iter().position(|&b| b == b'\n') {
                Some(i) => (i + 1, true),
                None => (available.len(), false),
            }
        };
        reader.consume(consumed);
        if found {
            return Ok(());
        }
    }
}

/// Waits for the writer to flush what is queued, aborting it if it stalls.
async fn close_writer(mut writer: JoinHandle<()>, peer: SocketAddr) {
    match timeout(WRITER_DRAIN_TIMEOUT, &mut writer).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!("Writer task for {} failed: {}", peer, e),
        Err(_) => {
            warn!("Writer for {} did not drain in time, aborting", peer);
            writer.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::connection::outbox;
    use tokio::sync::mpsc::Receiver;

    fn drain(rx: &mut Receiver<String>) -> Vec<String> {
        let mut lines = Vec::new();
        while let Ok(line) = rx.try_recv() {
            lines.push(line);
        }
        lines
    }

    fn config() -> ServerConfig {
        ServerConfig {
            max_handshake_attempts: 2,
            ..ServerConfig::default()
        }
    }

    fn line(text: &str) -> Inbound {
        Inbound::Line(text.to_string())
    }

    #[tokio::test]
    async fn next_line_strips_terminators_and_reports_eof() {
        let mut reader: &[u8] = b"hello\r\nworld\nlast";
        assert_eq!(next_line(&mut reader, None, 64).await.unwrap(), line("hello"));
        assert_eq!(next_line(&mut reader, None, 64).await.unwrap(), line("world"));
        assert_eq!(next_line(&mut reader, None, 64).await.unwrap(), line("last"));
        assert_eq!(next_line(&mut reader, None, 64).await.unwrap(), Inbound::Closed);
    }

    #[tokio::test]
    async fn next_line_skips_huge_line_without_buffering_it() {
        let mut input = vec![b'x'; 4 * 1024 * 1024];
        input.extend_from_slice(b"\nafter\n");
        // Small internal buffer so the skip has to loop
        let mut reader = BufReader::with_capacity(64, input.as_slice());

        assert_eq!(next_line(&mut reader, None, 16).await.unwrap(), Inbound::TooLong);
        assert_eq!(next_line(&mut reader, None, 16).await.unwrap(), line("after"));
        assert_eq!(next_line(&mut reader, None, 16).await.unwrap(), Inbound::Closed);
    }

    #[tokio::test]
    async fn next_line_length_boundaries() {
        let mut reader: &[u8] = b"0123456789abcdef\r\n0123456789abcdefg\n0123456789abcdefg\r\nok\n";
        assert_eq!(
            next_line(&mut reader, None, 16).await.unwrap(),
            line("0123456789abcdef")
        );
        assert_eq!(next_line(&mut reader, None, 16).await.unwrap(), Inbound::TooLong);
        assert_eq!(next_line(&mut reader, None, 16).await.unwrap(), Inbound::TooLong);
        assert_eq!(next_line(&mut reader, None, 16).await.unwrap(), line("ok"));
    }

    #[tokio::test]
    async fn handshake_rejects_overlong_id_line() {
        let registry = Registry::new(8, 16);
        let (tx, mut rx) = outbox(32);
        let config = ServerConfig {
            max_line_length: 64,
            max_id_length: 16,
            ..config()
        };
        let mut input = vec![b'y'; 100_000];
        input.extend_from_slice(b"\ncarol\n");
        let mut reader = input.as_slice();

        let member = handshake(&mut reader, &tx, &registry, &config).await.unwrap();

        assert_eq!(member.id(), "carol");
        let lines = drain(&mut rx);
        assert_eq!(lines[1], "Identifier too long (max 16 bytes).");
        assert_eq!(lines[2], "Enter your unique ID:");
    }

    #[tokio::test]
    async fn handshake_reprompts_after_bad_ids() {
        let registry = Registry::new(8, 16);
        let (tx, mut rx) = outbox(32);
        let mut reader: &[u8] = b"\nalice\n";

        let member = handshake(&mut reader, &tx, &registry, &config()).await.unwrap();

        assert_eq!(member.id(), "alice");
        let lines = drain(&mut rx);
        assert_eq!(lines[0], "Enter your unique ID:");
        assert_eq!(lines[1], "Identifier cannot be empty.");
        assert_eq!(lines[2], "Enter your unique ID:");
        assert!(lines.contains(&"New coordinator is alice".to_string()));
        assert_eq!(lines.last().map(String::as_str), Some("alice has joined the chat."));
    }

    #[tokio::test]
    async fn handshake_gives_up_after_max_attempts() {
        let registry = Registry::new(8, 16);
        let (taken, _taken_rx) = outbox(8);
        registry.register("bob", taken).await.unwrap();

        let (tx, mut rx) = outbox(32);
        let mut reader: &[u8] = b"bob\nbob\nbob\n";
        let err = handshake(&mut reader, &tx, &registry, &config()).await.unwrap_err();

        assert!(matches!(
            err,
            ChatServerError::Handshake(HandshakeError::TooManyAttempts(2))
        ));
        let lines = drain(&mut rx);
        assert_eq!(lines.last().map(String::as_str), Some("Too many invalid attempts. Goodbye."));
        assert_eq!(lines.iter().filter(|l| *l == "ID bob is already in use.").count(), 2);
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn handshake_refuses_when_server_full() {
        let registry = Registry::new(1, 16);
        let (taken, _taken_rx) = outbox(8);
        registry.register("bob", taken).await.unwrap();

        let (tx, mut rx) = outbox(8);
        let mut reader: &[u8] = b"alice\n";
        let err = handshake(&mut reader, &tx, &registry, &config()).await.unwrap_err();

        assert!(matches!(err, ChatServerError::Registry(RegistryError::ServerFull(_))));
        assert_eq!(drain(&mut rx), vec!["Server is full. Try again later.".to_string()]);
    }

    #[tokio::test]
    async fn handshake_reports_early_disconnect() {
        let registry = Registry::new(8, 16);
        let (tx, _rx) = outbox(8);
        let mut reader: &[u8] = b"";
        let err = handshake(&mut reader, &tx, &registry, &config()).await.unwrap_err();

        assert!(matches!(err, ChatServerError::Handshake(HandshakeError::Disconnected)));
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn disconnecting_coordinator_announces_successor() {
        let registry = Registry::new(8, 16);
        let (a, _rx_a) = outbox(8);
        let (b, mut rx_b) = outbox(8);
        let joined_a = registry.register("a", a).await.unwrap();
        registry.register("b", b).await.unwrap();
        drain(&mut rx_b);

        disconnect(&Member::new("a", joined_a.session_id), &registry).await;

        assert_eq!(
            drain(&mut rx_b),
            vec!["a has left the chat.".to_string(), "New coordinator is b".to_string()]
        );
        assert_eq!(registry.coordinator().await.as_deref(), Some("b"));
    }
}
