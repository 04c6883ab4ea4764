//! In-process RESP server for pool tests.
//!
//! Speaks just enough of the protocol to exercise dialing: `AUTH` checks a
//! fixed password, `SELECT` accepts databases 0 to 15, and `PING` is counted
//! and can be made to fail. Every other command is answered with `+OK`.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use crate::RedisSettings;

#[derive(Default)]
struct State {
    password: Option<String>,
    reject_auth: AtomicBool,
    fail_ping: AtomicBool,
    pings: AtomicUsize,
}

impl State {
    fn reply(&self, args: &[String]) -> &'static str {
        let Some(command) = args.first() else {
            return "-ERR empty command\r\n";
        };

        match command.to_ascii_uppercase().as_str() {
            "AUTH" => {
                let accepted = !self.reject_auth.load(Ordering::SeqCst)
                    && self.password.as_deref() == args.last().map(String::as_str);
                if accepted {
                    "+OK\r\n"
                } else {
                    "-WRONGPASS invalid username-password pair or user is disabled.\r\n"
                }
            }
            "SELECT" => match args.get(1).and_then(|db| db.parse::<u32>().ok()) {
                Some(db) if db < 16 => "+OK\r\n",
                _ => "-ERR DB index is out of range\r\n",
            },
            "PING" => {
                self.pings.fetch_add(1, Ordering::SeqCst);
                if self.fail_ping.load(Ordering::SeqCst) {
                    "-ERR server is going away\r\n"
                } else {
                    "+PONG\r\n"
                }
            }
            _ => "+OK\r\n",
        }
    }
}

/// Handle to a running fake server. The listener lives for the test's runtime.
pub(crate) struct FakeRedis {
    addr: SocketAddr,
    state: Arc<State>,
}

impl FakeRedis {
    /// Start a server that accepts any client without a password.
    pub(crate) async fn start() -> Self {
        Self::spawn(State::default()).await
    }

    /// Start a server whose `AUTH` only accepts `password`.
    pub(crate) async fn with_password(password: &str) -> Self {
        Self::spawn(State {
            password: Some(password.to_string()),
            ..State::default()
        })
        .await
    }

    async fn spawn(state: State) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = Arc::new(state);

        let accept_state = Arc::clone(&state);
        tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                tokio::spawn(serve(socket, Arc::clone(&accept_state)));
            }
        });

        Self { addr, state }
    }

    /// Settings pointing at this server.
    pub(crate) fn settings(&self) -> RedisSettings {
        RedisSettings::builder()
            .server(self.addr.to_string())
            .build()
    }

    /// Number of `PING` commands received so far.
    pub(crate) fn pings(&self) -> usize {
        self.state.pings.load(Ordering::SeqCst)
    }

    pub(crate) fn reject_auth(&self) {
        self.state.reject_auth.store(true, Ordering::SeqCst);
    }

    pub(crate) fn fail_ping(&self) {
        self.state.fail_ping.store(true, Ordering::SeqCst);
    }
}

async fn serve(mut socket: TcpStream, state: Arc<State>) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    loop {
        let n = match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => n,
        };
        buf.extend_from_slice(&chunk[..n]);

        // Pipelined commands may arrive in one read
        while let Some((args, used)) = parse_command(&buf) {
            buf.drain(..used);
            if socket.write_all(state.reply(&args).as_bytes()).await.is_err() {
                return;
            }
        }
    }
}

/// Parse one RESP array of bulk strings, returning it and the bytes consumed.
fn parse_command(buf: &[u8]) -> Option<(Vec<String>, usize)> {
    let mut pos = 0;
    let count: usize = read_line(buf, &mut pos)?.strip_prefix('*')?.parse().ok()?;

    let mut args = Vec::with_capacity(count);
    for _ in 0..count {
        let len: usize = read_line(buf, &mut pos)?.strip_prefix('$')?.parse().ok()?;
        let end = pos + len;
        if buf.len() < end + 2 {
            return None;
        }
        args.push(String::from_utf8_lossy(&buf[pos..end]).into_owned());
        pos = end + 2;
    }

    Some((args, pos))
}

fn read_line<'a>(buf: &'a [u8], pos: &mut usize) -> Option<&'a str> {
    let rest = buf.get(*pos..)?;
    let idx = rest.windows(2).position(|w| w == b"\r\n")?;
    let line = std::str::from_utf8(&rest[..idx]).ok()?;
    *pos += idx + 2;
    Some(line)
}

#[test]
fn test_parse_pipelined_commands() {
    let buf = b"*1\r\n$4\r\nPING\r\n*2\r\n$6\r\nSELECT\r\n$1\r\n3\r\n";

    let (first, used) = parse_command(buf).unwrap();
    assert_eq!(first, vec!["PING"]);

    let (second, rest) = parse_command(&buf[used..]).unwrap();
    assert_eq!(second, vec!["SELECT", "3"]);
    assert_eq!(used + rest, buf.len());

    // Incomplete frame waits for more input
    assert!(parse_command(b"*2\r\n$6\r\nSELECT\r\n").is_none());
}
