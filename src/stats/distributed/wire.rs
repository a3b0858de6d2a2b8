//! TCP client for the document store's JSON query protocol
//!
//! Handshake (V0_4): protocol magic, auth key length and key, JSON protocol
//! magic, all little-endian; the server answers with a NUL-terminated
//! `SUCCESS`. Every query and response is framed as
//! `[token: u64 LE][length: u32 LE][json]`.

use crate::stats::distributed::term;
use crate::stats::error::{StatsError, StatsResult};
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::io::{Read, Write};
use std::net::TcpStream;
use std::str::FromStr;

pub const DEFAULT_PORT: u16 = 28015;

const V0_4: u32 = 0x400c_2d20;
const JSON_PROTOCOL: u32 = 0x7e69_70c7;
const HANDSHAKE_SUCCESS: &str = "SUCCESS";
const MAX_HANDSHAKE_REPLY: usize = 4096;
const MAX_RESPONSE: usize = 64 * 1024 * 1024;

/// Response types
const SUCCESS_ATOM: u64 = 1;
const SUCCESS_SEQUENCE: u64 = 2;
const SUCCESS_PARTIAL: u64 = 3;
const CLIENT_ERROR: u64 = 16;
const COMPILE_ERROR: u64 = 17;
const RUNTIME_ERROR: u64 = 18;

/// `host[:port]` of one server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerAddr {
    pub host: String,
    pub port: u16,
}

impl FromStr for ServerAddr {
    type Err = StatsError;

    fn from_str(address: &str) -> Result<Self, Self::Err> {
        let invalid = |message: &str| StatsError::InvalidServer {
            address: address.to_string(),
            message: message.to_string(),
        };

        let address = address.trim();
        let (host, port) = match address.split_once(':') {
            Some((host, port)) => {
                let port = port
                    .parse::<u16>()
                    .map_err(|_| invalid("port must be a number between 0 and 65535"))?;
                (host, port)
            }
            None => (address, DEFAULT_PORT),
        };

        if host.is_empty() {
            return Err(invalid("host name is empty"));
        }
        Ok(Self {
            host: host.to_string(),
            port,
        })
    }
}

impl fmt::Display for ServerAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Deserialize)]
struct RawResponse {
    t: u64,
    #[serde(default)]
    r: Vec<Value>,
}

/// One open connection; queries run one at a time
pub struct Connection {
    stream: TcpStream,
    server: ServerAddr,
    next_token: u64,
}

impl Connection {
    pub fn open(server: &ServerAddr) -> StatsResult<Self> {
        log::trace!("connecting to {}", server);
        let stream = TcpStream::connect((server.host.as_str(), server.port))?;
        let mut conn = Self {
            stream,
            server: server.clone(),
            next_token: 1,
        };
        conn.handshake()?;
        Ok(conn)
    }

    pub fn server(&self) -> &ServerAddr {
        &self.server
    }

    fn handshake(&mut self) -> StatsResult<()> {
        let mut hello = Vec::with_capacity(12);
        hello.extend_from_slice(&V0_4.to_le_bytes());
        hello.extend_from_slice(&0u32.to_le_bytes());
        hello.extend_from_slice(&JSON_PROTOCOL.to_le_bytes());
        self.stream.write_all(&hello)?;
        self.stream.flush()?;

        let mut reply = Vec::new();
        let mut byte = [0u8; 1];
        loop {
            self.stream.read_exact(&mut byte)?;
            if byte[0] == 0 {
                break;
            }
            if reply.len() >= MAX_HANDSHAKE_REPLY {
                return Err(StatsError::protocol("handshake reply is not terminated"));
            }
            reply.push(byte[0]);
        }

        let reply = String::from_utf8_lossy(&reply);
        if reply != HANDSHAKE_SUCCESS {
            return Err(StatsError::Remote {
                kind: "handshake failure".to_string(),
                message: reply.into_owned(),
            });
        }
        Ok(())
    }

    /// Run a term to completion
    ///
    /// Atoms come back as-is, sequences (including ones delivered in
    /// several partial responses) as a JSON array.
    pub fn run(&mut self, query_term: Value) -> StatsResult<Value> {
        let token = self.next_token;
        self.next_token += 1;

        self.send(token, &term::start(query_term))?;
        let mut items = Vec::new();
        loop {
            let response = self.receive(token)?;
            match response.t {
                SUCCESS_ATOM => return Ok(response.r.into_iter().next().unwrap_or(Value::Null)),
                SUCCESS_SEQUENCE => {
                    items.extend(response.r);
                    return Ok(Value::Array(items));
                }
                SUCCESS_PARTIAL => {
                    items.extend(response.r);
                    self.send(token, &term::continue_query())?;
                }
                CLIENT_ERROR | COMPILE_ERROR | RUNTIME_ERROR => {
                    let kind = match response.t {
                        CLIENT_ERROR => "client error",
                        COMPILE_ERROR => "compile error",
                        _ => "runtime error",
                    };
                    let message = match response.r.first() {
                        Some(Value::String(message)) => message.clone(),
                        Some(other) => other.to_string(),
                        None => String::new(),
                    };
                    return Err(StatsError::Remote {
                        kind: kind.to_string(),
                        message,
                    });
                }
                other => {
                    return Err(StatsError::protocol(format!(
                        "unexpected response type {}",
                        other
                    )))
                }
            }
        }
    }

    fn send(&mut self, token: u64, query: &Value) -> StatsResult<()> {
        let body = serde_json::to_vec(query).map_err(|e| StatsError::protocol(e.to_string()))?;
        let length = u32::try_from(body.len())
            .map_err(|_| StatsError::protocol("query too large"))?;

        let mut frame = Vec::with_capacity(12 + body.len());
        frame.extend_from_slice(&token.to_le_bytes());
        frame.extend_from_slice(&length.to_le_bytes());
        frame.extend_from_slice(&body);
        self.stream.write_all(&frame)?;
        self.stream.flush()?;
        Ok(())
    }

    fn receive(&mut self, expected_token: u64) -> StatsResult<RawResponse> {
        let mut header = [0u8; 12];
        self.stream.read_exact(&mut header)?;
        let mut token_bytes = [0u8; 8];
        token_bytes.copy_from_slice(&header[..8]);
        let mut length_bytes = [0u8; 4];
        length_bytes.copy_from_slice(&header[8..]);

        let token = u64::from_le_bytes(token_bytes);
        let length = u32::from_le_bytes(length_bytes) as usize;
        if token != expected_token {
            return Err(StatsError::protocol(format!(
                "response token {} does not match query token {}",
                token, expected_token
            )));
        }
        if length > MAX_RESPONSE {
            return Err(StatsError::protocol(format!("response of {} bytes is too large", length)));
        }

        let mut body = vec![0u8; length];
        self.stream.read_exact(&mut body)?;
        serde_json::from_slice(&body)
            .map_err(|e| StatsError::protocol(format!("malformed response: {}", e)))
    }
}
