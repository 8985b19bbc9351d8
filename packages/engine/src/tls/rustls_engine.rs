//! rustls-backed [`TlsEngine`]
//!
//! rustls negotiates ALPN itself, so a wrapper around this engine always takes
//! the passthrough strategy.

use std::io::{Read, Write};
use std::sync::Arc;

use rustls::pki_types::ServerName;
use rustls::{ClientConfig, ClientConnection, Connection, ServerConfig, ServerConnection};
use tracing::debug;

use super::errors::TlsError;
use crate::engine::{EngineResult, HandshakeStatus, Role, Status, TlsEngine};
use crate::error::BoxError;

enum Side {
    Client {
        config: Arc<ClientConfig>,
        server_name: ServerName<'static>,
    },
    Server {
        config: Arc<ServerConfig>,
    },
}

/// A rustls connection driven through caller-owned buffers.
///
/// The connection is created on first use so the ALPN list can still be
/// changed up to that point.
pub struct RustlsEngine {
    side: Side,
    alpn_protocols: Vec<Vec<u8>>,
    conn: Option<Connection>,
    finished_reported: bool,
}

impl RustlsEngine {
    #[must_use]
    pub fn client(config: Arc<ClientConfig>, server_name: ServerName<'static>) -> Self {
        Self::with_side(Side::Client {
            config,
            server_name,
        })
    }

    #[must_use]
    pub fn server(config: Arc<ServerConfig>) -> Self {
        Self::with_side(Side::Server { config })
    }

    fn with_side(side: Side) -> Self {
        Self {
            side,
            alpn_protocols: Vec::new(),
            conn: None,
            finished_reported: false,
        }
    }

    /// The live connection, once the handshake has started.
    #[must_use]
    pub fn connection(&self) -> Option<&Connection> {
        self.conn.as_ref()
    }

    fn build(&self) -> Result<Connection, TlsError> {
        let conn = match &self.side {
            Side::Client {
                config,
                server_name,
            } => {
                let mut config = ClientConfig::clone(config);
                if !self.alpn_protocols.is_empty() {
                    config.alpn_protocols.clone_from(&self.alpn_protocols);
                }
                ClientConnection::new(Arc::new(config), server_name.clone())?.into()
            }
            Side::Server { config } => {
                let mut config = ServerConfig::clone(config);
                if !self.alpn_protocols.is_empty() {
                    config.alpn_protocols.clone_from(&self.alpn_protocols);
                }
                ServerConnection::new(Arc::new(config))?.into()
            }
        };
        debug!(role = ?self.role(), "rustls connection created");
        Ok(conn)
    }

    fn conn_mut(&mut self) -> Result<&mut Connection, TlsError> {
        let conn = match self.conn.take() {
            Some(conn) => conn,
            None => self.build()?,
        };
        Ok(self.conn.insert(conn))
    }

    fn progress(&mut self) -> HandshakeStatus {
        let status = self.handshake_status();
        if status == HandshakeStatus::NotHandshaking
            && !self.finished_reported
            && self.conn.is_some()
        {
            self.finished_reported = true;
            return HandshakeStatus::Finished;
        }
        status
    }
}

impl TlsEngine for RustlsEngine {
    fn role(&self) -> Role {
        match self.side {
            Side::Client { .. } => Role::Client,
            Side::Server { .. } => Role::Server,
        }
    }

    fn wrap(&mut self, src: &[&[u8]], dst: &mut [u8]) -> Result<EngineResult, BoxError> {
        let conn = self.conn_mut()?;
        let mut consumed = 0;
        if !conn.is_handshaking() {
            for chunk in src {
                conn.writer().write_all(chunk).map_err(TlsError::from)?;
                consumed += chunk.len();
            }
        }

        let capacity = dst.len();
        let mut out = &mut dst[..];
        while conn.wants_write() && !out.is_empty() {
            if conn.write_tls(&mut out).map_err(TlsError::from)? == 0 {
                break;
            }
        }
        let produced = capacity - out.len();
        let status = if produced == 0 && conn.wants_write() {
            Status::BufferOverflow
        } else {
            Status::Ok
        };
        Ok(EngineResult::new(status, self.progress(), consumed, produced))
    }

    fn unwrap(&mut self, src: &[u8], dst: &mut [&mut [u8]]) -> Result<EngineResult, BoxError> {
        if src.is_empty() {
            return Ok(EngineResult::underflow());
        }
        let conn = self.conn_mut()?;
        let mut input = src;
        let consumed = conn.read_tls(&mut input).map_err(TlsError::from)?;
        let io_state = conn.process_new_packets().map_err(TlsError::from)?;

        let mut available = io_state.plaintext_bytes_to_read();
        let mut produced = 0;
        for buf in dst.iter_mut() {
            if available == 0 {
                break;
            }
            let n = conn.reader().read(buf).map_err(TlsError::from)?;
            produced += n;
            available -= n;
        }
        let status = if io_state.peer_has_closed() && available == 0 {
            Status::Closed
        } else if available > 0 && produced == 0 {
            Status::BufferOverflow
        } else {
            Status::Ok
        };
        Ok(EngineResult::new(status, self.progress(), consumed, produced))
    }

    fn handshake_status(&self) -> HandshakeStatus {
        let Some(conn) = &self.conn else {
            return match self.role() {
                Role::Client => HandshakeStatus::NeedWrap,
                Role::Server => HandshakeStatus::NeedUnwrap,
            };
        };
        if conn.is_handshaking() {
            if conn.wants_write() {
                HandshakeStatus::NeedWrap
            } else {
                HandshakeStatus::NeedUnwrap
            }
        } else if !self.finished_reported && conn.wants_write() {
            HandshakeStatus::NeedWrap
        } else {
            HandshakeStatus::NotHandshaking
        }
    }

    fn begin_handshake(&mut self) -> Result<(), BoxError> {
        self.conn_mut()?;
        Ok(())
    }

    fn close_outbound(&mut self) {
        if let Some(conn) = self.conn.as_mut() {
            conn.send_close_notify();
        }
    }

    fn supports_native_alpn(&self) -> bool {
        true
    }

    fn set_native_application_protocols(&mut self, protocols: &[String]) -> Result<(), BoxError> {
        if self.conn.is_some() {
            let fixed = "ALPN list is fixed once the connection exists";
            return Err(TlsError::AlreadyStarted(fixed).into());
        }
        self.alpn_protocols = protocols.iter().map(|p| p.as_bytes().to_vec()).collect();
        Ok(())
    }

    fn native_application_protocol(&self) -> Option<String> {
        self.conn
            .as_ref()?
            .alpn_protocol()
            .map(|p| String::from_utf8_lossy(p).into_owned())
    }
}

impl std::fmt::Debug for RustlsEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RustlsEngine")
            .field("role", &self.role())
            .field("alpn_protocols", &self.alpn_protocols.len())
            .field("started", &self.conn.is_some())
            .finish_non_exhaustive()
    }
}
