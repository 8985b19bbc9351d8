//! A plaintext engine shaped like TLS 1.2, with no ALPN of its own.
//!
//! Handshake records are sent in the clear, one record per `wrap` and one per
//! `unwrap`. Finished carries a SHA-256 over the label and the running
//! transcript hash, so any disagreement between the peers' transcripts fails
//! the handshake exactly as it would in real TLS.

#![allow(dead_code)]

use std::collections::VecDeque;

use alpn_shim_engine::codec::{
    EXT_ALPN, HelloKind, HelloMessage, RECORD_HEADER_LEN, RecordHeader, split_first_message,
};
use alpn_shim_engine::{
    BoxError, EngineResult, HandshakeHash, HandshakeStatus, HandshakeTranscript, Role, Status,
    TlsEngine,
};
use ring::digest;

pub const HANDSHAKE: u8 = 22;
const CHANGE_CIPHER_SPEC: u8 = 20;
const APPLICATION_DATA: u8 = 23;
const RENEGOTIATION_INFO: u16 = 0xff01;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Message {
    ClientHello,
    /// ServerHello, optionally followed by ServerHelloDone in the same record.
    ServerHello { with_done: bool },
    ClientKeyExchange,
    ChangeCipherSpec,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Send(Message),
    Recv(Message),
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub struct ToyEngine {
    role: Role,
    steps: VecDeque<Step>,
    hash: HandshakeHash,
    closed: bool,
}

impl ToyEngine {
    pub fn client() -> Self {
        Self::new(Role::Client, false)
    }

    pub fn server() -> Self {
        Self::new(Role::Server, false)
    }

    /// Abbreviated handshake: the server sends ServerHello, ChangeCipherSpec
    /// and its Finished back to back.
    pub fn resuming(role: Role) -> Self {
        Self::new(role, true)
    }

    fn new(role: Role, resume: bool) -> Self {
        use Message::*;
        use Step::*;
        let steps = match (role, resume) {
            (Role::Client, false) => vec![
                Send(ClientHello),
                Recv(ServerHello { with_done: true }),
                Send(ClientKeyExchange),
                Send(ChangeCipherSpec),
                Send(Finished),
                Recv(ChangeCipherSpec),
                Recv(Finished),
            ],
            (Role::Server, false) => vec![
                Recv(ClientHello),
                Send(ServerHello { with_done: true }),
                Recv(ClientKeyExchange),
                Recv(ChangeCipherSpec),
                Recv(Finished),
                Send(ChangeCipherSpec),
                Send(Finished),
            ],
            (Role::Client, true) => vec![
                Send(ClientHello),
                Recv(ServerHello { with_done: false }),
                Recv(ChangeCipherSpec),
                Recv(Finished),
                Send(ChangeCipherSpec),
                Send(Finished),
            ],
            (Role::Server, true) => vec![
                Recv(ClientHello),
                Send(ServerHello { with_done: false }),
                Send(ChangeCipherSpec),
                Send(Finished),
                Recv(ChangeCipherSpec),
                Recv(Finished),
            ],
        };
        Self {
            role,
            steps: steps.into(),
            hash: HandshakeHash::sha256(),
            closed: false,
        }
    }

    pub fn transcript_bytes(&self) -> Vec<u8> {
        self.hash.capture_transcript_bytes()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn verify_data(&self, sender: Role) -> Vec<u8> {
        let label: &[u8] = match sender {
            Role::Client => b"client finished",
            Role::Server => b"server finished",
        };
        let mut ctx = digest::Context::new(&digest::SHA256);
        ctx.update(label);
        ctx.update(self.hash.current_hash().as_ref());
        ctx.finish().as_ref().to_vec()
    }

    fn encode(&self, message: Message) -> (u8, Vec<u8>) {
        match message {
            Message::ClientHello => (HANDSHAKE, client_hello_message()),
            Message::ServerHello { with_done } => {
                let mut payload = server_hello_message();
                if with_done {
                    payload.extend_from_slice(&[14, 0, 0, 0]);
                }
                (HANDSHAKE, payload)
            }
            Message::ClientKeyExchange => (HANDSHAKE, handshake_message(16, &[0x42; 66])),
            Message::ChangeCipherSpec => (CHANGE_CIPHER_SPEC, vec![1]),
            Message::Finished => (HANDSHAKE, handshake_message(20, &self.verify_data(self.role))),
        }
    }

    fn check(&self, expected: Message, content_type: u8, payload: &[u8]) -> Result<(), BoxError> {
        let peer = match self.role {
            Role::Client => Role::Server,
            Role::Server => Role::Client,
        };
        match expected {
            Message::ChangeCipherSpec => {
                if content_type != CHANGE_CIPHER_SPEC {
                    let found =
                        format!("expected ChangeCipherSpec, got content type {content_type}");
                    return Err(found.into());
                }
                return Ok(());
            }
            _ if content_type != HANDSHAKE => {
                let found = format!("expected {expected:?}, got content type {content_type}");
                return Err(found.into());
            }
            _ => {}
        }
        let (first, rest) = split_first_message(payload)?;
        match expected {
            Message::ClientHello => {
                HelloMessage::parse(first, HelloKind::Client)?;
            }
            Message::ServerHello { with_done } => {
                let hello = HelloMessage::parse(first, HelloKind::Server)?;
                if hello.find_extension(EXT_ALPN).is_some() {
                    return Err("unsolicited ALPN extension in ServerHello".into());
                }
                if with_done && rest != [14, 0, 0, 0] {
                    return Err("ServerHelloDone missing".into());
                }
                return Ok(());
            }
            Message::ClientKeyExchange if first[0] == 16 => {}
            Message::Finished => {
                if first[0] != 20 || first[4..] != self.verify_data(peer)[..] {
                    return Err("Finished verification failed".into());
                }
            }
            _ => return Err(format!("unexpected handshake message {}", first[0]).into()),
        }
        if !rest.is_empty() {
            return Err("trailing handshake data".into());
        }
        Ok(())
    }

    fn next_status(&self) -> HandshakeStatus {
        match self.steps.front() {
            Some(Step::Send(_)) => HandshakeStatus::NeedWrap,
            Some(Step::Recv(_)) => HandshakeStatus::NeedUnwrap,
            None => HandshakeStatus::Finished,
        }
    }
}

impl TlsEngine for ToyEngine {
    fn role(&self) -> Role {
        self.role
    }

    fn wrap(&mut self, src: &[&[u8]], dst: &mut [u8]) -> Result<EngineResult, BoxError> {
        if self.closed {
            return Ok(EngineResult::closed(self.handshake_status()));
        }
        let sending = matches!(self.steps.front(), Some(Step::Send(_)));
        let (content_type, payload, consumed) = match self.steps.front() {
            Some(Step::Send(message)) => {
                let (content_type, payload) = self.encode(*message);
                (content_type, payload, 0)
            }
            Some(Step::Recv(_)) => {
                return Ok(EngineResult::new(Status::Ok, HandshakeStatus::NeedUnwrap, 0, 0));
            }
            None => {
                let payload = src.concat();
                let consumed = payload.len();
                (APPLICATION_DATA, payload, consumed)
            }
        };
        let len = RECORD_HEADER_LEN + payload.len();
        if dst.len() < len {
            return Ok(EngineResult::new(Status::BufferOverflow, self.handshake_status(), 0, 0));
        }
        dst[..len].copy_from_slice(&record(content_type, &payload));

        let status = if sending {
            self.steps.pop_front();
            if content_type == HANDSHAKE {
                self.hash.update(&payload);
            }
            self.next_status()
        } else {
            HandshakeStatus::NotHandshaking
        };
        Ok(EngineResult::new(Status::Ok, status, consumed, len))
    }

    fn unwrap(&mut self, src: &[u8], dst: &mut [&mut [u8]]) -> Result<EngineResult, BoxError> {
        if self.closed {
            return Ok(EngineResult::closed(self.handshake_status()));
        }
        let Ok(header) = RecordHeader::parse(src) else {
            return Ok(EngineResult::underflow());
        };
        let len = RECORD_HEADER_LEN + usize::from(header.length);
        if src.len() < len {
            return Ok(EngineResult::underflow());
        }
        let content_type = header.content_type as u8;
        let payload = &src[RECORD_HEADER_LEN..len];

        match self.steps.front().copied() {
            Some(Step::Recv(expected)) => {
                self.check(expected, content_type, payload)?;
                if content_type == HANDSHAKE {
                    self.hash.update(payload);
                }
                self.steps.pop_front();
                Ok(EngineResult::new(Status::Ok, self.next_status(), len, 0))
            }
            Some(Step::Send(_)) => Err("peer sent a record out of turn".into()),
            None => {
                if content_type != APPLICATION_DATA {
                    return Err("handshake record after completion".into());
                }
                let idle = HandshakeStatus::NotHandshaking;
                let Some(out) = dst.first_mut().filter(|out| out.len() >= payload.len()) else {
                    return Ok(EngineResult::new(Status::BufferOverflow, idle, 0, 0));
                };
                out[..payload.len()].copy_from_slice(payload);
                Ok(EngineResult::new(Status::Ok, idle, len, payload.len()))
            }
        }
    }

    fn handshake_status(&self) -> HandshakeStatus {
        match self.next_status() {
            HandshakeStatus::Finished => HandshakeStatus::NotHandshaking,
            status => status,
        }
    }

    fn close_outbound(&mut self) {
        self.closed = true;
    }

    fn transcript(&mut self) -> Option<&mut dyn HandshakeTranscript> {
        Some(&mut self.hash)
    }
}

pub fn handshake_message(msg_type: u8, body: &[u8]) -> Vec<u8> {
    let len = u32::try_from(body.len()).unwrap().to_be_bytes();
    let mut out = vec![msg_type, len[1], len[2], len[3]];
    out.extend_from_slice(body);
    out
}

pub fn record(content_type: u8, payload: &[u8]) -> Vec<u8> {
    let len = u16::try_from(payload.len()).unwrap().to_be_bytes();
    let mut out = vec![content_type, 3, 3, len[0], len[1]];
    out.extend_from_slice(payload);
    out
}

fn extensions_block(extensions: &[(u16, &[u8])]) -> Vec<u8> {
    let mut entries = Vec::new();
    for (ext_type, data) in extensions {
        entries.extend_from_slice(&ext_type.to_be_bytes());
        entries.extend_from_slice(&u16::try_from(data.len()).unwrap().to_be_bytes());
        entries.extend_from_slice(data);
    }
    let mut block = u16::try_from(entries.len()).unwrap().to_be_bytes().to_vec();
    block.extend_from_slice(&entries);
    block
}

/// ClientHello as the engine produces it: sixteen suites, a session id to
/// resume, and a renegotiation_info extension.
pub fn client_hello_message() -> Vec<u8> {
    let mut body = vec![3, 3];
    body.extend_from_slice(&[0xc1; 32]);
    body.push(32);
    body.extend_from_slice(&[0x5e; 32]);
    body.extend_from_slice(&32u16.to_be_bytes());
    for suite in 0xc02bu16..0xc03b {
        body.extend_from_slice(&suite.to_be_bytes());
    }
    body.extend_from_slice(&[1, 0]);
    body.extend_from_slice(&extensions_block(&[(RENEGOTIATION_INFO, &[0])]));
    handshake_message(1, &body)
}

pub fn server_hello_message() -> Vec<u8> {
    server_hello_with_extensions(&[(RENEGOTIATION_INFO, &[0])])
}

/// ServerHello selecting `protocol`, as a peer with native ALPN would send it.
pub fn server_hello_with_alpn(protocol: &[u8]) -> Vec<u8> {
    let mut alpn = u16::try_from(protocol.len() + 1).unwrap().to_be_bytes().to_vec();
    alpn.push(u8::try_from(protocol.len()).unwrap());
    alpn.extend_from_slice(protocol);
    server_hello_with_extensions(&[(RENEGOTIATION_INFO, &[0][..]), (EXT_ALPN, &alpn[..])])
}

fn server_hello_with_extensions(extensions: &[(u16, &[u8])]) -> Vec<u8> {
    let mut body = vec![3, 3];
    body.extend_from_slice(&[0x5f; 32]);
    body.push(32);
    body.extend_from_slice(&[0x5e; 32]);
    body.extend_from_slice(&0xc02fu16.to_be_bytes());
    body.push(0);
    body.extend_from_slice(&extensions_block(extensions));
    handshake_message(2, &body)
}

/// Byte pipes between two engines, driven until both stop handshaking.
pub struct Link {
    pub to_server: Vec<u8>,
    pub to_client: Vec<u8>,
    pub wrap_capacity: usize,
}

impl Link {
    pub fn new(wrap_capacity: usize) -> Self {
        Self {
            to_server: Vec::new(),
            to_client: Vec::new(),
            wrap_capacity,
        }
    }

    /// Run the handshake to completion.
    ///
    /// Each side writes its whole flight before the other reads, so several
    /// records routinely arrive in a single buffer.
    pub fn handshake<C: TlsEngine, S: TlsEngine>(
        &mut self,
        client: &mut C,
        server: &mut S,
    ) -> Result<(), BoxError> {
        let capacity = self.wrap_capacity;
        for _ in 0..64 {
            let client_progress = pump(client, &mut self.to_client, &mut self.to_server, capacity)?;
            let server_progress = pump(server, &mut self.to_server, &mut self.to_client, capacity)?;
            if !client.handshake_status().is_handshaking()
                && !server.handshake_status().is_handshaking()
            {
                return Ok(());
            }
            if !client_progress && !server_progress {
                return Err("handshake stalled".into());
            }
        }
        Err("handshake did not complete".into())
    }
}

/// Drive one side until it waits on its peer. Returns whether anything moved.
fn pump<E: TlsEngine>(
    engine: &mut E,
    inbound: &mut Vec<u8>,
    outbound: &mut Vec<u8>,
    capacity: usize,
) -> Result<bool, BoxError> {
    let mut moved = false;
    loop {
        match engine.handshake_status() {
            HandshakeStatus::NeedWrap => {
                let mut buf = vec![0u8; capacity];
                let result = engine.wrap(&[], &mut buf)?;
                if result.bytes_produced == 0 {
                    return Ok(moved);
                }
                outbound.extend_from_slice(&buf[..result.bytes_produced]);
            }
            HandshakeStatus::NeedUnwrap if !inbound.is_empty() => {
                let result = engine.unwrap(inbound, &mut [])?;
                if result.bytes_consumed == 0 {
                    return Ok(moved);
                }
                inbound.drain(..result.bytes_consumed);
            }
            _ => return Ok(moved),
        }
        moved = true;
    }
}
