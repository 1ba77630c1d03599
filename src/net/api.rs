//! Socket-facing API used by applications.

use std::net::SocketAddrV4;

use thiserror::Error;

use crate::sim::Simulator;

use super::{NodeId, SocketId};

/// Transport failures surfaced to applications unchanged.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SocketError {
    #[error("unknown socket {0:?}")]
    UnknownSocket(SocketId),
    #[error("socket is already bound")]
    AlreadyBound,
    #[error("socket is not bound")]
    NotBound,
    #[error("port {0} is already in use")]
    PortInUse(u16),
    #[error("no free ephemeral port")]
    PortsExhausted,
    #[error("socket is already connected")]
    AlreadyConnected,
    #[error("socket is not connected")]
    NotConnected,
    #[error("socket is closed")]
    Closed,
    #[error("send buffer full: {requested} bytes requested, {available} available")]
    SendBufferFull { requested: u32, available: u64 },
    #[error("no route to {0}")]
    NoRoute(std::net::Ipv4Addr),
}

/// Minimal connection-oriented socket API (bind/connect/send/close).
pub trait SocketApi {
    /// Create an unbound stream socket on `node`.
    fn create_socket(&mut self, node: NodeId) -> SocketId;
    /// Bind to an ephemeral local port.
    fn bind(&mut self, sock: SocketId) -> Result<SocketAddrV4, SocketError>;
    /// Bind to a fixed local port.
    fn bind_port(&mut self, sock: SocketId, port: u16) -> Result<SocketAddrV4, SocketError>;
    /// Accept incoming connections on the bound port.
    fn listen(&mut self, sock: SocketId) -> Result<(), SocketError>;
    /// Start the handshake with `peer`.
    fn connect(
        &mut self,
        sock: SocketId,
        peer: SocketAddrV4,
        sim: &mut Simulator,
    ) -> Result<(), SocketError>;
    /// Queue `len` bytes into the byte stream; all or nothing.
    fn send(&mut self, sock: SocketId, len: u32, sim: &mut Simulator) -> Result<u32, SocketError>;
    /// Stop accepting writes (or connections); closing twice is a no-op.
    fn close(&mut self, sock: SocketId, sim: &mut Simulator) -> Result<(), SocketError>;
    /// In-order bytes received (for listeners: summed over accepted connections).
    fn received_bytes(&self, sock: SocketId) -> u64;
}
