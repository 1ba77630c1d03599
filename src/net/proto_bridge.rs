//! Helpers for accessing the TCP stack from the simulation world.

use std::net::SocketAddrV4;

use crate::proto::tcp::TcpStack;
use crate::sim::{Simulator, World};

use super::api::{SocketApi, SocketError};
use super::net_world::net_world;
use super::{Network, NodeId, SocketId};

/// 临时取出 TCP 协议栈，避免 `&mut Network` 与 `&mut network.tcp` 重叠借用。
pub(crate) fn with_tcp_stack<F, R>(world: &mut dyn World, f: F) -> R
where
    F: FnOnce(&mut Network, &mut TcpStack) -> R,
{
    let w = net_world(world);
    with_tcp(&mut w.net, f)
}

fn with_tcp<F, R>(net: &mut Network, f: F) -> R
where
    F: FnOnce(&mut Network, &mut TcpStack) -> R,
{
    let mut tcp = std::mem::take(&mut net.tcp);
    let result = f(net, &mut tcp);
    net.tcp = tcp;
    result
}

impl SocketApi for Network {
    fn create_socket(&mut self, node: NodeId) -> SocketId {
        self.tcp.create(node)
    }

    fn bind(&mut self, sock: SocketId) -> Result<SocketAddrV4, SocketError> {
        self.tcp.bind(sock, None)
    }

    fn bind_port(&mut self, sock: SocketId, port: u16) -> Result<SocketAddrV4, SocketError> {
        self.tcp.bind(sock, Some(port))
    }

    fn listen(&mut self, sock: SocketId) -> Result<(), SocketError> {
        self.tcp.listen(sock)
    }

    fn connect(
        &mut self,
        sock: SocketId,
        peer: SocketAddrV4,
        sim: &mut Simulator,
    ) -> Result<(), SocketError> {
        with_tcp(self, |net, tcp| tcp.connect(sock, peer, sim, net))
    }

    fn send(&mut self, sock: SocketId, len: u32, sim: &mut Simulator) -> Result<u32, SocketError> {
        with_tcp(self, |net, tcp| tcp.send(sock, len, sim, net))
    }

    fn close(&mut self, sock: SocketId, sim: &mut Simulator) -> Result<(), SocketError> {
        self.tcp.close(sock, sim)
    }

    fn received_bytes(&self, sock: SocketId) -> u64 {
        self.tcp.received_bytes(sock)
    }
}
