//! 接收端：监听一个端口，统计按序收到的字节数。

use tracing::debug;

use super::{AppContext, Application};
use crate::net::{SocketError, SocketId};

#[derive(Debug)]
pub struct PacketSink {
    port: u16,
    socket: Option<SocketId>,
    listening: bool,
    /// 停止时的最终计数
    final_rx: u64,
}

impl PacketSink {
    pub fn new(port: u16) -> Self {
        Self {
            port,
            socket: None,
            listening: false,
            final_rx: 0,
        }
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn socket(&self) -> Option<SocketId> {
        self.socket
    }

    pub fn is_listening(&self) -> bool {
        self.listening
    }

    /// 停止时记录的累计接收字节数
    pub fn total_rx(&self) -> u64 {
        self.final_rx
    }
}

impl Application for PacketSink {
    type Error = SocketError;

    fn activate(&mut self, ctx: &mut AppContext<'_>) -> Result<(), SocketError> {
        if self.listening {
            return Ok(());
        }
        let sock = ctx.net.create_socket(ctx.node);
        self.socket = Some(sock);
        ctx.net.bind_port(sock, self.port)?;
        ctx.net.listen(sock)?;
        self.listening = true;
        Ok(())
    }

    fn deactivate(&mut self, ctx: &mut AppContext<'_>) {
        let Some(sock) = self.socket else {
            return;
        };
        if self.listening {
            self.final_rx = ctx.net.received_bytes(sock);
            if let Err(e) = ctx.net.close(sock, ctx.sim) {
                debug!(app = ?ctx.app, error = %e, "关闭监听 socket 失败");
            }
            self.listening = false;
        }
    }
}
