//! 限速流量发生器
//!
//! 自时钟的发送循环：每写出一个 `packet_size` 字节的单元，就按
//! `packet_size * 8 / rate` 计算下一次发送的间隔并调度自己，直到
//! 发完 `packet_budget` 个单元或被停止。间隔只由配置值决定，不依赖
//! 实际耗时，所以调度抖动不会累积。

use std::net::SocketAddrV4;

use thiserror::Error;
use tracing::{debug, trace, warn};

use super::{AppContext, Application, GeneratorSend};
use crate::net::{DataRate, SocketError, SocketId};
use crate::sim::{EventId, SimTime};

#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("invalid generator configuration: {0}")]
    InvalidConfiguration(&'static str),
    #[error("generator is not configured")]
    NotConfigured,
    #[error("generator is already running")]
    AlreadyRunning,
    #[error(transparent)]
    Transport(#[from] SocketError),
}

#[derive(Debug, Clone)]
struct GeneratorConfig {
    socket: SocketId,
    peer: SocketAddrV4,
    packet_size: u32,
    packet_budget: u64,
    rate: DataRate,
}

#[derive(Debug, Default)]
pub struct TrafficGenerator {
    cfg: Option<GeneratorConfig>,
    running: bool,
    /// socket 已绑定，停止时需要关闭
    opened: bool,
    sent_count: u64,
    send_failures: u64,
    pending_send: Option<EventId>,
    first_send_at: Option<SimTime>,
    last_send_at: Option<SimTime>,
}

impl TrafficGenerator {
    /// 空闲状态，尚未绑定 socket
    pub fn new() -> Self {
        Self::default()
    }

    /// 仅保存参数，不产生其它副作用。
    pub fn configure(
        &mut self,
        socket: SocketId,
        peer: SocketAddrV4,
        packet_size: u32,
        packet_budget: u64,
        rate: DataRate,
    ) -> Result<(), GeneratorError> {
        if packet_size == 0 {
            return Err(GeneratorError::InvalidConfiguration("packet size must be positive"));
        }
        if packet_budget == 0 {
            return Err(GeneratorError::InvalidConfiguration("packet budget must be positive"));
        }
        if rate.bps() == 0 {
            return Err(GeneratorError::InvalidConfiguration("rate must be positive"));
        }
        self.cfg = Some(GeneratorConfig {
            socket,
            peer,
            packet_size,
            packet_budget,
            rate,
        });
        Ok(())
    }

    pub fn is_configured(&self) -> bool {
        self.cfg.is_some()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn sent_count(&self) -> u64 {
        self.sent_count
    }

    /// 被传输层拒绝的写入次数（仍计入 `sent_count`）
    pub fn send_failures(&self) -> u64 {
        self.send_failures
    }

    pub fn pending_send(&self) -> Option<EventId> {
        self.pending_send
    }

    pub fn first_send_at(&self) -> Option<SimTime> {
        self.first_send_at
    }

    pub fn last_send_at(&self) -> Option<SimTime> {
        self.last_send_at
    }

    pub fn socket(&self) -> Option<SocketId> {
        self.cfg.as_ref().map(|c| c.socket)
    }

    pub fn peer(&self) -> Option<SocketAddrV4> {
        self.cfg.as_ref().map(|c| c.peer)
    }

    pub fn packet_size(&self) -> Option<u32> {
        self.cfg.as_ref().map(|c| c.packet_size)
    }

    pub fn packet_budget(&self) -> Option<u64> {
        self.cfg.as_ref().map(|c| c.packet_budget)
    }

    pub fn rate(&self) -> Option<DataRate> {
        self.cfg.as_ref().map(|c| c.rate)
    }

    /// 相邻两次发送的间隔，四舍五入到纳秒
    pub fn interval(&self) -> Option<SimTime> {
        let cfg = self.cfg.as_ref()?;
        let bits = cfg.packet_size as u128 * 8;
        let rate = cfg.rate.bps() as u128;
        let ns = (bits * 1_000_000_000 + rate / 2) / rate;
        Some(SimTime(u64::try_from(ns).unwrap_or(u64::MAX)))
    }

    /// 写出一个单元，并在预算未用完时调度下一次发送。
    pub(crate) fn send_unit(&mut self, ctx: &mut AppContext<'_>) {
        let Some(cfg) = self.cfg.as_ref() else {
            self.pending_send = None;
            return;
        };
        let now = ctx.sim.now();
        if let Err(e) = ctx.net.send(cfg.socket, cfg.packet_size, ctx.sim) {
            self.send_failures += 1;
            // 传输层拒绝通常成片出现，只对第一次告警
            if self.send_failures == 1 {
                warn!(app = ?ctx.app, error = %e, "发送失败，不重试");
            } else {
                trace!(app = ?ctx.app, error = %e, "发送失败");
            }
        }
        self.sent_count += 1;
        self.first_send_at.get_or_insert(now);
        self.last_send_at = Some(now);

        if self.running && self.sent_count < cfg.packet_budget {
            let Some(interval) = self.interval() else {
                self.pending_send = None;
                return;
            };
            self.pending_send = Some(ctx.sim.schedule_after(interval, GeneratorSend { app: ctx.app }));
        } else {
            self.pending_send = None;
            if self.sent_count >= cfg.packet_budget {
                debug!(app = ?ctx.app, sent = self.sent_count, "发送预算已用完");
            }
        }
    }
}

impl Application for TrafficGenerator {
    type Error = GeneratorError;

    fn activate(&mut self, ctx: &mut AppContext<'_>) -> Result<(), GeneratorError> {
        let Some(cfg) = self.cfg.as_ref() else {
            return Err(GeneratorError::NotConfigured);
        };
        if self.running {
            return Err(GeneratorError::AlreadyRunning);
        }
        let local = ctx.net.bind(cfg.socket)?;
        self.opened = true;
        ctx.net.connect(cfg.socket, cfg.peer, ctx.sim)?;
        debug!(app = ?ctx.app, local = %local, peer = %cfg.peer, rate = %cfg.rate, "发生器已连接");

        self.running = true;
        self.sent_count = 0;
        self.send_unit(ctx);
        Ok(())
    }

    fn deactivate(&mut self, ctx: &mut AppContext<'_>) {
        if let Some(id) = self.pending_send.take() {
            ctx.sim.cancel(id);
        }
        // 未绑定过的 socket 保持原样
        if let Some(cfg) = self.cfg.as_ref().filter(|_| self.opened) {
            if let Err(e) = ctx.net.close(cfg.socket, ctx.sim) {
                debug!(app = ?ctx.app, error = %e, "关闭 socket 失败");
            }
        }
        self.opened = false;
        self.running = false;
    }
}
