//! 仿真器
//!
//! 定义事件驱动仿真器，维护当前时间与事件队列，支持取消与停止时刻。

use super::event::{Event, EventId};
use super::scheduled_event::ScheduledEvent;
use super::time::SimTime;
use super::world::World;
use std::collections::{BinaryHeap, HashSet};
use tracing::{debug, info, trace};

/// 事件驱动仿真器：维护当前时间与事件队列。
///
/// 被取消的事件仍留在堆中（惰性删除），出队时若不在 `live` 集合里就直接跳过。
#[derive(Default)]
pub struct Simulator {
    now: SimTime,
    next_seq: u64,
    q: BinaryHeap<ScheduledEvent>,
    live: HashSet<u64>,
    stop_at: Option<SimTime>,
    executed: u64,
}

impl Simulator {
    /// 获取当前仿真时间
    pub fn now(&self) -> SimTime {
        self.now
    }

    /// 已执行的事件数（不含被取消的）
    pub fn executed_events(&self) -> u64 {
        self.executed
    }

    /// 仍待执行的事件数
    pub fn pending_events(&self) -> usize {
        self.live.len()
    }

    /// 调度事件在指定时间执行；早于当前时间的请求按当前时间处理。
    #[tracing::instrument(skip(self, ev), fields(event_type = std::any::type_name::<E>(), schedule_at = ?at))]
    pub fn schedule<E: Event>(&mut self, at: SimTime, ev: E) -> EventId {
        let at = at.max(self.now);
        let seq = self.next_seq;
        trace!(now = ?self.now, seq, "调度事件");

        self.next_seq = self.next_seq.wrapping_add(1);
        self.q.push(ScheduledEvent {
            at,
            seq,
            ev: Box::new(ev),
        });
        self.live.insert(seq);

        debug!(queue_size = self.q.len(), "事件已加入队列");
        EventId(seq)
    }

    /// 调度事件在 `delay` 之后执行
    pub fn schedule_after<E: Event>(&mut self, delay: SimTime, ev: E) -> EventId {
        let at = self.now.saturating_add(delay);
        self.schedule(at, ev)
    }

    /// 取消一个待执行事件；返回该事件此前是否仍待执行。
    pub fn cancel(&mut self, id: EventId) -> bool {
        let removed = self.live.remove(&id.0);
        trace!(seq = id.0, removed, "取消事件");
        removed
    }

    /// 事件是否仍待执行（未执行且未取消）
    pub fn is_pending(&self, id: EventId) -> bool {
        self.live.contains(&id.0)
    }

    /// 设置停止时刻：`run` 只执行不晚于该时刻的事件。
    pub fn stop_at(&mut self, at: SimTime) {
        self.stop_at = Some(at);
    }

    /// 弹出下一个不晚于 `until` 的有效事件。
    fn pop_due(&mut self, until: SimTime) -> Option<ScheduledEvent> {
        while let Some(top) = self.q.peek() {
            if top.at > until {
                return None;
            }
            let item = self.q.pop()?;
            if self.live.remove(&item.seq) {
                return Some(item);
            }
            trace!(seq = item.seq, "跳过已取消事件");
        }
        None
    }

    /// 运行直到事件队列为空或到达 `until`（含 `until` 时刻的事件）。
    pub fn run_until(&mut self, until: SimTime, world: &mut dyn World) {
        while let Some(item) = self.pop_due(until) {
            self.now = item.at;
            self.executed = self.executed.saturating_add(1);
            item.ev.execute(self, world);
            world.on_tick(self);
        }
        self.now = self.now.max(until);
    }

    /// 运行仿真：若设置了停止时刻则运行到该时刻，否则直到事件队列为空。
    #[tracing::instrument(skip(self, world))]
    pub fn run(&mut self, world: &mut dyn World) {
        info!(stop_at = ?self.stop_at, "▶️  开始运行仿真");
        debug!(now = ?self.now, queue_size = self.q.len(), "初始状态");

        let before = self.executed;
        match self.stop_at {
            Some(until) => self.run_until(until, world),
            None => {
                while let Some(item) = self.pop_due(SimTime::MAX) {
                    self.now = item.at;
                    self.executed = self.executed.saturating_add(1);
                    item.ev.execute(self, world);
                    world.on_tick(self);
                }
            }
        }

        info!(
            total_events = self.executed - before,
            final_time = %self.now,
            "✅ 仿真完成"
        );
    }

    /// 释放所有待执行事件；返回被丢弃的事件数。
    pub fn teardown(&mut self) -> usize {
        let dropped = self.live.len();
        self.q.clear();
        self.live.clear();
        self.stop_at = None;
        debug!(dropped, "仿真器已销毁待执行事件");
        dropped
    }
}
