//! DropTail（尾丢弃）队列
//!
//! 当队列中的包数达到上限时，直接丢弃新到达的 packet。

use std::collections::VecDeque;

use crate::net::Packet;

#[derive(Debug)]
pub struct DropTailQueue {
    max_pkts: usize,
    cur_bytes: u64,
    q: VecDeque<Packet>,
}

impl DropTailQueue {
    pub fn new(max_pkts: usize) -> Self {
        Self {
            max_pkts,
            cur_bytes: 0,
            q: VecDeque::new(),
        }
    }

    /// 入队：成功返回 Ok；若被丢弃则返回 Err(pkt)
    pub fn enqueue(&mut self, pkt: Packet) -> Result<(), Packet> {
        if self.is_full() {
            return Err(pkt);
        }
        self.cur_bytes = self.cur_bytes.saturating_add(pkt.size_bytes as u64);
        self.q.push_back(pkt);
        Ok(())
    }

    pub fn dequeue(&mut self) -> Option<Packet> {
        let pkt = self.q.pop_front()?;
        self.cur_bytes = self.cur_bytes.saturating_sub(pkt.size_bytes as u64);
        Some(pkt)
    }

    pub fn len(&self) -> usize {
        self.q.len()
    }

    pub fn is_full(&self) -> bool {
        self.q.len() >= self.max_pkts
    }

    pub fn is_empty(&self) -> bool {
        self.q.is_empty()
    }

    pub fn bytes(&self) -> u64 {
        self.cur_bytes
    }

    pub fn capacity_pkts(&self) -> usize {
        self.max_pkts
    }

    pub fn set_capacity_pkts(&mut self, max_pkts: usize) {
        self.max_pkts = max_pkts;
    }
}
