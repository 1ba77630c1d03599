//! IPv4 地址分配
//!
//! 按子网顺序为设备分配 `.1`、`.2`、… 的主机地址。

use std::net::Ipv4Addr;

/// 子网内顺序分配器
#[derive(Debug, Clone)]
pub struct Ipv4Allocator {
    network: u32,
    mask: u32,
    next_host: u32,
}

impl Ipv4Allocator {
    /// `network`/`prefix_len`，例如 `10.1.1.0/24`
    pub fn new(network: Ipv4Addr, prefix_len: u8) -> Self {
        let prefix_len = prefix_len.min(32);
        let mask = if prefix_len == 0 {
            0
        } else {
            u32::MAX << (32 - prefix_len as u32)
        };
        Self {
            network: u32::from(network) & mask,
            mask,
            next_host: 1,
        }
    }

    /// 下一个可用地址；子网耗尽（到达广播地址）时返回 None。
    pub fn next_addr(&mut self) -> Option<Ipv4Addr> {
        let host_bits = !self.mask;
        if self.next_host >= host_bits {
            return None;
        }
        let addr = Ipv4Addr::from(self.network | self.next_host);
        self.next_host += 1;
        Some(addr)
    }

    /// 地址是否落在该子网内
    pub fn contains(&self, addr: Ipv4Addr) -> bool {
        u32::from(addr) & self.mask == self.network
    }
}
