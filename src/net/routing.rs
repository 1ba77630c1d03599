//! 全局路由
//!
//! 与 ns 风格的 “global routing” 类似：在所有节点都装好设备之后，
//! 基于节点邻接关系按最短跳数预计算每个 (from, dst) 的下一跳。
//! 存在多个等价下一跳时取编号最小的节点，保证结果确定。

use std::collections::{HashMap, VecDeque};

use super::id::NodeId;

#[derive(Debug, Default, Clone)]
pub struct RoutingTable {
    dirty: bool,
    /// (from, dst) -> 下一跳
    next_hop: HashMap<(NodeId, NodeId), NodeId>,
}

impl RoutingTable {
    pub fn new() -> Self {
        Self {
            dirty: true,
            next_hop: HashMap::new(),
        }
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_built(&self) -> bool {
        !self.dirty
    }

    /// 基于当前拓扑重建路由表。
    ///
    /// `adj[from]` 为从 `from` 出发一跳可达的邻居（链路均为双向）。
    pub fn build(&mut self, adj: &[Vec<NodeId>]) {
        let n = adj.len();
        self.next_hop.clear();

        // 对每个 dst 做 BFS 得到最短跳数 dist[*]，
        // 再为每个 from 选出满足 dist[next] = dist[from] - 1 的最小编号邻居。
        let mut dist: Vec<u32> = vec![u32::MAX; n];
        let mut q: VecDeque<NodeId> = VecDeque::new();

        for dst_idx in 0..n {
            dist.fill(u32::MAX);
            q.clear();

            dist[dst_idx] = 0;
            q.push_back(NodeId(dst_idx));

            while let Some(v) = q.pop_front() {
                let dv = dist[v.0];
                for &nb in &adj[v.0] {
                    if dist[nb.0] == u32::MAX {
                        dist[nb.0] = dv.saturating_add(1);
                        q.push_back(nb);
                    }
                }
            }

            for from_idx in 0..n {
                if from_idx == dst_idx {
                    continue;
                }
                let df = dist[from_idx];
                if df == u32::MAX {
                    continue; // unreachable
                }
                let best = adj[from_idx]
                    .iter()
                    .copied()
                    .filter(|nh| dist[nh.0] == df - 1)
                    .min();
                if let Some(nh) = best {
                    self.next_hop.insert((NodeId(from_idx), NodeId(dst_idx)), nh);
                }
            }
        }

        self.dirty = false;
    }

    /// 获取 (from, dst) 的下一跳
    pub fn next_hop(&self, from: NodeId, dst: NodeId) -> Option<NodeId> {
        self.next_hop.get(&(from, dst)).copied()
    }

    pub fn len(&self) -> usize {
        self.next_hop.len()
    }

    pub fn is_empty(&self) -> bool {
        self.next_hop.is_empty()
    }
}
