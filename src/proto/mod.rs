//! 传输层/协议模块
//!
//! 包含 TCP 的简化实现（用于仿真实验）。

pub mod tcp;

// Segment tag types live in `net::transport`.
