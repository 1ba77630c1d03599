//! 拓扑构建

pub mod mixed;

pub use mixed::{MixedOpts, MixedTopology, TopologyError, build_mixed};
