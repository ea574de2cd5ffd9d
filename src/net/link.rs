//! 链路类型
//!
//! 定义有向、带容量的网络链路。链路是值类型：相等与哈希都按
//! `(source, target, capacity)` 三元组比较，独立构造的两个相同链路
//! 会聚合到同一个流量桶里。

use super::error::{Result, TeError};
use super::id::NodeId;
use serde::Serialize;
use std::fmt;
use std::hash::{Hash, Hasher};

/// 网络链路
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Link {
    source: NodeId,
    target: NodeId,
    capacity: f64,
}

impl Link {
    /// 创建新链路，容量必须为有限正数。
    pub fn new(source: NodeId, target: NodeId, capacity: f64) -> Result<Self> {
        if !(capacity.is_finite() && capacity > 0.0) {
            return Err(TeError::InvalidCapacity {
                src: source,
                dst: target,
                capacity,
            });
        }
        Ok(Self {
            source,
            target,
            capacity,
        })
    }

    pub fn source(&self) -> NodeId {
        self.source
    }

    pub fn target(&self) -> NodeId {
        self.target
    }

    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    /// 给定流量下的利用率
    pub fn utilization(&self, flow: f64) -> f64 {
        flow / self.capacity
    }

    fn key(&self) -> (NodeId, NodeId, u64) {
        (self.source, self.target, self.capacity.to_bits())
    }
}

impl PartialEq for Link {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

// capacity 在构造时已排除 NaN，按位比较即可满足 Eq。
impl Eq for Link {}

impl Hash for Link {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{} (cap {})", self.source, self.target, self.capacity)
    }
}
