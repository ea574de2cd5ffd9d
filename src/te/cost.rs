//! 拥塞代价模型
//!
//! 代价函数只通过一阶导数 `f'`（边际代价，用于给链路定价）和二阶导数
//! `f''`（曲率，用于缩放梯度步长）出现。利用率超过阈值 `p` 后两者都被
//! 截断：`f'` 饱和为常数，`f''` 置零，避免 `x -> c` 时发散。

use crate::net::{Link, Result, TeError};

/// 默认饱和阈值（容量的比例）
pub const DEFAULT_THRESHOLD: f64 = 0.99;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostModel {
    threshold: f64,
}

impl Default for CostModel {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl CostModel {
    pub fn new(threshold: f64) -> Result<Self> {
        if !(threshold > 0.0 && threshold < 1.0) {
            return Err(TeError::InvalidThreshold(threshold));
        }
        Ok(Self { threshold })
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    fn saturated(&self, capacity: f64, flow: f64) -> bool {
        flow > self.threshold * capacity
    }

    /// 边际代价 `f'(c, x)`
    pub fn marginal(&self, capacity: f64, flow: f64) -> f64 {
        if self.saturated(capacity, flow) {
            let headroom = 1.0 - self.threshold;
            1.0 / (capacity * headroom * headroom)
        } else {
            let slack = capacity - flow;
            capacity / (slack * slack)
        }
    }

    /// 曲率 `f''(c, x)`；超过阈值后为 0。
    pub fn curvature(&self, capacity: f64, flow: f64) -> f64 {
        if self.saturated(capacity, flow) {
            0.0
        } else {
            let slack = capacity - flow;
            2.0 * capacity / (slack * slack * slack)
        }
    }

    /// 沿路径累加边际代价，`flow_of` 给出每条链路当前的聚合流量。
    pub fn path_cost<'a>(
        &self,
        links: impl IntoIterator<Item = &'a Link>,
        mut flow_of: impl FnMut(&Link) -> f64,
    ) -> f64 {
        links
            .into_iter()
            .map(|l| self.marginal(l.capacity(), flow_of(l)))
            .sum()
    }
}
