//! 错误类型
//!
//! 模型构建、路径挂载和引擎配置阶段的错误。数值退化（`H_kp == 0`）
//! 不属于错误，而是记录在迭代账本中。

use super::id::{CommodityId, NodeId};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TeError {
    #[error("link {src}->{dst} has invalid capacity {capacity} (must be finite and > 0)")]
    InvalidCapacity {
        src: NodeId,
        dst: NodeId,
        capacity: f64,
    },
    #[error("commodity {src}->{dst} has invalid requirement {requirement} (must be finite and >= 0)")]
    InvalidRequirement {
        src: NodeId,
        dst: NodeId,
        requirement: f64,
    },
    #[error("invalid path for commodity {commodity}: {reason}")]
    InvalidPath {
        commodity: CommodityId,
        reason: String,
    },
    #[error("unknown commodity {0}")]
    UnknownCommodity(CommodityId),
    #[error("commodity {commodity} ({src}->{dst}) has no candidate paths")]
    NoPaths {
        commodity: CommodityId,
        src: NodeId,
        dst: NodeId,
    },
    #[error("cost threshold {0} must lie strictly between 0 and 1")]
    InvalidThreshold(f64),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, TeError>;
