//! 流量工程
//!
//! 代价模型、迭代引擎、迭代账本与结果汇总。

mod cost;
mod engine;
mod history;
mod report;

pub use cost::{CostModel, DEFAULT_THRESHOLD};
pub use engine::{RunOutcome, StopReason, TeConfig, TeEngine};
pub use history::{Degeneracy, DegenerateUpdate, History, IterationRecord, LinkTable};
pub use report::{CONSERVATION_TOLERANCE, Conservation, CostStats, LinkUsage, Report};
