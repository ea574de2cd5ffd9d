//! 场景模块
//!
//! 此模块包含场景描述（JSON）、需求对采样以及从场景到可运行 commodity 集合的装配。

// 子模块声明
mod demand;
mod scenario;
mod setup;

// 重新导出公共接口
pub use demand::{random_pairs, strategic_pairs};
pub use scenario::{
    Builtin, CommoditySpec, DemandSpec, LinkSpec, MissingPathPolicy, ScenarioMeta, ScenarioSpec,
    TopologySpec,
};
pub use setup::{SCHEMA_VERSION, ScenarioError, Setup, attach_discovered, build, load, parse};
