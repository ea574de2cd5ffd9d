//! 网络与流量数据模型
//!
//! 此模块包含链路、路径、commodity、拓扑以及 k 最短简单路径发现。

// 子模块声明
mod commodity;
mod error;
mod id;
mod link;
mod network;
mod path;
mod routing;

// 重新导出公共接口
pub use commodity::{Commodity, CommoditySet};
pub use error::{Result, TeError};
pub use id::{CommodityId, NodeId, PathId};
pub use link::Link;
pub use network::Network;
pub use path::Path;
pub use routing::PathSearch;
