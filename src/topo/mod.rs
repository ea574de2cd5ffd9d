//! 拓扑构建
//!
//! 每个构建函数只产出链路集合（以及节点分组信息），与优化核心无关。

pub mod access_ring;
pub mod fat_tree;
pub mod reference;
