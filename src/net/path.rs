//! 路径类型
//!
//! 路径是一条有序链路序列，承载所属 commodity 需求的一部分流量。

use super::id::{CommodityId, NodeId, PathId};
use super::link::Link;
use serde::Serialize;

/// 候选路径
#[derive(Debug, Clone, Serialize)]
pub struct Path {
    id: PathId,
    /// 所属 commodity（只用于查找，不表达所有权）
    commodity: CommodityId,
    links: Vec<Link>,
    traffic: f64,
}

impl Path {
    pub(crate) fn new(id: PathId, commodity: CommodityId, links: Vec<Link>) -> Self {
        Self {
            id,
            commodity,
            links,
            traffic: 0.0,
        }
    }

    pub fn id(&self) -> PathId {
        self.id
    }

    pub fn commodity(&self) -> CommodityId {
        self.commodity
    }

    pub(crate) fn set_commodity(&mut self, commodity: CommodityId) {
        self.commodity = commodity;
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// 跳数
    pub fn hops(&self) -> usize {
        self.links.len()
    }

    pub fn traffic(&self) -> f64 {
        self.traffic
    }

    pub(crate) fn set_traffic(&mut self, traffic: f64) {
        self.traffic = traffic;
    }

    pub fn contains(&self, link: &Link) -> bool {
        self.links.contains(link)
    }

    /// 从 source 到 target 的节点序列；零长度路径返回空序列。
    pub fn nodes(&self) -> Vec<NodeId> {
        let Some(first) = self.links.first() else {
            return Vec::new();
        };
        let mut nodes = Vec::with_capacity(self.links.len() + 1);
        nodes.push(first.source());
        nodes.extend(self.links.iter().map(|l| l.target()));
        nodes
    }
}

/// 检查链路序列能否作为 `source -> target` 的路径：首尾端点匹配且相邻链路首尾相接。
pub(crate) fn check_route(
    links: &[Link],
    source: NodeId,
    target: NodeId,
) -> std::result::Result<(), String> {
    let (Some(first), Some(last)) = (links.first(), links.last()) else {
        if source == target {
            return Ok(());
        }
        return Err(format!("empty path between distinct nodes {source} and {target}"));
    };
    if first.source() != source {
        return Err(format!(
            "path starts at node {} but commodity source is {source}",
            first.source()
        ));
    }
    if last.target() != target {
        return Err(format!(
            "path ends at node {} but commodity target is {target}",
            last.target()
        ));
    }
    for (i, pair) in links.windows(2).enumerate() {
        if pair[0].target() != pair[1].source() {
            return Err(format!(
                "links {i} ({}) and {} ({}) are not contiguous",
                pair[0],
                i + 1,
                pair[1]
            ));
        }
    }
    Ok(())
}
