//! Commodity 与其集合
//!
//! `CommoditySet` 独占所有 commodity 及其路径，并持有本次运行内的路径 id 计数器。

use super::error::{Result, TeError};
use super::id::{CommodityId, NodeId, PathId};
use super::link::Link;
use super::path::{Path, check_route};
use serde::Serialize;
use tracing::debug;

/// 一个 source -> target 的需求单元
#[derive(Debug, Clone, Serialize)]
pub struct Commodity {
    id: CommodityId,
    source: NodeId,
    target: NodeId,
    requirement: f64,
    paths: Vec<Path>,
}

impl Commodity {
    pub fn id(&self) -> CommodityId {
        self.id
    }

    pub fn source(&self) -> NodeId {
        self.source
    }

    pub fn target(&self) -> NodeId {
        self.target
    }

    pub fn requirement(&self) -> f64 {
        self.requirement
    }

    pub fn paths(&self) -> &[Path] {
        &self.paths
    }

    pub(crate) fn paths_mut(&mut self) -> &mut [Path] {
        &mut self.paths
    }

    /// 所有路径当前承载的流量之和
    pub fn total_traffic(&self) -> f64 {
        self.paths.iter().map(Path::traffic).sum()
    }
}

/// 一次运行中的全部 commodity
#[derive(Debug, Clone, Serialize)]
pub struct CommoditySet {
    commodities: Vec<Commodity>,
    #[serde(skip)]
    next_path_id: u64,
}

impl Default for CommoditySet {
    fn default() -> Self {
        Self {
            commodities: Vec::new(),
            next_path_id: 1,
        }
    }
}

impl CommoditySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加一个尚无路径的 commodity
    pub fn add_commodity(
        &mut self,
        source: NodeId,
        target: NodeId,
        requirement: f64,
    ) -> Result<CommodityId> {
        if !(requirement.is_finite() && requirement >= 0.0) {
            return Err(TeError::InvalidRequirement {
                src: source,
                dst: target,
                requirement,
            });
        }
        let id = CommodityId(self.commodities.len());
        self.commodities.push(Commodity {
            id,
            source,
            target,
            requirement,
            paths: Vec::new(),
        });
        Ok(id)
    }

    /// 为 commodity 追加一条候选路径，校验端点与连续性。
    pub fn add_path(&mut self, commodity: CommodityId, links: Vec<Link>) -> Result<PathId> {
        let c = self
            .commodities
            .get_mut(commodity.0)
            .ok_or(TeError::UnknownCommodity(commodity))?;
        check_route(&links, c.source, c.target)
            .map_err(|reason| TeError::InvalidPath { commodity, reason })?;

        let id = PathId(self.next_path_id);
        self.next_path_id += 1;
        debug!(%commodity, path = %id, hops = links.len(), "挂载路径");
        c.paths.push(Path::new(id, commodity, links));
        Ok(id)
    }

    pub fn get(&self, id: CommodityId) -> Option<&Commodity> {
        self.commodities.get(id.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Commodity> {
        self.commodities.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Commodity> {
        self.commodities.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.commodities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commodities.is_empty()
    }

    pub fn total_paths(&self) -> usize {
        self.commodities.iter().map(|c| c.paths.len()).sum()
    }

    /// 没有任何候选路径的 commodity
    pub fn unroutable(&self) -> Vec<CommodityId> {
        self.commodities
            .iter()
            .filter(|c| c.paths.is_empty())
            .map(|c| c.id)
            .collect()
    }

    /// 显式剔除没有路径的 commodity，返回被剔除的 `(source, target, requirement)`。
    ///
    /// 剩余 commodity 会重新编号，路径上的 commodity 句柄随之更新。
    pub fn exclude_unroutable(&mut self) -> Vec<(NodeId, NodeId, f64)> {
        let (kept, dropped): (Vec<_>, Vec<_>) = std::mem::take(&mut self.commodities)
            .into_iter()
            .partition(|c| !c.paths.is_empty());

        self.commodities = kept;
        for (idx, c) in self.commodities.iter_mut().enumerate() {
            c.id = CommodityId(idx);
            for path in &mut c.paths {
                path.set_commodity(c.id);
            }
        }

        dropped
            .into_iter()
            .map(|c| (c.source, c.target, c.requirement))
            .collect()
    }
}
