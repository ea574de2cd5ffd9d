//! 迭代账本
//!
//! 每完成一次迭代，引擎追加一条记录：每条链路的聚合流量、每条路径的代价与
//! 流量、每个 commodity 的最小代价路径，以及本次迭代中出现的数值退化。
//! 账本是外部报告读取运行结果的唯一通道。

use std::collections::HashMap;

use serde::{Serialize, Serializer};

use crate::net::{CommodityId, Link, PathId};

/// 按值去重的链路表：相同 `(source, target, capacity)` 的链路共享一个下标。
#[derive(Debug, Clone, Default)]
pub struct LinkTable {
    links: Vec<Link>,
    index: HashMap<Link, usize>,
}

impl LinkTable {
    /// 返回链路的下标，首次出现时分配新下标。
    pub fn intern(&mut self, link: Link) -> usize {
        if let Some(&idx) = self.index.get(&link) {
            return idx;
        }
        let idx = self.links.len();
        self.links.push(link);
        self.index.insert(link, idx);
        idx
    }

    pub fn index_of(&self, link: &Link) -> Option<usize> {
        self.index.get(link).copied()
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

impl Serialize for LinkTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.links.serialize(serializer)
    }
}

/// 数值退化的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Degeneracy {
    /// 路径与参考路径的链路集合完全相同
    EmptySymmetricDifference,
    /// 对称差中的链路全部超过阈值，曲率之和为 0
    SaturatedCurvature,
}

/// 一次被跳过的路径更新（`H_kp == 0`），流量保持不变。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DegenerateUpdate {
    pub commodity: CommodityId,
    /// 路径在 commodity 中的序号
    pub path: usize,
    pub path_id: PathId,
    pub reason: Degeneracy,
}

#[derive(Debug, Clone, Serialize)]
pub struct IterationRecord {
    pub iteration: usize,
    /// 与 `History::links()` 对齐
    pub link_flows: Vec<f64>,
    /// `[commodity][path 序号]`
    pub path_costs: Vec<Vec<f64>>,
    /// `[commodity][path 序号]`
    pub path_traffic: Vec<Vec<f64>>,
    /// 每个 commodity 在本次代价下的最小代价路径序号
    pub best_paths: Vec<usize>,
    pub degenerate: Vec<DegenerateUpdate>,
}

impl IterationRecord {
    /// commodity 在本次迭代结束时的总流量
    pub fn commodity_traffic(&self, commodity: CommodityId) -> Option<f64> {
        self.path_traffic
            .get(commodity.0)
            .map(|paths| paths.iter().sum())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct History {
    links: LinkTable,
    iterations: Vec<IterationRecord>,
}

impl History {
    pub(crate) fn new(links: LinkTable) -> Self {
        Self {
            links,
            iterations: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, record: IterationRecord) {
        debug_assert_eq!(record.iteration, self.iterations.len());
        debug_assert_eq!(record.link_flows.len(), self.links.len());
        self.iterations.push(record);
    }

    /// 出现在任意路径上的所有不同链路
    pub fn links(&self) -> &[Link] {
        self.links.links()
    }

    pub fn link_table(&self) -> &LinkTable {
        &self.links
    }

    pub fn len(&self) -> usize {
        self.iterations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.iterations.is_empty()
    }

    pub fn iterations(&self) -> &[IterationRecord] {
        &self.iterations
    }

    pub fn get(&self, iteration: usize) -> Option<&IterationRecord> {
        self.iterations.get(iteration)
    }

    pub fn last(&self) -> Option<&IterationRecord> {
        self.iterations.last()
    }

    /// 第 `iteration` 次迭代中某条链路（按值匹配）的聚合流量
    pub fn link_flow(&self, iteration: usize, link: &Link) -> Option<f64> {
        let idx = self.links.index_of(link)?;
        self.get(iteration).map(|r| r.link_flows[idx])
    }

    pub fn path_cost(&self, iteration: usize, commodity: CommodityId, path: usize) -> Option<f64> {
        self.get(iteration)?
            .path_costs
            .get(commodity.0)?
            .get(path)
            .copied()
    }

    pub fn best_path(&self, iteration: usize, commodity: CommodityId) -> Option<usize> {
        self.get(iteration)?.best_paths.get(commodity.0).copied()
    }

    /// 全部迭代中记录的数值退化
    pub fn degenerate_updates(&self) -> impl Iterator<Item = (usize, &DegenerateUpdate)> {
        self.iterations
            .iter()
            .flat_map(|r| r.degenerate.iter().map(move |d| (r.iteration, d)))
    }
}
