//! 流量工程迭代引擎
//!
//! 第 0 次迭代把每个 commodity 的需求均分到它的所有路径上。之后的每次迭代，
//! 每个 commodity 只读取上一次迭代的快照：
//!
//! 1. 取上一次代价最小的路径作为参考路径 beta（并列时取第一条）；
//! 2. 其余每条路径 p 按曲率缩放的梯度步更新：
//!    `x_p' = max(0, x_p - (eta / H_kp) * (d_p - d_beta))`，
//!    其中 `H_kp` 是 p 与 beta 链路对称差上 `f''` 之和；
//! 3. beta 吸收剩余需求：`x_beta' = max(0, r - sum(x_p'))`。
//!
//! 所有 commodity 的新流量先写入缓冲区，全部算完后才统一写回并重建
//! 链路流量与路径代价快照。`H_kp == 0` 时跳过该路径并记入账本。

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use super::cost::{CostModel, DEFAULT_THRESHOLD};
use super::history::{Degeneracy, DegenerateUpdate, History, IterationRecord, LinkTable};
use crate::net::{Commodity, CommoditySet, Result, TeError};

/// 引擎参数
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TeConfig {
    /// 迭代次数上限 T
    pub iterations: usize,
    /// 梯度步长 eta
    pub step_size: f64,
    /// 代价函数饱和阈值 p
    pub threshold: f64,
    /// 收敛容差：某次更新后链路流量的最大相对变化低于该值即停止。
    /// `None` 时总是跑满 `iterations` 次。
    pub tolerance: Option<f64>,
}

impl Default for TeConfig {
    fn default() -> Self {
        Self {
            iterations: 200,
            step_size: 0.001,
            threshold: DEFAULT_THRESHOLD,
            tolerance: None,
        }
    }
}

/// 运行结束的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StopReason {
    BudgetExhausted,
    Converged { iteration: usize },
}

#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    pub stop: StopReason,
    pub history: History,
}

pub struct TeEngine {
    config: TeConfig,
    cost: CostModel,
    links: LinkTable,
    /// `[commodity][path]` -> 路径经过的链路下标（保持路径顺序）
    path_links: Vec<Vec<Vec<usize>>>,
    /// `[commodity][path]` -> 去重后的链路下标集合，用于求对称差
    path_sets: Vec<Vec<BTreeSet<usize>>>,
}

impl TeEngine {
    /// 校验参数并为每条路径解析链路下标。
    ///
    /// 任何没有路径的 commodity 都会导致 `TeError::NoPaths`；需要剔除的调用方
    /// 应当先显式调用 `CommoditySet::exclude_unroutable`。
    pub fn new(commodities: &CommoditySet, config: TeConfig) -> Result<Self> {
        if config.iterations == 0 {
            return Err(TeError::InvalidConfig(
                "iterations must be at least 1".into(),
            ));
        }
        if !(config.step_size.is_finite() && config.step_size > 0.0) {
            return Err(TeError::InvalidConfig(format!(
                "step_size must be finite and > 0, got {}",
                config.step_size
            )));
        }
        if let Some(eps) = config.tolerance {
            if !(eps.is_finite() && eps > 0.0) {
                return Err(TeError::InvalidConfig(format!(
                    "tolerance must be finite and > 0, got {eps}"
                )));
            }
        }
        let cost = CostModel::new(config.threshold)?;

        let mut links = LinkTable::default();
        let mut path_links = Vec::with_capacity(commodities.len());
        let mut path_sets = Vec::with_capacity(commodities.len());
        for c in commodities.iter() {
            if c.paths().is_empty() {
                return Err(TeError::NoPaths {
                    commodity: c.id(),
                    src: c.source(),
                    dst: c.target(),
                });
            }
            let idx: Vec<Vec<usize>> = c
                .paths()
                .iter()
                .map(|p| p.links().iter().map(|&l| links.intern(l)).collect())
                .collect();
            path_sets.push(
                idx.iter()
                    .map(|v| v.iter().copied().collect::<BTreeSet<_>>())
                    .collect(),
            );
            path_links.push(idx);
        }

        Ok(Self {
            config,
            cost,
            links,
            path_links,
            path_sets,
        })
    }

    pub fn config(&self) -> &TeConfig {
        &self.config
    }

    pub fn cost_model(&self) -> &CostModel {
        &self.cost
    }

    pub fn link_table(&self) -> &LinkTable {
        &self.links
    }

    /// 运行迭代，直到用完迭代预算或满足收敛容差。
    #[tracing::instrument(skip_all, fields(commodities = commodities.len(), iterations = self.config.iterations))]
    pub fn run(&self, commodities: &mut CommoditySet) -> Result<RunOutcome> {
        self.check_shape(commodities)?;
        info!(
            links = self.links.len(),
            paths = commodities.total_paths(),
            step_size = self.config.step_size,
            threshold = self.cost.threshold(),
            "开始流量工程迭代"
        );

        let mut history = History::new(self.links.clone());
        let mut stop = StopReason::BudgetExhausted;

        for t in 0..self.config.iterations {
            let mut degenerate = Vec::new();
            match history.last() {
                None => self.initialize(commodities),
                Some(prev) => {
                    let next: Vec<Vec<f64>> = commodities
                        .iter()
                        .map(|c| self.plan_commodity(c, prev, &mut degenerate))
                        .collect();
                    // 所有 commodity 都算完后才统一写回
                    for (c, traffic) in commodities.iter_mut().zip(next) {
                        for (path, x) in c.paths_mut().iter_mut().zip(traffic) {
                            path.set_traffic(x);
                        }
                    }
                }
            }

            let record = self.snapshot(t, commodities, degenerate);
            let delta = history
                .last()
                .map(|prev| max_relative_change(&prev.link_flows, &record.link_flows));
            debug!(
                iteration = t,
                max_delta = ?delta,
                degenerate = record.degenerate.len(),
                "迭代完成"
            );
            history.push(record);

            if let (Some(eps), Some(delta)) = (self.config.tolerance, delta) {
                if delta < eps {
                    stop = StopReason::Converged { iteration: t };
                    break;
                }
            }
        }

        info!(iterations = history.len(), stop = ?stop, "✅ 流量工程迭代结束");
        Ok(RunOutcome { stop, history })
    }

    fn check_shape(&self, commodities: &CommoditySet) -> Result<()> {
        // 路径必须逐条经过构建时登记的同一组链路（按值）
        let same = commodities.len() == self.path_links.len()
            && commodities
                .iter()
                .zip(&self.path_links)
                .all(|(c, paths)| {
                    c.paths().len() == paths.len()
                        && c.paths().iter().zip(paths).all(|(path, idx)| {
                            path.links().len() == idx.len()
                                && path
                                    .links()
                                    .iter()
                                    .zip(idx)
                                    .all(|(l, &i)| self.links.index_of(l) == Some(i))
                        })
                });
        if same {
            Ok(())
        } else {
            Err(TeError::InvalidConfig(
                "commodity set does not match the one the engine was built for".into(),
            ))
        }
    }

    /// 第 0 次迭代：需求在所有路径上均分。
    fn initialize(&self, commodities: &mut CommoditySet) {
        for c in commodities.iter_mut() {
            let share = c.requirement() / c.paths().len() as f64;
            for path in c.paths_mut() {
                path.set_traffic(share);
            }
        }
    }

    /// 基于上一次快照计算一个 commodity 所有路径的新流量。
    fn plan_commodity(
        &self,
        c: &Commodity,
        prev: &IterationRecord,
        degenerate: &mut Vec<DegenerateUpdate>,
    ) -> Vec<f64> {
        let k = c.id().0;
        let costs = &prev.path_costs[k];
        let beta = argmin(costs);
        let beta_set = &self.path_sets[k][beta];
        let d_beta = costs[beta];

        let mut next: Vec<f64> = c.paths().iter().map(|p| p.traffic()).collect();
        let mut others = 0.0;
        for (p, path) in c.paths().iter().enumerate() {
            if p == beta {
                continue;
            }
            let x = path.traffic();
            let mut differing = self.path_sets[k][p].symmetric_difference(beta_set).peekable();

            let reason = if differing.peek().is_none() {
                Some(Degeneracy::EmptySymmetricDifference)
            } else {
                let h: f64 = differing
                    .map(|&l| {
                        let cap = self.links.links()[l].capacity();
                        self.cost.curvature(cap, prev.link_flows[l])
                    })
                    .sum();
                if h > 0.0 && h.is_finite() {
                    let updated = (x - (self.config.step_size / h) * (costs[p] - d_beta)).max(0.0);
                    trace!(
                        commodity = %c.id(),
                        path = p,
                        x,
                        h_kp = h,
                        d_kp = costs[p],
                        d_beta,
                        updated,
                        "更新路径流量"
                    );
                    next[p] = updated;
                    None
                } else {
                    Some(Degeneracy::SaturatedCurvature)
                }
            };

            if let Some(reason) = reason {
                trace!(commodity = %c.id(), path = p, ?reason, "H_kp 为 0，跳过本次更新");
                degenerate.push(DegenerateUpdate {
                    commodity: c.id(),
                    path: p,
                    path_id: path.id(),
                    reason,
                });
            }
            others += next[p];
        }

        next[beta] = (c.requirement() - others).max(0.0);
        next
    }

    /// 由当前路径流量重建链路流量与路径代价。
    fn snapshot(
        &self,
        iteration: usize,
        commodities: &CommoditySet,
        degenerate: Vec<DegenerateUpdate>,
    ) -> IterationRecord {
        let links = self.links.links();
        let mut link_flows = vec![0.0; links.len()];
        for (c, paths) in commodities.iter().zip(&self.path_links) {
            for (path, idx) in c.paths().iter().zip(paths) {
                for &l in idx {
                    link_flows[l] += path.traffic();
                }
            }
        }

        let path_costs: Vec<Vec<f64>> = self
            .path_links
            .iter()
            .map(|paths| {
                paths
                    .iter()
                    .map(|idx| {
                        idx.iter()
                            .map(|&l| self.cost.marginal(links[l].capacity(), link_flows[l]))
                            .sum()
                    })
                    .collect()
            })
            .collect();
        let path_traffic = commodities
            .iter()
            .map(|c| c.paths().iter().map(|p| p.traffic()).collect())
            .collect();
        let best_paths = path_costs.iter().map(|costs| argmin(costs)).collect();

        IterationRecord {
            iteration,
            link_flows,
            path_costs,
            path_traffic,
            best_paths,
            degenerate,
        }
    }
}

/// 第一个最小值的下标
fn argmin(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate().skip(1) {
        if v < values[best] {
            best = i;
        }
    }
    best
}

/// 链路流量的最大相对变化；两次都为 0 的链路变化记为 0。
fn max_relative_change(prev: &[f64], next: &[f64]) -> f64 {
    prev.iter()
        .zip(next)
        .map(|(&old, &new)| {
            if old == new {
                0.0
            } else if old == 0.0 {
                f64::INFINITY
            } else {
                (new - old).abs() / old.abs()
            }
        })
        .fold(0.0, f64::max)
}
