//! 运行结果汇总
//!
//! 只读取账本的最后一次迭代：链路利用率排名、路径代价统计、
//! 每个 commodity 的需求守恒检查。

use std::fmt;

use serde::Serialize;

use super::history::History;
use crate::net::{CommodityId, CommoditySet, Link, NodeId};

/// 需求守恒检查的容差
pub const CONSERVATION_TOLERANCE: f64 = 0.01;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct LinkUsage {
    pub link: Link,
    pub flow: f64,
    pub utilization: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CostStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Conservation {
    pub commodity: CommodityId,
    pub source: NodeId,
    pub target: NodeId,
    pub requirement: f64,
    pub total: f64,
    pub satisfied: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub iterations: usize,
    pub top_links: Vec<LinkUsage>,
    pub path_costs: Option<CostStats>,
    pub conservation: Vec<Conservation>,
    pub degenerate_updates: usize,
}

impl Report {
    pub fn new(commodities: &CommoditySet, history: &History, top_n: usize) -> Self {
        let Some(last) = history.last() else {
            return Self {
                iterations: 0,
                top_links: Vec::new(),
                path_costs: None,
                conservation: Vec::new(),
                degenerate_updates: 0,
            };
        };

        let mut top_links: Vec<LinkUsage> = history
            .links()
            .iter()
            .zip(&last.link_flows)
            .map(|(&link, &flow)| LinkUsage {
                link,
                flow,
                utilization: link.utilization(flow),
            })
            .collect();
        top_links.sort_by(|a, b| b.utilization.total_cmp(&a.utilization));
        top_links.truncate(top_n);

        let costs: Vec<f64> = last.path_costs.iter().flatten().copied().collect();
        let path_costs = (!costs.is_empty()).then(|| CostStats {
            min: costs.iter().copied().fold(f64::INFINITY, f64::min),
            max: costs.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            mean: costs.iter().sum::<f64>() / costs.len() as f64,
        });

        let conservation = commodities
            .iter()
            .map(|c| {
                let total = last.commodity_traffic(c.id()).unwrap_or(0.0);
                Conservation {
                    commodity: c.id(),
                    source: c.source(),
                    target: c.target(),
                    requirement: c.requirement(),
                    total,
                    satisfied: (total - c.requirement()).abs() < CONSERVATION_TOLERANCE,
                }
            })
            .collect();

        Self {
            iterations: history.len(),
            top_links,
            path_costs,
            conservation,
            degenerate_updates: history.degenerate_updates().count(),
        }
    }

    pub fn all_satisfied(&self) -> bool {
        self.conservation.iter().all(|c| c.satisfied)
    }

    pub fn unsatisfied(&self) -> impl Iterator<Item = &Conservation> {
        self.conservation.iter().filter(|c| !c.satisfied)
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "iterations: {}", self.iterations)?;

        writeln!(f, "top {} links by utilization:", self.top_links.len())?;
        for (i, u) in self.top_links.iter().enumerate() {
            writeln!(
                f,
                "  {:>2}. {}->{}: {:.2}/{:.2} ({:.1}%)",
                i + 1,
                u.link.source(),
                u.link.target(),
                u.flow,
                u.link.capacity(),
                u.utilization * 100.0
            )?;
        }

        if let Some(s) = &self.path_costs {
            writeln!(
                f,
                "path costs: min={:.4} max={:.4} mean={:.4}",
                s.min, s.max, s.mean
            )?;
        }

        let satisfied = self.conservation.iter().filter(|c| c.satisfied).count();
        writeln!(
            f,
            "demand conservation: {}/{} commodities within {}",
            satisfied,
            self.conservation.len(),
            CONSERVATION_TOLERANCE
        )?;
        for c in self.unsatisfied() {
            writeln!(
                f,
                "  ✗ {} {}->{}: {:.4}/{:.4}",
                c.commodity, c.source, c.target, c.total, c.requirement
            )?;
        }

        write!(f, "degenerate updates: {}", self.degenerate_updates)
    }
}
