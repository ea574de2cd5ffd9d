//! 场景装配
//!
//! 根据 `ScenarioSpec` 生成链路、拓扑、需求对，运行路径发现并把候选路径
//! 挂到各个 commodity 上。找不到路径的 commodity 按 `MissingPathPolicy`
//! 显式处理：要么整体报错，要么剔除并记录。

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

use super::demand::{random_pairs, strategic_pairs};
use super::scenario::{DemandSpec, MissingPathPolicy, ScenarioSpec, TopologySpec};
use crate::net::{CommodityId, CommoditySet, Link, Network, NodeId, PathSearch, TeError};
use crate::te::TeConfig;
use crate::topo::access_ring::{AccessRingTopology, build_access_ring};
use crate::topo::fat_tree::{FatTreeOpts, FatTreeTopology, build_fat_tree};
use crate::topo::reference::{reference_commodities, reference_links};

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse scenario: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Model(#[from] TeError),
    #[error("unsupported schema_version {0} (expected {expected})", expected = SCHEMA_VERSION)]
    UnsupportedSchema(u32),
    #[error("invalid topology: {0}")]
    InvalidTopology(String),
    #[error("invalid demand: {0}")]
    InvalidDemand(String),
}

/// 可以直接交给引擎运行的场景
#[derive(Debug, Clone)]
pub struct Setup {
    pub network: Network,
    pub commodities: CommoditySet,
    /// 因找不到路径而被剔除的 `(source, target, requirement)`
    pub excluded: Vec<(NodeId, NodeId, f64)>,
    pub search: PathSearch,
    pub engine: TeConfig,
}

enum Topology {
    Reference,
    FatTree(FatTreeTopology),
    AccessRing(AccessRingTopology),
    Plain,
}

pub fn load(path: &Path) -> Result<ScenarioSpec, ScenarioError> {
    let raw = fs::read_to_string(path).map_err(|source| ScenarioError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&raw)
}

pub fn parse(raw: &str) -> Result<ScenarioSpec, ScenarioError> {
    let spec: ScenarioSpec = serde_json::from_str(raw)?;
    if spec.schema_version != SCHEMA_VERSION {
        return Err(ScenarioError::UnsupportedSchema(spec.schema_version));
    }
    Ok(spec)
}

#[tracing::instrument(skip_all)]
pub fn build(spec: &ScenarioSpec) -> Result<Setup, ScenarioError> {
    let (topology, links) = build_topology(&spec.topology)?;
    let network = Network::from_links(links);
    let search = spec.paths;

    let mut commodities = match (&spec.demand, &topology) {
        (DemandSpec::Reference, Topology::Reference) => reference_commodities()?,
        (DemandSpec::Reference, _) => {
            return Err(ScenarioError::InvalidDemand(
                "reference demand requires the reference topology".into(),
            ));
        }
        (
            DemandSpec::Random {
                flows,
                requirement,
                seed,
            },
            _,
        ) => {
            let pool: Vec<NodeId> = match &topology {
                Topology::FatTree(ft) => ft.hosts.clone(),
                _ => network.nodes().collect(),
            };
            let pairs = random_pairs(&pool, *flows, *seed);
            routed(&network, &pairs, *requirement, &search)?
        }
        (
            DemandSpec::Strategic {
                flows,
                requirement,
                intra_ring_ratio,
                seed,
            },
            Topology::AccessRing(topo),
        ) => {
            if *flows == 0 {
                return Err(ScenarioError::InvalidDemand(
                    "strategic demand needs at least one flow".into(),
                ));
            }
            let requirement =
                requirement.unwrap_or_else(|| topo.access_capacity_total() / *flows as f64);
            let pairs = strategic_pairs(topo, *flows, intra_ring_ratio.unwrap_or(0.5), *seed);
            routed(&network, &pairs, requirement, &search)?
        }
        (DemandSpec::Strategic { .. }, _) => {
            return Err(ScenarioError::InvalidDemand(
                "strategic demand requires an access_ring topology".into(),
            ));
        }
        (DemandSpec::Explicit { commodities: specs }, _) => {
            let mut set = CommoditySet::new();
            for c in specs {
                let (source, target) = (NodeId(c.source), NodeId(c.target));
                let id = set.add_commodity(source, target, c.requirement)?;
                match &c.paths {
                    Some(paths) => {
                        for nodes in paths {
                            set.add_path(id, resolve_route(&network, nodes)?)?;
                        }
                    }
                    None => {
                        attach_discovered(&mut set, &network, id, &search)?;
                    }
                }
            }
            set
        }
    };

    let excluded = apply_policy(&mut commodities, spec.missing_paths)?;
    info!(
        nodes = network.node_count(),
        links = network.links().len(),
        commodities = commodities.len(),
        paths = commodities.total_paths(),
        excluded = excluded.len(),
        "场景装配完成"
    );

    Ok(Setup {
        network,
        commodities,
        excluded,
        search,
        engine: spec.engine,
    })
}

fn build_topology(spec: &TopologySpec) -> Result<(Topology, Vec<Link>), ScenarioError> {
    Ok(match spec {
        TopologySpec::Reference => (Topology::Reference, reference_links()?),
        TopologySpec::FatTree { k, capacity } => {
            let opts = FatTreeOpts {
                k: *k,
                capacity: capacity.unwrap_or(FatTreeOpts::default().capacity),
            };
            let topo = build_fat_tree(&opts)?;
            let links = topo.links.clone();
            (Topology::FatTree(topo), links)
        }
        TopologySpec::AccessRing(opts) => {
            let topo = build_access_ring(opts)?;
            let links = topo.links.clone();
            (Topology::AccessRing(topo), links)
        }
        TopologySpec::Links { links } => {
            if links.is_empty() {
                return Err(ScenarioError::InvalidTopology("empty link list".into()));
            }
            let links = links
                .iter()
                .map(|l| Link::new(NodeId(l.source), NodeId(l.target), l.capacity))
                .collect::<Result<Vec<_>, _>>()?;
            (Topology::Plain, links)
        }
    })
}

fn routed(
    network: &Network,
    pairs: &[(NodeId, NodeId)],
    requirement: f64,
    search: &PathSearch,
) -> Result<CommoditySet, ScenarioError> {
    let mut set = CommoditySet::new();
    for &(source, target) in pairs {
        let id = set.add_commodity(source, target, requirement)?;
        attach_discovered(&mut set, network, id, search)?;
    }
    Ok(set)
}

/// 运行路径发现并把结果挂到 commodity 上；不可达时不挂任何路径。
pub fn attach_discovered(
    set: &mut CommoditySet,
    network: &Network,
    id: CommodityId,
    search: &PathSearch,
) -> Result<usize, TeError> {
    let c = set.get(id).ok_or(TeError::UnknownCommodity(id))?;
    let paths = network.k_shortest_paths(c.source(), c.target(), search);
    let found = paths.len();
    for links in paths {
        set.add_path(id, links)?;
    }
    debug!(commodity = %id, found, "挂载发现的路径");
    Ok(found)
}

/// 把节点序列解析为链路：每一跳取邻接表中第一条匹配的链路。
fn resolve_route(network: &Network, nodes: &[usize]) -> Result<Vec<Link>, ScenarioError> {
    nodes
        .windows(2)
        .map(|hop| {
            let (from, to) = (NodeId(hop[0]), NodeId(hop[1]));
            network
                .outgoing(from)
                .iter()
                .find(|(next, _)| *next == to)
                .map(|&(_, link)| link)
                .ok_or_else(|| ScenarioError::InvalidDemand(format!("no link {from}->{to}")))
        })
        .collect()
}

fn apply_policy(
    commodities: &mut CommoditySet,
    policy: MissingPathPolicy,
) -> Result<Vec<(NodeId, NodeId, f64)>, TeError> {
    match policy {
        MissingPathPolicy::Abort => {
            if let Some(c) = commodities.iter().find(|c| c.paths().is_empty()) {
                return Err(TeError::NoPaths {
                    commodity: c.id(),
                    src: c.source(),
                    dst: c.target(),
                });
            }
            Ok(Vec::new())
        }
        MissingPathPolicy::Exclude => {
            let excluded = commodities.exclude_unroutable();
            for (source, target, requirement) in &excluded {
                warn!(%source, %target, requirement, "没有候选路径，剔除该 commodity");
            }
            Ok(excluded)
        }
    }
}
