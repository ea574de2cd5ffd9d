use serde::{Deserialize, Serialize};

use crate::net::PathSearch;
use crate::te::TeConfig;
use crate::topo::access_ring::AccessRingOpts;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioSpec {
    pub schema_version: u32,
    #[serde(default)]
    pub meta: Option<ScenarioMeta>,
    pub topology: TopologySpec,
    pub demand: DemandSpec,
    #[serde(default)]
    pub paths: PathSearch,
    #[serde(default)]
    pub engine: TeConfig,
    #[serde(default)]
    pub missing_paths: MissingPathPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioMeta {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TopologySpec {
    /// 五条链路的参考网络
    Reference,
    FatTree {
        k: usize,
        #[serde(default)]
        capacity: Option<f64>,
    },
    AccessRing(AccessRingOpts),
    /// 直接给出链路列表
    Links { links: Vec<LinkSpec> },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LinkSpec {
    pub source: usize,
    pub target: usize,
    pub capacity: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DemandSpec {
    /// 参考网络自带的两个 commodity 及其路径
    Reference,
    /// 在 fat-tree 主机（或任意拓扑的全部节点）之间均匀随机取对
    Random {
        flows: usize,
        requirement: f64,
        #[serde(default)]
        seed: Option<u64>,
    },
    /// 接入环拓扑上按比例生成环内/跨环的对
    Strategic {
        flows: usize,
        /// 缺省时按接入链路总容量均分到每个 commodity
        #[serde(default)]
        requirement: Option<f64>,
        #[serde(default)]
        intra_ring_ratio: Option<f64>,
        #[serde(default)]
        seed: Option<u64>,
    },
    Explicit { commodities: Vec<CommoditySpec> },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommoditySpec {
    pub source: usize,
    pub target: usize,
    pub requirement: f64,
    /// 以节点序列给出的候选路径；缺省时由路径发现生成。
    #[serde(default)]
    pub paths: Option<Vec<Vec<usize>>>,
}

/// 某个 commodity 找不到任何路径时的处理方式
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MissingPathPolicy {
    #[default]
    Abort,
    Exclude,
}

/// 内置场景
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Builtin {
    Reference,
    FatTree,
    AccessRing,
}

impl ScenarioSpec {
    pub fn builtin(which: Builtin) -> Self {
        match which {
            Builtin::Reference => Self {
                schema_version: 1,
                meta: Some(ScenarioMeta {
                    name: Some("reference".into()),
                    description: Some("five-link reference network".into()),
                }),
                topology: TopologySpec::Reference,
                demand: DemandSpec::Reference,
                paths: PathSearch::default(),
                engine: TeConfig::default(),
                missing_paths: MissingPathPolicy::Abort,
            },
            Builtin::FatTree => Self {
                schema_version: 1,
                meta: Some(ScenarioMeta {
                    name: Some("fat_tree".into()),
                    description: Some("k=8 fat-tree, 100 random flows at 50% link capacity".into()),
                }),
                topology: TopologySpec::FatTree {
                    k: 8,
                    capacity: Some(100.0),
                },
                demand: DemandSpec::Random {
                    flows: 100,
                    requirement: 50.0,
                    seed: Some(42),
                },
                paths: PathSearch::with_k(3),
                engine: TeConfig::default(),
                missing_paths: MissingPathPolicy::Exclude,
            },
            Builtin::AccessRing => Self {
                schema_version: 1,
                meta: Some(ScenarioMeta {
                    name: Some("access_ring".into()),
                    description: Some(
                        "20 access rings + 30 aggregation nodes, 100 commodities sized to the access capacity".into(),
                    ),
                }),
                topology: TopologySpec::AccessRing(AccessRingOpts::default()),
                demand: DemandSpec::Strategic {
                    flows: 100,
                    requirement: None,
                    intra_ring_ratio: Some(0.5),
                    seed: Some(42),
                },
                paths: PathSearch {
                    k: 3,
                    max_hops: Some(10),
                    slack: 3,
                    candidate_factor: Some(3),
                },
                engine: TeConfig::default(),
                missing_paths: MissingPathPolicy::Exclude,
            },
        }
    }
}
