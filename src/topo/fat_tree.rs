//! Fat-tree 拓扑构建
//!
//! 节点编号：先是全部主机（`k^3/4` 个），然后依次是 edge 交换机（`k^2/2`）、
//! aggregation 交换机（`k^2/2`）和 core 交换机（`k^2/4`）。每个连接都是一对
//! 方向相反的单向链路。

use crate::net::{Link, NodeId, Result, TeError};

#[derive(Debug, Clone)]
pub struct FatTreeOpts {
    pub k: usize,
    pub capacity: f64,
}

impl Default for FatTreeOpts {
    fn default() -> Self {
        Self {
            k: 4,
            capacity: 100.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FatTreeTopology {
    pub k: usize,
    pub links: Vec<Link>,
    pub hosts: Vec<NodeId>,
    pub edge_switches: Vec<NodeId>,
    pub agg_switches: Vec<NodeId>,
    pub core_switches: Vec<NodeId>,
}

impl FatTreeTopology {
    fn half(&self) -> usize {
        self.k / 2
    }

    pub fn host(&self, pod: usize, edge: usize, host: usize) -> NodeId {
        let half = self.half();
        let idx = (pod * half + edge) * half + host;
        self.hosts[idx]
    }

    pub fn edge(&self, pod: usize, edge: usize) -> NodeId {
        let half = self.half();
        let idx = pod * half + edge;
        self.edge_switches[idx]
    }

    pub fn agg(&self, pod: usize, agg: usize) -> NodeId {
        let half = self.half();
        let idx = pod * half + agg;
        self.agg_switches[idx]
    }

    pub fn core(&self, group: usize, index: usize) -> NodeId {
        let half = self.half();
        let idx = group * half + index;
        self.core_switches[idx]
    }

    /// 主机所在的 pod
    pub fn pod_of_host(&self, host: NodeId) -> Option<usize> {
        let half = self.half();
        (host.0 < self.hosts.len()).then(|| host.0 / (half * half))
    }
}

pub fn build_fat_tree(opts: &FatTreeOpts) -> Result<FatTreeTopology> {
    let k = opts.k;
    if k < 2 || k % 2 != 0 {
        return Err(TeError::InvalidConfig(format!(
            "fat-tree k must be even and >= 2, got {k}"
        )));
    }

    let half = k / 2;
    let num_hosts = k * half * half;
    let num_edge = k * half;
    let num_agg = k * half;
    let num_core = half * half;

    let ids = |start: usize, len: usize| (start..start + len).map(NodeId).collect::<Vec<_>>();
    let hosts = ids(0, num_hosts);
    let edge_switches = ids(num_hosts, num_edge);
    let agg_switches = ids(num_hosts + num_edge, num_agg);
    let core_switches = ids(num_hosts + num_edge + num_agg, num_core);

    let mut links = Vec::with_capacity(2 * (num_hosts + k * half * half + num_agg * half));
    let mut connect = |a: NodeId, b: NodeId| -> Result<()> {
        links.push(Link::new(a, b, opts.capacity)?);
        links.push(Link::new(b, a, opts.capacity)?);
        Ok(())
    };

    for pod in 0..k {
        let pod_edges = &edge_switches[pod * half..(pod + 1) * half];
        let pod_aggs = &agg_switches[pod * half..(pod + 1) * half];

        for (edge_idx, &edge_id) in pod_edges.iter().enumerate() {
            for host in 0..half {
                let host_id = hosts[(pod * half + edge_idx) * half + host];
                connect(host_id, edge_id)?;
            }
        }

        for &edge_id in pod_edges {
            for &agg_id in pod_aggs {
                connect(edge_id, agg_id)?;
            }
        }
    }

    for pod in 0..k {
        for agg in 0..half {
            let agg_id = agg_switches[pod * half + agg];
            for index in 0..half {
                connect(agg_id, core_switches[agg * half + index])?;
            }
        }
    }

    Ok(FatTreeTopology {
        k,
        links,
        hosts,
        edge_switches,
        agg_switches,
        core_switches,
    })
}
