//! 接入环 + 汇聚层拓扑
//!
//! 若干双向接入环，每个环的第一个节点作为网关，上联到若干汇聚节点；
//! 汇聚节点之间全互联。接入环编号 `r` 占用节点 `r*n .. (r+1)*n`，
//! 汇聚节点编号紧随其后。

use serde::{Deserialize, Serialize};

use crate::net::{Link, NodeId, Result, TeError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessRingOpts {
    pub rings: usize,
    pub nodes_per_ring: usize,
    pub agg_nodes: usize,
    pub access_capacity: f64,
    pub uplink_capacity: f64,
    pub agg_capacity: f64,
    /// 每个环的网关上联到多少个汇聚节点
    pub connections_per_ring: usize,
}

impl Default for AccessRingOpts {
    fn default() -> Self {
        Self {
            rings: 20,
            nodes_per_ring: 10,
            agg_nodes: 30,
            access_capacity: 50.0,
            uplink_capacity: 100.0,
            agg_capacity: 200.0,
            connections_per_ring: 2,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AccessRingTopology {
    pub opts: AccessRingOpts,
    pub links: Vec<Link>,
    pub access_nodes: Vec<NodeId>,
    pub agg_nodes: Vec<NodeId>,
    /// 每个环的网关节点
    pub gateways: Vec<NodeId>,
}

impl AccessRingTopology {
    /// 接入节点所在的环；汇聚节点返回 `None`。
    pub fn ring_of(&self, node: NodeId) -> Option<usize> {
        (node.0 < self.access_nodes.len()).then(|| node.0 / self.opts.nodes_per_ring)
    }

    pub fn ring_nodes(&self, ring: usize) -> &[NodeId] {
        let n = self.opts.nodes_per_ring;
        &self.access_nodes[ring * n..(ring + 1) * n]
    }

    /// 所有接入链路（两个方向）的总容量
    pub fn access_capacity_total(&self) -> f64 {
        (self.opts.rings * self.opts.nodes_per_ring) as f64 * self.opts.access_capacity
    }
}

pub fn build_access_ring(opts: &AccessRingOpts) -> Result<AccessRingTopology> {
    if opts.rings == 0 || opts.nodes_per_ring < 2 || opts.agg_nodes == 0 {
        return Err(TeError::InvalidConfig(format!(
            "access ring network needs rings >= 1, nodes_per_ring >= 2 and agg_nodes >= 1, got {}/{}/{}",
            opts.rings, opts.nodes_per_ring, opts.agg_nodes
        )));
    }

    let n = opts.nodes_per_ring;
    let total_access = opts.rings * n;
    let access_nodes: Vec<NodeId> = (0..total_access).map(NodeId).collect();
    let agg_nodes: Vec<NodeId> = (total_access..total_access + opts.agg_nodes)
        .map(NodeId)
        .collect();
    let gateways: Vec<NodeId> = (0..opts.rings).map(|r| NodeId(r * n)).collect();

    let mut links = Vec::new();
    let mut connect = |a: NodeId, b: NodeId, capacity: f64| -> Result<()> {
        links.push(Link::new(a, b, capacity)?);
        links.push(Link::new(b, a, capacity)?);
        Ok(())
    };

    for ring in 0..opts.rings {
        let offset = ring * n;
        for i in 0..n {
            connect(
                NodeId(offset + i),
                NodeId(offset + (i + 1) % n),
                opts.access_capacity,
            )?;
        }
    }

    for (ring, &gateway) in gateways.iter().enumerate() {
        for i in 0..opts.connections_per_ring {
            let agg = agg_nodes[(ring * opts.connections_per_ring + i) % opts.agg_nodes];
            connect(gateway, agg, opts.uplink_capacity)?;
        }
    }

    for (i, &a) in agg_nodes.iter().enumerate() {
        for &b in &agg_nodes[i + 1..] {
            connect(a, b, opts.agg_capacity)?;
        }
    }

    Ok(AccessRingTopology {
        opts: opts.clone(),
        links,
        access_nodes,
        agg_nodes,
        gateways,
    })
}
