//! 网络拓扑管理
//!
//! 由链路集合构建的有向图，保存正向与反向邻接表，供路径发现使用。

use std::collections::{BTreeSet, HashMap};

use super::error::Result;
use super::id::NodeId;
use super::link::Link;
use tracing::debug;

/// 网络拓扑
#[derive(Debug, Default, Clone)]
pub struct Network {
    links: Vec<Link>,
    /// from -> [(to, link)]，保持链路插入顺序
    adj: HashMap<NodeId, Vec<(NodeId, Link)>>,
    /// to -> [from]
    rev_adj: HashMap<NodeId, Vec<NodeId>>,
    nodes: BTreeSet<NodeId>,
}

impl Network {
    /// 从已校验的链路构建拓扑
    pub fn from_links(links: impl IntoIterator<Item = Link>) -> Self {
        let mut net = Self::default();
        for link in links {
            net.connect(link);
        }
        debug!(
            nodes = net.nodes.len(),
            links = net.links.len(),
            "构建网络拓扑"
        );
        net
    }

    /// 从 `(source, target, capacity)` 三元组构建，拒绝非法容量。
    pub fn from_triples(triples: &[(usize, usize, f64)]) -> Result<Self> {
        let links = triples
            .iter()
            .map(|&(s, t, c)| Link::new(NodeId(s), NodeId(t), c))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::from_links(links))
    }

    /// 添加一条单向链路；与已有链路按值相同时忽略。
    pub fn connect(&mut self, link: Link) {
        let (from, to) = (link.source(), link.target());
        let out = self.adj.entry(from).or_default();
        if out.iter().any(|&(_, l)| l == link) {
            debug!(%link, "忽略重复链路");
            return;
        }
        out.push((to, link));
        self.rev_adj.entry(to).or_default().push(from);
        self.nodes.insert(from);
        self.nodes.insert(to);
        self.links.push(link);
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// 按编号升序的节点集合
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter().copied()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn contains_node(&self, node: NodeId) -> bool {
        self.nodes.contains(&node)
    }

    /// `node` 的出边（邻居与链路），顺序即链路加入顺序。
    pub fn outgoing(&self, node: NodeId) -> &[(NodeId, Link)] {
        self.adj.get(&node).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// 所有能一跳到达 `node` 的前驱节点
    pub fn predecessors(&self, node: NodeId) -> &[NodeId] {
        self.rev_adj.get(&node).map(|v| v.as_slice()).unwrap_or(&[])
    }
}
