//! 路径发现（k 条最短简单路径）
//!
//! 先在反向图上从 target 做 BFS，得到每个节点到 target 的最短跳数；
//! 再在 `最短跳数 + slack`（或显式的 `max_hops`）范围内做有界 DFS，
//! 枚举不重复经过节点的简单路径。
//!
//! 枚举按跳数逐层进行（先枚举所有恰好 d 跳的路径，再枚举 d+1 跳），
//! 因此候选天然按跳数升序；同跳数的路径按邻接表中链路的加入顺序排列。

use std::collections::{HashMap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::id::NodeId;
use super::link::Link;
use super::network::Network;

/// 路径搜索参数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathSearch {
    /// 每个 commodity 需要的路径条数
    pub k: usize,
    /// 显式的最大跳数；`None` 时使用 `最短跳数 + slack`
    pub max_hops: Option<usize>,
    pub slack: usize,
    /// 收集到 `candidate_factor * k` 条候选后停止枚举；`None` 表示不设上限
    pub candidate_factor: Option<usize>,
}

impl Default for PathSearch {
    fn default() -> Self {
        Self {
            k: 3,
            max_hops: None,
            slack: 2,
            candidate_factor: Some(3),
        }
    }
}

impl PathSearch {
    pub fn with_k(k: usize) -> Self {
        Self {
            k,
            ..Self::default()
        }
    }

    fn candidate_limit(&self) -> usize {
        self.candidate_factor
            .map(|f| f.saturating_mul(self.k))
            .unwrap_or(usize::MAX)
    }
}

impl Network {
    /// 每个可达节点到 `target` 的最短跳数（在反向图上 BFS）。
    pub fn hop_distances_to(&self, target: NodeId) -> HashMap<NodeId, usize> {
        let mut dist = HashMap::new();
        let mut q = VecDeque::new();
        dist.insert(target, 0usize);
        q.push_back(target);

        while let Some(v) = q.pop_front() {
            let dv = dist[&v];
            for &pred in self.predecessors(v) {
                if !dist.contains_key(&pred) {
                    dist.insert(pred, dv + 1);
                    q.push_back(pred);
                }
            }
        }
        dist
    }

    /// `source` 到 `target` 的最短跳数；不可达返回 `None`。
    pub fn hop_distance(&self, source: NodeId, target: NodeId) -> Option<usize> {
        self.hop_distances_to(target).get(&source).copied()
    }

    /// 返回至多 `search.k` 条 `source -> target` 的简单路径，按跳数升序。
    ///
    /// `source == target` 时返回一条零长度路径；不可达时返回空列表，
    /// 由调用方决定该 commodity 是剔除还是报错。
    #[tracing::instrument(skip(self, search), fields(k = search.k))]
    pub fn k_shortest_paths(
        &self,
        source: NodeId,
        target: NodeId,
        search: &PathSearch,
    ) -> Vec<Vec<Link>> {
        if search.k == 0 {
            return Vec::new();
        }
        if source == target {
            return vec![Vec::new()];
        }

        let dist = self.hop_distances_to(target);
        let Some(&min_hops) = dist.get(&source) else {
            debug!("target 不可达");
            return Vec::new();
        };
        let max_hops = search
            .max_hops
            .unwrap_or_else(|| min_hops.saturating_add(search.slack));
        if max_hops < min_hops {
            debug!(min_hops, max_hops, "最短路径超过跳数上限");
            return Vec::new();
        }

        let mut walker = Walker {
            net: self,
            target,
            dist: &dist,
            on_path: HashSet::from([source]),
            stack: Vec::with_capacity(max_hops),
            found: Vec::new(),
            limit: search.candidate_limit(),
        };
        for hops in min_hops..=max_hops {
            walker.walk(source, hops);
            trace!(hops, found = walker.found.len(), "完成一层枚举");
            if walker.found.len() >= walker.limit {
                break;
            }
        }

        let mut paths = walker.found;
        paths.sort_by_key(Vec::len);
        paths.truncate(search.k);
        debug!(min_hops, max_hops, paths = paths.len(), "路径发现完成");
        paths
    }
}

/// 有界 DFS 的状态
struct Walker<'a> {
    net: &'a Network,
    target: NodeId,
    dist: &'a HashMap<NodeId, usize>,
    /// 当前部分路径上已经使用的节点
    on_path: HashSet<NodeId>,
    stack: Vec<Link>,
    found: Vec<Vec<Link>>,
    limit: usize,
}

impl Walker<'_> {
    /// 枚举从 `node` 出发、恰好 `hops_left` 跳到达 target 的简单路径。
    fn walk(&mut self, node: NodeId, hops_left: usize) {
        if node == self.target {
            if hops_left == 0 {
                self.found.push(self.stack.clone());
            }
            return;
        }
        if hops_left == 0 {
            return;
        }

        let net = self.net;
        for &(next, link) in net.outgoing(node) {
            if self.found.len() >= self.limit {
                return;
            }
            if self.on_path.contains(&next) {
                continue;
            }
            // 剩余跳数不够到达 target 的分支直接剪掉
            match self.dist.get(&next) {
                Some(&d) if d < hops_left => {}
                _ => continue,
            }

            self.on_path.insert(next);
            self.stack.push(link);
            self.walk(next, hops_left - 1);
            self.stack.pop();
            self.on_path.remove(&next);
        }
    }
}
