//! 需求对采样
//!
//! 给定种子时结果可复现。目标数量不超过可能的不重复对数，每类采样最多尝试
//! `100 * 目标数量` 次，凑不够时返回已有的对并打印警告。

use std::collections::HashSet;

use rand::{Rng, SeedableRng, rngs::StdRng};
use tracing::warn;

use crate::net::NodeId;
use crate::topo::access_ring::AccessRingTopology;

const ATTEMPTS_PER_PAIR: usize = 100;

/// `a` 个起点、每个起点 `b - 1` 个可选终点时的有序对数量
fn ordered_pairs(a: usize, b: usize) -> usize {
    a.saturating_mul(b.saturating_sub(1))
}

fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// 在 `nodes` 中均匀采样 `count` 个互不相同的有序对（source != target）。
pub fn random_pairs(nodes: &[NodeId], count: usize, seed: Option<u64>) -> Vec<(NodeId, NodeId)> {
    let mut rng = make_rng(seed);
    if nodes.len() < 2 {
        warn!(nodes = nodes.len(), "节点不足，无法生成需求对");
        return Vec::new();
    }

    // 不重复的有序对至多 n * (n - 1) 个
    let goal = count.min(ordered_pairs(nodes.len(), nodes.len()));
    let mut pairs = Vec::with_capacity(goal);
    let mut seen = HashSet::new();
    let max_attempts = goal.saturating_mul(ATTEMPTS_PER_PAIR);
    let mut attempts = 0;
    while pairs.len() < goal && attempts < max_attempts {
        let source = nodes[rng.gen_range(0..nodes.len())];
        let target = nodes[rng.gen_range(0..nodes.len())];
        if source != target && seen.insert((source, target)) {
            pairs.push((source, target));
        }
        attempts += 1;
    }

    if pairs.len() < count {
        warn!(requested = count, generated = pairs.len(), "只生成了部分不重复的需求对");
    }
    pairs
}

/// 接入环拓扑上的需求对：`floor(count * intra_ratio)` 个环内对，其余为跨环对。
pub fn strategic_pairs(
    topo: &AccessRingTopology,
    count: usize,
    intra_ratio: f64,
    seed: Option<u64>,
) -> Vec<(NodeId, NodeId)> {
    let mut rng = make_rng(seed);
    let rings = topo.opts.rings;
    let n = topo.opts.nodes_per_ring;
    let total = topo.access_nodes.len();
    let intra_wanted =
        (((count as f64) * intra_ratio.clamp(0.0, 1.0)).floor() as usize).min(count);
    let intra_target = intra_wanted.min(rings.saturating_mul(ordered_pairs(n, n)));
    let inter_target = (count - intra_wanted).min(ordered_pairs(total, total - n + 1));

    let mut pairs = Vec::with_capacity(intra_target + inter_target);
    let mut seen = HashSet::new();

    let mut attempts = 0;
    let max_attempts = intra_target.saturating_mul(ATTEMPTS_PER_PAIR);
    while pairs.len() < intra_target && attempts < max_attempts {
        let ring = topo.ring_nodes(rng.gen_range(0..rings));
        let source = ring[rng.gen_range(0..ring.len())];
        let target = ring[rng.gen_range(0..ring.len())];
        if source != target && seen.insert((source, target)) {
            pairs.push((source, target));
        }
        attempts += 1;
    }

    attempts = 0;
    let goal = pairs.len() + inter_target;
    let max_attempts = inter_target.saturating_mul(ATTEMPTS_PER_PAIR);
    while pairs.len() < goal && attempts < max_attempts {
        attempts += 1;
        let (r1, r2) = (rng.gen_range(0..rings), rng.gen_range(0..rings));
        if r1 == r2 {
            continue;
        }
        let (from, to) = (topo.ring_nodes(r1), topo.ring_nodes(r2));
        let source = from[rng.gen_range(0..from.len())];
        let target = to[rng.gen_range(0..to.len())];
        if seen.insert((source, target)) {
            pairs.push((source, target));
        }
    }

    if pairs.len() < count {
        warn!(requested = count, generated = pairs.len(), "只生成了部分不重复的需求对");
    }
    pairs
}
