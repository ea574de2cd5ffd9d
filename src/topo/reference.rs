//! 五条链路的参考网络
//!
//! ```text
//! 1 -> 2 (5)   1 -> 4 (3)   1 -> 3 (4)   2 -> 4 (3)   3 -> 4 (1)
//! ```

use crate::net::{CommoditySet, Link, NodeId, Result};

pub fn reference_links() -> Result<Vec<Link>> {
    [(1, 2, 5.0), (1, 4, 3.0), (1, 3, 4.0), (2, 4, 3.0), (3, 4, 1.0)]
        .into_iter()
        .map(|(s, t, c)| Link::new(NodeId(s), NodeId(t), c))
        .collect()
}

/// 两个 commodity：`1 -> 4`（需求 4，三条路径）与 `2 -> 4`（需求 3，一条路径）。
pub fn reference_commodities() -> Result<CommoditySet> {
    let l = reference_links()?;
    let (l12, l14, l13, l24, l34) = (l[0], l[1], l[2], l[3], l[4]);

    let mut set = CommoditySet::new();
    let k1 = set.add_commodity(NodeId(1), NodeId(4), 4.0)?;
    set.add_path(k1, vec![l12, l24])?;
    set.add_path(k1, vec![l14])?;
    set.add_path(k1, vec![l13, l34])?;

    let k2 = set.add_commodity(NodeId(2), NodeId(4), 3.0)?;
    set.add_path(k2, vec![l24])?;
    Ok(set)
}
