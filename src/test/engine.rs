use crate::net::{CommodityId, CommoditySet, Link, Network, NodeId, PathId, PathSearch, TeError};
use crate::sim::attach_discovered;
use crate::te::{Degeneracy, DegenerateUpdate, RunOutcome, StopReason, TeConfig, TeEngine};
use crate::topo::fat_tree::{FatTreeOpts, build_fat_tree};
use crate::topo::reference::reference_commodities;
use approx::{assert_abs_diff_eq, assert_relative_eq};
use std::collections::HashMap;

fn link(s: usize, t: usize, c: f64) -> Link {
    Link::new(NodeId(s), NodeId(t), c).expect("valid link")
}

fn run(set: &mut CommoditySet, config: TeConfig) -> RunOutcome {
    let engine = TeEngine::new(set, config).expect("engine");
    engine.run(set).expect("run")
}

fn traffic(set: &CommoditySet, id: usize) -> Vec<f64> {
    set.get(CommodityId(id))
        .expect("commodity")
        .paths()
        .iter()
        .map(|p| p.traffic())
        .collect()
}

/// 1 -> 2 -> 4 与 1 -> 3 -> 4 两条分支
fn diamond(upper: f64, lower: f64, requirement: f64) -> CommoditySet {
    let mut set = CommoditySet::new();
    let k = set.add_commodity(NodeId(1), NodeId(4), requirement).unwrap();
    set.add_path(k, vec![link(1, 2, upper), link(2, 4, upper)])
        .unwrap();
    set.add_path(k, vec![link(1, 3, lower), link(3, 4, lower)])
        .unwrap();
    set
}

#[test]
fn reference_network_first_iterations() {
    let mut set = reference_commodities().unwrap();
    let out = run(&mut set, TeConfig::default());
    let h = &out.history;
    let (k1, k2) = (CommodityId(0), CommodityId(1));

    assert_eq!(h.links().len(), 5);
    let t0 = h.get(0).unwrap();
    for (got, want) in t0.path_costs[0]
        .iter()
        .zip([3333.705234159773, 1.08, 10000.5625])
    {
        assert_relative_eq!(*got, want, max_relative = 1e-9);
    }
    assert_relative_eq!(t0.path_costs[1][0], 3333.333333333327, max_relative = 1e-9);
    assert_eq!(h.best_path(0, k1), Some(1));
    assert_eq!(h.best_path(0, k2), Some(0));
    for x in &t0.path_traffic[0] {
        assert_relative_eq!(*x, 4.0 / 3.0);
    }

    // 第 1 次迭代：k1 的流量全部转移到直连 1 -> 4
    assert_eq!(h.get(1).unwrap().path_traffic[0], vec![0.0, 4.0, 0.0]);
    assert_eq!(h.link_flow(1, &link(1, 4, 3.0)), Some(4.0));
    assert_eq!(h.link_flow(1, &link(1, 2, 5.0)), Some(0.0));
    assert_eq!(h.link_flow(1, &link(2, 4, 3.0)), Some(3.0));
    assert_eq!(h.link_flow(1, &link(2, 4, 4.0)), None);
}

#[test]
fn reference_network_final_split() {
    let mut set = reference_commodities().unwrap();
    let out = run(&mut set, TeConfig::default());

    assert_eq!(out.stop, StopReason::BudgetExhausted);
    assert_eq!(out.history.len(), 200);
    assert_eq!(out.history.degenerate_updates().count(), 0);

    let k1 = traffic(&set, 0);
    assert_abs_diff_eq!(k1[0], 0.0, epsilon = 1e-9);
    assert_relative_eq!(k1[1], 2.959609826886613, max_relative = 1e-6);
    assert_relative_eq!(k1[2], 1.0403901731133873, max_relative = 1e-6);
    assert_relative_eq!(k1.iter().sum::<f64>(), 4.0, max_relative = 1e-12);
    assert_eq!(traffic(&set, 1), vec![3.0]);

    let last = out.history.len() - 1;
    let flow = |l: Link| out.history.link_flow(last, &l).unwrap();
    assert_relative_eq!(flow(link(1, 4, 3.0)), 2.959609826886613, max_relative = 1e-6);
    assert_relative_eq!(flow(link(1, 3, 4.0)), 1.0403901731133873, max_relative = 1e-6);
    assert_relative_eq!(flow(link(3, 4, 1.0)), 1.0403901731133873, max_relative = 1e-6);
    assert_relative_eq!(flow(link(2, 4, 3.0)), 3.0, max_relative = 1e-12);
    assert_abs_diff_eq!(flow(link(1, 2, 5.0)), 0.0, epsilon = 1e-9);
}

#[test]
fn single_path_commodity_carries_full_requirement() {
    let mut set = CommoditySet::new();
    let k = set.add_commodity(NodeId(1), NodeId(3), 7.5).unwrap();
    set.add_path(k, vec![link(1, 2, 10.0), link(2, 3, 10.0)])
        .unwrap();

    let out = run(
        &mut set,
        TeConfig {
            iterations: 20,
            ..TeConfig::default()
        },
    );
    for record in out.history.iterations() {
        assert_eq!(record.path_traffic[0], vec![7.5]);
        assert!(record.degenerate.is_empty());
    }
}

#[test]
fn symmetric_diamond_stays_balanced() {
    let mut set = diamond(10.0, 10.0, 4.0);
    let out = run(
        &mut set,
        TeConfig {
            iterations: 50,
            ..TeConfig::default()
        },
    );
    for record in out.history.iterations() {
        assert_eq!(record.path_traffic[0], vec![2.0, 2.0]);
        assert_eq!(record.best_paths, vec![0]);
        assert!(record.degenerate.is_empty());
    }
}

#[test]
fn unequal_diamond_shifts_traffic_to_wider_branch() {
    let mut set = diamond(10.0, 5.0, 6.0);
    let out = run(&mut set, TeConfig::default());

    let t0 = out.history.get(0).unwrap();
    assert_relative_eq!(t0.path_costs[0][0], 0.40816326530612246, max_relative = 1e-12);
    assert_relative_eq!(t0.path_costs[0][1], 2.5, max_relative = 1e-12);

    let x = traffic(&set, 0);
    assert_relative_eq!(x[0], 3.160704568501664, max_relative = 1e-6);
    assert_relative_eq!(x[1], 2.839295431498336, max_relative = 1e-6);
    assert_relative_eq!(x[0] + x[1], 6.0, max_relative = 1e-12);

    let last = out.history.last().unwrap();
    assert_relative_eq!(last.path_costs[0][0], 0.4275700412167538, max_relative = 1e-6);
    assert_relative_eq!(last.path_costs[0][1], 2.141949461627611, max_relative = 1e-6);
}

#[test]
fn saturated_symmetric_difference_skips_update_and_records_it() {
    // 两条平行链路都远超容量，对称差上的曲率全部为 0
    let mut set = CommoditySet::new();
    let k = set.add_commodity(NodeId(1), NodeId(2), 10.0).unwrap();
    set.add_path(k, vec![link(1, 2, 1.0)]).unwrap();
    set.add_path(k, vec![link(1, 2, 2.0)]).unwrap();

    let out = run(
        &mut set,
        TeConfig {
            iterations: 10,
            ..TeConfig::default()
        },
    );
    let h = &out.history;
    assert!(h.get(0).unwrap().degenerate.is_empty());
    for record in &h.iterations()[1..] {
        assert_eq!(record.path_traffic[0], vec![5.0, 5.0]);
        assert_eq!(
            record.degenerate,
            vec![DegenerateUpdate {
                commodity: CommodityId(0),
                path: 0,
                path_id: PathId(1),
                reason: Degeneracy::SaturatedCurvature,
            }]
        );
    }
    assert_eq!(h.degenerate_updates().count(), 9);
}

#[test]
fn identical_paths_record_empty_symmetric_difference() {
    let mut set = CommoditySet::new();
    let k = set.add_commodity(NodeId(1), NodeId(2), 4.0).unwrap();
    set.add_path(k, vec![link(1, 2, 10.0)]).unwrap();
    set.add_path(k, vec![link(1, 2, 10.0)]).unwrap();

    let out = run(
        &mut set,
        TeConfig {
            iterations: 3,
            ..TeConfig::default()
        },
    );
    let h = &out.history;
    assert_eq!(h.links().len(), 1);
    assert_eq!(h.link_flow(2, &link(1, 2, 10.0)), Some(4.0));
    let reasons: Vec<_> = h.degenerate_updates().map(|(t, d)| (t, d.path, d.reason)).collect();
    assert_eq!(
        reasons,
        vec![
            (1, 1, Degeneracy::EmptySymmetricDifference),
            (2, 1, Degeneracy::EmptySymmetricDifference),
        ]
    );
    assert_eq!(traffic(&set, 0), vec![2.0, 2.0]);
}

#[test]
fn link_flows_match_path_traffic_every_iteration() {
    let topo = build_fat_tree(&FatTreeOpts::default()).unwrap();
    let net = Network::from_links(topo.links.iter().copied());
    let search = PathSearch::with_k(3);

    let pairs = [
        (topo.host(0, 0, 0), topo.host(1, 0, 0)),
        (topo.host(0, 0, 1), topo.host(1, 0, 1)),
        (topo.host(0, 1, 0), topo.host(2, 0, 0)),
        (topo.host(1, 1, 1), topo.host(0, 0, 0)),
        (topo.host(0, 0, 0), topo.host(0, 1, 1)),
    ];
    let mut set = CommoditySet::new();
    for (s, t) in pairs {
        let id = set.add_commodity(s, t, 60.0).unwrap();
        assert!(attach_discovered(&mut set, &net, id, &search).unwrap() > 0);
    }

    let out = run(
        &mut set,
        TeConfig {
            iterations: 40,
            ..TeConfig::default()
        },
    );
    let h = &out.history;
    for record in h.iterations() {
        let mut expected: HashMap<Link, f64> = HashMap::new();
        for (c, xs) in set.iter().zip(&record.path_traffic) {
            for (path, &x) in c.paths().iter().zip(xs) {
                assert!(x >= 0.0);
                for l in path.links() {
                    *expected.entry(*l).or_default() += x;
                }
            }
            let total = record.commodity_traffic(c.id()).unwrap();
            assert_relative_eq!(total, c.requirement(), max_relative = 1e-9);
        }
        assert_eq!(expected.len(), h.links().len());
        for (l, want) in expected {
            let got = h.link_flow(record.iteration, &l).unwrap();
            assert_relative_eq!(got, want, max_relative = 1e-9, epsilon = 1e-12);
        }
    }
}

#[test]
fn tolerance_stops_once_flows_settle() {
    let mut balanced = diamond(10.0, 10.0, 4.0);
    let out = run(
        &mut balanced,
        TeConfig {
            tolerance: Some(1e-9),
            ..TeConfig::default()
        },
    );
    assert_eq!(out.stop, StopReason::Converged { iteration: 1 });
    assert_eq!(out.history.len(), 2);

    let mut skewed = diamond(10.0, 5.0, 6.0);
    let out = run(
        &mut skewed,
        TeConfig {
            tolerance: Some(1e-3),
            ..TeConfig::default()
        },
    );
    assert_eq!(out.stop, StopReason::Converged { iteration: 1 });

    let mut skewed = diamond(10.0, 5.0, 6.0);
    let out = run(
        &mut skewed,
        TeConfig {
            tolerance: Some(1e-6),
            ..TeConfig::default()
        },
    );
    assert_eq!(out.stop, StopReason::BudgetExhausted);
    assert_eq!(out.history.len(), 200);
}

#[test]
fn commodity_without_paths_is_an_error() {
    let mut set = diamond(10.0, 10.0, 4.0);
    let orphan = set.add_commodity(NodeId(7), NodeId(8), 1.0).unwrap();

    let err = TeEngine::new(&set, TeConfig::default()).err().unwrap();
    assert_eq!(
        err,
        TeError::NoPaths {
            commodity: orphan,
            src: NodeId(7),
            dst: NodeId(8),
        }
    );

    set.exclude_unroutable();
    assert!(TeEngine::new(&set, TeConfig::default()).is_ok());
}

#[test]
fn invalid_engine_parameters_are_rejected() {
    let set = diamond(10.0, 10.0, 4.0);
    let bad = [
        TeConfig {
            iterations: 0,
            ..TeConfig::default()
        },
        TeConfig {
            step_size: 0.0,
            ..TeConfig::default()
        },
        TeConfig {
            step_size: f64::NAN,
            ..TeConfig::default()
        },
        TeConfig {
            tolerance: Some(0.0),
            ..TeConfig::default()
        },
    ];
    for config in bad {
        assert!(matches!(
            TeEngine::new(&set, config),
            Err(TeError::InvalidConfig(_))
        ));
    }
    assert!(matches!(
        TeEngine::new(
            &set,
            TeConfig {
                threshold: 1.0,
                ..TeConfig::default()
            }
        ),
        Err(TeError::InvalidThreshold(_))
    ));
}

#[test]
fn engine_refuses_a_different_commodity_set() {
    let set = diamond(10.0, 10.0, 4.0);
    let engine = TeEngine::new(&set, TeConfig::default()).unwrap();

    let mut other = reference_commodities().unwrap();
    assert!(matches!(
        engine.run(&mut other),
        Err(TeError::InvalidConfig(_))
    ));

    // 形状相同但链路容量不同
    let mut narrower = diamond(1.0, 10.0, 4.0);
    assert!(matches!(
        engine.run(&mut narrower),
        Err(TeError::InvalidConfig(_))
    ));
    assert_eq!(traffic(&narrower, 0), vec![0.0, 0.0]);

    let mut same = diamond(10.0, 10.0, 4.0);
    assert!(engine.run(&mut same).is_ok());
}
