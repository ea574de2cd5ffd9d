use crate::net::{CommodityId, CommoditySet, Link, NodeId};
use crate::te::{History, IterationRecord, LinkTable, Report, TeConfig, TeEngine};
use crate::topo::reference::reference_commodities;
use approx::assert_relative_eq;
use serde_json::{Value, json};

fn link(s: usize, t: usize, c: f64) -> Link {
    Link::new(NodeId(s), NodeId(t), c).expect("valid link")
}

#[test]
fn link_table_interns_by_value() {
    let mut table = LinkTable::default();
    assert!(table.is_empty());
    assert_eq!(table.intern(link(1, 2, 5.0)), 0);
    assert_eq!(table.intern(link(2, 4, 3.0)), 1);
    assert_eq!(table.intern(link(1, 2, 5.0)), 0);
    assert_eq!(table.intern(link(1, 2, 6.0)), 2);
    assert_eq!(table.len(), 3);
    assert_eq!(table.index_of(&link(2, 4, 3.0)), Some(1));
    assert_eq!(table.index_of(&link(4, 2, 3.0)), None);

    let v = serde_json::to_value(&table).unwrap();
    assert_eq!(
        v[0],
        json!({ "source": 1, "target": 2, "capacity": 5.0 })
    );
    assert_eq!(v.as_array().unwrap().len(), 3);
}

#[test]
fn run_outcome_serializes_stop_reason_and_ledger() {
    let mut set = CommoditySet::new();
    let k = set.add_commodity(NodeId(1), NodeId(2), 10.0).unwrap();
    set.add_path(k, vec![link(1, 2, 1.0)]).unwrap();
    set.add_path(k, vec![link(1, 2, 2.0)]).unwrap();

    let engine = TeEngine::new(
        &set,
        TeConfig {
            iterations: 3,
            ..TeConfig::default()
        },
    )
    .unwrap();
    let out = engine.run(&mut set).unwrap();

    let v: Value = serde_json::to_value(&out).unwrap();
    assert_eq!(v["stop"]["kind"], "budget_exhausted");
    assert_eq!(v["history"]["links"].as_array().unwrap().len(), 2);
    let iterations = v["history"]["iterations"].as_array().unwrap();
    assert_eq!(iterations.len(), 3);
    assert_eq!(iterations[0]["iteration"], 0);
    assert_eq!(iterations[0]["link_flows"], json!([5.0, 5.0]));
    assert_eq!(
        iterations[1]["degenerate"][0]["reason"],
        "saturated_curvature"
    );
    assert_eq!(iterations[1]["degenerate"][0]["path_id"], 1);
}

#[test]
fn history_queries_by_iteration_commodity_and_path() {
    let mut table = LinkTable::default();
    let l = link(1, 2, 4.0);
    table.intern(l);
    let mut history = History::new(table);
    assert!(history.is_empty());
    assert!(history.last().is_none());

    history.push(IterationRecord {
        iteration: 0,
        link_flows: vec![3.0],
        path_costs: vec![vec![4.0, 4.0]],
        path_traffic: vec![vec![1.0, 2.0]],
        best_paths: vec![0],
        degenerate: Vec::new(),
    });

    assert_eq!(history.len(), 1);
    assert_eq!(history.link_flow(0, &l), Some(3.0));
    assert_eq!(history.link_flow(1, &l), None);
    assert_eq!(history.path_cost(0, CommodityId(0), 1), Some(4.0));
    assert_eq!(history.path_cost(0, CommodityId(0), 2), None);
    assert_eq!(history.best_path(0, CommodityId(0)), Some(0));
    assert_eq!(
        history.last().unwrap().commodity_traffic(CommodityId(0)),
        Some(3.0)
    );
    assert_eq!(
        history.last().unwrap().commodity_traffic(CommodityId(1)),
        None
    );
}

#[test]
fn report_ranks_links_and_checks_conservation() {
    let mut set = reference_commodities().unwrap();
    let engine = TeEngine::new(&set, TeConfig::default()).unwrap();
    let out = engine.run(&mut set).unwrap();

    let report = Report::new(&set, &out.history, 2);
    assert_eq!(report.iterations, 200);
    assert_eq!(report.top_links.len(), 2);
    assert_eq!(report.top_links[0].link, link(3, 4, 1.0));
    assert_eq!(report.top_links[1].link, link(2, 4, 3.0));
    assert!(report.top_links[0].utilization >= report.top_links[1].utilization);
    assert!(report.all_satisfied());
    assert_eq!(report.conservation.len(), 2);
    assert_relative_eq!(report.conservation[0].total, 4.0, max_relative = 1e-9);
    assert_eq!(report.degenerate_updates, 0);

    let stats = report.path_costs.unwrap();
    assert!(stats.min <= stats.mean && stats.mean <= stats.max);

    let text = report.to_string();
    assert!(text.contains("3->4: 1.04/1.00 (104.0%)"), "{text}");
    assert!(text.contains("demand conservation: 2/2 commodities within 0.01"));
    assert!(text.ends_with("degenerate updates: 0"));
}

#[test]
fn report_lists_commodities_off_their_requirement() {
    let mut set = CommoditySet::new();
    let k = set.add_commodity(NodeId(1), NodeId(2), 2.0).unwrap();
    let l = link(1, 2, 4.0);
    set.add_path(k, vec![l]).unwrap();

    let mut table = LinkTable::default();
    table.intern(l);
    let mut history = History::new(table);
    history.push(IterationRecord {
        iteration: 0,
        link_flows: vec![1.0],
        path_costs: vec![vec![0.5]],
        path_traffic: vec![vec![1.0]],
        best_paths: vec![0],
        degenerate: Vec::new(),
    });

    let report = Report::new(&set, &history, 10);
    assert!(!report.all_satisfied());
    let missing: Vec<_> = report.unsatisfied().map(|c| c.commodity).collect();
    assert_eq!(missing, vec![k]);
    assert!(report.to_string().contains("✗ k0 1->2: 1.0000/2.0000"));
}

#[test]
fn report_on_empty_history_is_vacuous() {
    let set = CommoditySet::new();
    let history = History::new(LinkTable::default());
    let report = Report::new(&set, &history, 5);
    assert_eq!(report.iterations, 0);
    assert!(report.top_links.is_empty());
    assert!(report.path_costs.is_none());
    assert!(report.all_satisfied());
}
