use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use pretty_assertions::assert_eq;

use ego_lens::graph::GraphDocument;
use ego_lens::neighborhood::schema::{NeighborhoodSchema, SURROGATE_OF};
use ego_lens::{
    Graph, GraphObject, LayerMap, ModeProperty, NEIGHBORHOOD_DISTANCE_ALL, NeighborhoodAnalyzer,
    NeighborhoodError, NeighborhoodEvent, NodeId, Visibility,
};

fn graph_with(keys: &[&str], links: &[(&str, &str)]) -> Graph {
    let mut graph = Graph::new();
    for key in keys {
        graph.add_node(key, key);
    }
    for (source, target) in links {
        let source = graph.node_by_key(source).unwrap();
        let target = graph.node_by_key(target).unwrap();
        graph.add_link(source, target);
    }
    graph
}

fn chain() -> Graph {
    graph_with(&["A", "B", "C", "D"], &[("A", "B"), ("B", "C"), ("C", "D")])
}

fn id(analyzer: &NeighborhoodAnalyzer, key: &str) -> NodeId {
    analyzer.graph().unwrap().node_by_key(key).unwrap()
}

fn select(analyzer: &mut NeighborhoodAnalyzer, keys: &[&str]) {
    let ids = keys.iter().map(|key| id(analyzer, key)).collect::<Vec<_>>();
    analyzer.selection_mut().set(ids);
}

fn visible_keys(analyzer: &NeighborhoodAnalyzer) -> Vec<String> {
    let graph = analyzer.graph().unwrap();
    graph
        .visible_nodes()
        .map(|node| graph.node(node).unwrap().key.clone())
        .collect()
}

fn layers_by_key(analyzer: &NeighborhoodAnalyzer) -> Vec<(String, i32)> {
    let graph = analyzer.graph().unwrap();
    analyzer
        .layers()
        .iter()
        .map(|(&node, &layer)| (graph.node(node).unwrap().key.clone(), layer))
        .collect()
}

fn pairs(items: &[(&str, i32)]) -> Vec<(String, i32)> {
    items
        .iter()
        .map(|&(key, layer)| (key.to_string(), layer))
        .collect()
}

#[test]
fn test_chain_browse_distance_one_then_two() {
    let mut analyzer = NeighborhoodAnalyzer::with_graph(chain());
    select(&mut analyzer, &["B"]);

    analyzer.toggle_neighborhood_browse_mode().unwrap();
    assert_eq!(visible_keys(&analyzer), ["A", "B", "C"]);
    assert_eq!(
        analyzer.hidden(),
        &HashSet::from([GraphObject::Node(id(&analyzer, "D"))])
    );

    analyzer.set_distance(2).unwrap();
    assert_eq!(visible_keys(&analyzer), ["A", "B", "C", "D"]);
    assert_eq!(layers_by_key(&analyzer), pairs(&[("A", 1), ("B", 0), ("C", 1), ("D", 2)]));
}

#[test]
fn test_chain_butterfly_keeps_adjacent_hops() {
    let mut analyzer = NeighborhoodAnalyzer::with_graph(chain());
    select(&mut analyzer, &["B"]);

    analyzer.toggle_butterfly_mode().unwrap();
    assert_eq!(
        layers_by_key(&analyzer),
        pairs(&[("A", -1), ("B", 0), ("C", 1), ("D", 2)])
    );
    assert_eq!(visible_keys(&analyzer), ["A", "B", "C", "D"]);

    let graph = analyzer.graph().unwrap();
    assert!(graph.links().all(|link| graph.is_visible(GraphObject::Link(link))));
    assert_eq!(graph.layer(id(&analyzer, "A")), Some(-1));
    assert!(graph.butterfly_mode());
}

#[test]
fn test_browse_and_butterfly_together_limit_both_sides() {
    let graph = graph_with(
        &["A", "B", "C", "D", "E"],
        &[("A", "B"), ("B", "C"), ("C", "D"), ("D", "E")],
    );
    let mut analyzer = NeighborhoodAnalyzer::with_graph(graph);
    select(&mut analyzer, &["C"]);

    analyzer.set_butterfly_mode(true);
    analyzer.set_browse_mode(true).unwrap();
    assert!(analyzer.browse_mode() && analyzer.butterfly_mode());

    assert_eq!(layers_by_key(&analyzer), pairs(&[("B", -1), ("C", 0), ("D", 1)]));
    assert_eq!(visible_keys(&analyzer), ["B", "C", "D"]);
    assert_eq!(
        analyzer.hidden(),
        &HashSet::from([
            GraphObject::Node(id(&analyzer, "A")),
            GraphObject::Node(id(&analyzer, "E")),
        ])
    );

    analyzer.set_distance(2).unwrap();
    assert_eq!(
        layers_by_key(&analyzer),
        pairs(&[("A", -2), ("B", -1), ("C", 0), ("D", 1), ("E", 2)])
    );
}

#[test]
fn test_cycle_terminates_in_both_modes() {
    let cycle = graph_with(&["A", "B", "C"], &[("A", "B"), ("B", "C"), ("C", "A")]);
    let mut analyzer = NeighborhoodAnalyzer::with_graph(cycle);
    select(&mut analyzer, &["A"]);

    analyzer.set_distance(NEIGHBORHOOD_DISTANCE_ALL).unwrap();
    analyzer.set_browse_mode(true).unwrap();
    assert_eq!(layers_by_key(&analyzer), pairs(&[("A", 0), ("B", 1), ("C", 1)]));

    analyzer.set_browse_mode(false).unwrap();
    analyzer.toggle_butterfly_mode().unwrap();
    assert_eq!(layers_by_key(&analyzer), pairs(&[("A", 0), ("B", 1), ("C", -1)]));
}

#[test]
fn test_roots_are_layer_zero_and_never_hidden() {
    let graph = graph_with(
        &["A", "B", "C", "X", "Y", "Z"],
        &[("A", "B"), ("B", "C"), ("C", "X"), ("X", "Y"), ("Y", "A"), ("Z", "X")],
    );
    let mut analyzer = NeighborhoodAnalyzer::with_graph(graph);
    select(&mut analyzer, &["A", "X"]);

    for butterfly in [false, true] {
        if butterfly {
            analyzer.set_browse_mode(false).unwrap();
            analyzer.toggle_butterfly_mode().unwrap();
        } else {
            analyzer.set_browse_mode(true).unwrap();
        }

        let roots = analyzer.get_center().to_vec();
        assert_eq!(roots.len(), 2);
        for root in roots {
            assert_eq!(analyzer.layer_of(root), Some(0));
            assert!(!analyzer.hidden().contains(&GraphObject::Node(root)));
            assert!(analyzer.graph().unwrap().is_visible(GraphObject::Node(root)));
        }
    }
}

#[test]
fn test_browse_layers_stay_within_distance() {
    let graph = graph_with(
        &["R", "A", "B", "C", "X", "Y", "Z"],
        &[("R", "A"), ("A", "B"), ("B", "C"), ("X", "R"), ("Y", "X"), ("R", "C")],
    );
    let mut analyzer = NeighborhoodAnalyzer::with_graph(graph);
    select(&mut analyzer, &["R"]);
    analyzer.set_distance(2).unwrap();
    analyzer.set_browse_mode(true).unwrap();

    let root = id(&analyzer, "R");
    for (&node, &layer) in analyzer.layers() {
        if node != root {
            assert!((1..=2).contains(&layer), "{node} has layer {layer}");
        }
    }
    // C is reachable directly from R, so it sits at 1 rather than 3.
    assert_eq!(analyzer.layer_of(id(&analyzer, "C")), Some(1));
    assert_eq!(visible_keys(&analyzer), ["R", "A", "B", "C", "X", "Y"]);
}

#[test]
fn test_butterfly_links_bridge_adjacent_layers() {
    let graph = graph_with(
        &["A", "B", "C", "D", "E", "F"],
        &[
            ("A", "B"),
            ("B", "C"),
            ("C", "D"),
            ("A", "C"),
            ("D", "B"),
            ("E", "A"),
            ("F", "D"),
            ("E", "F"),
        ],
    );
    let mut analyzer = NeighborhoodAnalyzer::with_graph(graph);
    select(&mut analyzer, &["A"]);
    analyzer.toggle_butterfly_mode().unwrap();

    let graph = analyzer.graph().unwrap();
    let layers: &LayerMap = analyzer.layers();
    for link in graph.links() {
        let data = graph.link(link).unwrap();
        let (Some(&from), Some(&to)) = (layers.get(&data.source), layers.get(&data.target)) else {
            continue;
        };
        if graph.is_visible(GraphObject::Link(link)) {
            assert_eq!(to, from + 1, "link {link} skips layers");
        }
    }
    for node in graph.visible_nodes() {
        assert!(layers.contains_key(&node), "{node} is visible without a layer");
    }
}

#[test]
fn test_update_is_idempotent() {
    let graph = graph_with(
        &["A", "B", "C", "D", "E"],
        &[("A", "B"), ("B", "C"), ("C", "D"), ("D", "E"), ("E", "B")],
    );
    let mut analyzer = NeighborhoodAnalyzer::with_graph(graph);
    let events = analyzer.subscribe();
    select(&mut analyzer, &["C"]);
    analyzer.toggle_butterfly_mode().unwrap();

    let visible = visible_keys(&analyzer);
    let hidden = analyzer.hidden().clone();
    let layers = analyzer.layers().clone();

    analyzer.update_neighborhood().unwrap();
    assert_eq!(visible_keys(&analyzer), visible);
    assert_eq!(analyzer.hidden(), &hidden);
    assert_eq!(analyzer.layers(), &layers);

    let changed = events
        .try_iter()
        .filter(|event| *event == NeighborhoodEvent::NeighborhoodChanged)
        .count();
    assert_eq!(changed, 2);
}

#[test]
fn test_leaving_both_modes_restores_everything() {
    let graph = graph_with(
        &["A", "B", "C", "D", "E"],
        &[("A", "B"), ("B", "C"), ("A", "C"), ("D", "E")],
    );
    let mut analyzer = NeighborhoodAnalyzer::with_graph(graph);
    select(&mut analyzer, &["A"]);
    analyzer.toggle_butterfly_mode().unwrap();

    let hidden_before = analyzer.hidden().clone();
    assert!(!hidden_before.is_empty());

    analyzer.toggle_butterfly_mode().unwrap();
    assert!(!analyzer.butterfly_mode());
    let graph = analyzer.graph().unwrap();
    for object in &hidden_before {
        assert!(graph.is_visible(*object), "{object:?} is still hidden");
        assert!(!graph.is_butterfly_hidden(*object));
    }
    assert!(analyzer.hidden().is_empty());
    assert!(analyzer.get_center().is_empty());
    assert!(graph.center_nodes().is_empty());
    assert!(graph.nodes().all(|node| graph.layer(node).is_none()));
}

#[test]
fn test_group_ancestors_are_retained() {
    let mut graph = graph_with(&["R", "X", "Y", "Z"], &[("R", "X")]);
    let outer = graph.add_group("Outer", "Outer");
    let inner = graph.add_group("Inner", "Inner");
    let x = graph.node_by_key("X").unwrap();
    let y = graph.node_by_key("Y").unwrap();
    graph.add_containment(outer, inner);
    graph.add_containment(inner, x);
    graph.add_containment(inner, y);

    let mut analyzer = NeighborhoodAnalyzer::with_graph(graph);
    select(&mut analyzer, &["R"]);
    analyzer.set_browse_mode(true).unwrap();

    assert_eq!(visible_keys(&analyzer), ["R", "X", "Outer", "Inner"]);
    assert_eq!(analyzer.layer_of(outer), Some(1));
    assert_eq!(analyzer.layer_of(inner), Some(1));

    let graph = analyzer.graph().unwrap();
    for (&node, _) in analyzer.layers() {
        for parent in graph.parent_groups(node) {
            assert!(analyzer.layers().contains_key(&parent));
        }
    }
}

#[test]
fn test_hidden_group_takes_its_members_along() {
    let mut graph = graph_with(&["R", "A", "M"], &[("R", "A")]);
    let group = graph.add_group("G", "G");
    let member = graph.node_by_key("M").unwrap();
    graph.add_containment(group, member);

    let mut analyzer = NeighborhoodAnalyzer::with_graph(graph);
    select(&mut analyzer, &["R"]);
    analyzer.set_browse_mode(true).unwrap();

    assert_eq!(visible_keys(&analyzer), ["R", "A"]);
    assert!(analyzer.hidden().contains(&GraphObject::Node(group)));
    assert!(analyzer.hidden().contains(&GraphObject::Node(member)));
}

#[test]
fn test_removed_centers_are_dropped() {
    let mut analyzer = NeighborhoodAnalyzer::with_graph(chain());
    select(&mut analyzer, &["A", "D"]);
    analyzer.set_browse_mode(true).unwrap();
    assert_eq!(analyzer.get_center().len(), 2);

    let d = id(&analyzer, "D");
    analyzer.graph_mut().unwrap().remove_node(d);
    analyzer.apply_butterfly().unwrap();

    assert_eq!(analyzer.get_center(), &[id(&analyzer, "A")]);
    assert_eq!(visible_keys(&analyzer), ["A", "B"]);

    analyzer.update_neighborhood().unwrap();
    assert_eq!(analyzer.get_center(), &[id(&analyzer, "A")]);
}

#[test]
fn test_surrogate_center_resolves_to_canonical_node() {
    let mut graph = graph_with(&["A", "B", "C", "Proxy"], &[("A", "B"), ("B", "C")]);
    let proxy = graph.node_by_key("Proxy").unwrap();
    graph.node_mut(proxy).unwrap().properties.set(SURROGATE_OF, "C");

    let mut analyzer = NeighborhoodAnalyzer::with_graph(graph);
    select(&mut analyzer, &["Proxy"]);
    analyzer.set_browse_mode(true).unwrap();

    let c = id(&analyzer, "C");
    assert_eq!(analyzer.get_center(), &[c]);
    assert!(analyzer.graph().unwrap().is_neighborhood_center(c));
    assert_eq!(visible_keys(&analyzer), ["B", "C"]);
}

#[test]
fn test_user_hidden_objects_stay_hidden() {
    let mut graph = chain();
    let b = graph.node_by_key("B").unwrap();
    let blocked = graph.outgoing(b)[0];
    graph.set_visibility(GraphObject::Link(blocked), Visibility::Hidden);

    let mut analyzer = NeighborhoodAnalyzer::with_graph(graph);
    select(&mut analyzer, &["A"]);
    analyzer.set_distance(NEIGHBORHOOD_DISTANCE_ALL).unwrap();
    analyzer.set_browse_mode(true).unwrap();

    // The hidden link cuts the chain.
    assert_eq!(visible_keys(&analyzer), ["A", "B"]);
    assert!(!analyzer.hidden().contains(&GraphObject::Link(blocked)));

    analyzer.set_browse_mode(false).unwrap();
    assert_eq!(visible_keys(&analyzer), ["A", "B", "C", "D"]);
    assert!(!analyzer.graph().unwrap().is_visible(GraphObject::Link(blocked)));
}

#[test]
fn test_saved_document_restores_the_view() {
    let mut analyzer = NeighborhoodAnalyzer::with_graph(chain());
    select(&mut analyzer, &["B"]);
    analyzer.set_browse_mode(true).unwrap();
    let visible = visible_keys(&analyzer);

    let json = GraphDocument::from_graph(analyzer.graph().unwrap())
        .to_json()
        .unwrap();
    let graph = GraphDocument::from_json(&json).unwrap().into_graph().unwrap();

    let mut restored = NeighborhoodAnalyzer::with_graph(graph);
    assert!(restored.browse_mode());
    assert_eq!(restored.distance(), 1);
    assert_eq!(restored.get_center(), &[id(&restored, "B")]);
    assert_eq!(
        restored.hidden(),
        &HashSet::from([GraphObject::Node(id(&restored, "D"))])
    );

    restored.apply_butterfly().unwrap();
    assert_eq!(visible_keys(&restored), visible);
    assert_eq!(restored.layer_of(id(&restored, "C")), Some(1));

    restored.set_browse_mode(false).unwrap();
    assert_eq!(visible_keys(&restored), ["A", "B", "C", "D"]);
    assert!(restored.graph().unwrap().neighborhood_distance().is_none());
}

#[test]
fn test_cancel_from_another_thread_is_all_or_nothing() {
    const LEN: usize = 100_000;
    let keys = (0..LEN).map(|index| format!("n{index}")).collect::<Vec<_>>();
    let mut graph = Graph::new();
    let ids = keys
        .iter()
        .map(|key| graph.add_node(key, key))
        .collect::<Vec<_>>();
    for pair in ids.windows(2) {
        graph.add_link(pair[0], pair[1]);
    }

    let mut analyzer = NeighborhoodAnalyzer::with_graph(graph);
    analyzer.selection_mut().set([ids[0]]);
    analyzer.set_browse_mode(true).unwrap();
    let hidden = analyzer.hidden().clone();
    let layers = analyzer.layers().clone();
    assert_eq!(hidden.len(), LEN - 2);
    let events = analyzer.subscribe();

    let token = analyzer.cancel_token();
    let stop = Arc::new(AtomicBool::new(false));
    let canceller = {
        let stop = Arc::clone(&stop);
        thread::spawn(move || {
            while !stop.load(Ordering::SeqCst) {
                token.cancel();
                thread::yield_now();
            }
        })
    };
    let result = analyzer.set_distance(NEIGHBORHOOD_DISTANCE_ALL);
    stop.store(true, Ordering::SeqCst);
    canceller.join().unwrap();

    let events = events.try_iter().collect::<Vec<_>>();
    let changed = events
        .iter()
        .filter(|&&event| event == NeighborhoodEvent::NeighborhoodChanged)
        .count();
    assert!(events.contains(&NeighborhoodEvent::PropertyChanged(ModeProperty::Distance)));
    match result {
        Ok(()) => {
            assert!(analyzer.hidden().is_empty());
            assert_eq!(analyzer.layer_of(ids[LEN - 1]), Some((LEN - 1) as i32));
            assert_eq!(changed, 1);
        }
        Err(err) => {
            assert_eq!(err, NeighborhoodError::Cancelled);
            assert_eq!(analyzer.hidden(), &hidden);
            assert_eq!(analyzer.layers(), &layers);
            let graph = analyzer.graph().unwrap();
            assert_eq!(graph.visible_nodes().collect::<Vec<_>>(), vec![ids[0], ids[1]]);
            assert_eq!(graph.layer(ids[2]), None);
            assert_eq!(changed, 0);
        }
    }
    assert_eq!(analyzer.distance(), NEIGHBORHOOD_DISTANCE_ALL);
}
