use super::*;
use crate::tree::SkippedEdge;

fn events(value: Value) -> indexmap::IndexMap<EntityId, AttackEvent> {
    load_value(&document(json!({ "attack_steps": value })))
        .unwrap()
        .attack_events
}

fn child_events(tree: &AttackTree, index: usize) -> Vec<EntityId> {
    tree.children(index).map(|n| n.event).collect()
}

#[test]
fn leaf_root_is_a_single_node_tree() {
    let events = events(json!({ "a": step(1, "or", json!([]), json!({})) }));
    let tree = build_tree(1, &events, &TreeOptions::default()).unwrap();
    assert_eq!(tree.len(), 1);
    assert!(tree.root().is_leaf());
    assert_eq!(tree.root_event(), 1);
}

#[test]
fn unknown_root_builds_nothing() {
    let events = events(json!({ "a": step(1, "or", json!([]), json!({})) }));
    assert!(build_tree(42, &events, &TreeOptions::default()).is_none());
}

#[test]
fn two_node_cycle_is_truncated_at_depth_two() {
    let events = events(json!({
        "a": step(1, "or", json!([]), json!({"2": "b"})),
        "b": step(2, "or", json!({"1": "a"}), json!({"1": "a"}))
    }));
    let tree = build_tree(1, &events, &TreeOptions::default()).unwrap();

    assert_eq!(tree.root_event(), 1);
    assert_eq!(child_events(&tree, tree.root_index()), vec![2]);
    let child = tree.root().children[0];
    assert!(tree.node(child).unwrap().is_leaf());
    assert_eq!(tree.truncated(), &[SkippedEdge { parent: 2, child: 1 }]);
}

#[test]
fn self_loop_is_truncated() {
    let events = events(json!({
        "a": step(1, "or", json!([]), json!({"1": "a", "2": "b"})),
        "b": step(2, "or", json!({"1": "a"}), json!({}))
    }));
    let tree = build_tree(1, &events, &TreeOptions::default()).unwrap();
    assert_eq!(child_events(&tree, 0), vec![2]);
}

#[test]
fn no_id_repeats_along_any_root_to_leaf_path() {
    // 1 -> 2 -> 3 -> {1, 4}, 4 -> 2
    let events = events(json!({
        "a": step(1, "or", json!([]), json!({"2": "b"})),
        "b": step(2, "and", json!({"1": "a"}), json!({"3": "c"})),
        "c": step(3, "or", json!({"2": "b"}), json!({"1": "a", "4": "d"})),
        "d": step(4, "or", json!({"3": "c"}), json!({"2": "b"}))
    }));
    let tree = build_tree(1, &events, &TreeOptions::default()).unwrap();

    for (index, node) in tree.breadth_first() {
        if !node.is_leaf() {
            continue;
        }
        let mut path = tree.path_to_root(index);
        let len = path.len();
        path.sort_unstable();
        path.dedup();
        assert_eq!(path.len(), len, "repeated id on path to leaf {}", node.event);
    }
    assert_eq!(tree.len(), 4);
    assert_eq!(tree.truncated().len(), 2);
}

#[test]
fn skip_policy_keeps_siblings_after_a_cyclic_child() {
    let events = events(json!({
        "a": step(1, "or", json!([]), json!({"2": "b"})),
        "b": step(2, "or", json!({"1": "a"}), json!({"1": "a", "3": "c"})),
        "c": step(3, "or", json!({"2": "b"}), json!({}))
    }));

    let skip = build_tree(1, &events, &TreeOptions::default()).unwrap();
    let b = skip.root().children[0];
    assert_eq!(child_events(&skip, b), vec![3]);

    let legacy = TreeOptions {
        cycle_policy: CyclePolicy::TruncateSiblings,
    };
    let truncated = build_tree(1, &events, &legacy).unwrap();
    let b = truncated.root().children[0];
    assert!(child_events(&truncated, b).is_empty());
}

#[test]
fn dangling_children_are_skipped() {
    let events = events(json!({
        "a": step(1, "or", json!([]), json!({"9": "ghost", "2": "b"})),
        "b": step(2, "or", json!({"1": "a"}), json!({}))
    }));
    let tree = build_tree(1, &events, &TreeOptions::default()).unwrap();
    assert_eq!(child_events(&tree, 0), vec![2]);
    assert_eq!(tree.dangling(), &[SkippedEdge { parent: 1, child: 9 }]);
}

#[test]
fn shared_child_occurs_once_per_branch() {
    let events = events(json!({
        "a": step(1, "and", json!([]), json!({"2": "b", "3": "c"})),
        "b": step(2, "or", json!({"1": "a"}), json!({"4": "d"})),
        "c": step(3, "or", json!({"1": "a"}), json!({"4": "d"})),
        "d": step(4, "or", json!({"2": "b", "3": "c"}), json!({}))
    }));
    let tree = build_tree(1, &events, &TreeOptions::default()).unwrap();
    assert_eq!(tree.nodes().iter().filter(|n| n.event == 4).count(), 2);
    assert_eq!(tree.height(), 2);
}

#[test]
fn forest_has_one_tree_per_root_in_document_order() {
    let events = events(json!({
        "x": step(7, "or", json!(null), json!({})),
        "a": step(1, "or", json!([]), json!({"2": "b"})),
        "b": step(2, "or", json!({"1": "a"}), json!({}))
    }));
    let forest = build_forest(&events, &TreeOptions::default());
    let roots: Vec<_> = forest.iter().map(AttackTree::root_event).collect();
    assert_eq!(roots, vec![7, 1]);
}

#[test]
fn traversals_visit_every_node() {
    let events = events(json!({
        "a": step(1, "or", json!([]), json!({"2": "b", "3": "c"})),
        "b": step(2, "or", json!({"1": "a"}), json!({"4": "d"})),
        "c": step(3, "or", json!({"1": "a"}), json!({})),
        "d": step(4, "or", json!({"2": "b"}), json!({}))
    }));
    let tree = build_tree(1, &events, &TreeOptions::default()).unwrap();

    let bfs: Vec<_> = tree.breadth_first().map(|(_, n)| n.event).collect();
    assert_eq!(bfs, vec![1, 2, 3, 4]);
    let dfs: Vec<_> = tree.depth_first().map(|(_, n)| n.event).collect();
    assert_eq!(dfs, vec![1, 2, 4, 3]);
    assert_eq!(tree.to_string(), "1\n  2\n    4\n  3\n");
}

#[test]
fn long_chain_builds_without_recursion() {
    const LEN: i64 = 10_000;
    let mut steps = serde_json::Map::new();
    for id in 1..=LEN {
        let link = |other: i64| {
            let mut refs = serde_json::Map::new();
            if (1..=LEN).contains(&other) {
                refs.insert(other.to_string(), json!(format!("s{other}")));
            }
            Value::Object(refs)
        };
        let (parents, children) = (link(id - 1), link(id + 1));
        steps.insert(format!("s{id}"), step(id, "or", parents, children));
    }
    let events = events(Value::Object(steps));
    let tree = build_tree(1, &events, &TreeOptions::default()).unwrap();

    assert_eq!(tree.len(), LEN as usize);
    let deepest = tree.depth_first().last().unwrap().1;
    assert_eq!(deepest.event, LEN);
    assert_eq!(deepest.depth, LEN as usize - 1);
    assert!(tree.truncated().is_empty());
}
