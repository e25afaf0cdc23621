use crate::ViewMode;
use crate::model::{Point, ViewKind};
use crate::place::{LayoutEngine, Plan, PlanEntry};
use yacraf_core::{AttackTree, EntityRef};

/// Mirrors the tree arena one to one, so node indices carry over unchanged.
pub(crate) fn plan_tree(tree: &AttackTree) -> Plan {
    let entries = tree
        .nodes()
        .iter()
        .map(|node| PlanEntry {
            entity: EntityRef::attack_event(node.event),
            children: node.children.clone(),
        })
        .collect();
    Plan::from_entries(tree.root_index(), entries)
}

/// Attack tree views: one per root, or a single combined view.
pub(crate) fn layout_attack_trees(engine: &mut LayoutEngine<'_>) {
    let model = engine.model();
    let plans: Vec<_> = model.attack_trees().iter().map(plan_tree).collect();

    match engine.options().attack_tree_views {
        ViewMode::PerTree => {
            for (tree, plan) in model.attack_trees().iter().zip(&plans) {
                let root = tree.root_event();
                let name = model
                    .attack_event(root)
                    .map(|e| e.name.as_str())
                    .unwrap_or_default();
                engine.add_view(
                    format!("Attack Tree: {name}"),
                    ViewKind::AttackTree { root },
                    |view| {
                        view.place_subtree(plan, Point::default());
                    },
                );
            }
        }
        ViewMode::Combined => {
            if plans.is_empty() {
                return;
            }
            engine.add_view("Attack Trees".to_string(), ViewKind::AttackForest, |view| {
                view.place_sequence(&plans, Point::default());
            });
        }
    }
}
