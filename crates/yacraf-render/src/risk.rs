use crate::ViewMode;
use crate::model::{Point, ViewKind};
use crate::place::{LayoutEngine, Plan};
use yacraf_core::{EntityId, EntityRef, YacrafModel};

/// Actor -> loss events -> abuse cases -> attacker.
pub(crate) fn plan_actor(model: &YacrafModel, actor: EntityId) -> Plan {
    let mut plan = Plan::new(EntityRef::actor(actor));
    let root = plan.root();
    for le in model.actor_loss_events(actor) {
        let le_index = plan.push_child(root, EntityRef::loss_event(le.id));
        let abuse_cases = model
            .loss_event_links(le.id)
            .map(|l| l.abuse_cases.as_slice())
            .unwrap_or_default();
        for &ac in abuse_cases {
            let ac_index = plan.push_child(le_index, EntityRef::abuse_case(ac));
            if let Some(attacker) = model.abuse_case_links(ac).and_then(|l| l.attacker) {
                plan.push_child(ac_index, EntityRef::attacker(attacker));
            }
        }
    }
    plan
}

pub(crate) fn layout_risk_trees(engine: &mut LayoutEngine<'_>) {
    let model = engine.model();
    let actors: Vec<_> = model.document().actors.values().collect();
    if actors.is_empty() {
        return;
    }

    match engine.options().risk_views {
        ViewMode::PerTree => {
            for actor in actors {
                let plan = plan_actor(model, actor.id);
                engine.add_view(
                    format!("Risk for {}", actor.name),
                    ViewKind::Risk { actor: actor.id },
                    |view| {
                        view.place_subtree(&plan, Point::default());
                    },
                );
            }
        }
        ViewMode::Combined => {
            let plans: Vec<_> = actors.iter().map(|a| plan_actor(model, a.id)).collect();
            engine.add_view("Risk Trees".to_string(), ViewKind::RiskForest, |view| {
                view.place_sequence(&plans, Point::default());
            });
        }
    }
}
