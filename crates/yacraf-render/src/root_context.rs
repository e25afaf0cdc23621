use crate::model::{Point, ViewKind};
use crate::place::LayoutEngine;
use yacraf_core::{EntityId, EntityRef, YacrafModel};

/// Abuse cases targeting `root`, then loss events of the root and of those abuse cases.
///
/// Both lists are deduplicated, first occurrence wins.
pub(crate) fn root_context(model: &YacrafModel, root: EntityId) -> (Vec<EntityId>, Vec<EntityId>) {
    let abuse_cases: Vec<EntityId> = model.abuse_cases_targeting(root).map(|ac| ac.id).collect();

    let mut loss_events: Vec<EntityId> = Vec::new();
    let from_root = model
        .attack_event_links(root)
        .map(|l| l.loss_events.as_slice())
        .unwrap_or_default();
    let from_abuse_cases = abuse_cases.iter().flat_map(|&ac| {
        model
            .abuse_case_links(ac)
            .map(|l| l.loss_events.as_slice())
            .unwrap_or_default()
    });
    for &le in from_root.iter().chain(from_abuse_cases) {
        if !loss_events.contains(&le) {
            loss_events.push(le);
        }
    }
    (abuse_cases, loss_events)
}

/// Per root: abuse cases stacked upward to the left, loss events stacked upward to the right.
pub(crate) fn layout_root_contexts(engine: &mut LayoutEngine<'_>) {
    let model = engine.model();
    let footprints = &engine.options().footprints;
    let spacing = &engine.options().spacing;
    let (px, py) = (spacing.padding_x, spacing.padding_y);

    for root in model.tree_roots() {
        let (abuse_cases, loss_events) = root_context(model, root.id);
        engine.add_view(
            format!("Abuse Cases/Loss Events for {}", root.name),
            ViewKind::RootContext { root: root.id },
            |view| {
                let root = EntityRef::attack_event(root.id);
                let origin = view.place(root, Point::default());

                let ac = footprints.abuse_case;
                for (i, &id) in abuse_cases.iter().enumerate() {
                    let abuse_case = EntityRef::abuse_case(id);
                    let row = (i + 1) as f64;
                    let x = origin.x - ac.width - 2.0 * px;
                    view.place(abuse_case, Point::new(x, origin.y - row * (ac.height + py)));
                    view.connect(abuse_case, root);
                }

                let le = footprints.loss_event;
                let x = origin.x + footprints.attack_event.width + 2.0 * px;
                for (i, &id) in loss_events.iter().enumerate() {
                    let loss_event = EntityRef::loss_event(id);
                    let row = (i + 1) as f64;
                    view.place(loss_event, Point::new(x, origin.y - row * (le.height + py)));
                    view.connect(root, loss_event);
                }
            },
        );
    }
}
