use crate::model::{Point, ViewKind};
use crate::place::LayoutEngine;
use yacraf_core::EntityRef;

pub(crate) const VIEW_NAME: &str = "Defense Mechanisms";

/// One column per defense, its mitigated attack events stacked to its right.
pub(crate) fn layout_defenses(engine: &mut LayoutEngine<'_>) {
    let model = engine.model();
    if model.document().defenses.is_empty() {
        return;
    }
    let footprints = &engine.options().footprints;
    let px = engine.options().spacing.padding_x;
    let stride = footprints.defense.width + footprints.attack_event.width + 2.0 * px;
    let step = footprints.attack_event.height + px;

    engine.add_view(VIEW_NAME.to_string(), ViewKind::Defenses, |view| {
        for (i, &id) in model.document().defenses.keys().enumerate() {
            let defense = EntityRef::defense(id);
            let origin = view.place(defense, Point::new(i as f64 * stride, 0.0));

            let mut slot = Point::new(origin.x + 2.0 * px + footprints.defense.width, origin.y);
            let mitigated = model
                .defense_links(id)
                .map(|l| l.attack_events.as_slice())
                .unwrap_or_default();
            for &event in mitigated {
                let event = EntityRef::attack_event(event);
                if view.position_of(event).is_none() {
                    view.place(event, slot);
                    slot.y += step;
                }
                view.connect(defense, event);
            }
        }
    });
}
