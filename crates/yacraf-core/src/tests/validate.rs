use super::*;
use crate::validate::{is_valid_abuse_case, is_valid_loss_event};

fn simple_tree(with_loss_event: bool) -> Value {
    let mut patch = json!({
        "attack_steps": { "root": step(1, "or", json!([]), json!({})) },
        "attackers": { "Attacker": { "id": 20, "name": "Attacker" } },
        "abuse_cases": {
            "Abuse": {
                "id": 10,
                "name": "Abuse",
                "attacker": { "20": "Attacker" },
                "attack_events": { "1": "root" }
            }
        }
    });
    if with_loss_event {
        patch["loss_events"] = json!({
            "Loss": {
                "id": 30,
                "name": "Loss",
                "abuse_cases": { "10": "Abuse" },
                "attack_events": { "1": "root" }
            }
        });
        patch["actors"] = json!({
            "Owner": { "id": 40, "name": "Owner", "loss_events": { "30": "Loss" } }
        });
    }
    document(patch)
}

#[test]
fn simple_tree_abuse_case_needs_a_loss_event() {
    let model = model_from(simple_tree(false));
    let roots: Vec<_> = model.tree_roots().map(|e| e.id).collect();
    assert_eq!(roots, vec![1]);
    assert_eq!(model.abuse_case_links(10).unwrap().attacker, Some(20));
    assert!(!is_valid_abuse_case(&model, 10));

    let report = validate(&model, &ValidationOptions::default());
    assert!(!report.is_valid());
    let issues: Vec<_> = report
        .for_entity(EntityKind::AbuseCase, 10)
        .map(|d| d.issue.clone())
        .collect();
    assert_eq!(issues, vec![Issue::MissingLossEvents]);
}

#[test]
fn simple_tree_with_loss_event_is_valid() {
    let model = model_from(simple_tree(true));
    assert!(is_valid_abuse_case(&model, 10));
    assert!(is_valid_loss_event(&model, 30));
    let report = validate(
        &model,
        &ValidationOptions {
            require_root_abuse_case: true,
            single_attacker: true,
        },
    );
    assert!(report.is_valid(), "{report}");
}

#[test]
fn loss_event_validity_matches_its_associations() {
    let model = model_from(document(json!({
        "attack_steps": { "root": step(1, "or", json!([]), json!({})) },
        "abuse_cases": { "ac": { "id": 10, "name": "ac" } },
        "loss_events": {
            "complete": {
                "id": 1, "name": "complete",
                "abuse_cases": {"10": "ac"}, "attack_events": {"1": "root"}
            },
            "no actor": {
                "id": 2, "name": "no actor",
                "abuse_cases": {"10": "ac"}, "attack_events": {"1": "root"}
            },
            "no events": { "id": 3, "name": "no events", "abuse_cases": {"10": "ac"} },
            "empty": { "id": 4, "name": "empty" }
        },
        "actors": { "a": {
            "id": 40, "name": "a",
            "loss_events": {"1": "complete", "3": "no events", "4": "empty"}
        } }
    })));

    for (&id, _) in &model.document().loss_events {
        let links = model.loss_event_links(id).unwrap();
        let expected = !links.abuse_cases.is_empty()
            && !links.attack_events.is_empty()
            && links.actor.is_some();
        assert_eq!(is_valid_loss_event(&model, id), expected, "loss event {id}");
    }
    assert!(is_valid_loss_event(&model, 1));
    assert!(!is_valid_loss_event(&model, 2));
}

#[test]
fn root_abuse_case_rule_only_applies_when_enabled() {
    let model = model_from(document(json!({
        "attack_steps": {
            "root": step(1, "or", json!([]), json!({"2": "child"})),
            "child": step(2, "or", json!({"1": "root"}), json!({}))
        }
    })));

    assert!(validate(&model, &ValidationOptions::default()).is_valid());

    let report = validate(
        &model,
        &ValidationOptions {
            require_root_abuse_case: true,
            ..Default::default()
        },
    );
    assert_eq!(
        report.diagnostics,
        vec![Diagnostic {
            kind: EntityKind::AttackEvent,
            id: Some(1),
            issue: Issue::RootWithoutAbuseCase,
        }]
    );
}

#[test]
fn single_attacker_mode_counts_attackers_globally() {
    let model = model_from(document(json!({
        "attackers": {
            "a": { "id": 1, "name": "a" },
            "b": { "id": 2, "name": "b" }
        }
    })));

    let report = validate(
        &model,
        &ValidationOptions {
            single_attacker: true,
            ..Default::default()
        },
    );
    assert!(report.diagnostics.contains(&Diagnostic {
        kind: EntityKind::Attacker,
        id: None,
        issue: Issue::AttackerCount { found: 2 },
    }));
    // Both attackers also lack abuse cases.
    assert_eq!(report.diagnostics.len(), 3);
}

#[test]
fn report_display_lists_every_issue() {
    let model = model_from(simple_tree(false));
    let text = validate(&model, &ValidationOptions::default()).to_string();
    assert!(text.contains("abuse_case 10: needs at least one loss event"), "{text}");
}
