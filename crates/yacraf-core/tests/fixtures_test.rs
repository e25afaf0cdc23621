use std::path::PathBuf;
use yacraf_core::{
    BuildOptions, EntityKind, Issue, ValidationOptions, build_model, validate,
};

fn workspace_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
}

fn fixture(name: &str) -> String {
    let path = workspace_root()
        .join("fixtures")
        .join("attack_graph")
        .join(name);
    std::fs::read_to_string(&path).expect("fixture")
}

#[test]
fn mini_fixture_builds_two_trees_and_validates() {
    let model = build_model(&fixture("mini.json"), &BuildOptions::default()).expect("build ok");

    let roots: Vec<_> = model.tree_roots().map(|e| e.name.as_str()).collect();
    assert_eq!(roots, vec!["Compromise host", "Exfiltrate data"]);
    assert_eq!(model.attack_trees()[0].len(), 4);

    assert_eq!(model.defense_links(5).unwrap().attack_events, vec![2, 4]);
    assert_eq!(model.attack_event_links(4).unwrap().defenses, vec![5]);

    let report = validate(
        &model,
        &ValidationOptions {
            require_root_abuse_case: true,
            single_attacker: true,
        },
    );
    assert!(report.is_valid(), "{report}");

    let outline = model.outline(&model.attack_trees()[0]);
    assert!(outline.starts_with("  1 [or] Compromise host\n"), "{outline}");
    assert!(outline.contains("      4 [or] Steal credentials"), "{outline}");
}

#[test]
fn cyclic_fixture_terminates() {
    let model = build_model(&fixture("cyclic.json"), &BuildOptions::default()).expect("build ok");
    let trees = model.attack_trees();
    assert_eq!(trees.len(), 1);
    assert_eq!(trees[0].len(), 2);
    assert_eq!(trees[0].truncated().len(), 1);
}

#[test]
fn dangling_defense_fixture_links_without_error() {
    let model =
        build_model(&fixture("dangling_defense.json"), &BuildOptions::default()).expect("build ok");
    assert!(model.defense_links(5).unwrap().attack_events.is_empty());
}

#[test]
fn invalid_fixture_reports_every_offender() {
    let model = build_model(&fixture("invalid.json"), &BuildOptions::default()).expect("build ok");
    let report = validate(&model, &ValidationOptions::default());
    assert!(!report.is_valid());

    let loss_event: Vec<_> = report
        .for_entity(EntityKind::LossEvent, 30)
        .map(|d| d.issue.clone())
        .collect();
    assert_eq!(
        loss_event,
        vec![
            Issue::MissingAbuseCases,
            Issue::MissingAttackEvents,
            Issue::MissingActor
        ]
    );
    assert_eq!(report.for_entity(EntityKind::AbuseCase, 10).count(), 1);
    assert_eq!(report.for_entity(EntityKind::Attacker, 21).count(), 1);
    assert_eq!(report.for_entity(EntityKind::Attacker, 20).count(), 0);
    assert_eq!(report.diagnostics.len(), 5);

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["diagnostics"][0]["kind"], "loss_event");
    assert_eq!(json["diagnostics"][0]["issue"], "missing_abuse_cases");
}
