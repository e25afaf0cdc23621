use super::*;

fn linked_fixture() -> Value {
    document(json!({
        "attack_steps": {
            "root": step(1, "or", json!([]), json!({"2": "a", "3": "b"})),
            "a": step(2, "and", json!({"1": "root"}), json!({})),
            "b": step(3, "or", json!({"1": "root"}), json!({})),
            "mfa": step(5, "defense", json!([]), json!({"2": "a", "3": "b", "999": "ghost"}))
        },
        "attackers": {
            "Criminal": { "id": 20, "name": "Criminal" }
        },
        "abuse_cases": {
            "Ransomware": {
                "id": 10,
                "name": "Ransomware",
                "attacker": { "20": "Criminal" },
                "attack_events": { "1": "root" }
            }
        },
        "loss_events": {
            "Downtime": {
                "id": 30,
                "name": "Downtime",
                "abuse_cases": { "10": "Ransomware" },
                "attack_events": { "1": "root" }
            }
        },
        "actors": {
            "Company": {
                "id": 40,
                "name": "Company",
                "loss_events": { "30": "Downtime", "31": "missing" }
            }
        }
    }))
}

#[test]
fn defense_links_are_symmetric() {
    let model = model_from(linked_fixture());

    for defense in model.document().defenses.values() {
        let links = model.defense_links(defense.id).unwrap();
        for &event in &links.attack_events {
            assert!(
                model.attack_event_links(event).unwrap().defenses.contains(&defense.id),
                "attack event {event} should list defense {}",
                defense.id
            );
        }
    }
    for (&event, links) in &model.links().attack_events {
        for defense in &links.defenses {
            assert!(model.defense_links(*defense).unwrap().attack_events.contains(&event));
        }
    }
    assert_eq!(model.defense_links(5).unwrap().attack_events, vec![2, 3]);
}

#[test]
fn risk_associations_are_linked_both_ways() {
    let model = model_from(linked_fixture());

    assert_eq!(model.actor_links(40).unwrap().loss_events, vec![30]);
    let le = model.loss_event_links(30).unwrap();
    assert_eq!(le.actor, Some(40));
    assert_eq!(le.abuse_cases, vec![10]);
    assert_eq!(le.attack_events, vec![1]);

    let ac = model.abuse_case_links(10).unwrap();
    assert_eq!(ac.attacker, Some(20));
    assert_eq!(ac.loss_events, vec![30]);
    assert_eq!(ac.attack_events, vec![1]);

    assert_eq!(model.attacker_links(20).unwrap().abuse_cases, vec![10]);
    let root = model.attack_event_links(1).unwrap();
    assert_eq!(root.abuse_case, Some(10));
    assert_eq!(root.loss_events, vec![30]);
}

#[test]
fn dangling_defense_reference_is_dropped() {
    let model = model_from(document(json!({
        "attack_steps": {
            "d": { "id": 5, "name": "d", "type": "defense", "children": { "999": "ghost" } }
        }
    })));
    assert!(model.defense_links(5).unwrap().attack_events.is_empty());
}

#[test]
fn declared_loss_event_actor_overrides_actor_list() {
    let model = model_from(document(json!({
        "loss_events": {
            "le": { "id": 30, "name": "le", "actor": { "41": "second" } }
        },
        "actors": {
            "first": { "id": 40, "name": "first", "loss_events": { "30": "le" } },
            "second": { "id": 41, "name": "second", "loss_events": {} }
        }
    })));

    assert_eq!(model.loss_event_links(30).unwrap().actor, Some(41));
    assert!(model.actor_links(40).unwrap().loss_events.is_empty());
    assert_eq!(model.actor_links(41).unwrap().loss_events, vec![30]);
}

#[test]
fn link_steps_must_run_in_order() {
    let doc = load_value(&linked_fixture()).unwrap();
    let mut builder = ModelBuilder::new(doc);

    let err = builder.link_actors().unwrap_err();
    let Error::BuildOrder(order) = err else {
        panic!("expected a build order error");
    };
    assert_eq!(order.step, BuildStep::LinkActors);
    assert_eq!(order.stage, BuildStage::Loaded);
    assert_eq!(builder.stage(), BuildStage::Loaded);

    builder.link_defenses().unwrap();
    assert!(builder.link_defenses().is_err());
    builder.link_actors().unwrap();
    builder.link_loss_events().unwrap();
    builder.link_abuse_cases().unwrap();
    assert_eq!(builder.stage(), BuildStage::AbuseCasesLinked);
}

#[test]
fn trees_require_complete_linking() {
    let doc = load_value(&linked_fixture()).unwrap();
    let mut builder = ModelBuilder::new(doc);
    builder.link_defenses().unwrap();

    let err = builder.build_trees(&TreeOptions::default()).unwrap_err();
    assert!(matches!(
        err,
        Error::BuildOrder(BuildOrderError {
            step: BuildStep::BuildTrees,
            stage: BuildStage::DefensesLinked
        })
    ));
}

#[test]
fn linking_defenses_after_trees_are_built_is_rejected() {
    let mut builder = link(load_value(&linked_fixture()).unwrap()).unwrap();
    builder.build_trees(&TreeOptions::default()).unwrap();
    let before = builder.links().clone();

    let err = builder.link_defenses().unwrap_err();
    assert!(matches!(
        err,
        Error::BuildOrder(BuildOrderError {
            step: BuildStep::LinkDefenses,
            stage: BuildStage::TreesBuilt
        })
    ));
    assert_eq!(builder.links(), &before);
    assert!(err.to_string().contains("cannot link defenses"));

    builder.finish().unwrap();
}

#[test]
fn finish_requires_built_trees() {
    let builder = link(load_value(&linked_fixture()).unwrap()).unwrap();
    assert!(matches!(builder.finish(), Err(Error::BuildOrder(_))));
}

#[test]
fn actor_queries_walk_loss_events_then_abuse_cases() {
    let model = model_from(linked_fixture());

    let loss_events: Vec<_> = model.actor_loss_events(40).map(|le| le.id).collect();
    assert_eq!(loss_events, vec![30]);

    let abuse_cases: Vec<_> = model.actor_abuse_cases(40).map(|ac| ac.id).collect();
    assert_eq!(abuse_cases, vec![10]);
    // Restartable: a second call yields the same sequence.
    assert_eq!(model.actor_abuse_cases(40).count(), 1);

    let targeting: Vec<_> = model.abuse_cases_targeting(1).map(|ac| ac.id).collect();
    assert_eq!(targeting, vec![10]);
    assert_eq!(model.abuse_cases_targeting(2).count(), 0);
}

#[test]
fn overwritten_abuse_case_target_is_removed_from_the_previous_owner() {
    let model = model_from(document(json!({
        "attack_steps": {
            "r": step(1, "or", json!([]), json!({}))
        },
        "abuse_cases": {
            "first": { "id": 10, "name": "first", "attack_events": { "1": "r" } },
            "second": { "id": 11, "name": "second", "attack_events": { "1": "r" } }
        }
    })));

    assert_eq!(model.attack_event_links(1).unwrap().abuse_case, Some(11));
    assert!(model.abuse_case_links(10).unwrap().attack_events.is_empty());
    assert_eq!(model.abuse_case_links(11).unwrap().attack_events, vec![1]);
    let targeting: Vec<_> = model.abuse_cases_targeting(1).map(|ac| ac.id).collect();
    assert_eq!(targeting, vec![11]);
}
