use crate::*;
use serde_json::{Value, json};

mod link;
mod tree;
mod validate;

/// A document with every collection present and empty, overridden by `patch`.
fn document(patch: Value) -> Value {
    let mut base = json!({
        "attack_steps": {},
        "attackers": {},
        "abuse_cases": {},
        "loss_events": {},
        "actors": {}
    });
    if let (Some(base), Value::Object(patch)) = (base.as_object_mut(), patch) {
        for (k, v) in patch {
            base.insert(k, v);
        }
    }
    base
}

fn model_from(value: Value) -> YacrafModel {
    let doc = load_value(&value).unwrap();
    build_model_from_document(doc, &BuildOptions::default()).unwrap()
}

fn step(id: i64, ty: &str, parents: Value, children: Value) -> Value {
    json!({
        "id": id,
        "name": format!("step {id}"),
        "type": ty,
        "parents": parents,
        "children": children
    })
}
