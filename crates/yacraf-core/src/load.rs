//! Entity Loader: JSON attack graph document -> typed records keyed by id.
//!
//! No cross references are resolved here apart from normalizing the abuse case `attacker`
//! single-entry map into a scalar id.

use crate::entities::{
    AbuseCase, Actor, AttackEvent, Attacker, AttributeBag, Defense, EntityId, Gate, LossEvent,
    RefMap,
};
use crate::error::ParseError;
use indexmap::IndexMap;
use rustc_hash::FxHashSet;
use serde::Serialize;
use serde_json::{Map, Value};

pub const ATTACK_STEPS: &str = "attack_steps";
pub const ATTACKERS: &str = "attackers";
pub const ABUSE_CASES: &str = "abuse_cases";
pub const LOSS_EVENTS: &str = "loss_events";
pub const ACTORS: &str = "actors";

const ID: &str = "id";
const NAME: &str = "name";
const TYPE: &str = "type";
const CHILDREN: &str = "children";
const PARENTS: &str = "parents";
const ATTACKER: &str = "attacker";
const ATTACK_EVENTS: &str = "attack_events";
const ACTOR: &str = "actor";

/// All records of one document, each collection in document order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Document {
    pub attack_events: IndexMap<EntityId, AttackEvent>,
    pub defenses: IndexMap<EntityId, Defense>,
    pub attackers: IndexMap<EntityId, Attacker>,
    pub abuse_cases: IndexMap<EntityId, AbuseCase>,
    pub loss_events: IndexMap<EntityId, LossEvent>,
    pub actors: IndexMap<EntityId, Actor>,
}

impl Document {
    pub fn len(&self) -> usize {
        self.attack_events.len()
            + self.defenses.len()
            + self.attackers.len()
            + self.abuse_cases.len()
            + self.loss_events.len()
            + self.actors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub fn load(text: &str) -> Result<Document, ParseError> {
    let value: Value = serde_json::from_str(text)?;
    load_value(&value)
}

pub fn load_value(value: &Value) -> Result<Document, ParseError> {
    let root = value.as_object().ok_or(ParseError::NotAnObject)?;

    let steps = records(root, ATTACK_STEPS)?;
    let attacker_records = records(root, ATTACKERS)?;
    let abuse_case_records = records(root, ABUSE_CASES)?;
    let loss_event_records = records(root, LOSS_EVENTS)?;
    let actor_records = records(root, ACTORS)?;

    let mut doc = Document::default();
    let mut step_ids: FxHashSet<EntityId> = FxHashSet::default();

    for (key, record) in steps {
        let r = Record::new(ATTACK_STEPS, key, record)?;
        let id = r.id()?;
        if !step_ids.insert(id) {
            return Err(ParseError::DuplicateId {
                collection: ATTACK_STEPS,
                id,
            });
        }
        let name = r.name()?;
        let ty = r.required_str(TYPE)?;
        let children = r.ref_map(CHILDREN)?;
        match ty.to_ascii_lowercase().as_str() {
            "defense" => {
                doc.defenses.insert(
                    id,
                    Defense {
                        id,
                        name,
                        children,
                        attributes: r.attributes(&[TYPE, CHILDREN, PARENTS]),
                    },
                );
            }
            "and" | "or" => {
                let gate = if ty.eq_ignore_ascii_case("and") {
                    Gate::And
                } else {
                    Gate::Or
                };
                doc.attack_events.insert(
                    id,
                    AttackEvent {
                        id,
                        name,
                        gate,
                        children,
                        parents: r.id_list(PARENTS)?,
                        attributes: r.attributes(&[TYPE, CHILDREN, PARENTS]),
                    },
                );
            }
            other => {
                return Err(r.invalid(
                    TYPE,
                    format!("expected `and`, `or` or `defense`, got `{other}`"),
                ));
            }
        }
    }

    let mut attacker_names: IndexMap<String, EntityId> = IndexMap::new();
    for (key, record) in attacker_records {
        let r = Record::new(ATTACKERS, key, record)?;
        let id = r.id()?;
        let name = r.name()?;
        if let Some(key) = key {
            attacker_names.entry(key.to_string()).or_insert(id);
        }
        attacker_names.entry(name.clone()).or_insert(id);
        let attacker = Attacker {
            id,
            name,
            attributes: r.attributes(&[]),
        };
        if doc.attackers.insert(id, attacker).is_some() {
            return Err(ParseError::DuplicateId {
                collection: ATTACKERS,
                id,
            });
        }
    }

    for (key, record) in abuse_case_records {
        let r = Record::new(ABUSE_CASES, key, record)?;
        let id = r.id()?;
        let abuse_case = AbuseCase {
            id,
            name: r.name()?,
            attacker: r.attacker_ref(&attacker_names)?,
            attack_events: r.ref_map(ATTACK_EVENTS)?,
            attributes: r.attributes(&[ATTACKER, ATTACK_EVENTS]),
        };
        if doc.abuse_cases.insert(id, abuse_case).is_some() {
            return Err(ParseError::DuplicateId {
                collection: ABUSE_CASES,
                id,
            });
        }
    }

    for (key, record) in loss_event_records {
        let r = Record::new(LOSS_EVENTS, key, record)?;
        let id = r.id()?;
        let loss_event = LossEvent {
            id,
            name: r.name()?,
            loss_type: r.optional_str(TYPE),
            abuse_cases: r.ref_map(ABUSE_CASES)?,
            attack_events: r.ref_map(ATTACK_EVENTS)?,
            // Several entries: the last one wins, matching how linking overwrites the actor.
            actor: r.ref_map(ACTOR)?.keys().last().copied(),
            attributes: r.attributes(&[TYPE, ABUSE_CASES, ATTACK_EVENTS, ACTOR]),
        };
        if doc.loss_events.insert(id, loss_event).is_some() {
            return Err(ParseError::DuplicateId {
                collection: LOSS_EVENTS,
                id,
            });
        }
    }

    for (key, record) in actor_records {
        let r = Record::new(ACTORS, key, record)?;
        let id = r.id()?;
        let actor = Actor {
            id,
            name: r.name()?,
            actor_type: r.optional_str(TYPE),
            loss_events: r.ref_map(LOSS_EVENTS)?,
            attributes: r.attributes(&[TYPE, LOSS_EVENTS]),
        };
        if doc.actors.insert(id, actor).is_some() {
            return Err(ParseError::DuplicateId {
                collection: ACTORS,
                id,
            });
        }
    }

    tracing::info!(
        attack_events = doc.attack_events.len(),
        defenses = doc.defenses.len(),
        attackers = doc.attackers.len(),
        abuse_cases = doc.abuse_cases.len(),
        loss_events = doc.loss_events.len(),
        actors = doc.actors.len(),
        "loaded attack graph document"
    );

    Ok(doc)
}

/// Records of a collection with their display key (absent for array collections).
fn records<'a>(
    root: &'a Map<String, Value>,
    collection: &'static str,
) -> Result<Vec<(Option<&'a str>, &'a Value)>, ParseError> {
    match root.get(collection) {
        None => Err(ParseError::MissingCollection { collection }),
        Some(Value::Object(map)) => Ok(map.iter().map(|(k, v)| (Some(k.as_str()), v)).collect()),
        Some(Value::Array(items)) => Ok(items.iter().map(|v| (None, v)).collect()),
        Some(_) => Err(ParseError::InvalidCollection { collection }),
    }
}

pub(crate) fn parse_id(value: &Value) -> Option<EntityId> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

struct Record<'a> {
    collection: &'static str,
    label: String,
    fields: &'a Map<String, Value>,
}

impl<'a> Record<'a> {
    fn new(
        collection: &'static str,
        key: Option<&str>,
        value: &'a Value,
    ) -> Result<Self, ParseError> {
        let label = key.map(str::to_string).unwrap_or_else(|| "<unnamed>".to_string());
        let fields = value.as_object().ok_or_else(|| ParseError::InvalidField {
            collection,
            record: label.clone(),
            field: "record",
            message: "expected a JSON object".to_string(),
        })?;
        Ok(Self {
            collection,
            label,
            fields,
        })
    }

    fn missing(&self, field: &'static str) -> ParseError {
        ParseError::MissingField {
            collection: self.collection,
            record: self.label.clone(),
            field,
        }
    }

    fn invalid(&self, field: &'static str, message: impl Into<String>) -> ParseError {
        ParseError::InvalidField {
            collection: self.collection,
            record: self.label.clone(),
            field,
            message: message.into(),
        }
    }

    fn id(&self) -> Result<EntityId, ParseError> {
        let raw = self.fields.get(ID).ok_or_else(|| self.missing(ID))?;
        parse_id(raw).ok_or_else(|| self.invalid(ID, format!("expected an integer id, got {raw}")))
    }

    fn name(&self) -> Result<String, ParseError> {
        self.required_str(NAME)
    }

    fn required_str(&self, field: &'static str) -> Result<String, ParseError> {
        match self.fields.get(field) {
            None | Some(Value::Null) => Err(self.missing(field)),
            Some(Value::String(s)) => Ok(s.clone()),
            Some(other) => Err(self.invalid(field, format!("expected a string, got {other}"))),
        }
    }

    fn optional_str(&self, field: &str) -> Option<String> {
        self.fields.get(field).and_then(Value::as_str).map(str::to_string)
    }

    /// `{"<id>": "<name>", ...}`, a list of ids, or null/absent.
    fn ref_map(&self, field: &'static str) -> Result<RefMap, ParseError> {
        let mut out = RefMap::new();
        match self.fields.get(field) {
            None | Some(Value::Null) => {}
            Some(Value::Object(map)) => {
                for (k, v) in map {
                    let id = k.trim().parse::<EntityId>().map_err(|_| {
                        self.invalid(field, format!("reference key `{k}` is not an integer id"))
                    })?;
                    out.insert(id, v.as_str().unwrap_or_default().to_string());
                }
            }
            Some(Value::Array(items)) => {
                for item in items {
                    let id = parse_id(item).ok_or_else(|| {
                        self.invalid(field, format!("reference `{item}` is not an integer id"))
                    })?;
                    out.insert(id, String::new());
                }
            }
            Some(other) => {
                return Err(self.invalid(field, format!("expected a map of ids, got {other}")));
            }
        }
        Ok(out)
    }

    fn id_list(&self, field: &'static str) -> Result<Vec<EntityId>, ParseError> {
        Ok(self.ref_map(field)?.into_keys().collect())
    }

    fn attacker_ref(
        &self,
        attacker_names: &IndexMap<String, EntityId>,
    ) -> Result<Option<EntityId>, ParseError> {
        let map = match self.fields.get(ATTACKER) {
            None | Some(Value::Null) => return Ok(None),
            Some(Value::Object(map)) => map,
            Some(scalar) => {
                if let Some(id) = parse_id(scalar) {
                    return Ok(Some(id));
                }
                let name = scalar.as_str().map(str::trim).unwrap_or_default();
                let by_name = attacker_names.get(name).copied();
                if by_name.is_none() {
                    tracing::warn!(
                        abuse_case = %self.label,
                        attacker = %scalar,
                        "abuse case references an unknown attacker"
                    );
                }
                return Ok(by_name);
            }
        };
        if map.len() > 1 {
            tracing::warn!(
                abuse_case = %self.label,
                entries = map.len(),
                "abuse case lists several attackers; only the first is used"
            );
        }
        let Some((key, value)) = map.iter().next() else {
            return Ok(None);
        };
        if let Ok(id) = key.trim().parse::<EntityId>() {
            return Ok(Some(id));
        }
        let by_name = value
            .as_str()
            .and_then(|name| attacker_names.get(name))
            .or_else(|| attacker_names.get(key.as_str()))
            .copied();
        if by_name.is_none() {
            tracing::warn!(
                abuse_case = %self.label,
                attacker = %key,
                "abuse case references an unknown attacker"
            );
        }
        Ok(by_name)
    }

    fn attributes(&self, structural: &[&str]) -> AttributeBag {
        self.fields
            .iter()
            .filter(|(k, _)| {
                let k = k.as_str();
                k != ID && k != NAME && !structural.contains(&k)
            })
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}
