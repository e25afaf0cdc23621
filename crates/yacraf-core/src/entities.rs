//! Typed records for the six YACRAF entity kinds.
//!
//! Records are created once by the loader and never mutated afterwards. Associations between
//! records live in [`crate::link::Links`], not on the records themselves.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Integer identifier of a record, unique within its collection.
pub type EntityId = i64;

/// Free-form kind-specific attributes, in document order.
pub type AttributeBag = IndexMap<String, Value>;

/// Id references as they appear in the document (`{"12": "name"}`), coerced to integer keys.
pub type RefMap = IndexMap<EntityId, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    AttackEvent,
    Defense,
    Actor,
    LossEvent,
    AbuseCase,
    Attacker,
}

impl EntityKind {
    pub const ALL: [EntityKind; 6] = [
        EntityKind::AttackEvent,
        EntityKind::Defense,
        EntityKind::Actor,
        EntityKind::LossEvent,
        EntityKind::AbuseCase,
        EntityKind::Attacker,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::AttackEvent => "attack_event",
            EntityKind::Defense => "defense",
            EntityKind::Actor => "actor",
            EntityKind::LossEvent => "loss_event",
            EntityKind::AbuseCase => "abuse_case",
            EntityKind::Attacker => "attacker",
        }
    }

    /// Attribute keys the YACRAF metamodel defines for this kind, in display order.
    pub fn known_attributes(self) -> &'static [&'static str] {
        match self {
            EntityKind::AttackEvent => &["local_difficulty"],
            EntityKind::Defense => &["cost", "impact"],
            EntityKind::Actor => &[],
            EntityKind::LossEvent => &["magnitude"],
            EntityKind::AbuseCase => &[
                "accessibility_to_attack_surface",
                "window_of_opportunity",
                "ability_to_repudiate",
                "perceived_deterrence",
                "perceived_ease_of_attack",
                "perceived_benefit_of_success",
                "effort_spent",
            ],
            EntityKind::Attacker => &[
                "personal_risk_tolerance",
                "concern_for_collateral_damage",
                "skill",
                "resources",
                "sponsorship",
            ],
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A kind-qualified identifier. Attack events and defenses share an id space, every other kind
/// has its own, so the kind is needed to name a record unambiguously.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    pub kind: EntityKind,
    pub id: EntityId,
}

impl EntityRef {
    pub fn new(kind: EntityKind, id: EntityId) -> Self {
        Self { kind, id }
    }

    pub fn attack_event(id: EntityId) -> Self {
        Self::new(EntityKind::AttackEvent, id)
    }

    pub fn defense(id: EntityId) -> Self {
        Self::new(EntityKind::Defense, id)
    }

    pub fn actor(id: EntityId) -> Self {
        Self::new(EntityKind::Actor, id)
    }

    pub fn loss_event(id: EntityId) -> Self {
        Self::new(EntityKind::LossEvent, id)
    }

    pub fn abuse_case(id: EntityId) -> Self {
        Self::new(EntityKind::AbuseCase, id)
    }

    pub fn attacker(id: EntityId) -> Self {
        Self::new(EntityKind::Attacker, id)
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

/// Composition of an attack event's children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gate {
    And,
    Or,
}

impl Gate {
    pub fn as_str(self) -> &'static str {
        match self {
            Gate::And => "and",
            Gate::Or => "or",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttackEvent {
    pub id: EntityId,
    pub name: String,
    pub gate: Gate,
    pub children: RefMap,
    pub parents: Vec<EntityId>,
    pub attributes: AttributeBag,
}

impl AttackEvent {
    /// Tree roots are attack events without parents.
    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Defense {
    pub id: EntityId,
    pub name: String,
    /// Attack events this defense mitigates.
    pub children: RefMap,
    pub attributes: AttributeBag,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Actor {
    pub id: EntityId,
    pub name: String,
    pub actor_type: Option<String>,
    pub loss_events: RefMap,
    pub attributes: AttributeBag,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LossEvent {
    pub id: EntityId,
    pub name: String,
    pub loss_type: Option<String>,
    pub abuse_cases: RefMap,
    pub attack_events: RefMap,
    /// Declared actor, if the document names one on the loss event itself.
    pub actor: Option<EntityId>,
    pub attributes: AttributeBag,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AbuseCase {
    pub id: EntityId,
    pub name: String,
    /// Normalized from the single-entry `attacker` map of the document.
    pub attacker: Option<EntityId>,
    pub attack_events: RefMap,
    pub attributes: AttributeBag,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attacker {
    pub id: EntityId,
    pub name: String,
    pub attributes: AttributeBag,
}

/// Uniform read access to the shared base shape of every record.
pub trait Entity {
    const KIND: EntityKind;

    fn id(&self) -> EntityId;
    fn name(&self) -> &str;
    fn attributes(&self) -> &AttributeBag;

    fn entity_ref(&self) -> EntityRef {
        EntityRef::new(Self::KIND, self.id())
    }
}

macro_rules! impl_entity {
    ($ty:ty, $kind:expr) => {
        impl Entity for $ty {
            const KIND: EntityKind = $kind;

            fn id(&self) -> EntityId {
                self.id
            }

            fn name(&self) -> &str {
                &self.name
            }

            fn attributes(&self) -> &AttributeBag {
                &self.attributes
            }
        }
    };
}

impl_entity!(AttackEvent, EntityKind::AttackEvent);
impl_entity!(Defense, EntityKind::Defense);
impl_entity!(Actor, EntityKind::Actor);
impl_entity!(LossEvent, EntityKind::LossEvent);
impl_entity!(AbuseCase, EntityKind::AbuseCase);
impl_entity!(Attacker, EntityKind::Attacker);
