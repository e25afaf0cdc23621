//! Per-kind box sizes and the connector anchors of a placed box.
//!
//! Every kind shares one anchor implementation; kinds only differ by their [`Footprint`].

use crate::model::Point;
use serde::{Deserialize, Serialize};
use yacraf_core::{EntityKind, EntityRef, Gate, YacrafModel};

/// Visual block type handed to the render adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    AttackEventAnd,
    AttackEventOr,
    Defense,
    Actor,
    LossEvent,
    AbuseCase,
    Attacker,
}

impl NodeKind {
    pub fn entity_kind(self) -> EntityKind {
        match self {
            NodeKind::AttackEventAnd | NodeKind::AttackEventOr => EntityKind::AttackEvent,
            NodeKind::Defense => EntityKind::Defense,
            NodeKind::Actor => EntityKind::Actor,
            NodeKind::LossEvent => EntityKind::LossEvent,
            NodeKind::AbuseCase => EntityKind::AbuseCase,
            NodeKind::Attacker => EntityKind::Attacker,
        }
    }

    /// `None` when `entity` is not part of `model`.
    pub fn of(model: &YacrafModel, entity: EntityRef) -> Option<Self> {
        let kind = match entity.kind {
            EntityKind::AttackEvent => match model.attack_event(entity.id)?.gate {
                Gate::And => NodeKind::AttackEventAnd,
                Gate::Or => NodeKind::AttackEventOr,
            },
            EntityKind::Defense => {
                model.defense(entity.id)?;
                NodeKind::Defense
            }
            EntityKind::Actor => {
                model.actor(entity.id)?;
                NodeKind::Actor
            }
            EntityKind::LossEvent => {
                model.loss_event(entity.id)?;
                NodeKind::LossEvent
            }
            EntityKind::AbuseCase => {
                model.abuse_case(entity.id)?;
                NodeKind::AbuseCase
            }
            EntityKind::Attacker => {
                model.attacker(entity.id)?;
                NodeKind::Attacker
            }
        };
        Some(kind)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Footprint {
    pub width: f64,
    pub height: f64,
}

impl Footprint {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Width/height per entity kind, in grid units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FootprintTable {
    pub attack_event: Footprint,
    pub defense: Footprint,
    pub actor: Footprint,
    pub loss_event: Footprint,
    pub abuse_case: Footprint,
    pub attacker: Footprint,
}

impl Default for FootprintTable {
    fn default() -> Self {
        Self {
            attack_event: Footprint::new(11.0, 5.0),
            defense: Footprint::new(11.0, 3.0),
            actor: Footprint::new(11.0, 3.0),
            loss_event: Footprint::new(11.0, 5.0),
            abuse_case: Footprint::new(11.0, 11.0),
            attacker: Footprint::new(11.0, 7.0),
        }
    }
}

impl FootprintTable {
    pub fn get(&self, kind: EntityKind) -> Footprint {
        match kind {
            EntityKind::AttackEvent => self.attack_event,
            EntityKind::Defense => self.defense,
            EntityKind::Actor => self.actor,
            EntityKind::LossEvent => self.loss_event,
            EntityKind::AbuseCase => self.abuse_case,
            EntityKind::Attacker => self.attacker,
        }
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (EntityKind, Footprint)> + '_ {
        EntityKind::ALL.into_iter().map(|k| (k, self.get(k)))
    }
}

/// Gaps between boxes and the offsets connectors keep from a box edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Spacing {
    pub padding_x: f64,
    pub padding_y: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl Default for Spacing {
    fn default() -> Self {
        Self {
            padding_x: 2.0,
            padding_y: 4.0,
            offset_x: 1.0,
            offset_y: 0.25,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Anchor {
    TopLeft,
    TopRight,
    TopMiddle,
    BottomMiddle,
}

/// A box at a grid position; `position` is its top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedBox {
    pub position: Point,
    pub footprint: Footprint,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl PlacedBox {
    pub fn new(position: Point, footprint: Footprint, spacing: &Spacing) -> Self {
        Self {
            position,
            footprint,
            offset_x: spacing.offset_x,
            offset_y: spacing.offset_y,
        }
    }

    pub fn anchor(&self, anchor: Anchor) -> Point {
        let Point { x, y } = self.position;
        let Footprint { width, height } = self.footprint;
        match anchor {
            Anchor::TopLeft => Point::new(x - self.offset_x, y + self.offset_y),
            Anchor::TopRight => Point::new(x + width, y + self.offset_y),
            Anchor::TopMiddle => Point::new(x + width / 2.0, y + self.offset_y),
            Anchor::BottomMiddle => Point::new(x + width / 2.0, y + height + self.offset_y),
        }
    }

    pub fn top_left(&self) -> Point {
        self.anchor(Anchor::TopLeft)
    }

    pub fn top_right(&self) -> Point {
        self.anchor(Anchor::TopRight)
    }

    pub fn top_middle(&self) -> Point {
        self.anchor(Anchor::TopMiddle)
    }

    pub fn bottom_middle(&self) -> Point {
        self.anchor(Anchor::BottomMiddle)
    }

    /// Horizontal extent `[left, right)`.
    pub fn columns(&self) -> (f64, f64) {
        (self.position.x, self.position.x + self.footprint.width)
    }
}
