use crate::footprint::{NodeKind, PlacedBox};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use yacraf_core::{EntityId, EntityRef};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    pub fn from_points(points: impl IntoIterator<Item = Point>) -> Option<Self> {
        let mut it = points.into_iter();
        let p0 = it.next()?;
        let mut b = Self {
            min_x: p0.x,
            min_y: p0.y,
            max_x: p0.x,
            max_y: p0.y,
        };
        for p in it {
            b.min_x = b.min_x.min(p.x);
            b.min_y = b.min_y.min(p.y);
            b.max_x = b.max_x.max(p.x);
            b.max_y = b.max_y.max(p.y);
        }
        Some(b)
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}

/// Positions of every entity shown in one view.
pub type PositionMap = FxHashMap<EntityRef, Point>;

/// Index of a view inside a [`ModelLayout`], in creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ViewId(pub usize);

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "view#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ViewKind {
    /// One attack tree.
    AttackTree { root: EntityId },
    /// Every attack tree side by side.
    AttackForest,
    Defenses,
    /// Actor -> loss events -> abuse cases -> attacker.
    Risk { actor: EntityId },
    RiskForest,
    /// Abuse cases and loss events around a single attack tree root.
    RootContext { root: EntityId },
}

/// Whether a node is the first drawing of its entity or a reference to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "instance", rename_all = "snake_case")]
pub enum Instance {
    Primary,
    /// Drawn again in another view; `home` holds the primary instance.
    Linked { home: ViewId },
}

impl Instance {
    pub fn is_linked(&self) -> bool {
        matches!(self, Instance::Linked { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutNode {
    pub entity: EntityRef,
    pub kind: NodeKind,
    pub position: Point,
    pub width: f64,
    pub height: f64,
    #[serde(flatten)]
    pub instance: Instance,
    /// Connector offsets, copied from the spacing the node was placed with.
    pub offset_x: f64,
    pub offset_y: f64,
}

impl LayoutNode {
    pub fn placed_box(&self) -> PlacedBox {
        PlacedBox {
            position: self.position,
            footprint: crate::footprint::Footprint::new(self.width, self.height),
            offset_x: self.offset_x,
            offset_y: self.offset_y,
        }
    }
}

/// A line from `from`'s top-right anchor to `to`'s top-left anchor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connector {
    pub from: EntityRef,
    pub to: EntityRef,
    pub start: Point,
    pub end: Point,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewLayout {
    pub id: ViewId,
    pub name: String,
    #[serde(flatten)]
    pub kind: ViewKind,
    /// In placement order: every child precedes its parent.
    pub nodes: Vec<LayoutNode>,
    pub connectors: Vec<Connector>,
    pub bounds: Option<Bounds>,
}

impl ViewLayout {
    pub fn node(&self, entity: EntityRef) -> Option<&LayoutNode> {
        self.nodes.iter().find(|n| n.entity == entity)
    }

    pub fn position_of(&self, entity: EntityRef) -> Option<Point> {
        self.node(entity).map(|n| n.position)
    }

    pub fn positions(&self) -> PositionMap {
        self.nodes.iter().map(|n| (n.entity, n.position)).collect()
    }

    pub fn contains(&self, entity: EntityRef) -> bool {
        self.node(entity).is_some()
    }

    pub fn linked_nodes(&self) -> impl Iterator<Item = &LayoutNode> + '_ {
        self.nodes.iter().filter(|n| n.instance.is_linked())
    }
}

/// Every view of a model, in creation order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelLayout {
    pub views: Vec<ViewLayout>,
}

impl ModelLayout {
    pub fn view(&self, id: ViewId) -> Option<&ViewLayout> {
        self.views.get(id.0)
    }

    pub fn view_named(&self, name: &str) -> Option<&ViewLayout> {
        self.views.iter().find(|v| v.name == name)
    }

    /// Position of `entity` in `view`; `None` when the view does not show it.
    pub fn position(&self, entity: EntityRef, view: ViewId) -> Option<Point> {
        self.view(view)?.position_of(entity)
    }

    /// View holding the primary instance of `entity`.
    pub fn home_of(&self, entity: EntityRef) -> Option<ViewId> {
        self.views.iter().find_map(|v| {
            v.nodes
                .iter()
                .any(|n| n.entity == entity && n.instance == Instance::Primary)
                .then_some(v.id)
        })
    }
}
