//! Shared placement machinery: per-view bookkeeping and post-order subtree placement.

use crate::LayoutOptions;
use crate::footprint::{Footprint, NodeKind, PlacedBox};
use crate::model::{
    Bounds, Connector, Instance, LayoutNode, ModelLayout, Point, ViewId, ViewKind, ViewLayout,
};
use rustc_hash::FxHashMap;
use yacraf_core::{EntityRef, YacrafModel};

/// One box of a [`Plan`] and the indices of the boxes drawn to its lower right.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PlanEntry {
    pub entity: EntityRef,
    pub children: Vec<usize>,
}

/// Arena of entities to place as one subtree, children connected back to their parent.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Plan {
    root: usize,
    nodes: Vec<PlanEntry>,
}

impl Plan {
    pub fn new(root: EntityRef) -> Self {
        Self {
            root: 0,
            nodes: vec![PlanEntry {
                entity: root,
                children: Vec::new(),
            }],
        }
    }

    /// Wraps an existing arena; `root` must index into `nodes`.
    pub fn from_entries(root: usize, nodes: Vec<PlanEntry>) -> Self {
        Self { root, nodes }
    }

    pub fn root(&self) -> usize {
        self.root
    }

    pub fn push_child(&mut self, parent: usize, entity: EntityRef) -> usize {
        let index = self.nodes.len();
        self.nodes.push(PlanEntry {
            entity,
            children: Vec::new(),
        });
        if let Some(p) = self.nodes.get_mut(parent) {
            p.children.push(index);
        }
        index
    }

    fn entry(&self, index: usize) -> Option<&PlanEntry> {
        self.nodes.get(index)
    }
}

/// A subtree whose root is placed and whose children are still being laid out.
#[derive(Debug, Clone, Copy)]
struct OpenFrame {
    node: usize,
    entity: EntityRef,
    origin: Point,
    cursor: Point,
    next_child: usize,
    own_next_x: f64,
}

enum Entered {
    /// Nothing left to lay out below; carries the next sibling slot.
    Done(Point),
    Open(OpenFrame),
}

/// Owns the views built so far and the model-wide home of every entity.
pub(crate) struct LayoutEngine<'a> {
    model: &'a YacrafModel,
    options: &'a LayoutOptions,
    homes: FxHashMap<EntityRef, ViewId>,
    views: Vec<ViewLayout>,
}

impl<'a> LayoutEngine<'a> {
    pub fn new(model: &'a YacrafModel, options: &'a LayoutOptions) -> Self {
        Self {
            model,
            options,
            homes: FxHashMap::default(),
            views: Vec::new(),
        }
    }

    pub fn model(&self) -> &'a YacrafModel {
        self.model
    }

    pub fn options(&self) -> &'a LayoutOptions {
        self.options
    }

    pub fn add_view(
        &mut self,
        name: String,
        kind: ViewKind,
        fill: impl FnOnce(&mut ViewBuilder<'_>),
    ) -> ViewId {
        let id = ViewId(self.views.len());
        let mut builder = ViewBuilder::new(id, self.model, self.options, &mut self.homes);
        fill(&mut builder);
        let view = builder.finish(name, kind);
        tracing::debug!(
            view = %view.name,
            nodes = view.nodes.len(),
            connectors = view.connectors.len(),
            "layout view"
        );
        self.views.push(view);
        id
    }

    pub fn finish(self) -> ModelLayout {
        ModelLayout { views: self.views }
    }
}

pub(crate) struct ViewBuilder<'a> {
    id: ViewId,
    model: &'a YacrafModel,
    options: &'a LayoutOptions,
    homes: &'a mut FxHashMap<EntityRef, ViewId>,
    placed: FxHashMap<EntityRef, Point>,
    nodes: Vec<LayoutNode>,
    connectors: Vec<Connector>,
}

impl<'a> ViewBuilder<'a> {
    fn new(
        id: ViewId,
        model: &'a YacrafModel,
        options: &'a LayoutOptions,
        homes: &'a mut FxHashMap<EntityRef, ViewId>,
    ) -> Self {
        Self {
            id,
            model,
            options,
            homes,
            placed: FxHashMap::default(),
            nodes: Vec::new(),
            connectors: Vec::new(),
        }
    }

    pub fn footprint(&self, entity: EntityRef) -> Footprint {
        self.options.footprints.get(entity.kind)
    }

    pub fn padding(&self) -> (f64, f64) {
        (self.options.spacing.padding_x, self.options.spacing.padding_y)
    }

    pub fn position_of(&self, entity: EntityRef) -> Option<Point> {
        self.placed.get(&entity).copied()
    }

    fn placed_box(&self, entity: EntityRef) -> Option<PlacedBox> {
        let position = self.position_of(entity)?;
        Some(PlacedBox::new(
            position,
            self.footprint(entity),
            &self.options.spacing,
        ))
    }

    /// Claims `position` for `entity` without emitting its node yet.
    ///
    /// Returns the already assigned position when the entity is placed in this view.
    fn reserve(&mut self, entity: EntityRef, position: Point) -> Result<(), Point> {
        match self.placed.get(&entity) {
            Some(&existing) => Err(existing),
            None => {
                self.placed.insert(entity, position);
                Ok(())
            }
        }
    }

    fn emit(&mut self, entity: EntityRef) {
        let Some(position) = self.position_of(entity) else {
            return;
        };
        let Some(kind) = NodeKind::of(self.model, entity) else {
            tracing::warn!(%entity, "layout: entity is not part of the model; skipping node");
            return;
        };
        let instance = match self.homes.get(&entity) {
            Some(&home) if home != self.id => Instance::Linked { home },
            _ => {
                self.homes.insert(entity, self.id);
                Instance::Primary
            }
        };
        let footprint = self.footprint(entity);
        self.nodes.push(LayoutNode {
            entity,
            kind,
            position,
            width: footprint.width,
            height: footprint.height,
            instance,
            offset_x: self.options.spacing.offset_x,
            offset_y: self.options.spacing.offset_y,
        });
    }

    /// Places a single box; a no-op returning the existing position when already placed.
    pub fn place(&mut self, entity: EntityRef, position: Point) -> Point {
        match self.reserve(entity, position) {
            Ok(()) => {
                self.emit(entity);
                position
            }
            Err(existing) => existing,
        }
    }

    /// Draws a connector from `from`'s top-right anchor to `to`'s top-left anchor.
    pub fn connect(&mut self, from: EntityRef, to: EntityRef) {
        let (Some(a), Some(b)) = (self.placed_box(from), self.placed_box(to)) else {
            return;
        };
        self.connectors.push(Connector {
            from,
            to,
            start: a.top_right(),
            end: b.top_left(),
        });
    }

    /// Post-order placement of `plan` with its top-left corner at `origin`.
    ///
    /// Children are laid out left to right one row band below the parent and connected back to
    /// it. Returns the slot where the next sibling of `plan` starts. When the root already sits
    /// in this view, only the connector to it is left to the caller. Walks an explicit stack, so
    /// depth is bounded by memory only.
    pub fn place_subtree(&mut self, plan: &Plan, origin: Point) -> Point {
        let mut stack = match self.enter(plan, plan.root(), origin) {
            Entered::Done(next) => return next,
            Entered::Open(frame) => vec![frame],
        };
        let (px, _) = self.padding();

        while let Some(frame) = stack.last_mut() {
            let child = plan
                .entry(frame.node)
                .and_then(|e| e.children.get(frame.next_child).copied());
            if let Some(child) = child {
                frame.next_child += 1;
                let parent = frame.entity;
                match self.enter(plan, child, frame.cursor) {
                    Entered::Done(next) => {
                        frame.cursor = next;
                        if let Some(entry) = plan.entry(child) {
                            self.connect(entry.entity, parent);
                        }
                    }
                    Entered::Open(open) => stack.push(open),
                }
                continue;
            }

            let done = *frame;
            stack.pop();
            self.emit(done.entity);
            let next = Point::new((done.cursor.x + px).max(done.own_next_x), done.origin.y);
            match stack.last_mut() {
                Some(parent) => {
                    parent.cursor = next;
                    let parent = parent.entity;
                    self.connect(done.entity, parent);
                }
                None => return next,
            }
        }
        origin
    }

    /// Reserves `node` at `origin`; leaves and already placed entities are finished at once.
    fn enter(&mut self, plan: &Plan, node: usize, origin: Point) -> Entered {
        let Some(entry) = plan.entry(node) else {
            return Entered::Done(origin);
        };
        if self.reserve(entry.entity, origin).is_err() {
            return Entered::Done(origin);
        }
        let (px, py) = self.padding();
        let size = self.footprint(entry.entity);
        let own_next_x = origin.x + size.width + px;
        if entry.children.is_empty() {
            self.emit(entry.entity);
            return Entered::Done(Point::new(own_next_x, origin.y));
        }
        Entered::Open(OpenFrame {
            node,
            entity: entry.entity,
            origin,
            cursor: Point::new(origin.x, origin.y + size.height + py),
            next_child: 0,
            own_next_x,
        })
    }

    /// Places several subtrees left to right on one row, starting at `start`.
    pub fn place_sequence<'p>(
        &mut self,
        plans: impl IntoIterator<Item = &'p Plan>,
        start: Point,
    ) -> Point {
        let mut cursor = start;
        for plan in plans {
            cursor = self.place_subtree(plan, cursor);
        }
        cursor
    }

    fn finish(self, name: String, kind: ViewKind) -> ViewLayout {
        let corners = self.nodes.iter().flat_map(|n| {
            let b = n.placed_box();
            let Point { x, y } = b.position;
            [
                Point::new(x, y),
                Point::new(x + b.footprint.width, y + b.footprint.height),
            ]
        });
        let ends = self.connectors.iter().flat_map(|c| [c.start, c.end]);
        let bounds = Bounds::from_points(corners.chain(ends));
        ViewLayout {
            id: self.id,
            name,
            kind,
            nodes: self.nodes,
            connectors: self.connectors,
            bounds,
        }
    }
}
