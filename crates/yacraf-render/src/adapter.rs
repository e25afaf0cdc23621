//! The contract between a [`ModelLayout`] and a concrete drawing backend.

use crate::footprint::NodeKind;
use crate::model::{Instance, ModelLayout, Point};
use crate::{Error, Result};
use rustc_hash::FxHashMap;
use serde::Serialize;
use yacraf_core::{AttributeBag, EntityRef, YacrafModel};

/// What a backend needs to label a primary node.
#[derive(Debug, Clone, Copy)]
pub struct NodeAttributes<'a> {
    pub entity: EntityRef,
    pub name: &'a str,
    pub attributes: &'a AttributeBag,
}

/// A drawing backend. Handles are opaque to [`plot`].
pub trait RenderAdapter {
    type View;
    type Node: Clone;

    fn create_view(&mut self, name: &str) -> Self::View;

    fn place_node(
        &mut self,
        view: &Self::View,
        kind: NodeKind,
        position: Point,
        attributes: &NodeAttributes<'_>,
    ) -> Self::Node;

    /// Draws a reference to `existing`, which was placed in another view.
    fn place_linked_node(
        &mut self,
        existing: &Self::Node,
        view: &Self::View,
        position: Point,
    ) -> Self::Node;

    fn connect(&mut self, view: &Self::View, start: Point, end: Point);
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PlotSummary {
    pub views: usize,
    pub nodes: usize,
    pub linked_nodes: usize,
    pub connectors: usize,
}

/// Replays `layout` against `adapter`, view by view, nodes before connectors.
pub fn plot<A: RenderAdapter>(
    model: &YacrafModel,
    layout: &ModelLayout,
    adapter: &mut A,
) -> Result<PlotSummary> {
    let mut summary = PlotSummary::default();
    let mut homes: FxHashMap<EntityRef, A::Node> = FxHashMap::default();

    for view in &layout.views {
        let handle = adapter.create_view(&view.name);
        summary.views += 1;

        for node in &view.nodes {
            let home = match node.instance {
                Instance::Linked { .. } => homes.get(&node.entity).cloned(),
                Instance::Primary => None,
            };
            match home {
                Some(existing) => {
                    adapter.place_linked_node(&existing, &handle, node.position);
                    summary.linked_nodes += 1;
                }
                None => {
                    let missing = || Error::MissingEntity {
                        entity: node.entity,
                    };
                    let attributes = NodeAttributes {
                        entity: node.entity,
                        name: model.name_of(node.entity).ok_or_else(missing)?,
                        attributes: model.attributes_of(node.entity).ok_or_else(missing)?,
                    };
                    let placed = adapter.place_node(&handle, node.kind, node.position, &attributes);
                    homes.entry(node.entity).or_insert(placed);
                }
            }
            summary.nodes += 1;
        }

        for connector in &view.connectors {
            adapter.connect(&handle, connector.start, connector.end);
            summary.connectors += 1;
        }
    }

    tracing::debug!(?summary, "plot complete");
    Ok(summary)
}
