//! In-memory [`RenderAdapter`] that records every call as serializable data.

use crate::adapter::{NodeAttributes, RenderAdapter};
use crate::footprint::NodeKind;
use crate::model::Point;
use serde::Serialize;
use yacraf_core::{AttributeBag, EntityRef};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneNode {
    /// Global handle, unique across views.
    pub handle: usize,
    pub entity: EntityRef,
    pub kind: NodeKind,
    pub position: Point,
    pub name: String,
    pub attributes: AttributeBag,
    /// Handle of the primary node when this one is a linked instance.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linked_to: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneConnector {
    pub start: Point,
    pub end: Point,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneView {
    pub name: String,
    pub nodes: Vec<SceneNode>,
    pub connectors: Vec<SceneConnector>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Scene {
    pub views: Vec<SceneView>,
}

#[derive(Debug, Default)]
pub struct SceneRecorder {
    scene: Scene,
    /// handle -> (view index, node index)
    handles: Vec<(usize, usize)>,
}

impl SceneRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn into_scene(self) -> Scene {
        self.scene
    }

    fn push_node(&mut self, view: usize, mut node: SceneNode) -> usize {
        let handle = self.handles.len();
        node.handle = handle;
        let nodes = &mut self.scene.views[view].nodes;
        self.handles.push((view, nodes.len()));
        nodes.push(node);
        handle
    }
}

impl RenderAdapter for SceneRecorder {
    type View = usize;
    type Node = usize;

    fn create_view(&mut self, name: &str) -> usize {
        self.scene.views.push(SceneView {
            name: name.to_string(),
            nodes: Vec::new(),
            connectors: Vec::new(),
        });
        self.scene.views.len() - 1
    }

    fn place_node(
        &mut self,
        view: &usize,
        kind: NodeKind,
        position: Point,
        attributes: &NodeAttributes<'_>,
    ) -> usize {
        self.push_node(
            *view,
            SceneNode {
                handle: 0,
                entity: attributes.entity,
                kind,
                position,
                name: attributes.name.to_string(),
                attributes: attributes.attributes.clone(),
                linked_to: None,
            },
        )
    }

    fn place_linked_node(&mut self, existing: &usize, view: &usize, position: Point) -> usize {
        let (v, n) = self.handles[*existing];
        let source = &self.scene.views[v].nodes[n];
        let node = SceneNode {
            handle: 0,
            entity: source.entity,
            kind: source.kind,
            position,
            name: source.name.clone(),
            attributes: source.attributes.clone(),
            linked_to: Some(*existing),
        };
        self.push_node(*view, node)
    }

    fn connect(&mut self, view: &usize, start: Point, end: Point) {
        self.scene.views[*view]
            .connectors
            .push(SceneConnector { start, end });
    }
}
