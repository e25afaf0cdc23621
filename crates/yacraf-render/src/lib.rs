#![forbid(unsafe_code)]

//! Deterministic grid layout for YACRAF models (headless).
//!
//! [`layout_model`] produces a [`ModelLayout`]: named views holding positioned nodes and the
//! connectors between them. [`adapter::plot`] replays a layout against any [`RenderAdapter`].
//!
//! View order is fixed: attack trees, defense mechanisms, risk trees, then one root context
//! view per attack tree root.

pub mod adapter;
mod attack_tree;
mod defense;
pub mod error;
pub mod footprint;
pub mod model;
mod place;
mod risk;
mod root_context;
pub mod scene;

pub use adapter::{NodeAttributes, PlotSummary, RenderAdapter, plot};
pub use error::{Error, Result};
pub use footprint::{Anchor, Footprint, FootprintTable, NodeKind, PlacedBox, Spacing};
pub use model::{
    Bounds, Connector, Instance, LayoutNode, ModelLayout, Point, PositionMap, ViewId, ViewKind,
    ViewLayout,
};
pub use scene::{Scene, SceneRecorder};

use serde::{Deserialize, Serialize};
use yacraf_core::YacrafModel;

/// How attack trees (or risk trees) are split into views.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    /// One view per tree.
    #[default]
    PerTree,
    /// All trees side by side in one view.
    Combined,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutOptions {
    pub footprints: FootprintTable,
    pub spacing: Spacing,
    pub attack_tree_views: ViewMode,
    pub risk_views: ViewMode,
}

impl LayoutOptions {
    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        let options: Self = serde_json::from_value(value.clone())?;
        options.check()?;
        Ok(options)
    }

    /// Rejects sizes that would make placement non-deterministic or overlapping.
    pub fn check(&self) -> Result<()> {
        for (kind, fp) in self.footprints.iter() {
            if !(fp.width.is_finite() && fp.width > 0.0 && fp.height.is_finite() && fp.height > 0.0)
            {
                return Err(Error::InvalidOptions {
                    message: format!(
                        "footprint of {kind} must be positive and finite, got {}x{}",
                        fp.width, fp.height
                    ),
                });
            }
        }
        let s = &self.spacing;
        let gaps = [
            ("padding_x", s.padding_x),
            ("padding_y", s.padding_y),
            ("offset_x", s.offset_x),
            ("offset_y", s.offset_y),
        ];
        for (name, value) in gaps {
            if !(value.is_finite() && value >= 0.0) {
                return Err(Error::InvalidOptions {
                    message: format!("spacing.{name} must be non-negative and finite, got {value}"),
                });
            }
        }
        Ok(())
    }
}

/// Lays out every view of `model`.
///
/// Pure: the same model and options always yield the same layout.
pub fn layout_model(model: &YacrafModel, options: &LayoutOptions) -> Result<ModelLayout> {
    options.check()?;
    let mut engine = place::LayoutEngine::new(model, options);
    attack_tree::layout_attack_trees(&mut engine);
    defense::layout_defenses(&mut engine);
    risk::layout_risk_trees(&mut engine);
    root_context::layout_root_contexts(&mut engine);
    let layout = engine.finish();
    tracing::info!(views = layout.views.len(), "layout complete");
    Ok(layout)
}
