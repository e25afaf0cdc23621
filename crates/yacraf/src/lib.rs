#![forbid(unsafe_code)]

//! `yacraf` is a headless implementation of YACRAF threat-model attack graphs.
//!
//! The model side (loading, linking, attack trees, validation) is always available; layout and
//! the render adapter contract sit behind the `render` feature.
//!
//! # Features
//!
//! - `render`: enable grid layout and adapter-driven plotting (`yacraf::render`)

pub use yacraf_core::*;

#[cfg(feature = "render")]
pub mod render {
    pub use yacraf_render::{
        Anchor, Bounds, Connector, Footprint, FootprintTable, Instance, LayoutNode, LayoutOptions,
        ModelLayout, NodeAttributes, NodeKind, PlacedBox, PlotSummary, Point, RenderAdapter,
        Scene, SceneRecorder, Spacing, ViewId, ViewKind, ViewLayout, ViewMode, layout_model, plot,
    };

    use serde::{Deserialize, Serialize};
    use yacraf_core::{
        BuildOptions, ValidationOptions, ValidationReport, YacrafModel, build_model, validate,
    };

    #[derive(Debug, thiserror::Error)]
    pub enum HeadlessError {
        #[error(transparent)]
        Build(#[from] yacraf_core::Error),
        #[error(transparent)]
        Layout(#[from] yacraf_render::Error),
        #[error("refusing to render an invalid model: {0}")]
        InvalidModel(ValidationReport),
    }

    pub type Result<T> = std::result::Result<T, HeadlessError>;

    /// Every knob of the load -> validate -> layout -> plot pipeline.
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct PipelineOptions {
        pub build: BuildOptions,
        pub validation: ValidationOptions,
        pub layout: LayoutOptions,
        /// Stop before layout when validation reports any issue.
        pub abort_on_invalid: bool,
    }

    impl Default for PipelineOptions {
        fn default() -> Self {
            Self {
                build: BuildOptions::default(),
                validation: ValidationOptions::default(),
                layout: LayoutOptions::default(),
                abort_on_invalid: true,
            }
        }
    }

    /// Model, validation outcome and layout of one document.
    #[derive(Debug, Clone)]
    pub struct Pipeline {
        pub model: YacrafModel,
        pub report: ValidationReport,
        pub layout: ModelLayout,
    }

    /// Builds, validates and lays out `text` without touching any backend.
    pub fn layout_document(text: &str, options: &PipelineOptions) -> Result<Pipeline> {
        let model = build_model(text, &options.build)?;
        let report = validate(&model, &options.validation);
        if !report.is_valid() {
            if options.abort_on_invalid {
                return Err(HeadlessError::InvalidModel(report));
            }
            tracing::warn!(
                issues = report.diagnostics.len(),
                "rendering an invalid model"
            );
        }
        let layout = layout_model(&model, &options.layout)?;
        Ok(Pipeline {
            model,
            report,
            layout,
        })
    }

    #[derive(Debug, Clone)]
    pub struct PlotOutcome {
        pub pipeline: Pipeline,
        pub summary: PlotSummary,
    }

    /// Full pipeline: [`layout_document`] then [`plot`] against `adapter`.
    pub fn plot_document<A: RenderAdapter>(
        text: &str,
        options: &PipelineOptions,
        adapter: &mut A,
    ) -> Result<PlotOutcome> {
        let pipeline = layout_document(text, options)?;
        let summary = plot(&pipeline.model, &pipeline.layout, adapter)?;
        Ok(PlotOutcome { pipeline, summary })
    }
}
