use std::path::PathBuf;
use yacraf::render::{
    HeadlessError, PipelineOptions, SceneRecorder, ViewMode, layout_document, plot_document,
};

fn fixture(name: &str) -> String {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("fixtures")
        .join("attack_graph")
        .join(name);
    std::fs::read_to_string(&path).expect("fixture")
}

#[test]
fn plot_document_drives_the_adapter() {
    let mut recorder = SceneRecorder::new();
    let outcome = plot_document(&fixture("mini.json"), &PipelineOptions::default(), &mut recorder)
        .expect("pipeline ok");
    let (pipeline, summary) = (&outcome.pipeline, outcome.summary);

    assert!(pipeline.report.is_valid());
    assert_eq!(summary.views, pipeline.layout.views.len());
    assert_eq!(recorder.scene().views.len(), summary.views);
}

#[test]
fn invalid_model_aborts_by_default() {
    let mut recorder = SceneRecorder::new();
    let err = plot_document(&fixture("invalid.json"), &PipelineOptions::default(), &mut recorder)
        .unwrap_err();
    match err {
        HeadlessError::InvalidModel(report) => assert_eq!(report.diagnostics.len(), 5),
        other => panic!("unexpected error: {other}"),
    }
    assert!(recorder.scene().views.is_empty());
}

#[test]
fn invalid_model_renders_when_allowed() {
    let options = PipelineOptions {
        abort_on_invalid: false,
        ..PipelineOptions::default()
    };
    let pipeline = layout_document(&fixture("invalid.json"), &options).expect("pipeline ok");
    assert!(!pipeline.report.is_valid());
    assert!(!pipeline.layout.views.is_empty());
}

#[test]
fn parse_errors_surface_as_build_errors() {
    let err = layout_document("{", &PipelineOptions::default()).unwrap_err();
    assert!(matches!(err, HeadlessError::Build(_)), "{err}");
}

#[test]
fn options_deserialize_with_defaults() {
    let options: PipelineOptions = serde_json::from_value(serde_json::json!({
        "layout": {"attack_tree_views": "combined"},
        "validation": {"single_attacker": true}
    }))
    .expect("options");
    assert!(options.abort_on_invalid);
    assert!(options.validation.single_attacker);
    assert_eq!(options.layout.attack_tree_views, ViewMode::Combined);
}
