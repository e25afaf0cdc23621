#![forbid(unsafe_code)]

//! YACRAF attack-graph model (headless).
//!
//! Pipeline, leaf first:
//! - [`load`]: JSON document -> typed records keyed by id
//! - [`ModelBuilder`]: resolves id references into bidirectional associations, then builds one
//!   attack tree per root
//! - [`validate()`]: multiplicity rules of the YACRAF metamodel
//!
//! Layout and rendering live in `yacraf-render`.

pub mod entities;
pub mod error;
pub mod link;
pub mod load;
pub mod model;
pub mod tree;
pub mod validate;

pub use entities::{
    AbuseCase, Actor, AttackEvent, Attacker, AttributeBag, Defense, Entity, EntityId, EntityKind,
    EntityRef, Gate, LossEvent, RefMap,
};
pub use error::{BuildOrderError, Error, ParseError, Result};
pub use link::{BuildStage, BuildStep, Links, ModelBuilder, link};
pub use load::{Document, load, load_value};
pub use model::YacrafModel;
pub use tree::{
    AttackTree, CyclePolicy, NodeIndex, SkippedEdge, TreeNode, TreeOptions, build_forest,
    build_tree,
};
pub use validate::{Diagnostic, Issue, ValidationOptions, ValidationReport, validate};

use serde::{Deserialize, Serialize};

/// Options for turning a document into a [`YacrafModel`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildOptions {
    pub tree: TreeOptions,
}

/// Loads, links and builds the attack trees of a JSON attack graph document.
pub fn build_model(text: &str, options: &BuildOptions) -> Result<YacrafModel> {
    let document = load(text)?;
    build_model_from_document(document, options)
}

pub fn build_model_from_document(
    document: Document,
    options: &BuildOptions,
) -> Result<YacrafModel> {
    let mut builder = link(document)?;
    builder.build_trees(&options.tree)?;
    builder.finish()
}

#[cfg(test)]
mod tests;
