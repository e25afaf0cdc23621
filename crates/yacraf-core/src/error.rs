use crate::link::{BuildStage, BuildStep};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    BuildOrder(#[from] BuildOrderError),
}

/// The input document is not well-formed or lacks a required field.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("attack graph JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("attack graph document must be a JSON object")]
    NotAnObject,

    #[error("missing top-level collection `{collection}`")]
    MissingCollection { collection: &'static str },

    #[error("collection `{collection}` must be a JSON object or array")]
    InvalidCollection { collection: &'static str },

    #[error("record `{record}` in `{collection}` is missing required field `{field}`")]
    MissingField {
        collection: &'static str,
        record: String,
        field: &'static str,
    },

    #[error("record `{record}` in `{collection}` has an invalid `{field}`: {message}")]
    InvalidField {
        collection: &'static str,
        record: String,
        field: &'static str,
        message: String,
    },

    #[error("duplicate id {id} in `{collection}`")]
    DuplicateId { collection: &'static str, id: i64 },
}

/// A build step was requested at a point of the build sequence where it is not allowed.
///
/// This is an API misuse, not a data problem: linking must run defenses, actors, loss events,
/// abuse cases in that order, and nothing may be linked once the attack trees are finalized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("build order violation: cannot {step} when the model is {stage}")]
pub struct BuildOrderError {
    pub step: BuildStep,
    pub stage: BuildStage,
}
