use yacraf_core::EntityRef;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid layout options: {message}")]
    InvalidOptions { message: String },
    #[error("layout references {entity}, which is not part of the model")]
    MissingEntity { entity: EntityRef },
    #[error("layout options JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
