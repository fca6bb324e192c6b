//! Error taxonomy shared across the editor and the player

use thiserror::Error;

use crate::model::ProductId;

/// Input problems that block the triggering action; the user can correct and retry
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please enter a display name for the component")]
    EmptyName,
    #[error("Please select a mesh from the 3D model first")]
    NoSelection,
    #[error("Mesh '{0}' has already been added as a component")]
    DuplicateMesh(String),
    #[error("Please add at least one component to the list before saving")]
    EmptyPlan,
}

/// Failures reported by a data-service adapter
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },
    #[error("{}", .0.join("\n"))]
    Graphql(Vec<String>),
    #[error("Unexpected response: {0}")]
    Decode(String),
}

impl From<serde_json::Error> for ServiceError {
    fn from(e: serde_json::Error) -> Self {
        ServiceError::Decode(e.to_string())
    }
}

/// Session checks that deny access to protected data
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Not signed in")]
    NoSession,
    #[error("Admin privilege required (signed in as '{0}')")]
    NotAdmin(String),
    #[error("Session check failed: {0}")]
    Check(#[from] ServiceError),
}

/// Failures while preparing the editor or the player
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error("Product with ID {0} not found")]
    ProductNotFound(ProductId),
    #[error("No assembly plan found for workstation '{0}'")]
    PlanNotFound(String),
    #[error("Plan or model path not found for this station")]
    MissingModelPath,
    #[error("Workstation name not provided")]
    MissingStation,
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Service(#[from] ServiceError),
}
