//! Engine error taxonomy.

use thiserror::Error;

use crate::entities::LocalId;
use crate::gateway::GatewayError;

/// Errors surfaced by engine intent methods.
///
/// Validation failures are resolved locally and never reach the gateway.
/// Gateway failures on a single field group are isolated to that group
/// and never fatal to the entity or its other fields.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("No such task: {0}")]
    UnknownEntity(LocalId),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}
