mod order;
mod policy;
mod product;
mod return_request;
mod transaction;

pub use order::*;
pub use policy::*;
pub use product::*;
pub use return_request::*;
pub use transaction::*;

use thiserror::Error;

/// Raised when a stored or submitted status string names no known variant.
#[derive(Debug, Clone, Error)]
#[error("unknown {kind} '{value}'")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseEnumError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}
