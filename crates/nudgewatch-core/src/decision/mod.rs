//! The decision contract: what the reasoning step receives and returns.

mod context;
mod types;
mod validate;

pub use context::DecisionContext;
pub use types::{
    ActionButton, Decision, DecisionKind, FALLBACK_URGENCY, MAX_URGENCY, MIN_URGENCY,
};
pub use validate::{clamp_urgency, resolve, validate, RawDecision};

use async_trait::async_trait;

use crate::error::DecisionError;

/// The external reasoning service.
///
/// Implementations own prompt construction and their own timeouts. The
/// returned payload is untrusted and always goes through [`validate`].
#[async_trait]
pub trait DecisionClient: Send + Sync {
    async fn decide(&self, context: &DecisionContext) -> Result<RawDecision, DecisionError>;
}
