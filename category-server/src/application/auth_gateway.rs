use async_trait::async_trait;
use thiserror::Error;

use crate::domain::identity::Identity;

/// Any failed verification. Transport faults, timeouts and explicit rejections
/// by the identity authority all collapse into this one value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid token")]
pub(crate) struct InvalidToken;

#[async_trait]
pub(crate) trait AuthGateway: Send + Sync {
    async fn validate(&self, token: &str) -> Result<Identity, InvalidToken>;
}
