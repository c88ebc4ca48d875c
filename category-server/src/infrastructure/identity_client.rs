use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tonic::transport::{Channel, Endpoint};
use tracing::{debug, warn};

use crate::application::auth_gateway::{AuthGateway, InvalidToken};
use crate::domain::identity::{Identity, Role, UnknownRole};

pub(crate) mod pb {
    tonic::include_proto!("auth");
}

use pb::auth_service_client::AuthServiceClient;
use pb::{ValidateRequest, ValidateResponse};

/// [`AuthGateway`] backed by the identity service's `ValidateToken` RPC.
///
/// The channel is created once and cloned per call. Nothing is cached and nothing
/// is retried: every request costs exactly one RPC.
#[derive(Debug, Clone)]
pub(crate) struct GrpcAuthGateway {
    client: AuthServiceClient<Channel>,
}

impl GrpcAuthGateway {
    /// Builds the channel without dialing, so the service can start while the
    /// identity authority is still down; requests fail closed until it is reachable.
    pub(crate) fn connect_lazy(
        addr: &str,
        connect_timeout: Duration,
        request_timeout: Duration,
    ) -> Result<Self> {
        let endpoint = normalize_endpoint(addr);
        let channel = Endpoint::from_shared(endpoint.clone())
            .with_context(|| format!("invalid identity service endpoint: {endpoint}"))?
            .connect_timeout(connect_timeout)
            .timeout(request_timeout)
            .connect_lazy();

        Ok(Self {
            client: AuthServiceClient::new(channel),
        })
    }
}

#[async_trait]
impl AuthGateway for GrpcAuthGateway {
    async fn validate(&self, token: &str) -> Result<Identity, InvalidToken> {
        let mut client = self.client.clone();
        let request = tonic::Request::new(ValidateRequest {
            token: token.to_string(),
        });

        match client.validate_token(request).await {
            Ok(response) => identity_from_response(response.into_inner()),
            Err(status) => {
                // callers only ever see "invalid token"; the outage is visible here
                warn!(
                    code = ?status.code(),
                    message = status.message(),
                    "identity service unavailable, failing closed"
                );
                Err(InvalidToken)
            }
        }
    }
}

fn identity_from_response(response: ValidateResponse) -> Result<Identity, InvalidToken> {
    if !response.success {
        debug!("identity service rejected token");
        return Err(InvalidToken);
    }

    let role = response
        .role
        .parse::<Role>()
        .map_err(|UnknownRole(role)| {
            warn!(role = %role, "identity service returned unknown role");
            InvalidToken
        })?;

    Ok(Identity {
        subject_id: response.auth_id,
        role,
    })
}

fn normalize_endpoint(addr: &str) -> String {
    if addr.starts_with("http://") || addr.starts_with("https://") {
        addr.to_string()
    } else {
        format!("http://{addr}")
    }
}
