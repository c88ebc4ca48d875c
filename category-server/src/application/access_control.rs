use tracing::debug;

use crate::application::auth_gateway::AuthGateway;
use crate::domain::error::DomainError;
use crate::domain::identity::{Identity, Role};

const BEARER_PREFIX: &str = "Bearer ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AccessPolicy {
    /// Any verified identity.
    Authenticated,
    /// Admins only. Resolved by the gate, but no route is mounted behind it yet.
    #[cfg_attr(not(test), allow(dead_code))]
    AdminOnly,
    /// Everyone except plain `user`s.
    AdminOrAuthor,
}

impl AccessPolicy {
    pub(crate) fn permits(self, role: Role) -> bool {
        match self {
            AccessPolicy::Authenticated => true,
            AccessPolicy::AdminOnly => role == Role::Admin,
            AccessPolicy::AdminOrAuthor => role != Role::User,
        }
    }
}

/// Resolves the `Authorization` header into an [`Identity`] allowed by `policy`.
///
/// Header shape is checked before the gateway is called, so malformed input never
/// costs a round trip to the identity authority.
pub(crate) async fn authorize<G>(
    gateway: &G,
    authorization: Option<&str>,
    policy: AccessPolicy,
) -> Result<Identity, DomainError>
where
    G: AuthGateway + ?Sized,
{
    let token = parse_bearer_token(authorization)?;

    let identity = gateway
        .validate(token)
        .await
        .map_err(|_| DomainError::Unauthenticated("invalid token"))?;

    if !policy.permits(identity.role) {
        debug!(
            subject_id = identity.subject_id,
            role = %identity.role,
            ?policy,
            "access denied"
        );
        return Err(DomainError::Forbidden(
            "user doesn't have permission to access",
        ));
    }

    Ok(identity)
}

/// Accepts exactly `Bearer <token>`: one prefix, a non-empty token, no whitespace inside it.
///
/// This is stricter than a plain split on the prefix: `Bearer  abc` (token with a
/// leading space) and `Bearer abc def` are rejected as malformed, never forwarded.
pub(crate) fn parse_bearer_token(authorization: Option<&str>) -> Result<&str, DomainError> {
    let header = authorization.ok_or(DomainError::Unauthenticated("missing bearer token"))?;

    let segments: Vec<&str> = header.split(BEARER_PREFIX).collect();
    let [scheme_rest, token] = segments.as_slice() else {
        return Err(DomainError::Unauthenticated("malformed bearer token"));
    };
    if !scheme_rest.is_empty() || token.is_empty() || token.contains(char::is_whitespace) {
        return Err(DomainError::Unauthenticated("malformed bearer token"));
    }

    Ok(*token)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use super::{AccessPolicy, authorize, parse_bearer_token};
    use crate::application::auth_gateway::{AuthGateway, InvalidToken};
    use crate::domain::error::DomainError;
    use crate::domain::identity::{Identity, Role};

    #[derive(Clone)]
    struct FakeGateway {
        outcome: Result<Identity, InvalidToken>,
        seen_tokens: Arc<Mutex<Vec<String>>>,
    }

    impl FakeGateway {
        fn resolving(role: Role) -> Self {
            Self {
                outcome: Ok(Identity {
                    subject_id: 7,
                    role,
                }),
                seen_tokens: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn rejecting() -> Self {
            Self {
                outcome: Err(InvalidToken),
                seen_tokens: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.seen_tokens
                .lock()
                .expect("seen_tokens mutex poisoned")
                .clone()
        }
    }

    #[async_trait]
    impl AuthGateway for FakeGateway {
        async fn validate(&self, token: &str) -> Result<Identity, InvalidToken> {
            self.seen_tokens
                .lock()
                .expect("seen_tokens mutex poisoned")
                .push(token.to_string());
            self.outcome.clone()
        }
    }

    #[tokio::test]
    async fn authorization_matrix_follows_roles() {
        let cases = [
            (Role::User, AccessPolicy::Authenticated, true),
            (Role::User, AccessPolicy::AdminOnly, false),
            (Role::User, AccessPolicy::AdminOrAuthor, false),
            (Role::Author, AccessPolicy::Authenticated, true),
            (Role::Author, AccessPolicy::AdminOnly, false),
            (Role::Author, AccessPolicy::AdminOrAuthor, true),
            (Role::Admin, AccessPolicy::Authenticated, true),
            (Role::Admin, AccessPolicy::AdminOnly, true),
            (Role::Admin, AccessPolicy::AdminOrAuthor, true),
        ];

        for (role, policy, allowed) in cases {
            let gateway = FakeGateway::resolving(role);
            let result = authorize(&gateway, Some("Bearer abc.def"), policy).await;

            if allowed {
                let identity = result.expect("identity must be authorized");
                assert_eq!(identity.role, role);
                assert_eq!(identity.subject_id, 7);
            } else {
                let err = result.expect_err("identity must be forbidden");
                assert!(
                    matches!(err, DomainError::Forbidden(_)),
                    "{role:?} under {policy:?} gave {err:?}"
                );
            }
            assert_eq!(gateway.calls(), vec!["abc.def".to_string()]);
        }
    }

    #[tokio::test]
    async fn malformed_headers_never_reach_the_gateway() {
        let headers = [
            None,
            Some(""),
            Some("Bearer "),
            Some("Bearer"),
            Some("Basic abc"),
            Some("bearer abc"),
            Some("Bearer Bearer abc"),
            Some("Bearer abc Bearer def"),
            Some("Bearer  abc"),
            Some("Bearer abc def"),
            Some("Token Bearer abc"),
        ];

        for header in headers {
            let gateway = FakeGateway::resolving(Role::Admin);
            let err = authorize(&gateway, header, AccessPolicy::Authenticated)
                .await
                .expect_err("header must be rejected");

            assert!(
                matches!(err, DomainError::Unauthenticated(_)),
                "{header:?} gave {err:?}"
            );
            assert!(gateway.calls().is_empty(), "{header:?} reached the gateway");
        }
    }

    #[tokio::test]
    async fn rejected_token_is_unauthenticated() {
        let gateway = FakeGateway::rejecting();
        let err = authorize(&gateway, Some("Bearer expired"), AccessPolicy::Authenticated)
            .await
            .expect_err("token must be rejected");

        match err {
            DomainError::Unauthenticated(reason) => assert_eq!(reason, "invalid token"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(gateway.calls().len(), 1);
    }

    #[test]
    fn parse_bearer_token_extracts_token() {
        let token = parse_bearer_token(Some("Bearer eyJhbGciOi.payload.sig"))
            .expect("token must be extracted");
        assert_eq!(token, "eyJhbGciOi.payload.sig");
    }

    #[test]
    fn whitespace_around_or_inside_the_token_is_malformed() {
        for header in ["Bearer  abc", "Bearer abc def", "Bearer abc "] {
            let err = parse_bearer_token(Some(header)).expect_err("header must be rejected");
            match err {
                DomainError::Unauthenticated(reason) => {
                    assert_eq!(reason, "malformed bearer token", "{header:?}")
                }
                other => panic!("unexpected error for {header:?}: {other:?}"),
            }
        }
    }
}
