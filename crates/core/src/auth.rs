use harvest_api::LoginRequest;
use harvest_api_client::{ApiClient, ApiError, Transport};

use crate::session::Credential;

pub const MISSING_CREDENTIALS_MESSAGE: &str = "Please enter both username and password";

/// Local check run before any request is sent.
pub fn validate_credentials(username: &str, password: &str) -> Result<(), ApiError> {
    if username.trim().is_empty() || password.is_empty() {
        return Err(ApiError::MissingField(
            MISSING_CREDENTIALS_MESSAGE.to_string(),
        ));
    }
    Ok(())
}

/// Exchange a username/password pair for a credential.
///
/// Only obtains the credential; committing it is the caller's job
/// ([`crate::session::SessionStore::login`]).
pub async fn authenticate<T: Transport>(
    client: &ApiClient<T>,
    username: &str,
    password: &str,
) -> Result<Credential, ApiError> {
    validate_credentials(username, password)?;

    let token = client
        .login(&LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        })
        .await?;

    if token.access.trim().is_empty() {
        return Err(ApiError::InvalidResponse(
            "token response carried an empty access token".to_string(),
        ));
    }
    Ok(Credential::new(token.access, Some(username.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use harvest_api_client::testing::StubTransport;
    use serde_json::json;

    fn client() -> (ApiClient<StubTransport>, StubTransport) {
        let stub = StubTransport::new();
        (ApiClient::with_transport(stub.clone()), stub)
    }

    #[tokio::test]
    async fn empty_fields_fail_before_any_request() {
        let (client, stub) = client();

        for (user, pass) in [("", "pw"), ("admin", ""), ("   ", "pw")] {
            let err = authenticate(&client, user, pass).await.unwrap_err();
            assert_eq!(
                err,
                ApiError::MissingField(MISSING_CREDENTIALS_MESSAGE.to_string())
            );
        }
        assert_eq!(stub.call_count(), 0);
    }

    #[tokio::test]
    async fn success_returns_token_and_identity() {
        let (client, stub) = client();
        stub.push_json(200, json!({"access": "jwt-123", "refresh": "r"}));

        let credential = authenticate(&client, "admin", "pw").await.unwrap();

        assert_eq!(credential.token, "jwt-123");
        assert_eq!(credential.identity.as_deref(), Some("admin"));
    }

    #[tokio::test]
    async fn server_detail_becomes_rejected() {
        let (client, stub) = client();
        stub.push_json(
            401,
            json!({"detail": "No active account found with the given credentials"}),
        );

        let err = authenticate(&client, "admin", "wrong").await.unwrap_err();
        assert_eq!(
            err,
            ApiError::Rejected("No active account found with the given credentials".into())
        );
    }

    #[tokio::test]
    async fn network_failure_is_unreachable() {
        let (client, stub) = client();
        stub.push_failure("connection refused");

        let err = authenticate(&client, "admin", "pw").await.unwrap_err();
        assert!(matches!(err, ApiError::Unreachable(_)));
    }

    #[tokio::test]
    async fn empty_access_token_is_invalid() {
        let (client, stub) = client();
        stub.push_json(200, json!({"access": ""}));

        let err = authenticate(&client, "admin", "pw").await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidResponse(_)));
    }
}
