use std::sync::Arc;
use std::time::Duration;

use harvest_api::*;

use crate::error::{ApiError, TransportError};
use crate::http::{HttpClient, HttpRequest, HttpResponse, SessionHooks, Transport};
use crate::transport::ReqwestTransport;

/// Typed client for the Harvest API.
///
/// Cheap to clone; clones share one [`HttpClient`] and therefore one set of
/// installed session hooks.
pub struct ApiClient<T = ReqwestTransport> {
    http: Arc<HttpClient<T>>,
}

impl<T> Clone for ApiClient<T> {
    fn clone(&self) -> Self {
        Self {
            http: Arc::clone(&self.http),
        }
    }
}

impl ApiClient<ReqwestTransport> {
    /// Create a new client with the given base URL and timeout.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, TransportError> {
        Ok(Self::with_transport(ReqwestTransport::new(base_url, timeout)?))
    }
}

impl<T: Transport> ApiClient<T> {
    pub fn with_transport(transport: T) -> Self {
        Self {
            http: Arc::new(HttpClient::new(transport)),
        }
    }

    pub fn http(&self) -> &HttpClient<T> {
        &self.http
    }

    pub fn install_hooks(&self, hooks: Arc<dyn SessionHooks>) -> Option<Arc<dyn SessionHooks>> {
        self.http.install_hooks(hooks)
    }

    pub fn eject_hooks(&self) -> Option<Arc<dyn SessionHooks>> {
        self.http.eject_hooks()
    }

    // ── Auth ──────────────────────────────────────────────────────────────

    /// Exchange credentials for an access token. No bearer is attached and a
    /// 401 here means bad credentials, not an expired session.
    pub async fn login(&self, req: &LoginRequest) -> Result<TokenResponse, ApiError> {
        let request = HttpRequest::post(TOKEN_PATH, req)?.authentication();
        let resp = self.http.send(request).await?;
        parse_response(resp, "Login failed")
    }

    // ── Families ──────────────────────────────────────────────────────────

    pub async fn list_families(&self) -> Result<FamilyListResponse, ApiError> {
        let resp = self.http.send(HttpRequest::get(FAMILIES_PATH)).await?;
        parse_response(resp, "Failed to load families")
    }

    pub async fn add_family_payment(
        &self,
        req: &AddFamilyPaymentRequest,
    ) -> Result<AddFamilyPaymentResponse, ApiError> {
        let resp = self
            .http
            .send(HttpRequest::post(ADD_FAMILY_PAYMENT_PATH, req)?)
            .await?;
        parse_response(resp, "Failed to create payment")
    }

    pub async fn update_family_payment(
        &self,
        req: &UpdateFamilyPaymentRequest,
    ) -> Result<UpdateFamilyPaymentResponse, ApiError> {
        let resp = self
            .http
            .send(HttpRequest::put(UPDATE_FAMILY_PAYMENT_PATH, req)?)
            .await?;
        parse_response(resp, "Failed to update payment")
    }
}

/// Decode the body on 2xx; otherwise surface the server's reason, or
/// `fallback` when the error body carries none.
fn parse_response<T: serde::de::DeserializeOwned>(
    resp: HttpResponse,
    fallback: &str,
) -> Result<T, ApiError> {
    if !resp.is_success() {
        let reason = serde_json::from_str::<ErrorBody>(&resp.body)
            .ok()
            .and_then(|body| body.message().map(str::to_string))
            .unwrap_or_else(|| fallback.to_string());
        return Err(ApiError::Rejected(reason));
    }
    serde_json::from_str(&resp.body).map_err(|e| ApiError::InvalidResponse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::Method;
    use crate::testing::StubTransport;
    use serde_json::json;

    fn client() -> (ApiClient<StubTransport>, StubTransport) {
        let stub = StubTransport::new();
        (ApiClient::with_transport(stub.clone()), stub)
    }

    #[tokio::test]
    async fn login_posts_credentials_to_token_endpoint() {
        let (client, stub) = client();
        stub.push_json(200, json!({"access": "jwt", "refresh": "r"}));

        let token = client
            .login(&LoginRequest {
                username: "admin".into(),
                password: "secret".into(),
            })
            .await
            .unwrap();

        assert_eq!(token.access, "jwt");
        let call = &stub.calls()[0];
        assert_eq!(call.method, Method::Post);
        assert_eq!(call.path, "/token/");
        assert!(call.authentication);
        assert_eq!(call.body.as_ref().unwrap()["username"], "admin");
    }

    #[tokio::test]
    async fn login_rejection_uses_detail_or_fallback() {
        let (client, stub) = client();
        stub.push_json(401, json!({"detail": "No active account found"}));
        stub.push_raw(500, "<html>oops</html>");
        let req = LoginRequest {
            username: "a".into(),
            password: "b".into(),
        };

        assert_eq!(
            client.login(&req).await.unwrap_err(),
            ApiError::Rejected("No active account found".into())
        );
        assert_eq!(
            client.login(&req).await.unwrap_err(),
            ApiError::Rejected("Login failed".into())
        );
    }

    #[tokio::test]
    async fn add_payment_surfaces_server_error_field() {
        let (client, stub) = client();
        stub.push_json(400, json!({"error": "Missing fields: ['amount']"}));

        let err = client
            .add_family_payment(&AddFamilyPaymentRequest {
                family_name: "Lee".into(),
                child_count: 2,
                amount: 75.0,
                payment_method: PaymentMethod::Cash,
            })
            .await
            .unwrap_err();

        assert_eq!(err, ApiError::Rejected("Missing fields: ['amount']".into()));
    }

    #[tokio::test]
    async fn update_payment_sends_put_with_float_amount() {
        let (client, stub) = client();
        stub.push_json(200, json!({"status": "success", "payment_id": 9}));

        let resp = client
            .update_family_payment(&UpdateFamilyPaymentRequest {
                family_id: 3,
                amount: 20.25,
                payment_method: PaymentMethod::Check,
            })
            .await
            .unwrap();

        assert_eq!(resp.payment_id, Some(9));
        let call = &stub.calls()[0];
        assert_eq!(call.method, Method::Put);
        assert_eq!(call.path, "/update-family-payment/");
        assert_eq!(call.body.as_ref().unwrap()["amount"], 20.25);
        assert_eq!(call.body.as_ref().unwrap()["payment_method"], "check");
    }

    #[tokio::test]
    async fn malformed_success_body_is_invalid_response() {
        let (client, stub) = client();
        stub.push_raw(200, "not json");

        let err = client.list_families().await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidResponse(_)));
    }
}
