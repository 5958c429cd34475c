//! Auth-service adapter: implements `AuthProvider` and `SessionValidator`
//! over the managed backend's `/auth/v1` endpoints.

use async_trait::async_trait;
use reqwest::{Method, Response, StatusCode};
use serde_json::{json, Map, Value};

use crate::domain::foundation::{AuthError, AuthenticatedUser};
use crate::ports::{
    AuthProvider, AuthProviderError, SessionGrant, SessionValidator, SignUpOutcome, SignUpRequest,
};

use super::client::{error_message, ClientHandle};
use super::models::{AuthUserBody, SessionBody, SignUpBody, SignUpPayload};

/// Managed auth service client.
///
/// Uses the public handle: every call here is one a browser client could
/// make with the anon key.
#[derive(Debug, Clone)]
pub struct SupabaseAuth {
    handle: ClientHandle,
}

impl SupabaseAuth {
    pub fn new(handle: ClientHandle) -> Self {
        Self { handle }
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        operation: &'static str,
    ) -> Result<Response, AuthProviderError> {
        let response = request.send().await.map_err(|e| {
            tracing::error!(operation, error = %e, "Auth service request failed");
            AuthProviderError::unavailable(e.to_string())
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = error_message(response).await;
        if status.is_client_error() {
            tracing::debug!(operation, %status, %message, "Auth service rejected request");
            Err(AuthProviderError::rejected(message))
        } else {
            tracing::error!(operation, %status, %message, "Auth service error");
            Err(AuthProviderError::unavailable(format!("{}: {}", status, message)))
        }
    }

    async fn session_grant(response: Response) -> Result<SessionGrant, AuthProviderError> {
        let body: SessionBody = response.json().await.map_err(decode_error)?;
        let (user, session) = body.into_parts().map_err(decode_error)?;
        Ok(SessionGrant { user, session })
    }
}

fn decode_error(e: impl std::fmt::Display) -> AuthProviderError {
    tracing::error!(error = %e, "Unexpected auth service response");
    AuthProviderError::unavailable(format!("unexpected response: {}", e))
}

#[async_trait]
impl AuthProvider for SupabaseAuth {
    async fn sign_up(&self, request: SignUpRequest) -> Result<SignUpOutcome, AuthProviderError> {
        let mut data = Map::new();
        if let Some(name) = &request.full_name {
            data.insert("full_name".to_string(), Value::String(name.clone()));
        }
        let payload = SignUpPayload {
            email: &request.email,
            password: &request.password,
            data,
        };

        let response = self
            .send(self.handle.auth(Method::POST, "signup").json(&payload), "sign_up")
            .await?;

        match response.json::<SignUpBody>().await.map_err(decode_error)? {
            SignUpBody::WithSession(body) => {
                let (user, session) = body.into_parts().map_err(decode_error)?;
                Ok(SignUpOutcome {
                    user,
                    session: Some(session),
                })
            }
            SignUpBody::UserOnly(body) => Ok(SignUpOutcome {
                user: body.into_user().map_err(decode_error)?,
                session: None,
            }),
        }
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<SessionGrant, AuthProviderError> {
        let request = self
            .handle
            .auth(Method::POST, "token")
            .query(&[("grant_type", "password")])
            .json(&json!({ "email": email, "password": password }));

        let response = self.send(request, "sign_in").await?;
        Self::session_grant(response).await
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthProviderError> {
        let request = self.handle.auth_as(Method::POST, "logout", access_token);
        self.send(request, "sign_out").await?;
        Ok(())
    }

    async fn send_password_reset(
        &self,
        email: &str,
        redirect_to: &str,
    ) -> Result<(), AuthProviderError> {
        let request = self
            .handle
            .auth(Method::POST, "recover")
            .query(&[("redirect_to", redirect_to)])
            .json(&json!({ "email": email }));

        self.send(request, "password_reset").await?;
        Ok(())
    }

    async fn update_password(
        &self,
        access_token: &str,
        new_password: &str,
    ) -> Result<AuthenticatedUser, AuthProviderError> {
        let request = self
            .handle
            .auth_as(Method::PUT, "user", access_token)
            .json(&json!({ "password": new_password }));

        let response = self.send(request, "update_password").await?;
        let body: AuthUserBody = response.json().await.map_err(decode_error)?;
        body.into_user().map_err(decode_error)
    }

    async fn refresh_session(&self, refresh_token: &str) -> Result<SessionGrant, AuthProviderError> {
        let request = self
            .handle
            .auth(Method::POST, "token")
            .query(&[("grant_type", "refresh_token")])
            .json(&json!({ "refresh_token": refresh_token }));

        let response = self.send(request, "refresh_session").await?;
        Self::session_grant(response).await
    }
}

#[async_trait]
impl SessionValidator for SupabaseAuth {
    async fn validate(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        let response = self
            .handle
            .auth_as(Method::GET, "user", token)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Token verification request failed");
                AuthError::service_unavailable(e.to_string())
            })?;

        match response.status() {
            status if status.is_success() => {
                let body: AuthUserBody = response.json().await.map_err(|e| {
                    tracing::error!(error = %e, "Unexpected token verification response");
                    AuthError::service_unavailable(e.to_string())
                })?;
                body.into_user().map_err(|_| AuthError::InvalidToken)
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND
            | StatusCode::BAD_REQUEST => {
                let message = error_message(response).await;
                tracing::debug!(%message, "Token rejected");
                if message.to_ascii_lowercase().contains("expired") {
                    Err(AuthError::TokenExpired)
                } else {
                    Err(AuthError::InvalidToken)
                }
            }
            status => {
                let message = error_message(response).await;
                tracing::error!(%status, %message, "Token verification failed");
                Err(AuthError::service_unavailable(format!("{}: {}", status, message)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::supabase::SupabaseClient;
    use secrecy::Secret;
    use std::time::Duration;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn auth_for(server: &MockServer) -> SupabaseAuth {
        let client = SupabaseClient::from_parts(
            &server.uri(),
            Secret::new("anon-key".to_string()),
            Secret::new("service-key".to_string()),
            Duration::from_secs(5),
        )
        .unwrap();
        SupabaseAuth::new(client.public())
    }

    fn session_json(user_id: &str) -> serde_json::Value {
        json!({
            "access_token": "access-1",
            "refresh_token": "refresh-1",
            "expires_in": 3600,
            "expires_at": 1_700_003_600u64,
            "token_type": "bearer",
            "user": {
                "id": user_id,
                "email": "writer@example.com",
                "email_confirmed_at": "2024-01-01T00:00:00Z",
                "user_metadata": {"full_name": "Ada Writer"}
            }
        })
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Sign-in / refresh
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn sign_in_posts_password_grant() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .and(query_param("grant_type", "password"))
            .and(header("apikey", "anon-key"))
            .and(body_json(json!({"email": "writer@example.com", "password": "hunter22"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(session_json("user-1")))
            .expect(1)
            .mount(&server)
            .await;

        let grant = auth_for(&server)
            .sign_in_with_password("writer@example.com", "hunter22")
            .await
            .unwrap();

        assert_eq!(grant.user.id.as_str(), "user-1");
        assert_eq!(grant.session.access_token, "access-1");
        assert_eq!(grant.session.expires_at, Some(1_700_003_600));
    }

    #[tokio::test]
    async fn sign_in_surfaces_provider_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": "invalid_grant",
                "error_description": "Invalid login credentials"
            })))
            .mount(&server)
            .await;

        let result = auth_for(&server)
            .sign_in_with_password("writer@example.com", "wrong")
            .await;

        assert_eq!(
            result,
            Err(AuthProviderError::rejected("Invalid login credentials"))
        );
    }

    #[tokio::test]
    async fn server_error_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let result = auth_for(&server).refresh_session("refresh-1").await;
        assert!(matches!(result, Err(AuthProviderError::Unavailable(_))));
    }

    #[tokio::test]
    async fn refresh_uses_refresh_token_grant() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .and(query_param("grant_type", "refresh_token"))
            .and(body_json(json!({"refresh_token": "refresh-0"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(session_json("user-1")))
            .expect(1)
            .mount(&server)
            .await;

        let grant = auth_for(&server).refresh_session("refresh-0").await.unwrap();
        assert_eq!(grant.session.refresh_token, "refresh-1");
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Sign-up
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn sign_up_sends_full_name_metadata() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/signup"))
            .and(body_json(json!({
                "email": "writer@example.com",
                "password": "hunter22",
                "data": {"full_name": "Ada Writer"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(session_json("user-1")))
            .mount(&server)
            .await;

        let outcome = auth_for(&server)
            .sign_up(SignUpRequest {
                email: "writer@example.com".to_string(),
                password: "hunter22".to_string(),
                full_name: Some("Ada Writer".to_string()),
            })
            .await
            .unwrap();

        assert_eq!(outcome.user.display_name.as_deref(), Some("Ada Writer"));
        assert!(outcome.session.is_some());
    }

    #[tokio::test]
    async fn sign_up_pending_confirmation_has_no_session() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/signup"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"id": "user-2", "email": "new@example.com"})),
            )
            .mount(&server)
            .await;

        let outcome = auth_for(&server)
            .sign_up(SignUpRequest {
                email: "new@example.com".to_string(),
                password: "hunter22".to_string(),
                full_name: None,
            })
            .await
            .unwrap();

        assert_eq!(outcome.user.id.as_str(), "user-2");
        assert!(!outcome.user.email_confirmed);
        assert!(outcome.session.is_none());
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Caller-token operations
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn sign_out_acts_as_caller() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/logout"))
            .and(header("authorization", "Bearer user-jwt"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        auth_for(&server).sign_out("user-jwt").await.unwrap();
    }

    #[tokio::test]
    async fn password_reset_passes_redirect() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/recover"))
            .and(query_param("redirect_to", "https://app.example.com/reset-password"))
            .and(body_json(json!({"email": "writer@example.com"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        auth_for(&server)
            .send_password_reset("writer@example.com", "https://app.example.com/reset-password")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn update_password_returns_user() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/auth/v1/user"))
            .and(header("authorization", "Bearer user-jwt"))
            .and(body_json(json!({"password": "n3w-passw0rd"})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"id": "user-1", "email": "writer@example.com"})),
            )
            .mount(&server)
            .await;

        let user = auth_for(&server)
            .update_password("user-jwt", "n3w-passw0rd")
            .await
            .unwrap();
        assert_eq!(user.id.as_str(), "user-1");
    }

    #[tokio::test]
    async fn weak_password_is_rejected_with_message() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/auth/v1/user"))
            .respond_with(ResponseTemplate::new(422).set_body_json(json!({
                "code": 422,
                "error_code": "weak_password",
                "msg": "Password should be at least 6 characters."
            })))
            .mount(&server)
            .await;

        let result = auth_for(&server).update_password("user-jwt", "abc").await;
        assert_eq!(
            result,
            Err(AuthProviderError::rejected("Password should be at least 6 characters."))
        );
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Token verification
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn validate_resolves_user() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/v1/user"))
            .and(header("authorization", "Bearer good-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "user-1",
                "email": "writer@example.com",
                "email_confirmed_at": "2024-01-01T00:00:00Z"
            })))
            .mount(&server)
            .await;

        let user = auth_for(&server).validate("good-token").await.unwrap();
        assert_eq!(user.id.as_str(), "user-1");
        assert!(user.email_confirmed);
    }

    #[tokio::test]
    async fn validate_maps_401_to_invalid_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/v1/user"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({"msg": "invalid JWT"})),
            )
            .mount(&server)
            .await;

        let result = auth_for(&server).validate("bad-token").await;
        assert_eq!(result, Err(AuthError::InvalidToken));
    }

    #[tokio::test]
    async fn validate_detects_expiry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/v1/user"))
            .respond_with(ResponseTemplate::new(403).set_body_json(
                json!({"msg": "invalid JWT: unable to parse or verify signature, token is expired"}),
            ))
            .mount(&server)
            .await;

        let result = auth_for(&server).validate("old-token").await;
        assert_eq!(result, Err(AuthError::TokenExpired));
    }

    #[tokio::test]
    async fn validate_maps_5xx_to_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/v1/user"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let result = auth_for(&server).validate("token").await;
        assert!(matches!(result, Err(AuthError::ServiceUnavailable(_))));
    }
}
