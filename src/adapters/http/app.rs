//! Application router: mounts the route modules and the tower middleware stack.

use std::any::Any;
use std::sync::Arc;

use axum::{
    error_handling::HandleErrorLayer,
    http::{
        header::{ALLOW, CONTENT_TYPE},
        HeaderValue, Method, StatusCode,
    },
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    BoxError, Json, Router,
};
use tower::{timeout::error::Elapsed, ServiceBuilder};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{self, AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::{BackendPresence, ServerConfig};
use crate::ports::{
    AuthProvider, ConversationRepository, ProfileRepository, RateLimiter, SessionValidator,
};

use super::auth::{self, auth_routes, AuthAppState};
use super::conversation::{conversation_routes, ConversationAppState};
use super::error::{ApiError, ErrorResponse, INTERNAL_ERROR_MESSAGE};
use super::middleware::AuthState;

/// Everything the HTTP layer depends on, built once at startup.
#[derive(Clone)]
pub struct AppServices {
    pub auth_provider: Arc<dyn AuthProvider>,
    pub session_validator: Arc<dyn SessionValidator>,
    pub profiles: Arc<dyn ProfileRepository>,
    pub conversations: Arc<dyn ConversationRepository>,
    pub rate_limiter: Arc<dyn RateLimiter>,
    pub password_reset_redirect: String,
    pub presence: BackendPresence,
}

/// Routes only, without the tower middleware stack.
///
/// - `/health` - same payload as `/api/auth/health`
/// - `/api/auth/*`
/// - `/api/conversations/*`
///
/// Unknown paths answer 404 and wrong methods 405, both in the error envelope.
pub fn api_router(services: AppServices) -> Router {
    let auth_state = AuthState::new(services.session_validator, services.profiles.clone());

    let auth_app = AuthAppState {
        auth: services.auth_provider,
        profiles: services.profiles.clone(),
        rate_limiter: services.rate_limiter.clone(),
        password_reset_redirect: services.password_reset_redirect,
        presence: services.presence,
    };
    let conversation_app = ConversationAppState {
        conversations: services.conversations,
        profiles: services.profiles,
    };

    Router::new()
        .route("/health", get(auth::health).with_state(auth_app.clone()))
        .nest("/api/auth", auth_routes(auth_app, auth_state.clone()))
        .nest(
            "/api/conversations",
            conversation_routes(conversation_app, auth_state, services.rate_limiter),
        )
        .fallback(route_not_found)
        .layer(middleware::map_response(envelope_bare_errors))
}

/// Wraps `router` in request id, tracing, panic, timeout and CORS layers.
pub fn with_middleware(router: Router, server: &ServerConfig) -> Router {
    router.layer(
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(TraceLayer::new_for_http())
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(CatchPanicLayer::custom(handle_panic))
            .layer(HandleErrorLayer::new(handle_middleware_error))
            .timeout(server.request_timeout())
            .layer(cors_layer(server)),
    )
}

fn cors_layer(server: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = server
        .cors_origins_list()
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "Ignoring malformed CORS origin");
                None
            }
        })
        .collect();

    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers(cors::Any);

    if origins.is_empty() {
        layer.allow_origin(cors::Any)
    } else {
        layer.allow_origin(AllowOrigin::list(origins))
    }
}

async fn route_not_found() -> ApiError {
    ApiError::NotFound("Route")
}

/// Gives bodiless error responses produced by the router itself, such as
/// axum's 405, the JSON error envelope. The `Allow` header is kept.
async fn envelope_bare_errors(response: Response) -> Response {
    let status = response.status();
    let is_error = status.is_client_error() || status.is_server_error();
    if !is_error || response.headers().contains_key(CONTENT_TYPE) {
        return response;
    }

    let reason = status.canonical_reason().unwrap_or("Error");
    let message = if status == StatusCode::METHOD_NOT_ALLOWED {
        "Method not allowed for this route".to_string()
    } else {
        reason.to_string()
    };
    let allow = response.headers().get(ALLOW).cloned();

    let mut enveloped = (status, Json(ErrorResponse::new(reason, message))).into_response();
    if let Some(allow) = allow {
        enveloped.headers_mut().insert(ALLOW, allow);
    }
    enveloped
}

/// Errors raised by tower middleware below `HandleErrorLayer`.
async fn handle_middleware_error(err: BoxError) -> ApiError {
    if err.is::<Elapsed>() {
        tracing::warn!("Request timed out");
        ApiError::Timeout
    } else {
        ApiError::internal(format!("middleware error: {}", err))
    }
}

/// Panics become the generic 500 envelope; the payload is only logged.
fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s
    } else {
        "unknown panic"
    };
    tracing::error!(panic = %detail, "Handler panicked");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new("Internal server error", INTERNAL_ERROR_MESSAGE)),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{
        InMemoryAuthProvider, InMemoryConversationRepository, InMemoryProfileRepository,
    };
    use crate::adapters::rate_limiter::InMemoryRateLimiter;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::Value;
    use tower::ServiceExt;

    fn services() -> AppServices {
        let provider = Arc::new(InMemoryAuthProvider::new());
        AppServices {
            auth_provider: provider.clone(),
            session_validator: provider,
            profiles: Arc::new(InMemoryProfileRepository::new()),
            conversations: Arc::new(InMemoryConversationRepository::new()),
            rate_limiter: Arc::new(InMemoryRateLimiter::with_defaults()),
            password_reset_redirect: "http://localhost:3000/reset-password".to_string(),
            presence: BackendPresence {
                backend_url: true,
                public_key: true,
                privileged_key: false,
                site_url: true,
            },
        }
    }

    fn server_config() -> ServerConfig {
        ServerConfig::default()
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn root_health_reports_configuration() {
        let (status, body) = get_json(api_router(services()), "/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "OK");
        assert_eq!(body["service"], "auth");
        assert_eq!(body["configuration"]["privilegedKey"], false);
        assert_eq!(body["configuration"]["backendUrl"], true);
    }

    #[tokio::test]
    async fn unknown_route_is_404_envelope() {
        let (status, body) = get_json(api_router(services()), "/api/nope").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn panicking_handler_becomes_generic_500() {
        async fn boom() -> &'static str {
            panic!("secret internal detail")
        }
        let router = Router::new().route("/boom", get(boom));
        let app = with_middleware(router, &server_config());

        let (status, body) = get_json(app, "/boom").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], INTERNAL_ERROR_MESSAGE);
        assert!(!body.to_string().contains("secret internal detail"));
    }

    #[tokio::test]
    async fn wrong_method_is_405_envelope() {
        let app = with_middleware(api_router(services()), &server_config());

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::PATCH)
                    .uri("/api/auth/signup")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert!(response.headers().contains_key(ALLOW));
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Method Not Allowed");
    }

    #[tokio::test]
    async fn wrong_method_on_nested_route_is_405_envelope() {
        let app = api_router(services());

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::PATCH)
                    .uri("/api/conversations/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn slow_request_is_408_envelope() {
        async fn slow() -> &'static str {
            tokio::time::sleep(std::time::Duration::from_secs(5)).await;
            "too late"
        }
        let config = ServerConfig {
            request_timeout_secs: 1,
            ..ServerConfig::default()
        };
        let app = with_middleware(Router::new().route("/slow", get(slow)), &config);

        let (status, body) = get_json(app, "/slow").await;

        assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Request timeout");
    }

    #[tokio::test]
    async fn request_id_is_propagated() {
        let app = with_middleware(api_router(services()), &server_config());

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert!(response.headers().contains_key("x-request-id"));
    }
}
