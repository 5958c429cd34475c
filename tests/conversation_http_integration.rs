//! Integration tests for the conversation HTTP endpoints.
//!
//! Covers ownership isolation, archive semantics, message ordering, usage
//! accounting and the per-tier rate limit through the assembled router.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use scribe_api::adapters::http::{api_router, AppServices};
use scribe_api::adapters::memory::{
    InMemoryAuthProvider, InMemoryConversationRepository, InMemoryProfileRepository,
};
use scribe_api::adapters::rate_limiter::{InMemoryRateLimiter, RateLimitConfig};
use scribe_api::config::BackendPresence;
use scribe_api::domain::foundation::AuthenticatedUser;
use scribe_api::domain::profile::{SubscriptionTier, UserProfile};

// =============================================================================
// Test Infrastructure
// =============================================================================

struct Harness {
    app: Router,
    auth: Arc<InMemoryAuthProvider>,
    profiles: Arc<InMemoryProfileRepository>,
    conversations: Arc<InMemoryConversationRepository>,
}

impl Harness {
    fn new() -> Self {
        Self::with_rate_limits(RateLimitConfig::default())
    }

    fn with_rate_limits(config: RateLimitConfig) -> Self {
        let auth = Arc::new(InMemoryAuthProvider::new());
        let profiles = Arc::new(InMemoryProfileRepository::new());
        let conversations = Arc::new(InMemoryConversationRepository::new());
        let services = AppServices {
            auth_provider: auth.clone(),
            session_validator: auth.clone(),
            profiles: profiles.clone(),
            conversations: conversations.clone(),
            rate_limiter: Arc::new(InMemoryRateLimiter::new(config)),
            password_reset_redirect: "http://localhost:3000/reset-password".to_string(),
            presence: BackendPresence {
                backend_url: true,
                public_key: true,
                privileged_key: true,
                site_url: true,
            },
        };
        Self {
            app: api_router(services),
            auth,
            profiles,
            conversations,
        }
    }

    /// Registers a user with a free-tier profile and returns a bearer token.
    fn user(&self, email: &str) -> (AuthenticatedUser, String) {
        let user = self.auth.add_account(email, "secret123", None);
        self.profiles.insert(UserProfile::for_new_user(&user));
        let token = self.auth.issue_session(email).unwrap().session.access_token;
        (user, token)
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {}", token));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    async fn create(&self, token: &str, title: &str) -> String {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/conversations",
                Some(token),
                Some(json!({ "title": title })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create failed: {}", body);
        body["conversation"]["id"].as_str().unwrap().to_string()
    }

    async fn post_message(&self, token: &str, id: &str, body: Value) -> (StatusCode, Value) {
        self.send(
            Method::POST,
            &format!("/api/conversations/{}/messages", id),
            Some(token),
            Some(body),
        )
        .await
    }
}

// =============================================================================
// Conversations
// =============================================================================

#[tokio::test]
async fn create_without_body_uses_default_title() {
    let h = Harness::new();
    let (user, token) = h.user("ada@example.com");

    let (status, body) = h
        .send(Method::POST, "/api/conversations", Some(&token), None)
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["conversation"]["title"], "New Conversation");
    assert_eq!(body["conversation"]["userId"], user.id.to_string());
    assert_eq!(body["conversation"]["isArchived"], false);
}

#[tokio::test]
async fn list_shows_only_own_active_conversations() {
    let h = Harness::new();
    let (_, ada) = h.user("ada@example.com");
    let (_, grace) = h.user("grace@example.com");
    h.create(&ada, "Ada's draft").await;
    h.create(&grace, "Grace's draft").await;

    let (status, body) = h.send(Method::GET, "/api/conversations", Some(&ada), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["conversations"][0]["title"], "Ada's draft");
}

#[tokio::test]
async fn archived_conversation_drops_out_of_list_but_stays_readable() {
    let h = Harness::new();
    let (_, token) = h.user("ada@example.com");
    let id = h.create(&token, "Outline").await;

    let (status, body) = h
        .send(Method::DELETE, &format!("/api/conversations/{}", id), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Conversation deleted successfully");

    let (_, list) = h.send(Method::GET, "/api/conversations", Some(&token), None).await;
    assert_eq!(list["count"], 0);

    let (status, detail) = h
        .send(Method::GET, &format!("/api/conversations/{}", id), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["conversation"]["isArchived"], true);
}

#[tokio::test]
async fn update_renames_and_unarchives() {
    let h = Harness::new();
    let (_, token) = h.user("ada@example.com");
    let id = h.create(&token, "Old title").await;
    let uri = format!("/api/conversations/{}", id);
    h.send(Method::DELETE, &uri, Some(&token), None).await;

    let (status, body) = h
        .send(
            Method::PUT,
            &uri,
            Some(&token),
            Some(json!({ "title": "New title", "isArchived": false })),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["conversation"]["title"], "New title");
    assert_eq!(body["conversation"]["isArchived"], false);
}

#[tokio::test]
async fn foreign_conversation_is_404_for_every_operation() {
    let h = Harness::new();
    let (_, ada) = h.user("ada@example.com");
    let (_, grace) = h.user("grace@example.com");
    let id = h.create(&ada, "Private").await;
    let uri = format!("/api/conversations/{}", id);

    let (get, _) = h.send(Method::GET, &uri, Some(&grace), None).await;
    let (put, _) = h
        .send(Method::PUT, &uri, Some(&grace), Some(json!({ "title": "Hijacked" })))
        .await;
    let (delete, _) = h.send(Method::DELETE, &uri, Some(&grace), None).await;
    let (list, _) = h
        .send(Method::GET, &format!("{}/messages", uri), Some(&grace), None)
        .await;

    assert_eq!(get, StatusCode::NOT_FOUND);
    assert_eq!(put, StatusCode::NOT_FOUND);
    assert_eq!(delete, StatusCode::NOT_FOUND);
    assert_eq!(list, StatusCode::NOT_FOUND);

    let (_, own) = h.send(Method::GET, &uri, Some(&ada), None).await;
    assert_eq!(own["conversation"]["title"], "Private");
    assert_eq!(own["conversation"]["isArchived"], false);
}

#[tokio::test]
async fn non_uuid_id_is_404() {
    let h = Harness::new();
    let (_, token) = h.user("ada@example.com");

    let (status, body) = h
        .send(Method::GET, "/api/conversations/not-a-uuid", Some(&token), None)
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}

// =============================================================================
// Messages
// =============================================================================

#[tokio::test]
async fn message_to_foreign_conversation_is_404_and_not_stored() {
    let h = Harness::new();
    let (_, ada) = h.user("ada@example.com");
    let (_, grace) = h.user("grace@example.com");
    let id = h.create(&ada, "Private").await;

    let (status, _) = h
        .post_message(&grace, &id, json!({ "role": "user", "content": "hello" }))
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(h.conversations.message_count(), 0);
}

#[tokio::test]
async fn invalid_message_is_400_and_not_stored() {
    let h = Harness::new();
    let (_, token) = h.user("ada@example.com");
    let id = h.create(&token, "Draft").await;

    let (missing_role, _) = h.post_message(&token, &id, json!({ "content": "hi" })).await;
    let (blank_content, _) = h
        .post_message(&token, &id, json!({ "role": "user", "content": "   " }))
        .await;

    assert_eq!(missing_role, StatusCode::BAD_REQUEST);
    assert_eq!(blank_content, StatusCode::BAD_REQUEST);
    assert_eq!(h.conversations.message_count(), 0);
}

#[tokio::test]
async fn messages_come_back_oldest_first() {
    let h = Harness::new();
    let (_, token) = h.user("ada@example.com");
    let id = h.create(&token, "Draft").await;

    for (role, content) in [("user", "first"), ("assistant", "second"), ("user", "third")] {
        let (status, _) = h
            .post_message(&token, &id, json!({ "role": role, "content": content }))
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = h
        .send(
            Method::GET,
            &format!("/api/conversations/{}/messages", id),
            Some(&token),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 3);
    let contents: Vec<&str> = body["messages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["content"].as_str().unwrap())
        .collect();
    assert_eq!(contents, vec!["first", "second", "third"]);

    let (_, detail) = h
        .send(Method::GET, &format!("/api/conversations/{}", id), Some(&token), None)
        .await;
    assert_eq!(detail["count"], 3);
}

#[tokio::test]
async fn reported_tokens_are_charged_to_usage() {
    let h = Harness::new();
    let (user, token) = h.user("ada@example.com");
    let id = h.create(&token, "Draft").await;

    let (status, body) = h
        .post_message(
            &token,
            &id,
            json!({
                "role": "assistant",
                "content": "Here is a revision.",
                "metadata": { "tokensUsed": 150, "costCents": 2 }
            }),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"]["metadata"]["tokensUsed"], 150);

    let log = h.profiles.usage_log();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].tokens_used, 150);
    assert_eq!(log[0].cost_cents, 2);
    assert_eq!(h.profiles.get(&user.id).unwrap().api_usage_count, 1);
}

#[tokio::test]
async fn message_without_usage_metadata_charges_nothing() {
    let h = Harness::new();
    let (user, token) = h.user("ada@example.com");
    let id = h.create(&token, "Draft").await;

    h.post_message(&token, &id, json!({ "role": "user", "content": "hi" }))
        .await;

    assert!(h.profiles.usage_log().is_empty());
    assert_eq!(h.profiles.get(&user.id).unwrap().api_usage_count, 0);
}

// =============================================================================
// Auth and rate limiting
// =============================================================================

#[tokio::test]
async fn conversation_routes_require_a_token() {
    let h = Harness::new();

    let (status, body) = h.send(Method::GET, "/api/conversations", None, None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Missing token");
    assert_eq!(h.conversations.calls(), 0);
}

#[tokio::test]
async fn health_needs_no_token() {
    let h = Harness::new();

    let (status, body) = h
        .send(Method::GET, "/api/conversations/health", None, None)
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "OK");
}

#[tokio::test]
async fn creating_past_the_tier_limit_is_429_but_reads_still_work() {
    let h = Harness::with_rate_limits(
        RateLimitConfig::default().with_tier_limit(SubscriptionTier::Free, 2),
    );
    let (_, token) = h.user("ada@example.com");
    h.create(&token, "one").await;
    h.create(&token, "two").await;

    let (status, body) = h
        .send(Method::POST, "/api/conversations", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"], "Rate limit exceeded");
    assert!(body["retryAfterSecs"].as_u64().is_some());

    let (status, list) = h.send(Method::GET, "/api/conversations", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["count"], 2);
}

#[tokio::test]
async fn limits_are_counted_per_user() {
    let h = Harness::with_rate_limits(
        RateLimitConfig::default().with_tier_limit(SubscriptionTier::Free, 1),
    );
    let (_, ada) = h.user("ada@example.com");
    let (_, grace) = h.user("grace@example.com");

    h.create(&ada, "one").await;
    h.create(&grace, "one").await;
}

#[tokio::test]
async fn exhausted_quota_blocks_metered_routes() {
    let h = Harness::new();
    let (user, token) = h.user("ada@example.com");
    let mut profile = h.profiles.get(&user.id).unwrap();
    profile.api_usage_count = profile.api_usage_limit;
    h.profiles.insert(profile);

    let (status, body) = h
        .send(Method::POST, "/api/conversations", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"], "Quota exceeded");

    let (status, _) = h.send(Method::GET, "/api/conversations", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
}
