//! Integration tests for the API client pipeline using a wiremock server.
//!
//! Call-count expectations pin down the refresh policy: at most one refresh
//! and one replay per failed request, and no refresh call at all when no
//! refresh token is stored.

use std::sync::Arc;

use time::OffsetDateTime;
use uuid::Uuid;
use wiremock::{
    matchers::{body_string_contains, header, header_exists, method, path},
    Mock, MockServer, ResponseTemplate,
};

use goaltrack::auth::dto::{AuthResponse, PublicUser};
use goaltrack::client::{ApiClient, ClientError, MemoryTokenStore, TokenStore};
use goaltrack::goals::repo::{Goal, GoalStatus};

fn sample_user() -> PublicUser {
    PublicUser {
        id: Uuid::new_v4(),
        email: "a@x.com".into(),
        username: "a".into(),
        created_at: OffsetDateTime::UNIX_EPOCH,
    }
}

fn sample_goal(user_id: Uuid) -> Goal {
    Goal {
        id: Uuid::new_v4(),
        user_id,
        title: "T".into(),
        description: None,
        category: None,
        target_date: None,
        status: GoalStatus::Todo,
        progress: 0,
        created_at: OffsetDateTime::UNIX_EPOCH,
        updated_at: OffsetDateTime::UNIX_EPOCH,
    }
}

fn auth_body(access: &str, refresh: &str) -> serde_json::Value {
    serde_json::to_value(AuthResponse {
        access_token: access.into(),
        refresh_token: refresh.into(),
        user: sample_user(),
    })
    .unwrap()
}

fn client_with_store(uri: &str) -> (ApiClient, Arc<MemoryTokenStore>) {
    let store = Arc::new(MemoryTokenStore::default());
    let client = ApiClient::with_token_store(uri, store.clone());
    (client, store)
}

#[tokio::test]
async fn stored_token_is_attached_as_bearer() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/goals"))
        .and(header("authorization", "Bearer acc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _store) = client_with_store(&server.uri());
    client.set_tokens("acc", "ref");

    let goals = client.list_goals().await.unwrap();
    assert!(goals.is_empty());
}

#[tokio::test]
async fn request_without_token_carries_no_authorization_header() {
    let server = MockServer::start().await;

    // Anything carrying an Authorization header would hit this and fail the
    // call-count expectation.
    Mock::given(method("GET"))
        .and(path("/goals"))
        .and(header_exists("authorization"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/goals"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _store) = client_with_store(&server.uri());
    assert!(!client.is_authenticated());
    client.list_goals().await.unwrap();
}

#[tokio::test]
async fn unauthorized_triggers_one_refresh_and_one_replay() {
    let server = MockServer::start().await;
    let user_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/goals"))
        .and(header("authorization", "Bearer stale"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh-token"))
        .and(body_string_contains("ref-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(auth_body("fresh", "ref-2")))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/goals"))
        .and(header("authorization", "Bearer fresh"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::to_value(vec![sample_goal(user_id)]).unwrap()),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (client, store) = client_with_store(&server.uri());
    client.set_tokens("stale", "ref-1");

    let goals = client.list_goals().await.unwrap();
    assert_eq!(goals.len(), 1);
    assert_eq!(goals[0].user_id, user_id);

    // Rotated pair was stored
    assert_eq!(store.access_token().as_deref(), Some("fresh"));
    assert_eq!(store.refresh_token().as_deref(), Some("ref-2"));
}

#[tokio::test]
async fn unauthorized_without_refresh_token_clears_and_rejects_without_network_refresh() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/goals"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh-token"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (client, store) = client_with_store(&server.uri());
    // Empty refresh token counts as absent
    client.set_tokens("stale", "");

    let err = client.list_goals().await.unwrap_err();
    assert!(matches!(err, ClientError::Unauthorized));
    assert_eq!(store.access_token(), None);
    assert_eq!(store.refresh_token(), None);
}

#[tokio::test]
async fn failed_refresh_clears_tokens_and_reports_session_expired() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/goals"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh-token"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(serde_json::json!({ "message": "Invalid refresh token" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (client, store) = client_with_store(&server.uri());
    client.set_tokens("stale", "ref-1");

    let err = client.list_goals().await.unwrap_err();
    assert!(matches!(err, ClientError::SessionExpired));
    assert_eq!(store.access_token(), None);
}

#[tokio::test]
async fn rejected_replay_does_not_refresh_a_second_time() {
    let server = MockServer::start().await;

    // Both the original request and the replay are rejected
    Mock::given(method("GET"))
        .and(path("/goals"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(auth_body("fresh", "ref-2")))
        .expect(1)
        .mount(&server)
        .await;

    let (client, store) = client_with_store(&server.uri());
    client.set_tokens("stale", "ref-1");

    let err = client.list_goals().await.unwrap_err();
    assert!(matches!(err, ClientError::SessionExpired));
    assert_eq!(store.access_token(), None);
}

#[tokio::test]
async fn transport_failure_maps_to_network_error() {
    // Nothing listens here; connection is refused
    let client = ApiClient::new("http://127.0.0.1:9");
    let err = client.list_goals().await.unwrap_err();
    assert!(matches!(err, ClientError::Network(_)));
}

#[tokio::test]
async fn other_statuses_pass_through_with_server_message() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/goals/metadata/categories"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(serde_json::json!({ "message": "Goal not found" })),
        )
        .mount(&server)
        .await;

    let (client, _store) = client_with_store(&server.uri());
    client.set_tokens("acc", "ref");

    let err = client.goal_categories().await.unwrap_err();
    assert_eq!(err.status(), Some(404));
    match err {
        ClientError::Api {
            status, message, ..
        } => {
            assert_eq!(status, 404);
            assert_eq!(message, "Goal not found");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn missing_server_message_falls_back_to_generic_text() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/goals"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let (client, _store) = client_with_store(&server.uri());
    let err = client.list_goals().await.unwrap_err();
    match err {
        ClientError::Api { message, .. } => {
            assert_eq!(message, "An unexpected error occurred");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn login_stores_the_issued_pair() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_string_contains("a@x.com"))
        .respond_with(ResponseTemplate::new(201).set_body_json(auth_body("acc", "ref")))
        .mount(&server)
        .await;

    let (client, store) = client_with_store(&server.uri());
    let user = client.login("a@x.com", "Pw1!pass").await.unwrap();
    assert_eq!(user.email, "a@x.com");
    assert_eq!(store.access_token().as_deref(), Some("acc"));
    assert_eq!(store.refresh_token().as_deref(), Some("ref"));
}

#[tokio::test]
async fn logout_rides_the_refresh_pipeline_like_any_other_request() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/logout"))
        .and(header("authorization", "Bearer stale"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(auth_body("fresh", "ref-2")))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/logout"))
        .and(header("authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let (client, store) = client_with_store(&server.uri());
    client.set_tokens("stale", "ref-1");

    client.logout().await;
    assert_eq!(store.access_token(), None);
    assert_eq!(store.refresh_token(), None);
}

#[tokio::test]
async fn logout_clears_tokens_even_when_the_server_fails() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/logout"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let (client, store) = client_with_store(&server.uri());
    client.set_tokens("acc", "ref");

    client.logout().await;
    assert_eq!(store.access_token(), None);
    assert_eq!(store.refresh_token(), None);
}
