//! Gateway behavior against a mock backend: bearer attachment, role-based
//! ticket scoping, and the single refresh-and-retry cycle.

use helpdesk_bot::api::{ApiClient, ApiError, CredentialStore, Role, TokenPair, UserProfile};
use helpdesk_bot::config::Settings;
use helpdesk_bot::notify::Strategy;
use httpmock::prelude::*;
use serde_json::json;
use std::sync::Arc;

fn settings_for(server: &MockServer) -> Settings {
    Settings {
        telegram_token: "dummy".to_string(),
        api_url: server.base_url(),
        api_ws_url: "ws://unused".to_string(),
        notify_strategy: Strategy::default(),
        poll_period_secs: 60,
        notify_window_secs: 60,
        http_timeout_secs: 5,
    }
}

async fn client_with(
    server: &MockServer,
    pair: Option<TokenPair>,
) -> (ApiClient, Arc<CredentialStore>) {
    let creds = Arc::new(CredentialStore::new());
    if let Some(pair) = pair {
        creds.store(pair).await;
    }
    let client = ApiClient::new(&settings_for(server), Arc::clone(&creds));
    (client, creds)
}

fn stale_pair() -> TokenPair {
    TokenPair {
        access: "stale".to_string(),
        refresh: "stale-r".to_string(),
    }
}

fn tickets_body() -> serde_json::Value {
    json!({
        "items": [{
            "id": 1,
            "title": "t",
            "description": "d",
            "createdAt": "2026-08-01T10:00:00Z",
            "updatedAt": "2026-08-01T10:00:00Z",
            "isDone": false
        }]
    })
}

#[tokio::test]
async fn unauthenticated_call_sends_literal_null_bearer() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/tickets")
                .header("authorization", "Bearer null");
            then.status(200).json_body(tickets_body());
        })
        .await;

    let (client, _) = client_with(&server, None).await;
    let viewer = UserProfile {
        id: 7,
        role: Role::Admin,
    };
    let tickets = client.list_tickets(&viewer).await.expect("fetch succeeds");

    assert_eq!(tickets.len(), 1);
    mock.assert_async().await;
}

#[tokio::test]
async fn admin_fetch_omits_user_id_filter() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/tickets")
                .query_param("includeDevice", "true")
                .query_param_missing("userId");
            then.status(200).json_body(tickets_body());
        })
        .await;

    let (client, _) = client_with(&server, Some(stale_pair())).await;
    let admin = UserProfile {
        id: 1,
        role: Role::Admin,
    };
    client.list_tickets(&admin).await.expect("fetch succeeds");

    mock.assert_async().await;
}

#[tokio::test]
async fn user_fetch_scopes_to_own_id() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/tickets")
                .query_param("userId", "7")
                .query_param("includeDevice", "true");
            then.status(200).json_body(tickets_body());
        })
        .await;

    let (client, _) = client_with(&server, Some(stale_pair())).await;
    let user = UserProfile {
        id: 7,
        role: Role::User,
    };
    client.list_tickets(&user).await.expect("fetch succeeds");

    mock.assert_async().await;
}

#[tokio::test]
async fn expired_token_is_refreshed_and_retried_once() {
    let server = MockServer::start_async().await;
    let rejected = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/tickets")
                .header("authorization", "Bearer stale");
            then.status(401).body("token expired");
        })
        .await;
    let refresh = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/auth/refresh")
                .json_body(json!({ "token": "stale", "refreshToken": "stale-r" }));
            then.status(200)
                .json_body(json!({ "token": "fresh", "refreshToken": "fresh-r" }));
        })
        .await;
    let retried = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/tickets")
                .header("authorization", "Bearer fresh");
            then.status(200).json_body(tickets_body());
        })
        .await;

    let (client, creds) = client_with(&server, Some(stale_pair())).await;
    let admin = UserProfile {
        id: 1,
        role: Role::Admin,
    };
    let tickets = client.list_tickets(&admin).await.expect("retry succeeds");

    assert_eq!(tickets.len(), 1);
    rejected.assert_async().await;
    refresh.assert_async().await;
    retried.assert_async().await;

    // The store now holds the refreshed pair.
    let current = creds.snapshot().await.expect("pair present");
    assert_eq!(current.access, "fresh");
    assert_eq!(current.refresh, "fresh-r");
}

#[tokio::test]
async fn failed_refresh_propagates_original_error() {
    let server = MockServer::start_async().await;
    let rejected = server
        .mock_async(|when, then| {
            when.method(GET).path("/tickets");
            then.status(401).body("token expired");
        })
        .await;
    let refresh = server
        .mock_async(|when, then| {
            when.method(POST).path("/auth/refresh");
            then.status(500).body("refresh backend down");
        })
        .await;

    let (client, _) = client_with(&server, Some(stale_pair())).await;
    let admin = UserProfile {
        id: 1,
        role: Role::Admin,
    };
    let err = client
        .list_tickets(&admin)
        .await
        .expect_err("call must fail");

    // The original 401 comes back, not the refresh failure.
    assert!(matches!(err, ApiError::Unauthorized(_)));
    assert!(err.to_string().contains("token expired"));
    // No second attempt after the failed refresh.
    rejected.assert_hits_async(1).await;
    refresh.assert_hits_async(1).await;
}

#[tokio::test]
async fn retry_is_attempted_at_most_once() {
    let server = MockServer::start_async().await;
    // Backend rejects every token, fresh or not.
    let always_rejected = server
        .mock_async(|when, then| {
            when.method(GET).path("/tickets");
            then.status(401).body("still unauthorized");
        })
        .await;
    let refresh = server
        .mock_async(|when, then| {
            when.method(POST).path("/auth/refresh");
            then.status(200)
                .json_body(json!({ "token": "fresh", "refreshToken": "fresh-r" }));
        })
        .await;

    let (client, _) = client_with(&server, Some(stale_pair())).await;
    let admin = UserProfile {
        id: 1,
        role: Role::Admin,
    };
    let err = client
        .list_tickets(&admin)
        .await
        .expect_err("call must fail");

    assert!(matches!(err, ApiError::Unauthorized(_)));
    // Original request plus exactly one retry; no loop.
    always_rejected.assert_hits_async(2).await;
    refresh.assert_hits_async(1).await;
}

#[tokio::test]
async fn missing_pair_skips_refresh_entirely() {
    let server = MockServer::start_async().await;
    let rejected = server
        .mock_async(|when, then| {
            when.method(GET).path("/tickets");
            then.status(401).body("no token");
        })
        .await;
    let refresh = server
        .mock_async(|when, then| {
            when.method(POST).path("/auth/refresh");
            then.status(200)
                .json_body(json!({ "token": "x", "refreshToken": "y" }));
        })
        .await;

    let (client, _) = client_with(&server, None).await;
    let admin = UserProfile {
        id: 1,
        role: Role::Admin,
    };
    let err = client
        .list_tickets(&admin)
        .await
        .expect_err("call must fail");

    assert!(matches!(err, ApiError::Unauthorized(_)));
    rejected.assert_hits_async(1).await;
    refresh.assert_hits_async(0).await;
}

#[tokio::test]
async fn login_stores_the_issued_pair() {
    let server = MockServer::start_async().await;
    let login = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/auth/login")
                .json_body(json!({ "email": "user@example.com", "password": "hunter2" }));
            then.status(200).json_body(json!({
                "user": { "id": 7, "role": "USER" },
                "token": "issued",
                "refreshToken": "issued-r"
            }));
        })
        .await;

    let (client, creds) = client_with(&server, None).await;
    let user = client
        .login("user@example.com", "hunter2")
        .await
        .expect("login succeeds");

    assert_eq!(user.id, 7);
    assert_eq!(user.role, Role::User);
    login.assert_async().await;

    let pair = creds.snapshot().await.expect("pair stored");
    assert_eq!(pair.access, "issued");
    assert_eq!(pair.refresh, "issued-r");
}

#[tokio::test]
async fn bad_credentials_surface_as_error_without_storing() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/auth/login");
            then.status(401).body("bad credentials");
        })
        .await;

    let (client, creds) = client_with(&server, None).await;
    let err = client
        .login("user@example.com", "wrong")
        .await
        .expect_err("login must fail");

    assert!(matches!(err, ApiError::Unauthorized(_)));
    assert!(creds.snapshot().await.is_none());
}
