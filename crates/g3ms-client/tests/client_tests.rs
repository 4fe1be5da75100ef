//! Client integration tests.
//!
//! Covers: client creation, URL building, options, error mapping,
//! token persistence, and wire-type serde. No network calls.

use std::sync::Arc;

use g3ms_client::*;
use g3ms_core::storage::MemoryStore;
use serde_json::json;

fn client() -> G3msClient {
    G3msClient::new(
        ClientOptions {
            base_url: "https://api.g3ms.co".into(),
            ..Default::default()
        },
        Arc::new(MemoryStore::new()),
    )
}

// ── Options ─────────────────────────────────────────────────────

#[test]
fn options_defaults() {
    let opts = ClientOptions::default();
    assert_eq!(opts.base_path, "/api/v1");
    assert_eq!(opts.timeout_secs, 30);
    assert!(opts.base_url.is_empty());
}

#[test]
fn custom_base_path() {
    let client = G3msClient::new(
        ClientOptions {
            base_url: "https://staging.g3ms.co".into(),
            base_path: "/api/v2".into(),
            ..Default::default()
        },
        Arc::new(MemoryStore::new()),
    );
    assert_eq!(client.base_url(), "https://staging.g3ms.co/api/v2");
}

#[test]
fn trailing_slash_normalized() {
    let client = G3msClient::new(
        ClientOptions {
            base_url: "https://api.g3ms.co/".into(),
            ..Default::default()
        },
        Arc::new(MemoryStore::new()),
    );
    assert!(!client.base_url().contains("//api/v1"));
}

#[test]
fn client_debug_omits_tokens() {
    let debug = format!("{:?}", client());
    assert!(debug.contains("G3msClient"));
    assert!(!debug.contains("access_token"));
}

// ── Token manager ───────────────────────────────────────────────

#[tokio::test]
async fn tokens_survive_across_client_clones() {
    let client = client();
    client
        .tokens()
        .set_tokens(&TokenPair {
            access_token: "at".into(),
            refresh_token: "rt".into(),
        })
        .await
        .unwrap();

    let clone = client.clone();
    assert_eq!(clone.tokens().access_token().await, Some("at".to_string()));
}

#[tokio::test]
async fn csrf_token_is_stable_hex() {
    let client = client();
    let token = client.tokens().ensure_csrf_token().await;
    assert_eq!(token.len(), 64);
    assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    assert_eq!(client.tokens().ensure_csrf_token().await, token);
}

#[tokio::test]
async fn clear_twice_never_fails() {
    let client = client();
    client.tokens().clear().await;
    client.tokens().clear().await;
    assert_eq!(client.tokens().access_token().await, None);
}

// ── Error taxonomy ──────────────────────────────────────────────

#[test]
fn error_variants_carry_status() {
    let cases: Vec<(ClientError, u16)> = vec![
        (
            ClientError::BadRequest {
                code: "X".into(),
                message: "Y".into(),
            },
            400,
        ),
        (
            ClientError::Unauthorized {
                code: "X".into(),
                message: "Y".into(),
            },
            401,
        ),
        (
            ClientError::Conflict {
                code: "X".into(),
                message: "Y".into(),
            },
            409,
        ),
        (
            ClientError::Gone {
                code: "X".into(),
                message: "Y".into(),
            },
            410,
        ),
        (
            ClientError::UnprocessableEntity {
                code: "X".into(),
                message: "Y".into(),
            },
            422,
        ),
        (ClientError::TooManyRequests { message: "Y".into() }, 429),
        (ClientError::BadGateway { message: "Y".into() }, 502),
    ];
    for (err, status) in cases {
        assert_eq!(err.status(), Some(status), "{err}");
    }
    assert_eq!(ClientError::Network("down".into()).status(), None);
}

#[test]
fn error_display_includes_code_and_message() {
    let err = ClientError::Conflict {
        code: "PHONE_IN_USE".into(),
        message: "Phone number already registered".into(),
    };
    let display = err.to_string();
    assert!(display.contains("PHONE_IN_USE"));
    assert!(display.contains("already registered"));
}

#[test]
fn unauthorized_predicate() {
    let err = ClientError::Unauthorized {
        code: "UNAUTHORIZED".into(),
        message: "expired".into(),
    };
    assert!(err.is_unauthorized());
    assert!(!err.is_rate_limited());
}

// ── Wire types ──────────────────────────────────────────────────

#[test]
fn onboarding_status_deserializes() {
    let status: OnboardingStatus =
        serde_json::from_value(json!({"state": "PENDING_ROLE"})).unwrap();
    assert_eq!(status.state, OnboardingState::PendingRole);
}

#[test]
fn onboarding_status_tolerates_new_states() {
    let status: OnboardingStatus =
        serde_json::from_value(json!({"state": "PENDING_FUTURE_THING"})).unwrap();
    assert_eq!(status.state, OnboardingState::Unknown);
}

#[test]
fn auth_response_roundtrip() {
    let resp: AuthResponse = serde_json::from_value(json!({
        "user": {"id": "u1", "email": "a@b.com", "role": "brand"},
        "accessToken": "at",
        "refreshToken": "rt"
    }))
    .unwrap();
    assert_eq!(resp.user.role, Some(UserRole::Brand));
    assert_eq!(resp.access_token, "at");
}

#[test]
fn refresh_response_without_rotation() {
    let resp: RefreshResponse =
        serde_json::from_value(json!({"accessToken": "new"})).unwrap();
    assert_eq!(resp.access_token, "new");
    assert!(resp.refresh_token.is_none());
}

#[test]
fn drop_listing_tolerates_extra_fields() {
    let drops: Vec<Drop> = serde_json::from_value(json!([
        {"id": "d1", "title": "Fractions", "status": "draft", "views": 12},
        {"id": "d2", "title": "Decimals"}
    ]))
    .unwrap();
    assert_eq!(drops.len(), 2);
    assert_eq!(drops[0].extra["views"], 12);
    assert!(drops[1].status.is_none());
}
