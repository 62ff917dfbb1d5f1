//! End-to-end reconciliation scenarios against the recording mock

use ovhsync_cloud::{
    Mode, Presence, PublicCloudUsers, S3Credentials, UserSpec, ValkeyUserSpec, ValkeyUsers,
};
use ovhsync_api::{ApiClient, MockClient, Verb};
use serde_json::{Value, json};
use std::sync::Arc;

/// Deleting a user id the provider never heard of is a clean no-op in both
/// modes, and the verb actually issued matches the mode.
#[tokio::test]
async fn test_absent_unknown_user_is_noop_in_both_modes() {
    for (mode, expected_verb) in [(Mode::Apply, Verb::Delete), (Mode::DryRun, Verb::Get)] {
        let mock = Arc::new(MockClient::new());
        let users = PublicCloudUsers::new(Arc::clone(&mock) as Arc<dyn ApiClient>, "projA");
        let spec = UserSpec {
            user_id: Some("599859".to_string()),
            ..Default::default()
        };

        let result = users.ensure(&spec, Presence::Absent, mode).await.unwrap();

        assert!(!result.changed);
        let calls = mock.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].verb, expected_verb);
        assert_eq!(calls[0].path, "/cloud/project/projA/user/599859");
    }
}

/// A username match found by the collection scan short-circuits the create.
#[tokio::test]
async fn test_valkey_present_with_scan_match_issues_no_post() {
    let collection = "/cloud/project/projA/database/valkey/c1/user";
    let mock = Arc::new(
        MockClient::new()
            .route(Verb::Get, collection, json!(["u-1"]))
            .route(
                Verb::Get,
                format!("{collection}/u-1"),
                json!({"id": "u-1", "username": "alice"}),
            ),
    );
    let users = ValkeyUsers::new(Arc::clone(&mock) as Arc<dyn ApiClient>, "projA", "c1");

    let result = users
        .ensure(&ValkeyUserSpec::named("alice"), Presence::Present, Mode::Apply)
        .await
        .unwrap();

    assert!(!result.changed);
    assert_eq!(result.payload.unwrap()["id"], json!("u-1"));
    assert_eq!(mock.count(Verb::Post), 0);
}

/// Under dry-run, no mutating verb ever reaches the client, across every
/// resource kind.
#[tokio::test]
async fn test_dry_run_never_mutates_any_kind() {
    let mock = Arc::new(
        MockClient::new()
            .route(Verb::Get, "/cloud/project/projA/user/1", json!({"id": 1}))
            .route(
                Verb::Get,
                "/cloud/project/projA/database/valkey/c1/user",
                json!([]),
            ),
    );
    let client = Arc::clone(&mock) as Arc<dyn ApiClient>;

    let users = PublicCloudUsers::new(Arc::clone(&client), "projA");
    let delete_spec = UserSpec {
        user_id: Some("1".to_string()),
        ..Default::default()
    };
    users.ensure(&delete_spec, Presence::Absent, Mode::DryRun).await.unwrap();
    users.ensure(&UserSpec::default(), Presence::Present, Mode::DryRun).await.unwrap();

    let credentials = S3Credentials::new(Arc::clone(&client), "projA", "1");
    credentials.ensure(None, Presence::Present, Mode::DryRun).await.unwrap();
    credentials
        .ensure(Some("k"), Presence::Absent, Mode::DryRun)
        .await
        .unwrap();

    let valkey = ValkeyUsers::new(Arc::clone(&client), "projA", "c1");
    valkey
        .ensure(&ValkeyUserSpec::named("alice"), Presence::Present, Mode::DryRun)
        .await
        .unwrap();

    assert_eq!(mock.mutating_calls(), 0);
}

/// Applied deletion is observable through the provider afterwards.
#[tokio::test]
async fn test_apply_delete_then_lookup_is_not_found() {
    let path = "/cloud/project/projA/user/599859";
    let mock = Arc::new(
        MockClient::new()
            .route(Verb::Get, path, json!({"id": 599859}))
            .route(Verb::Delete, path, Value::Null),
    );
    let users = PublicCloudUsers::new(Arc::clone(&mock) as Arc<dyn ApiClient>, "projA");
    let spec = UserSpec {
        user_id: Some("599859".to_string()),
        ..Default::default()
    };

    let result = users.ensure(&spec, Presence::Absent, Mode::Apply).await.unwrap();
    assert!(result.changed);
    assert!(users.get("599859").await.is_err());
}
