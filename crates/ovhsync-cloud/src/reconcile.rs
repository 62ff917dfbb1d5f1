//! Reconciliation primitives shared by all resource kinds
//!
//! `Mode` selects between applying mutations and simulating them; `Ensured`
//! is the single result record every ensure operation produces. The two
//! helpers at the bottom are the whole present/absent decision engine for
//! resources addressed by an exact path — the per-kind modules add only
//! path construction, input validation, and (for Valkey) the natural-key
//! scan in front of them.

use crate::error::Result;
use ovhsync_api::{ApiClient, Verb};
use serde::Serialize;
use serde_json::Value;

/// Appended to the message of every simulated mutation. Existing callers
/// key on this exact string, so it is part of the result contract.
pub const DRY_RUN_SUFFIX: &str = " - (dry run mode)";

/// Desired presence of a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Presence {
    Present,
    Absent,
}

impl std::fmt::Display for Presence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Presence::Present => write!(f, "present"),
            Presence::Absent => write!(f, "absent"),
        }
    }
}

/// Execution mode for a reconciliation.
///
/// Under `DryRun` no mutating verb ever reaches the API client: deletes are
/// replaced by a GET on the same path, creates are not issued at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Apply,
    DryRun,
}

impl Mode {
    pub fn is_dry_run(self) -> bool {
        matches!(self, Mode::DryRun)
    }
}

/// Outcome of one reconciliation.
///
/// `changed = false` only when the remote state already matched the desired
/// state. `simulated = true` only under dry-run, and then `message` carries
/// the `" - (dry run mode)"` suffix.
#[derive(Debug, Clone, Serialize)]
pub struct Ensured {
    pub changed: bool,
    pub simulated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    #[serde(rename = "msg", skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Ensured {
    /// Remote state already matched; nothing was done.
    pub fn unchanged() -> Self {
        Self {
            changed: false,
            simulated: false,
            payload: None,
            message: None,
        }
    }

    /// Remote state already matched; report the matching resource.
    pub fn unchanged_with(payload: Value, message: impl Into<String>) -> Self {
        Self {
            changed: false,
            simulated: false,
            payload: Some(payload),
            message: Some(message.into()),
        }
    }

    /// A mutation was applied.
    pub fn changed(message: impl Into<String>) -> Self {
        Self {
            changed: true,
            simulated: false,
            payload: None,
            message: Some(message.into()),
        }
    }

    /// A mutation was applied; report the resulting resource.
    pub fn changed_with(payload: Value, message: impl Into<String>) -> Self {
        Self {
            changed: true,
            simulated: false,
            payload: Some(payload),
            message: Some(message.into()),
        }
    }

    /// A mutation would have been applied, but dry-run withheld it.
    /// No payload: the shape of the would-be resource is not knowable
    /// without calling the API.
    pub fn simulated(message: impl Into<String>) -> Self {
        Self {
            changed: true,
            simulated: true,
            payload: None,
            message: Some(format!("{}{}", message.into(), DRY_RUN_SUFFIX)),
        }
    }
}

/// Ensure the resource at `path` is gone.
///
/// Dry-run issues a GET in place of the DELETE, purely to validate that the
/// resource is addressable; a successful GET still reports `changed = true`.
/// A 404 on either verb is the already-absent outcome. Any other fault
/// propagates untouched.
pub(crate) async fn ensure_deleted(
    client: &dyn ApiClient,
    path: &str,
    mode: Mode,
    message: &str,
) -> Result<Ensured> {
    let verb = if mode.is_dry_run() {
        Verb::Get
    } else {
        Verb::Delete
    };

    match client.call(verb, path, None).await {
        Ok(_) => {
            if mode.is_dry_run() {
                tracing::info!("{} (dry run)", message);
                Ok(Ensured::simulated(message))
            } else {
                tracing::info!("{}", message);
                Ok(Ensured::changed(message))
            }
        }
        Err(e) if e.is_not_found() => {
            tracing::debug!("resource not found, nothing to delete: {}", path);
            Ok(Ensured::unchanged())
        }
        Err(e) => Err(e.into()),
    }
}

/// Ensure a resource is created at `path` with `body`.
///
/// Unconditional: callers that can detect an already-matching resource do
/// so before calling this. Dry-run skips the POST entirely and reports a
/// simulated change with no payload.
pub(crate) async fn ensure_created(
    client: &dyn ApiClient,
    path: &str,
    body: Option<Value>,
    mode: Mode,
    message: &str,
) -> Result<Ensured> {
    if mode.is_dry_run() {
        tracing::info!("{} (dry run)", message);
        return Ok(Ensured::simulated(message));
    }

    let payload = client.call(Verb::Post, path, body).await?;
    tracing::info!("{}", message);
    Ok(Ensured::changed_with(payload, message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ovhsync_api::MockClient;
    use serde_json::json;

    #[tokio::test]
    async fn test_delete_missing_resource_is_unchanged() {
        let mock = MockClient::new();
        let result = ensure_deleted(&mock, "/r/1", Mode::Apply, "deleted")
            .await
            .unwrap();
        assert!(!result.changed);
        assert!(!result.simulated);
    }

    #[tokio::test]
    async fn test_dry_run_delete_substitutes_get() {
        let mock = MockClient::new().route(Verb::Get, "/r/1", json!({"id": 1}));
        let result = ensure_deleted(&mock, "/r/1", Mode::DryRun, "r 1 deleted")
            .await
            .unwrap();

        assert!(result.changed);
        assert!(result.simulated);
        assert_eq!(mock.mutating_calls(), 0);
        assert!(result.message.unwrap().ends_with(DRY_RUN_SUFFIX));
    }

    #[tokio::test]
    async fn test_apply_delete_issues_delete() {
        let mock = MockClient::new().route(Verb::Delete, "/r/1", serde_json::Value::Null);
        let result = ensure_deleted(&mock, "/r/1", Mode::Apply, "r 1 deleted")
            .await
            .unwrap();

        assert!(result.changed);
        assert!(!result.simulated);
        assert_eq!(mock.count(Verb::Delete), 1);
    }

    #[tokio::test]
    async fn test_remote_fault_propagates() {
        let mock = MockClient::new().fail(Verb::Delete, "/r/1", 500, "boom");
        let err = ensure_deleted(&mock, "/r/1", Mode::Apply, "r 1 deleted")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            crate::CloudError::Api(ovhsync_api::ApiError::Remote { status: 500, .. })
        ));
    }

    #[tokio::test]
    async fn test_dry_run_create_issues_nothing() {
        let mock = MockClient::new();
        let result = ensure_created(&mock, "/r", None, Mode::DryRun, "r created")
            .await
            .unwrap();

        assert!(result.changed);
        assert!(result.simulated);
        assert!(result.payload.is_none());
        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn test_apply_create_returns_payload() {
        let mock = MockClient::new().route(Verb::Post, "/r", json!({"id": 7}));
        let result = ensure_created(&mock, "/r", Some(json!({"a": 1})), Mode::Apply, "r created")
            .await
            .unwrap();

        assert!(result.changed);
        assert_eq!(result.payload, Some(json!({"id": 7})));
        assert_eq!(mock.calls()[0].body, Some(json!({"a": 1})));
    }
}
