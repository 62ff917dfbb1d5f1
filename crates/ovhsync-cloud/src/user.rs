//! Public cloud user reconciliation
//!
//! Users carry no caller-chosen natural key (the provider generates the
//! username), so there is nothing to match an existing user against:
//! every present-ensure that is applied performs a create. Re-running the
//! same spec creates a second user; deduplication is the caller's problem.
//! Deletion addresses the user by its provider-assigned id.
//!
//! Creation is asynchronous on the provider side: the returned user starts
//! in status `creating`. The core reports the state as observed; callers
//! that need a usable user poll `get` until the status turns `ok`.

use crate::error::{CloudError, Result};
use crate::reconcile::{self, Ensured, Mode, Presence};
use ovhsync_api::{ApiClient, Verb};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;

/// Desired state of a public cloud user.
#[derive(Debug, Clone, Default)]
pub struct UserSpec {
    /// Single role to assign on creation.
    pub role: Option<String>,
    /// Multiple roles to assign on creation.
    pub roles: Option<Vec<String>>,
    pub description: Option<String>,
    /// Provider-assigned id. Required for `Presence::Absent`; ignored on
    /// creation (the provider assigns one).
    pub user_id: Option<String>,
}

/// Provider-side lifecycle status of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Creating,
    Ok,
    Deleting,
    Deleted,
}

impl UserStatus {
    /// True once provider-side creation has completed.
    pub fn is_ready(self) -> bool {
        matches!(self, UserStatus::Ok)
    }
}

/// A public cloud user as the provider reports it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: u64,
    pub username: String,
    pub status: UserStatus,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub creation_date: Option<String>,
    #[serde(default)]
    pub openstack_id: Option<String>,
    /// Remaining attributes (roles, one-time password, ...) passed through
    /// untyped.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Operations on the users of one public cloud project.
pub struct PublicCloudUsers {
    client: Arc<dyn ApiClient>,
    service_name: String,
}

impl PublicCloudUsers {
    pub fn new(client: Arc<dyn ApiClient>, service_name: impl Into<String>) -> Self {
        Self {
            client,
            service_name: service_name.into(),
        }
    }

    fn collection_path(&self) -> String {
        format!("/cloud/project/{}/user", self.service_name)
    }

    fn user_path(&self, user_id: &str) -> String {
        format!("/cloud/project/{}/user/{}", self.service_name, user_id)
    }

    /// Reconcile one user toward the desired presence.
    pub async fn ensure(&self, spec: &UserSpec, presence: Presence, mode: Mode) -> Result<Ensured> {
        match presence {
            Presence::Absent => {
                let user_id = spec
                    .user_id
                    .as_deref()
                    .ok_or(CloudError::MissingField("user_id"))?;
                self.ensure_absent(user_id, mode).await
            }
            Presence::Present => self.ensure_present(spec, mode).await,
        }
    }

    /// Unconditionally create a user with the spec's attributes.
    pub async fn ensure_present(&self, spec: &UserSpec, mode: Mode) -> Result<Ensured> {
        let mut body = serde_json::Map::new();
        if let Some(role) = &spec.role {
            body.insert("role".to_string(), json!(role));
        }
        if let Some(roles) = &spec.roles {
            body.insert("roles".to_string(), json!(roles));
        }
        if let Some(description) = &spec.description {
            body.insert("description".to_string(), json!(description));
        }

        reconcile::ensure_created(
            self.client.as_ref(),
            &self.collection_path(),
            Some(Value::Object(body)),
            mode,
            "User was created on OVH public cloud",
        )
        .await
    }

    /// Delete the user with the given id, if it exists.
    pub async fn ensure_absent(&self, user_id: &str, mode: Mode) -> Result<Ensured> {
        reconcile::ensure_deleted(
            self.client.as_ref(),
            &self.user_path(user_id),
            mode,
            &format!("User {user_id} was deleted from OVH public cloud"),
        )
        .await
    }

    /// Fetch one user, typed, for status polling.
    pub async fn get(&self, user_id: &str) -> Result<User> {
        let value = self
            .client
            .call(Verb::Get, &self.user_path(user_id), None)
            .await?;
        let user = serde_json::from_value(value).map_err(ovhsync_api::ApiError::from)?;
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::DRY_RUN_SUFFIX;
    use ovhsync_api::MockClient;
    use serde_json::json;

    fn users(mock: MockClient) -> (Arc<MockClient>, PublicCloudUsers) {
        let mock = Arc::new(mock);
        let users = PublicCloudUsers::new(Arc::clone(&mock) as Arc<dyn ApiClient>, "projA");
        (mock, users)
    }

    #[tokio::test]
    async fn test_absent_nonexistent_user_is_unchanged() {
        // No such id on the provider side; both modes must report no change.
        for mode in [Mode::Apply, Mode::DryRun] {
            let (mock, users) = users(MockClient::new());
            let spec = UserSpec {
                user_id: Some("599859".to_string()),
                ..Default::default()
            };
            let result = users.ensure(&spec, Presence::Absent, mode).await.unwrap();
            assert!(!result.changed, "mode {mode:?}");
            let expected = if mode.is_dry_run() { Verb::Get } else { Verb::Delete };
            assert_eq!(mock.calls()[0].verb, expected);
            assert_eq!(mock.calls()[0].path, "/cloud/project/projA/user/599859");
        }
    }

    #[tokio::test]
    async fn test_absent_existing_user_is_deleted() {
        let (mock, users) = users(
            MockClient::new()
                .route(Verb::Get, "/cloud/project/projA/user/599859", json!({"id": 599859}))
                .route(Verb::Delete, "/cloud/project/projA/user/599859", Value::Null),
        );
        let spec = UserSpec {
            user_id: Some("599859".to_string()),
            ..Default::default()
        };

        let result = users.ensure(&spec, Presence::Absent, Mode::Apply).await.unwrap();
        assert!(result.changed);

        // A second lookup observes the deletion.
        let err = users.get("599859").await.unwrap_err();
        assert!(matches!(
            err,
            CloudError::Api(ovhsync_api::ApiError::NotFound { .. })
        ));
        assert_eq!(mock.count(Verb::Delete), 1);
    }

    #[tokio::test]
    async fn test_absent_dry_run_leaves_user_in_place() {
        let (mock, users) = users(
            MockClient::new()
                .route(Verb::Get, "/cloud/project/projA/user/599859", json!({"id": 599859}))
                .route(Verb::Delete, "/cloud/project/projA/user/599859", Value::Null),
        );
        let spec = UserSpec {
            user_id: Some("599859".to_string()),
            ..Default::default()
        };

        let result = users.ensure(&spec, Presence::Absent, Mode::DryRun).await.unwrap();
        assert!(result.changed);
        assert!(result.simulated);
        assert_eq!(mock.mutating_calls(), 0);

        // Resource still there afterwards.
        let user_value = mock
            .call(Verb::Get, "/cloud/project/projA/user/599859", None)
            .await
            .unwrap();
        assert_eq!(user_value, json!({"id": 599859}));
    }

    #[tokio::test]
    async fn test_absent_without_user_id_is_rejected_before_any_call() {
        let (mock, users) = users(MockClient::new());
        let err = users
            .ensure(&UserSpec::default(), Presence::Absent, Mode::Apply)
            .await
            .unwrap_err();
        assert!(matches!(err, CloudError::MissingField("user_id")));
        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn test_present_creates_unconditionally() {
        // Documented non-idempotence: with no natural key to match, two
        // identical present-ensures are two creates, not a convergence.
        let (mock, users) = users(
            MockClient::new().route(
                Verb::Post,
                "/cloud/project/projA/user",
                json!({"id": 1, "username": "user-wKbTguqcnX4Z", "status": "creating"}),
            ),
        );
        let spec = UserSpec {
            description: Some("test-user".to_string()),
            ..Default::default()
        };

        let first = users.ensure(&spec, Presence::Present, Mode::Apply).await.unwrap();
        let second = users.ensure(&spec, Presence::Present, Mode::Apply).await.unwrap();

        assert!(first.changed && second.changed);
        assert_eq!(mock.count(Verb::Post), 2);
        assert_eq!(
            first.message.as_deref(),
            Some("User was created on OVH public cloud")
        );
    }

    #[tokio::test]
    async fn test_present_body_omits_unset_attributes() {
        let (mock, users) = users(
            MockClient::new().route(Verb::Post, "/cloud/project/projA/user", json!({"id": 1})),
        );
        let spec = UserSpec {
            role: Some("admin".to_string()),
            ..Default::default()
        };

        users.ensure(&spec, Presence::Present, Mode::Apply).await.unwrap();
        assert_eq!(mock.calls()[0].body, Some(json!({"role": "admin"})));
    }

    #[tokio::test]
    async fn test_present_dry_run_never_posts() {
        let (mock, users) = users(MockClient::new());
        let result = users
            .ensure(&UserSpec::default(), Presence::Present, Mode::DryRun)
            .await
            .unwrap();

        assert!(result.changed);
        assert!(result.simulated);
        assert!(result.payload.is_none());
        assert!(mock.calls().is_empty());
        assert_eq!(
            result.message.as_deref(),
            Some(&format!("User was created on OVH public cloud{DRY_RUN_SUFFIX}")[..])
        );
    }

    #[tokio::test]
    async fn test_get_parses_status() {
        let (_mock, users) = users(MockClient::new().route(
            Verb::Get,
            "/cloud/project/projA/user/599859",
            json!({
                "id": 599859,
                "username": "user-wKbTguqcnX4Z",
                "status": "creating",
                "description": "test-user",
                "creationDate": "2025-12-15T14:30:47.592Z",
                "openstackId": "xxx",
                "roles": []
            }),
        ));

        let user = users.get("599859").await.unwrap();
        assert_eq!(user.id, 599859);
        assert_eq!(user.status, UserStatus::Creating);
        assert!(!user.status.is_ready());
        assert!(user.extra.contains_key("roles"));
    }
}
