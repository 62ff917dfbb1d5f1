//! Valkey database user reconciliation
//!
//! Unlike public cloud users, Valkey users carry a caller-chosen username,
//! so a present-ensure can be made idempotent: the collection is scanned
//! for a username match before creating. The provider offers no lookup
//! keyed by username — only a list of opaque ids — so the scan is one GET
//! on the collection plus one GET per id, short-circuiting on the first
//! match. The scan is read-only and runs under dry-run as well.

use crate::error::{CloudError, Result};
use crate::reconcile::{self, Ensured, Mode, Presence};
use ovhsync_api::{ApiClient, Verb};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;

/// Desired state of a Valkey user, ACL rule sets included.
#[derive(Debug, Clone, Default)]
pub struct ValkeyUserSpec {
    /// Username, the natural key the resolver matches on.
    pub name: String,
    pub categories: Vec<String>,
    pub commands: Vec<String>,
    pub keys: Vec<String>,
    pub channels: Vec<String>,
    /// Provider-assigned id. Required for `Presence::Absent`.
    pub user_id: Option<String>,
}

impl ValkeyUserSpec {
    /// Spec with the given username and empty ACL rule sets.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// A Valkey user as the provider reports it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValkeyUser {
    pub id: String,
    pub username: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Operations on the users of one Valkey cluster.
pub struct ValkeyUsers {
    client: Arc<dyn ApiClient>,
    service_name: String,
    cluster_id: String,
}

impl ValkeyUsers {
    pub fn new(
        client: Arc<dyn ApiClient>,
        service_name: impl Into<String>,
        cluster_id: impl Into<String>,
    ) -> Self {
        Self {
            client,
            service_name: service_name.into(),
            cluster_id: cluster_id.into(),
        }
    }

    fn collection_path(&self) -> String {
        format!(
            "/cloud/project/{}/database/valkey/{}/user",
            self.service_name, self.cluster_id
        )
    }

    fn user_path(&self, user_id: &str) -> String {
        format!("{}/{}", self.collection_path(), user_id)
    }

    /// List the ids of every user attached to the cluster.
    pub async fn list_ids(&self) -> Result<Vec<String>> {
        let value = self
            .client
            .call(Verb::Get, &self.collection_path(), None)
            .await?;
        let ids = serde_json::from_value(value).map_err(ovhsync_api::ApiError::from)?;
        Ok(ids)
    }

    /// Fetch one user by its provider-assigned id.
    pub async fn get(&self, user_id: &str) -> Result<ValkeyUser> {
        let value = self
            .client
            .call(Verb::Get, &self.user_path(user_id), None)
            .await?;
        let user = serde_json::from_value(value).map_err(ovhsync_api::ApiError::from)?;
        Ok(user)
    }

    /// Resolve a username to an existing user, or `None`.
    ///
    /// O(n) in collection size; stops at the first match. A fault on any
    /// describe aborts the whole lookup rather than returning a partial
    /// answer.
    pub async fn find_by_name(&self, name: &str) -> Result<Option<ValkeyUser>> {
        for user_id in self.list_ids().await? {
            let user = self.get(&user_id).await?;
            if user.username == name {
                tracing::debug!("Valkey user {} resolved to id {}", name, user.id);
                return Ok(Some(user));
            }
        }
        Ok(None)
    }

    /// Reconcile one user toward the desired presence.
    pub async fn ensure(
        &self,
        spec: &ValkeyUserSpec,
        presence: Presence,
        mode: Mode,
    ) -> Result<Ensured> {
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

    /// Create the user unless one with the same username already exists.
    pub async fn ensure_present(&self, spec: &ValkeyUserSpec, mode: Mode) -> Result<Ensured> {
        if let Some(existing) = self.find_by_name(&spec.name).await? {
            tracing::debug!("Valkey user {} already exists", spec.name);
            let payload = serde_json::to_value(&existing).map_err(ovhsync_api::ApiError::from)?;
            return Ok(Ensured::unchanged_with(payload, "Valkey user already exists"));
        }

        let body = json!({
            "name": spec.name,
            "categories": spec.categories,
            "commands": spec.commands,
            "keys": spec.keys,
            "channels": spec.channels,
        });

        reconcile::ensure_created(
            self.client.as_ref(),
            &self.collection_path(),
            Some(body),
            mode,
            "Valkey user created",
        )
        .await
    }

    /// Delete the user with the given id, if it exists. No username scan is
    /// done for deletion; the caller supplies the exact id.
    pub async fn ensure_absent(&self, user_id: &str, mode: Mode) -> Result<Ensured> {
        reconcile::ensure_deleted(
            self.client.as_ref(),
            &self.user_path(user_id),
            mode,
            &format!("Valkey user {user_id} was deleted"),
        )
        .await
    }
}
