//! S3 credential reconciliation for a public cloud user
//!
//! Credentials are generated server-side, so as with users there is no
//! attribute to pre-match against: an applied present-ensure always mints a
//! new credential pair. Deletion addresses a credential by its access key,
//! nested under the owning user.

use crate::error::{CloudError, Result};
use crate::reconcile::{self, Ensured, Mode, Presence};
use ovhsync_api::{ApiClient, Verb};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One S3 credential pair. `secret` is only disclosed in the creation
/// response; list/describe responses omit it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct S3Credential {
    pub access: String,
    pub tenant_id: String,
    pub user_id: String,
    #[serde(default)]
    pub secret: Option<String>,
}

/// Operations on the S3 credentials of one public cloud user.
pub struct S3Credentials {
    client: Arc<dyn ApiClient>,
    service_name: String,
    user_id: String,
}

impl S3Credentials {
    pub fn new(
        client: Arc<dyn ApiClient>,
        service_name: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            client,
            service_name: service_name.into(),
            user_id: user_id.into(),
        }
    }

    fn collection_path(&self) -> String {
        format!(
            "/cloud/project/{}/user/{}/s3Credentials",
            self.service_name, self.user_id
        )
    }

    fn credential_path(&self, access: &str) -> String {
        format!("{}/{}", self.collection_path(), access)
    }

    /// Reconcile toward the desired presence. `access` addresses the
    /// credential to delete; it is required for `Presence::Absent` and
    /// ignored on creation (the provider mints the key pair).
    pub async fn ensure(
        &self,
        access: Option<&str>,
        presence: Presence,
        mode: Mode,
    ) -> Result<Ensured> {
        match presence {
            Presence::Absent => {
                let access = access.ok_or(CloudError::MissingField("access"))?;
                self.ensure_absent(access, mode).await
            }
            Presence::Present => self.ensure_present(mode).await,
        }
    }

    /// Mint a new credential pair for the user.
    pub async fn ensure_present(&self, mode: Mode) -> Result<Ensured> {
        reconcile::ensure_created(
            self.client.as_ref(),
            &self.collection_path(),
            None,
            mode,
            "Credentials were created on OVH public cloud",
        )
        .await
    }

    /// Delete the credential with the given access key, if it exists.
    pub async fn ensure_absent(&self, access: &str, mode: Mode) -> Result<Ensured> {
        reconcile::ensure_deleted(
            self.client.as_ref(),
            &self.credential_path(access),
            mode,
            &format!("Credentials {access} were deleted from OVH public cloud"),
        )
        .await
    }

    /// List the user's credentials. Secrets are not included.
    pub async fn list(&self) -> Result<Vec<S3Credential>> {
        let value = self
            .client
            .call(Verb::Get, &self.collection_path(), None)
            .await?;
        let credentials = serde_json::from_value(value).map_err(ovhsync_api::ApiError::from)?;
        Ok(credentials)
    }
}
