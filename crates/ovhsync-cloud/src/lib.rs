//! Reconciliation core for OVH public cloud sub-resources
//!
//! This crate decides, per resource kind, whether moving the provider to a
//! declared desired state needs a create, a delete, or nothing at all, and
//! applies that decision through an `ApiClient`. Three kinds are covered:
//!
//! - Public cloud users (`user`)
//! - S3 credentials of a user (`s3_credentials`)
//! - Valkey database users (`valkey`)
//!
//! Every operation takes a `Mode`; under `Mode::DryRun` the client never
//! receives a mutating verb — deletes degrade to a GET that validates
//! addressability, creates are skipped entirely. Results come back as an
//! `Ensured` record (`changed`, `simulated`, payload, message).
//!
//! The core is deliberately stateless: remote state is fetched fresh on
//! every call, nothing is cached between invocations, and no retries or
//! timeouts are applied here. Polling a freshly created user until its
//! status turns `ok` is the caller's job.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use ovhsync_api::{RestClient, RestConfig};
//! use ovhsync_cloud::{Mode, Presence, ValkeyUserSpec, ValkeyUsers};
//!
//! let client = Arc::new(RestClient::new(RestConfig::from_env()?));
//! let users = ValkeyUsers::new(client, "projA", "c1");
//!
//! let spec = ValkeyUserSpec::named("alice");
//! let result = users.ensure(&spec, Presence::Present, Mode::DryRun).await?;
//! println!("changed: {}", result.changed);
//! ```

pub mod error;
pub mod reconcile;
pub mod s3_credentials;
pub mod user;
pub mod valkey;

pub use error::{CloudError, Result};
pub use reconcile::{DRY_RUN_SUFFIX, Ensured, Mode, Presence};
pub use s3_credentials::{S3Credential, S3Credentials};
pub use user::{PublicCloudUsers, User, UserSpec, UserStatus};
pub use valkey::{ValkeyUser, ValkeyUserSpec, ValkeyUsers};
