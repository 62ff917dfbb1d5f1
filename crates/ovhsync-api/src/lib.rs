//! OVH control-plane API client boundary for ovhsync
//!
//! This crate defines the `ApiClient` trait that the reconciliation core
//! calls through, plus two implementations:
//!
//! - `RestClient`: a thin reqwest-based client for the OVH REST API
//! - `MockClient`: an in-memory client with canned routes and a call log,
//!   for tests and for callers embedding the library in their own tests
//!
//! The trait contract is deliberately narrow: one HTTP call in, one decoded
//! JSON body out. A 404 response becomes `ApiError::NotFound`; any other
//! non-2xx becomes `ApiError::Remote`. Request signing is not implemented
//! here — callers that need the OVH signature scheme plug in their own
//! `ApiClient`.
//!
//! # Example
//!
//! ```ignore
//! use ovhsync_api::{ApiClient, RestClient, RestConfig, Verb};
//!
//! let client = RestClient::new(RestConfig::from_env()?);
//! let user = client.call(Verb::Get, "/cloud/project/projA/user/599859", None).await?;
//! ```

pub mod client;
pub mod error;
pub mod mock;

pub use client::{ApiClient, RestClient, RestConfig, Verb};
pub use error::{ApiError, Result};
pub use mock::{MockClient, RecordedCall};
