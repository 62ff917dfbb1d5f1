//! In-memory `ApiClient` with canned routes and a call log
//!
//! Tests register responses per (verb, path), run the operation under test,
//! then assert on the recorded calls. Unrouted paths answer 404, which is
//! how a provider that does not hold the resource behaves. A successful
//! DELETE drops every route for its path, so a follow-up GET observes the
//! deletion the way the real provider would.

use crate::client::{ApiClient, Verb};
use crate::error::{ApiError, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;

/// One call as the mock saw it.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub verb: Verb,
    pub path: String,
    pub body: Option<Value>,
}

#[derive(Debug, Clone)]
enum Canned {
    Ok(Value),
    Fail { status: u16, message: String },
}

/// Recording mock for `ApiClient`.
#[derive(Default)]
pub struct MockClient {
    routes: Mutex<HashMap<(Verb, String), Canned>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a 2xx response for (verb, path).
    pub fn route(self, verb: Verb, path: impl Into<String>, body: Value) -> Self {
        self.routes
            .lock()
            .unwrap()
            .insert((verb, path.into()), Canned::Ok(body));
        self
    }

    /// Register a non-2xx, non-404 response for (verb, path).
    pub fn fail(self, verb: Verb, path: impl Into<String>, status: u16, message: &str) -> Self {
        self.routes.lock().unwrap().insert(
            (verb, path.into()),
            Canned::Fail {
                status,
                message: message.to_string(),
            },
        );
        self
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of calls made with the given verb.
    pub fn count(&self, verb: Verb) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.verb == verb)
            .count()
    }

    /// Number of POST/PUT/DELETE calls made.
    pub fn mutating_calls(&self) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.verb.is_mutating())
            .count()
    }
}

#[async_trait]
impl ApiClient for MockClient {
    async fn call(&self, verb: Verb, path: &str, body: Option<Value>) -> Result<Value> {
        self.calls.lock().unwrap().push(RecordedCall {
            verb,
            path: path.to_string(),
            body,
        });

        let mut routes = self.routes.lock().unwrap();
        let canned = routes.get(&(verb, path.to_string())).cloned();

        match canned {
            Some(Canned::Ok(value)) => {
                if verb == Verb::Delete {
                    routes.retain(|(_, p), _| p != path);
                }
                Ok(value)
            }
            Some(Canned::Fail { status, message }) => Err(ApiError::Remote { status, message }),
            None => Err(ApiError::NotFound {
                path: path.to_string(),
            }),
        }
    }
}
