//! Test doubles for the warehouse transport and the token issuer
//!
//! [`MockTransport`] records every request it receives and can be scripted
//! to fail a number of calls, or every call. [`StaticTokenIssuer`] hands out
//! `token-1`, `token-2`, ... and counts how many it issued.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let transport = MockTransport::new().fail_times(1);
//! let client = WarehouseClient::new(
//!     transport.clone(),
//!     AuthSession::new(StaticTokenIssuer::new()),
//!     "SYSADMIN",
//! );
//! ```

use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::auth::{AuthToken, TokenIssuer};
use crate::client::{StatementRequest, StatementTransport};
use crate::error::{AuthError, WarehouseError};

/// A request seen by [`MockTransport`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub request: StatementRequest,
    pub token: String,
}

/// In-memory statement transport
#[derive(Clone, Default)]
pub struct MockTransport {
    requests: Arc<RwLock<Vec<RecordedRequest>>>,
    remaining_failures: Arc<AtomicUsize>,
    fail_always: bool,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject the next `times` calls with HTTP 401
    pub fn fail_times(self, times: usize) -> Self {
        self.remaining_failures.store(times, Ordering::SeqCst);
        self
    }

    /// Reject every call with HTTP 401
    pub fn fail_always(mut self) -> Self {
        self.fail_always = true;
        self
    }

    /// Requests received so far, failed ones included
    pub async fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.read().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.requests.read().await.len()
    }
}

#[async_trait]
impl StatementTransport for MockTransport {
    async fn execute(&self, request: &StatementRequest, token: &str) -> Result<(), WarehouseError> {
        self.requests.write().await.push(RecordedRequest {
            request: request.clone(),
            token: token.to_string(),
        });

        let scripted_failure = self
            .remaining_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();

        if self.fail_always || scripted_failure {
            return Err(WarehouseError::Rejected {
                status: 401,
                body: "JWT token is invalid.".to_string(),
            });
        }

        Ok(())
    }
}

/// Issues predictable tokens and counts them
#[derive(Clone, Default)]
pub struct StaticTokenIssuer {
    issued: Arc<AtomicUsize>,
    fail: bool,
}

impl StaticTokenIssuer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every issue call
    pub fn failing() -> Self {
        Self {
            issued: Arc::new(AtomicUsize::new(0)),
            fail: true,
        }
    }

    pub fn issued_count(&self) -> usize {
        self.issued.load(Ordering::SeqCst)
    }
}

impl TokenIssuer for StaticTokenIssuer {
    fn issue(&self) -> Result<AuthToken, AuthError> {
        if self.fail {
            return Err(AuthError::SigningError("Simulated signing failure".to_string()));
        }

        let n = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(AuthToken {
            value: format!("token-{}", n),
            issued_at: Utc::now(),
            ttl: Duration::minutes(60),
            renew_after: Duration::minutes(60),
        })
    }
}
