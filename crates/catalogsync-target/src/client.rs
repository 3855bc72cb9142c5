//! SQL API client
//!
//! One call per batch: a JSON body carrying the statement text, the number of
//! statements in it and the role (plus the warehouse when configured),
//! authenticated with the session's current key-pair JWT.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use catalogsync_core::SyncConfig;

use crate::auth::AuthSession;
use crate::error::{SyncError, WarehouseError};

const TOKEN_TYPE_HEADER: &str = "X-Snowflake-Authorization-Token-Type";
const KEYPAIR_JWT: &str = "KEYPAIR_JWT";

/// Body of a statement submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementRequest {
    pub statement: String,
    pub parameters: StatementParameters,
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warehouse: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementParameters {
    /// Number of `;`-terminated statements in `statement`
    #[serde(rename = "MULTI_STATEMENT_COUNT")]
    pub multi_statement_count: usize,
}

impl StatementRequest {
    pub fn new(statement: impl Into<String>, statement_count: usize, role: impl Into<String>) -> Self {
        Self {
            statement: statement.into(),
            parameters: StatementParameters {
                multi_statement_count: statement_count,
            },
            role: role.into(),
            warehouse: None,
        }
    }

    pub fn with_warehouse(mut self, warehouse: impl Into<String>) -> Self {
        self.warehouse = Some(warehouse.into());
        self
    }
}

/// Delivers a statement request to the warehouse
#[async_trait]
pub trait StatementTransport: Send + Sync {
    /// Send one request; anything other than HTTP 200 is an error
    async fn execute(&self, request: &StatementRequest, token: &str) -> Result<(), WarehouseError>;
}

/// HTTP transport for the SQL API statements endpoint
pub struct HttpTransport {
    client: reqwest::Client,
    url: String,
}

impl HttpTransport {
    /// Create a transport whose requests time out after `timeout`
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, WarehouseError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| WarehouseError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl StatementTransport for HttpTransport {
    async fn execute(&self, request: &StatementRequest, token: &str) -> Result<(), WarehouseError> {
        tracing::info!(url = %self.url, statements = request.parameters.multi_statement_count, "Invoking target");

        let response = self
            .client
            .post(&self.url)
            .header(TOKEN_TYPE_HEADER, KEYPAIR_JWT)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .bearer_auth(token)
            .json(request)
            .send()
            .await
            .map_err(|e| WarehouseError::NetworkError(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::OK {
            tracing::info!("Table operation successful");
            return Ok(());
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|e| format!("<unreadable body: {}>", e));
        tracing::error!(status = status.as_u16(), body = %body, "Table operation failed");

        Err(WarehouseError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

/// Sends statements with the session's current token
pub struct WarehouseClient {
    transport: Box<dyn StatementTransport>,
    session: AuthSession,
    role: String,
    warehouse: Option<String>,
}

impl WarehouseClient {
    pub fn new(
        transport: impl StatementTransport + 'static,
        session: AuthSession,
        role: impl Into<String>,
    ) -> Self {
        Self {
            transport: Box::new(transport),
            session,
            role: role.into(),
            warehouse: None,
        }
    }

    /// Client for the configured endpoint, with key-pair authentication
    pub fn from_config(config: &SyncConfig) -> Result<Self, SyncError> {
        let transport = HttpTransport::new(&config.url, config.request_timeout())?;
        let session = AuthSession::new(crate::auth::KeyPairIssuer::from_config(config)?);
        let client = Self::new(transport, session, &config.role);
        if config.send_warehouse {
            Ok(client.with_warehouse(&config.warehouse))
        } else {
            Ok(client)
        }
    }

    pub fn with_warehouse(mut self, warehouse: impl Into<String>) -> Self {
        self.warehouse = Some(warehouse.into());
        self
    }

    /// Send a batch of `statement_count` statements
    ///
    /// Does not retry; see [`crate::SnowflakeTarget`] for the refresh-and-retry
    /// policy.
    pub async fn invoke(&self, statement: &str, statement_count: usize) -> Result<(), SyncError> {
        let token = self.session.token().await?;

        let mut request = StatementRequest::new(statement, statement_count, &self.role);
        if let Some(warehouse) = &self.warehouse {
            request = request.with_warehouse(warehouse);
        }

        self.transport.execute(&request, &token).await?;
        Ok(())
    }

    pub fn session(&self) -> &AuthSession {
        &self.session
    }
}
