//! The remote table API a record synchronizes against.
//!
//! Connection handling, authentication, retries and pagination belong to the
//! implementation behind [`RemoteApi`]. Records only issue the four calls
//! below and hand back whatever error the implementation produced.

use crate::config::ClientConfig;
use crate::error::BoxError;
use crate::{FieldId, Row};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Result type for remote calls.
pub type ApiResult<T> = std::result::Result<T, BoxError>;

/// Per-call options forwarded verbatim to the remote client.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOptions {
    /// Timeout for this call; `None` leaves the client's policy in place
    pub timeout: Option<Duration>,
    /// Client-specific options
    pub extra: Map<String, Value>,
}

impl RequestOptions {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
            ..Self::default()
        }
    }
}

/// Row query issued by [`Record::load`](crate::Record::load).
#[derive(Debug, Clone, PartialEq)]
pub struct RecordsQuery<'a> {
    pub application_id: &'a str,
    pub table_id: &'a str,
    /// Boolean filter expression; empty selects every row
    pub query: String,
    /// Field identifiers to return for each row
    pub columns: Vec<FieldId>,
    pub options: &'a RequestOptions,
}

/// Client for the remote table API.
#[async_trait]
pub trait RemoteApi: Send + Sync {
    /// The configuration this client was built from.
    fn config(&self) -> ClientConfig;

    /// Fetch rows matching a query. Each row maps field identifier to a cell.
    async fn get_records(&self, request: RecordsQuery<'_>) -> ApiResult<Vec<Row>>;

    /// Fetch the table's field descriptors. Each carries its identifier under `id`.
    async fn get_fields(
        &self,
        application_id: &str,
        table_id: &str,
        options: &RequestOptions,
    ) -> ApiResult<Vec<Map<String, Value>>>;

    /// Insert or update rows keyed by field identifier. Returns the identity
    /// value of each row in input order.
    async fn upsert_records(
        &self,
        application_id: &str,
        table_id: &str,
        data: Vec<Map<String, Value>>,
        options: &RequestOptions,
    ) -> ApiResult<Vec<Value>>;

    /// Delete one row. Returns whether the remote store reported a deletion.
    async fn delete_record(
        &self,
        application_id: &str,
        table_id: &str,
        record_id: &Value,
        options: &RequestOptions,
    ) -> ApiResult<bool>;
}

/// How a record obtains its remote client.
#[derive(Clone)]
pub enum ClientBinding {
    /// Build a client from config through the registered connector.
    Config(ClientConfig),
    /// Use an existing client.
    Instance(Arc<dyn RemoteApi>),
}

impl fmt::Debug for ClientBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientBinding::Config(config) => f.debug_tuple("Config").field(config).finish(),
            ClientBinding::Instance(client) => f
                .debug_tuple("Instance")
                .field(&client.config().instance)
                .finish(),
        }
    }
}

impl From<ClientConfig> for ClientBinding {
    fn from(config: ClientConfig) -> Self {
        ClientBinding::Config(config)
    }
}

impl From<Arc<dyn RemoteApi>> for ClientBinding {
    fn from(client: Arc<dyn RemoteApi>) -> Self {
        ClientBinding::Instance(client)
    }
}
