//! In-memory remote API used by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use highsystems_record::{
    ApiResult, ClientConfig, RecordsQuery, RemoteApi, RequestOptions, Row,
};
use serde_json::{Map, Value};
use std::sync::{Arc, Mutex};

/// A call the mock received.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    GetRecords {
        application_id: String,
        table_id: String,
        query: String,
        columns: Vec<String>,
        options: RequestOptions,
    },
    GetFields {
        application_id: String,
        table_id: String,
        options: RequestOptions,
    },
    Upsert {
        application_id: String,
        table_id: String,
        data: Vec<Map<String, Value>>,
        options: RequestOptions,
    },
    Delete {
        application_id: String,
        table_id: String,
        record_id: Value,
        options: RequestOptions,
    },
}

#[derive(Debug, thiserror::Error)]
#[error("remote failure: {0}")]
pub struct MockError(pub String);

/// Scripted remote API that records every call.
#[derive(Default)]
pub struct MockApi {
    pub config: ClientConfig,
    pub rows: Mutex<Vec<Row>>,
    pub fields: Mutex<Vec<Map<String, Value>>>,
    pub upsert_result: Mutex<Vec<Value>>,
    pub delete_result: Mutex<bool>,
    pub fail_with: Mutex<Option<String>>,
    pub calls: Mutex<Vec<Call>>,
}

impl MockApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_config(config: ClientConfig) -> Arc<Self> {
        Arc::new(Self {
            config,
            ..Self::default()
        })
    }

    pub fn set_rows(&self, rows: Vec<Value>) {
        *self.rows.lock().unwrap() = rows.into_iter().map(object).collect();
    }

    pub fn set_fields(&self, fields: Vec<Value>) {
        *self.fields.lock().unwrap() = fields.into_iter().map(object).collect();
    }

    pub fn set_upsert_result(&self, ids: Vec<Value>) {
        *self.upsert_result.lock().unwrap() = ids;
    }

    pub fn set_delete_result(&self, deleted: bool) {
        *self.delete_result.lock().unwrap() = deleted;
    }

    pub fn fail(&self, message: &str) {
        *self.fail_with.lock().unwrap() = Some(message.to_string());
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn last_upsert(&self) -> Option<Map<String, Value>> {
        self.calls().into_iter().rev().find_map(|call| match call {
            Call::Upsert { mut data, .. } => data.pop(),
            _ => None,
        })
    }

    fn record(&self, call: Call) -> ApiResult<()> {
        self.calls.lock().unwrap().push(call);
        match self.fail_with.lock().unwrap().clone() {
            Some(message) => Err(MockError(message).into()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl RemoteApi for MockApi {
    fn config(&self) -> ClientConfig {
        self.config.clone()
    }

    async fn get_records(&self, request: RecordsQuery<'_>) -> ApiResult<Vec<Row>> {
        self.record(Call::GetRecords {
            application_id: request.application_id.to_string(),
            table_id: request.table_id.to_string(),
            query: request.query,
            columns: request.columns,
            options: request.options.clone(),
        })?;
        Ok(self.rows.lock().unwrap().clone())
    }

    async fn get_fields(
        &self,
        application_id: &str,
        table_id: &str,
        options: &RequestOptions,
    ) -> ApiResult<Vec<Map<String, Value>>> {
        self.record(Call::GetFields {
            application_id: application_id.to_string(),
            table_id: table_id.to_string(),
            options: options.clone(),
        })?;
        Ok(self.fields.lock().unwrap().clone())
    }

    async fn upsert_records(
        &self,
        application_id: &str,
        table_id: &str,
        data: Vec<Map<String, Value>>,
        options: &RequestOptions,
    ) -> ApiResult<Vec<Value>> {
        self.record(Call::Upsert {
            application_id: application_id.to_string(),
            table_id: table_id.to_string(),
            data,
            options: options.clone(),
        })?;
        Ok(self.upsert_result.lock().unwrap().clone())
    }

    async fn delete_record(
        &self,
        application_id: &str,
        table_id: &str,
        record_id: &Value,
        options: &RequestOptions,
    ) -> ApiResult<bool> {
        self.record(Call::Delete {
            application_id: application_id.to_string(),
            table_id: table_id.to_string(),
            record_id: record_id.clone(),
            options: options.clone(),
        })?;
        Ok(*self.delete_result.lock().unwrap())
    }
}

/// Unwrap a JSON object literal.
pub fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

/// Install a test subscriber; `RUST_LOG` controls verbosity.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
