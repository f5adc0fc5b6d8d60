//! Configuration: remote client settings, record options and host-level
//! defaults.
//!
//! Nothing here is installed implicitly. An embedding application that wants
//! process-wide defaults or config-only client binding calls
//! [`Host::register_defaults`] / [`Host::register_connector`] at startup.

use crate::alias::FieldAliases;
use crate::client::{ClientBinding, RemoteApi};
use crate::IDENTITY_FIELD;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::env;
use std::sync::{Arc, PoisonError, RwLock};

/// Settings for the remote API client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    /// Realm/instance name of the remote service
    #[serde(default)]
    pub instance: String,
    /// User token used for authentication
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_token: Option<String>,
    /// Maximum concurrent requests the client may issue
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_limit: Option<u32>,
    /// Client-specific settings this crate does not interpret
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ClientConfig {
    pub fn new(instance: impl Into<String>) -> Self {
        Self {
            instance: instance.into(),
            ..Self::default()
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Load `.env` (if present) and then read the environment.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_env()
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let instance = var("HIGHSYSTEMS_INSTANCE").unwrap_or_default();

        let user_token = var("HIGHSYSTEMS_USER_TOKEN").filter(|t| !t.is_empty());

        let connection_limit = var("HIGHSYSTEMS_CONNECTION_LIMIT")
            .map(|v| v.parse().map_err(|_| ConfigError::InvalidConnectionLimit(v)))
            .transpose()?;

        Ok(Self {
            instance,
            user_token,
            connection_limit,
            extra: Map::new(),
        })
    }

    /// Fill unset settings from `defaults`.
    fn merged_over(mut self, defaults: &ClientConfig) -> Self {
        if self.instance.is_empty() {
            self.instance = defaults.instance.clone();
        }
        if self.user_token.is_none() {
            self.user_token = defaults.user_token.clone();
        }
        if self.connection_limit.is_none() {
            self.connection_limit = defaults.connection_limit;
        }
        for (key, value) in &defaults.extra {
            self.extra
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }
        self
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid HIGHSYSTEMS_CONNECTION_LIMIT value: {0}")]
    InvalidConnectionLimit(String),
}

/// Options for constructing a [`Record`](crate::Record).
///
/// Unset options fall back to the host defaults; aliases are merged with
/// caller entries winning.
#[derive(Debug, Clone, Default)]
pub struct RecordOptions {
    pub client: Option<ClientBinding>,
    pub application_id: Option<String>,
    pub table_id: Option<String>,
    pub field_aliases: FieldAliases,
    pub record_id: Option<Value>,
}

impl RecordOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn client(mut self, client: impl Into<ClientBinding>) -> Self {
        self.client = Some(client.into());
        self
    }

    pub fn application_id(mut self, application_id: impl Into<String>) -> Self {
        self.application_id = Some(application_id.into());
        self
    }

    pub fn table_id(mut self, table_id: impl Into<String>) -> Self {
        self.table_id = Some(table_id.into());
        self
    }

    /// Add one name → identifier alias.
    pub fn fid(mut self, name: impl Into<String>, fid: impl Into<String>) -> Self {
        self.field_aliases.set(name, fid);
        self
    }

    pub fn field_aliases(mut self, aliases: FieldAliases) -> Self {
        self.field_aliases = aliases;
        self
    }

    pub fn record_id(mut self, record_id: impl Into<Value>) -> Self {
        self.record_id = Some(record_id.into());
        self
    }

    /// Fill unset options from `defaults`.
    pub fn merged_over(self, defaults: &RecordOptions) -> RecordOptions {
        let client = match (self.client, &defaults.client) {
            (Some(ClientBinding::Config(config)), Some(ClientBinding::Config(base))) => {
                Some(ClientBinding::Config(config.merged_over(base)))
            }
            (Some(binding), _) => Some(binding),
            (None, base) => base.clone(),
        };

        let mut field_aliases = defaults.field_aliases.clone();
        field_aliases.extend(self.field_aliases.iter());

        RecordOptions {
            client,
            application_id: self
                .application_id
                .or_else(|| defaults.application_id.clone()),
            table_id: self.table_id.or_else(|| defaults.table_id.clone()),
            field_aliases,
            record_id: self.record_id.or_else(|| defaults.record_id.clone()),
        }
    }

    /// Defaults that apply when nothing was registered.
    pub fn builtin() -> RecordOptions {
        RecordOptions {
            client: Some(ClientBinding::Config(ClientConfig::default())),
            application_id: Some(String::new()),
            table_id: Some(String::new()),
            field_aliases: [(IDENTITY_FIELD, "id")].into_iter().collect(),
            record_id: None,
        }
    }
}

/// Builds a remote client from its configuration.
pub type Connector = Arc<dyn Fn(&ClientConfig) -> Arc<dyn RemoteApi> + Send + Sync>;

struct HostState {
    defaults: Option<RecordOptions>,
    connector: Option<Connector>,
}

static HOST: RwLock<HostState> = RwLock::new(HostState {
    defaults: None,
    connector: None,
});

/// Process-wide registration point for the embedding application.
pub struct Host;

impl Host {
    /// Register defaults applied to every record constructed afterwards.
    /// They are layered over the built-in defaults.
    pub fn register_defaults(defaults: RecordOptions) {
        let mut host = HOST.write().unwrap_or_else(PoisonError::into_inner);
        host.defaults = Some(defaults.merged_over(&RecordOptions::builtin()));
        tracing::debug!("record defaults registered");
    }

    /// Register the function that turns a [`ClientConfig`] into a client.
    pub fn register_connector<F>(connector: F)
    where
        F: Fn(&ClientConfig) -> Arc<dyn RemoteApi> + Send + Sync + 'static,
    {
        let mut host = HOST.write().unwrap_or_else(PoisonError::into_inner);
        host.connector = Some(Arc::new(connector));
        tracing::debug!("remote client connector registered");
    }

    /// Drop every registration.
    pub fn reset() {
        let mut host = HOST.write().unwrap_or_else(PoisonError::into_inner);
        host.defaults = None;
        host.connector = None;
    }

    /// Effective defaults for new records.
    pub fn defaults() -> RecordOptions {
        let host = HOST.read().unwrap_or_else(PoisonError::into_inner);
        host.defaults.clone().unwrap_or_else(RecordOptions::builtin)
    }

    /// Build a client for `config`, if a connector is registered.
    pub fn connect(config: &ClientConfig) -> Option<Arc<dyn RemoteApi>> {
        let connector = HOST
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .connector
            .clone()?;
        Some(connector(config))
    }
}
