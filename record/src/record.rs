//! A single row of a remote table.
//!
//! [`Record`] keeps a name → value map, the name ↔ identifier aliases and
//! the discovered field schema, and synchronizes them with the remote store
//! through a [`RemoteApi`] client.

use crate::alias::FieldAliases;
use crate::client::{ClientBinding, RecordsQuery, RemoteApi, RequestOptions};
use crate::config::{ClientConfig, Host, RecordOptions};
use crate::error::{Error, Result};
use crate::field::{remote_fid, Field};
use crate::snapshot::{RecordJson, RecordSource};
use crate::value::{fid_eq, is_truthy, value_to_string};
use crate::{Data, FieldId, Row, CLASS_NAME, IDENTITY_FIELD};
use serde_json::{Map, Value};
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// Columns requested by [`Record::load`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnList {
    /// Dot-delimited identifiers, e.g. `"3.6.7"`
    Delimited(String),
    /// Explicit identifiers
    Fids(Vec<FieldId>),
}

impl ColumnList {
    /// The identifiers in request order.
    pub fn fids(&self) -> Vec<FieldId> {
        match self {
            ColumnList::Delimited(list) => list
                .split('.')
                .map(str::trim)
                .filter(|fid| !fid.is_empty())
                .map(str::to_string)
                .collect(),
            ColumnList::Fids(fids) => fids.clone(),
        }
    }
}

impl From<&str> for ColumnList {
    fn from(list: &str) -> Self {
        ColumnList::Delimited(list.to_string())
    }
}

impl From<String> for ColumnList {
    fn from(list: String) -> Self {
        ColumnList::Delimited(list)
    }
}

impl From<Vec<FieldId>> for ColumnList {
    fn from(fids: Vec<FieldId>) -> Self {
        ColumnList::Fids(fids)
    }
}

impl From<Vec<&str>> for ColumnList {
    fn from(fids: Vec<&str>) -> Self {
        ColumnList::Fids(fids.into_iter().map(str::to_string).collect())
    }
}

impl From<Vec<u32>> for ColumnList {
    fn from(fids: Vec<u32>) -> Self {
        ColumnList::Fids(fids.into_iter().map(|fid| fid.to_string()).collect())
    }
}

/// Options for [`Record::load`].
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Fields to fetch; defaults to every aliased field
    pub clist: Option<ColumnList>,
    /// Raw filter expression ANDed with the identity clause
    pub query: Option<String>,
    pub request: RequestOptions,
}

impl LoadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clist(mut self, clist: impl Into<ColumnList>) -> Self {
        self.clist = Some(clist.into());
        self
    }

    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn request(mut self, request: RequestOptions) -> Self {
        self.request = request;
        self
    }
}

/// Options for [`Record::save`].
#[derive(Debug, Clone, Default)]
pub struct SaveOptions {
    /// Names or identifiers allowed in the payload; `None` allows every alias
    pub fids_to_save: Option<Vec<String>>,
    pub request: RequestOptions,
}

impl SaveOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fids_to_save<I, S>(mut self, fids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fids_to_save = Some(fids.into_iter().map(Into::into).collect());
        self
    }

    pub fn request(mut self, request: RequestOptions) -> Self {
        self.request = request;
        self
    }
}

/// One row of a remote table.
pub struct Record {
    /// Process-local identity, unrelated to the remote record id
    id: String,
    client: Option<Arc<dyn RemoteApi>>,
    client_config: ClientConfig,
    application_id: String,
    table_id: String,
    fids: FieldAliases,
    fields: Vec<Field>,
    data: Data,
}

impl Record {
    /// Create a record, filling unset options from the host defaults.
    pub fn new(options: RecordOptions) -> Self {
        let settings = options.merged_over(&Host::defaults());
        let (client, client_config) = bind(settings.client);

        let mut record = Self {
            id: Uuid::new_v4().to_string(),
            client,
            client_config,
            application_id: String::new(),
            table_id: String::new(),
            fids: FieldAliases::new(),
            fields: Vec::new(),
            data: Data::new(),
        };

        record
            .set_application_id(settings.application_id.unwrap_or_default())
            .set_table_id(settings.table_id.unwrap_or_default())
            .set_fids(&settings.field_aliases);

        if let Some(record_id) = settings.record_id {
            record.set(IDENTITY_FIELD, record_id);
        }

        record
    }

    /// Create a record and populate its data.
    pub fn new_record<I, K, V>(options: RecordOptions, data: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let mut record = Self::new(options);
        for (name, value) in data {
            record.set(name, value);
        }
        record
    }

    /// Whether `obj` is a [`Record`].
    pub fn is_record_instance(obj: &dyn Any) -> bool {
        obj.is::<Record>()
    }

    /// Type tag shared by every record.
    pub fn class_name(&self) -> &'static str {
        CLASS_NAME
    }

    /// Process-local identity.
    pub fn id(&self) -> &str {
        &self.id
    }

    // ------------------------------------------------------------------
    // Client binding
    // ------------------------------------------------------------------

    /// Configuration of the bound (or to-be-bound) remote client.
    pub fn client_config(&self) -> &ClientConfig {
        &self.client_config
    }

    /// Rebind the remote client.
    ///
    /// A config binding builds a client through the registered connector.
    /// Without one the current client is kept and only the config changes.
    pub fn set_client(&mut self, binding: impl Into<ClientBinding>) -> &mut Self {
        let (client, client_config) = bind(Some(binding.into()));
        if client.is_some() {
            self.client = client;
        }
        self.client_config = client_config;
        self
    }

    fn client(&self) -> Result<Arc<dyn RemoteApi>> {
        self.client.clone().ok_or(Error::ClientUnbound)
    }

    // ------------------------------------------------------------------
    // State
    // ------------------------------------------------------------------

    /// Empty data and field schema. Identity, coordinates and aliases stay.
    pub fn clear(&mut self) -> &mut Self {
        self.data.clear();
        self.fields.clear();
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.data.get(name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.data.insert(name.into(), value.into());
        self
    }

    /// All data, keyed by alias name.
    pub fn data(&self) -> &Data {
        &self.data
    }

    /// The remote record id, if one is held.
    pub fn record_id(&self) -> Option<&Value> {
        self.get(IDENTITY_FIELD).filter(|v| is_truthy(v))
    }

    pub fn get_application_id(&self) -> &str {
        &self.application_id
    }

    pub fn set_application_id(&mut self, application_id: impl Into<String>) -> &mut Self {
        self.application_id = application_id.into();
        self
    }

    pub fn get_table_id(&self) -> &str {
        &self.table_id
    }

    pub fn set_table_id(&mut self, table_id: impl Into<String>) -> &mut Self {
        self.table_id = table_id.into();
        self
    }

    // ------------------------------------------------------------------
    // Aliases
    // ------------------------------------------------------------------

    /// Identifier aliased to `name`, or `""` when unmapped.
    pub fn get_fid(&self, name: &str) -> &str {
        self.fids.fid(name).unwrap_or("")
    }

    /// First name aliased to `fid`, or `""` when none is.
    pub fn get_name_by_fid(&self, fid: &str) -> &str {
        self.fids.name_of(fid).unwrap_or("")
    }

    pub fn get_fids(&self) -> &FieldAliases {
        &self.fids
    }

    pub fn set_fid(&mut self, name: impl Into<String>, fid: impl Into<FieldId>) -> &mut Self {
        self.fids.set(name, fid);
        self
    }

    pub fn set_fids<I, N, F>(&mut self, fids: I) -> &mut Self
    where
        I: IntoIterator<Item = (N, F)>,
        N: Into<String>,
        F: Into<FieldId>,
    {
        self.fids.extend(fids);
        self
    }

    // ------------------------------------------------------------------
    // Field schema
    // ------------------------------------------------------------------

    pub fn get_field(&self, fid: &str) -> Option<&Field> {
        self.get_field_index(fid).map(|i| &self.fields[i])
    }

    pub fn get_field_index(&self, fid: &str) -> Option<usize> {
        self.fields.iter().position(|field| fid_eq(field.fid(), fid))
    }

    pub fn get_fields(&self) -> &[Field] {
        &self.fields
    }

    /// Replace the whole schema list.
    pub fn set_fields(&mut self, fields: Vec<Field>) -> &mut Self {
        self.fields = fields;
        self
    }

    // ------------------------------------------------------------------
    // Remote sync
    // ------------------------------------------------------------------

    /// Fetch this record's row and copy the requested fields into data.
    ///
    /// Identifiers in `clist` without an alias get one named after the
    /// identifier itself. Data is untouched when no row matches.
    pub async fn load(&mut self, options: LoadOptions) -> Result<&Data> {
        let client = self.client()?;

        let mut clauses = Vec::new();
        if let Some(record_id) = self.record_id() {
            clauses.push(format!(
                "{{'{}'.=.'{}'}}",
                self.get_fid(IDENTITY_FIELD),
                value_to_string(record_id)
            ));
        }
        if let Some(query) = options.query.as_deref().filter(|q| !q.is_empty()) {
            clauses.push(format!("({query})"));
        }

        let selection: Vec<(String, FieldId)> = match &options.clist {
            Some(clist) => {
                let mut selection = Vec::new();
                for fid in clist.fids() {
                    let name = match self.fids.name_of(&fid) {
                        Some(name) => name.to_string(),
                        None => {
                            self.fids.set(fid.clone(), fid.clone());
                            fid.clone()
                        }
                    };
                    selection.push((name, fid));
                }
                selection
            }
            None => self
                .fids
                .iter()
                .map(|(name, fid)| (name.to_string(), fid.to_string()))
                .collect(),
        };

        debug!(
            application_id = %self.application_id,
            table_id = %self.table_id,
            columns = selection.len(),
            "loading record"
        );

        let rows = client
            .get_records(RecordsQuery {
                application_id: &self.application_id,
                table_id: &self.table_id,
                query: clauses.join("AND"),
                columns: selection.iter().map(|(_, fid)| fid.clone()).collect(),
                options: &options.request,
            })
            .await?;

        let Some(row) = rows.into_iter().next() else {
            warn!(
                application_id = %self.application_id,
                table_id = %self.table_id,
                "record not found"
            );
            return Err(Error::RecordNotFound {
                application_id: self.application_id.clone(),
                table_id: self.table_id.clone(),
            });
        };

        for (name, fid) in selection {
            let value = cell_value(&row, &fid);
            self.data.insert(name, value);
        }

        Ok(&self.data)
    }

    /// Fetch the table's field schema and merge it into the local list.
    ///
    /// Descriptors are matched by identifier and updated attribute by
    /// attribute, so repeated calls converge instead of duplicating.
    pub async fn load_schema(&mut self, options: &RequestOptions) -> Result<&[Field]> {
        let client = self.client()?;

        let descriptors = client
            .get_fields(&self.application_id, &self.table_id, options)
            .await?;

        debug!(
            application_id = %self.application_id,
            table_id = %self.table_id,
            fields = descriptors.len(),
            "loaded field schema"
        );

        for descriptor in descriptors {
            let Some(fid) = remote_fid(&descriptor) else {
                warn!(table_id = %self.table_id, "field descriptor without id skipped");
                continue;
            };

            let index = match self.get_field_index(&fid) {
                Some(index) => index,
                None => {
                    self.fields
                        .push(Field::new(&self.application_id, &self.table_id, fid));
                    self.fields.len() - 1
                }
            };

            let field = &mut self.fields[index];
            for (attribute, value) in descriptor {
                field.set(attribute, value);
            }
        }

        Ok(self.fields.as_slice())
    }

    /// Build the upsert payload, keyed by field identifier.
    ///
    /// With `fids_to_save`, only aliases listed by name or identifier are
    /// sent, plus the identity field. Computed fields (lookup, summary,
    /// formula) are never sent. The identity field is always present, as
    /// `null` when no record id is held; other unset fields are left out.
    pub fn save_payload(&self, fids_to_save: Option<&[String]>) -> Map<String, Value> {
        let identity_fid = self.get_fid(IDENTITY_FIELD);
        let is_identity = |fid: &str| !identity_fid.is_empty() && fid_eq(fid, identity_fid);

        let mut payload = Map::new();
        for (name, fid) in self.fids.iter() {
            if fid.is_empty() {
                continue;
            }

            let eligible = match fids_to_save {
                None => true,
                Some(list) => {
                    list.iter().any(|entry| entry == name)
                        || list.iter().any(|entry| fid_eq(entry, fid))
                        || is_identity(fid)
                }
            };
            if !eligible || self.get_field(fid).is_some_and(Field::is_computed) {
                continue;
            }

            match self.data.get(name) {
                Some(value) => {
                    payload.insert(fid.to_string(), value.clone());
                }
                None if is_identity(fid) => {
                    payload.insert(fid.to_string(), Value::Null);
                }
                None => {}
            }
        }

        payload
    }

    /// Send eligible fields to the remote store in a single upsert and store
    /// the returned record id.
    pub async fn save(&mut self, options: SaveOptions) -> Result<&mut Self> {
        let client = self.client()?;
        let payload = self.save_payload(options.fids_to_save.as_deref());

        debug!(
            application_id = %self.application_id,
            table_id = %self.table_id,
            fields = payload.len(),
            "saving record"
        );

        let results = client
            .upsert_records(
                &self.application_id,
                &self.table_id,
                vec![payload],
                &options.request,
            )
            .await?;

        if let Some(record_id) = results.into_iter().next() {
            debug!(record_id = %value_to_string(&record_id), "record saved");
            self.set(IDENTITY_FIELD, record_id);
        }

        Ok(self)
    }

    /// Delete the remote row and clear local state.
    ///
    /// Without a record id nothing is sent and the call reports success.
    /// When the remote store reports no deletion, local state is kept.
    pub async fn delete(&mut self, options: &RequestOptions) -> Result<bool> {
        let Some(record_id) = self.record_id().cloned() else {
            self.clear();
            return Ok(true);
        };

        let client = self.client()?;
        let deleted = client
            .delete_record(&self.application_id, &self.table_id, &record_id, options)
            .await?;

        if deleted {
            debug!(record_id = %value_to_string(&record_id), "record deleted");
            self.clear();
        } else {
            warn!(record_id = %value_to_string(&record_id), "remote store reported no deletion");
        }

        Ok(deleted)
    }

    // ------------------------------------------------------------------
    // Serialization
    // ------------------------------------------------------------------

    /// Serialize the record. `fids_to_convert` limits which data names are
    /// included; `None` includes all.
    pub fn to_json(&self, fids_to_convert: Option<&[&str]>) -> RecordJson {
        RecordJson {
            highsystems: Some(self.client_config.clone()),
            application_id: self.application_id.clone(),
            table_id: self.table_id.clone(),
            fids: self.fids.clone(),
            recordid: self.get(IDENTITY_FIELD).cloned(),
            fields: self.fields.iter().map(Field::to_json).collect(),
            data: self
                .data
                .iter()
                .filter(|(name, _)| {
                    fids_to_convert.map_or(true, |list| list.contains(&name.as_str()))
                })
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect(),
        }
    }

    /// Apply serialized state on top of this record.
    ///
    /// The input is fully decoded before anything is applied.
    pub fn restore(&mut self, source: impl Into<RecordSource>) -> Result<&mut Self> {
        let json = source.into().decode()?;
        self.apply_json(json);
        Ok(self)
    }

    /// Build a record from serialized state.
    pub fn from_json(source: impl Into<RecordSource>) -> Result<Record> {
        let json = source.into().decode()?;
        let mut record = Record::new(RecordOptions::default());
        record.apply_json(json);
        Ok(record)
    }

    fn apply_json(&mut self, json: RecordJson) {
        if let Some(config) = json.highsystems {
            self.set_client(config);
        }
        if !json.application_id.is_empty() {
            self.set_application_id(json.application_id);
        }
        if !json.table_id.is_empty() {
            self.set_table_id(json.table_id);
        }
        self.set_fids(&json.fids);
        if let Some(record_id) = json.recordid.filter(is_truthy) {
            self.set(IDENTITY_FIELD, record_id);
        }
        for field in json.fields.into_iter().map(Field::from_json) {
            match self.get_field_index(field.fid()) {
                Some(index) => self.fields[index] = field,
                None => self.fields.push(field),
            }
        }
        for (name, value) in json.data {
            self.set(name, value);
        }
    }
}

impl Default for Record {
    fn default() -> Self {
        Self::new(RecordOptions::default())
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("id", &self.id)
            .field("bound", &self.client.is_some())
            .field("client_config", &self.client_config)
            .field("application_id", &self.application_id)
            .field("table_id", &self.table_id)
            .field("fids", &self.fids)
            .field("fields", &self.fields)
            .field("data", &self.data)
            .finish()
    }
}

fn bind(binding: Option<ClientBinding>) -> (Option<Arc<dyn RemoteApi>>, ClientConfig) {
    match binding {
        Some(ClientBinding::Instance(client)) => {
            let config = client.config();
            (Some(client), config)
        }
        Some(ClientBinding::Config(config)) => (Host::connect(&config), config),
        None => (None, ClientConfig::default()),
    }
}

/// Value of `fid` in a fetched row. Cells are `{"value": v}` objects; a bare
/// cell is taken as the value and a missing one reads as `null`.
fn cell_value(row: &Row, fid: &str) -> Value {
    let cell = row
        .get(fid)
        .or_else(|| row.iter().find(|(key, _)| fid_eq(key, fid)).map(|(_, v)| v));

    match cell {
        Some(Value::Object(cell)) if cell.contains_key("value") => cell["value"].clone(),
        Some(other) => other.clone(),
        None => Value::Null,
    }
}
