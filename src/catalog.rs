use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use serde::Deserialize;
use serde_yaml::{Mapping, Value as YamlValue};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::model::{
    QueryPage, QueryParams, QueryRecord, QueryStatus, Record, SecondaryKind, Service,
};
use crate::provider::{
    DetailSource, HistorySource, ListSource, QuerySource, ScanSource, Sources,
};

const DEMO_CATALOG: &str = include_str!("../demos/catalog.yaml");

/// Field of a query row naming the log group it belongs to.
const LOG_GROUP_FIELD: &str = "@log";

#[derive(Debug, Clone, Deserialize, Default)]
struct CatalogFile {
    #[serde(default)]
    services: BTreeMap<String, ServiceData>,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct ServiceData {
    #[serde(default)]
    records: Vec<Record>,
    #[serde(default)]
    details: BTreeMap<String, BTreeMap<String, serde_json::Value>>,
    #[serde(default)]
    history: BTreeMap<String, Vec<Record>>,
    #[serde(default)]
    items: BTreeMap<String, Vec<Mapping>>,
    #[serde(default)]
    query_rows: Vec<Mapping>,
}

#[derive(Debug, Clone)]
pub struct CatalogOptions {
    pub page_size: usize,
    pub latency: Duration,
    pub region: Option<String>,
    pub profile: Option<String>,
}

impl Default for CatalogOptions {
    fn default() -> Self {
        Self {
            page_size: 50,
            latency: Duration::ZERO,
            region: None,
            profile: None,
        }
    }
}

/// Parsed catalog shared by every service screen.
#[derive(Debug, Clone)]
pub struct Catalog {
    file: CatalogFile,
    options: CatalogOptions,
    origin: String,
}

impl Catalog {
    /// Reads `path`, or the built-in demo catalog when no path is given.
    pub fn load(path: Option<&Path>, options: CatalogOptions) -> Result<Self> {
        let (raw, origin) = match path {
            Some(path) => (
                fs::read_to_string(path)
                    .with_context(|| format!("failed to read catalog {}", path.display()))?,
                path.display().to_string(),
            ),
            None => (DEMO_CATALOG.to_string(), "built-in demo".to_string()),
        };
        let catalog = Self::from_yaml(&raw, options)
            .with_context(|| format!("failed to parse catalog {origin}"))?;
        Ok(Self { origin, ..catalog })
    }

    pub fn from_yaml(raw: &str, options: CatalogOptions) -> Result<Self> {
        let file: CatalogFile = serde_yaml::from_str(raw)?;
        for key in file.services.keys() {
            if Service::from_token(key).is_none() {
                bail!("unknown service '{key}' in catalog");
            }
        }
        Ok(Self {
            file,
            options,
            origin: "inline".to_string(),
        })
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Builds the capability set one screen runs against.
    pub fn sources(&self, service: Service) -> Sources {
        let section = data_service(service);
        let data = self
            .file
            .services
            .iter()
            .find(|(key, _)| Service::from_token(key) == Some(section))
            .map(|(_, data)| data.clone())
            .unwrap_or_default();
        info!(
            service = %service,
            records = data.records.len(),
            region = self.options.region.as_deref().unwrap_or("-"),
            profile = self.options.profile.as_deref().unwrap_or("-"),
            "catalog source ready"
        );

        let source = Arc::new(CatalogSource::new(service, data, self.options.clone()));
        let mut sources = Sources::listing(source.clone());
        match service.secondary() {
            SecondaryKind::Detail => sources.detail = Some(source.clone()),
            SecondaryKind::History | SecondaryKind::Events => {
                sources.history = Some(source.clone());
            }
            SecondaryKind::Scan => {
                sources.detail = Some(source.clone());
                sources.scan = Some(source.clone());
            }
            SecondaryKind::Query => sources.query = Some(source.clone()),
        }
        sources
    }
}

/// The insights screen lists and queries the log groups section.
fn data_service(service: Service) -> Service {
    match service {
        Service::Insights => Service::Logs,
        other => other,
    }
}

#[derive(Debug, Default)]
struct SourceState {
    cached: Option<Vec<Record>>,
    cursors: HashMap<String, usize>,
    queries: HashMap<String, PendingQuery>,
    next_query: u64,
}

#[derive(Debug)]
struct PendingQuery {
    rows: Vec<QueryRecord>,
    polls: u32,
}

/// Provider for one service over its catalog section.
#[derive(Debug)]
pub struct CatalogSource {
    service: Service,
    data: ServiceData,
    options: CatalogOptions,
    state: Mutex<SourceState>,
}

impl CatalogSource {
    fn new(service: Service, data: ServiceData, options: CatalogOptions) -> Self {
        Self {
            service,
            data,
            options,
            state: Mutex::new(SourceState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, SourceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn simulate_latency(&self) {
        if !self.options.latency.is_zero() {
            tokio::time::sleep(self.options.latency).await;
        }
    }

    fn cached_records(&self, reset: bool) -> Vec<Record> {
        let mut state = self.state();
        if reset {
            state.cursors.clear();
            state.cached = None;
        }
        state
            .cached
            .get_or_insert_with(|| self.data.records.clone())
            .clone()
    }
}

#[async_trait]
impl ListSource for CatalogSource {
    async fn list(&self, reset: bool) -> Result<Vec<Record>> {
        self.simulate_latency().await;
        let records = self.cached_records(reset);
        debug!(service = %self.service, reset, count = records.len(), "listed");
        Ok(records)
    }

    async fn filter(&self, needle: &str) -> Result<Vec<Record>> {
        self.simulate_latency().await;
        Ok(self
            .cached_records(false)
            .into_iter()
            .filter(|record| record.matches_name(needle))
            .collect())
    }
}

#[async_trait]
impl DetailSource for CatalogSource {
    async fn describe(&self, id: &str) -> Result<Option<Record>> {
        self.simulate_latency().await;
        let Some(base) = self.data.records.iter().find(|record| record.id == id) else {
            warn!(service = %self.service, id, "describe on unknown id");
            return Ok(None);
        };
        let mut record = base.clone();
        if let Some(extra) = self.data.details.get(id) {
            record
                .fields
                .extend(extra.iter().map(|(key, value)| (key.clone(), value.clone())));
        }
        Ok(Some(record))
    }
}

#[async_trait]
impl HistorySource for CatalogSource {
    async fn history(&self, id: &str, next_page: bool) -> Result<Vec<Record>> {
        self.simulate_latency().await;
        let Some(entries) = self.data.history.get(id) else {
            return Ok(Vec::new());
        };
        let page_size = self.options.page_size.max(1);
        let mut state = self.state();
        let cursor = state.cursors.entry(id.to_string()).or_insert(0);
        if !next_page {
            *cursor = 0;
        }
        let start = (*cursor).min(entries.len());
        let end = (start + page_size).min(entries.len());
        *cursor = end;
        Ok(entries[start..end].to_vec())
    }
}

#[async_trait]
impl ScanSource for CatalogSource {
    async fn scan(&self, table: &Record) -> Result<Vec<QueryRecord>> {
        self.simulate_latency().await;
        Ok(self
            .data
            .items
            .get(&table.id)
            .map(|items| items.iter().map(mapping_record).collect())
            .unwrap_or_default())
    }
}

#[async_trait]
impl QuerySource for CatalogSource {
    async fn start_query(&self, params: &QueryParams) -> Result<String> {
        self.simulate_latency().await;
        if params.groups.is_empty() {
            bail!("query needs at least one log group");
        }
        let program = QueryProgram::parse(&params.text)?;
        let rows = self
            .data
            .query_rows
            .iter()
            .filter(|row| {
                row.get(LOG_GROUP_FIELD)
                    .map(yaml_text)
                    .is_some_and(|group| params.groups.contains(&group))
            })
            .map(mapping_record)
            .collect::<Vec<_>>();
        let rows = program.run(rows);

        let mut state = self.state();
        state.next_query += 1;
        let id = format!("query-{}", state.next_query);
        debug!(%id, groups = params.groups.len(), rows = rows.len(), "query started");
        state
            .queries
            .insert(id.clone(), PendingQuery { rows, polls: 0 });
        Ok(id)
    }

    /// The first poll reports `Running` with half the rows; later polls
    /// complete the query and forget it.
    async fn query_results(&self, query_id: &str) -> Result<QueryPage> {
        self.simulate_latency().await;
        let mut state = self.state();
        let Some(query) = state.queries.get_mut(query_id) else {
            return Ok(QueryPage {
                status: QueryStatus::Failed,
                records: Vec::new(),
            });
        };
        query.polls += 1;
        if query.polls == 1 && !query.rows.is_empty() {
            let partial = query.rows.len().div_ceil(2);
            return Ok(QueryPage {
                status: QueryStatus::Running,
                records: query.rows[..partial].to_vec(),
            });
        }
        let records = state
            .queries
            .remove(query_id)
            .map(|query| query.rows)
            .unwrap_or_default();
        debug!(query_id, rows = records.len(), "query complete");
        Ok(QueryPage {
            status: QueryStatus::Complete,
            records,
        })
    }
}

fn mapping_record(mapping: &Mapping) -> QueryRecord {
    mapping
        .iter()
        .map(|(key, value)| (yaml_text(key), yaml_text(value)))
        .collect()
}

fn yaml_text(value: &YamlValue) -> String {
    match value {
        YamlValue::Null => String::new(),
        YamlValue::Bool(flag) => flag.to_string(),
        YamlValue::Number(number) => number.to_string(),
        YamlValue::String(text) => text.clone(),
        other => serde_json::to_string(other).unwrap_or_default(),
    }
}

/// Tiny interpreter for the pipe-separated query text:
/// `fields a, b | filter f like /needle/ | sort f desc | limit n`.
#[derive(Debug, Default, PartialEq)]
struct QueryProgram {
    fields: Vec<String>,
    filters: Vec<(String, String)>,
    sort: Option<(String, bool)>,
    limit: Option<usize>,
}

impl QueryProgram {
    fn parse(text: &str) -> Result<Self> {
        let mut program = Self::default();
        for stage in text.split('|').map(str::trim).filter(|stage| !stage.is_empty()) {
            let (command, rest) = stage.split_once(' ').unwrap_or((stage, ""));
            let rest = rest.trim();
            match command {
                "fields" | "display" => {
                    program.fields = rest
                        .split(',')
                        .map(|field| field.trim().to_string())
                        .filter(|field| !field.is_empty())
                        .collect();
                }
                "filter" => {
                    let Some((field, pattern)) = rest.split_once(" like ") else {
                        bail!("unsupported filter '{rest}'");
                    };
                    let needle = pattern.trim().trim_matches('/').trim_matches('"');
                    program
                        .filters
                        .push((field.trim().to_string(), needle.to_string()));
                }
                "sort" => {
                    let mut parts = rest.split_whitespace();
                    let field = parts.next().context("sort needs a field")?;
                    let descending = parts.next() == Some("desc");
                    program.sort = Some((field.to_string(), descending));
                }
                "limit" => {
                    program.limit = Some(
                        rest.parse()
                            .with_context(|| format!("invalid limit '{rest}'"))?,
                    );
                }
                other => bail!("unsupported query command '{other}'"),
            }
        }
        Ok(program)
    }

    fn run(&self, rows: Vec<QueryRecord>) -> Vec<QueryRecord> {
        let field_value = |row: &QueryRecord, field: &str| {
            row.iter()
                .find(|(key, _)| key == field)
                .map(|(_, value)| value.clone())
        };

        let mut rows = rows
            .into_iter()
            .filter(|row| {
                self.filters.iter().all(|(field, needle)| {
                    field_value(row, field).is_some_and(|value| value.contains(needle.as_str()))
                })
            })
            .collect::<Vec<_>>();

        if let Some((field, descending)) = &self.sort {
            rows.sort_by(|left, right| {
                let order = field_value(left, field).cmp(&field_value(right, field));
                if *descending { order.reverse() } else { order }
            });
        }
        if let Some(limit) = self.limit {
            rows.truncate(limit);
        }
        if self.fields.is_empty() {
            return rows;
        }
        rows.into_iter()
            .map(|row| {
                self.fields
                    .iter()
                    .filter_map(|field| {
                        field_value(&row, field).map(|value| (field.clone(), value))
                    })
                    .collect()
            })
            .collect()
    }
}
