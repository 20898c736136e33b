use anyhow::Result;
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use tracing::warn;

use crate::model::{QueryPage, QueryParams, QueryRecord, Record};

/// Listing capability shared by every resource kind.
///
/// `reset` drops the provider's own cache and pagination state; otherwise
/// the provider may answer from what it already holds.
#[async_trait]
pub trait ListSource: Send + Sync {
    async fn list(&self, reset: bool) -> Result<Vec<Record>>;

    async fn filter(&self, needle: &str) -> Result<Vec<Record>>;
}

#[async_trait]
pub trait DetailSource: Send + Sync {
    async fn describe(&self, id: &str) -> Result<Option<Record>>;
}

/// Paginated item histories. `next_page` continues after the last page
/// handed out for `id`; otherwise the listing restarts from the top.
#[async_trait]
pub trait HistorySource: Send + Sync {
    async fn history(&self, id: &str, next_page: bool) -> Result<Vec<Record>>;

    async fn events(&self, id: &str, next_page: bool) -> Result<Vec<Record>> {
        self.history(id, next_page).await
    }
}

#[async_trait]
pub trait ScanSource: Send + Sync {
    async fn scan(&self, table: &Record) -> Result<Vec<QueryRecord>>;
}

#[async_trait]
pub trait QuerySource: Send + Sync {
    async fn start_query(&self, params: &QueryParams) -> Result<String>;

    async fn query_results(&self, query_id: &str) -> Result<QueryPage>;
}

/// The capability set one screen is built over.
#[derive(Clone)]
pub struct Sources {
    pub list: Arc<dyn ListSource>,
    pub detail: Option<Arc<dyn DetailSource>>,
    pub history: Option<Arc<dyn HistorySource>>,
    pub scan: Option<Arc<dyn ScanSource>>,
    pub query: Option<Arc<dyn QuerySource>>,
}

impl Sources {
    pub fn listing(list: Arc<dyn ListSource>) -> Self {
        Self {
            list,
            detail: None,
            history: None,
            scan: None,
            query: None,
        }
    }
}

/// Awaits a provider call and collapses a failure into the empty value.
pub async fn or_empty<T, F>(what: &str, call: F) -> T
where
    T: Default,
    F: Future<Output = Result<T>>,
{
    match call.await {
        Ok(value) => value,
        Err(error) => {
            warn!("{what} produced an empty refresh: {error:#}");
            T::default()
        }
    }
}
