use std::sync::Arc;

use crate::cache::ResponseCache;
use crate::db::QueryExecutor;

/// Services shared by every worker. Built once in `main` (or by a test) and
/// handed to the router.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn QueryExecutor>,
    pub cache: Arc<ResponseCache>,
}

impl AppState {
    pub fn new(db: Arc<dyn QueryExecutor>, cache: Arc<ResponseCache>) -> Self {
        Self { db, cache }
    }
}
