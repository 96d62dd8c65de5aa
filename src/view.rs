use serde::Serialize;
use std::sync::Arc;

use crate::catalog::CatalogStore;
use crate::models::{JobRecord, RecordId};
use crate::overlay::{Overlay, OverlayCoordinator};
use crate::requests::{Completion, FraudRequestManager, RequestState};
use crate::scoring::ScoringService;
use crate::search::{self, Pagination};

/// Everything the browser shows that is not a request or a record.
#[derive(Debug, Clone, Serialize)]
pub struct ViewState {
    pub query: String,
    pub pagination: Pagination,
    pub overlay: OverlayCoordinator,
}

impl ViewState {
    pub fn new(page_size: usize) -> Self {
        Self {
            query: String::new(),
            pagination: Pagination::new(page_size),
            overlay: OverlayCoordinator::new(),
        }
    }
}

/// Owns the catalog, the view state and the request manager, and is the only
/// place any of them change.
pub struct CatalogBrowser {
    catalog: CatalogStore,
    view: ViewState,
    requests: FraudRequestManager,
}

impl CatalogBrowser {
    pub fn new(catalog: CatalogStore, service: Arc<dyn ScoringService>, page_size: usize) -> Self {
        Self {
            catalog,
            view: ViewState::new(page_size),
            requests: FraudRequestManager::new(service),
        }
    }

    pub fn catalog(&self) -> &CatalogStore {
        &self.catalog
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn query(&self) -> &str {
        &self.view.query
    }

    pub fn overlay(&self) -> &Overlay {
        self.view.overlay.current()
    }

    pub fn status(&self, id: RecordId) -> &RequestState {
        self.requests.status(id)
    }

    pub fn pending_count(&self) -> usize {
        self.requests.pending_count()
    }

    // --- Search and pagination ---

    /// Replaces the query. A different query starts again at the first page.
    pub fn set_query(&mut self, query: impl Into<String>) {
        let query = query.into();
        if query != self.view.query {
            self.view.query = query;
            self.view.pagination.reset();
        }
    }

    pub fn filtered(&self) -> Vec<&JobRecord> {
        search::filter(self.catalog.records(), &self.view.query)
    }

    pub fn visible(&self) -> Vec<&JobRecord> {
        let filtered = self.filtered();
        self.view.pagination.visible(&filtered).to_vec()
    }

    pub fn has_more(&self) -> bool {
        self.view.pagination.has_more(self.filtered().len())
    }

    pub fn remaining(&self) -> usize {
        self.view.pagination.remaining(self.filtered().len())
    }

    pub fn load_more(&mut self) {
        let len = self.filtered().len();
        self.view.pagination.load_more(len);
    }

    // --- Overlays ---

    pub fn open_detail(&mut self, id: RecordId) -> bool {
        match self.catalog.get(id) {
            Some(record) => {
                self.view.overlay.open_detail(record.clone());
                true
            }
            None => false,
        }
    }

    pub fn close_overlay(&mut self) {
        self.view.overlay.close();
    }

    // --- Fraud checks ---

    /// Starts a check for a record. Unknown ids are ignored.
    pub fn analyze(&mut self, id: RecordId) -> Option<u64> {
        let record = self.catalog.get(id)?;
        Some(self.requests.analyze(record))
    }

    /// Applies one completion; a success opens the result overlay.
    pub fn apply(&mut self, completion: Completion) -> bool {
        match self.requests.apply(completion) {
            Some(result) => {
                self.view.overlay.open_result(result);
                true
            }
            None => false,
        }
    }

    /// Applies every completion that has already arrived.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        while let Some(completion) = self.requests.try_next_completion() {
            self.apply(completion);
            applied += 1;
        }
        applied
    }

    /// Waits for the next completion and applies it.
    #[allow(dead_code)]
    pub async fn settle_next(&mut self) -> bool {
        match self.requests.next_completion().await {
            Some(completion) => self.apply(completion),
            None => false,
        }
    }

    pub fn view_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.view)
    }
}
