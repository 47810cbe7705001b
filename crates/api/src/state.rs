use std::sync::Arc;

use vendorlink_db::store::LedgerStore;

use crate::config::ServerConfig;
use crate::engine::aggregator::ProjectAggregator;
use crate::engine::candidates::CandidateFilter;
use crate::engine::ledger::RequestLedger;
use crate::engine::negotiation::NegotiationEngine;
use crate::engine::profiles::Profiles;
use crate::engine::progress::ProgressTracker;
use crate::engine::reconcile::MirrorReconciler;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; the engine services it hands out are built per call
/// from the shared store handle.
#[derive(Clone)]
pub struct AppState {
    /// The ledger store (PostgreSQL in production, in-memory in tests).
    pub store: Arc<dyn LedgerStore>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(store: Arc<dyn LedgerStore>, config: ServerConfig) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }

    pub fn ledger(&self) -> RequestLedger {
        RequestLedger::new(Arc::clone(&self.store))
    }

    pub fn negotiation(&self) -> NegotiationEngine {
        NegotiationEngine::new(Arc::clone(&self.store))
    }

    pub fn candidates(&self) -> CandidateFilter {
        CandidateFilter::new(Arc::clone(&self.store), self.config.search)
    }

    pub fn progress(&self) -> ProgressTracker {
        ProgressTracker::new(Arc::clone(&self.store))
    }

    pub fn projects(&self) -> ProjectAggregator {
        ProjectAggregator::new(Arc::clone(&self.store))
    }

    pub fn profiles(&self) -> Profiles {
        Profiles::new(Arc::clone(&self.store))
    }

    pub fn reconciler(&self) -> MirrorReconciler {
        MirrorReconciler::new(Arc::clone(&self.store))
    }
}
