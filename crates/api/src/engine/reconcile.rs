//! Mirror reconciliation.
//!
//! Rebuilds the expected project and inbox mirrors from the ledger and
//! applies the difference: entries missing from a mirror are added, and
//! entries whose ledger row is gone are removed. Running it twice in a
//! row changes nothing the second time.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;
use vendorlink_core::error::CoreError;
use vendorlink_core::roles::Capability;
use vendorlink_core::types::DbId;
use vendorlink_db::models::project::ProjectMirrorEntry;
use vendorlink_db::models::vendor_request::RequestQuery;
use vendorlink_db::store::LedgerStore;

use super::Caller;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub sent_added: usize,
    pub sent_removed: usize,
    pub inbox_added: usize,
    pub inbox_removed: usize,
}

#[derive(Clone)]
pub struct MirrorReconciler {
    store: Arc<dyn LedgerStore>,
}

impl MirrorReconciler {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    pub async fn reconcile_mirrors(&self, caller: &Caller) -> Result<ReconcileReport, CoreError> {
        caller.require(Capability::Administer)?;

        // Mirrors are read before the ledger: a request created in between
        // is then only ever added, never removed.
        let actual_sent: BTreeSet<ProjectMirrorEntry> =
            self.store.all_sent_requests().await?.into_iter().collect();
        let actual_inbox: BTreeSet<(DbId, DbId)> =
            self.store.all_inbox_entries().await?.into_iter().collect();

        let ledger = self.store.list_requests(&RequestQuery::default()).await?;
        let expected_sent: BTreeSet<ProjectMirrorEntry> = ledger
            .iter()
            .map(|r| ProjectMirrorEntry {
                project_id: r.project_id,
                request_id: r.id,
                role: r.role,
            })
            .collect();
        let expected_inbox: BTreeSet<(DbId, DbId)> =
            ledger.iter().map(|r| (r.vendor_id, r.id)).collect();

        let mut report = ReconcileReport::default();

        // Removals first, so an entry carrying a wrong role is replaced.
        for entry in actual_sent.difference(&expected_sent) {
            self.store
                .remove_sent_request(entry.project_id, entry.request_id)
                .await?;
            report.sent_removed += 1;
        }
        for entry in expected_sent.difference(&actual_sent) {
            self.store
                .add_sent_request(entry.project_id, entry.request_id, entry.role)
                .await?;
            report.sent_added += 1;
        }
        for &(vendor_id, request_id) in actual_inbox.difference(&expected_inbox) {
            self.store.remove_inbox_entry(vendor_id, request_id).await?;
            report.inbox_removed += 1;
        }
        for &(vendor_id, request_id) in expected_inbox.difference(&actual_inbox) {
            self.store.add_inbox_entry(vendor_id, request_id).await?;
            report.inbox_added += 1;
        }

        tracing::info!(
            sent_added = report.sent_added,
            sent_removed = report.sent_removed,
            inbox_added = report.inbox_added,
            inbox_removed = report.inbox_removed,
            "Mirrors reconciled",
        );
        Ok(report)
    }
}
