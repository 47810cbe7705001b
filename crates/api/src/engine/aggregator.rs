//! Project/Role Aggregator: the caller's projects and the role-level
//! views computed over their requests.

use std::collections::BTreeSet;
use std::sync::Arc;

use futures::future::try_join_all;
use vendorlink_core::error::CoreError;
use vendorlink_core::negotiation::AcceptanceFilter;
use vendorlink_core::project::normalize_project_name;
use vendorlink_core::roles::Capability;
use vendorlink_core::types::DbId;
use vendorlink_core::vendor_role::VendorRole;
use vendorlink_db::models::project::{Project, ProjectWithRequests};
use vendorlink_db::models::vendor_request::RequestQuery;
use vendorlink_db::store::LedgerStore;

use super::ledger::{BulkRemoval, RequestLedger};
use super::{owned_project, Caller};

#[derive(Clone)]
pub struct ProjectAggregator {
    store: Arc<dyn LedgerStore>,
    ledger: RequestLedger,
}

impl ProjectAggregator {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        let ledger = RequestLedger::new(Arc::clone(&store));
        Self { store, ledger }
    }

    /// Create a project. Names are trimmed and unique per user ignoring case.
    pub async fn create_project(&self, caller: &Caller, name: &str) -> Result<Project, CoreError> {
        caller.require(Capability::ActAsUser)?;
        let name = normalize_project_name(name)?;

        self.store
            .find_user(caller.id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "User",
                id: caller.id,
            })?;
        if self
            .store
            .find_project_by_name(caller.id, &name)
            .await?
            .is_some()
        {
            return Err(CoreError::Conflict(format!(
                "A project named '{name}' already exists"
            )));
        }

        let project = self.store.create_project(caller.id, &name).await?;
        tracing::info!(project_id = project.id, user_id = caller.id, "Project created");
        Ok(project)
    }

    /// Every project of the caller with its sent-request mirror.
    pub async fn list_projects(
        &self,
        caller: &Caller,
    ) -> Result<Vec<ProjectWithRequests>, CoreError> {
        caller.require(Capability::ActAsUser)?;
        let projects = self.store.list_projects(caller.id).await?;
        try_join_all(projects.into_iter().map(|project| self.with_requests(project))).await
    }

    pub async fn get_project(
        &self,
        caller: &Caller,
        project_id: DbId,
    ) -> Result<ProjectWithRequests, CoreError> {
        caller.require(Capability::ActAsUser)?;
        let project = owned_project(self.store.as_ref(), caller.id, project_id).await?;
        self.with_requests(project).await
    }

    /// Roles with at least one request not yet booked.
    pub async fn ongoing_roles(
        &self,
        caller: &Caller,
        project_id: DbId,
    ) -> Result<BTreeSet<VendorRole>, CoreError> {
        self.roles_where(caller, project_id, AcceptanceFilter::Open)
            .await
    }

    /// Roles with a booked request.
    pub async fn accepted_roles(
        &self,
        caller: &Caller,
        project_id: DbId,
    ) -> Result<BTreeSet<VendorRole>, CoreError> {
        self.roles_where(caller, project_id, AcceptanceFilter::Booked)
            .await
    }

    /// Delete every request for (project, role) that is not booked.
    pub async fn purge_unaccepted(
        &self,
        caller: &Caller,
        project_id: DbId,
        role: VendorRole,
    ) -> Result<BulkRemoval, CoreError> {
        caller.require(Capability::ActAsUser)?;
        let project = owned_project(self.store.as_ref(), caller.id, project_id).await?;
        let open = self
            .store
            .list_requests(
                &RequestQuery::for_slot(caller.id, project.id, role)
                    .with_acceptance(AcceptanceFilter::Open),
            )
            .await?;

        let outcome = self.ledger.retract_all(&open).await;
        tracing::info!(
            project_id,
            role = %role,
            deleted = outcome.deleted,
            failed = outcome.failed.len(),
            "Purged unaccepted requests",
        );
        Ok(outcome)
    }

    async fn roles_where(
        &self,
        caller: &Caller,
        project_id: DbId,
        acceptance: AcceptanceFilter,
    ) -> Result<BTreeSet<VendorRole>, CoreError> {
        caller.require(Capability::ActAsUser)?;
        owned_project(self.store.as_ref(), caller.id, project_id).await?;
        let requests = self
            .store
            .list_requests(&RequestQuery::for_project(caller.id, project_id).with_acceptance(acceptance))
            .await?;
        Ok(requests.into_iter().map(|r| r.role).collect())
    }

    async fn with_requests(&self, project: Project) -> Result<ProjectWithRequests, CoreError> {
        let sent_requests = self.store.sent_requests(project.id).await?;
        Ok(ProjectWithRequests {
            project,
            sent_requests,
        })
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::engine::testing::Fixture;

    #[tokio::test]
    async fn project_names_are_trimmed_and_unique_ignoring_case() {
        let fx = Fixture::new().await;
        let projects = fx.projects();

        let created = projects.create_project(&fx.user, "  Reception  ").await.unwrap();
        assert_eq!(created.name, "Reception");

        let err = projects
            .create_project(&fx.user, &fx.project.name.to_uppercase())
            .await
            .unwrap_err();
        assert_matches!(err, CoreError::Conflict(_));

        assert_matches!(
            projects.create_project(&fx.user, "   ").await,
            Err(CoreError::Validation(_))
        );
    }

    #[tokio::test]
    async fn listing_includes_the_sent_request_mirror() {
        let fx = Fixture::new().await;
        let request = fx.send(fx.caterers[0]).await;

        let listed = fx.projects().list_projects(&fx.user).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].project.id, fx.project.id);
        assert_eq!(listed[0].sent_requests.len(), 1);
        assert_eq!(listed[0].sent_requests[0].request_id, request.id);
    }

    #[tokio::test]
    async fn role_views_split_open_and_booked() {
        let fx = Fixture::new().await;
        fx.book(fx.caterers[0]).await;
        fx.send(fx.photographer).await;
        let projects = fx.projects();

        let ongoing = projects.ongoing_roles(&fx.user, fx.project.id).await.unwrap();
        let accepted = projects.accepted_roles(&fx.user, fx.project.id).await.unwrap();
        assert_eq!(ongoing, BTreeSet::from([VendorRole::Photographer]));
        assert_eq!(accepted, BTreeSet::from([VendorRole::Caterer]));
    }

    #[tokio::test]
    async fn purge_keeps_the_booked_request() {
        let fx = Fixture::new().await;
        fx.send(fx.caterers[0]).await;
        fx.send(fx.caterers[1]).await;
        fx.send(fx.photographer).await;

        let outcome = fx
            .projects()
            .purge_unaccepted(&fx.user, fx.project.id, VendorRole::Caterer)
            .await
            .unwrap();
        assert_eq!(outcome.deleted, 2);
        assert!(outcome.failed.is_empty());

        let mirror = fx.store.sent_requests(fx.project.id).await.unwrap();
        assert_eq!(mirror.len(), 1);
        assert_eq!(mirror[0].role, VendorRole::Photographer);
    }
}
