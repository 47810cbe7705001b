//! In-process [`LedgerStore`] used by tests and local experiments.
//!
//! Each method takes the state lock once, so every call is atomic exactly
//! like a single-document write, and nothing spans calls. Mirror removals
//! can be made to fail on demand to exercise partial-failure paths.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;
use vendorlink_core::negotiation::NegotiationState;
use vendorlink_core::progress::{set_step, ProgressStep};
use vendorlink_core::project::project_name_key;
use vendorlink_core::types::DbId;
use vendorlink_core::vendor_role::VendorRole;

use super::{GuardedUpdate, LedgerStore, StoreError, StoreResult};
use crate::models::project::{Project, ProjectMirrorEntry, SentRequest};
use crate::models::user::{CreateUser, User};
use crate::models::vendor::{CreateVendor, Vendor, VendorReview};
use crate::models::vendor_request::{NewVendorRequest, RequestQuery, VendorRequest};

#[derive(Default)]
struct State {
    next_id: DbId,
    users: BTreeMap<DbId, User>,
    vendors: BTreeMap<DbId, Vendor>,
    projects: BTreeMap<DbId, Project>,
    requests: BTreeMap<DbId, VendorRequest>,
    sent_requests: BTreeMap<DbId, Vec<SentRequest>>,
    inboxes: BTreeMap<DbId, Vec<DbId>>,
    /// request id -> processed
    retraction_intents: BTreeMap<DbId, bool>,
}

impl State {
    fn next_id(&mut self) -> DbId {
        self.next_id += 1;
        self.next_id
    }

    fn has_booked_sibling(&self, request: &VendorRequest) -> bool {
        self.requests
            .values()
            .any(|other| other.is_sibling_of(request) && other.is_booked())
    }

    /// Apply `write` to request `id` unless a sibling is already booked.
    fn guarded_write(&mut self, id: DbId, write: impl FnOnce(&mut VendorRequest)) -> GuardedUpdate {
        let Some(current) = self.requests.get(&id) else {
            return GuardedUpdate::Missing;
        };
        if self.has_booked_sibling(current) {
            return GuardedUpdate::Blocked;
        }
        let Some(request) = self.requests.get_mut(&id) else {
            return GuardedUpdate::Missing;
        };
        write(request);
        request.updated_at = chrono::Utc::now();
        GuardedUpdate::Applied(request.clone())
    }
}

#[derive(Default)]
pub struct MemoryLedgerStore {
    state: Mutex<State>,
    fail_mirror_removals: AtomicBool,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent mirror removal fail with
    /// [`StoreError::Unavailable`] until switched off again.
    pub fn set_fail_mirror_removals(&self, fail: bool) {
        self.fail_mirror_removals.store(fail, Ordering::SeqCst);
    }

    /// Insert or overwrite a ledger row exactly as given, bypassing every
    /// guard. Lets tests stage states that only a race could produce.
    pub async fn put_request(&self, request: VendorRequest) {
        let mut state = self.state.lock().await;
        state.next_id = state.next_id.max(request.id);
        state.requests.insert(request.id, request);
    }

    fn check_mirror_removal(&self) -> StoreResult<()> {
        if self.fail_mirror_removals.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(
                "mirror removal rejected".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn create_user(&self, input: &CreateUser) -> StoreResult<User> {
        let mut state = self.state.lock().await;
        if state
            .users
            .values()
            .any(|u| u.email.eq_ignore_ascii_case(&input.email))
        {
            return Err(StoreError::Conflict("uq_users_email".to_string()));
        }
        let now = chrono::Utc::now();
        let user = User {
            id: state.next_id(),
            name: input.name.clone(),
            email: input.email.clone(),
            phone: input.phone.clone(),
            profile_image: input.profile_image.clone(),
            created_at: now,
            updated_at: now,
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: DbId) -> StoreResult<Option<User>> {
        Ok(self.state.lock().await.users.get(&id).cloned())
    }

    async fn create_vendor(&self, input: &CreateVendor) -> StoreResult<Vendor> {
        let mut state = self.state.lock().await;
        if state
            .vendors
            .values()
            .any(|v| v.email.eq_ignore_ascii_case(&input.email))
        {
            return Err(StoreError::Conflict("uq_vendors_email".to_string()));
        }
        let now = chrono::Utc::now();
        let vendor = Vendor {
            id: state.next_id(),
            name: input.name.clone(),
            email: input.email.clone(),
            phone: input.phone.clone(),
            role: input.role,
            description: input.description.clone(),
            longitude: input.location.longitude,
            latitude: input.location.latitude,
            profile_image: input.profile_image.clone(),
            work_images: input.work_images.clone(),
            rating: 0.0,
            created_at: now,
            updated_at: now,
        };
        state.vendors.insert(vendor.id, vendor.clone());
        Ok(vendor)
    }

    async fn find_vendor(&self, id: DbId) -> StoreResult<Option<Vendor>> {
        Ok(self.state.lock().await.vendors.get(&id).cloned())
    }

    async fn list_vendors_by_role(&self, role: VendorRole) -> StoreResult<Vec<Vendor>> {
        let state = self.state.lock().await;
        Ok(state
            .vendors
            .values()
            .filter(|v| v.role == role)
            .cloned()
            .collect())
    }

    async fn set_vendor_rating(&self, vendor_id: DbId, rating: f64) -> StoreResult<bool> {
        let mut state = self.state.lock().await;
        Ok(match state.vendors.get_mut(&vendor_id) {
            Some(vendor) => {
                vendor.rating = rating;
                vendor.updated_at = chrono::Utc::now();
                true
            }
            None => false,
        })
    }

    async fn vendor_reviews(&self, vendor_id: DbId) -> StoreResult<Vec<VendorReview>> {
        let state = self.state.lock().await;
        let mut reviews: Vec<VendorReview> = state
            .requests
            .values()
            .filter(|r| r.vendor_id == vendor_id)
            .filter_map(|r| {
                Some(VendorReview {
                    request_id: r.id,
                    user_id: r.user_id,
                    rating: r.rating?,
                    message: r.rating_message.clone()?,
                    reviewed_at: r.reviewed_at?,
                })
            })
            .collect();
        reviews.sort_by(|a, b| b.reviewed_at.cmp(&a.reviewed_at));
        Ok(reviews)
    }

    async fn create_project(&self, user_id: DbId, name: &str) -> StoreResult<Project> {
        let mut state = self.state.lock().await;
        let key = project_name_key(name);
        if state
            .projects
            .values()
            .any(|p| p.user_id == user_id && project_name_key(&p.name) == key)
        {
            return Err(StoreError::Conflict("uq_projects_user_name".to_string()));
        }
        let now = chrono::Utc::now();
        let project = Project {
            id: state.next_id(),
            user_id,
            name: name.to_string(),
            created_at: now,
            updated_at: now,
        };
        state.projects.insert(project.id, project.clone());
        Ok(project)
    }

    async fn find_project(&self, id: DbId) -> StoreResult<Option<Project>> {
        Ok(self.state.lock().await.projects.get(&id).cloned())
    }

    async fn find_project_by_name(
        &self,
        user_id: DbId,
        name: &str,
    ) -> StoreResult<Option<Project>> {
        let key = project_name_key(name);
        let state = self.state.lock().await;
        Ok(state
            .projects
            .values()
            .find(|p| p.user_id == user_id && project_name_key(&p.name) == key)
            .cloned())
    }

    async fn list_projects(&self, user_id: DbId) -> StoreResult<Vec<Project>> {
        let state = self.state.lock().await;
        Ok(state
            .projects
            .values()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn insert_request(&self, input: &NewVendorRequest) -> StoreResult<VendorRequest> {
        let mut state = self.state.lock().await;
        let now = chrono::Utc::now();
        let request = VendorRequest {
            id: state.next_id(),
            user_id: input.user_id,
            vendor_id: input.vendor_id,
            project_id: input.project_id,
            role: input.role,
            description: input.description.clone(),
            longitude: input.point.longitude,
            latitude: input.point.latitude,
            start_at: input.window.start,
            end_at: input.window.end,
            vendor_status: NegotiationState::Pending,
            user_status: NegotiationState::Pending,
            budget: None,
            additional_details: None,
            progress: Vec::new(),
            rating: None,
            rating_message: None,
            reviewed_at: None,
            created_at: now,
            updated_at: now,
        };
        state.requests.insert(request.id, request.clone());
        Ok(request)
    }

    async fn find_request(&self, id: DbId) -> StoreResult<Option<VendorRequest>> {
        Ok(self.state.lock().await.requests.get(&id).cloned())
    }

    async fn list_requests(&self, query: &RequestQuery) -> StoreResult<Vec<VendorRequest>> {
        let state = self.state.lock().await;
        Ok(state
            .requests
            .values()
            .filter(|r| query.matches(r))
            .cloned()
            .collect())
    }

    async fn accept_as_vendor(
        &self,
        id: DbId,
        budget: Option<f64>,
        additional_details: Option<&str>,
    ) -> StoreResult<GuardedUpdate> {
        let mut state = self.state.lock().await;
        Ok(state.guarded_write(id, |request| {
            if request.vendor_status != NegotiationState::Accepted {
                request.vendor_status = NegotiationState::Accepted;
                request.budget = budget;
                request.additional_details = additional_details.map(str::to_string);
            }
        }))
    }

    async fn accept_as_user(&self, id: DbId) -> StoreResult<GuardedUpdate> {
        let mut state = self.state.lock().await;
        Ok(state.guarded_write(id, |request| {
            request.user_status = NegotiationState::Accepted;
        }))
    }

    async fn seed_progress(&self, id: DbId, steps: &[ProgressStep]) -> StoreResult<bool> {
        let mut state = self.state.lock().await;
        match state.requests.get_mut(&id) {
            Some(request) if request.is_booked() && request.progress.is_empty() => {
                request.progress = steps.to_vec();
                request.updated_at = chrono::Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn set_progress_step(
        &self,
        id: DbId,
        step: &str,
        done: bool,
    ) -> StoreResult<GuardedUpdate> {
        let mut state = self.state.lock().await;
        let Some(request) = state.requests.get_mut(&id) else {
            return Ok(GuardedUpdate::Missing);
        };
        if !request.is_booked() || set_step(&mut request.progress, step, done).is_err() {
            return Ok(GuardedUpdate::Blocked);
        }
        request.updated_at = chrono::Utc::now();
        Ok(GuardedUpdate::Applied(request.clone()))
    }

    async fn record_review(
        &self,
        id: DbId,
        rating: i16,
        message: &str,
    ) -> StoreResult<GuardedUpdate> {
        let mut state = self.state.lock().await;
        let Some(request) = state.requests.get_mut(&id) else {
            return Ok(GuardedUpdate::Missing);
        };
        if request.rating.is_some() || !request.is_booked() {
            return Ok(GuardedUpdate::Blocked);
        }
        let now = chrono::Utc::now();
        request.rating = Some(rating);
        request.rating_message = Some(message.to_string());
        request.reviewed_at = Some(now);
        request.updated_at = now;
        Ok(GuardedUpdate::Applied(request.clone()))
    }

    async fn vendor_ratings(&self, vendor_id: DbId) -> StoreResult<Vec<i16>> {
        let state = self.state.lock().await;
        Ok(state
            .requests
            .values()
            .filter(|r| r.vendor_id == vendor_id)
            .filter_map(|r| r.rating)
            .collect())
    }

    async fn delete_request(&self, id: DbId) -> StoreResult<bool> {
        Ok(self.state.lock().await.requests.remove(&id).is_some())
    }

    async fn add_sent_request(
        &self,
        project_id: DbId,
        request_id: DbId,
        role: VendorRole,
    ) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        let entries = state.sent_requests.entry(project_id).or_default();
        if !entries.iter().any(|e| e.request_id == request_id) {
            entries.push(SentRequest { request_id, role });
        }
        Ok(())
    }

    async fn remove_sent_request(&self, project_id: DbId, request_id: DbId) -> StoreResult<()> {
        self.check_mirror_removal()?;
        let mut state = self.state.lock().await;
        if let Some(entries) = state.sent_requests.get_mut(&project_id) {
            entries.retain(|e| e.request_id != request_id);
        }
        Ok(())
    }

    async fn sent_requests(&self, project_id: DbId) -> StoreResult<Vec<SentRequest>> {
        let state = self.state.lock().await;
        Ok(state
            .sent_requests
            .get(&project_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn all_sent_requests(&self) -> StoreResult<Vec<ProjectMirrorEntry>> {
        let state = self.state.lock().await;
        Ok(state
            .sent_requests
            .iter()
            .flat_map(|(project_id, entries)| {
                entries.iter().map(|e| ProjectMirrorEntry {
                    project_id: *project_id,
                    request_id: e.request_id,
                    role: e.role,
                })
            })
            .collect())
    }

    async fn add_inbox_entry(&self, vendor_id: DbId, request_id: DbId) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        let entries = state.inboxes.entry(vendor_id).or_default();
        if !entries.contains(&request_id) {
            entries.push(request_id);
        }
        Ok(())
    }

    async fn remove_inbox_entry(&self, vendor_id: DbId, request_id: DbId) -> StoreResult<()> {
        self.check_mirror_removal()?;
        let mut state = self.state.lock().await;
        if let Some(entries) = state.inboxes.get_mut(&vendor_id) {
            entries.retain(|id| *id != request_id);
        }
        Ok(())
    }

    async fn inbox(&self, vendor_id: DbId) -> StoreResult<Vec<DbId>> {
        let state = self.state.lock().await;
        Ok(state.inboxes.get(&vendor_id).cloned().unwrap_or_default())
    }

    async fn all_inbox_entries(&self) -> StoreResult<Vec<(DbId, DbId)>> {
        let state = self.state.lock().await;
        Ok(state
            .inboxes
            .iter()
            .flat_map(|(vendor_id, ids)| ids.iter().map(move |id| (*vendor_id, *id)))
            .collect())
    }

    async fn remove_request_from_mirrors(&self, request_id: DbId) -> StoreResult<u64> {
        self.check_mirror_removal()?;
        let mut state = self.state.lock().await;
        let mut removed = 0;
        for entries in state.sent_requests.values_mut() {
            let before = entries.len();
            entries.retain(|e| e.request_id != request_id);
            removed += (before - entries.len()) as u64;
        }
        for ids in state.inboxes.values_mut() {
            let before = ids.len();
            ids.retain(|id| *id != request_id);
            removed += (before - ids.len()) as u64;
        }
        Ok(removed)
    }

    async fn record_retraction_intent(&self, request_id: DbId) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        state.retraction_intents.insert(request_id, false);
        Ok(())
    }

    async fn complete_retraction_intent(&self, request_id: DbId) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        if let Some(processed) = state.retraction_intents.get_mut(&request_id) {
            *processed = true;
        }
        Ok(())
    }

    async fn pending_retraction_intents(&self) -> StoreResult<Vec<DbId>> {
        let state = self.state.lock().await;
        Ok(state
            .retraction_intents
            .iter()
            .filter(|(_, processed)| !**processed)
            .map(|(id, _)| *id)
            .collect())
    }
}
