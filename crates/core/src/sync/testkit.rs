//! In-memory fakes for the sync engine's ports, shared by the unit tests.

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use syncline_domain::{
    Appointment, AppointmentStatus, Credential, EventMirror, FetchWindow, RemoteEvent,
    RemoteEventStatus, Result, SyncError, SyncRunRecord,
};

use super::ports::{
    AppointmentRepository, CalendarProvider, CreatedEvent, CredentialRepository, EventDraft,
    EventMirrorRepository, EventsPage, RefreshedToken, SyncRunRepository,
};

/// Confirmed remote event lasting one hour.
pub fn remote_event(external_id: &str, start_at: DateTime<Utc>) -> RemoteEvent {
    RemoteEvent {
        external_id: external_id.to_string(),
        status: RemoteEventStatus::Confirmed,
        title: Some(format!("Event {external_id}")),
        description: None,
        location: None,
        start_at,
        end_at: start_at + Duration::hours(1),
        is_all_day: false,
        timezone: Some("UTC".to_string()),
        etag: Some(format!("etag-{external_id}")),
        meeting_link: None,
        attendees: Vec::new(),
        recurrence_rule: None,
        recurring_event_id: None,
    }
}

/// Cancelled variant of [`remote_event`].
pub fn cancelled_event(external_id: &str, start_at: DateTime<Utc>) -> RemoteEvent {
    RemoteEvent { status: RemoteEventStatus::Cancelled, ..remote_event(external_id, start_at) }
}

/// Unmirrored scheduled appointment lasting one hour.
pub fn appointment(id: &str, tenant_id: &str, start_at: DateTime<Utc>) -> Appointment {
    Appointment {
        id: id.to_string(),
        tenant_id: tenant_id.to_string(),
        service_name: "Consultation".to_string(),
        client_name: "Alex Doe".to_string(),
        notes: None,
        location: None,
        start_at,
        end_at: start_at + Duration::hours(1),
        timezone: "UTC".to_string(),
        status: AppointmentStatus::Scheduled,
        external_event_id: None,
    }
}

#[derive(Default)]
pub struct FakeCredentialRepository {
    rows: Mutex<BTreeMap<String, Credential>>,
    token_writes: AtomicUsize,
}

impl FakeCredentialRepository {
    /// Active credential with the canonical fake tokens.
    pub fn credential(tenant_id: &str, expires_at: DateTime<Utc>) -> Credential {
        Credential {
            tenant_id: tenant_id.to_string(),
            access_token: "access-0".to_string(),
            refresh_token: "refresh".to_string(),
            token_expires_at: expires_at,
            default_calendar_id: "primary".to_string(),
            is_active: true,
            last_sync_at: None,
        }
    }

    pub fn insert(&self, credential: Credential) {
        let mut rows = self.rows.lock().expect("credential lock");
        rows.insert(credential.tenant_id.clone(), credential);
    }

    /// Access-token writes observed, one per actual refresh.
    pub fn token_writes(&self) -> usize {
        self.token_writes.load(Ordering::SeqCst)
    }

    pub fn find_active_sync(&self, tenant_id: &str) -> Option<Credential> {
        let rows = self.rows.lock().expect("credential lock");
        rows.get(tenant_id).filter(|c| c.is_active).cloned()
    }

    pub fn last_sync_of(&self, tenant_id: &str) -> Option<DateTime<Utc>> {
        let rows = self.rows.lock().expect("credential lock");
        rows.get(tenant_id).and_then(|c| c.last_sync_at)
    }
}

#[async_trait]
impl CredentialRepository for FakeCredentialRepository {
    async fn find_active(&self, tenant_id: &str) -> Result<Option<Credential>> {
        Ok(self.find_active_sync(tenant_id))
    }

    async fn update_access_token(
        &self,
        tenant_id: &str,
        access_token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        let mut rows = self.rows.lock().expect("credential lock");
        let credential = rows
            .get_mut(tenant_id)
            .ok_or_else(|| SyncError::CredentialNotFound(tenant_id.to_string()))?;
        credential.access_token = access_token.to_string();
        credential.token_expires_at = expires_at;
        self.token_writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn mark_inactive(&self, tenant_id: &str) -> Result<()> {
        let mut rows = self.rows.lock().expect("credential lock");
        if let Some(credential) = rows.get_mut(tenant_id) {
            credential.is_active = false;
        }
        Ok(())
    }

    async fn update_last_sync(&self, tenant_id: &str, at: DateTime<Utc>) -> Result<()> {
        let mut rows = self.rows.lock().expect("credential lock");
        if let Some(credential) = rows.get_mut(tenant_id) {
            credential.last_sync_at = Some(at);
        }
        Ok(())
    }

    async fn list_active_tenants(&self) -> Result<Vec<String>> {
        let rows = self.rows.lock().expect("credential lock");
        Ok(rows.values().filter(|c| c.is_active).map(|c| c.tenant_id.clone()).collect())
    }
}

#[derive(Default)]
pub struct FakeProvider {
    refresh_calls: AtomicUsize,
    reject_refresh: AtomicBool,
    refresh_failure: Mutex<Option<String>>,
    pages: Mutex<VecDeque<std::result::Result<EventsPage, String>>>,
    fetch_calls: AtomicUsize,
    create_calls: AtomicUsize,
    create_failures: Mutex<VecDeque<String>>,
}

impl FakeProvider {
    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    /// Make every refresh behave as a revoked refresh token.
    pub fn reject_refresh(&self) {
        self.reject_refresh.store(true, Ordering::SeqCst);
    }

    /// Make the next refresh fail transiently.
    pub fn fail_next_refresh(&self, message: &str) {
        let mut failure = self.refresh_failure.lock().expect("provider lock");
        *failure = Some(message.to_string());
    }

    /// Queue one events page; pages are served in queue order.
    pub fn queue_page(&self, page: EventsPage) {
        let mut pages = self.pages.lock().expect("provider lock");
        pages.push_back(Ok(page));
    }

    /// Queue a transient failure at the current position in the page queue.
    pub fn fail_next_fetch(&self, message: &str) {
        let mut pages = self.pages.lock().expect("provider lock");
        pages.push_back(Err(message.to_string()));
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    /// Fail the next create call with a transient provider error.
    pub fn fail_next_create(&self, message: &str) {
        let mut failures = self.create_failures.lock().expect("provider lock");
        failures.push_back(message.to_string());
    }
}

#[async_trait]
impl CalendarProvider for FakeProvider {
    async fn refresh_access_token(&self, _refresh_token: &str) -> Result<RefreshedToken> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        if self.reject_refresh.load(Ordering::SeqCst) {
            return Err(SyncError::ReauthorizationRequired("refresh token revoked".to_string()));
        }
        let pending = self.refresh_failure.lock().expect("provider lock").take();
        if let Some(message) = pending {
            return Err(SyncError::ProviderUnavailable(message));
        }
        Ok(RefreshedToken { access_token: "refreshed-access".to_string(), expires_in: 3600 })
    }

    async fn fetch_events_page(
        &self,
        _access_token: &str,
        _calendar_id: &str,
        _window: FetchWindow,
        _page_token: Option<&str>,
    ) -> Result<EventsPage> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        let mut pages = self.pages.lock().expect("provider lock");
        match pages.pop_front() {
            Some(Ok(page)) => Ok(page),
            Some(Err(message)) => Err(SyncError::ProviderUnavailable(message)),
            None => Ok(EventsPage { events: Vec::new(), next_page_token: None }),
        }
    }

    async fn create_event(
        &self,
        _access_token: &str,
        _calendar_id: &str,
        _draft: &EventDraft,
    ) -> Result<CreatedEvent> {
        let call = self.create_calls.fetch_add(1, Ordering::SeqCst);
        let failure = self.create_failures.lock().expect("provider lock").pop_front();
        if let Some(message) = failure {
            return Err(SyncError::ProviderUnavailable(message));
        }
        Ok(CreatedEvent { external_id: format!("evt-{call}"), meeting_link: None })
    }
}

#[derive(Default)]
pub struct FakeMirrorRepository {
    rows: Mutex<BTreeMap<(String, String), EventMirror>>,
    fail_upsert_for: Mutex<Option<String>>,
}

impl FakeMirrorRepository {
    /// Simulate a constraint violation when upserting this external id.
    pub fn fail_upsert_for(&self, external_id: &str) {
        let mut target = self.fail_upsert_for.lock().expect("mirror lock");
        *target = Some(external_id.to_string());
    }

    pub fn len(&self) -> usize {
        self.rows.lock().expect("mirror lock").len()
    }

    pub fn contains(&self, tenant_id: &str, external_event_id: &str) -> bool {
        let rows = self.rows.lock().expect("mirror lock");
        rows.contains_key(&(tenant_id.to_string(), external_event_id.to_string()))
    }

    pub fn get(&self, tenant_id: &str, external_event_id: &str) -> Option<EventMirror> {
        let rows = self.rows.lock().expect("mirror lock");
        rows.get(&(tenant_id.to_string(), external_event_id.to_string())).cloned()
    }

    /// Row keys in table order, for comparing end states.
    pub fn snapshot(&self) -> Vec<(String, String)> {
        let rows = self.rows.lock().expect("mirror lock");
        rows.keys().cloned().collect()
    }
}

#[async_trait]
impl EventMirrorRepository for FakeMirrorRepository {
    async fn upsert(&self, mirror: EventMirror) -> Result<()> {
        let target = self.fail_upsert_for.lock().expect("mirror lock");
        if target.as_deref() == Some(mirror.external_event_id.as_str()) {
            return Err(SyncError::Database("UNIQUE constraint failed".to_string()));
        }
        drop(target);
        let mut rows = self.rows.lock().expect("mirror lock");
        rows.insert((mirror.tenant_id.clone(), mirror.external_event_id.clone()), mirror);
        Ok(())
    }

    async fn delete(&self, tenant_id: &str, external_event_id: &str) -> Result<bool> {
        let mut rows = self.rows.lock().expect("mirror lock");
        Ok(rows.remove(&(tenant_id.to_string(), external_event_id.to_string())).is_some())
    }

    async fn find(
        &self,
        tenant_id: &str,
        external_event_id: &str,
    ) -> Result<Option<EventMirror>> {
        Ok(self.get(tenant_id, external_event_id))
    }
}

#[derive(Default)]
pub struct FakeAppointmentRepository {
    rows: Mutex<BTreeMap<String, Appointment>>,
    fail_id_writes: AtomicBool,
}

impl FakeAppointmentRepository {
    pub fn insert(&self, appointment: Appointment) {
        let mut rows = self.rows.lock().expect("appointment lock");
        rows.insert(appointment.id.clone(), appointment);
    }

    /// Make every id write fail as a storage error.
    pub fn fail_id_writes(&self) {
        self.fail_id_writes.store(true, Ordering::SeqCst);
    }

    pub fn external_id(&self, appointment_id: &str) -> Option<String> {
        let rows = self.rows.lock().expect("appointment lock");
        rows.get(appointment_id).and_then(|a| a.external_event_id.clone())
    }
}

#[async_trait]
impl AppointmentRepository for FakeAppointmentRepository {
    async fn find_unmirrored(
        &self,
        tenant_id: &str,
        not_before: DateTime<Utc>,
    ) -> Result<Vec<Appointment>> {
        let rows = self.rows.lock().expect("appointment lock");
        let mut pending: Vec<Appointment> = rows
            .values()
            .filter(|a| {
                a.tenant_id == tenant_id
                    && a.external_event_id.is_none()
                    && a.status.is_active()
                    && a.start_at >= not_before
            })
            .cloned()
            .collect();
        pending.sort_by(|a, b| a.start_at.cmp(&b.start_at));
        Ok(pending)
    }

    async fn set_external_event_id(
        &self,
        appointment_id: &str,
        external_event_id: &str,
    ) -> Result<()> {
        if self.fail_id_writes.load(Ordering::SeqCst) {
            return Err(SyncError::Database("disk I/O error".to_string()));
        }
        let mut rows = self.rows.lock().expect("appointment lock");
        let appointment = rows
            .get_mut(appointment_id)
            .ok_or_else(|| SyncError::Database(format!("no appointment {appointment_id}")))?;
        appointment.external_event_id = Some(external_event_id.to_string());
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeSyncRunRepository {
    rows: Mutex<Vec<SyncRunRecord>>,
}

impl FakeSyncRunRepository {
    pub fn records(&self) -> Vec<SyncRunRecord> {
        self.rows.lock().expect("run lock").clone()
    }
}

#[async_trait]
impl SyncRunRepository for FakeSyncRunRepository {
    async fn append(&self, record: &SyncRunRecord) -> Result<()> {
        let mut rows = self.rows.lock().expect("run lock");
        rows.push(record.clone());
        Ok(())
    }

    async fn recent_for_tenant(
        &self,
        tenant_id: &str,
        limit: usize,
    ) -> Result<Vec<SyncRunRecord>> {
        let rows = self.rows.lock().expect("run lock");
        let mut recent: Vec<SyncRunRecord> =
            rows.iter().filter(|r| r.tenant_id == tenant_id).cloned().collect();
        recent.reverse();
        recent.truncate(limit);
        Ok(recent)
    }
}
