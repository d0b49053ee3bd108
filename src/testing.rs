//! Test doubles for the directory client and the edit link.
//!
//! `MockDirectory` serves a fixed user list split into remote pages, records
//! every call, and can fail, delay, or hold responses so tests can build
//! deterministic interleavings.

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;

use crate::error::{Result, UserdeckError};
use crate::remote::{Credentials, DirectoryClient};
use crate::sync::EditLink;
use crate::types::{UserId, UserPatch, UserRecord, UsersPage};

const SAMPLE_NAMES: &[(&str, &str)] = &[
    ("George", "Bluth"),
    ("Janet", "Weaver"),
    ("Emma", "Wong"),
    ("Eve", "Holt"),
    ("Charles", "Morris"),
    ("Tracey", "Ramos"),
    ("Michael", "Lawson"),
    ("Lindsay", "Ferguson"),
    ("Tobias", "Funke"),
    ("Byron", "Fields"),
    ("George", "Edwards"),
    ("Rachel", "Howell"),
];

/// A reqres-style user with ID `id`.
pub fn make_user(id: u64) -> UserRecord {
    let (first, last) = usize::try_from(id)
        .ok()
        .and_then(|i| i.checked_sub(1))
        .and_then(|i| SAMPLE_NAMES.get(i))
        .copied()
        .unwrap_or(("User", "Sample"));
    UserRecord {
        id: UserId::new(id),
        email: format!("{}.{}@reqres.in", first.to_lowercase(), last.to_lowercase()),
        first_name: first.to_string(),
        last_name: last.to_string(),
        avatar: format!("https://reqres.in/img/faces/{id}-image.jpg"),
    }
}

/// Users with IDs `1..=count`.
pub fn make_users(count: u64) -> Vec<UserRecord> {
    (1..=count).map(make_user).collect()
}

/// What `update_record` answers with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpdateEcho {
    /// Only the fields that were sent, everything else blank (reqres behaviour).
    #[default]
    SentFieldsOnly,
    /// The stored record, ignoring the patch (a backend that drops writes).
    Stale,
    /// The stored record with the patch applied.
    Applied,
}

/// Recorded client call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Login,
    FetchPage(u32),
    Update(UserId),
    Delete(UserId),
}

/// Handle that releases held responses.
#[derive(Debug, Clone)]
pub struct Gate {
    sender: std::sync::Arc<watch::Sender<bool>>,
}

impl Gate {
    fn new() -> (Self, watch::Receiver<bool>) {
        let (sender, receiver) = watch::channel(false);
        (
            Self {
                sender: std::sync::Arc::new(sender),
            },
            receiver,
        )
    }

    pub fn open(&self) {
        self.sender.send_replace(true);
    }
}

async fn pass(gate: Option<watch::Receiver<bool>>) {
    if let Some(mut gate) = gate {
        // A dropped sender counts as open.
        let _ = gate.wait_for(|open| *open).await;
    }
}

#[derive(Default)]
struct MockState {
    pages: Vec<Vec<UserRecord>>,
    page_failures: HashMap<u32, UserdeckError>,
    page_delays: HashMap<u32, Duration>,
    update_failure: Option<UserdeckError>,
    delete_failure: Option<UserdeckError>,
    login_failure: Option<UserdeckError>,
    update_echo: UpdateEcho,
    page_gate: Option<watch::Receiver<bool>>,
    mutation_gate: Option<watch::Receiver<bool>>,
    reported_total_pages: Option<u32>,
    calls: Vec<Call>,
}

/// Scripted in-memory directory.
#[derive(Default)]
pub struct MockDirectory {
    state: Mutex<MockState>,
}

impl MockDirectory {
    /// Split `users` into remote pages of `per_page`.
    pub fn with_users(users: Vec<UserRecord>, per_page: usize) -> Self {
        let pages = users
            .chunks(per_page.max(1))
            .map(|chunk| chunk.to_vec())
            .collect();
        Self {
            state: Mutex::new(MockState {
                pages,
                ..MockState::default()
            }),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.clone()
    }

    pub fn fetch_count(&self) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|c| matches!(c, Call::FetchPage(_)))
            .count()
    }

    pub fn fail_page(&self, page: u32, error: UserdeckError) {
        self.state.lock().page_failures.insert(page, error);
    }

    pub fn clear_failures(&self) {
        let mut state = self.state.lock();
        state.page_failures.clear();
        state.update_failure = None;
        state.delete_failure = None;
        state.login_failure = None;
    }

    pub fn delay_page(&self, page: u32, delay: Duration) {
        self.state.lock().page_delays.insert(page, delay);
    }

    pub fn fail_updates(&self, error: UserdeckError) {
        self.state.lock().update_failure = Some(error);
    }

    pub fn fail_deletes(&self, error: UserdeckError) {
        self.state.lock().delete_failure = Some(error);
    }

    pub fn fail_login(&self, error: UserdeckError) {
        self.state.lock().login_failure = Some(error);
    }

    /// Report `total_pages` on every page instead of the real count.
    pub fn report_total_pages(&self, total_pages: u32) {
        self.state.lock().reported_total_pages = Some(total_pages);
    }

    pub fn set_update_echo(&self, echo: UpdateEcho) {
        self.state.lock().update_echo = echo;
    }

    /// Hold every page response until the returned gate is opened.
    pub fn hold_pages(&self) -> Gate {
        let (gate, receiver) = Gate::new();
        self.state.lock().page_gate = Some(receiver);
        gate
    }

    /// Hold every update/delete response until the returned gate is opened.
    pub fn hold_mutations(&self) -> Gate {
        let (gate, receiver) = Gate::new();
        self.state.lock().mutation_gate = Some(receiver);
        gate
    }

    fn stored(&self, id: UserId) -> Option<UserRecord> {
        self.state
            .lock()
            .pages
            .iter()
            .flatten()
            .find(|u| u.id == id)
            .cloned()
    }
}

impl DirectoryClient for MockDirectory {
    async fn login(&self, _credentials: &Credentials) -> Result<String> {
        let failure = {
            let mut state = self.state.lock();
            state.calls.push(Call::Login);
            state.login_failure.clone()
        };
        match failure {
            Some(err) => Err(err),
            None => Ok("QpwL5tke4Pnpja7X4".to_string()),
        }
    }

    async fn fetch_page(&self, page: u32) -> Result<UsersPage> {
        let (gate, delay) = {
            let mut state = self.state.lock();
            state.calls.push(Call::FetchPage(page));
            (state.page_gate.clone(), state.page_delays.get(&page).copied())
        };

        pass(gate).await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let state = self.state.lock();
        if let Some(err) = state.page_failures.get(&page) {
            return Err(err.clone());
        }
        let data = usize::try_from(page)
            .ok()
            .and_then(|p| p.checked_sub(1))
            .and_then(|i| state.pages.get(i))
            .cloned()
            .unwrap_or_default();
        Ok(UsersPage {
            data,
            total_pages: state
                .reported_total_pages
                .unwrap_or_else(|| u32::try_from(state.pages.len()).unwrap_or(u32::MAX)),
        })
    }

    async fn update_record(&self, id: UserId, patch: &UserPatch) -> Result<UserRecord> {
        let gate = {
            let mut state = self.state.lock();
            state.calls.push(Call::Update(id));
            state.mutation_gate.clone()
        };
        pass(gate).await;

        let (failure, echo) = {
            let state = self.state.lock();
            (state.update_failure.clone(), state.update_echo)
        };
        if let Some(err) = failure {
            return Err(err);
        }

        let stored = self
            .stored(id)
            .ok_or_else(|| UserdeckError::NotFound(id.to_string()))?;
        let record = match echo {
            UpdateEcho::SentFieldsOnly => UserRecord {
                id,
                email: patch.email.clone().unwrap_or_default(),
                first_name: patch.first_name.clone().unwrap_or_default(),
                last_name: patch.last_name.clone().unwrap_or_default(),
                avatar: patch.avatar.clone().unwrap_or_default(),
            },
            UpdateEcho::Stale => stored,
            UpdateEcho::Applied => UserRecord {
                id,
                email: patch.email.clone().unwrap_or(stored.email),
                first_name: patch.first_name.clone().unwrap_or(stored.first_name),
                last_name: patch.last_name.clone().unwrap_or(stored.last_name),
                avatar: patch.avatar.clone().unwrap_or(stored.avatar),
            },
        };
        Ok(record)
    }

    async fn delete_record(&self, id: UserId) -> Result<()> {
        let gate = {
            let mut state = self.state.lock();
            state.calls.push(Call::Delete(id));
            state.mutation_gate.clone()
        };
        pass(gate).await;

        match self.state.lock().delete_failure.clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Edit link that remembers every emission.
#[derive(Debug, Default)]
pub struct RecordingLink {
    emitted: Mutex<Vec<Option<UserId>>>,
}

impl RecordingLink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emissions(&self) -> Vec<Option<UserId>> {
        self.emitted.lock().clone()
    }

    pub fn last(&self) -> Option<Option<UserId>> {
        self.emitted.lock().last().copied()
    }
}

impl EditLink for RecordingLink {
    fn emit(&self, id: Option<UserId>) {
        self.emitted.lock().push(id);
    }
}
