//! Update and delete against the remote, reconciled into the local cache.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::MergePolicy;
use crate::error::{Result, UserdeckError};
use crate::remote::DirectoryClient;
use crate::store::UserStore;
use crate::types::{DEFAULT_AVATAR_URL, UserId, UserPatch, UserRecord};

/// Generated avatar for `first last`.
pub fn default_avatar_url(first_name: &str, last_name: &str) -> String {
    let name = format!("{first_name} {last_name}");
    let encoded: String = url::form_urlencoded::byte_serialize(name.trim().as_bytes()).collect();
    format!("{DEFAULT_AVATAR_URL}{encoded}&background=random")
}

fn pick(sent: Option<&String>, server: &str, cached: &str, policy: MergePolicy) -> String {
    let sent = sent.map(String::as_str);
    let server = (!server.is_empty()).then_some(server);
    let chosen = match policy {
        MergePolicy::ClientWins => sent.or(server),
        MergePolicy::ServerWins => server.or(sent),
    };
    chosen.unwrap_or(cached).to_string()
}

/// Reconcile the server's update response with the cached record.
///
/// Empty server fields never erase cached data. Between the fields the
/// client sent and non-empty server fields, `policy` decides. A record
/// left without an avatar gets a generated one.
pub fn merge_update(
    cached: &UserRecord,
    server: &UserRecord,
    patch: &UserPatch,
    policy: MergePolicy,
) -> UserRecord {
    let first_name = pick(
        patch.first_name.as_ref(),
        &server.first_name,
        &cached.first_name,
        policy,
    );
    let last_name = pick(
        patch.last_name.as_ref(),
        &server.last_name,
        &cached.last_name,
        policy,
    );
    let email = pick(patch.email.as_ref(), &server.email, &cached.email, policy);
    let mut avatar = pick(patch.avatar.as_ref(), &server.avatar, &cached.avatar, policy);
    if avatar.trim().is_empty() {
        avatar = default_avatar_url(&first_name, &last_name);
    }

    UserRecord {
        id: cached.id,
        email,
        first_name,
        last_name,
        avatar,
    }
}

/// Releases the per-ID mutation slot on drop.
struct MutationSlot<'a> {
    in_flight: &'a Mutex<HashSet<UserId>>,
    id: UserId,
}

impl Drop for MutationSlot<'_> {
    fn drop(&mut self) {
        self.in_flight.lock().remove(&self.id);
    }
}

/// Issues remote mutations and applies their outcome to the store.
pub struct MutationCoordinator<C> {
    client: Arc<C>,
    store: Arc<UserStore<C>>,
    policy: MergePolicy,
    in_flight: Mutex<HashSet<UserId>>,
}

impl<C> MutationCoordinator<C>
where
    C: DirectoryClient + 'static,
{
    pub fn new(client: Arc<C>, store: Arc<UserStore<C>>, policy: MergePolicy) -> Self {
        Self {
            client,
            store,
            policy,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    pub fn policy(&self) -> MergePolicy {
        self.policy
    }

    pub fn is_pending(&self, id: UserId) -> bool {
        self.in_flight.lock().contains(&id)
    }

    fn claim(&self, id: UserId) -> Result<MutationSlot<'_>> {
        if !self.in_flight.lock().insert(id) {
            return Err(UserdeckError::MutationInProgress(id));
        }
        Ok(MutationSlot {
            in_flight: &self.in_flight,
            id,
        })
    }

    /// Send `patch` for `id` and write the merged record into the cache.
    ///
    /// On failure the cache is untouched.
    pub async fn apply_update(&self, id: UserId, patch: &UserPatch) -> Result<UserRecord> {
        if !self.store.with_cache(|cache, _| cache.contains(id)) {
            return Err(UserdeckError::NotFound(id.to_string()));
        }
        let _slot = self.claim(id)?;
        let generation = self.store.generation();

        let server = self
            .client
            .update_record(id, patch)
            .await
            .inspect_err(|e| tracing::warn!(%id, error = %e, "update failed"))?;

        let merged = self.store.commit_update(generation, id, |cached| {
            merge_update(cached, &server, patch, self.policy)
        })?;

        tracing::info!(%id, policy = %self.policy, "user updated");
        Ok(merged)
    }

    /// Delete `id` remotely, then drop it from the cache.
    pub async fn apply_delete(&self, id: UserId) -> Result<UserRecord> {
        if !self.store.with_cache(|cache, _| cache.contains(id)) {
            return Err(UserdeckError::NotFound(id.to_string()));
        }
        let _slot = self.claim(id)?;
        let generation = self.store.generation();

        self.client
            .delete_record(id)
            .await
            .inspect_err(|e| tracing::warn!(%id, error = %e, "delete failed"))?;

        let removed = self.store.commit_delete(generation, id)?;
        tracing::info!(%id, "user deleted");
        Ok(removed)
    }
}
