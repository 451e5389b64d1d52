//! Local mirror of the remote scenario collection.
//!
//! [`ScenarioStore`] owns the in-memory scenario list and is the only thing
//! that mutates it. Create, update and delete apply their change locally
//! before the remote call settles and undo it if the call fails. Readers get
//! the current [`StoreState`] through [`ScenarioStore::snapshot`] or follow
//! changes through a `watch` receiver from [`ScenarioStore::subscribe`].
//!
//! Overlapping calls are handled as follows:
//! - mutations of the same scenario id run one after the other, in the order
//!   they were issued;
//! - a failed update or delete restores the list exactly as it was before the
//!   call when nothing else changed it in the meantime, and otherwise restores
//!   only the record it touched;
//! - only the most recently started load may replace the list;
//! - dropping an operation's future before its remote call settles undoes
//!   the local change as if the call had failed.

use std::sync::atomic::{AtomicU64, Ordering};

use common::{Scenario, ScenarioDraft, ScenarioId};
use tokio::sync::watch;
use tracing::{debug, error, info, instrument, trace, warn};

use crate::api::ScenarioApi;
use crate::error::{ClientError, Result};
use crate::locks::RecordLocks;

/// Error message recorded when the collection cannot be loaded.
pub const LOAD_FAILED: &str = "Failed to load scenarios";

/// What readers of the store see.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreState {
    /// Cached scenarios in collection order, placeholders of in-flight
    /// creates included.
    pub scenarios: Vec<Scenario>,
    /// A load is in progress.
    pub loading: bool,
    /// Set by a failed load, cleared by the next successful one.
    pub error: Option<String>,
    revision: u64,
}

impl StoreState {
    /// Counter bumped on every change to the list.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn find(&self, id: &ScenarioId) -> Option<&Scenario> {
        self.scenarios.iter().find(|s| &s.id == id)
    }

    pub fn position(&self, id: &ScenarioId) -> Option<usize> {
        self.scenarios.iter().position(|s| &s.id == id)
    }

    pub fn has_placeholders(&self) -> bool {
        self.scenarios.iter().any(Scenario::is_placeholder)
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }

    fn touch(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }
}

/// Everything a failed update or delete needs to take back its optimistic
/// change.
#[derive(Debug)]
struct Undo {
    id: ScenarioId,
    /// Put the record back if it is missing (delete).
    reinsert: bool,
    snapshot: Vec<Scenario>,
    applied_revision: u64,
    previous: Option<(usize, Scenario)>,
}

/// Compensation for an operation whose future is dropped while its remote
/// call is still pending. Runs on drop unless [`settle`](Self::settle) was
/// called first.
struct OnCancel<'a, A, T> {
    store: &'a ScenarioStore<A>,
    pending: Option<T>,
    compensate: fn(&ScenarioStore<A>, T),
}

impl<'a, A, T> OnCancel<'a, A, T> {
    fn new(store: &'a ScenarioStore<A>, pending: T, compensate: fn(&ScenarioStore<A>, T)) -> Self {
        Self {
            store,
            pending: Some(pending),
            compensate,
        }
    }

    /// The remote call came back; hands the pending state to the caller.
    fn settle(mut self) -> Option<T> {
        self.pending.take()
    }
}

impl<A, T> Drop for OnCancel<'_, A, T> {
    fn drop(&mut self) {
        if let Some(pending) = self.pending.take() {
            (self.compensate)(self.store, pending);
        }
    }
}

/// Client-side cache of the scenario collection.
pub struct ScenarioStore<A> {
    api: A,
    state: watch::Sender<StoreState>,
    placeholder_seq: AtomicU64,
    load_seq: AtomicU64,
    record_locks: RecordLocks,
}

impl<A: ScenarioApi> ScenarioStore<A> {
    /// Creates an empty store. Nothing is fetched until [`load`](Self::load).
    pub fn new(api: A) -> Self {
        Self {
            api,
            state: watch::Sender::new(StoreState::default()),
            placeholder_seq: AtomicU64::new(0),
            load_seq: AtomicU64::new(0),
            record_locks: RecordLocks::default(),
        }
    }

    /// Creates a store and runs the initial load.
    ///
    /// A failed initial load is not fatal: the store comes back empty with
    /// its error message set.
    pub async fn connect(api: A) -> Self {
        let store = Self::new(api);
        if let Err(e) = store.load().await {
            warn!("Initial scenario load failed: {}", e);
        }
        store
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> StoreState {
        self.state.borrow().clone()
    }

    pub fn scenarios(&self) -> Vec<Scenario> {
        self.state.borrow().scenarios.clone()
    }

    pub fn find(&self, id: &ScenarioId) -> Option<Scenario> {
        self.state.borrow().find(id).cloned()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    pub fn error(&self) -> Option<String> {
        self.state.borrow().error.clone()
    }

    /// Receiver that observes every state change. It reports the channel as
    /// closed once the store is dropped.
    pub fn subscribe(&self) -> watch::Receiver<StoreState> {
        self.state.subscribe()
    }

    /// Replaces the list with the remote collection.
    ///
    /// On failure the list is left as it was and the error message is set
    /// until the next successful load. Placeholders of creates still in
    /// flight are kept after the fetched records. Records carrying an id from
    /// the placeholder namespace are skipped.
    #[instrument(skip(self))]
    pub async fn load(&self) -> Result<()> {
        trace!("Entering load");
        let ticket = self.load_seq.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.send_modify(|s| s.loading = true);

        let in_flight = OnCancel::new(self, ticket, Self::abandon_load);
        let result = self.api.list().await;
        in_flight.settle();

        let result = result.map(|scenarios| {
            scenarios
                .into_iter()
                .filter(|s| {
                    if s.is_placeholder() {
                        warn!("Skipping remote record with reserved id {}", s.id);
                    }
                    !s.is_placeholder()
                })
                .collect::<Vec<_>>()
        });

        if self.load_seq.load(Ordering::SeqCst) != ticket {
            debug!("Discarding response of superseded load {}", ticket);
            return result.map(|_| ());
        }

        match result {
            Ok(scenarios) => {
                info!("Loaded {} scenarios", scenarios.len());
                self.state.send_modify(|s| {
                    let pending: Vec<Scenario> = s
                        .scenarios
                        .iter()
                        .filter(|x| x.is_placeholder())
                        .cloned()
                        .collect();
                    s.scenarios = scenarios;
                    s.scenarios.extend(pending);
                    s.loading = false;
                    s.error = None;
                    s.touch();
                });
                Ok(())
            }
            Err(e) => {
                error!("Failed to load scenarios: {}", e);
                self.state.send_modify(|s| {
                    s.loading = false;
                    s.error = Some(LOAD_FAILED.to_string());
                });
                Err(e)
            }
        }
    }

    /// Fetches one scenario from the remote without touching the cache.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn fetch(&self, id: &ScenarioId) -> Result<Scenario> {
        reject_placeholder(id)?;
        let scenario = self.api.get(id).await?;
        ensure_remote_id(scenario)
    }

    /// Creates a scenario.
    ///
    /// A placeholder with a fresh temporary id is appended at once and swapped
    /// in place for the server's record when the call succeeds. On failure,
    /// or if the returned future is dropped first, the placeholder is removed.
    #[instrument(skip(self, draft), fields(name = %draft.name))]
    pub async fn create(&self, draft: &ScenarioDraft) -> Result<Scenario> {
        trace!("Entering create");
        let placeholder_id = ScenarioId::placeholder(self.placeholder_seq.fetch_add(1, Ordering::SeqCst));
        debug!("Inserting placeholder {}", placeholder_id);
        let placeholder = Scenario::from_draft(placeholder_id.clone(), draft);
        self.state.send_modify(|s| {
            s.scenarios.push(placeholder);
            s.touch();
        });

        let in_flight = OnCancel::new(self, placeholder_id.clone(), Self::remove_placeholder);
        let result = self.api.create(draft).await;
        in_flight.settle();

        match result.and_then(ensure_remote_id) {
            Ok(created) => {
                let record = created.clone();
                self.state.send_modify(|s| {
                    match (s.position(&placeholder_id), s.position(&record.id)) {
                        (Some(slot), None) => s.scenarios[slot] = record,
                        // A reload already brought the new record in.
                        (Some(slot), Some(existing)) => {
                            s.scenarios[existing] = record;
                            s.scenarios.remove(slot);
                        }
                        (None, None) => s.scenarios.push(record),
                        (None, Some(existing)) => s.scenarios[existing] = record,
                    }
                    s.touch();
                });
                info!("Scenario created successfully: id={}", created.id);
                Ok(created)
            }
            Err(e) => {
                error!("Failed to create scenario: {}", e);
                self.remove_placeholder(placeholder_id);
                Err(e)
            }
        }
    }

    /// Updates a scenario.
    ///
    /// The cached record takes the draft's values at once (keeping its id and
    /// timestamps) and is replaced by the server's record on success. On
    /// failure, or if the returned future is dropped first, the change is
    /// taken back.
    #[instrument(skip(self, draft), fields(id = %id))]
    pub async fn update(&self, id: &ScenarioId, draft: &ScenarioDraft) -> Result<Scenario> {
        trace!("Entering update");
        reject_placeholder(id)?;
        let _guard = self.record_locks.acquire(id).await;

        let undo = self.begin(id, false, |list, index| list[index].apply_draft(draft));

        let in_flight = OnCancel::new(self, undo, Self::abandon_change);
        let result = self.api.update(id, draft).await;
        let undo = in_flight.settle();

        match result.and_then(ensure_remote_id) {
            Ok(updated) => {
                let record = updated.clone();
                self.state.send_if_modified(|s| match s.position(id) {
                    Some(index) => {
                        s.scenarios[index] = record;
                        s.touch();
                        true
                    }
                    None => false,
                });
                info!("Scenario updated successfully: id={}", id);
                Ok(updated)
            }
            Err(e) => {
                error!("Failed to update scenario {}: {}", id, e);
                if let Some(undo) = undo {
                    self.rollback(undo);
                }
                Err(e)
            }
        }
    }

    /// Deletes a scenario.
    ///
    /// The record leaves the list at once; on failure, or if the returned
    /// future is dropped first, it is put back.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn delete(&self, id: &ScenarioId) -> Result<()> {
        trace!("Entering delete");
        reject_placeholder(id)?;
        let _guard = self.record_locks.acquire(id).await;

        let undo = self.begin(id, true, |list, index| {
            list.remove(index);
        });

        let in_flight = OnCancel::new(self, undo, Self::abandon_change);
        let result = self.api.delete(id).await;
        let undo = in_flight.settle();

        match result {
            Ok(()) => {
                // A reload that ran meanwhile may have brought it back.
                self.state.send_if_modified(|s| match s.position(id) {
                    Some(index) => {
                        s.scenarios.remove(index);
                        s.touch();
                        true
                    }
                    None => false,
                });
                info!("Scenario deleted successfully: id={}", id);
                Ok(())
            }
            Err(e) => {
                error!("Failed to delete scenario {}: {}", id, e);
                if let Some(undo) = undo {
                    self.rollback(undo);
                }
                Err(e)
            }
        }
    }

    /// Applies an optimistic change to the record with `id`, if cached, and
    /// records how to take it back.
    fn begin<F>(&self, id: &ScenarioId, reinsert: bool, change: F) -> Undo
    where
        F: FnOnce(&mut Vec<Scenario>, usize),
    {
        let mut undo = Undo {
            id: id.clone(),
            reinsert,
            snapshot: Vec::new(),
            applied_revision: 0,
            previous: None,
        };
        self.state.send_if_modified(|s| {
            undo.snapshot = s.scenarios.clone();
            undo.previous = s.position(id).map(|index| (index, s.scenarios[index].clone()));
            if let Some((index, _)) = undo.previous {
                change(&mut s.scenarios, index);
                s.touch();
            }
            undo.applied_revision = s.revision;
            undo.previous.is_some()
        });
        undo
    }

    /// Takes back an optimistic change after its remote call failed.
    ///
    /// With no intervening change the list returns to the snapshot verbatim.
    /// Otherwise only the touched record is restored, re-inserted at its old
    /// position for a delete. Subscribers are only notified when something
    /// was written back.
    fn rollback(&self, undo: Undo) {
        let Undo {
            id,
            reinsert,
            snapshot,
            applied_revision,
            previous,
        } = undo;
        let Some((index, record)) = previous else {
            return;
        };
        self.state.send_if_modified(|s| {
            if s.revision == applied_revision {
                debug!("Restoring snapshot of {} scenarios", snapshot.len());
                s.scenarios = snapshot;
            } else {
                debug!("List changed since the optimistic step; restoring {} only", id);
                match s.position(&id) {
                    Some(current) => s.scenarios[current] = record,
                    None if reinsert => {
                        let at = index.min(s.scenarios.len());
                        s.scenarios.insert(at, record);
                    }
                    None => return false,
                }
            }
            s.touch();
            true
        });
    }

    fn abandon_change(&self, undo: Undo) {
        warn!("Call for {} dropped before it settled; taking back local change", undo.id);
        self.rollback(undo);
    }

    fn remove_placeholder(&self, placeholder: ScenarioId) {
        self.state.send_if_modified(|s| {
            let before = s.scenarios.len();
            s.scenarios.retain(|x| x.id != placeholder);
            if s.scenarios.len() == before {
                return false;
            }
            s.touch();
            true
        });
    }

    fn abandon_load(&self, ticket: u64) {
        if self.load_seq.load(Ordering::SeqCst) != ticket {
            return;
        }
        warn!("Load {} dropped before it settled", ticket);
        self.state.send_if_modified(|s| std::mem::replace(&mut s.loading, false));
    }
}

fn reject_placeholder(id: &ScenarioId) -> Result<()> {
    if id.is_placeholder() {
        warn!("Refusing to address placeholder {}", id);
        return Err(ClientError::PendingRecord(id.clone()));
    }
    Ok(())
}

fn ensure_remote_id(scenario: Scenario) -> Result<Scenario> {
    if scenario.is_placeholder() {
        return Err(ClientError::ReservedId(scenario.id));
    }
    Ok(scenario)
}
