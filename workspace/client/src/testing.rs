//! In-memory stand-in for the remote collection, used by the store and
//! session tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use common::{DateRange, Scenario, ScenarioDraft, ScenarioId};
use tokio::sync::Semaphore;

use crate::api::ScenarioApi;
use crate::error::{ClientError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Operation {
    List,
    Get,
    Create,
    Update,
    Delete,
}

#[derive(Default)]
struct Inner {
    records: Mutex<Vec<Scenario>>,
    next_id: AtomicU64,
    failing: Mutex<HashSet<Operation>>,
    gates: Mutex<HashMap<Operation, Arc<Semaphore>>>,
    calls: Mutex<Vec<Operation>>,
    hand_out_reserved_ids: Mutex<bool>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Shared handle; clones talk to the same collection.
#[derive(Clone, Default)]
pub(crate) struct MemoryApi {
    inner: Arc<Inner>,
}

impl MemoryApi {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_records(records: Vec<Scenario>) -> Self {
        let api = Self::new();
        *lock(&api.inner.records) = records;
        api
    }

    /// Makes every later call of `op` fail with a 500.
    pub(crate) fn fail(&self, op: Operation) {
        lock(&self.inner.failing).insert(op);
    }

    pub(crate) fn recover(&self, op: Operation) {
        lock(&self.inner.failing).remove(&op);
    }

    /// Makes created records carry an id from the placeholder namespace.
    pub(crate) fn hand_out_reserved_ids(&self) {
        *lock(&self.inner.hand_out_reserved_ids) = true;
    }

    /// Parks calls of `op` until [`release`](Self::release) lets them through.
    pub(crate) fn hold(&self, op: Operation) {
        lock(&self.inner.gates).insert(op, Arc::new(Semaphore::new(0)));
    }

    /// Lets the next `n` parked (or future) calls of `op` proceed, in order.
    pub(crate) fn release(&self, op: Operation, n: usize) {
        if let Some(gate) = lock(&self.inner.gates).get(&op) {
            gate.add_permits(n);
        }
    }

    pub(crate) fn calls(&self) -> Vec<Operation> {
        lock(&self.inner.calls).clone()
    }

    pub(crate) fn count(&self, op: Operation) -> usize {
        lock(&self.inner.calls).iter().filter(|c| **c == op).count()
    }

    pub(crate) fn records(&self) -> Vec<Scenario> {
        lock(&self.inner.records).clone()
    }

    pub(crate) fn push_record(&self, record: Scenario) {
        lock(&self.inner.records).push(record);
    }

    async fn enter(&self, op: Operation) -> Result<()> {
        lock(&self.inner.calls).push(op);
        let gate = lock(&self.inner.gates).get(&op).cloned();
        if let Some(gate) = gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }
        if lock(&self.inner.failing).contains(&op) {
            return Err(ClientError::Status {
                status: 500,
                body: r#"{"error":"simulated failure"}"#.to_string(),
            });
        }
        Ok(())
    }

    fn not_found(id: &ScenarioId) -> ClientError {
        ClientError::Status {
            status: 404,
            body: format!(r#"{{"error":"Scenario not found: {}"}}"#, id),
        }
    }
}

#[async_trait]
impl ScenarioApi for MemoryApi {
    async fn list(&self) -> Result<Vec<Scenario>> {
        self.enter(Operation::List).await?;
        Ok(self.records())
    }

    async fn get(&self, id: &ScenarioId) -> Result<Scenario> {
        self.enter(Operation::Get).await?;
        lock(&self.inner.records)
            .iter()
            .find(|s| &s.id == id)
            .cloned()
            .ok_or_else(|| Self::not_found(id))
    }

    async fn create(&self, draft: &ScenarioDraft) -> Result<Scenario> {
        self.enter(Operation::Create).await?;
        let seq = self.inner.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let id = if *lock(&self.inner.hand_out_reserved_ids) {
            ScenarioId::placeholder(seq)
        } else {
            ScenarioId::new(format!("srv-{}", seq))
        };
        let mut created = Scenario::from_draft(id, draft);
        created.created_at = Some("2024-01-01T00:00:00+00:00".to_string());
        created.updated_at = created.created_at.clone();
        lock(&self.inner.records).push(created.clone());
        Ok(created)
    }

    async fn update(&self, id: &ScenarioId, draft: &ScenarioDraft) -> Result<Scenario> {
        self.enter(Operation::Update).await?;
        let mut records = lock(&self.inner.records);
        let record = records
            .iter_mut()
            .find(|s| &s.id == id)
            .ok_or_else(|| Self::not_found(id))?;
        record.apply_draft(draft);
        record.updated_at = Some("2024-01-02T00:00:00+00:00".to_string());
        Ok(record.clone())
    }

    async fn delete(&self, id: &ScenarioId) -> Result<()> {
        self.enter(Operation::Delete).await?;
        let mut records = lock(&self.inner.records);
        let before = records.len();
        records.retain(|s| &s.id != id);
        if records.len() == before {
            return Err(Self::not_found(id));
        }
        Ok(())
    }
}

pub(crate) fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub(crate) fn draft(name: &str) -> ScenarioDraft {
    ScenarioDraft {
        name: name.to_string(),
        date_range: DateRange::new(date(2024, 1, 1), date(2024, 1, 2)),
        product_categories: vec!["Tools".to_string()],
        sales_multiplier: 1.0,
        regions: vec!["West".to_string()],
        customer_segments: vec!["VIP".to_string()],
    }
}

pub(crate) fn record(id: &str, name: &str) -> Scenario {
    let mut scenario = Scenario::from_draft(ScenarioId::new(id), &draft(name));
    scenario.created_at = Some("2023-12-01T00:00:00+00:00".to_string());
    scenario
}

/// Yields to other tasks until `condition` holds, failing the test after a
/// few seconds.
pub(crate) async fn wait_until(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("condition not reached in time");
}

/// Gives spawned tasks a chance to run.
pub(crate) async fn settle() {
    for _ in 0..50 {
        tokio::task::yield_now().await;
    }
}
