use std::sync::Arc;

use async_trait::async_trait;
use common::{Scenario, ScenarioDraft, ScenarioId};

use crate::error::Result;

/// Remote scenario collection.
///
/// Every failure, transport or status, comes back as an error; callers that
/// only care whether the operation succeeded need not look further.
#[async_trait]
pub trait ScenarioApi: Send + Sync {
    /// `GET /scenarios`
    async fn list(&self) -> Result<Vec<Scenario>>;

    /// `GET /scenarios/{id}`
    async fn get(&self, id: &ScenarioId) -> Result<Scenario>;

    /// `POST /scenarios`
    async fn create(&self, draft: &ScenarioDraft) -> Result<Scenario>;

    /// `PUT /scenarios/{id}`
    async fn update(&self, id: &ScenarioId, draft: &ScenarioDraft) -> Result<Scenario>;

    /// `DELETE /scenarios/{id}`
    async fn delete(&self, id: &ScenarioId) -> Result<()>;
}

#[async_trait]
impl<T> ScenarioApi for Arc<T>
where
    T: ScenarioApi + ?Sized,
{
    async fn list(&self) -> Result<Vec<Scenario>> {
        (**self).list().await
    }

    async fn get(&self, id: &ScenarioId) -> Result<Scenario> {
        (**self).get(id).await
    }

    async fn create(&self, draft: &ScenarioDraft) -> Result<Scenario> {
        (**self).create(draft).await
    }

    async fn update(&self, id: &ScenarioId, draft: &ScenarioDraft) -> Result<Scenario> {
        (**self).update(id, draft).await
    }

    async fn delete(&self, id: &ScenarioId) -> Result<()> {
        (**self).delete(id).await
    }
}
