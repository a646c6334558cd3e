//! Login sessions: one warehouse session per authenticated analyst.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::services::warehouse::Warehouse;

#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, Arc<dyn Warehouse>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, warehouse: Arc<dyn Warehouse>) -> Uuid {
        let id = Uuid::new_v4();
        self.sessions.write().await.insert(id, warehouse);
        id
    }

    pub async fn get(&self, id: &Uuid) -> Option<Arc<dyn Warehouse>> {
        self.sessions.read().await.get(id).cloned()
    }

    pub async fn remove(&self, id: &Uuid) -> bool {
        self.sessions.write().await.remove(id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::warehouse::fake::FakeWarehouse;

    #[tokio::test]
    async fn sessions_are_isolated_by_id() {
        let store = SessionStore::new();
        let a = store.insert(Arc::new(FakeWarehouse::default())).await;
        let b = store.insert(Arc::new(FakeWarehouse::default())).await;
        assert_ne!(a, b);
        assert_eq!(store.len().await, 2);

        assert!(store.remove(&a).await);
        assert!(store.get(&a).await.is_none());
        assert!(store.get(&b).await.is_some());
        assert!(!store.remove(&a).await);
    }
}
