use crate::error::{ImportError, Result};
use crate::types::PersistedAccount;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// Document store holding one collection of accounts per platform
#[async_trait]
pub trait Storage: Send + Sync {
    /// Remove every account of a collection, returning how many were dropped
    async fn delete_all(&self, collection: &str) -> Result<u64>;

    /// Store one account. Names are unique within a collection.
    async fn insert_account(&self, collection: &str, account: &PersistedAccount) -> Result<()>;

    /// All accounts of a collection, ordered by name
    async fn list_accounts(&self, collection: &str) -> Result<Vec<PersistedAccount>>;

    async fn find_account(
        &self,
        collection: &str,
        username: &str,
    ) -> Result<Option<PersistedAccount>>;
}

type Collections = HashMap<String, BTreeMap<String, PersistedAccount>>;

/// In-memory storage implementation for development/testing
#[derive(Clone, Default)]
pub struct InMemoryStorage {
    collections: Arc<Mutex<Collections>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Collections>> {
        self.collections.lock().map_err(|e| ImportError::Storage {
            message: format!("in-memory store poisoned: {e}"),
        })
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn delete_all(&self, collection: &str) -> Result<u64> {
        let mut collections = self.lock()?;
        let removed = collections
            .remove(collection)
            .map(|docs| docs.len() as u64)
            .unwrap_or(0);
        debug!("Deleted {} accounts from {}", removed, collection);
        Ok(removed)
    }

    async fn insert_account(&self, collection: &str, account: &PersistedAccount) -> Result<()> {
        let mut collections = self.lock()?;
        let docs = collections.entry(collection.to_string()).or_default();
        if docs.contains_key(&account.name) {
            return Err(ImportError::Storage {
                message: format!("duplicate account '{}' in {}", account.name, collection),
            });
        }
        docs.insert(account.name.clone(), account.clone());

        debug!("Inserted account: {} with id {}", account.name, account.id);
        Ok(())
    }

    async fn list_accounts(&self, collection: &str) -> Result<Vec<PersistedAccount>> {
        let collections = self.lock()?;
        Ok(collections
            .get(collection)
            .map(|docs| docs.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn find_account(
        &self,
        collection: &str,
        username: &str,
    ) -> Result<Option<PersistedAccount>> {
        let collections = self.lock()?;
        Ok(collections.get(collection).and_then(|docs| {
            docs.values()
                .find(|a| a.username.as_deref() == Some(username))
                .cloned()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AccountDraft;

    fn account(name: &str, username: Option<&str>) -> PersistedAccount {
        PersistedAccount::from_draft(
            AccountDraft {
                name: name.to_string(),
                category: "Frentes".to_string(),
                link: None,
                username: username.map(str::to_string),
                history: Vec::new(),
            },
            "facebook",
        )
    }

    #[tokio::test]
    async fn test_insert_list_and_delete() {
        let storage = InMemoryStorage::new();
        storage.insert_account("facebook", &account("Zé", None)).await.unwrap();
        storage.insert_account("facebook", &account("Ana", Some("ana"))).await.unwrap();
        storage.insert_account("twitter", &account("Ana", Some("ana"))).await.unwrap();

        let names: Vec<_> = storage
            .list_accounts("facebook")
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.name)
            .collect();
        assert_eq!(names, vec!["Ana", "Zé"]);

        assert_eq!(storage.delete_all("facebook").await.unwrap(), 2);
        assert!(storage.list_accounts("facebook").await.unwrap().is_empty());
        assert_eq!(storage.list_accounts("twitter").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_name_is_rejected() {
        let storage = InMemoryStorage::new();
        storage.insert_account("facebook", &account("Ana", None)).await.unwrap();
        let err = storage.insert_account("facebook", &account("Ana", None)).await;
        assert!(matches!(err, Err(ImportError::Storage { .. })));
    }

    #[tokio::test]
    async fn test_find_by_username() {
        let storage = InMemoryStorage::new();
        storage.insert_account("facebook", &account("Ana", Some("ana"))).await.unwrap();

        let found = storage.find_account("facebook", "ana").await.unwrap();
        assert_eq!(found.map(|a| a.name), Some("Ana".to_string()));
        assert!(storage.find_account("facebook", "bia").await.unwrap().is_none());
    }
}
