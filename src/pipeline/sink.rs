use crate::error::{ImportError, InsertFailure, Result};
use crate::storage::Storage;
use crate::types::PersistedAccount;
use metrics::counter;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{info, instrument, warn};

/// Outcome of a successful collection rewrite
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitSummary {
    pub removed: u64,
    pub inserted: usize,
}

/// Replace the whole collection with `accounts`.
///
/// The existing documents are deleted first, then every account is inserted
/// concurrently and all inserts are awaited. The two phases are not atomic:
/// a failure after the delete leaves the collection partially written.
/// Failed inserts are reported together in [`ImportError::Commit`]; inserts
/// that succeeded are kept.
#[instrument(skip(storage, accounts), fields(accounts = accounts.len()))]
pub async fn commit(
    storage: Arc<dyn Storage>,
    collection: &str,
    accounts: Vec<PersistedAccount>,
) -> Result<CommitSummary> {
    let removed = storage.delete_all(collection).await?;
    info!("Cleared {} previous accounts from {}", removed, collection);

    let attempted = accounts.len();
    let mut pending: BTreeSet<String> = BTreeSet::new();
    let mut tasks = JoinSet::new();

    for account in accounts {
        pending.insert(account.name.clone());
        let storage = storage.clone();
        let collection = collection.to_string();
        tasks.spawn(async move {
            let result = storage.insert_account(&collection, &account).await;
            (account.name, result)
        });
    }

    let mut failures = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((name, Ok(()))) => {
                pending.remove(&name);
            }
            Ok((name, Err(e))) => {
                warn!("Failed to save account {}: {}", name, e);
                pending.remove(&name);
                failures.push(InsertFailure {
                    name,
                    message: e.to_string(),
                });
            }
            Err(e) => {
                warn!("Insert task did not complete: {}", e);
            }
        }
    }

    // Whatever is still pending belongs to a task that panicked or was cancelled
    failures.extend(pending.into_iter().map(|name| InsertFailure {
        name,
        message: "insert task did not complete".to_string(),
    }));

    let inserted = attempted - failures.len();
    counter!("observatory_accounts_committed_total", "collection" => collection.to_string())
        .increment(inserted as u64);

    if !failures.is_empty() {
        counter!("observatory_insert_failures_total", "collection" => collection.to_string())
            .increment(failures.len() as u64);
        failures.sort_by(|a, b| a.name.cmp(&b.name));
        return Err(ImportError::Commit {
            attempted,
            failures,
        });
    }

    info!("Committed {} accounts to {}", inserted, collection);
    Ok(CommitSummary { removed, inserted })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryStorage;
    use crate::types::AccountDraft;
    use async_trait::async_trait;

    fn account(name: &str) -> PersistedAccount {
        PersistedAccount::from_draft(
            AccountDraft {
                name: name.to_string(),
                category: "Frentes".to_string(),
                link: None,
                username: None,
                history: Vec::new(),
            },
            "facebook",
        )
    }

    /// Rejects a fixed set of names and delegates the rest
    struct FlakyStorage {
        inner: InMemoryStorage,
        reject: Vec<&'static str>,
    }

    #[async_trait]
    impl Storage for FlakyStorage {
        async fn delete_all(&self, collection: &str) -> Result<u64> {
            self.inner.delete_all(collection).await
        }

        async fn insert_account(&self, collection: &str, account: &PersistedAccount) -> Result<()> {
            if self.reject.contains(&account.name.as_str()) {
                return Err(ImportError::Storage {
                    message: "validation failed".to_string(),
                });
            }
            self.inner.insert_account(collection, account).await
        }

        async fn list_accounts(&self, collection: &str) -> Result<Vec<PersistedAccount>> {
            self.inner.list_accounts(collection).await
        }

        async fn find_account(
            &self,
            collection: &str,
            username: &str,
        ) -> Result<Option<PersistedAccount>> {
            self.inner.find_account(collection, username).await
        }
    }

    #[tokio::test]
    async fn test_commit_replaces_collection() {
        let storage = Arc::new(InMemoryStorage::new());
        storage.insert_account("facebook", &account("Antigo")).await.unwrap();

        let summary = commit(storage.clone(), "facebook", vec![account("Ana"), account("Bia")])
            .await
            .unwrap();

        assert_eq!(summary, CommitSummary { removed: 1, inserted: 2 });
        let names: Vec<_> = storage
            .list_accounts("facebook")
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.name)
            .collect();
        assert_eq!(names, vec!["Ana", "Bia"]);
    }

    #[tokio::test]
    async fn test_commit_collects_every_failure() {
        let inner = InMemoryStorage::new();
        let storage = Arc::new(FlakyStorage {
            inner: inner.clone(),
            reject: vec!["Caio", "Bia"],
        });

        let err = commit(
            storage,
            "facebook",
            vec![account("Ana"), account("Bia"), account("Caio")],
        )
        .await
        .unwrap_err();

        match err {
            ImportError::Commit { attempted, failures } => {
                assert_eq!(attempted, 3);
                let names: Vec<_> = failures.iter().map(|f| f.name.as_str()).collect();
                assert_eq!(names, vec!["Bia", "Caio"]);
            }
            other => panic!("unexpected error: {other}"),
        }

        // Successful inserts are not rolled back
        assert_eq!(inner.list_accounts("facebook").await.unwrap().len(), 1);
    }
}
