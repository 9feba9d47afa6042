use crate::error::Result;
use crate::types::PersistedAccount;
use sha2::{Digest, Sha256};

/// SHA-256 over the canonical JSON of a collection.
///
/// Accounts are ordered by name first, so the digest is independent of the
/// order in which the store returns them. Two imports of the same grid with
/// the same configuration produce the same digest.
pub fn collection_digest(accounts: &[PersistedAccount]) -> Result<String> {
    let mut ordered: Vec<&PersistedAccount> = accounts.iter().collect();
    ordered.sort_by(|a, b| a.name.cmp(&b.name));

    let mut hasher = Sha256::new();
    for account in ordered {
        hasher.update(serde_json::to_vec(account)?);
        hasher.update(b"\n");
    }
    Ok(hex::encode(hasher.finalize()))
}
