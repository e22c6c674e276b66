//! Scalar fact store: small keyed JSON values with replace-on-write upsert.

use sled::{Db, Tree};

const TREE_FACTS: &str = "facts";

pub struct FactStore {
    tree: Tree,
}

impl FactStore {
    pub fn open(db: &Db) -> Result<Self, sled::Error> {
        Ok(Self {
            tree: db.open_tree(TREE_FACTS)?,
        })
    }

    /// The value stored under `key`, if any. Undecodable bytes read as absent.
    pub fn get(&self, key: &str) -> Result<Option<serde_json::Value>, sled::Error> {
        let value = self
            .tree
            .get(key.as_bytes())?
            .and_then(|bytes| serde_json::from_slice(&bytes).ok());
        Ok(value)
    }

    /// Inserts or replaces the value under `key`. Last write wins.
    pub fn set(&self, key: &str, value: &serde_json::Value) -> Result<(), sled::Error> {
        let bytes = serde_json::to_vec(value).unwrap_or_default();
        let replaced = self.tree.insert(key.as_bytes(), bytes)?.is_some();
        tracing::debug!(target: "mind::facts", key, replaced, "fact written");
        Ok(())
    }
}
