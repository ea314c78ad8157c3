//! Account records
//!
//! Accounts are identified by an opaque id supplied by the caller; issuing
//! and verifying that identity happens outside this crate.

use crate::error::{Error, Result};
use parking_lot::RwLock;
use std::collections::HashMap;

/// An account and the addresses of artifacts generated for it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountRecord {
    pub id: String,
    pub artifacts: Vec<String>,
}

/// Storage for account records
pub trait AccountRegistry: Send + Sync {
    /// Create the account if it does not exist yet
    fn register(&self, account: &str);

    /// Append an artifact address to an existing account
    fn record_artifact(&self, account: &str, address: &str) -> Result<()>;

    /// Artifact addresses recorded for `account`, oldest first
    fn artifacts(&self, account: &str) -> Result<Vec<String>>;
}

#[derive(Default)]
pub struct InMemoryAccounts {
    records: RwLock<HashMap<String, AccountRecord>>,
}

impl InMemoryAccounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_accounts<I, S>(accounts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let registry = Self::new();
        for account in accounts {
            registry.register(account.as_ref());
        }
        registry
    }

    pub fn get(&self, account: &str) -> Option<AccountRecord> {
        self.records.read().get(account).cloned()
    }
}

impl AccountRegistry for InMemoryAccounts {
    fn register(&self, account: &str) {
        self.records
            .write()
            .entry(account.to_string())
            .or_insert_with(|| AccountRecord {
                id: account.to_string(),
                artifacts: Vec::new(),
            });
    }

    fn record_artifact(&self, account: &str, address: &str) -> Result<()> {
        let mut records = self.records.write();
        let record = records
            .get_mut(account)
            .ok_or_else(|| Error::AccountNotFound {
                account: account.to_string(),
            })?;
        record.artifacts.push(address.to_string());
        tracing::info!(account, address, "recorded artifact");
        Ok(())
    }

    fn artifacts(&self, account: &str) -> Result<Vec<String>> {
        self.records
            .read()
            .get(account)
            .map(|record| record.artifacts.clone())
            .ok_or_else(|| Error::AccountNotFound {
                account: account.to_string(),
            })
    }
}
