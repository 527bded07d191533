//! Account policy - decides which peer accounts may receive data

use std::collections::BTreeSet;

/// Allowlist of peer accounts
///
/// An empty allowlist accepts any non-empty account id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountPolicy {
    allowed: BTreeSet<String>,
}

impl AccountPolicy {
    pub fn allow_any() -> Self {
        Self::default()
    }

    pub fn allowlist<I, S>(accounts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let allowed = accounts
            .into_iter()
            .map(|a| a.as_ref().trim().to_string())
            .filter(|a| !a.is_empty())
            .collect();
        Self { allowed }
    }

    pub fn is_valid(&self, account_id: &str) -> bool {
        let account_id = account_id.trim();
        if account_id.is_empty() {
            return false;
        }
        self.allowed.is_empty() || self.allowed.contains(account_id)
    }
}
