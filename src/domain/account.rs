use serde::{Deserialize, Serialize};

/// Point balances are whole integers; there are no fractional points.
pub type Points = i64;

/// Persisted record of one user's balance and referral history.
///
/// An account that was never written to is equivalent to the default record:
/// zero points and no referrals. Reads treat a missing record as this default
/// rather than as an error, and reading never creates one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    pub user_id: String,
    pub points: Points,
    /// Referred user ids, in insertion order. Never contains duplicates and
    /// never contains the account's own id.
    pub referrals: Vec<String>,
}

impl UserAccount {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            points: 0,
            referrals: Vec::new(),
        }
    }

    /// Whether `referral_id` has already been credited against this account.
    pub fn has_referred(&self, referral_id: &str) -> bool {
        self.referrals.iter().any(|r| r == referral_id)
    }
}
