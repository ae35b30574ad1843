use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{Points, UserAccount};

/// The persistence backend cannot be reached or a call timed out.
///
/// This is the only failure a [`LedgerStore`] surfaces: absence of a record
/// is a normal value, never an error.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("ledger store unavailable: {0}")]
    Unavailable(#[source] anyhow::Error),
}

impl StoreError {
    pub fn unavailable(err: impl Into<anyhow::Error>) -> Self {
        StoreError::Unavailable(err.into())
    }
}

/// Partial update merged into a stored account record.
///
/// `None` fields are left unchanged; present fields replace the stored value.
/// The record is created if absent.
#[derive(Debug, Clone, Default)]
pub struct AccountUpdate {
    pub points: Option<Points>,
    pub referrals: Option<Vec<String>>,
}

/// Outcome of the atomic referral primitive.
#[derive(Debug, Clone)]
pub struct ReferralWrite {
    /// Whether this call inserted the referral. `false` means the pair was
    /// already recorded and nothing changed.
    pub inserted: bool,
    pub points: Points,
    pub referrals: Vec<String>,
}

/// Durable key-value access to account records, keyed by user id.
///
/// Balance and referral mutations go through the atomic `add_points` and
/// `add_referral` primitives so that concurrent writers on the same user
/// cannot lose updates to each other. The plain `upsert` is the merge-write
/// used for seeding and administrative fixes.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Fetch the stored record, or `None` when the user was never written.
    /// Callers treat `None` as the zero-point default; no record is created.
    async fn get(&self, user_id: &str) -> Result<Option<UserAccount>, StoreError>;

    /// Merge the given fields into the stored record, creating it if absent.
    async fn upsert(&self, user_id: &str, update: AccountUpdate) -> Result<(), StoreError>;

    /// Atomically add `amount` to the balance and return the new value.
    /// Creates the record if absent.
    async fn add_points(&self, user_id: &str, amount: Points) -> Result<Points, StoreError>;

    /// Atomically insert `referral_id` into the referral set, crediting
    /// `bonus` in the same write iff the insert actually happened. A pair
    /// that is already recorded leaves the record untouched.
    async fn add_referral(
        &self,
        user_id: &str,
        referral_id: &str,
        bonus: Points,
    ) -> Result<ReferralWrite, StoreError>;
}
