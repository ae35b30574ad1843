use std::sync::Arc;

use crate::domain::Points;
use crate::storage::LedgerStore;

use super::AppError;

/// Points credited to the referrer for each newly referred user.
pub const REFERRAL_BONUS: Points = 100;

/// Application service providing the accounting operations of the ledger.
/// This is the primary interface for any client (HTTP, tests, future CLIs).
#[derive(Clone)]
pub struct AccountingService {
    store: Arc<dyn LedgerStore>,
}

/// Result of applying a referral.
#[derive(Debug)]
pub struct ReferralResult {
    /// False when the (referrer, referred) pair was already recorded and
    /// the call changed nothing.
    pub newly_added: bool,
    pub points: Points,
    pub referrals: Vec<String>,
}

impl AccountingService {
    /// Create a new accounting service over the given store.
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Current balance for the user. An account that was never written
    /// reads as zero; the read creates no record.
    pub async fn get_balance(&self, user_id: &str) -> Result<Points, AppError> {
        let account = self.store.get(user_id).await?;
        Ok(account.map(|a| a.points).unwrap_or(0))
    }

    /// Credit `amount` points and return the new balance. Creates the
    /// account on first write. Negative amounts are rejected so the balance
    /// can never go below zero.
    pub async fn add_points(&self, user_id: &str, amount: Points) -> Result<Points, AppError> {
        if amount < 0 {
            return Err(AppError::InvalidAmount(
                "Amount must not be negative".to_string(),
            ));
        }

        Ok(self.store.add_points(user_id, amount).await?)
    }

    /// Record that `user_id` referred `referral_id` and credit the bonus to
    /// the referrer.
    ///
    /// Each (referrer, referred) pair is credited at most once; repeating
    /// the call is a no-op that reports the unchanged state. The set insert
    /// and the bonus land in one atomic store write, so concurrent calls on
    /// the same pair cannot double-credit.
    pub async fn apply_referral(
        &self,
        user_id: &str,
        referral_id: &str,
    ) -> Result<ReferralResult, AppError> {
        if user_id == referral_id {
            return Err(AppError::SelfReferral);
        }

        let write = self
            .store
            .add_referral(user_id, referral_id, REFERRAL_BONUS)
            .await?;

        Ok(ReferralResult {
            newly_added: write.inserted,
            points: write.points,
            referrals: write.referrals,
        })
    }
}
