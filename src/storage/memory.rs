use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::anyhow;
use async_trait::async_trait;

use crate::domain::{Points, UserAccount};

use super::{AccountUpdate, LedgerStore, ReferralWrite, StoreError};

/// In-memory ledger store, the test double for [`super::PgLedgerStore`].
///
/// One mutex around the whole map gives each operation the same atomicity
/// the database provides. The `offline` switch makes every call fail with
/// [`StoreError::Unavailable`] to exercise outage handling.
#[derive(Default)]
pub struct MemoryLedgerStore {
    accounts: Mutex<HashMap<String, StoredAccount>>,
    offline: AtomicBool,
}

#[derive(Default)]
struct StoredAccount {
    points: Points,
    referrals: Vec<String>,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail as if the backend were unreachable.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn accounts(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<String, StoredAccount>>, StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::unavailable(anyhow!("store is offline")));
        }
        self.accounts
            .lock()
            .map_err(|_| StoreError::unavailable(anyhow!("store lock poisoned")))
    }
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    async fn get(&self, user_id: &str) -> Result<Option<UserAccount>, StoreError> {
        let accounts = self.accounts()?;
        Ok(accounts.get(user_id).map(|stored| UserAccount {
            user_id: user_id.to_string(),
            points: stored.points,
            referrals: stored.referrals.clone(),
        }))
    }

    async fn upsert(&self, user_id: &str, update: AccountUpdate) -> Result<(), StoreError> {
        let mut accounts = self.accounts()?;
        let account = accounts.entry(user_id.to_string()).or_default();

        if let Some(points) = update.points {
            account.points = points;
        }
        if let Some(referrals) = update.referrals {
            // The referrals field is a set; drop duplicates, keep order.
            let mut deduped = Vec::with_capacity(referrals.len());
            for referral_id in referrals {
                if !deduped.contains(&referral_id) {
                    deduped.push(referral_id);
                }
            }
            account.referrals = deduped;
        }

        Ok(())
    }

    async fn add_points(&self, user_id: &str, amount: Points) -> Result<Points, StoreError> {
        let mut accounts = self.accounts()?;
        let account = accounts.entry(user_id.to_string()).or_default();
        account.points += amount;
        Ok(account.points)
    }

    async fn add_referral(
        &self,
        user_id: &str,
        referral_id: &str,
        bonus: Points,
    ) -> Result<ReferralWrite, StoreError> {
        let mut accounts = self.accounts()?;
        let account = accounts.entry(user_id.to_string()).or_default();

        let inserted = !account.referrals.iter().any(|r| r == referral_id);
        if inserted {
            account.referrals.push(referral_id.to_string());
            account.points += bonus;
        }

        Ok(ReferralWrite {
            inserted,
            points: account.points,
            referrals: account.referrals.clone(),
        })
    }
}
