// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use std::sync::Arc;

use tally::application::AccountingService;
use tally::storage::MemoryLedgerStore;

/// Helper to create a test service backed by an in-memory store.
///
/// The store handle is returned alongside the service so tests can inspect
/// raw records and toggle the offline switch.
pub fn test_service() -> (AccountingService, Arc<MemoryLedgerStore>) {
    let store = Arc::new(MemoryLedgerStore::new());
    let service = AccountingService::new(store.clone());
    (service, store)
}
