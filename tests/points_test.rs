use anyhow::Result;
use tally::LedgerStore;
use tally::application::AppError;

mod common;
use common::test_service;

#[tokio::test]
async fn test_fresh_account_reads_as_zero() -> Result<()> {
    let (service, store) = test_service();

    assert_eq!(service.get_balance("nobody").await?, 0);

    // Reading must not create a record.
    assert!(store.get("nobody").await?.is_none());

    Ok(())
}

#[tokio::test]
async fn test_add_points_returns_new_balance() -> Result<()> {
    let (service, _store) = test_service();

    assert_eq!(service.add_points("u1", 50).await?, 50);
    assert_eq!(service.add_points("u1", 25).await?, 75);
    assert_eq!(service.get_balance("u1").await?, 75);

    Ok(())
}

#[tokio::test]
async fn test_add_points_creates_account_on_first_write() -> Result<()> {
    let (service, store) = test_service();

    service.add_points("u1", 10).await?;

    let account = store.get("u1").await?.expect("account should exist");
    assert_eq!(account.points, 10);
    assert!(account.referrals.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_add_points_is_isolated_per_user() -> Result<()> {
    let (service, _store) = test_service();

    service.add_points("u1", 30).await?;
    service.add_points("u2", 5).await?;

    assert_eq!(service.get_balance("u1").await?, 30);
    assert_eq!(service.get_balance("u2").await?, 5);

    Ok(())
}

#[tokio::test]
async fn test_negative_amount_is_rejected() -> Result<()> {
    let (service, store) = test_service();

    service.add_points("u1", 20).await?;

    let err = service.add_points("u1", -5).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidAmount(_)));

    // The rejected credit must not touch the stored balance.
    assert_eq!(store.get("u1").await?.expect("account").points, 20);

    Ok(())
}

#[tokio::test]
async fn test_zero_amount_is_a_noop_credit() -> Result<()> {
    let (service, _store) = test_service();

    service.add_points("u1", 20).await?;
    assert_eq!(service.add_points("u1", 0).await?, 20);

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_credits_lose_no_updates() -> Result<()> {
    let (service, _store) = test_service();

    let mut handles = Vec::new();
    for _ in 0..50 {
        let service = service.clone();
        handles.push(tokio::spawn(
            async move { service.add_points("u1", 1).await },
        ));
    }
    for handle in handles {
        handle.await??;
    }

    assert_eq!(service.get_balance("u1").await?, 50);

    Ok(())
}

#[tokio::test]
async fn test_offline_store_surfaces_unavailable() -> Result<()> {
    let (service, store) = test_service();

    store.set_offline(true);

    let err = service.get_balance("u1").await.unwrap_err();
    assert!(matches!(err, AppError::StoreUnavailable(_)));

    let err = service.add_points("u1", 10).await.unwrap_err();
    assert!(matches!(err, AppError::StoreUnavailable(_)));

    Ok(())
}
