mod common;

use anyhow::Result;
use bankbook::AppError;
use bankbook::domain::TransactionType;
use common::{Holders, movements, test_service};

#[tokio::test]
async fn test_transfer_moves_funds_and_logs_pair() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let Holders { h1, h2 } = Holders::create(&service).await?;

    service.transfer_funds(h1.id, h2.id, 4000).await?;

    assert_eq!(service.get_account_by_id(h1.id).await?.balance, 6000);
    assert_eq!(service.get_account_by_id(h2.id).await?.balance, 4000);

    let from_txs = service.get_account_transactions(h1.id).await?;
    let to_txs = service.get_account_transactions(h2.id).await?;
    assert_eq!(movements(&from_txs), vec![(TransactionType::Debit, 4000)]);
    assert_eq!(movements(&to_txs), vec![(TransactionType::Credit, 4000)]);
    assert_eq!(from_txs[0].account_id, h1.id);
    assert_eq!(to_txs[0].account_id, h2.id);
    assert_ne!(from_txs[0].id, to_txs[0].id);
    Ok(())
}

#[tokio::test]
async fn test_transfer_with_insufficient_funds_changes_nothing() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let Holders { h1, h2 } = Holders::create(&service).await?;

    let result = service.transfer_funds(h1.id, h2.id, 10001).await;

    assert!(matches!(
        result,
        Err(AppError::InsufficientFunds { account_id, .. }) if account_id == h1.id
    ));
    assert_eq!(service.get_account_by_id(h1.id).await?.balance, 10000);
    assert_eq!(service.get_account_by_id(h2.id).await?.balance, 0);
    assert!(service.get_account_transactions(h1.id).await?.is_empty());
    assert!(service.get_account_transactions(h2.id).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_transfer_from_unknown_account() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let Holders { h1, .. } = Holders::create(&service).await?;

    let result = service.transfer_funds(999, h1.id, 100).await;

    assert!(matches!(result, Err(AppError::AccountNotFound(999))));
    assert_eq!(service.get_account_by_id(h1.id).await?.balance, 10000);
    Ok(())
}

#[tokio::test]
async fn test_transfer_to_unknown_account_keeps_source_intact() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let Holders { h1, .. } = Holders::create(&service).await?;

    let result = service.transfer_funds(h1.id, 999, 100).await;

    assert!(matches!(result, Err(AppError::AccountNotFound(999))));
    assert_eq!(service.get_account_by_id(h1.id).await?.balance, 10000);
    assert!(service.get_account_transactions(h1.id).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_missing_account_reported_before_insufficient_funds() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let Holders { h2, .. } = Holders::create(&service).await?;

    // h2 has nothing, but the missing destination is what gets reported
    let result = service.transfer_funds(h2.id, 999, 100).await;
    assert!(matches!(result, Err(AppError::AccountNotFound(999))));
    Ok(())
}

#[tokio::test]
async fn test_self_transfer_keeps_balance_and_logs_both_sides() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let Holders { h1, .. } = Holders::create(&service).await?;

    service.transfer_funds(h1.id, h1.id, 2500).await?;

    assert_eq!(service.get_account_by_id(h1.id).await?.balance, 10000);
    let mut kinds: Vec<_> = movements(&service.get_account_transactions(h1.id).await?);
    kinds.sort_by_key(|(tt, _)| tt.as_str());
    assert_eq!(
        kinds,
        vec![(TransactionType::Credit, 2500), (TransactionType::Debit, 2500)]
    );
    Ok(())
}

#[tokio::test]
async fn test_self_transfer_still_needs_cover() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let Holders { h2, .. } = Holders::create(&service).await?;

    let result = service.transfer_funds(h2.id, h2.id, 1).await;
    assert!(matches!(result, Err(AppError::InsufficientFunds { .. })));
    Ok(())
}

#[tokio::test]
async fn test_full_scenario() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let h1 = service.create_account("H1".into(), 10000).await?;

    let after_deposit = service.deposit(h1.id, 5000).await?;
    assert_eq!(after_deposit.balance, 15000);

    let after_withdraw = service.withdraw(h1.id, 3000).await?;
    assert_eq!(after_withdraw.balance, 12000);

    let h2 = service.create_account("H2".into(), 0).await?;
    service.transfer_funds(h1.id, h2.id, 12000).await?;

    assert_eq!(service.get_account_by_id(h1.id).await?.balance, 0);
    assert_eq!(service.get_account_by_id(h2.id).await?.balance, 12000);

    let h1_txs = service.get_account_transactions(h1.id).await?;
    assert_eq!(
        movements(&h1_txs),
        vec![
            (TransactionType::Debit, 12000),
            (TransactionType::Withdraw, 3000),
            (TransactionType::Deposit, 5000),
        ]
    );

    let h2_txs = service.get_account_transactions(h2.id).await?;
    assert_eq!(movements(&h2_txs), vec![(TransactionType::Credit, 12000)]);
    Ok(())
}

#[tokio::test]
async fn test_sequential_transfers_drain_exactly() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let Holders { h1, h2 } = Holders::create(&service).await?;

    for _ in 0..4 {
        service.transfer_funds(h1.id, h2.id, 2500).await?;
    }
    let overdraw = service.transfer_funds(h1.id, h2.id, 1).await;

    assert!(matches!(overdraw, Err(AppError::InsufficientFunds { .. })));
    assert_eq!(service.get_account_by_id(h1.id).await?.balance, 0);
    assert_eq!(service.get_account_by_id(h2.id).await?.balance, 10000);
    assert_eq!(service.get_account_transactions(h2.id).await?.len(), 4);
    Ok(())
}

#[tokio::test]
async fn test_transfer_overflowing_destination_changes_nothing() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let from = service.create_account("H1".into(), 100).await?;
    let to = service.create_account("H2".into(), i64::MAX).await?;

    let result = service.transfer_funds(from.id, to.id, 100).await;

    assert!(matches!(result, Err(AppError::InvalidAmount(_))));
    assert_eq!(service.get_account_by_id(from.id).await?.balance, 100);
    assert_eq!(service.get_account_by_id(to.id).await?.balance, i64::MAX);
    assert!(service.get_account_transactions(from.id).await?.is_empty());
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_transfers_conserve_funds() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let Holders { h1, h2 } = Holders::create(&service).await?;

    let handles: Vec<_> = (0..10)
        .map(|i| {
            let service = service.clone();
            let (from, to) = if i % 2 == 0 { (h1.id, h2.id) } else { (h2.id, h1.id) };
            let amount = if i % 2 == 0 { 1000 } else { 0 };
            tokio::spawn(async move { service.transfer_funds(from, to, amount).await })
        })
        .collect();

    for handle in handles {
        handle.await??;
    }

    let total = service.get_account_by_id(h1.id).await?.balance
        + service.get_account_by_id(h2.id).await?.balance;
    assert_eq!(total, 10000);
    assert_eq!(service.get_account_by_id(h2.id).await?.balance, 5000);
    assert_eq!(service.get_account_transactions(h1.id).await?.len(), 10);
    Ok(())
}
