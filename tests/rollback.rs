use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use chrono::{Duration, TimeZone, Utc};
use uuid::Uuid;

use savings_ledger::{
    Amount, Ledger, LedgerError, LedgerSettings,
    clock::FixedClock,
    models::{
        account::{Account, SortOrder, UserId},
        savings::{NewSavingsGoal, SavingsGoal},
        wallet::Wallet,
    },
    store::{LedgerStore, MemoryStore, StoreError},
};

/// Memory store that fails the next N writes of a kind.
///
/// The `concurrent_*` counters simulate another writer that skips the
/// ledger's locks: the named document of the owner gets an outside deposit
/// just before the next goal write (`concurrent_wallet_deposits`) or wallet
/// write (`concurrent_goal_deposits`).
#[derive(Debug, Default)]
struct FlakyStore {
    inner: MemoryStore,
    failing_wallet_saves: AtomicUsize,
    failing_goal_saves: AtomicUsize,
    failing_deletes: AtomicUsize,
    concurrent_wallet_deposits: AtomicUsize,
    concurrent_goal_deposits: AtomicUsize,
}

fn take(counter: &AtomicUsize) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

fn trip(counter: &AtomicUsize) -> Result<(), StoreError> {
    if take(counter) {
        Err(StoreError::Unavailable("injected failure".to_string()))
    } else {
        Ok(())
    }
}

/// One minor unit deposited by a writer that does not take the ledger's locks.
fn outside_deposit(account: &mut Account) {
    account
        .deposit(Amount::from_minor(1), Some("outside".to_string()), Utc::now())
        .unwrap();
}

impl FlakyStore {
    async fn bump_wallet(&self, owner_id: UserId) -> Result<(), StoreError> {
        if let Some(mut wallet) = self.inner.load_wallet(owner_id).await? {
            outside_deposit(&mut wallet.account);
            self.inner.save_wallet(&mut wallet).await?;
        }
        Ok(())
    }

    async fn bump_goals(&self, owner_id: UserId) -> Result<(), StoreError> {
        for mut goal in self.inner.list_goals(owner_id).await? {
            outside_deposit(&mut goal.account);
            self.inner.save_goal(&mut goal).await?;
        }
        Ok(())
    }
}

impl LedgerStore for FlakyStore {
    async fn load_wallet(&self, owner_id: UserId) -> Result<Option<Wallet>, StoreError> {
        self.inner.load_wallet(owner_id).await
    }

    async fn save_wallet(&self, wallet: &mut Wallet) -> Result<(), StoreError> {
        if take(&self.concurrent_goal_deposits) {
            self.bump_goals(wallet.owner_id()).await?;
        }
        trip(&self.failing_wallet_saves)?;
        self.inner.save_wallet(wallet).await
    }

    async fn load_goal(
        &self,
        owner_id: UserId,
        goal_id: Uuid,
    ) -> Result<Option<SavingsGoal>, StoreError> {
        self.inner.load_goal(owner_id, goal_id).await
    }

    async fn list_goals(&self, owner_id: UserId) -> Result<Vec<SavingsGoal>, StoreError> {
        self.inner.list_goals(owner_id).await
    }

    async fn save_goal(&self, goal: &mut SavingsGoal) -> Result<(), StoreError> {
        if take(&self.concurrent_wallet_deposits) {
            self.bump_wallet(goal.owner_id()).await?;
        }
        trip(&self.failing_goal_saves)?;
        self.inner.save_goal(goal).await
    }

    async fn delete_goal(&self, goal: &SavingsGoal) -> Result<(), StoreError> {
        if take(&self.concurrent_wallet_deposits) {
            self.bump_wallet(goal.owner_id()).await?;
        }
        trip(&self.failing_deletes)?;
        self.inner.delete_goal(goal).await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.inner.ping().await
    }
}

fn setup() -> (Ledger<FlakyStore>, Uuid) {
    let clock = Arc::new(FixedClock::new(
        Utc.with_ymd_and_hms(2026, 10, 18, 10, 0, 0).unwrap(),
    ));
    let ledger = Ledger::with_clock(FlakyStore::default(), LedgerSettings::default(), clock);
    (ledger, Uuid::new_v4())
}

fn is_injected(err: &LedgerError) -> bool {
    matches!(err, LedgerError::Storage(StoreError::Unavailable(_)))
}

async fn unlocked_goal(ledger: &Ledger<FlakyStore>, user: Uuid, minor: i64) -> Uuid {
    let lock_date = ledger.today() + Duration::days(30);
    ledger
        .fund_savings_from_wallet(
            user,
            Amount::from_minor(minor),
            NewSavingsGoal::new("Holiday", lock_date).unlocked(),
        )
        .await
        .unwrap()
        .id()
}

#[tokio::test]
async fn failed_goal_creation_reverses_the_wallet_debit() {
    let (ledger, user) = setup();
    ledger.deposit(user, Amount::from_minor(500), None).await.unwrap();
    ledger.store().failing_goal_saves.store(1, Ordering::SeqCst);

    let err = ledger
        .fund_savings_from_wallet(
            user,
            Amount::from_minor(200),
            NewSavingsGoal::new("Holiday", ledger.today() + Duration::days(7)),
        )
        .await
        .unwrap_err();

    assert!(is_injected(&err));
    assert!(ledger.list_for_user(user).await.unwrap().is_empty());

    let (wallet, history) = ledger
        .wallet_history(user, SortOrder::OldestFirst)
        .await
        .unwrap();
    assert_eq!(wallet.balance().minor(), 500);
    assert_eq!(history.len(), 3);
    assert_eq!(
        history[2].description.as_deref(),
        Some("Reversal: Transfer to savings: Holiday")
    );
    assert_eq!(i128::from(wallet.balance().minor()), wallet.account.net_flow());
}

#[tokio::test]
async fn failed_goal_credit_reverses_the_wallet_debit() {
    let (ledger, user) = setup();
    ledger.deposit(user, Amount::from_minor(500), None).await.unwrap();
    let goal_id = unlocked_goal(&ledger, user, 100).await;
    ledger.store().failing_goal_saves.store(1, Ordering::SeqCst);

    let err = ledger
        .add_to_savings(user, goal_id, Amount::from_minor(50))
        .await
        .unwrap_err();

    assert!(is_injected(&err));
    assert_eq!(ledger.wallet(user).await.unwrap().balance().minor(), 400);
    assert_eq!(
        ledger.savings_goal(user, goal_id).await.unwrap().balance().minor(),
        100
    );
}

#[tokio::test]
async fn failed_wallet_credit_puts_money_back_into_the_goal() {
    let (ledger, user) = setup();
    ledger.deposit(user, Amount::from_minor(500), None).await.unwrap();
    let goal_id = unlocked_goal(&ledger, user, 200).await;
    ledger.store().failing_wallet_saves.store(1, Ordering::SeqCst);

    let err = ledger
        .withdraw_from_savings(user, goal_id, Amount::from_minor(50), true)
        .await
        .unwrap_err();

    assert!(is_injected(&err));
    assert_eq!(ledger.wallet(user).await.unwrap().balance().minor(), 300);

    let goal = ledger.savings_goal(user, goal_id).await.unwrap();
    assert_eq!(goal.balance().minor(), 200);
    let history = goal.account.history(SortOrder::OldestFirst);
    assert_eq!(history.len(), 3);
    assert_eq!(history[1].description.as_deref(), Some("Transfer to wallet"));
    assert_eq!(
        history[2].description.as_deref(),
        Some("Reversal: Transfer from savings: Holiday")
    );
}

#[tokio::test]
async fn failed_refund_leaves_the_goal_in_place() {
    let (ledger, user) = setup();
    ledger.deposit(user, Amount::from_minor(100), None).await.unwrap();
    let goal_id = unlocked_goal(&ledger, user, 80).await;
    ledger.store().failing_wallet_saves.store(1, Ordering::SeqCst);

    let err = ledger.delete_savings(user, goal_id).await.unwrap_err();

    assert!(is_injected(&err));
    assert_eq!(ledger.wallet(user).await.unwrap().balance().minor(), 20);
    assert_eq!(
        ledger.savings_goal(user, goal_id).await.unwrap().balance().minor(),
        80
    );
}

#[tokio::test]
async fn failed_goal_removal_reverses_the_refund() {
    let (ledger, user) = setup();
    ledger.deposit(user, Amount::from_minor(100), None).await.unwrap();
    let goal_id = unlocked_goal(&ledger, user, 80).await;
    ledger.store().failing_deletes.store(1, Ordering::SeqCst);

    let err = ledger.delete_savings(user, goal_id).await.unwrap_err();

    assert!(is_injected(&err));
    assert_eq!(
        ledger.savings_goal(user, goal_id).await.unwrap().balance().minor(),
        80
    );

    let (wallet, history) = ledger
        .wallet_history(user, SortOrder::OldestFirst)
        .await
        .unwrap();
    assert_eq!(wallet.balance().minor(), 20);
    assert_eq!(history.len(), 4);
    assert_eq!(
        history[2].description.as_deref(),
        Some("Refund from deleted savings: Holiday")
    );
    assert_eq!(
        history[3].description.as_deref(),
        Some("Reversal: Refund from deleted savings: Holiday")
    );

    // the retry goes through once storage recovers
    assert_eq!(ledger.delete_savings(user, goal_id).await.unwrap().minor(), 80);
    assert_eq!(ledger.wallet(user).await.unwrap().balance().minor(), 100);
}

#[tokio::test]
async fn failed_wallet_save_applies_nothing() {
    let (ledger, user) = setup();
    ledger.deposit(user, Amount::from_minor(100), None).await.unwrap();
    ledger.store().failing_wallet_saves.store(1, Ordering::SeqCst);

    let err = ledger
        .withdraw(user, Amount::from_minor(30), None)
        .await
        .unwrap_err();

    assert!(is_injected(&err));
    let wallet = ledger.wallet(user).await.unwrap();
    assert_eq!(wallet.balance().minor(), 100);
    assert_eq!(wallet.account.history.len(), 1);
}

#[tokio::test]
async fn wallet_reversal_survives_a_concurrent_wallet_write() {
    let (ledger, user) = setup();
    ledger.deposit(user, Amount::from_minor(500), None).await.unwrap();
    ledger.store().concurrent_wallet_deposits.store(1, Ordering::SeqCst);
    ledger.store().failing_goal_saves.store(1, Ordering::SeqCst);

    let err = ledger
        .fund_savings_from_wallet(
            user,
            Amount::from_minor(200),
            NewSavingsGoal::new("Holiday", ledger.today() + Duration::days(7)),
        )
        .await
        .unwrap_err();

    assert!(is_injected(&err));
    assert!(ledger.list_for_user(user).await.unwrap().is_empty());

    let (wallet, history) = ledger
        .wallet_history(user, SortOrder::OldestFirst)
        .await
        .unwrap();
    assert_eq!(wallet.balance().minor(), 501);
    assert_eq!(
        history.last().unwrap().description.as_deref(),
        Some("Reversal: Transfer to savings: Holiday")
    );
    assert_eq!(i128::from(wallet.balance().minor()), wallet.account.net_flow());
}

#[tokio::test]
async fn savings_reversal_survives_a_concurrent_goal_write() {
    let (ledger, user) = setup();
    ledger.deposit(user, Amount::from_minor(500), None).await.unwrap();
    let goal_id = unlocked_goal(&ledger, user, 200).await;
    ledger.store().concurrent_goal_deposits.store(1, Ordering::SeqCst);
    ledger.store().failing_wallet_saves.store(1, Ordering::SeqCst);

    let err = ledger
        .withdraw_from_savings(user, goal_id, Amount::from_minor(50), true)
        .await
        .unwrap_err();

    assert!(is_injected(&err));
    assert_eq!(ledger.wallet(user).await.unwrap().balance().minor(), 300);

    let goal = ledger.savings_goal(user, goal_id).await.unwrap();
    assert_eq!(goal.balance().minor(), 201);
    assert_eq!(i128::from(goal.balance().minor()), goal.account.net_flow());
    assert_eq!(
        goal.account
            .history(SortOrder::OldestFirst)
            .last()
            .unwrap()
            .description
            .as_deref(),
        Some("Reversal: Transfer from savings: Holiday")
    );
}

#[tokio::test]
async fn refund_reversal_survives_a_concurrent_wallet_write() {
    let (ledger, user) = setup();
    ledger.deposit(user, Amount::from_minor(100), None).await.unwrap();
    let goal_id = unlocked_goal(&ledger, user, 80).await;
    ledger.store().concurrent_wallet_deposits.store(1, Ordering::SeqCst);
    ledger.store().failing_deletes.store(1, Ordering::SeqCst);

    let err = ledger.delete_savings(user, goal_id).await.unwrap_err();

    assert!(is_injected(&err));
    let wallet = ledger.wallet(user).await.unwrap();
    assert_eq!(wallet.balance().minor(), 21);
    assert_eq!(i128::from(wallet.balance().minor()), wallet.account.net_flow());
    assert_eq!(
        ledger.savings_goal(user, goal_id).await.unwrap().balance().minor(),
        80
    );
}
