use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Mutex,
    },
};

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use super::{
    repo::CreditStore,
    repo_types::{BankAccount, CreditTopup, NewTopup, TopupStatus},
};

#[derive(Default)]
struct Ledger {
    topups: Vec<CreditTopup>,
    balances: HashMap<Uuid, i64>,
    usernames: HashMap<Uuid, String>,
}

/// In-memory `CreditStore`. One lock covers status and balances so a
/// transition and its credit land together, as in the Postgres transaction.
#[derive(Default)]
pub struct MemoryCreditStore {
    ledger: Mutex<Ledger>,
    banks: Mutex<Vec<BankAccount>>,
    fail_inserts: AtomicBool,
}

impl MemoryCreditStore {
    pub fn add_user(&self, user_id: Uuid, username: &str) {
        let mut l = self.ledger.lock().unwrap();
        l.usernames.insert(user_id, username.to_string());
        l.balances.entry(user_id).or_insert(0);
    }

    pub fn add_bank(&self, bank: BankAccount) {
        self.banks.lock().unwrap().push(bank);
    }

    /// Make every following `insert_topup` fail.
    pub fn fail_inserts(&self) {
        self.fail_inserts.store(true, Ordering::SeqCst);
    }

    fn transition(&self, id: Uuid, to: TopupStatus) -> Option<CreditTopup> {
        let mut l = self.ledger.lock().unwrap();
        let t = l
            .topups
            .iter_mut()
            .find(|t| t.id == id && t.status == TopupStatus::Pending)?;
        t.status = to;
        t.processed_at = Some(OffsetDateTime::now_utc());
        let done = t.clone();
        if to == TopupStatus::Approved {
            *l.balances.entry(done.user_id).or_insert(0) += done.amount;
        }
        Some(done)
    }
}

#[async_trait]
impl CreditStore for MemoryCreditStore {
    async fn insert_topup(&self, n: NewTopup) -> anyhow::Result<CreditTopup> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            anyhow::bail!("insert topup: store unavailable");
        }
        let mut l = self.ledger.lock().unwrap();
        let username = l
            .usernames
            .get(&n.user_id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("insert topup: unknown user {}", n.user_id))?;
        let row = CreditTopup {
            id: Uuid::new_v4(),
            user_id: n.user_id,
            username,
            amount: n.amount,
            slip_image_key: n.slip_image_key,
            status: TopupStatus::Pending,
            bank_account: n.bank_account,
            transaction_time: n.transaction_time,
            created_at: OffsetDateTime::now_utc(),
            processed_at: None,
        };
        l.topups.push(row.clone());
        Ok(row)
    }

    async fn list_by_user(&self, user_id: Uuid) -> anyhow::Result<Vec<CreditTopup>> {
        let l = self.ledger.lock().unwrap();
        Ok(l.topups
            .iter()
            .rev()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn list_pending(&self) -> anyhow::Result<Vec<CreditTopup>> {
        let l = self.ledger.lock().unwrap();
        Ok(l.topups
            .iter()
            .rev()
            .filter(|t| t.status == TopupStatus::Pending)
            .cloned()
            .collect())
    }

    async fn approve(&self, id: Uuid) -> anyhow::Result<Option<CreditTopup>> {
        Ok(self.transition(id, TopupStatus::Approved))
    }

    async fn reject(&self, id: Uuid) -> anyhow::Result<Option<CreditTopup>> {
        Ok(self.transition(id, TopupStatus::Rejected))
    }

    async fn balance(&self, user_id: Uuid) -> anyhow::Result<Option<i64>> {
        Ok(self.ledger.lock().unwrap().balances.get(&user_id).copied())
    }

    async fn list_bank_accounts(&self) -> anyhow::Result<Vec<BankAccount>> {
        Ok(self.banks.lock().unwrap().clone())
    }
}
