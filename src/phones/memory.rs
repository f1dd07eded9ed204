use std::{
    collections::{HashMap, HashSet},
    sync::Mutex,
};

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use super::{
    repo::PhoneStore,
    repo_types::{NewPhoneExport, PhoneExport},
};

#[derive(Debug, Clone)]
pub struct StoredNumber {
    pub number: String,
    pub batch_id: String,
}

/// In-memory `PhoneStore` with the same per-user uniqueness rule as the
/// `phone_numbers` table.
#[derive(Default)]
pub struct MemoryPhoneStore {
    users: Mutex<HashSet<Uuid>>,
    numbers: Mutex<HashMap<Uuid, Vec<StoredNumber>>>,
    exports: Mutex<Vec<PhoneExport>>,
}

impl MemoryPhoneStore {
    pub fn with_user(user_id: Uuid) -> Self {
        let store = Self::default();
        store.users.lock().unwrap().insert(user_id);
        store
    }

    pub fn stored(&self, user_id: Uuid) -> Vec<StoredNumber> {
        self.numbers
            .lock()
            .unwrap()
            .get(&user_id)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl PhoneStore for MemoryPhoneStore {
    async fn user_exists(&self, user_id: Uuid) -> anyhow::Result<bool> {
        Ok(self.users.lock().unwrap().contains(&user_id))
    }

    async fn existing_numbers(&self, user_id: Uuid) -> anyhow::Result<HashSet<String>> {
        Ok(self.stored(user_id).into_iter().map(|s| s.number).collect())
    }

    async fn insert_batch(
        &self,
        user_id: Uuid,
        batch_id: &str,
        numbers: &[String],
    ) -> anyhow::Result<u64> {
        let mut all = self.numbers.lock().unwrap();
        let rows = all.entry(user_id).or_default();
        let mut inserted = 0;
        for n in numbers {
            if rows.iter().any(|r| &r.number == n) {
                continue;
            }
            rows.push(StoredNumber {
                number: n.clone(),
                batch_id: batch_id.to_string(),
            });
            inserted += 1;
        }
        Ok(inserted)
    }

    async fn list_numbers(&self, user_id: Uuid) -> anyhow::Result<Vec<String>> {
        Ok(self.stored(user_id).into_iter().map(|s| s.number).collect())
    }

    async fn count(&self, user_id: Uuid) -> anyhow::Result<i64> {
        Ok(self.stored(user_id).len() as i64)
    }

    async fn record_export(&self, e: NewPhoneExport) -> anyhow::Result<PhoneExport> {
        let row = PhoneExport {
            id: e.id,
            user_id: e.user_id,
            file_name: e.file_name,
            format: e.format,
            total_numbers: e.total_numbers,
            part_count: e.part_count,
            s3_key: e.s3_key,
            created_at: OffsetDateTime::now_utc(),
        };
        self.exports.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn list_exports(&self, user_id: Uuid) -> anyhow::Result<Vec<PhoneExport>> {
        let mut rows: Vec<PhoneExport> = self
            .exports
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect();
        rows.reverse();
        Ok(rows)
    }

    async fn find_export(&self, user_id: Uuid, id: Uuid) -> anyhow::Result<Option<PhoneExport>> {
        Ok(self
            .exports
            .lock()
            .unwrap()
            .iter()
            .find(|e| e.id == id && e.user_id == user_id)
            .cloned())
    }
}
