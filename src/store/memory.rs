//! In-process store used for offline mode and tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};
use log::debug;
use rand::distributions::Alphanumeric;
use rand::Rng;

use crate::error::{RawlineError, Result};
use crate::models::{ContentPatch, Item, ItemPatch, NewItem, SiteContent};
use crate::store::{sort_newest_first, RemoteStore};

/// A failure to inject into the next store call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    Permission,
    Network,
}

impl Failure {
    fn into_error(self) -> RawlineError {
        match self {
            Failure::Permission => {
                RawlineError::Permission("Missing or insufficient permissions.".into())
            }
            Failure::Network => RawlineError::Remote {
                status: 503,
                message: "The service is currently unavailable.".into(),
            },
        }
    }
}

#[derive(Default)]
struct Inner {
    items: Vec<Item>,
    content: Option<ContentPatch>,
    clock: Option<DateTime<Utc>>,
    failures: VecDeque<Failure>,
    require_auth: bool,
    token: Option<String>,
    writes: usize,
}

/// Shared in-memory store. Clones are handles onto the same data, so a
/// test can keep one while the client owns another.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with `items` (kept as given, ids included).
    pub fn with_items(items: Vec<Item>) -> Self {
        let store = Self::new();
        store.lock().items = items;
        store
    }

    pub fn with_content(self, content: ContentPatch) -> Self {
        self.lock().content = Some(content);
        self
    }

    /// Reject writes that arrive without an identity token.
    pub fn require_auth(self, required: bool) -> Self {
        self.lock().require_auth = required;
        self
    }

    /// Queue a failure for the next call, whatever it is.
    pub fn fail_next(&self, failure: Failure) {
        self.lock().failures.push_back(failure);
    }

    /// Raw stored items, in insertion order.
    pub fn items(&self) -> Vec<Item> {
        self.lock().items.clone()
    }

    pub fn content(&self) -> Option<ContentPatch> {
        self.lock().content.clone()
    }

    /// Number of successful writes so far.
    pub fn writes(&self) -> usize {
        self.lock().writes
    }

    pub fn clear_items(&self) {
        self.lock().items.clear();
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panic while holding the lock leaves plain data behind, so the
        // poisoned guard is still usable.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn enter(&self) -> Result<MutexGuard<'_, Inner>> {
        let mut inner = self.lock();
        if let Some(failure) = inner.failures.pop_front() {
            return Err(failure.into_error());
        }
        Ok(inner)
    }

    fn enter_write(&self) -> Result<MutexGuard<'_, Inner>> {
        let inner = self.enter()?;
        if inner.require_auth && inner.token.is_none() {
            return Err(RawlineError::Permission(
                "Missing or insufficient permissions.".into(),
            ));
        }
        Ok(inner)
    }
}

impl Inner {
    /// Strictly increasing creation clock.
    fn tick(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let next = match self.clock {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.clock = Some(next);
        next
    }
}

/// 20-character alphanumeric identifier.
pub(crate) fn generate_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(20)
        .map(char::from)
        .collect()
}

impl RemoteStore for MemoryStore {
    fn list_items(&self) -> Result<Vec<Item>> {
        let mut items = self.enter()?.items.clone();
        sort_newest_first(&mut items);
        Ok(items)
    }

    fn create_item(&self, item: &NewItem) -> Result<Item> {
        item.validate()?;
        let mut inner = self.enter_write()?;
        let created_at = inner.tick();
        let stored = item.clone().into_item(generate_id(), Some(created_at));
        debug!("Memory store created piece {}", stored.id);
        inner.items.push(stored.clone());
        inner.writes += 1;
        Ok(stored)
    }

    fn update_item(&self, id: &str, patch: &ItemPatch) -> Result<()> {
        patch.validate()?;
        let mut inner = self.enter_write()?;
        let item = inner
            .items
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| RawlineError::NotFound(format!("piece {}", id)))?;
        item.apply(patch);
        inner.writes += 1;
        Ok(())
    }

    fn delete_item(&self, id: &str) -> Result<()> {
        let mut inner = self.enter_write()?;
        inner.items.retain(|i| i.id != id);
        inner.writes += 1;
        Ok(())
    }

    fn get_site_content(&self) -> Result<Option<ContentPatch>> {
        Ok(self.enter()?.content.clone())
    }

    fn save_site_content(&self, content: &SiteContent) -> Result<()> {
        let mut inner = self.enter_write()?;
        inner.content = Some(ContentPatch::from(content.clone()));
        inner.writes += 1;
        Ok(())
    }

    fn authorize(&mut self, token: Option<&str>) {
        self.lock().token = token.map(str::to_string);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn created_items_list_newest_first() {
        let store = MemoryStore::new();
        let first = store.create_item(&NewItem::archive("RL-1")).unwrap();
        let second = store.create_item(&NewItem::archive("RL-2")).unwrap();
        assert_eq!(first.id.len(), 20);
        assert_ne!(first.id, second.id);

        let listed = store.list_items().unwrap();
        assert_eq!(listed[0].id, second.id);
        assert_eq!(listed[1].id, first.id);
    }

    #[test]
    fn update_of_missing_piece_is_not_found() {
        let store = MemoryStore::new();
        let err = store
            .update_item("gone", &ItemPatch::default().code("X"))
            .unwrap_err();
        assert!(matches!(err, RawlineError::NotFound(_)));
    }

    #[test]
    fn injected_failure_applies_once() {
        let store = MemoryStore::new();
        store.fail_next(Failure::Permission);
        assert!(store.list_items().unwrap_err().is_permission());
        assert!(store.list_items().unwrap().is_empty());
    }

    #[test]
    fn writes_need_a_token_when_required() {
        let mut store = MemoryStore::new().require_auth(true);
        assert!(store.create_item(&NewItem::archive("RL-1")).is_err());
        store.authorize(Some("token"));
        assert!(store.create_item(&NewItem::archive("RL-1")).is_ok());
        assert_eq!(store.writes(), 1);
    }
}
