//! Remote store gateway: the port the orchestrator and admin console talk
//! to, plus the hosted-document-database and in-memory adapters.

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreStore;
pub use memory::MemoryStore;

use crate::error::Result;
use crate::models::{ContentPatch, Item, ItemPatch, NewItem, SiteContent};

/// Create/read/update/delete access to the pieces collection and the
/// content singleton.
///
/// Calls are blocking, single-shot and never retried here; callers own
/// any retry policy.
pub trait RemoteStore: Send {
    /// Every piece, newest first. An empty collection is `Ok(vec![])`.
    fn list_items(&self) -> Result<Vec<Item>>;

    /// Create a piece; the store assigns the id and creation time.
    fn create_item(&self, item: &NewItem) -> Result<Item>;

    /// Write only the fields set on `patch`.
    ///
    /// Fails with [`NotFound`](crate::RawlineError::NotFound) when `id`
    /// does not exist remotely.
    fn update_item(&self, id: &str, patch: &ItemPatch) -> Result<()>;

    fn delete_item(&self, id: &str) -> Result<()>;

    /// The content document as stored, or `None` if it was never saved.
    fn get_site_content(&self) -> Result<Option<ContentPatch>>;

    /// Overwrite the whole content document.
    fn save_site_content(&self, content: &SiteContent) -> Result<()>;

    /// Attach (or with `None`, drop) the operator's identity token used
    /// for writes.
    fn authorize(&mut self, _token: Option<&str>) {}
}

impl<S: RemoteStore + ?Sized> RemoteStore for Box<S> {
    fn list_items(&self) -> Result<Vec<Item>> {
        (**self).list_items()
    }

    fn create_item(&self, item: &NewItem) -> Result<Item> {
        (**self).create_item(item)
    }

    fn update_item(&self, id: &str, patch: &ItemPatch) -> Result<()> {
        (**self).update_item(id, patch)
    }

    fn delete_item(&self, id: &str) -> Result<()> {
        (**self).delete_item(id)
    }

    fn get_site_content(&self) -> Result<Option<ContentPatch>> {
        (**self).get_site_content()
    }

    fn save_site_content(&self, content: &SiteContent) -> Result<()> {
        (**self).save_site_content(content)
    }

    fn authorize(&mut self, token: Option<&str>) {
        (**self).authorize(token)
    }
}

/// Stable sort by creation time, newest first. Pieces without a creation
/// time sink to the end in arrival order.
pub fn sort_newest_first(items: &mut [Item]) {
    items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ItemStatus, NewItem};
    use chrono::{TimeZone, Utc};

    fn item(id: &str, secs: Option<i64>) -> Item {
        NewItem::archive(id).into_item(
            id.to_string(),
            secs.map(|s| Utc.timestamp_opt(s, 0).unwrap()),
        )
    }

    #[test]
    fn newest_first_is_stable() {
        let mut items = vec![
            item("a", Some(10)),
            item("b", None),
            item("c", Some(30)),
            item("d", Some(10)),
            item("e", None),
        ];
        sort_newest_first(&mut items);
        let ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "d", "b", "e"]);
        assert!(items.iter().all(|i| i.status == ItemStatus::Archived));
    }
}
