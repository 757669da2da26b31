//! Catalog state store: what the presentation layer renders from.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::{Category, ContentPatch, Item, ItemStatus, NewItem, SiteContent};

// ---------------------------------------------------------------------------
// CatalogState
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogState {
    /// Never absent; "nothing" is an empty list.
    pub items: Vec<Item>,
    /// Always complete; remote gaps are backfilled from defaults.
    pub content: SiteContent,
    pub loading: bool,
    pub last_error: Option<String>,
}

impl Default for CatalogState {
    fn default() -> Self {
        Self {
            items: seed_items(),
            content: SiteContent::default(),
            loading: true,
            last_error: None,
        }
    }
}

impl CatalogState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from previously synced data instead of the seed catalog.
    pub fn from_snapshot(items: Vec<Item>, content: SiteContent) -> Self {
        Self {
            items,
            content,
            loading: true,
            last_error: None,
        }
    }

    /// Stage a content edit in memory only. Nothing is written until the
    /// admin console saves.
    pub fn apply_local_content_edit(&mut self, patch: ContentPatch) {
        self.content.merge(patch);
    }

    pub fn health(&self) -> SyncHealth {
        if self.last_error.is_some() {
            SyncHealth::Offline
        } else {
            SyncHealth::Live
        }
    }

    pub fn query(&self) -> CatalogQuery<'_> {
        CatalogQuery::new(self)
    }
}

/// Banner state shown across the whole site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncHealth {
    /// Last reload reached the store.
    Live,
    /// Showing cached or seed data after a failed reload.
    Offline,
}

impl SyncHealth {
    pub fn label(self) -> &'static str {
        match self {
            SyncHealth::Live => "CORE_SYSTEM_ONLINE",
            SyncHealth::Offline => "OFFLINE_FALLBACK",
        }
    }

    pub fn archive_label(self) -> &'static str {
        match self {
            SyncHealth::Live => "Active Cloud",
            SyncHealth::Offline => "Local",
        }
    }
}

impl fmt::Display for SyncHealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

const SEED: [(&str, &str, ItemStatus, &str, &str, &str); 6] = [
    ("RL–ARCH–0001", "1990s", ItemStatus::Archived, "photo-1520975916090-3105956dac38", "Nylon / PVC", "Archive"),
    ("RL–ARCH–0002", "Early 2000s", ItemStatus::Active, "photo-1503342217505-b0a15ec3261c", "Raw Cotton", "Worn"),
    ("RL–ARCH–0003", "1990s", ItemStatus::Study, "photo-1521335629791-ce4aec67dd47", "Indigo Denim", "Reworked"),
    ("RL–ARCH–0004", "Early 2000s", ItemStatus::Active, "photo-1495385794356-15371f348c31", "Polyester Mesh", "Archive"),
    ("RL–ARCH–0005", "Late 1980s", ItemStatus::Archived, "photo-1551488831-00ddcb6c6bd3", "Heavy Canvas", "Distressed"),
    ("RL–ARCH–0006", "1990s", ItemStatus::Released, "photo-1578681994506-b8f463449011", "Synthetic Blend", "Clean"),
];

/// The catalog shown before the first successful reload.
pub fn seed_items() -> Vec<Item> {
    SEED.iter()
        .enumerate()
        .map(|(i, (code, era, status, photo, material, condition))| {
            let draft = NewItem {
                era: era.to_string(),
                status: *status,
                image_url: format!("https://images.unsplash.com/{}", photo),
                material: Some(material.to_string()),
                condition: Some(condition.to_string()),
                category: None,
                ..NewItem::archive(*code)
            };
            draft.into_item((i + 1).to_string(), None)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// CatalogQuery
// ---------------------------------------------------------------------------

/// Read-only filtering over a state snapshot.
pub struct CatalogQuery<'a> {
    state: &'a CatalogState,
}

impl<'a> CatalogQuery<'a> {
    pub fn new(state: &'a CatalogState) -> Self {
        Self { state }
    }

    pub fn all(&self) -> &'a [Item] {
        &self.state.items
    }

    pub fn get(&self, id: &str) -> Option<&'a Item> {
        self.state.items.iter().find(|i| i.id == id)
    }

    /// Storefront filter. `None` for either argument means "All"; the
    /// strain is matched against `era`, case-insensitively.
    pub fn filter(&self, category: Option<Category>, strain: Option<&str>) -> Vec<&'a Item> {
        self.state
            .items
            .iter()
            .filter(|i| category.map_or(true, |c| i.category == Some(c)))
            .filter(|i| strain.map_or(true, |s| i.era.eq_ignore_ascii_case(s)))
            .collect()
    }

    pub fn by_status(&self, status: ItemStatus) -> Vec<&'a Item> {
        self.state
            .items
            .iter()
            .filter(|i| i.status == status)
            .collect()
    }

    /// Case-insensitive substring match on code, era, material and
    /// description.
    pub fn search(&self, needle: &str) -> Vec<&'a Item> {
        let needle = needle.to_lowercase();
        self.state
            .items
            .iter()
            .filter(|i| {
                [
                    Some(i.code.as_str()),
                    Some(i.era.as_str()),
                    i.material.as_deref(),
                    i.description.as_deref(),
                ]
                .into_iter()
                .flatten()
                .any(|field| field.to_lowercase().contains(&needle))
            })
            .collect()
    }

    pub fn count(&self) -> usize {
        self.state.items.len()
    }

    pub fn count_by_category(&self, category: Category) -> usize {
        self.filter(Some(category), None).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_loading_with_seed_data() {
        let state = CatalogState::new();
        assert!(state.loading);
        assert_eq!(state.items.len(), 6);
        assert_eq!(state.items[0].id, "1");
        assert_eq!(state.health(), SyncHealth::Live);
    }

    #[test]
    fn banner_labels() {
        assert_eq!(SyncHealth::Live.to_string(), "CORE_SYSTEM_ONLINE");
        assert_eq!(SyncHealth::Offline.label(), "OFFLINE_FALLBACK");
        assert_eq!(SyncHealth::Live.archive_label(), "Active Cloud");
        assert_eq!(SyncHealth::Offline.archive_label(), "Local");
    }

    #[test]
    fn local_edit_touches_only_content() {
        let mut state = CatalogState::new();
        let items = state.items.clone();
        state.apply_local_content_edit(ContentPatch::hero_title("NEW TITLE"));
        assert_eq!(state.content.hero_title, "NEW TITLE");
        assert_eq!(state.items, items);
    }

    #[test]
    fn queries_filter_seed_catalog() {
        let state = CatalogState::new();
        let q = state.query();
        assert_eq!(q.filter(None, Some("1990S")).len(), 3);
        assert_eq!(q.by_status(ItemStatus::Active).len(), 2);
        assert_eq!(q.search("denim")[0].code, "RL–ARCH–0003");
        assert!(q.get("6").is_some());
        assert_eq!(q.count_by_category(Category::Flower), 0);
    }
}
