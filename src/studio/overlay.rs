//! Session-local image overrides layered over the catalog.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use serde::Serialize;

use super::types::{CatalogItem, ImageRef, ItemKey, OverlaySource, Section};
use crate::catalog::Catalog;

pub type SubscriptionId = u64;

type Observer = Arc<dyn Fn(&OverlayChange) + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayEntry {
    pub image: ImageRef,
    pub source: OverlaySource,
    pub updated_at: i64, // unix ms
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayChange {
    pub key: ItemKey,
    pub image: ImageRef,
    pub source: OverlaySource,
    pub previous: Option<ImageRef>,
}

#[derive(Default)]
struct ObserverList {
    seq: SubscriptionId,
    entries: Vec<(SubscriptionId, Observer)>,
}

/// Catalog items plus the overlay map. Writes are last-write-wins; nothing is
/// ever removed for the lifetime of the store.
pub struct CatalogOverlayStore {
    items: Vec<CatalogItem>,
    index: HashMap<ItemKey, usize>,
    overrides: Mutex<HashMap<ItemKey, OverlayEntry>>,
    observers: Mutex<ObserverList>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl CatalogOverlayStore {
    pub fn new(items: Vec<CatalogItem>) -> Self {
        let index = items
            .iter()
            .enumerate()
            .map(|(idx, item)| (item.key.clone(), idx))
            .collect();
        Self {
            items,
            index,
            overrides: Mutex::new(HashMap::new()),
            observers: Mutex::new(ObserverList::default()),
        }
    }

    pub fn from_catalog(catalog: &Catalog) -> Self {
        Self::new(catalog.image_items())
    }

    pub fn item(&self, key: &ItemKey) -> Option<&CatalogItem> {
        self.index.get(key).map(|&idx| &self.items[idx])
    }

    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    pub fn items_in(&self, section: Section) -> impl Iterator<Item = &CatalogItem> {
        self.items.iter().filter(move |item| item.key.section == section)
    }

    pub fn set_override(&self, key: ItemKey, image: ImageRef, source: OverlaySource) {
        if !self.index.contains_key(&key) {
            log::debug!("[overlay] override for unknown item {}", key);
        }
        let previous = {
            let mut guard = lock(&self.overrides);
            guard
                .insert(
                    key.clone(),
                    OverlayEntry {
                        image: image.clone(),
                        source,
                        updated_at: Utc::now().timestamp_millis(),
                    },
                )
                .map(|entry| entry.image)
        };
        let change = OverlayChange {
            key,
            image,
            source,
            previous,
        };
        // Observers run outside the locks so they may read the store back.
        let observers: Vec<Observer> = lock(&self.observers)
            .entries
            .iter()
            .map(|(_, observer)| observer.clone())
            .collect();
        for observer in observers {
            observer(&change);
        }
    }

    /// Override if present, else the catalog original. `None` only for keys
    /// the store has never heard of.
    pub fn effective_image(&self, key: &ItemKey) -> Option<ImageRef> {
        if let Some(entry) = lock(&self.overrides).get(key) {
            return Some(entry.image.clone());
        }
        self.item(key).map(|item| item.original_image.clone())
    }

    pub fn override_for(&self, key: &ItemKey) -> Option<OverlayEntry> {
        lock(&self.overrides).get(key).cloned()
    }

    pub fn is_overridden(&self, key: &ItemKey) -> bool {
        lock(&self.overrides).contains_key(key)
    }

    pub fn overrides(&self) -> Vec<(ItemKey, OverlayEntry)> {
        let mut list: Vec<_> = lock(&self.overrides)
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        list.sort_by(|a, b| a.0.cmp(&b.0));
        list
    }

    pub fn subscribe<F>(&self, observer: F) -> SubscriptionId
    where
        F: Fn(&OverlayChange) + Send + Sync + 'static,
    {
        let mut guard = lock(&self.observers);
        guard.seq += 1;
        let id = guard.seq;
        guard.entries.push((id, Arc::new(observer)));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut guard = lock(&self.observers);
        let before = guard.entries.len();
        guard.entries.retain(|(sid, _)| *sid != id);
        guard.entries.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_curtains() -> CatalogOverlayStore {
        CatalogOverlayStore::new(vec![
            CatalogItem {
                key: ItemKey::service("curtains"),
                title: "Curtains & Drapery".into(),
                category: "Curtains & Drapery".into(),
                original_image: ImageRef::from("orig.jpg"),
            },
            CatalogItem {
                key: ItemKey::blog("1"),
                title: "Top Trends".into(),
                category: "Trends".into(),
                original_image: ImageRef::from("blog.jpg"),
            },
        ])
    }

    #[test]
    fn effective_image_falls_back_to_original() {
        let store = store_with_curtains();
        let key = ItemKey::service("curtains");
        assert_eq!(store.effective_image(&key), Some(ImageRef::from("orig.jpg")));
        assert!(!store.is_overridden(&key));
        assert_eq!(store.effective_image(&ItemKey::service("missing")), None);
    }

    #[test]
    fn override_takes_precedence_and_is_idempotent() {
        let store = store_with_curtains();
        let key = ItemKey::service("curtains");
        store.set_override(key.clone(), ImageRef::from("a.png"), OverlaySource::Upload);
        store.set_override(key.clone(), ImageRef::from("a.png"), OverlaySource::Upload);
        assert_eq!(store.effective_image(&key), Some(ImageRef::from("a.png")));
        assert_eq!(store.overrides().len(), 1);
        // Other items are untouched.
        assert_eq!(
            store.effective_image(&ItemKey::blog("1")),
            Some(ImageRef::from("blog.jpg"))
        );
    }

    #[test]
    fn last_write_wins_across_sources() {
        let store = store_with_curtains();
        let key = ItemKey::service("curtains");
        store.set_override(key.clone(), ImageRef::from("A"), OverlaySource::Generated);
        store.set_override(key.clone(), ImageRef::from("B"), OverlaySource::Upload);
        assert_eq!(store.effective_image(&key), Some(ImageRef::from("B")));
        let entry = store.override_for(&key).expect("entry");
        assert_eq!(entry.source, OverlaySource::Upload);
        assert!(entry.updated_at > 0);
    }

    #[test]
    fn unknown_keys_are_still_stored() {
        let store = store_with_curtains();
        let key = ItemKey::gallery(42);
        store.set_override(key.clone(), ImageRef::from("x.png"), OverlaySource::Upload);
        assert_eq!(store.effective_image(&key), Some(ImageRef::from("x.png")));
    }

    #[test]
    fn observers_see_changes_until_unsubscribed() {
        let store = Arc::new(store_with_curtains());
        let seen: Arc<Mutex<Vec<OverlayChange>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let reader = store.clone();
        let id = store.subscribe(move |change| {
            // Reading back from inside the callback must not deadlock.
            assert_eq!(reader.effective_image(&change.key), Some(change.image.clone()));
            sink.lock().unwrap().push(change.clone());
        });

        let key = ItemKey::service("curtains");
        store.set_override(key.clone(), ImageRef::from("one"), OverlaySource::Upload);
        store.set_override(key.clone(), ImageRef::from("two"), OverlaySource::Generated);
        assert!(store.unsubscribe(id));
        store.set_override(key.clone(), ImageRef::from("three"), OverlaySource::Upload);
        assert!(!store.unsubscribe(id));

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].previous, None);
        assert_eq!(seen[1].previous, Some(ImageRef::from("one")));
        assert_eq!(seen[1].source, OverlaySource::Generated);
    }

    #[test]
    fn items_in_filters_by_section() {
        let store = store_with_curtains();
        assert_eq!(store.items().len(), 2);
        let blog: Vec<_> = store.items_in(Section::Blog).collect();
        assert_eq!(blog.len(), 1);
        assert_eq!(blog[0].title, "Top Trends");
    }
}
