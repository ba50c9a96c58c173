//! Theme state: the current palette plus change subscribers.
//!
//! Shared by handle (`Arc<ThemeStore>`). Every mutation replaces the palette
//! under the lock in one step, then notifies subscribers with the new value
//! after the lock is released.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use rand::seq::SliceRandom;
use rand::Rng;

use crate::color::contrast_text;
use crate::palette::{Palette, PaletteKey};

/// Callback invoked with the palette after each change.
pub type Subscriber = Arc<dyn Fn(&Palette) + Send + Sync>;

/// Handle returned by [`ThemeStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Default)]
pub struct ThemeStore {
    palette: Mutex<Palette>,
    subscribers: Mutex<Vec<(SubscriptionId, Subscriber)>>,
    next_id: AtomicU64,
}

impl ThemeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the current palette.
    pub fn palette(&self) -> Palette {
        self.lock_palette().clone()
    }

    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&Palette) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock_subscribers().push((id, Arc::new(callback)));
        id
    }

    /// Returns `false` if the id was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.lock_subscribers();
        let before = subscribers.len();
        subscribers.retain(|(sid, _)| *sid != id);
        subscribers.len() != before
    }

    /// Replace the palette, falling back to favicon colors when `palette` is empty.
    pub fn set_palette(&self, palette: Palette, favicon_colors: Option<&[String]>) -> Palette {
        let next = match favicon_colors {
            Some(colors) => palette.or_favicon(colors),
            None => palette,
        };
        self.replace(|_| next)
    }

    /// Update one slot. Changing the primary color also recomputes the text color.
    pub fn set_color(&self, key: PaletteKey, color: impl Into<String>) -> Palette {
        let color = color.into();
        self.replace(move |current| {
            let mut next = current.clone();
            if key == PaletteKey::Primary {
                next.text = contrast_text(&color).to_string();
            }
            next.set(key, color);
            next
        })
    }

    /// Redistribute the four values across the four keys.
    pub fn shuffle(&self) -> Palette {
        self.shuffle_with(&mut rand::thread_rng())
    }

    pub fn shuffle_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Palette {
        self.replace(|current| {
            let mut values: Vec<String> =
                current.values().iter().map(|v| v.to_string()).collect();
            values.shuffle(rng);
            Palette::from_candidates(values)
        })
    }

    fn replace<F>(&self, update: F) -> Palette
    where
        F: FnOnce(&Palette) -> Palette,
    {
        let next = {
            let mut palette = self.lock_palette();
            let next = update(&palette);
            *palette = next.clone();
            next
        };
        self.notify(&next);
        next
    }

    fn notify(&self, palette: &Palette) {
        let subscribers: Vec<Subscriber> = self
            .lock_subscribers()
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();
        tracing::debug!(subscribers = subscribers.len(), primary = %palette.primary, "theme changed");
        for callback in subscribers {
            callback(palette);
        }
    }

    fn lock_palette(&self) -> MutexGuard<'_, Palette> {
        self.palette.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_subscribers(&self) -> MutexGuard<'_, Vec<(SubscriptionId, Subscriber)>> {
        self.subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl std::fmt::Debug for ThemeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThemeStore")
            .field("palette", &*self.lock_palette())
            .field("subscribers", &self.lock_subscribers().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::atomic::AtomicUsize;

    fn sample() -> Palette {
        Palette::from_candidates(["#111111", "#222222", "#333333", "#444444"])
    }

    fn sorted(palette: &Palette) -> Vec<String> {
        let mut values: Vec<String> = palette.values().iter().map(|v| v.to_string()).collect();
        values.sort();
        values
    }

    #[test]
    fn test_starts_empty() {
        assert!(ThemeStore::new().palette().is_empty());
    }

    #[test]
    fn test_set_palette_replaces_state() {
        let store = ThemeStore::new();
        store.set_palette(sample(), None);
        assert_eq!(store.palette(), sample());
    }

    #[test]
    fn test_set_palette_uses_favicon_when_empty() {
        let store = ThemeStore::new();
        let favicon = vec!["#102030".to_string(), "#405060".to_string()];
        let palette = store.set_palette(Palette::default(), Some(favicon.as_slice()));
        assert_eq!(palette.primary, "#102030");
        assert_eq!(palette.accent, "#102030");
        assert_eq!(palette.text, "#ffffff");
        assert_eq!(store.palette(), palette);
    }

    #[test]
    fn test_set_color_primary_recomputes_text() {
        let store = ThemeStore::new();
        store.set_palette(sample(), None);

        let palette = store.set_color(PaletteKey::Primary, "#fafafa");
        assert_eq!(palette.primary, "#fafafa");
        assert_eq!(palette.text, "#000000");

        let palette = store.set_color(PaletteKey::Primary, "#050505");
        assert_eq!(palette.text, "#ffffff");
    }

    #[test]
    fn test_set_color_other_key_keeps_text() {
        let store = ThemeStore::new();
        store.set_palette(sample(), None);
        let palette = store.set_color(PaletteKey::Accent, "#abcdef");
        assert_eq!(palette.accent, "#abcdef");
        assert_eq!(palette.text, "#444444");
    }

    #[test]
    fn test_shuffle_preserves_values() {
        let store = ThemeStore::new();
        store.set_palette(sample(), None);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let shuffled = store.shuffle_with(&mut rng);
            assert_eq!(sorted(&shuffled), sorted(&sample()));
        }
    }

    #[test]
    fn test_shuffle_eventually_moves_values() {
        let store = ThemeStore::new();
        store.set_palette(sample(), None);
        let mut rng = StdRng::seed_from_u64(42);
        let moved = (0..50).any(|_| store.shuffle_with(&mut rng) != sample());
        assert!(moved);
    }

    #[test]
    fn test_subscribers_notified_after_each_mutation() {
        let store = ThemeStore::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::new(Mutex::new(Vec::new()));

        let calls_ref = Arc::clone(&calls);
        let seen_ref = Arc::clone(&seen);
        store.subscribe(move |palette| {
            calls_ref.fetch_add(1, Ordering::SeqCst);
            seen_ref.lock().unwrap().push(palette.primary.clone());
        });

        store.set_palette(sample(), None);
        store.set_color(PaletteKey::Primary, "#ff0000");
        store.shuffle();

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        let seen = seen.lock().unwrap();
        assert_eq!(seen[0], "#111111");
        assert_eq!(seen[1], "#ff0000");
    }

    #[test]
    fn test_subscriber_can_read_store() {
        let store = Arc::new(ThemeStore::new());
        let observed = Arc::new(Mutex::new(None));

        let store_ref = Arc::clone(&store);
        let observed_ref = Arc::clone(&observed);
        store.subscribe(move |_| {
            *observed_ref.lock().unwrap() = Some(store_ref.palette());
        });

        store.set_palette(sample(), None);
        assert_eq!(observed.lock().unwrap().clone(), Some(sample()));
    }

    #[test]
    fn test_unsubscribe() {
        let store = ThemeStore::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_ref = Arc::clone(&calls);
        let id = store.subscribe(move |_| {
            calls_ref.fetch_add(1, Ordering::SeqCst);
        });

        assert!(store.unsubscribe(id));
        assert!(!store.unsubscribe(id));
        store.shuffle();
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
