#![forbid(unsafe_code)]

//! Shared, reference-counted image cache for menu tiles.
//!
//! Many tiles show the same artwork (every button of a page shares its
//! background, the same label appears on several pages). The cache renders
//! each `(content, transform fingerprint)` once and hands out
//! [`ImageHandle`]s to an arena slot that it owns.
//!
//! # Invariants
//!
//! 1. At most one entry exists per [`CacheKey`].
//! 2. Acquiring an existing key never calls the draw callback.
//! 3. An entry is evicted exactly when its reference count drops to zero.
//! 4. Handles are generational: a handle to an evicted slot stays stale even
//!    after the slot is reused.
//!
//! # Failure Modes
//!
//! - Draw callback returns a zero-sized image: stored like any other entry;
//!   [`Image::is_empty`] lets the caller skip the blit.
//! - Releasing a stale handle: [`CacheError::StaleHandle`], nothing changes.

use std::collections::HashMap;
use std::fmt;

/// Identifier of a piece of tile artwork.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentId(pub String);

impl ContentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Affine view transform restricted to scale and translation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub scale_x: f32,
    pub scale_y: f32,
    pub dx: f32,
    pub dy: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Scale fractions are kept to this many steps per unit.
const FINGERPRINT_STEPS: f32 = 1000.0;

impl Transform {
    pub const IDENTITY: Transform = Transform {
        scale_x: 1.0,
        scale_y: 1.0,
        dx: 0.0,
        dy: 0.0,
    };

    pub fn scale(sx: f32, sy: f32) -> Self {
        Self {
            scale_x: sx,
            scale_y: sy,
            ..Self::IDENTITY
        }
    }

    #[must_use]
    pub fn translated(mut self, dx: f32, dy: f32) -> Self {
        self.dx += dx;
        self.dy += dy;
        self
    }

    /// Hashable identity of the parts that affect rasterization.
    ///
    /// Translation is ignored: moving a tile does not require a new raster.
    pub fn fingerprint(&self) -> TransformFingerprint {
        TransformFingerprint {
            scale_x: (self.scale_x * FINGERPRINT_STEPS).round() as i32,
            scale_y: (self.scale_y * FINGERPRINT_STEPS).round() as i32,
        }
    }
}

/// Quantized scale of a [`Transform`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransformFingerprint {
    scale_x: i32,
    scale_y: i32,
}

/// Cache key: content plus the transform it was rendered for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub content: ContentId,
    pub fingerprint: TransformFingerprint,
}

/// A rasterized ARGB image.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Image {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u32>,
}

impl Image {
    /// Image filled with one color.
    pub fn filled(width: u32, height: u32, argb: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![argb; width as usize * height as usize],
        }
    }

    /// Zero-sized image. Drawing it is a no-op.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn bytes_len(&self) -> usize {
        self.pixels.len() * 4
    }
}

/// Handle to a cache slot. Valid until the matching release drops the count to zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageHandle {
    slot: usize,
    generation: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheError {
    /// The handle's entry was already evicted (or never existed).
    StaleHandle,
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StaleHandle => write!(f, "image handle refers to an evicted cache entry"),
        }
    }
}

impl std::error::Error for CacheError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub hits: u64,
    /// Draw callback invocations.
    pub renders: u64,
    pub evictions: u64,
    pub live_entries: usize,
}

#[derive(Debug)]
struct Entry {
    key: CacheKey,
    image: Image,
    refs: u32,
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    entry: Option<Entry>,
}

/// Arena-backed image cache. See module docs.
#[derive(Debug, Default)]
pub struct ImageCache {
    slots: Vec<Slot>,
    free: Vec<usize>,
    index: HashMap<CacheKey, usize>,
    stats: CacheStats,
}

impl ImageCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a handle for `content` rendered at `transform`.
    ///
    /// On a miss `draw` is called once with the transform and its result is
    /// stored with a reference count of 1. On a hit the count is incremented
    /// and the existing handle is returned.
    pub fn acquire<F>(&mut self, content: &ContentId, transform: &Transform, draw: F) -> ImageHandle
    where
        F: FnOnce(&Transform) -> Image,
    {
        let key = CacheKey {
            content: content.clone(),
            fingerprint: transform.fingerprint(),
        };
        if let Some(&slot) = self.index.get(&key) {
            let s = &mut self.slots[slot];
            if let Some(entry) = s.entry.as_mut() {
                entry.refs += 1;
                self.stats.hits += 1;
                return ImageHandle {
                    slot,
                    generation: s.generation,
                };
            }
        }

        let image = draw(transform);
        self.stats.renders += 1;
        if image.is_empty() {
            tracing::debug!(content = %content, "draw produced an empty image");
        }
        let entry = Entry {
            key: key.clone(),
            image,
            refs: 1,
        };
        let slot = match self.free.pop() {
            Some(slot) => {
                self.slots[slot].entry = Some(entry);
                slot
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    entry: Some(entry),
                });
                self.slots.len() - 1
            }
        };
        self.index.insert(key, slot);
        self.stats.live_entries = self.index.len();
        ImageHandle {
            slot,
            generation: self.slots[slot].generation,
        }
    }

    fn entry(&self, handle: ImageHandle) -> Option<&Entry> {
        self.slots
            .get(handle.slot)
            .filter(|s| s.generation == handle.generation)
            .and_then(|s| s.entry.as_ref())
    }

    /// Drop one reference. Returns the remaining count; at zero the entry is evicted.
    pub fn release(&mut self, handle: ImageHandle) -> Result<u32, CacheError> {
        let slot = self
            .slots
            .get_mut(handle.slot)
            .filter(|s| s.generation == handle.generation)
            .ok_or(CacheError::StaleHandle)?;
        let entry = slot.entry.as_mut().ok_or(CacheError::StaleHandle)?;
        entry.refs -= 1;
        let remaining = entry.refs;
        if remaining == 0 {
            if let Some(evicted) = slot.entry.take() {
                self.index.remove(&evicted.key);
                tracing::trace!(content = %evicted.key.content, "image evicted");
            }
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(handle.slot);
            self.stats.evictions += 1;
            self.stats.live_entries = self.index.len();
        }
        Ok(remaining)
    }

    /// The image behind `handle`, or `None` for a stale handle.
    pub fn image(&self, handle: ImageHandle) -> Option<&Image> {
        self.entry(handle).map(|e| &e.image)
    }

    /// Reference count behind `handle`; zero for a stale handle.
    pub fn ref_count(&self, handle: ImageHandle) -> u32 {
        self.entry(handle).map_or(0, |e| e.refs)
    }

    /// Whether an entry exists for `content` at `transform`.
    pub fn contains(&self, content: &ContentId, transform: &Transform) -> bool {
        self.index.contains_key(&CacheKey {
            content: content.clone(),
            fingerprint: transform.fingerprint(),
        })
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn content(id: &str) -> ContentId {
        ContentId::new(id)
    }

    #[test]
    fn second_acquire_hits_without_drawing() {
        let mut cache = ImageCache::new();
        let draws = Cell::new(0);
        let t = Transform::IDENTITY;
        let a = cache.acquire(&content("btn"), &t, |_| {
            draws.set(draws.get() + 1);
            Image::filled(4, 2, 0xff00_00ff)
        });
        let b = cache.acquire(&content("btn"), &t, |_| {
            draws.set(draws.get() + 1);
            Image::empty()
        });
        assert_eq!(a, b);
        assert_eq!(draws.get(), 1);
        assert_eq!(cache.ref_count(a), 2);
        assert_eq!(cache.image(a).unwrap().width, 4);
        assert_eq!(cache.stats().hits, 1);
    }

    #[test]
    fn translation_shares_entry() {
        let mut cache = ImageCache::new();
        let a = cache.acquire(&content("btn"), &Transform::IDENTITY, |_| Image::filled(1, 1, 0));
        let moved = Transform::IDENTITY.translated(40.0, -3.0);
        let b = cache.acquire(&content("btn"), &moved, |_| Image::filled(9, 9, 0));
        assert_eq!(a, b);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn new_scale_renders_separately() {
        let mut cache = ImageCache::new();
        let a = cache.acquire(&content("btn"), &Transform::IDENTITY, |_| Image::filled(1, 1, 0));
        let b = cache.acquire(&content("btn"), &Transform::scale(2.0, 2.0), |t| {
            Image::filled(t.scale_x as u32, t.scale_y as u32, 0)
        });
        assert_ne!(a, b);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.image(b).unwrap().width, 2);
        assert_eq!(cache.stats().renders, 2);
    }

    #[test]
    fn release_to_zero_evicts() {
        let mut cache = ImageCache::new();
        let h = cache.acquire(&content("a"), &Transform::IDENTITY, |_| Image::filled(1, 1, 0));
        cache.acquire(&content("a"), &Transform::IDENTITY, |_| unreachable!());
        assert_eq!(cache.release(h), Ok(1));
        assert!(cache.image(h).is_some());
        assert_eq!(cache.release(h), Ok(0));
        assert!(cache.image(h).is_none());
        assert!(cache.is_empty());
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn stale_handle_after_slot_reuse() {
        let mut cache = ImageCache::new();
        let old = cache.acquire(&content("a"), &Transform::IDENTITY, |_| Image::filled(1, 1, 0));
        cache.release(old).unwrap();
        let new = cache.acquire(&content("b"), &Transform::IDENTITY, |_| Image::filled(2, 2, 0));
        assert_ne!(old, new);
        assert_eq!(cache.release(old), Err(CacheError::StaleHandle));
        assert_eq!(cache.ref_count(new), 1);
    }

    #[test]
    fn empty_draw_is_not_an_error() {
        let mut cache = ImageCache::new();
        let h = cache.acquire(&content("blank"), &Transform::IDENTITY, |_| Image::empty());
        let image = cache.image(h).unwrap();
        assert!(image.is_empty());
        assert_eq!(image.bytes_len(), 0);
    }

    #[test]
    fn fingerprint_quantizes_tiny_differences() {
        let a = Transform::scale(1.0, 1.0).fingerprint();
        let b = Transform::scale(1.000_01, 0.999_99).fingerprint();
        assert_eq!(a, b);
        assert_ne!(a, Transform::scale(1.01, 1.0).fingerprint());
    }
}
