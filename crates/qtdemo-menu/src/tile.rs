#![forbid(unsafe_code)]

//! Menu tiles: positioned, hit-testable nodes whose raster comes from the
//! shared [`ImageCache`].

use qtdemo_core::property::{expect_bool, expect_f32};
use qtdemo_core::{DispatchTable, ObjectId, PropertyChange, PropertyError, PropertyKind};

use crate::cache::{ContentId, Image, ImageCache, ImageHandle, Transform, TransformFingerprint};

/// One menu button or info panel.
#[derive(Debug, Clone)]
pub struct DemoTile {
    pub id: ObjectId,
    pub content: ContentId,
    pub label: String,
    /// Index of the tile among the buttons of its state.
    pub index: usize,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub opacity: f32,
    pub scale: f32,
    pub visible: bool,
    pub z: f32,
    handle: Option<ImageHandle>,
    fingerprint: Option<TransformFingerprint>,
}

impl DemoTile {
    pub fn new(
        id: ObjectId,
        content: ContentId,
        label: impl Into<String>,
        width: f32,
        height: f32,
    ) -> Self {
        Self {
            id,
            content,
            label: label.into(),
            index: 0,
            x: 0.0,
            y: 0.0,
            width,
            height,
            opacity: 1.0,
            scale: 1.0,
            visible: false,
            z: 0.0,
            handle: None,
            fingerprint: None,
        }
    }

    #[must_use]
    pub fn at(mut self, x: f32, y: f32) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    #[must_use]
    pub fn with_index(mut self, index: usize) -> Self {
        self.index = index;
        self
    }

    /// Make sure the cached raster matches `view`.
    ///
    /// Nothing is rendered until this is called, and nothing is rendered again
    /// while the view's fingerprint is unchanged. When it changes, the old
    /// entry is released and a new one acquired.
    pub fn validate_image<F>(
        &mut self,
        cache: &mut ImageCache,
        view: &Transform,
        draw: F,
    ) -> ImageHandle
    where
        F: FnOnce(&Transform) -> Image,
    {
        let wanted = self.effective_transform(view);
        let fingerprint = wanted.fingerprint();
        if let (Some(handle), Some(current)) = (self.handle, self.fingerprint) {
            if current == fingerprint {
                return handle;
            }
            if let Err(err) = cache.release(handle) {
                tracing::warn!(tile = %self.id, error = %err, "tile held a stale image handle");
            }
        }
        let handle = cache.acquire(&self.content, &wanted, draw);
        self.handle = Some(handle);
        self.fingerprint = Some(fingerprint);
        handle
    }

    /// Give the raster back to the cache.
    pub fn release_image(&mut self, cache: &mut ImageCache) {
        if let Some(handle) = self.handle.take()
            && let Err(err) = cache.release(handle)
        {
            tracing::warn!(tile = %self.id, error = %err, "tile held a stale image handle");
        }
        self.fingerprint = None;
    }

    /// The tile's raster, if one has been validated.
    pub fn image<'c>(&self, cache: &'c ImageCache) -> Option<&'c Image> {
        self.handle.and_then(|h| cache.image(h))
    }

    fn effective_transform(&self, view: &Transform) -> Transform {
        Transform {
            scale_x: view.scale_x * self.scale,
            scale_y: view.scale_y * self.scale,
            dx: view.dx + self.x,
            dy: view.dy + self.y,
        }
    }

    /// Whether `(px, py)` lands on this tile. Hidden or transparent tiles never hit.
    pub fn hit_test(&self, px: f32, py: f32) -> bool {
        if !self.visible || self.opacity <= 0.0 {
            return false;
        }
        let w = self.width * self.scale;
        let h = self.height * self.scale;
        px >= self.x && px < self.x + w && py >= self.y && py < self.y + h
    }

    /// Setter table for every [`PropertyKind`].
    pub fn dispatch_table() -> DispatchTable<DemoTile> {
        DispatchTable::<DemoTile>::new()
            .with(PropertyKind::X, |t, v| {
                t.x = expect_f32(PropertyKind::X, v)?;
                Ok(())
            })
            .with(PropertyKind::Y, |t, v| {
                t.y = expect_f32(PropertyKind::Y, v)?;
                Ok(())
            })
            .with(PropertyKind::Opacity, |t, v| {
                t.opacity = expect_f32(PropertyKind::Opacity, v)?.clamp(0.0, 1.0);
                Ok(())
            })
            .with(PropertyKind::Scale, |t, v| {
                t.scale = expect_f32(PropertyKind::Scale, v)?.max(0.0);
                Ok(())
            })
            .with(PropertyKind::Visible, |t, v| {
                t.visible = expect_bool(PropertyKind::Visible, v)?;
                Ok(())
            })
            .with(PropertyKind::Z, |t, v| {
                t.z = expect_f32(PropertyKind::Z, v)?;
                Ok(())
            })
    }
}

/// Arena of tiles indexed by [`ObjectId`].
#[derive(Debug)]
pub struct TileSet {
    tiles: Vec<DemoTile>,
    table: DispatchTable<DemoTile>,
}

impl Default for TileSet {
    fn default() -> Self {
        Self::new()
    }
}

impl TileSet {
    pub fn new() -> Self {
        Self {
            tiles: Vec::new(),
            table: DemoTile::dispatch_table(),
        }
    }

    /// Insert a tile. Its id must equal its position in the arena.
    pub fn push(&mut self, tile: DemoTile) -> ObjectId {
        let id = ObjectId(self.tiles.len() as u32);
        debug_assert_eq!(tile.id, id);
        self.tiles.push(DemoTile { id, ..tile });
        id
    }

    pub fn get(&self, id: ObjectId) -> Option<&DemoTile> {
        self.tiles.get(id.0 as usize)
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut DemoTile> {
        self.tiles.get_mut(id.0 as usize)
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DemoTile> {
        self.tiles.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut DemoTile> {
        self.tiles.iter_mut()
    }

    /// Route one change through the dispatch table.
    pub fn apply(&mut self, change: PropertyChange) -> Result<(), PropertyError> {
        let tile = self
            .tiles
            .get_mut(change.target.0 as usize)
            .ok_or(PropertyError::UnknownTarget(change.target))?;
        self.table.apply(tile, change.property, change.value)
    }

    /// Top-most visible tile under `(x, y)`.
    pub fn tile_at(&self, x: f32, y: f32) -> Option<&DemoTile> {
        self.tile_at_where(x, y, |_| true)
    }

    /// Top-most tile under `(x, y)` among those `accept` lets through.
    pub fn tile_at_where(
        &self,
        x: f32,
        y: f32,
        accept: impl Fn(&DemoTile) -> bool,
    ) -> Option<&DemoTile> {
        self.tiles
            .iter()
            .filter(|t| t.hit_test(x, y) && accept(t))
            .max_by(|a, b| a.z.total_cmp(&b.z))
    }

    /// Visible tiles in paint order (back to front).
    pub fn visible(&self) -> Vec<&DemoTile> {
        let mut shown: Vec<_> = self.tiles.iter().filter(|t| t.visible).collect();
        shown.sort_by(|a, b| a.z.total_cmp(&b.z));
        shown
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qtdemo_core::Value;

    fn tile(id: u32) -> DemoTile {
        DemoTile::new(ObjectId(id), ContentId::new(format!("t{id}")), "Tile", 100.0, 20.0)
    }

    #[test]
    fn validate_renders_once_per_fingerprint() {
        let mut cache = ImageCache::new();
        let mut t = tile(0);
        let mut draws = 0;
        t.validate_image(&mut cache, &Transform::IDENTITY, |_| {
            draws += 1;
            Image::filled(100, 20, 0)
        });
        t.validate_image(&mut cache, &Transform::IDENTITY.translated(5.0, 5.0), |_| {
            draws += 1;
            Image::filled(100, 20, 0)
        });
        assert_eq!(draws, 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn rescale_swaps_entry() {
        let mut cache = ImageCache::new();
        let mut t = tile(0);
        let old = t.validate_image(&mut cache, &Transform::IDENTITY, |_| Image::filled(1, 1, 0));
        let new = t.validate_image(&mut cache, &Transform::scale(2.0, 2.0), |_| {
            Image::filled(2, 2, 0)
        });
        assert_ne!(old, new);
        assert!(cache.image(old).is_none());
        assert_eq!(t.image(&cache).unwrap().width, 2);
        t.release_image(&mut cache);
        assert!(cache.is_empty());
    }

    #[test]
    fn release_after_eviction_leaves_cache_alone() {
        let mut cache = ImageCache::new();
        let mut t = tile(0);
        let handle = t.validate_image(&mut cache, &Transform::IDENTITY, |_| Image::filled(1, 1, 0));
        cache.release(handle).unwrap();
        assert!(cache.is_empty());

        t.release_image(&mut cache);
        assert!(cache.is_empty());
        assert!(t.image(&cache).is_none());

        t.validate_image(&mut cache, &Transform::IDENTITY, |_| Image::filled(1, 1, 0));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.stats().renders, 2);
    }

    #[test]
    fn hit_test_respects_visibility_and_bounds() {
        let mut t = tile(0).at(10.0, 10.0);
        assert!(!t.hit_test(20.0, 15.0));
        t.visible = true;
        assert!(t.hit_test(20.0, 15.0));
        assert!(!t.hit_test(111.0, 15.0));
        t.opacity = 0.0;
        assert!(!t.hit_test(20.0, 15.0));
    }

    #[test]
    fn tile_set_routes_changes() {
        let mut set = TileSet::new();
        let id = set.push(tile(0));
        set.apply(PropertyChange::float(id, PropertyKind::Opacity, 2.0))
            .unwrap();
        set.apply(PropertyChange::flag(id, PropertyKind::Visible, true))
            .unwrap();
        let t = set.get(id).unwrap();
        assert_eq!(t.opacity, 1.0);
        assert!(t.visible);
    }

    #[test]
    fn unknown_target_is_reported() {
        let mut set = TileSet::new();
        let err = set
            .apply(PropertyChange::float(ObjectId(9), PropertyKind::X, 1.0))
            .unwrap_err();
        assert_eq!(err, PropertyError::UnknownTarget(ObjectId(9)));
    }

    #[test]
    fn tile_at_prefers_highest_z() {
        let mut set = TileSet::new();
        let a = set.push(tile(0));
        let b = set.push(tile(1));
        for id in [a, b] {
            set.apply(PropertyChange::flag(id, PropertyKind::Visible, true))
                .unwrap();
        }
        set.apply(PropertyChange {
            target: b,
            property: PropertyKind::Z,
            value: Value::Float(2.0),
        })
        .unwrap();
        assert_eq!(set.tile_at(5.0, 5.0).unwrap().id, b);
        assert_eq!(set.visible().last().unwrap().id, b);
    }

    #[test]
    fn tile_at_where_skips_rejected_tiles() {
        let mut set = TileSet::new();
        let below = set.push(tile(0));
        let above = set.push(tile(1));
        for id in [below, above] {
            set.apply(PropertyChange::flag(id, PropertyKind::Visible, true))
                .unwrap();
        }
        assert_eq!(set.tile_at(5.0, 5.0).unwrap().id, above);
        assert_eq!(set.tile_at_where(5.0, 5.0, |t| t.id != above).unwrap().id, below);
        assert!(set.tile_at_where(5.0, 5.0, |_| false).is_none());
    }
}
