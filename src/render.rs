//! Rendered page surfaces, the render capability boundary, and caching.
//!
//! PDF decoding is not this crate's business: embedders provide a
//! [`PageRenderer`] that rasterizes "page N at scale S". Rendered surfaces
//! are read-shared between the overlay painters and the region extractor
//! and cached in an LRU keyed by page and scale.

use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;

/// Raw RGB raster of a rendered page (3 bytes per pixel).
#[derive(Clone)]
pub struct RasterSurface {
    pixels: Vec<u8>,
    width: u32,
    height: u32,
}

impl RasterSurface {
    /// Wrap an RGB buffer. Returns `None` when the buffer length does not
    /// match `width * height * 3`.
    #[must_use]
    pub fn from_rgb(pixels: Vec<u8>, width: u32, height: u32) -> Option<Self> {
        if pixels.len() != (width as usize) * (height as usize) * 3 {
            return None;
        }
        Some(Self {
            pixels,
            width,
            height,
        })
    }

    /// A solid-color surface, mostly useful for tests and placeholders.
    #[must_use]
    pub fn solid(width: u32, height: u32, rgb: (u8, u8, u8)) -> Self {
        let mut pixels = Vec::with_capacity((width as usize) * (height as usize) * 3);
        for _ in 0..(width as usize) * (height as usize) {
            pixels.extend_from_slice(&[rgb.0, rgb.1, rgb.2]);
        }
        Self {
            pixels,
            width,
            height,
        }
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[must_use]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// One pixel row as an RGB byte slice.
    #[must_use]
    pub fn row(&self, y: u32) -> &[u8] {
        let stride = self.width as usize * 3;
        let start = y as usize * stride;
        &self.pixels[start..start + stride]
    }
}

impl std::fmt::Debug for RasterSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RasterSurface")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

/// Errors from the render capability.
#[derive(Debug, thiserror::Error)]
pub enum RenderFault {
    #[error("page {page} out of range")]
    PageOutOfRange { page: u32 },

    #[error("render backend: {detail}")]
    Backend { detail: String },
}

impl RenderFault {
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend { detail: msg.into() }
    }
}

/// Capability: rasterize a page at a scale factor.
///
/// Scale 1.0 means one pixel per document unit; the extractor relies on
/// that contract to produce zoom-independent captures.
pub trait PageRenderer: Send {
    fn page_count(&self) -> u32;

    fn render_page(&self, page: u32, scale: f32) -> Result<RasterSurface, RenderFault>;
}

/// Cache key for rendered surfaces
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Page number
    pub page: u32,
    /// Scale factor (stored as millionths for stable hashing)
    pub scale_millionths: u32,
}

impl CacheKey {
    #[must_use]
    pub fn new(page: u32, scale: f32) -> Self {
        Self {
            page,
            scale_millionths: (scale * 1_000_000.0) as u32,
        }
    }
}

/// LRU cache of rendered page surfaces.
pub struct PageCache {
    cache: LruCache<CacheKey, Arc<RasterSurface>>,
}

impl PageCache {
    /// Create a new cache with the given capacity
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            cache: LruCache::new(
                NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::new(1).expect("1 is non-zero")),
            ),
        }
    }

    /// Get a cached surface, promoting it in the LRU order
    #[must_use]
    pub fn get(&mut self, key: &CacheKey) -> Option<Arc<RasterSurface>> {
        self.cache.get(key).cloned()
    }

    /// Check if a key is in the cache without promoting it
    #[must_use]
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.cache.contains(key)
    }

    /// Insert a surface, returning an Arc to the data
    pub fn insert(&mut self, key: CacheKey, surface: RasterSurface) -> Arc<RasterSurface> {
        let arc = Arc::new(surface);
        self.cache.put(key, arc.clone());
        arc
    }

    /// Clear all cached surfaces
    pub fn invalidate_all(&mut self) {
        self.cache.clear();
    }

    /// Invalidate all cached scales of a specific page
    pub fn invalidate_page(&mut self, page: u32) {
        let keys_to_remove: Vec<_> = self
            .cache
            .iter()
            .filter(|(k, _)| k.page == page)
            .map(|(k, _)| k.clone())
            .collect();

        for key in keys_to_remove {
            self.cache.pop(&key);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.cache.cap().get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_rgb_validates_buffer_length() {
        assert!(RasterSurface::from_rgb(vec![0; 12], 2, 2).is_some());
        assert!(RasterSurface::from_rgb(vec![0; 11], 2, 2).is_none());
    }

    #[test]
    fn cache_insert_and_get() {
        let mut cache = PageCache::new(4);
        let key = CacheKey::new(0, 1.0);
        cache.insert(key.clone(), RasterSurface::solid(4, 4, (255, 255, 255)));

        assert!(cache.contains(&key));
        assert!(cache.get(&key).is_some());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn cache_lru_eviction() {
        let mut cache = PageCache::new(2);
        for page in 0..3 {
            cache.insert(
                CacheKey::new(page, 1.0),
                RasterSurface::solid(2, 2, (0, 0, 0)),
            );
        }

        assert_eq!(cache.len(), 2);
        assert!(!cache.contains(&CacheKey::new(0, 1.0)));
        assert!(cache.contains(&CacheKey::new(1, 1.0)));
        assert!(cache.contains(&CacheKey::new(2, 1.0)));
    }

    #[test]
    fn distinct_scales_are_distinct_entries() {
        let mut cache = PageCache::new(4);
        cache.insert(CacheKey::new(0, 1.0), RasterSurface::solid(2, 2, (0, 0, 0)));
        cache.insert(CacheKey::new(0, 1.5), RasterSurface::solid(3, 3, (0, 0, 0)));

        assert_eq!(cache.len(), 2);
        cache.invalidate_page(0);
        assert!(cache.is_empty());
    }
}
