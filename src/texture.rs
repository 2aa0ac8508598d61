//! Texture Module — decoded images and the process-wide texture cache.
//!
//! Texture widgets store only a path. The pixel data lives in a global
//! cache keyed by that path and is shared read-only by every node that
//! references it. Nodes never free a texture; `clear_texture_cache` is the
//! single teardown point.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};

use crate::surface::Canvas;
use crate::types::{rgb, Rect};

/// Pixels with alpha below this are not drawn.
const ALPHA_THRESHOLD: u8 = 128;

/// Decoded image, one encoded color per pixel (`None` = transparent).
#[derive(Debug, Clone, PartialEq)]
pub struct Texture {
    pub width: u32,
    pub height: u32,
    pixels: Vec<Option<u32>>,
}

impl Texture {
    /// Build from tightly packed RGBA8 data.
    pub fn from_rgba(width: u32, height: u32, rgba: &[u8]) -> Result<Self, String> {
        let expected = (width as usize) * (height as usize) * 4;
        if rgba.len() != expected {
            return Err(format!(
                "RGBA data is {} bytes, expected {expected} for {width}x{height}",
                rgba.len()
            ));
        }
        let pixels = rgba
            .chunks_exact(4)
            .map(|px| (px[3] >= ALPHA_THRESHOLD).then(|| rgb(px[0], px[1], px[2])))
            .collect();
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Decode an encoded image (PNG).
    pub fn decode(bytes: &[u8]) -> Result<Self, String> {
        let image = image::load_from_memory(bytes)
            .map_err(|e| format!("Failed to decode image: {e}"))?
            .to_rgba8();
        let (width, height) = image.dimensions();
        Self::from_rgba(width, height, image.as_raw())
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels[(y as usize) * (self.width as usize) + (x as usize)]
    }

    /// Nearest-neighbour scale into `dest`, one pixel per cell.
    pub fn blit(&self, canvas: &mut dyn Canvas, dest: Rect) {
        if dest.is_empty() || self.width == 0 || self.height == 0 {
            return;
        }
        let (dw, dh) = (dest.w as u64, dest.h as u64);
        for dy in 0..dest.h {
            let sy = (dy as u64 * self.height as u64 / dh) as u32;
            for dx in 0..dest.w {
                let sx = (dx as u64 * self.width as u64 / dw) as u32;
                if let Some(color) = self.pixel(sx, sy) {
                    canvas.draw_point(dest.x.saturating_add(dx), dest.y.saturating_add(dy), color);
                }
            }
        }
    }
}

// ============================================================================
// Global Cache
// ============================================================================

static TEXTURES: OnceLock<RwLock<HashMap<String, Arc<Texture>>>> = OnceLock::new();

fn cache_lock() -> &'static RwLock<HashMap<String, Arc<Texture>>> {
    TEXTURES.get_or_init(|| RwLock::new(HashMap::new()))
}

fn lock_poisoned(detail: impl std::fmt::Display) -> String {
    format!("texture cache lock poisoned after panic: {detail}")
}

/// Cached texture for `path`, if it has been loaded.
pub fn get(path: &str) -> Option<Arc<Texture>> {
    cache_lock().read().ok()?.get(path).cloned()
}

/// Put a texture into the cache under `path`, replacing any previous entry.
pub fn insert(path: &str, texture: Texture) -> Result<Arc<Texture>, String> {
    let texture = Arc::new(texture);
    cache_lock()
        .write()
        .map_err(lock_poisoned)?
        .insert(path.to_string(), Arc::clone(&texture));
    Ok(texture)
}

/// Load `path` from disk unless it is already cached.
pub fn load(path: &str) -> Result<Arc<Texture>, String> {
    if let Some(texture) = get(path) {
        return Ok(texture);
    }
    let bytes = std::fs::read(path).map_err(|e| format!("Failed to read texture {path}: {e}"))?;
    let texture = Texture::decode(&bytes).map_err(|e| format!("{path}: {e}"))?;
    log::debug!(
        "texture loaded: {path} ({}x{})",
        texture.width,
        texture.height
    );
    insert(path, texture)
}

/// Drop every cached texture.
pub fn clear_texture_cache() -> Result<(), String> {
    cache_lock().write().map_err(lock_poisoned)?.clear();
    Ok(())
}

pub fn cached_count() -> usize {
    cache_lock().read().map(|c| c.len()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{DrawCall, RecordingCanvas};

    fn checker() -> Texture {
        // 2x2: red, transparent / green, blue
        #[rustfmt::skip]
        let rgba = [
            255, 0, 0, 255,   0, 0, 0, 0,
            0, 255, 0, 255,   0, 0, 255, 255,
        ];
        Texture::from_rgba(2, 2, &rgba).unwrap()
    }

    #[test]
    fn test_from_rgba_validates_length() {
        assert!(Texture::from_rgba(2, 2, &[0; 15]).is_err());
        let t = checker();
        assert_eq!(t.pixel(0, 0), Some(rgb(255, 0, 0)));
        assert_eq!(t.pixel(1, 0), None);
        assert_eq!(t.pixel(2, 0), None);
    }

    #[test]
    fn test_blit_scales_nearest_neighbour() {
        let mut canvas = RecordingCanvas::new(10, 10);
        checker().blit(&mut canvas, Rect::new(1, 1, 4, 4));

        let points: Vec<_> = canvas
            .calls
            .iter()
            .filter_map(|c| match c {
                DrawCall::Point(x, y, color) => Some((*x, *y, *color)),
                _ => None,
            })
            .collect();
        // 16 cells minus the 4 covering the transparent texel
        assert_eq!(points.len(), 12);
        assert!(points.contains(&(1, 1, rgb(255, 0, 0))));
        assert!(points.contains(&(2, 2, rgb(255, 0, 0))));
        assert!(points.contains(&(4, 4, rgb(0, 0, 255))));
        assert!(!points.iter().any(|&(x, y, _)| x == 3 && y == 1));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(Texture::decode(b"not an image").is_err());
    }

    #[test]
    fn test_cache_shares_instances() {
        let path = "memory://texture-cache-test";
        let first = insert(path, checker()).unwrap();
        let again = load(path).unwrap();
        assert!(Arc::ptr_eq(&first, &again));
        assert!(get(path).is_some());
    }

    #[test]
    fn test_load_missing_file_is_error() {
        let err = load("/definitely/not/here.png").unwrap_err();
        assert!(err.contains("Failed to read texture"));
    }
}
