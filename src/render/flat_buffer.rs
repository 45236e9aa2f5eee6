//! Off-screen flat-color RGBA buffer with a per-pixel depth buffer.

use std::path::Path;

use crate::error::{HitTestError, RenderError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Rgba(pub [u8; 4]);

impl Rgba {
    pub const RED: Rgba = Rgba([255, 0, 0, 255]);
    pub const BLUE: Rgba = Rgba([0, 0, 255, 255]);
    pub const LIME: Rgba = Rgba([0, 255, 0, 255]);
    pub const BLACK: Rgba = Rgba([0, 0, 0, 255]);
    pub const WHITE: Rgba = Rgba([255, 255, 255, 255]);
    pub const YELLOW: Rgba = Rgba([255, 255, 0, 255]);
    pub const ORANGE: Rgba = Rgba([255, 165, 0, 255]);
    pub const DARK_SLATE_BLUE: Rgba = Rgba([72, 61, 139, 255]);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferSize {
    pub width: u32,
    pub height: u32,
}

impl BufferSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn pixel_count(self) -> usize {
        (self.width as usize).saturating_mul(self.height as usize)
    }

    pub fn rgba_len(self) -> usize {
        self.pixel_count().saturating_mul(4)
    }
}

/// One flat render: RGBA8 pixels plus view depth for each pixel.
#[derive(Debug, Clone)]
pub struct FlatRenderBuffer {
    size: BufferSize,
    rgba: Vec<u8>,
    depth: Vec<f32>,
}

impl FlatRenderBuffer {
    pub fn new(size: BufferSize, background: Rgba) -> Self {
        let mut buffer = Self {
            size,
            rgba: vec![0u8; size.rgba_len()],
            depth: vec![f32::INFINITY; size.pixel_count()],
        };
        buffer.clear(background);
        buffer
    }

    pub fn size(&self) -> BufferSize {
        self.size
    }

    pub fn frame(&self) -> &[u8] {
        &self.rgba
    }

    /// Fills every pixel with `color` and resets the depth buffer.
    pub fn clear(&mut self, color: Rgba) {
        for px in self.rgba.chunks_exact_mut(4) {
            px.copy_from_slice(&color.0);
        }
        self.depth.fill(f32::INFINITY);
    }

    /// Draws a filled disc at constant depth. Nearer pixels win.
    pub fn fill_disc(&mut self, cx: f32, cy: f32, radius: f32, depth: f32, color: Rgba) {
        if !(radius > 0.0) || !cx.is_finite() || !cy.is_finite() || !depth.is_finite() {
            return;
        }
        let width = self.size.width as i64;
        let height = self.size.height as i64;
        let min_x = ((cx - radius).floor() as i64).max(0);
        let max_x = ((cx + radius).ceil() as i64).min(width - 1);
        let min_y = ((cy - radius).floor() as i64).max(0);
        let max_y = ((cy + radius).ceil() as i64).min(height - 1);
        if min_x > max_x || min_y > max_y {
            return;
        }

        let r2 = radius * radius;
        for y in min_y..=max_y {
            let dy = y as f32 + 0.5 - cy;
            for x in min_x..=max_x {
                let dx = x as f32 + 0.5 - cx;
                if dx * dx + dy * dy > r2 {
                    continue;
                }
                let idx = y as usize * self.size.width as usize + x as usize;
                if depth >= self.depth[idx] {
                    continue;
                }
                self.depth[idx] = depth;
                self.rgba[idx * 4..idx * 4 + 4].copy_from_slice(&color.0);
            }
        }
    }

    /// Fills an axis-aligned rectangle at constant depth.
    #[cfg(test)]
    pub fn fill_rect(&mut self, x: u32, y: u32, w: u32, h: u32, depth: f32, color: Rgba) {
        let max_x = x.saturating_add(w).min(self.size.width);
        let max_y = y.saturating_add(h).min(self.size.height);
        for py in y..max_y {
            for px in x..max_x {
                let idx = py as usize * self.size.width as usize + px as usize;
                if depth >= self.depth[idx] {
                    continue;
                }
                self.depth[idx] = depth;
                self.rgba[idx * 4..idx * 4 + 4].copy_from_slice(&color.0);
            }
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        if x >= self.size.width || y >= self.size.height {
            return None;
        }
        let idx = (y as usize * self.size.width as usize + x as usize) * 4;
        let mut px = [0u8; 4];
        px.copy_from_slice(&self.rgba[idx..idx + 4]);
        Some(Rgba(px))
    }

    /// Row-major copy of a rectangle, which must lie inside the buffer.
    pub fn read_rect(&self, x: i64, y: i64, width: u32, height: u32) -> Result<Vec<Rgba>, HitTestError> {
        let inside = x >= 0
            && y >= 0
            && x + width as i64 <= self.size.width as i64
            && y + height as i64 <= self.size.height as i64;
        if !inside {
            return Err(HitTestError::OutOfBounds {
                x,
                y,
                width,
                height,
                buffer_width: self.size.width,
                buffer_height: self.size.height,
            });
        }

        let mut out = Vec::with_capacity(width as usize * height as usize);
        for row in y as usize..y as usize + height as usize {
            let start = (row * self.size.width as usize + x as usize) * 4;
            let end = start + width as usize * 4;
            out.extend(self.rgba[start..end].chunks_exact(4).map(|px| Rgba([px[0], px[1], px[2], px[3]])));
        }
        Ok(out)
    }

    pub fn save_png(&self, path: &Path) -> Result<(), RenderError> {
        let image = image::RgbaImage::from_raw(self.size.width, self.size.height, self.rgba.clone())
            .ok_or(RenderError::SizeMismatch {
                width: self.size.width,
                height: self.size.height,
                len: self.rgba.len(),
            })?;
        image.save_with_format(path, image::ImageFormat::Png)?;
        Ok(())
    }
}
