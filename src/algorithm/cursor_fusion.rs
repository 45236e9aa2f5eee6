use std::collections::VecDeque;

use crate::models::config::Viewport;

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CursorSample {
    /// Session time in milliseconds.
    pub ts: u64,
    pub x: f64,
    pub y: f64,
}

/// Axis-aligned rectangle the published cursor is confined to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InsetRect {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl InsetRect {
    pub fn new(viewport: Viewport, inset: f64) -> Self {
        Self {
            min_x: inset,
            min_y: inset,
            max_x: (viewport.width as f64 - inset).max(inset),
            max_y: (viewport.height as f64 - inset).max(inset),
        }
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    pub fn clamp(&self, x: f64, y: f64) -> (f64, f64) {
        (x.clamp(self.min_x, self.max_x), y.clamp(self.min_y, self.max_y))
    }
}

/// Result of pushing a raw mouse position through the fence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fenced {
    pub x: f64,
    pub y: f64,
    /// The raw pointer left the inset and should be moved back.
    pub warped: bool,
}

/// Moving-average fusion of raw pointer samples into one screen cursor.
///
/// Samples are kept newest first; once `capacity` is reached the oldest one
/// is evicted. The published cursor is the mean of the window, clamped to
/// the inset rectangle.
#[derive(Debug, Clone)]
pub struct CursorFusion {
    window: VecDeque<CursorSample>,
    capacity: usize,
    bounds: InsetRect,
    published: (f64, f64),
}

impl CursorFusion {
    pub fn new(capacity: usize, viewport: Viewport, inset: f64) -> Self {
        let bounds = InsetRect::new(viewport, inset);
        let capacity = capacity.max(1);
        Self {
            window: VecDeque::with_capacity(capacity),
            capacity,
            bounds,
            published: bounds.clamp(0.0, 0.0),
        }
    }

    pub fn push(&mut self, sample: CursorSample) -> (f64, f64) {
        self.window.push_front(sample);
        while self.window.len() > self.capacity {
            self.window.pop_back();
        }
        self.published = self.bounds.clamp(mean_x(&self.window), mean_y(&self.window));
        self.published
    }

    /// Confines a raw mouse position before it enters the window.
    pub fn fence(&self, x: f64, y: f64) -> Fenced {
        if self.bounds.contains(x, y) {
            return Fenced { x, y, warped: false };
        }
        let (cx, cy) = self.bounds.clamp(x, y);
        Fenced {
            x: cx,
            y: cy,
            warped: true,
        }
    }

    /// Forces the published cursor to a point without touching the window.
    pub fn set_published(&mut self, x: f64, y: f64) {
        self.published = self.bounds.clamp(x, y);
    }

    pub fn cursor(&self) -> (f64, f64) {
        self.published
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    pub fn bounds(&self) -> InsetRect {
        self.bounds
    }

    /// Newest first.
    pub fn samples(&self) -> impl Iterator<Item = &CursorSample> {
        self.window.iter()
    }
}

fn mean_x(window: &VecDeque<CursorSample>) -> f64 {
    if window.is_empty() {
        return 0.0;
    }
    window.iter().map(|sample| sample.x).sum::<f64>() / window.len() as f64
}

fn mean_y(window: &VecDeque<CursorSample>) -> f64 {
    if window.is_empty() {
        return 0.0;
    }
    window.iter().map(|sample| sample.y).sum::<f64>() / window.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fusion() -> CursorFusion {
        CursorFusion::new(8, Viewport::default(), 20.0)
    }

    fn sample(ts: u64, x: f64, y: f64) -> CursorSample {
        CursorSample { ts, x, y }
    }

    #[test]
    fn published_cursor_is_mean_of_partial_window() {
        let mut fusion = fusion();
        fusion.push(sample(0, 100.0, 200.0));
        fusion.push(sample(16, 200.0, 300.0));
        let (x, y) = fusion.push(sample(32, 300.0, 400.0));

        assert_eq!(fusion.len(), 3);
        assert!((x - 200.0).abs() < 1e-9);
        assert!((y - 300.0).abs() < 1e-9);
    }

    #[test]
    fn window_keeps_only_the_last_eight_samples() {
        let mut fusion = fusion();
        for i in 0..20u64 {
            fusion.push(sample(i * 16, 100.0 + i as f64 * 10.0, 300.0));
        }

        assert_eq!(fusion.len(), 8);
        // last eight x values: 220..=290
        let expected = (12..20).map(|i| 100.0 + i as f64 * 10.0).sum::<f64>() / 8.0;
        let (x, _) = fusion.cursor();
        assert!((x - expected).abs() < 1e-9);
        assert_eq!(fusion.samples().next().map(|s| s.ts), Some(19 * 16));
    }

    #[test]
    fn published_cursor_never_leaves_the_inset() {
        let mut fusion = fusion();
        let bounds = fusion.bounds();
        for (x, y) in [(-500.0, -500.0), (5000.0, 10.0), (0.0, 9000.0), (640.0, 360.0)] {
            let (cx, cy) = fusion.push(sample(0, x, y));
            assert!(bounds.contains(cx, cy), "({cx}, {cy}) escaped the inset");
        }
    }

    #[test]
    fn fence_clamps_and_reports_warp() {
        let fusion = fusion();
        let fenced = fusion.fence(5.0, 700.0);
        assert!(fenced.warped);
        assert_eq!((fenced.x, fenced.y), (20.0, 700.0));

        let inside = fusion.fence(640.0, 360.0);
        assert!(!inside.warped);
        assert_eq!((inside.x, inside.y), (640.0, 360.0));
    }

    #[test]
    fn set_published_overrides_without_touching_window() {
        let mut fusion = fusion();
        fusion.push(sample(0, 100.0, 100.0));
        fusion.set_published(640.0, 360.0);
        assert_eq!(fusion.cursor(), (640.0, 360.0));
        assert_eq!(fusion.len(), 1);
    }
}
