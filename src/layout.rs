//! Flipbook sizing from the viewport.
//!
//! [`dimensions`] is a pure function of `(width, height, is_compact)` so the
//! exact same inputs always yield the exact same `f64`s. Everything that
//! knows about the live window lives behind [`ViewportSource`]: a fixed
//! [`Viewport`] for tests and headless use, or a [`WatchViewport`] fed by
//! whatever adapter listens for resize events.

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// Viewports narrower than this use the compact (touch) layout.
pub const COMPACT_BREAKPOINT: f64 = 768.0;

/// Horizontal margin subtracted from the viewport width on compact layouts.
pub const COMPACT_MARGIN: f64 = 32.0;
pub const COMPACT_MAX_WIDTH: f64 = 360.0;
pub const COMPACT_HEIGHT_FRACTION: f64 = 0.65;
pub const COMPACT_MAX_HEIGHT: f64 = 480.0;

pub const WIDE_WIDTH_FRACTION: f64 = 0.6;
pub const WIDE_MAX_WIDTH: f64 = 520.0;
pub const WIDE_HEIGHT_FRACTION: f64 = 0.75;
pub const WIDE_MAX_HEIGHT: f64 = 720.0;

/// Width and height of the page-flip surface, in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: f64,
    pub height: f64,
}

/// Size the flipbook for a viewport.
///
/// Compact: `min(w - 32, 360)` × `min(h * 0.65, 480)`.
/// Wide: `min(w * 0.6, 520)` × `min(h * 0.75, 720)`.
///
/// Unlike the bare formulas, both axes are clamped to zero: a compact
/// viewport narrower than the 32 px margin yields width 0, not a negative
/// width. For every viewport where the formula is non-negative the result
/// is exactly the formula.
pub fn dimensions(viewport_width: f64, viewport_height: f64, is_compact: bool) -> Dimensions {
    let (width, height) = if is_compact {
        (
            (viewport_width - COMPACT_MARGIN).min(COMPACT_MAX_WIDTH),
            (viewport_height * COMPACT_HEIGHT_FRACTION).min(COMPACT_MAX_HEIGHT),
        )
    } else {
        (
            (viewport_width * WIDE_WIDTH_FRACTION).min(WIDE_MAX_WIDTH),
            (viewport_height * WIDE_HEIGHT_FRACTION).min(WIDE_MAX_HEIGHT),
        )
    };
    Dimensions {
        width: width.max(0.0),
        height: height.max(0.0),
    }
}

/// A viewport size in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn is_compact(&self) -> bool {
        self.width < COMPACT_BREAKPOINT
    }

    /// [`dimensions`] for this viewport, using its own compactness.
    pub fn dimensions(&self) -> Dimensions {
        dimensions(self.width, self.height, self.is_compact())
    }
}

/// Anything the renderer can ask for the current viewport size.
pub trait ViewportSource: Send + Sync {
    fn viewport(&self) -> Viewport;
}

impl ViewportSource for Viewport {
    fn viewport(&self) -> Viewport {
        *self
    }
}

/// Receiving half of a resize channel. Always reports the latest size sent.
#[derive(Debug, Clone)]
pub struct WatchViewport {
    rx: watch::Receiver<Viewport>,
}

impl WatchViewport {
    /// Wait until the viewport changes. Returns `None` once the sending side
    /// has been dropped.
    pub async fn changed(&mut self) -> Option<Viewport> {
        self.rx.changed().await.ok()?;
        Some(*self.rx.borrow_and_update())
    }
}

impl ViewportSource for WatchViewport {
    fn viewport(&self) -> Viewport {
        *self.rx.borrow()
    }
}

/// Create a resize channel. The platform adapter keeps the sender and calls
/// `send_replace` on every resize; the renderer side keeps the receiver.
pub fn viewport_channel(initial: Viewport) -> (watch::Sender<Viewport>, WatchViewport) {
    let (tx, rx) = watch::channel(initial);
    (tx, WatchViewport { rx })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compact_phone_viewport() {
        let d = dimensions(390.0, 844.0, true);
        assert_eq!(d.width, 358.0);
        assert_eq!(d.height, 480.0);
    }

    #[test]
    fn compact_width_capped() {
        let d = dimensions(600.0, 500.0, true);
        assert_eq!(d.width, COMPACT_MAX_WIDTH);
        assert_eq!(d.height, 500.0 * COMPACT_HEIGHT_FRACTION);
    }

    #[test]
    fn wide_desktop_viewport() {
        let d = dimensions(1920.0, 1080.0, false);
        assert_eq!(d.width, 520.0);
        assert_eq!(d.height, 720.0);

        let d = dimensions(800.0, 600.0, false);
        assert_eq!(d.width, 800.0 * WIDE_WIDTH_FRACTION);
        assert_eq!(d.height, 450.0);
    }

    #[test]
    fn degenerate_viewport_floors_at_zero() {
        let d = dimensions(10.0, 0.0, true);
        assert_eq!(d.width, 0.0);
        assert_eq!(d.height, 0.0);

        // Raw compact formula would give 20 - 32 = -12.
        assert_eq!(dimensions(20.0, 100.0, true).width, 0.0);
        assert_eq!(dimensions(-50.0, -10.0, false), Dimensions { width: 0.0, height: 0.0 });
    }

    #[test]
    fn clamp_only_applies_below_the_margin() {
        for w in [32.0, 33.0, 200.0, 391.0, 767.0] {
            let d = dimensions(w, 844.0, true);
            assert_eq!(d.width, (w - COMPACT_MARGIN).min(COMPACT_MAX_WIDTH));
        }
    }

    #[test]
    fn deterministic_and_bounded_over_a_grid() {
        for w in (0..=3000).step_by(37) {
            for h in (0..=2000).step_by(41) {
                for compact in [true, false] {
                    let (w, h) = (w as f64, h as f64);
                    let a = dimensions(w, h, compact);
                    let b = dimensions(w, h, compact);
                    assert_eq!(a.width.to_bits(), b.width.to_bits());
                    assert_eq!(a.height.to_bits(), b.height.to_bits());
                    if compact {
                        assert!(a.width <= COMPACT_MAX_WIDTH);
                        assert!(a.width <= (w - COMPACT_MARGIN).max(0.0));
                        assert!(a.height <= COMPACT_MAX_HEIGHT);
                        assert!(a.height <= h * COMPACT_HEIGHT_FRACTION);
                    } else {
                        assert!(a.width <= WIDE_MAX_WIDTH);
                        assert!(a.width <= w * WIDE_WIDTH_FRACTION);
                        assert!(a.height <= WIDE_MAX_HEIGHT);
                        assert!(a.height <= h * WIDE_HEIGHT_FRACTION);
                    }
                }
            }
        }
    }

    #[test]
    fn breakpoint_is_exclusive() {
        assert!(Viewport::new(767.0, 900.0).is_compact());
        assert!(!Viewport::new(768.0, 900.0).is_compact());
    }

    #[tokio::test]
    async fn watch_viewport_follows_resizes() {
        let (tx, mut source) = viewport_channel(Viewport::new(1280.0, 800.0));
        assert!(!source.viewport().is_compact());

        tx.send_replace(Viewport::new(375.0, 667.0));
        let latest = source.changed().await.expect("sender alive");
        assert!(latest.is_compact());
        assert_eq!(source.viewport(), Viewport::new(375.0, 667.0));

        drop(tx);
        assert!(source.changed().await.is_none());
    }
}
