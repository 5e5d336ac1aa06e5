//! Touch gestures → page navigation.
//!
//! [`classify_swipe`] is the whole rule and needs nothing but two points.
//! [`SwipeTracker`] is the thin adapter that turns a raw touch-event
//! sequence into those two points.

use serde::{Deserialize, Serialize};

/// Minimum horizontal travel, in pixels, for a drag to count as a swipe.
pub const SWIPE_THRESHOLD: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Navigation requested by a swipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Swipe {
    /// Leftward drag: show the next page.
    Next,
    /// Rightward drag: show the previous page.
    Prev,
}

/// Classify a drag from `start` to `end`.
///
/// The horizontal displacement must exceed both `threshold` and the vertical
/// displacement. Short or vertical-dominant drags yield `None`.
pub fn classify_swipe(start: Point, end: Point, threshold: f64) -> Option<Swipe> {
    let dx = end.x - start.x;
    let dy = end.y - start.y;
    if dx.abs() > dy.abs() && dx.abs() > threshold {
        if dx > 0.0 {
            Some(Swipe::Prev)
        } else {
            Some(Swipe::Next)
        }
    } else {
        None
    }
}

/// Raw touch events as delivered by the host platform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TouchEvent {
    Start(Point),
    Move(Point),
    End(Point),
    Cancel,
}

/// Remembers where the current touch began and classifies it when it ends.
#[derive(Debug, Clone)]
pub struct SwipeTracker {
    threshold: f64,
    start: Option<Point>,
}

impl Default for SwipeTracker {
    fn default() -> Self {
        Self::new(SWIPE_THRESHOLD)
    }
}

impl SwipeTracker {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            start: None,
        }
    }

    /// Feed one event. Returns a swipe only on `End`, and only if a `Start`
    /// was seen since the last `End`/`Cancel`.
    pub fn feed(&mut self, event: TouchEvent) -> Option<Swipe> {
        match event {
            TouchEvent::Start(p) => {
                self.start = Some(p);
                None
            }
            TouchEvent::Move(_) => None,
            TouchEvent::End(end) => {
                let start = self.start.take()?;
                classify_swipe(start, end, self.threshold)
            }
            TouchEvent::Cancel => {
                self.start = None;
                None
            }
        }
    }

    pub fn is_tracking(&self) -> bool {
        self.start.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn leftward_drag_is_next() {
        assert_eq!(
            classify_swipe(p(100.0, 100.0), p(20.0, 105.0), SWIPE_THRESHOLD),
            Some(Swipe::Next)
        );
    }

    #[test]
    fn rightward_drag_is_prev() {
        assert_eq!(
            classify_swipe(p(100.0, 100.0), p(180.0, 95.0), SWIPE_THRESHOLD),
            Some(Swipe::Prev)
        );
    }

    #[test]
    fn vertical_dominant_drag_is_ignored() {
        assert_eq!(
            classify_swipe(p(100.0, 100.0), p(110.0, 140.0), SWIPE_THRESHOLD),
            None
        );
        // Long, but still more vertical than horizontal.
        assert_eq!(
            classify_swipe(p(100.0, 100.0), p(190.0, 300.0), SWIPE_THRESHOLD),
            None
        );
    }

    #[test]
    fn short_drag_is_ignored() {
        assert_eq!(
            classify_swipe(p(100.0, 100.0), p(150.0, 100.0), SWIPE_THRESHOLD),
            None
        );
        assert_eq!(
            classify_swipe(p(100.0, 100.0), p(49.0, 100.0), SWIPE_THRESHOLD),
            Some(Swipe::Next)
        );
    }

    #[test]
    fn tracker_emits_once_per_touch() {
        let mut t = SwipeTracker::default();
        assert_eq!(t.feed(TouchEvent::Start(p(100.0, 100.0))), None);
        assert!(t.is_tracking());
        assert_eq!(t.feed(TouchEvent::Move(p(60.0, 101.0))), None);
        assert_eq!(t.feed(TouchEvent::End(p(20.0, 105.0))), Some(Swipe::Next));
        assert!(!t.is_tracking());
        // A stray End without a Start does nothing.
        assert_eq!(t.feed(TouchEvent::End(p(200.0, 105.0))), None);
    }

    #[test]
    fn cancel_drops_the_touch() {
        let mut t = SwipeTracker::default();
        t.feed(TouchEvent::Start(p(100.0, 100.0)));
        t.feed(TouchEvent::Cancel);
        assert_eq!(t.feed(TouchEvent::End(p(180.0, 95.0))), None);
    }
}
