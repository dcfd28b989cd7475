//! Scroll position observer
//!
//! Leading-edge rate limiter over caller-supplied monotonic instants: the
//! first event fires, later events inside the interval are coalesced away.
//! Only events that fire look at the distance to the bottom.

use std::time::{Duration, Instant};

/// Viewport position reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollMetrics {
    /// Bottom edge of the viewport, in pixels from the top of the document
    pub viewport_bottom: u32,
    /// Total document height in pixels
    pub document_height: u32,
}

impl ScrollMetrics {
    /// Pixels left below the viewport
    pub fn distance_to_bottom(&self) -> u32 {
        self.document_height.saturating_sub(self.viewport_bottom)
    }
}

/// What a scroll event amounts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollSignal {
    /// Coalesced into an earlier event
    Throttled,
    /// Fired, but the bottom is still far away
    FarFromBottom,
    /// Fired close to the bottom: a page load should be requested
    NearBottom,
}

/// Rate-limited scroll observer.
#[derive(Debug, Clone)]
pub struct ScrollObserver {
    interval: Duration,
    threshold: u32,
    last_fired: Option<Instant>,
}

impl ScrollObserver {
    /// Create an observer firing at most once per `interval` and requesting a
    /// load below `threshold` pixels from the bottom
    pub fn new(interval: Duration, threshold: u32) -> Self {
        Self {
            interval,
            threshold,
            last_fired: None,
        }
    }

    /// Change spacing and threshold
    pub fn configure(&mut self, interval: Duration, threshold: u32) {
        self.interval = interval;
        self.threshold = threshold;
    }

    /// Classify one scroll event
    pub fn observe(&mut self, now: Instant, metrics: ScrollMetrics) -> ScrollSignal {
        if let Some(last) = self.last_fired {
            if now.saturating_duration_since(last) < self.interval {
                return ScrollSignal::Throttled;
            }
        }
        self.last_fired = Some(now);

        if metrics.distance_to_bottom() < self.threshold {
            ScrollSignal::NearBottom
        } else {
            ScrollSignal::FarFromBottom
        }
    }
}
