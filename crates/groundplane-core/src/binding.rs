//! Seam between the pointer tracker and the platform's event source.
//!
//! The tracker never keeps listeners around between gestures: it acquires a
//! [`Subscription`] for the move/end streams when the first contact starts
//! and drops it when the last contact ends. Pointer captures are guards too,
//! held for exactly as long as their contact is tracked.

use crate::pointer::PointerId;
use serde::{Deserialize, Serialize};

/// Family of input events the tracker consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputProtocol {
    /// One unified event stream per contact, with per-contact capture.
    Pointer,
    /// Separate mouse-button and multi-touch streams.
    Legacy,
}

impl InputProtocol {
    /// Pick the protocol family for a platform.
    pub fn detect(supports_pointer_events: bool) -> Self {
        if supports_pointer_events {
            Self::Pointer
        } else {
            Self::Legacy
        }
    }
}

/// Guard for an acquired input resource. Dropping it releases the resource.
#[must_use = "dropping a subscription releases it immediately"]
pub struct Subscription {
    release: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Create a guard that runs `release` when dropped.
    pub fn new(release: impl FnOnce() + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// A guard with nothing to release.
    pub fn noop() -> Self {
        Self { release: None }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.release.is_some())
            .finish()
    }
}

/// Platform event source driven by the tracker.
pub trait InputBinding {
    /// Whether the platform delivers unified pointer events.
    fn supports_pointer_events(&self) -> bool;

    /// Start delivering move/end events of `protocol`, wherever on screen
    /// the contacts go. Delivery stops when the guard drops.
    fn subscribe(&mut self, protocol: InputProtocol) -> Subscription;

    /// Route every event of contact `id` to the tracker until the guard drops.
    fn capture(&mut self, id: PointerId) -> Subscription;
}

/// Binding for hosts that push every event regardless of subscriptions.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullBinding {
    pub pointer_events: bool,
}

impl InputBinding for NullBinding {
    fn supports_pointer_events(&self) -> bool {
        self.pointer_events
    }

    fn subscribe(&mut self, _protocol: InputProtocol) -> Subscription {
        Subscription::noop()
    }

    fn capture(&mut self, _id: PointerId) -> Subscription {
        Subscription::noop()
    }
}
