//! Pointer tracking across one input protocol family.
//!
//! [`PointerTracker`] turns raw mouse, touch or unified pointer events into
//! an ordered [`PointerSet`] and reports contact starts, moves and ends to a
//! [`PointerHandler`].
//!
//! # Invariants
//!
//! 1. `start()` and `current()` always have the same length and order.
//! 2. Contacts are ordered by start; removing one keeps the others in order.
//! 3. `on_start` precedes every `on_move`/`on_end` for a contact and
//!    `on_end` is its last callback.
//! 4. Move/end delivery is subscribed while at least one contact is tracked
//!    and released as soon as the last one ends.

use crate::binding::{InputBinding, InputProtocol, Subscription};
use crate::pointer::{MouseInput, Pointer, PointerId, PointerInput, TouchPoint, PRIMARY_BUTTON};

/// Phase of a raw contact event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Press or touch start.
    Start,
    Move,
    /// Release. Platform cancellation must be reported as `End` as well.
    End,
}

/// A raw event from one of the supported protocol families.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    Mouse { phase: Phase, input: MouseInput },
    Touch { phase: Phase, changed: Vec<TouchPoint> },
    Pointer { phase: Phase, input: PointerInput },
}

impl InputEvent {
    /// The protocol family this event belongs to.
    pub fn protocol(&self) -> InputProtocol {
        match self {
            Self::Mouse { .. } | Self::Touch { .. } => InputProtocol::Legacy,
            Self::Pointer { .. } => InputProtocol::Pointer,
        }
    }
}

/// Active contacts, as they were at start and as they are now.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointerSet {
    start: Vec<Pointer>,
    current: Vec<Pointer>,
}

impl PointerSet {
    /// Contacts as they were when pressed, in start order.
    pub fn start(&self) -> &[Pointer] {
        &self.start
    }

    /// Latest state of the contacts, same order as [`start`](Self::start).
    pub fn current(&self) -> &[Pointer] {
        &self.current
    }

    pub fn len(&self) -> usize {
        self.current.len()
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_empty()
    }

    /// Index of a tracked contact.
    pub fn position(&self, id: PointerId) -> Option<usize> {
        self.current.iter().position(|p| p.id == id)
    }

    /// The first contact still pressed, if any.
    pub fn primary(&self) -> Option<&Pointer> {
        self.current.first()
    }

    fn push(&mut self, pointer: Pointer) {
        self.start.push(pointer);
        self.current.push(pointer);
    }

    fn remove(&mut self, index: usize) {
        self.start.remove(index);
        self.current.remove(index);
    }
}

/// Receives contact lifecycle callbacks from a [`PointerTracker`].
///
/// `pointers` is the tracker's set at the time of the call: before insertion
/// for `on_start`, after the update for `on_move`, after removal for `on_end`.
pub trait PointerHandler {
    /// A new contact was pressed. Return `false` to leave it untracked.
    fn on_start(
        &mut self,
        _pointer: &Pointer,
        _pointers: &PointerSet,
        _event: &InputEvent,
    ) -> bool {
        true
    }

    /// One or more tracked contacts moved. `previous` is the current set
    /// as it was before this event.
    fn on_move(&mut self, _previous: &[Pointer], _pointers: &PointerSet, _event: &InputEvent) {}

    /// A tracked contact was released.
    fn on_end(&mut self, _pointer: &Pointer, _pointers: &PointerSet, _event: &InputEvent) {}
}

/// Tracks concurrently active contacts for one protocol family.
pub struct PointerTracker {
    protocol: InputProtocol,
    binding: Box<dyn InputBinding>,
    pointers: PointerSet,
    /// One capture guard per tracked contact, same order as `pointers`.
    captures: Vec<Subscription>,
    /// Move/end delivery, held while any contact is tracked.
    streams: Option<Subscription>,
}

impl PointerTracker {
    /// Create a tracker, choosing the protocol family from the binding's
    /// capabilities. The choice is fixed for the tracker's lifetime.
    pub fn new(binding: Box<dyn InputBinding>) -> Self {
        let protocol = InputProtocol::detect(binding.supports_pointer_events());
        log::debug!("Pointer tracker using {:?} protocol", protocol);
        Self {
            protocol,
            binding,
            pointers: PointerSet::default(),
            captures: Vec::new(),
            streams: None,
        }
    }

    pub fn protocol(&self) -> InputProtocol {
        self.protocol
    }

    pub fn pointers(&self) -> &PointerSet {
        &self.pointers
    }

    /// Whether move/end delivery is currently subscribed.
    pub fn is_listening(&self) -> bool {
        self.streams.is_some()
    }

    /// Process one raw event.
    pub fn handle<H: PointerHandler + ?Sized>(&mut self, event: &InputEvent, handler: &mut H) {
        if event.protocol() != self.protocol {
            log::trace!("Ignoring {:?} event under {:?} protocol", event.protocol(), self.protocol);
            return;
        }

        match event {
            InputEvent::Mouse { phase, input } => {
                let pointer = Pointer::from(input);
                match phase {
                    Phase::Start => {
                        if input.button != PRIMARY_BUTTON {
                            log::trace!("Ignoring mouse button {}", input.button);
                            return;
                        }
                        self.start(pointer, event, handler);
                    }
                    Phase::Move => self.moved(&[pointer], event, handler),
                    // Releasing another button while the primary is held
                    // does not end the contact, as with unified pointers.
                    Phase::End if input.button != PRIMARY_BUTTON => {
                        log::trace!("Ignoring release of mouse button {}", input.button);
                    }
                    Phase::End => {
                        self.end(pointer, event, handler);
                    }
                }
            }
            InputEvent::Pointer { phase, input } => {
                let pointer = Pointer::from(input);
                match phase {
                    Phase::Start => {
                        if input.button != PRIMARY_BUTTON {
                            log::trace!("Ignoring pointer {} button {}", pointer.id, input.button);
                            return;
                        }
                        self.start(pointer, event, handler);
                    }
                    Phase::Move => self.moved(&Pointer::coalesced(input), event, handler),
                    Phase::End => {
                        self.end(pointer, event, handler);
                    }
                }
            }
            InputEvent::Touch { phase, changed } => match phase {
                Phase::Start => {
                    for touch in changed {
                        self.start(Pointer::from(touch), event, handler);
                    }
                }
                Phase::Move => {
                    let pointers: Vec<Pointer> = changed.iter().map(Pointer::from).collect();
                    self.moved(&pointers, event, handler);
                }
                Phase::End => {
                    for touch in changed {
                        self.end(Pointer::from(touch), event, handler);
                    }
                }
            },
        }
    }

    fn start<H: PointerHandler + ?Sized>(
        &mut self,
        pointer: Pointer,
        event: &InputEvent,
        handler: &mut H,
    ) -> bool {
        // A second press for an identity we already track would break uniqueness.
        if self.pointers.position(pointer.id).is_some() {
            log::trace!("Pointer {} already tracked", pointer.id);
            return false;
        }
        if !handler.on_start(&pointer, &self.pointers, event) {
            log::trace!("Pointer {} rejected", pointer.id);
            return false;
        }

        self.pointers.push(pointer);
        let capture = match event {
            InputEvent::Pointer { .. } => self.binding.capture(pointer.id),
            _ => Subscription::noop(),
        };
        self.captures.push(capture);
        if self.streams.is_none() {
            self.streams = Some(self.binding.subscribe(self.protocol));
        }
        true
    }

    fn moved<H: PointerHandler + ?Sized>(
        &mut self,
        changed: &[Pointer],
        event: &InputEvent,
        handler: &mut H,
    ) {
        let mut previous: Option<Vec<Pointer>> = None;
        for pointer in changed {
            let Some(index) = self.pointers.position(pointer.id) else {
                continue;
            };
            previous.get_or_insert_with(|| self.pointers.current.clone());
            self.pointers.current[index] = *pointer;
        }

        if let Some(previous) = previous {
            handler.on_move(&previous, &self.pointers, event);
        }
    }

    fn end<H: PointerHandler + ?Sized>(
        &mut self,
        pointer: Pointer,
        event: &InputEvent,
        handler: &mut H,
    ) -> bool {
        let Some(index) = self.pointers.position(pointer.id) else {
            log::trace!("Pointer {} not tracked", pointer.id);
            return false;
        };

        self.pointers.remove(index);
        drop(self.captures.remove(index));
        if self.pointers.is_empty() {
            self.streams = None;
        }

        handler.on_end(&pointer, &self.pointers, event);
        true
    }
}
