//! Translation of winit window events into tracker input.
//!
//! winit has no unified pointer stream, so the app drives the tracker with
//! the legacy family: the mouse as one contact and touches by their ids.
//! Presses are always forwarded. Moves and releases only reach the tracker
//! while it holds a subscription or capture on the [`WinitBinding`].
//! Losing window focus releases every contact still held down.

use groundplane_core::pointer::{MouseInput, TouchPoint, PRIMARY_BUTTON};
use groundplane_core::{
    DeltaMode, InputBinding, InputEvent, InputProtocol, Phase, Pointer, PointerId, Subscription,
    WheelEvent, MOUSE_POINTER_ID,
};
use kurbo::Point;
use std::cell::RefCell;
use std::rc::Rc;
use winit::dpi::PhysicalPosition;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, Touch, TouchPhase, WindowEvent};

#[derive(Debug, Default)]
struct Streams {
    subscriptions: usize,
    captured: Vec<PointerId>,
}

/// Input binding backed by the winit event loop.
///
/// Clones share state, so the translator can see what the tracker holds.
#[derive(Debug, Clone, Default)]
pub struct WinitBinding {
    streams: Rc<RefCell<Streams>>,
}

impl WinitBinding {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether move/end delivery is wanted right now.
    pub fn is_listening(&self) -> bool {
        let streams = self.streams.borrow();
        streams.subscriptions > 0 || !streams.captured.is_empty()
    }

    pub fn is_captured(&self, id: PointerId) -> bool {
        self.streams.borrow().captured.contains(&id)
    }
}

impl InputBinding for WinitBinding {
    fn supports_pointer_events(&self) -> bool {
        false
    }

    fn subscribe(&mut self, protocol: InputProtocol) -> Subscription {
        log::trace!("Subscribed to {:?} move/end events", protocol);
        self.streams.borrow_mut().subscriptions += 1;
        let streams = self.streams.clone();
        Subscription::new(move || {
            let mut streams = streams.borrow_mut();
            streams.subscriptions = streams.subscriptions.saturating_sub(1);
        })
    }

    fn capture(&mut self, id: PointerId) -> Subscription {
        self.streams.borrow_mut().captured.push(id);
        let streams = self.streams.clone();
        Subscription::new(move || {
            let mut streams = streams.borrow_mut();
            if let Some(index) = streams.captured.iter().position(|c| *c == id) {
                streams.captured.remove(index);
            }
        })
    }
}

/// Something the editor should react to.
#[derive(Debug, Clone, PartialEq)]
pub enum Translated {
    Input(InputEvent),
    Wheel(WheelEvent),
    /// The mouse cursor moved, pressed or not.
    Hover(Pointer),
}

/// Turns window events into [`Translated`] items in logical coordinates.
pub struct WinitInput {
    binding: WinitBinding,
    scale_factor: f64,
    /// Unknown until the first `CursorMoved`.
    cursor: Option<Point>,
    primary_down: bool,
    /// Touches in contact, with their last location.
    touches: Vec<(u64, Point)>,
}

impl WinitInput {
    pub fn new(binding: WinitBinding, scale_factor: f64) -> Self {
        Self {
            binding,
            scale_factor,
            cursor: None,
            primary_down: false,
            touches: Vec::new(),
        }
    }

    pub fn set_scale_factor(&mut self, scale_factor: f64) {
        self.scale_factor = scale_factor;
    }

    /// Last known cursor position.
    pub fn cursor(&self) -> Option<Point> {
        self.cursor
    }

    pub fn translate(&mut self, event: &WindowEvent) -> Vec<Translated> {
        match event {
            WindowEvent::CursorMoved { position, .. } => {
                let cursor = self.logical(*position);
                self.cursor = Some(cursor);
                let mut out = Vec::with_capacity(2);
                if self.binding.is_listening() {
                    out.push(Translated::Input(InputEvent::Mouse {
                        phase: Phase::Move,
                        input: mouse_input(cursor, PRIMARY_BUTTON),
                    }));
                }
                out.push(Translated::Hover(Pointer::new(MOUSE_POINTER_ID, cursor, cursor)));
                out
            }
            WindowEvent::MouseInput { state, button, .. } => {
                let Some(cursor) = self.cursor else {
                    log::trace!("Ignoring {:?} {:?}: cursor position unknown", button, state);
                    return Vec::new();
                };
                let phase = match state {
                    ElementState::Pressed => Phase::Start,
                    ElementState::Released => Phase::End,
                };
                let button = button_index(*button);
                if button == PRIMARY_BUTTON {
                    self.primary_down = phase == Phase::Start;
                }
                if phase == Phase::End && !self.binding.is_listening() {
                    return Vec::new();
                }
                vec![Translated::Input(InputEvent::Mouse {
                    phase,
                    input: mouse_input(cursor, button),
                })]
            }
            WindowEvent::Touch(touch) => self.touch(touch).into_iter().collect(),
            WindowEvent::MouseWheel { delta, .. } => {
                vec![Translated::Wheel(wheel_event(*delta, self.scale_factor))]
            }
            WindowEvent::Focused(false) => self.release_all(),
            _ => Vec::new(),
        }
    }

    fn touch(&mut self, touch: &Touch) -> Option<Translated> {
        let phase = touch_phase(touch.phase);
        let position = self.logical(touch.location);
        let tracked = self.touches.iter().position(|(id, _)| *id == touch.id);
        match (phase, tracked) {
            (Phase::Start, None) => self.touches.push((touch.id, position)),
            (Phase::Move, Some(index)) => self.touches[index].1 = position,
            (Phase::End, Some(index)) => {
                self.touches.remove(index);
            }
            _ => {}
        }

        if phase != Phase::Start && !self.binding.is_listening() {
            return None;
        }
        Some(Translated::Input(InputEvent::Touch {
            phase,
            changed: vec![touch_point(touch.id, position)],
        }))
    }

    /// End every held contact, as if it had been released where it was.
    fn release_all(&mut self) -> Vec<Translated> {
        let primary_down = std::mem::take(&mut self.primary_down);
        let touches = std::mem::take(&mut self.touches);
        if !self.binding.is_listening() {
            return Vec::new();
        }

        let mut out = Vec::new();
        if let (true, Some(cursor)) = (primary_down, self.cursor) {
            out.push(Translated::Input(InputEvent::Mouse {
                phase: Phase::End,
                input: mouse_input(cursor, PRIMARY_BUTTON),
            }));
        }
        if !touches.is_empty() {
            out.push(Translated::Input(InputEvent::Touch {
                phase: Phase::End,
                changed: touches.iter().map(|&(id, at)| touch_point(id, at)).collect(),
            }));
        }
        if !out.is_empty() {
            log::debug!("Focus lost, releasing held contacts");
        }
        out
    }

    fn logical(&self, position: PhysicalPosition<f64>) -> Point {
        let logical = position.to_logical::<f64>(self.scale_factor);
        Point::new(logical.x, logical.y)
    }
}

// The window is the whole document, so page and client coincide.
fn mouse_input(at: Point, button: i16) -> MouseInput {
    MouseInput {
        page: at,
        client: at,
        button,
    }
}

fn touch_point(id: u64, at: Point) -> TouchPoint {
    TouchPoint {
        identifier: id as i64,
        page: at,
        client: at,
    }
}

/// DOM button index of a mouse button.
pub fn button_index(button: MouseButton) -> i16 {
    match button {
        MouseButton::Left => 0,
        MouseButton::Middle => 1,
        MouseButton::Right => 2,
        MouseButton::Back => 3,
        MouseButton::Forward => 4,
        MouseButton::Other(n) => i16::try_from(n).unwrap_or(i16::MAX),
    }
}

/// Cancelled touches end like released ones.
pub fn touch_phase(phase: TouchPhase) -> Phase {
    match phase {
        TouchPhase::Started => Phase::Start,
        TouchPhase::Moved => Phase::Move,
        TouchPhase::Ended | TouchPhase::Cancelled => Phase::End,
    }
}

/// Convert a winit scroll delta, where positive means up, to a wheel event
/// where positive `delta_y` scrolls down.
pub fn wheel_event(delta: MouseScrollDelta, scale_factor: f64) -> WheelEvent {
    match delta {
        MouseScrollDelta::LineDelta(x, y) => WheelEvent {
            delta_x: -f64::from(x),
            delta_y: -f64::from(y),
            mode: DeltaMode::Line,
        },
        MouseScrollDelta::PixelDelta(position) => {
            let logical = position.to_logical::<f64>(scale_factor);
            WheelEvent {
                delta_x: -logical.x,
                delta_y: -logical.y,
                mode: DeltaMode::Pixel,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::event::{DeviceId, Force};

    fn device() -> DeviceId {
        // SAFETY: only used to build synthetic events.
        unsafe { DeviceId::dummy() }
    }

    fn cursor_moved(x: f64, y: f64) -> WindowEvent {
        WindowEvent::CursorMoved {
            device_id: device(),
            position: PhysicalPosition::new(x, y),
        }
    }

    fn mouse(state: ElementState, button: MouseButton) -> WindowEvent {
        WindowEvent::MouseInput {
            device_id: device(),
            state,
            button,
        }
    }

    fn touch(phase: TouchPhase, id: u64, x: f64, y: f64) -> WindowEvent {
        WindowEvent::Touch(Touch {
            device_id: device(),
            phase,
            location: PhysicalPosition::new(x, y),
            force: None::<Force>,
            id,
        })
    }

    #[test]
    fn test_button_indices() {
        assert_eq!(button_index(MouseButton::Left), PRIMARY_BUTTON);
        assert_eq!(button_index(MouseButton::Middle), 1);
        assert_eq!(button_index(MouseButton::Right), 2);
        assert_eq!(button_index(MouseButton::Other(9)), 9);
    }

    #[test]
    fn test_cancelled_touch_ends() {
        assert_eq!(touch_phase(TouchPhase::Cancelled), Phase::End);
        assert_eq!(touch_phase(TouchPhase::Started), Phase::Start);
    }

    #[test]
    fn test_wheel_signs_follow_scroll_direction() {
        let line = wheel_event(MouseScrollDelta::LineDelta(0.0, 1.0), 1.0);
        assert_eq!(line.delta_y, -1.0);
        assert_eq!(line.mode, DeltaMode::Line);

        let pixel_delta = MouseScrollDelta::PixelDelta(PhysicalPosition::new(4.0, -8.0));
        let pixel = wheel_event(pixel_delta, 2.0);
        assert_eq!((pixel.delta_x, pixel.delta_y), (-2.0, 4.0));
        assert_eq!(pixel.mode, DeltaMode::Pixel);
    }

    #[test]
    fn test_cursor_uses_logical_coordinates() {
        let mut input = WinitInput::new(WinitBinding::new(), 2.0);
        let out = input.translate(&cursor_moved(100.0, 40.0));

        assert_eq!(input.cursor(), Some(Point::new(50.0, 20.0)));
        assert_eq!(
            out,
            vec![Translated::Hover(Pointer::new(
                MOUSE_POINTER_ID,
                Point::new(50.0, 20.0),
                Point::new(50.0, 20.0)
            ))]
        );
    }

    #[test]
    fn test_press_carries_button_and_cursor() {
        let mut input = WinitInput::new(WinitBinding::new(), 1.0);
        input.translate(&cursor_moved(7.0, 9.0));

        let out = input.translate(&mouse(ElementState::Pressed, MouseButton::Right));
        assert_eq!(
            out,
            vec![Translated::Input(InputEvent::Mouse {
                phase: Phase::Start,
                input: MouseInput {
                    page: Point::new(7.0, 9.0),
                    client: Point::new(7.0, 9.0),
                    button: 2,
                },
            })]
        );
    }

    #[test]
    fn test_press_before_cursor_known_is_dropped() {
        let mut input = WinitInput::new(WinitBinding::new(), 1.0);
        assert_eq!(input.cursor(), None);
        assert!(input.translate(&mouse(ElementState::Pressed, MouseButton::Left)).is_empty());

        input.translate(&cursor_moved(3.0, 4.0));
        assert_eq!(input.translate(&mouse(ElementState::Pressed, MouseButton::Left)).len(), 1);
    }

    #[test]
    fn test_focus_loss_releases_held_contacts() {
        let mut binding = WinitBinding::new();
        let mut input = WinitInput::new(binding.clone(), 1.0);
        input.translate(&cursor_moved(5.0, 6.0));
        input.translate(&mouse(ElementState::Pressed, MouseButton::Left));
        input.translate(&touch(TouchPhase::Started, 8, 1.0, 1.0));
        let subscription = binding.subscribe(InputProtocol::Legacy);
        input.translate(&touch(TouchPhase::Moved, 8, 2.0, 3.0));

        let out = input.translate(&WindowEvent::Focused(false));
        assert_eq!(
            out,
            vec![
                Translated::Input(InputEvent::Mouse {
                    phase: Phase::End,
                    input: MouseInput {
                        page: Point::new(5.0, 6.0),
                        client: Point::new(5.0, 6.0),
                        button: PRIMARY_BUTTON,
                    },
                }),
                Translated::Input(InputEvent::Touch {
                    phase: Phase::End,
                    changed: vec![TouchPoint {
                        identifier: 8,
                        page: Point::new(2.0, 3.0),
                        client: Point::new(2.0, 3.0),
                    }],
                }),
            ]
        );
        // Everything was released once.
        assert!(input.translate(&WindowEvent::Focused(false)).is_empty());
        drop(subscription);
    }

    #[test]
    fn test_focus_loss_without_listener_is_silent() {
        let mut input = WinitInput::new(WinitBinding::new(), 1.0);
        input.translate(&cursor_moved(5.0, 6.0));
        input.translate(&mouse(ElementState::Pressed, MouseButton::Left));

        assert!(input.translate(&WindowEvent::Focused(false)).is_empty());
        assert!(input.translate(&WindowEvent::Focused(true)).is_empty());
    }

    #[test]
    fn test_moves_and_releases_need_a_subscription() {
        let mut binding = WinitBinding::new();
        let mut input = WinitInput::new(binding.clone(), 1.0);

        assert_eq!(input.translate(&cursor_moved(1.0, 1.0)).len(), 1);
        assert!(input.translate(&mouse(ElementState::Released, MouseButton::Left)).is_empty());
        assert!(input.translate(&touch(TouchPhase::Moved, 3, 1.0, 1.0)).is_empty());

        let subscription = binding.subscribe(InputProtocol::Legacy);
        assert!(binding.is_listening());
        assert_eq!(input.translate(&cursor_moved(2.0, 2.0)).len(), 2);
        assert_eq!(input.translate(&mouse(ElementState::Released, MouseButton::Left)).len(), 1);

        drop(subscription);
        assert!(!binding.is_listening());
    }

    #[test]
    fn test_touch_start_always_forwarded() {
        let mut input = WinitInput::new(WinitBinding::new(), 1.0);
        let out = input.translate(&touch(TouchPhase::Started, 42, 10.0, 20.0));
        assert_eq!(
            out,
            vec![Translated::Input(InputEvent::Touch {
                phase: Phase::Start,
                changed: vec![TouchPoint {
                    identifier: 42,
                    page: Point::new(10.0, 20.0),
                    client: Point::new(10.0, 20.0),
                }],
            })]
        );
    }

    #[test]
    fn test_capture_released_on_drop() {
        let mut binding = WinitBinding::new();
        let capture = binding.capture(PointerId(5));
        assert!(binding.is_captured(PointerId(5)));
        assert!(binding.is_listening());

        drop(capture);
        assert!(!binding.is_captured(PointerId(5)));
        assert!(!binding.is_listening());
    }
}
