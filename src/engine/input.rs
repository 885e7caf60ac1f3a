//! Input handlers: pointer, keyboard and text edits routed into the
//! parameter store.
//!
//! Every committed edit goes through the handle-edit rules and the
//! normalizer, then schedules a debounced settings write.

use super::Engine;
use crate::interaction::{
    apply_handle_edit, keyboard_target, pick_handle, track_x_to_value, DragSession, NavKey,
    PointerButton, PointerId, PressTarget, TrackGeometry,
};
use crate::param::{Handle, ParamValue};
use crate::plugin::Surface;

impl<S: Surface> Engine<S> {
    /// Press on a parameter control.
    ///
    /// Only the primary button starts a drag. The grabbed handle is either
    /// the one pressed or the one picked from the track position, and the
    /// value under the pointer is applied at once. Returns whether a drag
    /// session was opened.
    pub fn pointer_down(
        &mut self,
        pointer: PointerId,
        key: &str,
        target: PressTarget,
        x: f64,
        track: TrackGeometry,
        button: PointerButton,
    ) -> bool {
        if self.destroyed || button != PointerButton::Primary {
            return false;
        }
        let lookup = (self.registry.definition(key), self.registry.value(key));
        let (Some(def), Some(value)) = lookup else {
            return false;
        };
        let handle = match target {
            PressTarget::Handle(handle) => handle,
            PressTarget::Track => pick_handle(def, value, x, track),
        };
        if !def.accepts_handle(handle) {
            return false;
        }

        let session = DragSession {
            key: key.to_string(),
            handle,
            track,
        };
        if !self.drags.begin(pointer, session) {
            return false;
        }
        if handle == Handle::Current {
            self.modulation.suspend();
        }
        self.drag_to(key, handle, track, x);
        true
    }

    /// Move an open drag. Returns whether the value changed.
    pub fn pointer_move(&mut self, pointer: PointerId, x: f64) -> bool {
        let Some(session) = self.drags.session(pointer).cloned() else {
            return false;
        };
        self.drag_to(&session.key, session.handle, session.track, x)
    }

    /// Release a drag. Returns whether a session was open.
    pub fn pointer_up(&mut self, pointer: PointerId) -> bool {
        self.end_drag(pointer)
    }

    /// Abort a drag. The value keeps whatever the last move wrote.
    pub fn pointer_cancel(&mut self, pointer: PointerId) -> bool {
        self.end_drag(pointer)
    }

    /// Whether any drag is open.
    pub fn is_dragging(&self) -> bool {
        !self.drags.is_empty()
    }

    /// Handle held by `pointer`, if it is dragging.
    pub fn dragged_handle(&self, pointer: PointerId) -> Option<Handle> {
        self.drags.session(pointer).map(|session| session.handle)
    }

    /// Write `value` into one handle of `key`.
    pub fn set_handle_value(&mut self, key: &str, handle: Handle, value: f64) -> bool {
        self.edit_handle(key, handle, value)
    }

    /// Apply a navigation key to one handle of `key`.
    pub fn key_step(&mut self, key: &str, handle: Handle, nav: NavKey) -> bool {
        let Some(def) = self.registry.definition(key) else {
            return false;
        };
        if !def.accepts_handle(handle) {
            return false;
        }
        let Some(value) = self.registry.value(key) else {
            return false;
        };
        let Some(from) = value.handle_value(handle) else {
            return false;
        };
        let target = keyboard_target(def, from, nav);
        self.edit_handle(key, handle, target)
    }

    /// Set the live value of a scalar, or the `current` of a range.
    pub fn set_scalar(&mut self, key: &str, value: f64) -> bool {
        self.edit_handle(key, Handle::Current, value)
    }

    /// Commit the text of a numeric field.
    ///
    /// Text that does not parse to a finite number is rejected and the
    /// stored value stays as it was.
    pub fn commit_scalar_text(&mut self, key: &str, text: &str) -> bool {
        match text.trim().parse::<f64>() {
            Ok(value) if value.is_finite() => self.set_scalar(key, value),
            _ => {
                log::debug!("ignoring non-numeric input for {key}: {text:?}");
                false
            }
        }
    }

    /// Step the modulation speed of `key` circularly. Returns the new
    /// level, or `None` when the parameter cannot be modulated.
    pub fn cycle_modulation_speed(&mut self, key: &str) -> Option<usize> {
        if self.destroyed {
            return None;
        }
        let def = self.registry.definition(key)?;
        let level = self.modulation.cycle_speed(def)?;
        self.persist_later();
        Some(level)
    }

    fn drag_to(&mut self, key: &str, handle: Handle, track: TrackGeometry, x: f64) -> bool {
        let Some(def) = self.registry.definition(key) else {
            return false;
        };
        let raw = track_x_to_value(def, track.local_x(x), track.span());
        self.edit_handle(key, handle, raw)
    }

    fn edit_handle(&mut self, key: &str, handle: Handle, raw: f64) -> bool {
        if self.destroyed {
            return false;
        }
        let lookup = (self.registry.definition(key), self.registry.value(key));
        let (Some(def), Some(value)) = lookup else {
            return false;
        };
        let Some(next) = apply_handle_edit(def, value, handle, raw) else {
            return false;
        };
        self.commit(key, next)
    }

    fn commit(&mut self, key: &str, next: ParamValue) -> bool {
        if self.registry.value(key) == Some(&next) {
            return false;
        }
        if !self.registry.set_value(key, &next) {
            return false;
        }
        self.persist_later();
        true
    }

    fn end_drag(&mut self, pointer: PointerId) -> bool {
        match self.drags.end(pointer) {
            Some(session) => {
                if session.handle == Handle::Current {
                    self.modulation.resume();
                }
                true
            }
            None => false,
        }
    }
}
