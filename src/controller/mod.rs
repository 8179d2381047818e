//! Drivelink - Drive Controller
//!
//! Glue between a pointer-driven joystick surface and the link session:
//! turns raw pointer positions into clamped knob positions and drive
//! pairs, publishes power readouts for display, and pushes the pair
//! toward the device. Pure input math lives in [`crate::mapper`]; this
//! layer adds the per-gesture state (the boundary latch) and the session
//! plumbing.
//!
//! Drive input while disconnected is deliberately not an error: the
//! surface stays interactive and the pair is simply dropped.

use tokio::sync::mpsc;

use crate::core::{LinkError, Transport};
use crate::mapper::{JoystickConfig, KnobPosition, Point, clamp_to_disk, compute_drive};
use crate::session::{LinkEvent, LinkSession, LinkState};

/// Result of feeding one pointer sample through the controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerOutcome {
    /// Knob position after disk clamping, for rendering.
    pub knob: KnobPosition,
    /// Left track power in [-1, 1].
    pub left: f32,
    /// Right track power in [-1, 1].
    pub right: f32,
    /// True only on the sample that first crossed the boundary circle
    /// since the knob was last inside it (or since the gesture began).
    /// Callers key one haptic pulse off this edge.
    pub boundary_hit: bool,
}

/// Joystick-to-session controller for one drag surface.
pub struct DriveController<T: Transport> {
    session: LinkSession<T>,
    config: JoystickConfig,
    events: mpsc::UnboundedSender<LinkEvent>,
    boundary_latched: bool,
}

impl<T: Transport> DriveController<T> {
    /// Wrap a session with the given surface geometry.
    pub fn new(session: LinkSession<T>, config: JoystickConfig) -> Self {
        let events = session.event_sender();
        Self {
            session,
            config,
            events,
            boundary_latched: false,
        }
    }

    /// Start a connection attempt (see [`LinkSession::connect`]).
    pub fn connect(&self, target: &str) -> Result<(), LinkError> {
        self.session.connect(target)
    }

    /// Tear down the session (see [`LinkSession::disconnect`]).
    pub fn disconnect(&self) {
        self.session.disconnect()
    }

    /// Current session state.
    pub fn state(&self) -> LinkState {
        self.session.state()
    }

    /// The underlying session.
    pub fn session(&self) -> &LinkSession<T> {
        &self.session
    }

    /// Feed the first pointer sample of a gesture.
    pub fn pointer_down(&mut self, raw: Point) -> PointerOutcome {
        self.boundary_latched = false;
        self.pointer_move(raw)
    }

    /// Feed a pointer sample while the gesture is in progress.
    pub fn pointer_move(&mut self, raw: Point) -> PointerOutcome {
        let knob = clamp_to_disk(raw, self.config.center, self.config.max_radius);
        let drive = compute_drive(knob.point, &self.config);

        let boundary_hit = knob.at_boundary && !self.boundary_latched;
        self.boundary_latched = knob.at_boundary;

        self.push(drive.left, drive.right);
        PointerOutcome {
            knob,
            left: drive.left,
            right: drive.right,
            boundary_hit,
        }
    }

    /// End the gesture: stop both tracks and reset the boundary latch.
    pub fn pointer_up(&mut self) {
        self.boundary_latched = false;
        self.push(0.0, 0.0);
    }

    fn push(&self, left: f32, right: f32) {
        let _ = self.events.send(LinkEvent::PowerReadout { left, right });
        match self.session.send(left, right) {
            Ok(()) => {}
            Err(LinkError::NotConnected) => {
                tracing::debug!("drive input dropped, no active session");
            }
            Err(e) => tracing::warn!(error = %e, "drive input dropped"),
        }
    }
}
