//! Ring physics controller.
//!
//! Drives the ring toward a glyph with a spring-like motion: constant
//! acceleration up to a speed cap, friction inside the approach window, then a
//! damped cosine overshoot that settles exactly on the target.
//!
//! Like [`crate::GateProtocol`], the controller never reads a clock. The host
//! calls [`RingController::tick`] once per display refresh with the current
//! instant; elapsed time is clamped and integrated in bounded sub-steps so a
//! long pause (backgrounded host, debugger) cannot blow up the integration.

use std::{
    f64::consts::TAU,
    future::Future,
    pin::Pin,
    task::{Context, Poll},
    time::{Duration, Instant as StdInstant},
};

use tokio::sync::oneshot;

use crate::{
    clock::Instant,
    dial::{GLYPH_COUNT, GlyphId},
    error::RingError,
};

/// Angular distance between adjacent glyphs, in degrees.
pub const DEGREES_PER_GLYPH: f64 = 360.0 / GLYPH_COUNT as f64;

/// Physics constants.
///
/// Angles in degrees, speeds in degrees per second.
#[derive(Debug, Clone)]
pub struct RingConfig {
    /// Speed cap
    pub max_velocity: f64,
    /// Acceleration toward the target (degrees/s²)
    pub acceleration: f64,
    /// Velocity multiplier per step inside the approach window
    pub friction: f64,
    /// Remaining distance below which the ring starts settling
    pub lock_threshold: f64,
    /// Distance at which friction kicks in
    pub approach_window: f64,
    /// Minimum speed for a target pass to trigger overshoot
    pub overshoot_trigger_speed: f64,
    /// Overshoot amplitude per unit of speed at entry
    pub overshoot_gain: f64,
    /// Exponential decay rate of the overshoot (1/s)
    pub overshoot_decay: f64,
    /// Oscillation frequency of the overshoot (Hz)
    pub overshoot_frequency: f64,
    /// Decay factor below which the ring snaps to the target
    pub settle_ratio: f64,
    /// Shortest-path moves smaller than this get an extra full turn
    pub flourish_threshold: f64,
    /// Longest single integration step (seconds)
    pub max_step: f64,
    /// Longest frame delta integrated at once; the rest is dropped
    pub max_frame_delta: Duration,
}

impl Default for RingConfig {
    fn default() -> Self {
        Self {
            max_velocity: 180.0,
            acceleration: 300.0,
            friction: 0.95,
            lock_threshold: 0.5,
            approach_window: 45.0,
            overshoot_trigger_speed: 10.0,
            overshoot_gain: 0.02,
            overshoot_decay: 5.0,
            overshoot_frequency: 3.0,
            settle_ratio: 0.01,
            flourish_threshold: 90.0,
            max_step: 1.0 / 60.0,
            max_frame_delta: Duration::from_millis(250),
        }
    }
}

/// Forced spin direction for [`RingController::rotate_to_glyph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Decreasing angle.
    Clockwise,
    /// Increasing angle.
    CounterClockwise,
}

/// How a rotation request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrivalOutcome {
    /// Ring settled on the target.
    Arrived,
    /// [`RingController::stop`] interrupted the spin.
    Stopped,
    /// A newer rotation request replaced this one, or the controller was
    /// dropped.
    Superseded,
}

/// Completion handle for one rotation request.
///
/// Resolves exactly once. Poll it with [`Arrival::try_outcome`] from a frame
/// loop, or `.await` it.
#[derive(Debug)]
pub struct Arrival {
    rx: oneshot::Receiver<ArrivalOutcome>,
}

impl Arrival {
    /// Outcome if the rotation has finished, `None` while it is in flight.
    ///
    /// Call until it returns `Some`, then discard the handle.
    pub fn try_outcome(&mut self) -> Option<ArrivalOutcome> {
        match self.rx.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => Some(ArrivalOutcome::Superseded),
        }
    }
}

impl Future for Arrival {
    type Output = ArrivalOutcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|result| result.unwrap_or(ArrivalOutcome::Superseded))
    }
}

/// Rendering target for the ring.
///
/// Injected at construction; the controller pushes every angle change and
/// spin start/stop to it.
pub trait RingSurface {
    /// Ring rotation changed (degrees, unbounded).
    fn rotation_changed(&mut self, degrees: f64);

    /// Ring started or stopped spinning.
    fn spinning_changed(&mut self, spinning: bool);
}

impl RingSurface for () {
    fn rotation_changed(&mut self, _degrees: f64) {}

    fn spinning_changed(&mut self, _spinning: bool) {}
}

#[derive(Debug, Clone, Copy)]
struct Overshoot {
    amplitude: f64,
    elapsed: f64,
}

/// Ring physics controller.
///
/// Long-lived: one per gate, reset between attempts. At most one rotation is
/// pending at a time.
#[derive(Debug)]
pub struct RingController<S = (), I = StdInstant>
where
    S: RingSurface,
    I: Instant,
{
    surface: S,
    config: RingConfig,
    /// Current angle, unbounded
    angle: f64,
    /// Target angle, unbounded
    target: f64,
    velocity: f64,
    spinning: bool,
    overshoot: Option<Overshoot>,
    /// Pending arrival continuation
    waiter: Option<oneshot::Sender<ArrivalOutcome>>,
    /// Frame loop registered
    running: bool,
    last_frame: Option<I>,
}

impl<S: RingSurface, I: Instant> RingController<S, I> {
    /// Create a controller at angle 0 with default physics.
    pub fn new(surface: S) -> Self {
        Self::with_config(surface, RingConfig::default())
    }

    /// Create a controller at angle 0.
    pub fn with_config(surface: S, config: RingConfig) -> Self {
        Self {
            surface,
            config,
            angle: 0.0,
            target: 0.0,
            velocity: 0.0,
            spinning: false,
            overshoot: None,
            waiter: None,
            running: false,
            last_frame: None,
        }
    }

    /// Start spinning toward `glyph`.
    ///
    /// Without a direction the ring takes the shortest path, adding a full
    /// extra turn when that path is shorter than the flourish threshold. With
    /// a direction it always makes a full turn that way.
    ///
    /// A pending request is superseded.
    ///
    /// # Errors
    ///
    /// - `RingError::GlyphOutOfRange` if `glyph` is not on the ring.
    /// - `RingError::NonFiniteAngle` if the controller's angle is corrupt.
    pub fn rotate_to_glyph(
        &mut self,
        glyph: GlyphId,
        direction: Option<Direction>,
    ) -> Result<Arrival, RingError> {
        if glyph >= GLYPH_COUNT {
            return Err(RingError::GlyphOutOfRange(glyph));
        }
        if !self.angle.is_finite() {
            return Err(RingError::NonFiniteAngle(self.angle));
        }

        let glyph_angle = -(f64::from(glyph) * DEGREES_PER_GLYPH);
        self.target = match direction {
            Some(Direction::Clockwise) => glyph_angle - 360.0,
            Some(Direction::CounterClockwise) => glyph_angle + 360.0,
            None => {
                let delta = shortest_delta(self.angle, glyph_angle);
                if delta.abs() < self.config.flourish_threshold {
                    let turn = if delta > 0.0 { 360.0 } else { -360.0 };
                    self.angle + turn + delta
                } else {
                    self.angle + delta
                }
            },
        };

        tracing::trace!(glyph, from = self.angle, to = self.target, "rotate");

        self.overshoot = None;
        self.set_spinning(true);

        let (tx, rx) = oneshot::channel();
        if let Some(previous) = self.waiter.replace(tx) {
            let _ = previous.send(ArrivalOutcome::Superseded);
        }

        if !self.running {
            self.running = true;
            self.last_frame = None;
        }

        Ok(Arrival { rx })
    }

    /// Frame callback. Integrates the time elapsed since the previous frame.
    ///
    /// The first frame after the loop starts only records `now`.
    pub fn tick(&mut self, now: I) {
        if !self.running {
            return;
        }

        let elapsed = match self.last_frame {
            Some(previous) if now > previous => now - previous,
            _ => Duration::ZERO,
        };
        self.last_frame = Some(now);
        self.advance(elapsed);
    }

    /// Integrate `elapsed` of motion.
    ///
    /// Clamped to the maximum frame delta, split into equal sub-steps no
    /// longer than the maximum step.
    pub fn advance(&mut self, elapsed: Duration) {
        if !self.running || !self.spinning {
            return;
        }

        let total = elapsed.min(self.config.max_frame_delta).as_secs_f64();
        if total <= 0.0 {
            return;
        }

        let steps = (total / self.config.max_step).ceil().max(1.0) as u32;
        let dt = total / f64::from(steps);

        for _ in 0..steps {
            if !self.spinning {
                break;
            }
            self.step(dt);
        }

        self.surface.rotation_changed(self.angle);
    }

    /// Stop spinning where the ring is. The pending request resolves
    /// [`ArrivalOutcome::Stopped`].
    pub fn stop(&mut self) {
        if let Some(waiter) = self.waiter.take() {
            let _ = waiter.send(ArrivalOutcome::Stopped);
        }
        self.velocity = 0.0;
        self.overshoot = None;
        self.set_spinning(false);
    }

    /// Return to angle 0 at rest.
    ///
    /// A pending request is left pending; call [`Self::stop`] first to
    /// release it.
    pub fn reset(&mut self) {
        self.angle = 0.0;
        self.target = 0.0;
        self.velocity = 0.0;
        self.overshoot = None;
        self.set_spinning(false);
        self.surface.rotation_changed(self.angle);
    }

    /// Unregister the frame loop. [`Self::tick`] is a no-op until the next
    /// rotation request.
    pub fn destroy(&mut self) {
        self.running = false;
        self.last_frame = None;
    }

    /// Glyph under the top marker.
    pub fn current_glyph_index(&self) -> GlyphId {
        let position = (-self.angle / DEGREES_PER_GLYPH).round();
        position.rem_euclid(f64::from(GLYPH_COUNT)) as GlyphId
    }

    /// Current angle in degrees.
    pub fn angle(&self) -> f64 {
        self.angle
    }

    /// Target angle in degrees.
    pub fn target_angle(&self) -> f64 {
        self.target
    }

    /// Angular velocity in degrees per second.
    pub fn velocity(&self) -> f64 {
        self.velocity
    }

    /// Ring is moving toward (or settling on) a target.
    pub fn is_spinning(&self) -> bool {
        self.spinning
    }

    /// Ring is in the damped oscillation phase.
    pub fn is_overshooting(&self) -> bool {
        self.overshoot.is_some()
    }

    /// Frame loop is registered.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// A rotation request is waiting for arrival.
    pub fn has_pending_arrival(&self) -> bool {
        self.waiter.is_some()
    }

    /// Rendering surface.
    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Rendering surface, mutably.
    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    fn step(&mut self, dt: f64) {
        if let Some(overshoot) = &mut self.overshoot {
            overshoot.elapsed += dt;
            let t = overshoot.elapsed;
            let decay = (-self.config.overshoot_decay * t).exp();
            self.angle = self.target
                + overshoot.amplitude * decay * (TAU * self.config.overshoot_frequency * t).cos();

            if decay < self.config.settle_ratio {
                self.arrive();
            }
            return;
        }

        let remaining = self.target - self.angle;
        if remaining.abs() <= self.config.lock_threshold {
            self.begin_overshoot();
            return;
        }

        let sign = remaining.signum();
        self.velocity = (self.velocity + self.config.acceleration * sign * dt)
            .clamp(-self.config.max_velocity, self.config.max_velocity);
        if remaining.abs() < self.config.approach_window {
            self.velocity *= self.config.friction;
        }
        self.angle += self.velocity * dt;

        let passed = (self.target - self.angle).signum() != sign;
        if passed && self.velocity.abs() > self.config.overshoot_trigger_speed {
            self.begin_overshoot();
        }
    }

    fn begin_overshoot(&mut self) {
        self.overshoot = Some(Overshoot {
            amplitude: self.velocity.abs() * self.config.overshoot_gain,
            elapsed: 0.0,
        });
    }

    /// Snap to the target and resolve the pending request.
    fn arrive(&mut self) {
        self.velocity = 0.0;
        self.overshoot = None;
        self.angle = self.target % 360.0;
        self.set_spinning(false);

        tracing::trace!(angle = self.angle, glyph = self.current_glyph_index(), "ring arrived");

        if let Some(waiter) = self.waiter.take() {
            let _ = waiter.send(ArrivalOutcome::Arrived);
        }
    }

    fn set_spinning(&mut self, spinning: bool) {
        if self.spinning != spinning {
            self.spinning = spinning;
            self.surface.spinning_changed(spinning);
        }
    }
}

/// Signed shortest rotation from `from` to `to`, in `(-180, 180]`.
fn shortest_delta(from: f64, to: f64) -> f64 {
    let delta = ((to - from) % 360.0 + 540.0) % 360.0 - 180.0;
    if delta <= -180.0 { delta + 360.0 } else { delta }
}
