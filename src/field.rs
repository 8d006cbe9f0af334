//! Scalar fields sampled by the polygonizer.
//!
//! The polygonizer only needs the [`ScalarField`] contract: the balls (for the
//! bounding cube), their shared radius, and a way to evaluate `F`. The surface
//! is the zero level-set of `F`, with `F > 0` inside.
//!
//! [`MetaballField`] is the field used by the plugin: every ball contributes
//! `r² / |p - c|²` and the sum is shifted by `-1`, so an isolated ball has its
//! surface exactly at distance `r` from its centre.

use crate::types::{Point, Value, Vector};

/// Squared distances below this are clamped so `F` stays finite at ball centres.
const MIN_DISTANCE_SQUARED: Value = 1e-6;

/// Default simulation step of [`MetaballField::update`], in seconds.
pub const DEFAULT_TIME_STEP: Value = 1. / 60.;

/// A field source, moving around `anchor` along a per-axis sine.
#[derive(Debug, Clone, PartialEq)]
pub struct Ball {
    /// Current position, advanced by [`ScalarField::update`].
    pub position: Point,
    pub anchor: Point,
    /// Per-axis amplitude of the motion.
    pub amplitude: Vector,
    /// Angular frequency in radians per second.
    pub frequency: Value,
    pub phase: Value,
}

impl Ball {
    /// A ball that never moves.
    pub fn stationary(position: Point) -> Self {
        Self {
            position,
            anchor: position,
            amplitude: Vector::zeros(),
            frequency: 0.,
            phase: 0.,
        }
    }

    /// A ball oscillating around `anchor`.
    ///
    /// The position starts at the phase-0 sample of the motion.
    pub fn oscillating(anchor: Point, amplitude: Vector, frequency: Value, phase: Value) -> Self {
        let mut ball = Self {
            position: anchor,
            anchor,
            amplitude,
            frequency,
            phase,
        };
        ball.move_to(0.);
        ball
    }

    /// Places the ball where its motion puts it at `time`.
    pub fn move_to(&mut self, time: Value) {
        let s = (self.frequency * time + self.phase).sin();
        self.position = self.anchor + self.amplitude * s;
    }
}

/// The field collaborator used by a polygonize pass.
///
/// A pass only borrows the field immutably; [`update`](ScalarField::update)
/// needs `&mut self` and must run before the pass, never during it.
pub trait ScalarField: Sync {
    /// The field sources. Must be non-empty for the field to be polygonized.
    fn balls(&self) -> &[Ball];

    /// Radius shared by every ball.
    fn ball_radius(&self) -> Value;

    /// Signed field value at `point`; positive inside the surface.
    fn evaluate(&self, point: &Point) -> Value;

    /// Advances ball motion by one frame.
    fn update(&mut self) {}
}

/// Sum of inverse-square metaball influences.
///
/// ```text
/// F(p) = r² · Σᵢ 1 / |p - cᵢ|²  -  1
/// ```
#[derive(Debug, Clone)]
pub struct MetaballField {
    balls: Vec<Ball>,
    radius: Value,
    time: Value,
    time_step: Value,
}

impl MetaballField {
    /// Creates a field with no balls.
    pub fn new(radius: Value) -> Self {
        Self {
            balls: Vec::new(),
            radius,
            time: 0.,
            time_step: DEFAULT_TIME_STEP,
        }
    }

    pub fn with_ball(mut self, ball: Ball) -> Self {
        self.balls.push(ball);
        self
    }

    pub fn with_balls(mut self, balls: impl IntoIterator<Item = Ball>) -> Self {
        self.balls.extend(balls);
        self
    }

    /// Sets the simulated time that passes on every [`update`](ScalarField::update).
    pub fn with_time_step(mut self, time_step: Value) -> Self {
        self.time_step = time_step;
        self
    }

    /// Simulated time since the field was created.
    pub fn time(&self) -> Value {
        self.time
    }

    pub fn balls_mut(&mut self) -> &mut [Ball] {
        &mut self.balls
    }
}

impl ScalarField for MetaballField {
    fn balls(&self) -> &[Ball] {
        &self.balls
    }

    fn ball_radius(&self) -> Value {
        self.radius
    }

    fn evaluate(&self, point: &Point) -> Value {
        let influence: Value = self
            .balls
            .iter()
            .map(|ball| 1. / (point - ball.position).norm_squared().max(MIN_DISTANCE_SQUARED))
            .sum();
        self.radius * self.radius * influence - 1.
    }

    fn update(&mut self) {
        self.time += self.time_step;
        let time = self.time;
        for ball in &mut self.balls {
            ball.move_to(time);
        }
    }
}
