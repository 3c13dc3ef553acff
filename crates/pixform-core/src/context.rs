//! Evaluation context: the per-pixel state formulas read from.
//!
//! Every evaluation receives an explicit `&mut EvalContext`, so a compiled
//! formula can be shared across threads as long as each thread drives its
//! own context. The renderer sets the coordinates before evaluating the
//! channel formulas of a pixel.

use std::fmt;

use glam::DVec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// An image channel that a formula can sample or produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Red,
    Green,
    Blue,
    Gray,
    Alpha,
}

impl Channel {
    /// Lower-case channel name, as used in formula accessors and config keys.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Green => "green",
            Self::Blue => "blue",
            Self::Gray => "gray",
            Self::Alpha => "alpha",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Read access to the source image, implemented by the render collaborator.
///
/// Coordinates are in formula space (the same space as `x` and `y`); the
/// implementation is responsible for scaling and clamping them.
pub trait ChannelSource {
    fn sample(&self, channel: Channel, x: f64, y: f64) -> f64;
}

/// Source used when no image is attached. Every sample reads as zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSource;

impl ChannelSource for NoSource {
    fn sample(&self, _channel: Channel, _x: f64, _y: f64) -> f64 {
        0.0
    }
}

/// A mutable coordinate slot bound to a variable name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// `w`: image width.
    Width,
    /// `h`: image height.
    Height,
    /// `x`: current column.
    X,
    /// `y`: current row.
    Y,
    /// `r`: distance from the image centre.
    Radius,
    /// `t`: angle around the image centre.
    Theta,
}

/// Per-pixel evaluation state.
pub struct EvalContext<'a> {
    size: DVec2,
    position: DVec2,
    radius: f64,
    theta: f64,
    channel: Channel,
    source: &'a dyn ChannelSource,
    rng: ChaCha8Rng,
}

impl EvalContext<'static> {
    /// Context with no image attached and a zero seed.
    pub fn new() -> Self {
        Self::with_source(&NoSource)
    }
}

impl Default for EvalContext<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> EvalContext<'a> {
    /// Context reading channel samples from `source`.
    pub fn with_source(source: &'a dyn ChannelSource) -> Self {
        Self {
            size: DVec2::ZERO,
            position: DVec2::ZERO,
            radius: 0.0,
            theta: 0.0,
            channel: Channel::Red,
            source,
            rng: ChaCha8Rng::seed_from_u64(0),
        }
    }

    /// Reseed the generator behind `rand()`.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = ChaCha8Rng::seed_from_u64(seed);
        self
    }

    /// Select an independent stream of the current seed.
    pub fn with_stream(mut self, stream: u64) -> Self {
        self.rng.set_stream(stream);
        self
    }

    pub fn set_width(&mut self, width: f64) {
        self.size.x = width;
    }

    pub fn set_height(&mut self, height: f64) {
        self.size.y = height;
    }

    pub fn set_x(&mut self, x: f64) {
        self.position.x = x;
    }

    pub fn set_y(&mut self, y: f64) {
        self.position.y = y;
    }

    pub fn set_r(&mut self, r: f64) {
        self.radius = r;
    }

    pub fn set_t(&mut self, t: f64) {
        self.theta = t;
    }

    /// Recompute `r` and `t` from an offset relative to the image centre.
    ///
    /// The angle is `atan2(dx, dy)`, measured from the vertical axis.
    /// Both are zero at the centre itself.
    pub fn set_polar_from_cartesian(&mut self, dx: f64, dy: f64) {
        if dx == 0.0 && dy == 0.0 {
            self.radius = 0.0;
            self.theta = 0.0;
        } else {
            self.radius = DVec2::new(dx, dy).length();
            self.theta = dx.atan2(dy);
        }
    }

    /// Recompute `x` and `y` from a polar pair.
    pub fn set_cartesian_from_polar(&mut self, r: f64, t: f64) {
        self.position = DVec2::from_angle(t) * r;
    }

    /// Channel that `rgb(x,y)` resolves to.
    pub fn set_channel(&mut self, channel: Channel) {
        self.channel = channel;
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }

    /// Current value of a coordinate slot.
    pub fn slot(&self, slot: Slot) -> f64 {
        match slot {
            Slot::Width => self.size.x,
            Slot::Height => self.size.y,
            Slot::X => self.position.x,
            Slot::Y => self.position.y,
            Slot::Radius => self.radius,
            Slot::Theta => self.theta,
        }
    }

    pub fn sample(&self, channel: Channel, x: f64, y: f64) -> f64 {
        self.source.sample(channel, x, y)
    }

    /// Uniform sample in `[0, 1)`.
    pub fn random(&mut self) -> f64 {
        self.rng.random::<f64>()
    }
}

impl fmt::Debug for EvalContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvalContext")
            .field("size", &self.size)
            .field("position", &self.position)
            .field("radius", &self.radius)
            .field("theta", &self.theta)
            .field("channel", &self.channel)
            .finish_non_exhaustive()
    }
}
