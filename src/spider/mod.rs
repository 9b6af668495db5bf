//! The procedurally drawn spider: shared body geometry, trigonometric
//! leg placement, and the grounded/airborne jump state machine.

pub mod body;
pub mod legs;
pub mod state;

pub use body::Spider;

// body geometry, in canvas pixels
pub const BODY_RADIUS: f64 = 30.0;
pub const FEMUR_LENGTH: f64 = 35.0;
pub const TIBIA_LENGTH: f64 = 40.0;

/// Head bulge radius and lift, as a fraction of the body radius.
pub const HEAD_RATIO: f64 = 0.6;

/// Leg phase advance per millisecond while a movement key is held.
pub const PHASE_RATE: f64 = 0.005;
