//! Leg placement as pure trigonometry. Eight two-joint legs (four per
//! side) swing on a shared sine phase; there is no skeletal simulation,
//! only per-leg phase offsets and a fake-perspective length scale.

use super::{FEMUR_LENGTH, TIBIA_LENGTH};
use crate::engine::Point;
use serde::{Deserialize, Serialize};

pub const LEGS_PER_SIDE: usize = 4;
pub const FEMUR_STROKE: f64 = 5.0;
pub const TIBIA_STROKE: f64 = 3.0;

// swing amplitude in radians, and the fixed phase lead of the tibia
// relative to the femur
const SWING_AMPLITUDE: f64 = 0.5;
const KNEE_PHASE_LEAD: f64 = 0.5;

// hip anchors as fractions of the body radius, nudged inward so the legs
// connect to the body outline instead of floating beside it
const HIP_OFFSETS: [f64; LEGS_PER_SIDE] = [-0.6, -0.2, 0.2, 0.6];
const HIP_INSET: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// Horizontal direction the leg extends away from the body.
    pub fn sign(self) -> f64 {
        match self {
            Side::Left => -1.0,
            Side::Right => 1.0,
        }
    }
}

/// Joint positions for one leg: hip on the body outline, knee at the end
/// of the femur, foot at the end of the tibia.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct LegPose {
    pub hip: Point,
    pub knee: Point,
    pub foot: Point,
}

/// Fake perspective: legs later in the index draw progressively longer.
pub fn depth_scale(index: usize) -> f64 {
    1.0 + index as f64 * 0.1
}

/// Oscillating swing angle for one leg. Each leg runs one radian ahead of
/// the previous so the gait looks staggered rather than synchronized.
pub fn swing_angle(phase: f64, index: usize) -> f64 {
    (phase + index as f64).sin() * SWING_AMPLITUDE
}

/// Compute the joint positions of leg `index` (must be < `LEGS_PER_SIDE`)
/// on the given side, for a body centered at `body` with radius `radius`.
pub fn leg_pose(body: Point, radius: f64, phase: f64, index: usize, side: Side) -> LegPose {
    let sign = side.sign();
    let angle = swing_angle(phase, index);
    let scale = depth_scale(index);

    let hip = Point::new(
        body.x + sign * (radius - HIP_INSET),
        body.y + HIP_OFFSETS[index] * radius,
    );
    let knee = Point::new(
        hip.x + sign * angle.cos() * FEMUR_LENGTH * scale,
        hip.y + angle.sin() * FEMUR_LENGTH * scale,
    );
    let lead = angle + KNEE_PHASE_LEAD;
    let foot = Point::new(
        knee.x + sign * lead.cos() * TIBIA_LENGTH * scale,
        knee.y + lead.sin() * TIBIA_LENGTH * scale,
    );

    LegPose { hip, knee, foot }
}
