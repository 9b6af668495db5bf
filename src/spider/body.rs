use super::legs::{self, LegPose, Side, FEMUR_STROKE, LEGS_PER_SIDE, TIBIA_STROKE};
use super::state::{Airborne, Grounded, IsAirborne, SpiderContext, SpiderState};
use super::{BODY_RADIUS, HEAD_RATIO, PHASE_RATE};
use crate::engine::{Point, Renderer};

const SPIDER_COLOR: &str = "black";

/// ┌───────────── State Transition Flow ──────────────┐
/// │  From State  →  Event   →  To State              │
/// ├──────────────────────────────────────────────────┤
/// │  Grounded    →  Jump    →  Airborne              │
/// │  Airborne    →  Update  →  Grounded (on landing) │
/// └──────────────────────────────────────────────────┘
pub enum Event {
    Jump,
    Update,
}

#[derive(Debug, Copy, Clone)]
enum SpiderStateMachine {
    Grounded(SpiderState<Grounded>),
    Airborne(SpiderState<Airborne>),
}

impl From<SpiderState<Grounded>> for SpiderStateMachine {
    fn from(state: SpiderState<Grounded>) -> Self {
        SpiderStateMachine::Grounded(state)
    }
}

impl From<SpiderState<Airborne>> for SpiderStateMachine {
    fn from(state: SpiderState<Airborne>) -> Self {
        SpiderStateMachine::Airborne(state)
    }
}

impl From<IsAirborne> for SpiderStateMachine {
    fn from(is_airborne: IsAirborne) -> Self {
        match is_airborne {
            IsAirborne::Done(grounded_state) => grounded_state.into(),
            IsAirborne::InProgress(airborne_state) => airborne_state.into(),
        }
    }
}

impl SpiderStateMachine {
    // CONSUMING self and returning a new Self, so the old state can never
    // be touched again
    fn transition(self, event: Event) -> Self {
        use SpiderStateMachine::*;
        match (self, event) {
            (Grounded(state), Event::Jump) => state.jump().into(),
            (Grounded(state), Event::Update) => state.update().into(),
            (Airborne(state), Event::Update) => state.update().into(),
            // a jump trigger while airborne keeps the current state: no
            // double-jump, no buffering
            _ => self,
        }
    }

    fn update(self) -> Self {
        self.transition(Event::Update)
    }

    fn context(&self) -> &SpiderContext {
        use SpiderStateMachine::*;
        match self {
            Grounded(state) => state.context(),
            Airborne(state) => state.context(),
        }
    }
}

/// The whole character: anchor on screen, accumulated leg phase, and the
/// jump state machine.
#[derive(Debug, Clone, Copy)]
pub struct Spider {
    state: SpiderStateMachine,
    anchor: Point,
    leg_phase: f64,
}

impl Spider {
    pub fn new(anchor: Point) -> Self {
        Spider {
            state: SpiderStateMachine::Grounded(SpiderState::new()),
            anchor,
            leg_phase: 0.0,
        }
    }

    /// One fixed tick: advance the leg phase while moving (legs freeze
    /// instantly otherwise), then integrate the jump state. `dt` is in
    /// milliseconds.
    pub fn update(&mut self, moving: bool, dt: f64) {
        if moving {
            self.leg_phase += dt * PHASE_RATE;
        }
        self.state = self.state.update();
    }

    pub fn jump(&mut self) {
        self.state = self.state.transition(Event::Jump);
    }

    pub fn recenter(&mut self, anchor: Point) {
        self.anchor = anchor;
    }

    pub fn anchor(&self) -> Point {
        self.anchor
    }

    pub fn leg_phase(&self) -> f64 {
        self.leg_phase
    }

    pub fn jump_offset(&self) -> f64 {
        self.state.context().jump_offset
    }

    pub fn jump_velocity(&self) -> f64 {
        self.state.context().jump_velocity
    }

    pub fn is_grounded(&self) -> bool {
        matches!(self.state, SpiderStateMachine::Grounded(_))
    }

    /// Body center on screen: the fixed anchor lifted by the jump offset.
    pub fn screen_position(&self) -> Point {
        Point::new(self.anchor.x, self.anchor.y + self.jump_offset())
    }

    pub fn draw(&self, renderer: &Renderer) {
        let center = self.screen_position();
        renderer.circle(center, BODY_RADIUS, SPIDER_COLOR);
        // head bulge on top of the body
        renderer.circle(
            Point::new(center.x, center.y - BODY_RADIUS * HEAD_RATIO),
            BODY_RADIUS * HEAD_RATIO,
            SPIDER_COLOR,
        );

        for side in [Side::Left, Side::Right] {
            for index in 0..LEGS_PER_SIDE {
                let LegPose { hip, knee, foot } =
                    legs::leg_pose(center, BODY_RADIUS, self.leg_phase, index, side);
                renderer.line(hip, knee, FEMUR_STROKE, SPIDER_COLOR);
                renderer.line(knee, foot, TIBIA_STROKE, SPIDER_COLOR);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::FRAME_SIZE;
    use approx::assert_relative_eq;

    const DT: f64 = FRAME_SIZE as f64;

    fn spider() -> Spider {
        Spider::new(Point::new(400.0, 300.0))
    }

    #[test]
    fn jump_trigger_while_airborne_is_ignored() {
        let mut spider = spider();
        spider.jump();
        spider.update(false, DT);
        let velocity = spider.jump_velocity();
        let offset = spider.jump_offset();

        // second trigger mid-air must not re-apply the impulse
        spider.jump();
        assert_eq!(spider.jump_velocity(), velocity);
        assert_eq!(spider.jump_offset(), offset);
        assert!(!spider.is_grounded());
    }

    #[test]
    fn full_jump_arc_returns_to_the_ground() {
        let mut spider = spider();
        spider.jump();
        for _ in 0..47 {
            assert!(!spider.is_grounded());
            spider.update(false, DT);
        }
        assert!(spider.is_grounded());
        assert_eq!(spider.jump_offset(), 0.0);
        assert_eq!(spider.screen_position(), spider.anchor());
    }

    #[test]
    fn leg_phase_advances_only_while_moving() {
        let mut spider = spider();
        spider.update(true, DT);
        spider.update(true, DT);
        assert_relative_eq!(spider.leg_phase(), 2.0 * DT * PHASE_RATE);

        let frozen = spider.leg_phase();
        spider.update(false, DT);
        assert_eq!(spider.leg_phase(), frozen);
    }

    #[test]
    fn airborne_spider_renders_above_its_anchor() {
        let mut spider = spider();
        spider.jump();
        spider.update(false, DT);
        assert!(spider.jump_offset() < 0.0);
        assert!(spider.screen_position().y < spider.anchor().y);
        assert_eq!(spider.screen_position().x, spider.anchor().x);
    }
}
