use crate::browser;
use crate::engine::input::InputState;
use crate::engine::{Game, Point, Rect, Renderer, Size, FRAME_SIZE};
use crate::spider::{Spider, BODY_RADIUS};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use rand::Rng;
use serde::{Deserialize, Serialize};

const BUG_COUNT: usize = 12;
const BUG_RADIUS: f64 = 5.0;
const CAMERA_STEP: f64 = 10.0;

const MOVEMENT_KEYS: [&str; 4] = ["ArrowUp", "ArrowDown", "ArrowLeft", "ArrowRight"];
const JUMP_KEY: &str = "Space";

const BACKGROUND_COLOR: &str = "#f5f1e8";
const BUG_COLOR: &str = "firebrick";
const TEXT_COLOR: &str = "black";
const SCORE_ANCHOR: Point = Point { x: 20.0, y: 40.0 };

/// ┌────────────────── Frame Flow ──────────────────┐
/// │  engine::GameLoop                              │
/// │    └─► process_input  (DOM events → InputState)│
/// │    └─► BugHunt::update                         │
/// │          └─► Garden::step (camera, jump,       │
/// │              leg phase, collisions, score)     │
/// │    └─► BugHunt::draw                           │
/// │          └─► Garden::draw (background, bugs,   │
/// │              spider, score text)               │
/// └────────────────────────────────────────────────┘
pub enum BugHunt {
    /// Initial state until the world is seeded
    /// Transitions to `Loaded` once initialization is complete
    Loading,

    /// Active game state with a populated garden
    Loaded(Garden),
}

impl BugHunt {
    pub fn new() -> Self {
        BugHunt::Loading
    }
}

#[async_trait(?Send)]
impl Game for BugHunt {
    async fn initialize(&self) -> Result<Box<dyn Game>> {
        match self {
            BugHunt::Loading => {
                let (width, height) = browser::canvas_size()?;
                let viewport = Size {
                    width: width as f64,
                    height: height as f64,
                };
                let mut rng = rand::thread_rng();
                let bugs = Bug::scatter(&mut rng, BUG_COUNT, viewport);
                log!("garden seeded with {} bugs", bugs.len());
                Ok(Box::new(BugHunt::Loaded(Garden::new(viewport, bugs))))
            }
            BugHunt::Loaded(_) => Err(anyhow!("Game is already initialized")),
        }
    }

    fn update(&mut self, input: &mut InputState) {
        if let BugHunt::Loaded(garden) = self {
            if input.take_resized() {
                match browser::fit_canvas_to_viewport() {
                    Ok((width, height)) => garden.handle_resize(Size {
                        width: width as f64,
                        height: height as f64,
                    }),
                    Err(err) => log!("viewport resize failed : {:#?}", err),
                }
            }

            // camera movement is stepped per keydown *event* (auto-repeat
            // included), while the legs animate on *held* keys
            let mut frame = FrameInput::default();
            for code in input.drain_taps() {
                match code.as_str() {
                    "ArrowUp" => frame.camera_taps.push(Direction::Up),
                    "ArrowDown" => frame.camera_taps.push(Direction::Down),
                    "ArrowLeft" => frame.camera_taps.push(Direction::Left),
                    "ArrowRight" => frame.camera_taps.push(Direction::Right),
                    JUMP_KEY => frame.jump = true,
                    _ => {}
                }
            }
            frame.moving = MOVEMENT_KEYS.iter().any(|code| input.is_pressed(code));

            garden.step(&frame, FRAME_SIZE as f64);
        }
    }

    fn draw(&self, renderer: &Renderer) {
        if let BugHunt::Loaded(garden) = self {
            garden.draw(renderer);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// Everything the world needs from input for one fixed tick.
#[derive(Debug, Clone, Default)]
pub struct FrameInput {
    /// A movement key is currently held: the legs animate.
    pub moving: bool,
    /// The jump key went down this frame.
    pub jump: bool,
    /// One camera step per movement keydown event this frame.
    pub camera_taps: Vec<Direction>,
}

/// World-to-screen translation: `screen = world + offset`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct Camera {
    pub offset: Point,
}

impl Camera {
    /// The world scrolls opposite the direction of travel, so walking
    /// right shifts everything else left.
    pub fn shift(&mut self, direction: Direction) {
        match direction {
            Direction::Up => self.offset.y += CAMERA_STEP,
            Direction::Down => self.offset.y -= CAMERA_STEP,
            Direction::Left => self.offset.x += CAMERA_STEP,
            Direction::Right => self.offset.x -= CAMERA_STEP,
        }
    }

    pub fn project(&self, world: Point) -> Point {
        Point::new(world.x + self.offset.x, world.y + self.offset.y)
    }
}

/// A collectible. Eaten bugs stay in the collection but never re-render
/// and never re-trigger the score.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct Bug {
    pub position: Point,
    pub eaten: bool,
}

impl Bug {
    pub fn new(position: Point) -> Self {
        Bug {
            position,
            eaten: false,
        }
    }

    /// Seed `count` bugs uniformly over the startup viewport.
    pub fn scatter<R: Rng>(rng: &mut R, count: usize, viewport: Size) -> Vec<Bug> {
        (0..count)
            .map(|_| {
                Bug::new(Point::new(
                    rng.gen_range(0.0..viewport.width),
                    rng.gen_range(0.0..viewport.height),
                ))
            })
            .collect()
    }
}

/// The whole mutable world, stepped once per fixed tick. Pure state: no
/// canvas handle, so physics and scoring are testable off the browser.
#[derive(Debug, Clone)]
pub struct Garden {
    pub spider: Spider,
    pub camera: Camera,
    pub bugs: Vec<Bug>,
    pub score: u32,
    pub viewport: Size,
}

impl Garden {
    pub fn new(viewport: Size, bugs: Vec<Bug>) -> Self {
        Garden {
            spider: Spider::new(Point::new(viewport.width / 2.0, viewport.height / 2.0)),
            camera: Camera::default(),
            bugs,
            score: 0,
            viewport,
        }
    }

    /// One fixed tick: camera taps, jump trigger, physics, then the
    /// collision scan. `dt` is in milliseconds.
    pub fn step(&mut self, input: &FrameInput, dt: f64) {
        for direction in &input.camera_taps {
            self.camera.shift(*direction);
        }
        if input.jump {
            self.spider.jump();
        }
        self.spider.update(input.moving, dt);
        self.check_collisions();
    }

    /// Linear scan over the not-yet-eaten bugs; the set is small and
    /// fixed, so no spatial index.
    fn check_collisions(&mut self) {
        let mouth = self.spider.screen_position();
        for bug in self.bugs.iter_mut().filter(|bug| !bug.eaten) {
            let screen = self.camera.project(bug.position);
            // strictly inside the body radius; touching the rim does not
            // count
            if screen.distance(&mouth) < BODY_RADIUS {
                bug.eaten = true;
                self.score += 1;
            }
        }
    }

    /// Recenter the spider on the new viewport. Bug world coordinates and
    /// the camera offset are untouched; only the screen projection moves.
    pub fn handle_resize(&mut self, viewport: Size) {
        self.viewport = viewport;
        self.spider
            .recenter(Point::new(viewport.width / 2.0, viewport.height / 2.0));
    }

    pub fn draw(&self, renderer: &Renderer) {
        let viewport = Rect::new(Point::default(), self.viewport);
        renderer.clear(&viewport);
        renderer.fill_rect(&viewport, BACKGROUND_COLOR);

        // Draw order matters : background -> bugs -> spider -> HUD
        for bug in self.bugs.iter().filter(|bug| !bug.eaten) {
            renderer.circle(self.camera.project(bug.position), BUG_RADIUS, BUG_COLOR);
        }
        self.spider.draw(renderer);
        renderer.text(&format!("Score: {}", self.score), SCORE_ANCHOR, TEXT_COLOR);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const DT: f64 = FRAME_SIZE as f64;
    const VIEWPORT: Size = Size {
        width: 800.0,
        height: 600.0,
    };

    fn garden_with(bugs: Vec<Bug>) -> Garden {
        Garden::new(VIEWPORT, bugs)
    }

    fn idle() -> FrameInput {
        FrameInput::default()
    }

    #[test]
    fn bug_on_the_rim_is_not_eaten() {
        // anchor is (400, 300); this bug sits at distance exactly
        // BODY_RADIUS, and the comparison is strict
        let mut garden = garden_with(vec![Bug::new(Point::new(400.0 + BODY_RADIUS, 300.0))]);
        garden.step(&idle(), DT);
        assert!(!garden.bugs[0].eaten);
        assert_eq!(garden.score, 0);
    }

    #[test]
    fn bug_just_inside_the_rim_is_eaten_exactly_once() {
        let mut garden = garden_with(vec![Bug::new(Point::new(
            400.0 + BODY_RADIUS - 0.001,
            300.0,
        ))]);
        garden.step(&idle(), DT);
        assert!(garden.bugs[0].eaten);
        assert_eq!(garden.score, 1);

        // a second scan over the same bug never re-increments
        garden.step(&idle(), DT);
        assert_eq!(garden.score, 1);
    }

    #[test]
    fn each_new_bug_scores_exactly_one() {
        let mut garden = garden_with(vec![
            Bug::new(Point::new(395.0, 300.0)),
            Bug::new(Point::new(405.0, 305.0)),
            Bug::new(Point::new(700.0, 100.0)),
        ]);
        garden.step(&idle(), DT);
        assert_eq!(garden.score, 2);
        assert!(!garden.bugs[2].eaten);
    }

    #[test]
    fn camera_steps_once_per_tap_not_while_held() {
        let mut garden = garden_with(Vec::new());
        let mut frame = idle();
        frame.camera_taps = vec![Direction::Right, Direction::Right];
        frame.moving = true;
        garden.step(&frame, DT);
        assert_relative_eq!(garden.camera.offset.x, -2.0 * CAMERA_STEP);

        // key still held but no new keydown events: the camera stays put
        let mut held = idle();
        held.moving = true;
        garden.step(&held, DT);
        assert_relative_eq!(garden.camera.offset.x, -2.0 * CAMERA_STEP);
    }

    #[test]
    fn jumping_reaches_a_bug_hovering_above_the_anchor() {
        let mut garden = garden_with(vec![Bug::new(Point::new(400.0, 260.0))]);

        // grounded, the bug is 40px away and out of reach
        garden.step(&idle(), DT);
        assert_eq!(garden.score, 0);

        // the first airborne tick lifts the spider within range
        let mut frame = idle();
        frame.jump = true;
        garden.step(&frame, DT);
        assert_eq!(garden.score, 1);
        assert!(garden.bugs[0].eaten);
    }

    #[test]
    fn resize_recenters_spider_and_keeps_world_coordinates() {
        let mut garden = garden_with(vec![Bug::new(Point::new(123.0, 456.0))]);
        garden.handle_resize(Size {
            width: 1024.0,
            height: 768.0,
        });
        assert_eq!(garden.spider.anchor(), Point::new(512.0, 384.0));
        assert_eq!(garden.bugs[0].position, Point::new(123.0, 456.0));
        assert_eq!(garden.camera.offset, Point::default());
    }

    #[test]
    fn scatter_stays_inside_the_viewport() {
        let mut rng = StdRng::seed_from_u64(42);
        let bugs = Bug::scatter(&mut rng, BUG_COUNT, VIEWPORT);
        assert_eq!(bugs.len(), BUG_COUNT);
        for bug in &bugs {
            assert!(!bug.eaten);
            assert!(bug.position.x >= 0.0 && bug.position.x < VIEWPORT.width);
            assert!(bug.position.y >= 0.0 && bug.position.y < VIEWPORT.height);
        }
    }

    #[test]
    fn four_camera_taps_bring_one_bug_into_range() {
        let mut garden = garden_with(vec![
            Bug::new(Point::new(360.0, 300.0)),
            Bug::new(Point::new(100.0, 100.0)),
            Bug::new(Point::new(700.0, 500.0)),
            Bug::new(Point::new(50.0, 550.0)),
            Bug::new(Point::new(750.0, 80.0)),
        ]);

        // four keydown events of the "shift camera" kind: the world slides
        // right until the first bug lands on the spider's anchor
        let mut frame = idle();
        frame.camera_taps = vec![
            Direction::Left,
            Direction::Left,
            Direction::Left,
            Direction::Left,
        ];
        frame.moving = true;
        garden.step(&frame, DT);

        assert_eq!(garden.score, 1);
        assert!(garden.bugs[0].eaten);
        for bug in &garden.bugs[1..] {
            assert!(!bug.eaten);
        }
    }

    #[test]
    fn score_never_decreases() {
        let mut garden = garden_with(vec![
            Bug::new(Point::new(400.0, 300.0)),
            Bug::new(Point::new(600.0, 200.0)),
        ]);
        let mut last = 0;
        for _ in 0..10 {
            garden.step(&idle(), DT);
            assert!(garden.score >= last);
            last = garden.score;
        }
        assert_eq!(garden.score, 1);
    }
}
