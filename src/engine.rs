use crate::browser;
use anyhow::{anyhow, Result};
// web assembly is a single threaded environment, so Rc RefCell > Mutex
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;
use web_sys::CanvasRenderingContext2d;

use self::input::InputState;

// length of a frame in milliseconds
pub const FRAME_SIZE: f32 = 1.0 / 60.0 * 1000.0;

#[async_trait(?Send)]
pub trait Game {
    async fn initialize(&self) -> Result<Box<dyn Game>>;
    fn update(&mut self, input: &mut InputState);
    fn draw(&self, renderer: &Renderer);
}

// ==================== Geometry ====================
#[derive(Debug, Default, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct Rect {
    pub position: Point,
    pub size: Size,
}

impl Rect {
    pub fn new(position: Point, size: Size) -> Self {
        Self { position, size }
    }
}

// ==================== Game Loop ====================
pub struct GameLoop {
    last_frame: f64,
    accumulated_delta: f32,
}

type SharedLoopClosure = Rc<RefCell<Option<browser::LoopClosure>>>;

impl GameLoop {
    pub async fn start(game: impl Game + 'static) -> Result<()> {
        let mut input_events = input::prepare_input()?;
        let mut game = game.initialize().await?;
        let mut input_state = InputState::new();
        let mut game_loop = GameLoop {
            last_frame: browser::now()?,
            accumulated_delta: 0.0,
        };
        let renderer = Renderer {
            context: browser::context()?,
        };
        let f: SharedLoopClosure = Rc::new(RefCell::new(None));
        let g = f.clone();
        *g.borrow_mut() = Some(browser::create_raf_closure(move |perf: f64| {
            input::process_input(&mut input_state, &mut input_events);
            game_loop.accumulated_delta += (perf - game_loop.last_frame) as f32;
            while game_loop.accumulated_delta > FRAME_SIZE {
                game.update(&mut input_state);
                game_loop.accumulated_delta -= FRAME_SIZE;
            }
            game_loop.last_frame = perf;
            game.draw(&renderer);
            let _ = browser::request_animation_frame(f.borrow().as_ref().unwrap());
        }));

        browser::request_animation_frame(
            g.borrow()
                .as_ref()
                .ok_or_else(|| anyhow!("GameLoop: Loop is None"))?,
        )?;

        Ok(())
    }
}

// ==================== Renderer ====================
pub struct Renderer {
    context: CanvasRenderingContext2d,
}

const TEXT_FONT: &str = "24px sans-serif";

impl Renderer {
    pub fn clear(&self, rect: &Rect) {
        self.context.clear_rect(
            rect.position.x,
            rect.position.y,
            rect.size.width,
            rect.size.height,
        );
    }

    pub fn fill_rect(&self, rect: &Rect, color: &str) {
        self.context.set_fill_style_str(color);
        self.context.fill_rect(
            rect.position.x,
            rect.position.y,
            rect.size.width,
            rect.size.height,
        );
    }

    pub fn circle(&self, center: Point, radius: f64, color: &str) {
        self.context.begin_path();
        self.context
            .arc(center.x, center.y, radius, 0.0, std::f64::consts::TAU)
            .expect("Drawing is throwing exceptions! Unrecoverable error");
        self.context.set_fill_style_str(color);
        self.context.fill();
        self.context.close_path();
    }

    pub fn line(&self, from: Point, to: Point, width: f64, color: &str) {
        self.context.begin_path();
        self.context.move_to(from.x, from.y);
        self.context.line_to(to.x, to.y);
        self.context.set_stroke_style_str(color);
        self.context.set_line_width(width);
        self.context.stroke();
        self.context.close_path();
    }

    pub fn text(&self, text: &str, at: Point, color: &str) {
        self.context.set_font(TEXT_FONT);
        self.context.set_fill_style_str(color);
        self.context
            .fill_text(text, at.x, at.y)
            .expect("Drawing is throwing exceptions! Unrecoverable error");
    }
}

// ==================== Input ====================
pub mod input {
    use crate::browser;
    use anyhow::Result;
    use futures::channel::mpsc::{unbounded, UnboundedReceiver};
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;
    use wasm_bindgen::JsCast;
    use web_sys::KeyboardEvent;

    // keys whose browser default (page scroll) must be suppressed
    const SUPPRESSED_KEYS: [&str; 5] = ["ArrowUp", "ArrowDown", "ArrowLeft", "ArrowRight", "Space"];

    /// Raw DOM events, queued by the handlers and drained once per
    /// animation frame by [`process_input`].
    pub enum InputEvent {
        KeyDown(KeyboardEvent),
        KeyUp(KeyboardEvent),
        Resized,
    }

    /// Aggregate input snapshot shared with the game each frame.
    ///
    /// `pressed` tracks held keys; `taps` records every keydown event seen
    /// since the last drain, auto-repeat included, so event-stepped
    /// behavior stays distinct from held-key behavior.
    pub struct InputState {
        pressed: HashMap<String, KeyboardEvent>,
        taps: Vec<String>,
        resized: bool,
    }

    impl InputState {
        pub fn new() -> Self {
            InputState {
                pressed: HashMap::new(),
                taps: Vec::new(),
                resized: false,
            }
        }

        pub fn is_pressed(&self, code: &str) -> bool {
            self.pressed.contains_key(code)
        }

        /// Keydown events accumulated since the last drain. The first
        /// update of a frame consumes them; later updates in the same
        /// frame see none.
        pub fn drain_taps(&mut self) -> Vec<String> {
            std::mem::take(&mut self.taps)
        }

        pub fn take_resized(&mut self) -> bool {
            std::mem::take(&mut self.resized)
        }
    }

    impl Default for InputState {
        fn default() -> Self {
            Self::new()
        }
    }

    /// Fold queued DOM events into the input state. Runs once per
    /// animation frame, before any updates.
    pub fn process_input(state: &mut InputState, receiver: &mut UnboundedReceiver<InputEvent>) {
        loop {
            match receiver.try_next() {
                Ok(None) => break,
                Err(_err) => break,
                Ok(Some(event)) => match event {
                    InputEvent::KeyDown(evt) => {
                        let code = evt.code();
                        state.taps.push(code.clone());
                        state.pressed.insert(code, evt);
                    }
                    InputEvent::KeyUp(evt) => {
                        state.pressed.remove(&evt.code());
                    }
                    InputEvent::Resized => {
                        state.resized = true;
                    }
                },
            }
        }
    }

    /// Attach keyboard and resize handlers to the window and return the
    /// receiving end of the event queue. Handlers only enqueue; all state
    /// mutation happens inside the frame callback.
    pub fn prepare_input() -> Result<UnboundedReceiver<InputEvent>> {
        let (sender, receiver) = unbounded();
        let keydown_sender = Rc::new(RefCell::new(sender));
        let keyup_sender = keydown_sender.clone();
        let resize_sender = keydown_sender.clone();

        let onkeydown = browser::closure_wrap(Box::new(move |event: KeyboardEvent| {
            if SUPPRESSED_KEYS.contains(&event.code().as_str()) {
                event.prevent_default();
            }
            let _ = keydown_sender
                .borrow_mut()
                .start_send(InputEvent::KeyDown(event));
        }) as Box<dyn FnMut(KeyboardEvent)>);

        let onkeyup = browser::closure_wrap(Box::new(move |event: KeyboardEvent| {
            let _ = keyup_sender
                .borrow_mut()
                .start_send(InputEvent::KeyUp(event));
        }) as Box<dyn FnMut(KeyboardEvent)>);

        let onresize = browser::closure_wrap(Box::new(move |_event: web_sys::Event| {
            let _ = resize_sender.borrow_mut().start_send(InputEvent::Resized);
        }) as Box<dyn FnMut(web_sys::Event)>);

        let window = browser::window()?;
        window.set_onkeydown(Some(onkeydown.as_ref().unchecked_ref()));
        window.set_onkeyup(Some(onkeyup.as_ref().unchecked_ref()));
        window.set_onresize(Some(onresize.as_ref().unchecked_ref()));

        // keep the handlers alive for the lifetime of the page
        onkeydown.forget();
        onkeyup.forget();
        onresize.forget();

        Ok(receiver)
    }
}
