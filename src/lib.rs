// ==================== Imports ====================
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsValue;

#[macro_use]
pub mod browser;
pub mod engine;
pub mod game;
pub mod spider;

use engine::GameLoop;
use game::BugHunt;

// ==================== Main Functions ====================
/// Main entry for the WebAssembly module
/// - installs the panic hook
/// - sizes the canvas to the viewport
/// - verifies the 2d context, then starts the game loop
#[wasm_bindgen]
pub fn main_js() -> Result<(), JsValue> {
    // setup better panic messages for debugging
    console_error_panic_hook::set_once();

    browser::fit_canvas_to_viewport().expect("canvas should size to the viewport");
    // a missing 2d context is unrecoverable: abort before the loop starts
    browser::context().expect("context should be a CanvasRenderingContext2d");
    log!("bug hunt loaded!");

    // spawns a new asynchronous task in local thread, for web assembly
    // environment, using wasm_bindgen_futures
    browser::spawn_local(async move {
        GameLoop::start(BugHunt::new())
            .await
            .expect("Could not start game loop");
    });

    Ok(())
}
