use anyhow::{anyhow, Result};
use std::future::Future;
use wasm_bindgen::closure::{Closure, WasmClosure};
use wasm_bindgen::JsCast;

#[rustfmt::skip]
use web_sys::{
    CanvasRenderingContext2d,
    Document,
    HtmlCanvasElement,
    Window,
};

macro_rules! log {
    ($($t:tt)*) => {
        web_sys::console::log_1(&format!($($t)*).into())
    }
}

// ==================== Constants ====================
// Constants related to HTML elements
mod html {
    pub const CANVAS_ID: &str = "canvas";
    pub const CONTEXT_2D: &str = "2d";
}

// requestAnimationFrame hands the callback a high-resolution timestamp
pub type LoopClosure = Closure<dyn FnMut(f64)>;

pub fn window() -> Result<Window> {
    web_sys::window().ok_or_else(|| anyhow!("Window not found"))
}

pub fn document() -> Result<Document> {
    window()?
        .document()
        .ok_or_else(|| anyhow!("No Document Found"))
}

pub fn canvas() -> Result<HtmlCanvasElement> {
    document()?
        .get_element_by_id(html::CANVAS_ID)
        .ok_or_else(|| anyhow!("No Canvas Element found with ID : '{:#?}'", html::CANVAS_ID))?
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|element| anyhow!("Error converting {:#?} to HtmlCanvasElement", element))
}

pub fn context() -> Result<CanvasRenderingContext2d> {
    canvas()?
        .get_context(html::CONTEXT_2D)
        // Because return is Result<Option<Object>,JsValue>
        // - we map error(JsValue) to Error (anyhow)
        // - take the inner Option and map the None case to a value
        .map_err(|js_value| anyhow!("Error getting context : {:#?}", js_value))?
        .ok_or_else(|| anyhow!("No 2d context found"))?
        .dyn_into::<CanvasRenderingContext2d>()
        .map_err(|element| {
            anyhow!(
                "Error converting {:#?} to CanvasRenderingContext2d",
                element
            )
        })
}

pub fn spawn_local<F>(future: F)
where
    F: Future<Output = ()> + 'static,
{
    wasm_bindgen_futures::spawn_local(future);
}

/// Milliseconds since page load, from the Performance clock.
pub fn now() -> Result<f64> {
    Ok(window()?
        .performance()
        .ok_or_else(|| anyhow!("Performance object not found"))?
        .now())
}

pub fn request_animation_frame(callback: &LoopClosure) -> Result<i32> {
    window()?
        .request_animation_frame(callback.as_ref().unchecked_ref())
        .map_err(|err| anyhow!("Cannot request animation frame : {:#?}", err))
}

pub fn create_raf_closure(f: impl FnMut(f64) + 'static) -> LoopClosure {
    closure_wrap(Box::new(f))
}

pub fn closure_wrap<T: WasmClosure + ?Sized>(data: Box<T>) -> Closure<T> {
    Closure::wrap(data)
}

/// Window inner dimensions in CSS pixels.
pub fn viewport_size() -> Result<(f64, f64)> {
    let window = window()?;
    let width = window
        .inner_width()
        .map_err(|err| anyhow!("Error reading innerWidth : {:#?}", err))?
        .as_f64()
        .ok_or_else(|| anyhow!("innerWidth is not a number"))?;
    let height = window
        .inner_height()
        .map_err(|err| anyhow!("Error reading innerHeight : {:#?}", err))?
        .as_f64()
        .ok_or_else(|| anyhow!("innerHeight is not a number"))?;
    Ok((width, height))
}

/// Resize the canvas backing store to fill the window and return the new
/// size. Clears the canvas as a side effect, so callers redraw next frame.
pub fn fit_canvas_to_viewport() -> Result<(u32, u32)> {
    let (width, height) = viewport_size()?;
    let canvas = canvas()?;
    canvas.set_width(width as u32);
    canvas.set_height(height as u32);
    Ok((canvas.width(), canvas.height()))
}

pub fn canvas_size() -> Result<(u32, u32)> {
    let canvas = canvas()?;
    Ok((canvas.width(), canvas.height()))
}
