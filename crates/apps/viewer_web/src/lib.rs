use std::cell::RefCell;
use std::rc::Rc;

use console_error_panic_hook::set_once;
use foundation::math::Vec2;
use gloo_timers::callback::Interval;
use runtime::driver::Completion;
use scene::{SceneGraph, render};
use streaming::endpoints::Endpoints;
use streaming::error::TransportError;
use tracing::{debug, info, warn};
use views::config::ViewerConfig;
use views::controller::{ErrorCallback, GraphController, ScatterplotController, ViewDriver};
use views::filter::send_filter;
use views::graph::GraphView;
use views::scatterplot::ScatterplotView;
use views::session::refresh_once;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

mod canvas;
mod transport;

use canvas::{CanvasBackend, CanvasTextMeasure, ImageCache};
use transport::HttpTransport;

/// Layout iterations per animation frame.
const GRAPH_STEPS_PER_FRAME: usize = 5;
/// Wheel delta to zoom factor: `exp(-delta * WHEEL_ZOOM_RATE)`.
const WHEEL_ZOOM_RATE: f64 = 0.002;

struct Mounted<V> {
    view: Rc<RefCell<V>>,
    ctx: CanvasRenderingContext2d,
}

struct ViewerState {
    config: ViewerConfig,
    transport: HttpTransport,
    scatterplot: Option<Mounted<ScatterplotView>>,
    history_ctx: Option<CanvasRenderingContext2d>,
    graph: Option<Mounted<GraphView>>,
    images: ImageCache,
    on_image_load: Option<js_sys::Function>,
    on_error: Option<js_sys::Function>,
    polling: Option<Interval>,
    animating: bool,
}

impl Default for ViewerState {
    fn default() -> Self {
        let config = ViewerConfig::default();
        Self {
            transport: HttpTransport::new(Endpoints::new(config.server_url.clone())),
            config,
            scatterplot: None,
            history_ctx: None,
            graph: None,
            images: ImageCache::new(),
            on_image_load: None,
            on_error: None,
            polling: None,
            animating: false,
        }
    }
}

thread_local! {
    static STATE: RefCell<ViewerState> = RefCell::new(ViewerState::default());
    static DRIVER: Rc<RefCell<ViewDriver>> = Rc::new(RefCell::new(ViewDriver::new()));
}

fn js_err(msg: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&msg.to_string())
}

fn context_2d(canvas_id: &str) -> Result<CanvasRenderingContext2d, JsValue> {
    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| js_err("no document"))?;
    let canvas: HtmlCanvasElement = document
        .get_element_by_id(canvas_id)
        .ok_or_else(|| js_err(format!("no element #{canvas_id}")))?
        .dyn_into()?;
    canvas
        .get_context("2d")?
        .ok_or_else(|| js_err("2d context unavailable"))?
        .dyn_into()
        .map_err(JsValue::from)
}

/// Forwards fetch failures to the page's handler, if one was registered.
fn error_callback() -> ErrorCallback {
    Rc::new(|view: &str, err: &TransportError| {
        let handler = STATE.with(|s| s.try_borrow().ok().and_then(|s| s.on_error.clone()));
        if let Some(handler) = handler {
            let _ = handler.call2(
                &JsValue::NULL,
                &JsValue::from_str(view),
                &JsValue::from_str(&err.to_string()),
            );
        }
    })
}

fn draw(scene: &SceneGraph, ctx: &CanvasRenderingContext2d, state: &mut ViewerState) {
    let Some(on_load) = state.on_image_load.clone() else {
        return;
    };
    let endpoints = state.transport.endpoints().clone();
    let mut backend = CanvasBackend::new(ctx, &mut state.images, &endpoints, &on_load);
    render(scene, &mut backend);
}

/// Repaints every mounted view from its scene graph.
fn redraw() {
    STATE.with(|state| {
        let Ok(mut state) = state.try_borrow_mut() else {
            return;
        };
        let scatterplot = state
            .scatterplot
            .as_ref()
            .map(|m| (Rc::clone(&m.view), m.ctx.clone()));
        let graph = state
            .graph
            .as_ref()
            .map(|m| (Rc::clone(&m.view), m.ctx.clone()));
        let history_ctx = state.history_ctx.clone();

        if let Some((view, ctx)) = scatterplot {
            if let Ok(view) = view.try_borrow() {
                draw(view.scene(), &ctx, &mut state);
                if let Some(hctx) = &history_ctx {
                    draw(view.history_scene(), hctx, &mut state);
                }
            }
        }
        if let Some((view, ctx)) = graph {
            if let Ok(view) = view.try_borrow() {
                draw(view.scene(), &ctx, &mut state);
            }
        }
    });
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    set_once();
    tracing_wasm::set_as_global_default();
    let on_load = Closure::<dyn FnMut()>::new(redraw);
    STATE.with(|s| {
        s.borrow_mut().on_image_load = Some(on_load.into_js_value().unchecked_into());
    });
    Ok(())
}

/// Applies a JSON viewer config. Invalid configs fall back to defaults.
#[wasm_bindgen]
pub fn configure(json: &str) {
    let config = ViewerConfig::from_json(json).unwrap_or_else(|err| {
        warn!(error = %err, "invalid viewer config; using defaults");
        ViewerConfig::default()
    });
    DRIVER.with(|driver| {
        let mut driver = driver.borrow_mut();
        if driver.is_active() {
            warn!("views already mounted; stale-response policy unchanged");
        } else {
            *driver = ViewDriver::new().with_discard_stale(config.discard_stale);
        }
    });
    STATE.with(|s| {
        let mut s = s.borrow_mut();
        s.transport = HttpTransport::new(Endpoints::new(config.server_url.clone()));
        s.config = config;
    });
}

/// `handler(view, message)` is called for every failed fetch.
#[wasm_bindgen]
pub fn set_error_handler(handler: js_sys::Function) {
    STATE.with(|s| s.borrow_mut().on_error = Some(handler));
}

/// Mounts the scatterplot and makes it the polled view.
#[wasm_bindgen]
pub fn scatterplot_ready(
    canvas_id: &str,
    history_canvas_id: Option<String>,
    module_id: Option<String>,
) -> Result<(), JsValue> {
    let ctx = context_2d(canvas_id)?;
    let history_ctx = history_canvas_id.as_deref().map(context_2d).transpose()?;
    let (view, module_id) = STATE.with(|s| {
        let mut s = s.borrow_mut();
        let view = Rc::new(RefCell::new(ScatterplotView::new(s.config.scatterplot.clone())));
        s.scatterplot = Some(Mounted {
            view: Rc::clone(&view),
            ctx,
        });
        s.history_ctx = history_ctx;
        (view, module_id.unwrap_or_else(|| s.config.module_id.clone()))
    });
    let controller =
        ScatterplotController::new(module_id, view).with_error_callback(error_callback());
    DRIVER.with(|d| d.borrow_mut().activate(Box::new(controller)));
    refresh();
    Ok(())
}

/// Mounts the module graph and makes it the polled view.
#[wasm_bindgen]
pub fn module_graph_ready(canvas_id: &str) -> Result<(), JsValue> {
    let ctx = context_2d(canvas_id)?;
    let view = STATE.with(|s| {
        let mut s = s.borrow_mut();
        let measure = Box::new(CanvasTextMeasure::new(ctx.clone()));
        let view = Rc::new(RefCell::new(GraphView::new(s.config.graph.clone(), measure)));
        s.graph = Some(Mounted {
            view: Rc::clone(&view),
            ctx,
        });
        view
    });
    let controller = GraphController::new(view).with_error_callback(error_callback());
    DRIVER.with(|d| d.borrow_mut().activate(Box::new(controller)));
    refresh();
    Ok(())
}

/// Fetches and applies one update of the active view.
#[wasm_bindgen]
pub fn refresh() {
    let driver = DRIVER.with(Rc::clone);
    let transport = STATE.with(|s| s.borrow().transport.clone());
    spawn_local(async move {
        let completion = refresh_once(&driver, &transport).await;
        debug!(?completion, "refresh");
        if completion == Completion::Applied {
            redraw();
            graph_animate();
        }
    });
}

/// Refreshes every `interval_ms` (config default when omitted).
#[wasm_bindgen]
pub fn start_polling(interval_ms: Option<u32>) {
    STATE.with(|s| {
        let mut s = s.borrow_mut();
        let ms = interval_ms.unwrap_or(s.config.poll_interval_ms.min(u32::MAX as u64) as u32);
        info!(interval_ms = ms, "polling started");
        s.polling = Some(Interval::new(ms, refresh));
    });
}

#[wasm_bindgen]
pub fn stop_polling() {
    STATE.with(|s| s.borrow_mut().polling = None);
}

fn with_scatterplot(f: impl FnOnce(&mut ScatterplotView, Vec2)) {
    let mounted = STATE.with(|s| {
        let s = s.borrow();
        let m = s.config.scatterplot.margin;
        s.scatterplot
            .as_ref()
            .map(|sp| (Rc::clone(&sp.view), Vec2::new(m.left, m.top)))
    });
    let Some((view, offset)) = mounted else {
        return;
    };
    if let Ok(mut view) = view.try_borrow_mut() {
        f(&mut view, offset);
    }
    redraw();
}

/// Wheel zoom around a canvas pixel.
#[wasm_bindgen]
pub fn scatterplot_zoom(x: f64, y: f64, wheel_delta_y: f64) {
    let factor = (-wheel_delta_y * WHEEL_ZOOM_RATE).exp();
    with_scatterplot(|view, offset| view.zoom_at(Vec2::new(x, y) - offset, factor));
}

#[wasm_bindgen]
pub fn scatterplot_pan(delta_x_px: f64, delta_y_px: f64) {
    with_scatterplot(|view, _| view.pan_by(Vec2::new(delta_x_px, delta_y_px)));
}

#[wasm_bindgen]
pub fn scatterplot_reset_zoom() {
    with_scatterplot(|view, _| view.reset_zoom());
}

/// Sends the visible rectangle to the module's range-query inputs.
#[wasm_bindgen]
pub fn scatterplot_filter(module_id: Option<String>) {
    let (request, transport) = STATE.with(|s| {
        let s = s.borrow();
        let module_id = module_id.unwrap_or_else(|| s.config.module_id.clone());
        let request = s
            .scatterplot
            .as_ref()
            .and_then(|m| m.view.try_borrow().ok()?.filter_request(&module_id));
        (request, s.transport.clone())
    });
    let Some(request) = request else {
        debug!("nothing to filter yet");
        return;
    };
    spawn_local(async move {
        let report = error_callback();
        send_filter(&transport, &request, |err| report("filter", err)).await;
    });
}

/// Shows the compare overlay for the history thumbnail under the pointer.
///
/// Returns whether a thumbnail was hit.
#[wasm_bindgen]
pub fn history_hover(x: f64, y: f64) -> bool {
    let mut hit = false;
    with_scatterplot(|view, _| match view.history_at(Vec2::new(x, y)) {
        Some(href) => hit = view.hover_history(&href),
        None => view.unhover_history(),
    });
    hit
}

#[wasm_bindgen]
pub fn history_unhover() {
    with_scatterplot(|view, _| view.unhover_history());
}

fn with_graph(f: impl FnOnce(&mut GraphView)) {
    let view = STATE.with(|s| s.borrow().graph.as_ref().map(|g| Rc::clone(&g.view)));
    let Some(view) = view else {
        return;
    };
    if let Ok(mut view) = view.try_borrow_mut() {
        f(&mut view);
    }
    redraw();
}

#[wasm_bindgen]
pub fn graph_zoom(x: f64, y: f64, wheel_delta_y: f64) {
    let factor = (-wheel_delta_y * WHEEL_ZOOM_RATE).exp();
    with_graph(|view| view.zoom_at(Vec2::new(x, y), factor));
}

#[wasm_bindgen]
pub fn graph_pan(delta_x_px: f64, delta_y_px: f64) {
    with_graph(|view| view.pan_by(Vec2::new(delta_x_px, delta_y_px)));
}

/// Steps the graph layout once per animation frame until it converges.
#[wasm_bindgen]
pub fn graph_animate() {
    let start = STATE.with(|s| {
        let mut s = s.borrow_mut();
        let pending = s
            .graph
            .as_ref()
            .is_some_and(|g| g.view.try_borrow().is_ok_and(|v| !v.is_routed()));
        if s.animating || !pending {
            return false;
        }
        s.animating = true;
        true
    });
    if start {
        request_frame();
    }
}

fn request_frame() {
    let Some(window) = web_sys::window() else {
        return;
    };
    let callback = Closure::once_into_js(animation_frame);
    if window
        .request_animation_frame(callback.unchecked_ref())
        .is_err()
    {
        STATE.with(|s| s.borrow_mut().animating = false);
    }
}

fn animation_frame() {
    let mut converged = true;
    with_graph(|view| converged = view.advance_layout(GRAPH_STEPS_PER_FRAME));
    if converged {
        STATE.with(|s| s.borrow_mut().animating = false);
    } else {
        request_frame();
    }
}
