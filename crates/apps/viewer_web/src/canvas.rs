use std::collections::{HashMap, VecDeque};
use std::f64::consts::TAU;

use foundation::math::Vec2;
use scene::components::{GroupTransform, Rgba, Shape, Style, TextAnchor};
use scene::{DrawBackend, SceneNode};
use streaming::endpoints::Endpoints;
use tracing::warn;
use views::graph::{FixedAdvance, TextMeasure};
use wasm_bindgen::JsValue;
use web_sys::{CanvasRenderingContext2d, HtmlImageElement};

const MAX_CACHED_IMAGES: usize = 16;
const ARROW_LENGTH: f64 = 8.0;
const ARROW_HALF_WIDTH: f64 = 4.0;

/// Decoded rasters by URL. Loading is asynchronous; `on_load` fires once an
/// image can be drawn.
#[derive(Debug, Default)]
pub struct ImageCache {
    images: HashMap<String, HtmlImageElement>,
    order: VecDeque<String>,
}

impl ImageCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The image at `url` if already decoded; starts loading it otherwise.
    pub fn get(&mut self, url: &str, on_load: &js_sys::Function) -> Option<HtmlImageElement> {
        if let Some(img) = self.images.get(url) {
            return img.complete().then(|| img.clone());
        }
        let img = HtmlImageElement::new().ok()?;
        img.set_onload(Some(on_load));
        img.set_src(url);
        self.images.insert(url.to_string(), img);
        self.order.push_back(url.to_string());
        while self.order.len() > MAX_CACHED_IMAGES {
            if let Some(old) = self.order.pop_front() {
                self.images.remove(&old);
            }
        }
        None
    }
}

/// Draws scene nodes onto a 2D canvas context.
pub struct CanvasBackend<'a> {
    ctx: &'a CanvasRenderingContext2d,
    images: &'a mut ImageCache,
    endpoints: &'a Endpoints,
    on_image_load: &'a js_sys::Function,
}

impl<'a> CanvasBackend<'a> {
    pub fn new(
        ctx: &'a CanvasRenderingContext2d,
        images: &'a mut ImageCache,
        endpoints: &'a Endpoints,
        on_image_load: &'a js_sys::Function,
    ) -> Self {
        Self {
            ctx,
            images,
            endpoints,
            on_image_load,
        }
    }

    fn paint(&self, style: &Style) {
        if let Some(fill) = style.fill {
            self.ctx.set_fill_style_str(&fill.css());
            self.ctx.fill();
        }
        if let Some(stroke) = style.stroke {
            self.ctx.set_stroke_style_str(&stroke.css());
            self.ctx.set_line_width(style.stroke_width);
            self.ctx.stroke();
        }
    }

    fn rounded_rect(&self, x: f64, y: f64, w: f64, h: f64, r: f64) -> Result<(), JsValue> {
        let r = r.min(w / 2.0).min(h / 2.0).max(0.0);
        let ctx = self.ctx;
        ctx.begin_path();
        ctx.move_to(x + r, y);
        ctx.arc_to(x + w, y, x + w, y + h, r)?;
        ctx.arc_to(x + w, y + h, x, y + h, r)?;
        ctx.arc_to(x, y + h, x, y, r)?;
        ctx.arc_to(x, y, x + w, y, r)?;
        ctx.close_path();
        Ok(())
    }

    fn arrowhead(&self, from: Vec2, tip: Vec2, style: &Style) {
        let dir = (tip - from).normalized();
        if dir == Vec2::ZERO {
            return;
        }
        let normal = Vec2::new(-dir.y, dir.x);
        let base = tip - dir.scale(ARROW_LENGTH);
        let a = base + normal.scale(ARROW_HALF_WIDTH);
        let b = base - normal.scale(ARROW_HALF_WIDTH);
        let ctx = self.ctx;
        ctx.begin_path();
        ctx.move_to(tip.x, tip.y);
        ctx.line_to(a.x, a.y);
        ctx.line_to(b.x, b.y);
        ctx.close_path();
        if let Some(color) = style.stroke.or(style.fill) {
            ctx.set_fill_style_str(&color.css());
            ctx.fill();
        }
    }

    fn draw_node(&mut self, node: &SceneNode) -> Result<(), JsValue> {
        let ctx = self.ctx;
        let style = &node.style;
        ctx.set_global_alpha(style.opacity);
        match &node.shape {
            Shape::Rect {
                rect,
                corner_radius,
            } => {
                self.rounded_rect(
                    rect.origin.x,
                    rect.origin.y,
                    rect.width(),
                    rect.height(),
                    *corner_radius,
                )?;
                self.paint(style);
            }
            Shape::Circle { center, radius } => {
                ctx.begin_path();
                ctx.arc(center.x, center.y, *radius, 0.0, TAU)?;
                self.paint(style);
            }
            Shape::Image { rect, href } => {
                let Some(href) = href else {
                    return Ok(());
                };
                let url = self.endpoints.resolve(href);
                if let Some(img) = self.images.get(&url, self.on_image_load) {
                    if let Some(sigma) = style.blur_sigma {
                        ctx.set_filter(&format!("blur({sigma}px)"));
                    }
                    ctx.draw_image_with_html_image_element_and_dw_and_dh(
                        &img,
                        rect.origin.x,
                        rect.origin.y,
                        rect.width(),
                        rect.height(),
                    )?;
                }
            }
            Shape::Text {
                position,
                text,
                anchor,
                rotation_deg,
                font_size_px,
            } => {
                ctx.set_font(&format!("{font_size_px}px sans-serif"));
                ctx.set_text_align(match anchor {
                    TextAnchor::Start => "start",
                    TextAnchor::Middle => "center",
                    TextAnchor::End => "end",
                });
                ctx.translate(position.x, position.y)?;
                ctx.rotate(rotation_deg.to_radians())?;
                ctx.set_fill_style_str(&style.fill.unwrap_or(Rgba::BLACK).css());
                ctx.fill_text(text, 0.0, 0.0)?;
            }
            Shape::Path { points, arrow_end } => {
                let Some(first) = points.first() else {
                    return Ok(());
                };
                ctx.begin_path();
                ctx.move_to(first.x, first.y);
                for p in &points[1..] {
                    ctx.line_to(p.x, p.y);
                }
                self.paint(style);
                if let [.., from, tip] = points.as_slice() {
                    if *arrow_end {
                        self.arrowhead(*from, *tip, style);
                    }
                }
            }
        }
        Ok(())
    }
}

impl DrawBackend for CanvasBackend<'_> {
    fn begin_frame(&mut self, size: Vec2) {
        let _ = self.ctx.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);
        self.ctx.clear_rect(0.0, 0.0, size.x, size.y);
    }

    fn push_transform(&mut self, transform: GroupTransform) {
        self.ctx.save();
        let t = transform.translate;
        if let Err(err) = self
            .ctx
            .translate(t.x, t.y)
            .and_then(|_| self.ctx.scale(transform.scale, transform.scale))
        {
            warn!(?err, "canvas transform failed");
        }
    }

    fn pop_transform(&mut self) {
        self.ctx.restore();
    }

    fn draw(&mut self, node: &SceneNode) {
        self.ctx.save();
        if let Err(err) = self.draw_node(node) {
            warn!(key = %node.key, ?err, "canvas draw failed");
        }
        self.ctx.restore();
    }

    fn end_frame(&mut self) {}
}

/// Label measurement through the canvas text engine.
pub struct CanvasTextMeasure {
    ctx: CanvasRenderingContext2d,
    fallback: FixedAdvance,
}

impl CanvasTextMeasure {
    pub fn new(ctx: CanvasRenderingContext2d) -> Self {
        Self {
            ctx,
            fallback: FixedAdvance::default(),
        }
    }
}

impl TextMeasure for CanvasTextMeasure {
    fn measure(&self, text: &str, font_size_px: f64) -> Vec2 {
        self.ctx.set_font(&format!("{font_size_px}px sans-serif"));
        match self.ctx.measure_text(text) {
            Ok(metrics) => Vec2::new(
                metrics.width(),
                self.fallback.line_height_em * font_size_px,
            ),
            Err(_) => self.fallback.measure(text, font_size_px),
        }
    }
}
