use std::fmt::Write as _;

use foundation::math::Vec2;

use crate::backend::{DrawBackend, render};
use crate::components::{GroupTransform, Shape, Style, TextAnchor};
use crate::node::SceneNode;
use crate::world::SceneGraph;

/// Serializes a scene to a standalone SVG document.
#[derive(Debug, Default)]
pub struct SvgBackend {
    out: String,
    filters: usize,
}

impl SvgBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn finish(self) -> String {
        self.out
    }

    fn style_attrs(&mut self, style: &Style) -> String {
        let mut attrs = String::new();
        match style.fill {
            Some(c) => {
                let _ = write!(attrs, r#" fill="{}""#, c.css());
            }
            None => attrs.push_str(r#" fill="none""#),
        }
        if let Some(c) = style.stroke {
            let _ = write!(
                attrs,
                r#" stroke="{}" stroke-width="{}""#,
                c.css(),
                num(style.stroke_width)
            );
        }
        if style.opacity < 1.0 {
            let _ = write!(attrs, r#" opacity="{}""#, num(style.opacity));
        }
        if let Some(class) = &style.class {
            let _ = write!(attrs, r#" class="{}""#, escape(class));
        }
        if let Some(sigma) = style.blur_sigma {
            self.filters += 1;
            let id = format!("blur{}", self.filters);
            let _ = write!(
                self.out,
                r#"<filter id="{id}"><feGaussianBlur stdDeviation="{}"/></filter>"#,
                num(sigma)
            );
            let _ = write!(attrs, r#" filter="url(#{id})""#);
        }
        attrs
    }
}

impl DrawBackend for SvgBackend {
    fn begin_frame(&mut self, size: Vec2) {
        self.out.clear();
        self.filters = 0;
        let _ = write!(
            self.out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = num(size.x),
            h = num(size.y)
        );
        self.out.push_str(
            r#"<defs><marker id="arrow" viewBox="0 -5 10 10" refX="8" markerWidth="6" markerHeight="6" orient="auto"><path d="M0,-5L10,0L0,5"/></marker></defs>"#,
        );
    }

    fn push_transform(&mut self, t: GroupTransform) {
        let _ = write!(
            self.out,
            r#"<g transform="translate({},{}) scale({})">"#,
            num(t.translate.x),
            num(t.translate.y),
            num(t.scale)
        );
    }

    fn pop_transform(&mut self) {
        self.out.push_str("</g>");
    }

    fn draw(&mut self, node: &SceneNode) {
        let attrs = self.style_attrs(&node.style);
        let title = node
            .title
            .as_deref()
            .map(|t| format!("<title>{}</title>", escape(t)))
            .unwrap_or_default();
        let out = &mut self.out;
        let _ = match &node.shape {
            Shape::Rect {
                rect,
                corner_radius,
            } => write!(
                out,
                r#"<rect x="{}" y="{}" width="{}" height="{}" rx="{}"{attrs}>{title}</rect>"#,
                num(rect.origin.x),
                num(rect.origin.y),
                num(rect.width()),
                num(rect.height()),
                num(*corner_radius)
            ),
            Shape::Circle { center, radius } => write!(
                out,
                r#"<circle cx="{}" cy="{}" r="{}"{attrs}>{title}</circle>"#,
                num(center.x),
                num(center.y),
                num(*radius)
            ),
            Shape::Image { rect, href } => write!(
                out,
                r#"<image x="{}" y="{}" width="{}" height="{}" preserveAspectRatio="none" href="{}"{attrs}>{title}</image>"#,
                num(rect.origin.x),
                num(rect.origin.y),
                num(rect.width()),
                num(rect.height()),
                escape(href.as_deref().unwrap_or(""))
            ),
            Shape::Text {
                position,
                text,
                anchor,
                rotation_deg,
                font_size_px,
            } => {
                let anchor = match anchor {
                    TextAnchor::Start => "start",
                    TextAnchor::Middle => "middle",
                    TextAnchor::End => "end",
                };
                let rotate = if *rotation_deg != 0.0 {
                    format!(
                        r#" transform="rotate({},{},{})""#,
                        num(*rotation_deg),
                        num(position.x),
                        num(position.y)
                    )
                } else {
                    String::new()
                };
                write!(
                    out,
                    r#"<text x="{}" y="{}" text-anchor="{anchor}" font-size="{}"{rotate}{attrs}>{}{title}</text>"#,
                    num(position.x),
                    num(position.y),
                    num(*font_size_px),
                    escape(text)
                )
            }
            Shape::Path { points, arrow_end } => {
                let d = points
                    .iter()
                    .enumerate()
                    .map(|(i, p)| {
                        format!("{}{},{}", if i == 0 { "M" } else { "L" }, num(p.x), num(p.y))
                    })
                    .collect::<String>();
                let marker = if *arrow_end {
                    r#" marker-end="url(#arrow)""#
                } else {
                    ""
                };
                write!(out, r#"<path d="{d}"{marker}{attrs}>{title}</path>"#)
            }
        };
    }

    fn end_frame(&mut self) {
        self.out.push_str("</svg>");
    }
}

/// Renders `scene` into an SVG string.
pub fn to_svg(scene: &SceneGraph) -> String {
    let mut backend = SvgBackend::new();
    render(scene, &mut backend);
    backend.finish()
}

fn num(v: f64) -> String {
    let rounded = (v * 1000.0).round() / 1000.0;
    if rounded == 0.0 {
        "0".to_string()
    } else {
        format!("{rounded}")
    }
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{escape, to_svg};
    use crate::components::{GroupTransform, Rgba, Shape, Style};
    use crate::node::SceneNode;
    use crate::world::SceneGraph;
    use foundation::math::Vec2;

    #[test]
    fn escapes_markup() {
        assert_eq!(escape(r#"a<b & "c""#), "a&lt;b &amp; &quot;c&quot;");
    }

    #[test]
    fn writes_groups_and_shapes() {
        let mut scene = SceneGraph::new(Vec2::new(100.0, 50.0));
        let g = scene.ensure_group("dots", GroupTransform::translate(Vec2::new(40.0, 20.0)));
        g.upsert(
            SceneNode::new("p1", Shape::circle(Vec2::new(1.5, 2.0), 3.5), Style::filled(Rgba::BLUE))
                .with_title("p1"),
        );
        let svg = to_svg(&scene);
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert!(svg.contains(r#"<g transform="translate(40,20) scale(1)">"#));
        assert!(svg.contains(
            r#"<circle cx="1.5" cy="2" r="3.5" fill="rgb(0,0,255)"><title>p1</title></circle>"#
        ));
    }

    #[test]
    fn blurred_node_gets_its_own_filter() {
        let mut scene = SceneGraph::new(Vec2::new(10.0, 10.0));
        let g = scene.ensure_group("heatmap", GroupTransform::identity());
        let mut style = Style::default();
        style.blur_sigma = Some(2.0);
        g.upsert(SceneNode::new("img", Shape::circle(Vec2::ZERO, 1.0), style));
        let svg = to_svg(&scene);
        assert!(svg.contains(r#"<feGaussianBlur stdDeviation="2"/>"#));
        assert!(svg.contains(r#"filter="url(#blur1)""#));
    }
}
