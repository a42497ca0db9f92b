use foundation::bounds::ScreenRect;
use foundation::math::Vec2;

use crate::graph::{LayoutEdge, LayoutNode};

/// Polyline for every edge, in edge order.
///
/// Each route leaves the source's box shrunk by `margin` and ends on the
/// target's shrunk box, bending around any other node box in between.
/// Self-loops and edges to unknown nodes yield an empty route.
pub fn route_edges(nodes: &[LayoutNode], edges: &[LayoutEdge], margin: f64) -> Vec<Vec<Vec2>> {
    edges.iter().map(|e| route_edge(nodes, *e, margin)).collect()
}

pub fn route_edge(nodes: &[LayoutNode], edge: LayoutEdge, margin: f64) -> Vec<Vec2> {
    let (Some(source), Some(target)) = (nodes.get(edge.source), nodes.get(edge.target)) else {
        return Vec::new();
    };
    if edge.source == edge.target {
        return Vec::new();
    }

    let mut points = vec![source.position, target.position];
    // Every insertion clears one obstacle from one segment.
    for _ in 0..nodes.len() {
        let Some((at, waypoints)) = first_detour(nodes, edge, &points, margin) else {
            break;
        };
        for (offset, p) in waypoints.into_iter().enumerate() {
            points.insert(at + offset, p);
        }
    }

    let last = points.len() - 1;
    points[0] = exit_point(&source.bounds().inflate(-margin), points[0], points[1]);
    points[last] = exit_point(&target.bounds().inflate(-margin), points[last], points[last - 1]);
    points
}

fn first_detour(
    nodes: &[LayoutNode],
    edge: LayoutEdge,
    points: &[Vec2],
    margin: f64,
) -> Option<(usize, Vec<Vec2>)> {
    for k in 0..points.len() - 1 {
        let (a, b) = (points[k], points[k + 1]);
        for node in nodes {
            if node.index == edge.source || node.index == edge.target {
                continue;
            }
            let rect = node.bounds();
            if rect.contains(a) || rect.contains(b) || !segment_hits(a, b, &rect) {
                continue;
            }
            return Some((k + 1, around(a, b, &rect, margin)));
        }
    }
    None
}

/// Two corners of `rect` grown by `margin`, on the side the segment passes
/// closest to, ordered along the direction of travel.
fn around(a: Vec2, b: Vec2, rect: &ScreenRect, margin: f64) -> Vec<Vec2> {
    let grown = rect.inflate(margin);
    let center = rect.center();
    let y_at_center = if (b.x - a.x).abs() > f64::EPSILON {
        a.y + (center.x - a.x) / (b.x - a.x) * (b.y - a.y)
    } else {
        (a.y + b.y) / 2.0
    };
    let y = if y_at_center <= center.y {
        grown.min().y
    } else {
        grown.max().y
    };
    let (first, second) = if a.x <= b.x {
        (grown.min().x, grown.max().x)
    } else {
        (grown.max().x, grown.min().x)
    };
    vec![Vec2::new(first, y), Vec2::new(second, y)]
}

/// Liang-Barsky test: does segment `a`-`b` pass through the interior of `rect`?
fn segment_hits(a: Vec2, b: Vec2, rect: &ScreenRect) -> bool {
    let d = b - a;
    let (lo, hi) = (rect.min(), rect.max());
    let mut t0: f64 = 0.0;
    let mut t1: f64 = 1.0;
    for (p, q) in [
        (-d.x, a.x - lo.x),
        (d.x, hi.x - a.x),
        (-d.y, a.y - lo.y),
        (d.y, hi.y - a.y),
    ] {
        if p == 0.0 {
            if q <= 0.0 {
                return false;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            t0 = t0.max(r);
        } else {
            t1 = t1.min(r);
        }
        if t0 >= t1 {
            return false;
        }
    }
    (t1 - t0) * d.length() > 1e-9
}

/// Where the ray from `from` towards `toward` leaves `rect` (centered on `from`).
fn exit_point(rect: &ScreenRect, from: Vec2, toward: Vec2) -> Vec2 {
    let d = toward - from;
    let (hw, hh) = (rect.width() / 2.0, rect.height() / 2.0);
    let tx = if d.x != 0.0 { hw / d.x.abs() } else { f64::INFINITY };
    let ty = if d.y != 0.0 { hh / d.y.abs() } else { f64::INFINITY };
    let t = tx.min(ty).min(1.0);
    if !t.is_finite() {
        return from;
    }
    from + d.scale(t)
}

#[cfg(test)]
mod tests {
    use super::{route_edge, route_edges, segment_hits};
    use crate::graph::{LayoutEdge, LayoutNode};
    use foundation::bounds::ScreenRect;
    use foundation::math::Vec2;
    use pretty_assertions::assert_eq;

    fn node(index: usize, x: f64, y: f64, w: f64, h: f64) -> LayoutNode {
        LayoutNode {
            index,
            width: w,
            height: h,
            position: Vec2::new(x, y),
        }
    }

    #[test]
    fn straight_route_starts_and_ends_on_inner_boxes() {
        let nodes = vec![node(0, 0.0, 0.0, 80.0, 40.0), node(1, 300.0, 0.0, 80.0, 40.0)];
        let route = route_edge(&nodes, LayoutEdge::new(0, 1), 10.0);
        assert_eq!(route, vec![Vec2::new(30.0, 0.0), Vec2::new(270.0, 0.0)]);
    }

    #[test]
    fn route_bends_around_obstacle() {
        let nodes = vec![
            node(0, 0.0, 0.0, 80.0, 40.0),
            node(1, 300.0, 0.0, 80.0, 40.0),
            node(2, 150.0, 0.0, 60.0, 40.0),
        ];
        let route = route_edge(&nodes, LayoutEdge::new(0, 1), 10.0);
        assert_eq!(route.len(), 4);
        let obstacle = nodes[2].bounds();
        for w in route.windows(2) {
            assert!(!segment_hits(w[0], w[1], &obstacle), "{route:?}");
        }
    }

    #[test]
    fn degenerate_edges_have_no_route() {
        let nodes = vec![node(0, 0.0, 0.0, 10.0, 10.0)];
        let routes = route_edges(&nodes, &[LayoutEdge::new(0, 0), LayoutEdge::new(0, 7)], 1.0);
        assert_eq!(routes, vec![Vec::<Vec2>::new(), Vec::new()]);
    }

    #[test]
    fn segment_hit_test() {
        let r = ScreenRect::new(0.0, 0.0, 10.0, 10.0);
        assert!(segment_hits(Vec2::new(-5.0, 5.0), Vec2::new(15.0, 5.0), &r));
        assert!(!segment_hits(Vec2::new(-5.0, 15.0), Vec2::new(15.0, 15.0), &r));
        assert!(!segment_hits(Vec2::new(-5.0, 10.0), Vec2::new(15.0, 10.0), &r));
    }
}
