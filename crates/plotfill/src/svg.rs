//! SVG input: extract fillable shapes from documents, and guide curves
//! from raw path data.
//!
//! usvg does the heavy lifting (CSS, `<use>`, shape-to-path conversion);
//! we walk its tree and keep every solidly filled path as a [`Shape`],
//! with subpaths preserved as contours so holes survive. Guide curves
//! come in as bare `d` attribute strings and go through svgtypes instead,
//! since they never live inside a full document.
//!
//! ## Curve flattening
//!
//! Paths contain Bézier curves; the fill engine wants polylines. lyon_geom
//! flattens with a distance tolerance: 0.1 document units keeps the error
//! well under a pen width at plotter scales.

use lyon_geom::{point, CubicBezierSegment, QuadraticBezierSegment};
use svgtypes::PathParser;
use thiserror::Error;
use tracing::debug;

use crate::geometry::{Point, Rect};
use crate::shape::{FillRule, Shape};

/// Maximum deviation of a flattened curve from the true one.
const CURVE_TOLERANCE: f64 = 0.1;

/// Consecutive points closer than this collapse into one.
const DEDUP_EPSILON: f64 = 1e-6;

#[derive(Debug, Error)]
pub enum SvgError {
    #[error("SVG parse error: {0}")]
    Parse(String),
    #[error("guide path error: {0}")]
    GuidePath(String),
    #[error("guide path needs at least two points")]
    GuideTooShort,
}

/// A parsed document: the shapes worth filling and the view they were
/// authored in.
#[derive(Debug, Clone)]
pub struct Scene {
    /// Fillable shapes in document paint order.
    pub shapes: Vec<Shape>,
    /// The view box; fill output is clamped to it.
    pub view: Rect,
}

/// Parse an SVG document into a fill scene.
///
/// Stroke-only and gradient-filled paths are skipped; a document with
/// nothing fillable is an empty scene, not an error.
pub fn extract_scene_from_svg(svg_content: &str) -> Result<Scene, SvgError> {
    let options = usvg::Options::default();
    let tree = usvg::Tree::from_str(svg_content, &options)
        .map_err(|e| SvgError::Parse(e.to_string()))?;

    let mut shapes = Vec::new();
    collect_group(tree.root(), &mut shapes);

    let size = tree.size();
    Ok(Scene {
        shapes,
        view: Rect::from_size(size.width() as f64, size.height() as f64),
    })
}

fn collect_group(group: &usvg::Group, shapes: &mut Vec<Shape>) {
    for child in group.children() {
        match child {
            usvg::Node::Group(group) => collect_group(group, shapes),
            usvg::Node::Path(path) => {
                if let Some(shape) = path_to_shape(path) {
                    shapes.push(shape);
                }
            }
            // Text and images have nothing for a pen to fill
            _ => {}
        }
    }
}

/// Convert one usvg path into a shape, or `None` when it isn't fillable.
fn path_to_shape(path: &usvg::Path) -> Option<Shape> {
    let fill = path.fill()?;
    let rgb = match fill.paint() {
        usvg::Paint::Color(c) => (c.red, c.green, c.blue),
        _ => {
            debug!(id = path.id(), "skipping non-solid fill");
            return None;
        }
    };
    let rule = match fill.rule() {
        usvg::FillRule::NonZero => FillRule::NonZero,
        usvg::FillRule::EvenOdd => FillRule::EvenOdd,
    };
    let transform = path.abs_transform();

    // Walk segments in local coordinates, transforming as points land
    let mut contours: Vec<Vec<Point>> = Vec::new();
    let mut current: Vec<Point> = Vec::new();
    let mut last: Option<(f64, f64)> = None;

    for segment in path.data().segments() {
        match segment {
            usvg::tiny_skia_path::PathSegment::MoveTo(p) => {
                finish_contour(&mut contours, &mut current);
                current.push(apply(transform, p.x as f64, p.y as f64));
                last = Some((p.x as f64, p.y as f64));
            }
            usvg::tiny_skia_path::PathSegment::LineTo(p) => {
                current.push(apply(transform, p.x as f64, p.y as f64));
                last = Some((p.x as f64, p.y as f64));
            }
            usvg::tiny_skia_path::PathSegment::QuadTo(ctrl, p) => {
                let to = (p.x as f64, p.y as f64);
                if let Some(from) = last {
                    flatten_quad(from, (ctrl.x as f64, ctrl.y as f64), to, |x, y| {
                        current.push(apply(transform, x, y));
                    });
                } else {
                    current.push(apply(transform, to.0, to.1));
                }
                last = Some(to);
            }
            usvg::tiny_skia_path::PathSegment::CubicTo(c1, c2, p) => {
                let to = (p.x as f64, p.y as f64);
                if let Some(from) = last {
                    flatten_cubic(
                        from,
                        (c1.x as f64, c1.y as f64),
                        (c2.x as f64, c2.y as f64),
                        to,
                        |x, y| current.push(apply(transform, x, y)),
                    );
                } else {
                    current.push(apply(transform, to.0, to.1));
                }
                last = Some(to);
            }
            usvg::tiny_skia_path::PathSegment::Close => {
                finish_contour(&mut contours, &mut current);
            }
        }
    }
    finish_contour(&mut contours, &mut current);

    if contours.is_empty() {
        return None;
    }

    let mut shape = Shape::new(contours, rule, rgb);
    if !path.id().is_empty() {
        shape = shape.with_name(path.id());
    }
    Some(shape)
}

/// Close off the contour under construction: collapse duplicate points,
/// drop an explicit return to the start, and keep it only if area remains.
fn finish_contour(contours: &mut Vec<Vec<Point>>, current: &mut Vec<Point>) {
    let mut contour = std::mem::take(current);
    contour.dedup_by(|a, b| (a.x - b.x).abs() < DEDUP_EPSILON && (a.y - b.y).abs() < DEDUP_EPSILON);
    if contour.len() >= 2 {
        let (first, last) = (contour[0], contour[contour.len() - 1]);
        if (first.x - last.x).abs() < DEDUP_EPSILON && (first.y - last.y).abs() < DEDUP_EPSILON {
            contour.pop();
        }
    }
    if contour.len() >= 3 {
        contours.push(contour);
    }
}

fn apply(t: usvg::Transform, x: f64, y: f64) -> Point {
    Point::new(
        t.sx as f64 * x + t.kx as f64 * y + t.tx as f64,
        t.ky as f64 * x + t.sy as f64 * y + t.ty as f64,
    )
}

fn flatten_cubic(
    from: (f64, f64),
    ctrl1: (f64, f64),
    ctrl2: (f64, f64),
    to: (f64, f64),
    mut emit: impl FnMut(f64, f64),
) {
    let curve = CubicBezierSegment {
        from: point(from.0, from.1),
        ctrl1: point(ctrl1.0, ctrl1.1),
        ctrl2: point(ctrl2.0, ctrl2.1),
        to: point(to.0, to.1),
    };
    curve.for_each_flattened(CURVE_TOLERANCE, &mut |segment| {
        emit(segment.to.x, segment.to.y);
    });
}

fn flatten_quad(from: (f64, f64), ctrl: (f64, f64), to: (f64, f64), mut emit: impl FnMut(f64, f64)) {
    let curve = QuadraticBezierSegment {
        from: point(from.0, from.1),
        ctrl: point(ctrl.0, ctrl.1),
        to: point(to.0, to.1),
    };
    curve.for_each_flattened(CURVE_TOLERANCE, &mut |segment| {
        emit(segment.to.x, segment.to.y);
    });
}

/// Parse a raw `d` attribute into a guide polyline.
///
/// Guides are open curves, so a second `M` just moves the pen and the
/// jump becomes a straight connector. Smooth curve commands reflect the
/// previous control point per the SVG rules; elliptical arcs are
/// approximated by a straight line to their endpoint.
pub fn parse_guide_path(d: &str) -> Result<Vec<Point>, SvgError> {
    let mut points: Vec<Point> = Vec::new();
    let mut cur = (0.0_f64, 0.0_f64);
    let mut start = (0.0_f64, 0.0_f64);
    let mut prev_cubic_ctrl: Option<(f64, f64)> = None;
    let mut prev_quad_ctrl: Option<(f64, f64)> = None;

    for segment in PathParser::from(d) {
        let segment = segment.map_err(|e| SvgError::GuidePath(e.to_string()))?;
        let mut cubic_ctrl = None;
        let mut quad_ctrl = None;
        match segment {
            svgtypes::PathSegment::MoveTo { abs, x, y } => {
                cur = resolve(abs, cur, x, y);
                start = cur;
                points.push(Point::new(cur.0, cur.1));
            }
            svgtypes::PathSegment::LineTo { abs, x, y } => {
                cur = resolve(abs, cur, x, y);
                points.push(Point::new(cur.0, cur.1));
            }
            svgtypes::PathSegment::HorizontalLineTo { abs, x } => {
                cur = (if abs { x } else { cur.0 + x }, cur.1);
                points.push(Point::new(cur.0, cur.1));
            }
            svgtypes::PathSegment::VerticalLineTo { abs, y } => {
                cur = (cur.0, if abs { y } else { cur.1 + y });
                points.push(Point::new(cur.0, cur.1));
            }
            svgtypes::PathSegment::CurveTo {
                abs,
                x1,
                y1,
                x2,
                y2,
                x,
                y,
            } => {
                let c1 = resolve(abs, cur, x1, y1);
                let c2 = resolve(abs, cur, x2, y2);
                let to = resolve(abs, cur, x, y);
                flatten_cubic(cur, c1, c2, to, |x, y| points.push(Point::new(x, y)));
                cubic_ctrl = Some(c2);
                cur = to;
            }
            svgtypes::PathSegment::SmoothCurveTo { abs, x2, y2, x, y } => {
                let c1 = reflect(cur, prev_cubic_ctrl);
                let c2 = resolve(abs, cur, x2, y2);
                let to = resolve(abs, cur, x, y);
                flatten_cubic(cur, c1, c2, to, |x, y| points.push(Point::new(x, y)));
                cubic_ctrl = Some(c2);
                cur = to;
            }
            svgtypes::PathSegment::Quadratic { abs, x1, y1, x, y } => {
                let ctrl = resolve(abs, cur, x1, y1);
                let to = resolve(abs, cur, x, y);
                flatten_quad(cur, ctrl, to, |x, y| points.push(Point::new(x, y)));
                quad_ctrl = Some(ctrl);
                cur = to;
            }
            svgtypes::PathSegment::SmoothQuadratic { abs, x, y } => {
                let ctrl = reflect(cur, prev_quad_ctrl);
                let to = resolve(abs, cur, x, y);
                flatten_quad(cur, ctrl, to, |x, y| points.push(Point::new(x, y)));
                quad_ctrl = Some(ctrl);
                cur = to;
            }
            svgtypes::PathSegment::EllipticalArc { abs, x, y, .. } => {
                cur = resolve(abs, cur, x, y);
                points.push(Point::new(cur.0, cur.1));
            }
            svgtypes::PathSegment::ClosePath { .. } => {
                cur = start;
                points.push(Point::new(cur.0, cur.1));
            }
        }
        prev_cubic_ctrl = cubic_ctrl;
        prev_quad_ctrl = quad_ctrl;
    }

    points.dedup_by(|a, b| (a.x - b.x).abs() < DEDUP_EPSILON && (a.y - b.y).abs() < DEDUP_EPSILON);
    if points.len() < 2 {
        return Err(SvgError::GuideTooShort);
    }
    Ok(points)
}

#[inline]
fn resolve(abs: bool, cur: (f64, f64), x: f64, y: f64) -> (f64, f64) {
    if abs {
        (x, y)
    } else {
        (cur.0 + x, cur.1 + y)
    }
}

/// Reflection of the previous control point across the current point,
/// falling back to the current point when the previous command had none.
#[inline]
fn reflect(cur: (f64, f64), prev_ctrl: Option<(f64, f64)>) -> (f64, f64) {
    match prev_ctrl {
        Some((px, py)) => (2.0 * cur.0 - px, 2.0 * cur.1 - py),
        None => cur,
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_rect_scene() {
        let svg = r##"
            <svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 100 100">
                <rect id="sun" x="10" y="10" width="80" height="80" fill="#d32f2f"/>
            </svg>
        "##;

        let scene = extract_scene_from_svg(svg).unwrap();
        assert_eq!(scene.view, Rect::from_size(100.0, 100.0));
        assert_eq!(scene.shapes.len(), 1);

        let shape = &scene.shapes[0];
        assert_eq!(shape.contours.len(), 1);
        assert_eq!(shape.contours[0].len(), 4, "rect = 4 points");
        assert_eq!(shape.fill, (211, 47, 47));
        assert_eq!(shape.name.as_deref(), Some("sun"));
    }

    #[test]
    fn unfilled_shapes_are_skipped() {
        let svg = r#"
            <svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 100 100">
                <rect x="10" y="10" width="80" height="80" fill="none" stroke="black"/>
            </svg>
        "#;

        let scene = extract_scene_from_svg(svg).unwrap();
        assert!(scene.shapes.is_empty(), "stroke-only paths are not fillable");
    }

    #[test]
    fn subpaths_become_hole_contours() {
        let svg = r##"
            <svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 100 100">
                <path fill="#000" fill-rule="evenodd"
                      d="M0 0 H100 V100 H0 Z M30 30 H70 V70 H30 Z"/>
            </svg>
        "##;

        let scene = extract_scene_from_svg(svg).unwrap();
        assert_eq!(scene.shapes.len(), 1);
        let shape = &scene.shapes[0];
        assert_eq!(shape.contours.len(), 2);
        assert_eq!(shape.fill_rule, FillRule::EvenOdd);
        assert!(shape.contains(Point::new(10.0, 50.0)), "ring body");
        assert!(!shape.contains(Point::new(50.0, 50.0)), "hole");
    }

    #[test]
    fn transforms_are_applied() {
        let svg = r#"
            <svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 100 100">
                <g transform="translate(50 0)">
                    <rect x="0" y="0" width="10" height="10"/>
                </g>
            </svg>
        "#;

        let scene = extract_scene_from_svg(svg).unwrap();
        assert_eq!(scene.shapes.len(), 1);
        let bounds = scene.shapes[0].bounding_box().unwrap();
        assert!((bounds.min_x - 50.0).abs() < 1e-6);
        assert!((bounds.max_x - 60.0).abs() < 1e-6);
    }

    #[test]
    fn circle_flattens_to_many_points() {
        let svg = r#"
            <svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 100 100">
                <circle cx="50" cy="50" r="40" fill="black"/>
            </svg>
        "#;

        let scene = extract_scene_from_svg(svg).unwrap();
        assert_eq!(scene.shapes.len(), 1);
        assert!(
            scene.shapes[0].contours[0].len() > 20,
            "circle should flatten to many points, got {}",
            scene.shapes[0].contours[0].len()
        );
    }

    #[test]
    fn guide_path_parses_lines() {
        let points = parse_guide_path("M 10 10 L 90 10 L 90 90").unwrap();
        assert_eq!(points.len(), 3);
        assert_eq!(points[0], Point::new(10.0, 10.0));
        assert_eq!(points[2], Point::new(90.0, 90.0));
    }

    #[test]
    fn guide_path_handles_relative_and_close() {
        let points = parse_guide_path("m 10 10 l 20 0 v 10 z").unwrap();
        assert_eq!(points.len(), 4);
        assert_eq!(points[1], Point::new(30.0, 10.0));
        assert_eq!(points[2], Point::new(30.0, 20.0));
        assert_eq!(points[3], points[0], "close returns to the subpath start");
    }

    #[test]
    fn guide_path_flattens_curves() {
        let points = parse_guide_path("M 0 0 C 30 0 70 100 100 100").unwrap();
        assert!(points.len() > 5, "curve should flatten, got {}", points.len());
        assert_eq!(points[0], Point::new(0.0, 0.0));
        assert_eq!(points[points.len() - 1], Point::new(100.0, 100.0));
    }

    #[test]
    fn guide_path_reflects_smooth_controls() {
        let points = parse_guide_path("M 0 0 C 0 50 50 50 50 0 S 100 -50 100 0").unwrap();
        assert!(points.len() > 5);
        assert_eq!(points[points.len() - 1], Point::new(100.0, 0.0));
        // The reflected control pushes the second bow below the axis
        assert!(points.iter().any(|p| p.y < -1.0));
    }

    #[test]
    fn guide_path_approximates_arcs_with_lines() {
        let points = parse_guide_path("M 0 0 A 10 10 0 0 1 20 0 L 30 0").unwrap();
        assert_eq!(points.len(), 3, "arc contributes just its endpoint");
        assert_eq!(points[1], Point::new(20.0, 0.0));
    }

    #[test]
    fn guide_path_rejects_garbage() {
        assert!(matches!(
            parse_guide_path("M 10 zz"),
            Err(SvgError::GuidePath(_))
        ));
    }

    #[test]
    fn guide_single_point_is_too_short() {
        assert!(matches!(
            parse_guide_path("M 5 5"),
            Err(SvgError::GuideTooShort)
        ));
    }
}
