//! Point containment and line/contour intersection tests.
//!
//! This is the hot path: the scan-line sweep calls into here once per
//! candidate line, and the stroke joiner once per connector test.

use crate::geometry::{Line, Point};

// ============================================================================
// POINT IN CONTOUR
// ============================================================================

/// Test if a point is inside a contour using even-odd ray casting.
///
/// Casts a ray to the right and counts edge crossings.
/// Odd crossings = inside, even = outside.
#[inline]
pub fn point_in_polygon(px: f64, py: f64, contour: &[Point]) -> bool {
    let n = contour.len();
    if n < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = n - 1;

    for i in 0..n {
        let (xi, yi) = (contour[i].x, contour[i].y);
        let (xj, yj) = (contour[j].x, contour[j].y);

        if ((yi > py) != (yj > py)) && (px < (xj - xi) * (py - yi) / (yj - yi) + xi) {
            inside = !inside;
        }

        j = i;
    }

    inside
}

/// Winding number of a contour around a point.
///
/// Zero means outside under the non-zero fill rule. The sign follows the
/// contour direction, which callers generally do not care about.
pub fn winding_number(px: f64, py: f64, contour: &[Point]) -> i32 {
    let n = contour.len();
    if n < 3 {
        return 0;
    }

    let mut winding = 0;
    for i in 0..n {
        let a = contour[i];
        let b = contour[(i + 1) % n];

        if a.y <= py {
            if b.y > py && edge_side(a, b, px, py) > 0.0 {
                winding += 1;
            }
        } else if b.y <= py && edge_side(a, b, px, py) < 0.0 {
            winding -= 1;
        }
    }
    winding
}

/// Cross product test: positive when (px, py) is left of the edge a->b.
#[inline]
fn edge_side(a: Point, b: Point, px: f64, py: f64) -> f64 {
    (b.x - a.x) * (py - a.y) - (px - a.x) * (b.y - a.y)
}

// ============================================================================
// LINE-LINE INTERSECTION
// ============================================================================

/// Result of a line-line intersection test.
#[derive(Debug, Clone, Copy)]
pub enum Intersection {
    None,
    Point { x: f64, y: f64, t: f64 },
}

/// Find the intersection point between two line segments.
///
/// `t` is the parameter along the first segment (0 at its start, 1 at its
/// end). Parallel and near-parallel pairs report no intersection.
#[inline]
pub fn line_segment_intersection(
    x1: f64, y1: f64, x2: f64, y2: f64,
    x3: f64, y3: f64, x4: f64, y4: f64,
) -> Intersection {
    let denom = (y4 - y3) * (x2 - x1) - (x4 - x3) * (y2 - y1);

    // Parallel or coincident lines
    if denom.abs() < 1e-10 {
        return Intersection::None;
    }

    let ua = ((x4 - x3) * (y1 - y3) - (y4 - y3) * (x1 - x3)) / denom;
    let ub = ((x2 - x1) * (y1 - y3) - (y2 - y1) * (x1 - x3)) / denom;

    if (0.0..=1.0).contains(&ua) && (0.0..=1.0).contains(&ub) {
        let ix = x1 + ua * (x2 - x1);
        let iy = y1 + ua * (y2 - y1);
        Intersection::Point { x: ix, y: iy, t: ua }
    } else {
        Intersection::None
    }
}

// ============================================================================
// LINE-CONTOUR INTERSECTIONS
// ============================================================================

/// Find all intersections between a line segment and a closed contour.
///
/// Returns `(x, y, t)` tuples sorted by `t` along the line, so the caller
/// sees crossings in traversal order. The contour is treated as closed
/// whether or not its last point repeats the first.
pub fn line_contour_intersections(line: Line, contour: &[Point]) -> Vec<(f64, f64, f64)> {
    let n = contour.len();
    if n < 3 {
        return Vec::new();
    }

    let mut intersections = Vec::with_capacity(n / 2);

    for i in 0..n {
        let j = (i + 1) % n;
        let a = contour[i];
        let b = contour[j];

        if let Intersection::Point { x, y, t } = line_segment_intersection(
            line.x1, line.y1, line.x2, line.y2,
            a.x, a.y, b.x, b.y,
        ) {
            intersections.push((x, y, t));
        }
    }

    intersections.sort_by(|a, b| a.2.total_cmp(&b.2));

    intersections
}

// ============================================================================
// TESTS
// ============================================================================
