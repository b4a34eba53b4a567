//! View boundary clamping for scan-line crossings.
//!
//! Shapes may hang off the edge of the document. Crossings that land
//! outside the view are pulled back to where the scan line meets the view
//! boundary, so fills stay plottable without distorting in-bounds work.

use crate::clip::line_contour_intersections;
use crate::geometry::{Line, Point, Rect};

/// Clamp raw `(x, y, t)` crossings of one scan line to the view.
///
/// In-bounds crossings pass through untouched. An out-of-bounds crossing
/// moves to the nearest point where the scan line crosses the view
/// boundary; when the scan line misses the view entirely, the crossing is
/// dropped. Input order is preserved.
pub fn clamp_intersections(line: Line, raw: &[(f64, f64, f64)], view: Rect) -> Vec<Point> {
    let corners = view.corners();
    let boundary_hits = line_contour_intersections(line, &corners);

    let mut out = Vec::with_capacity(raw.len());
    for &(x, y, _) in raw {
        let p = Point::new(x, y);
        if view.contains(p) {
            out.push(p);
            continue;
        }
        if boundary_hits.is_empty() {
            // Scan line never enters the view; nowhere sane to clamp to
            continue;
        }

        let mut best = f64::INFINITY;
        let mut clamped = p;
        for &(bx, by, _) in &boundary_hits {
            let candidate = Point::new(bx, by);
            let d = p.distance(candidate);
            if d < best {
                best = d;
                clamped = candidate;
            }
        }
        out.push(clamped);
    }
    out
}

// ============================================================================
// TESTS
// ============================================================================
