//! Core geometry types for plotfill.
//!
//! Everything downstream of the SVG boundary works on flat polylines:
//! curves are flattened on the way in, so the engine only ever sees
//! straight segments.

/// A 2D point with x,y coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// A line segment defined by two endpoints.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Line {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

/// An axis-aligned rectangle. Used for view bounds and bounding boxes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Point {
    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Distance to another point.
    #[inline]
    pub fn distance(&self, other: Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// This point shifted by (dx, dy).
    #[inline]
    pub fn translated(&self, dx: f64, dy: f64) -> Point {
        Point::new(self.x + dx, self.y + dy)
    }
}

impl Line {
    #[inline]
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    #[inline]
    pub fn from_points(start: Point, end: Point) -> Self {
        Self::new(start.x, start.y, end.x, end.y)
    }

    /// Get the start point of the line.
    #[inline]
    pub fn start(&self) -> Point {
        Point::new(self.x1, self.y1)
    }

    /// Get the end point of the line.
    #[inline]
    pub fn end(&self) -> Point {
        Point::new(self.x2, self.y2)
    }

    /// Get the midpoint of the line.
    #[inline]
    pub fn midpoint(&self) -> Point {
        Point::new((self.x1 + self.x2) / 2.0, (self.y1 + self.y2) / 2.0)
    }

    /// Length of the line segment.
    #[inline]
    pub fn length(&self) -> f64 {
        self.start().distance(self.end())
    }

    /// The same segment with start and end swapped.
    #[inline]
    pub fn reversed(&self) -> Line {
        Line::new(self.x2, self.y2, self.x1, self.y1)
    }
}

impl Rect {
    #[inline]
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self { min_x, min_y, max_x, max_y }
    }

    /// A rectangle anchored at the origin, e.g. an SVG viewport.
    #[inline]
    pub fn from_size(width: f64, height: f64) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    #[inline]
    pub fn center(&self) -> Point {
        Point::new((self.min_x + self.max_x) / 2.0, (self.min_y + self.max_y) / 2.0)
    }

    /// Diagonal length of the rectangle.
    #[inline]
    pub fn diagonal(&self) -> f64 {
        let w = self.width();
        let h = self.height();
        (w * w + h * h).sqrt()
    }

    /// Point containment, boundary inclusive.
    #[inline]
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.y >= self.min_y && p.y <= self.max_y
    }

    /// Corner points in drawing order, suitable as a closed contour.
    pub fn corners(&self) -> [Point; 4] {
        [
            Point::new(self.min_x, self.min_y),
            Point::new(self.max_x, self.min_y),
            Point::new(self.max_x, self.max_y),
            Point::new(self.min_x, self.max_y),
        ]
    }
}

/// Bounding box of a point sequence, or `None` when empty.
pub fn bounds_of_points(points: &[Point]) -> Option<Rect> {
    if points.is_empty() {
        return None;
    }

    let min_x = points.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
    let min_y = points.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
    let max_x = points.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max);
    let max_y = points.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);

    Some(Rect::new(min_x, min_y, max_x, max_y))
}

// ============================================================================
// POLYLINE
// ============================================================================

/// A polyline with a precomputed arc-length table.
///
/// Both the scan-line sweep (bounding ellipse) and the overlay strategy
/// (guide curve) walk a path by distance rather than by vertex, so the
/// cumulative lengths are computed once up front and `point_at` becomes a
/// binary search plus one interpolation.
#[derive(Debug, Clone)]
pub struct Polyline {
    points: Vec<Point>,
    cums: Vec<f64>,
    total: f64,
}

impl Polyline {
    pub fn new(points: Vec<Point>) -> Self {
        let mut cums = Vec::with_capacity(points.len());
        let mut total = 0.0;
        for (i, p) in points.iter().enumerate() {
            if i > 0 {
                total += points[i - 1].distance(*p);
            }
            cums.push(total);
        }
        Self { points, cums, total }
    }

    #[inline]
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Total arc length of the polyline.
    #[inline]
    pub fn total_length(&self) -> f64 {
        self.total
    }

    /// Point at arc-length `s` from the start, clamped to both ends.
    pub fn point_at(&self, s: f64) -> Point {
        let Some(first) = self.points.first() else {
            return Point::new(0.0, 0.0);
        };
        if self.points.len() == 1 || s <= 0.0 {
            return *first;
        }
        if s >= self.total {
            return self.points[self.points.len() - 1];
        }

        // cums[i] <= s < cums[i + 1]
        let i = self.cums.partition_point(|&c| c <= s) - 1;
        let seg_len = self.cums[i + 1] - self.cums[i];
        if seg_len <= 0.0 {
            return self.points[i];
        }
        let t = (s - self.cums[i]) / seg_len;
        let a = self.points[i];
        let b = self.points[i + 1];
        Point::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t)
    }
}

// ============================================================================
// POLYLINE HELPERS
// ============================================================================

/// Simplify a polyline with Ramer-Douglas-Peucker.
///
/// Keeps the endpoints and every interior vertex that deviates from the
/// chord by more than `tolerance`.
pub fn simplify_polyline(points: &[Point], tolerance: f64) -> Vec<Point> {
    if points.len() < 3 {
        return points.to_vec();
    }

    let mut keep = vec![false; points.len()];
    keep[0] = true;
    keep[points.len() - 1] = true;

    // Explicit stack instead of recursion; ranges are (first, last) inclusive.
    let mut stack = vec![(0usize, points.len() - 1)];
    while let Some((first, last)) = stack.pop() {
        if last <= first + 1 {
            continue;
        }
        let mut max_dist = 0.0;
        let mut max_idx = first;
        for i in (first + 1)..last {
            let d = perpendicular_distance(points[i], points[first], points[last]);
            if d > max_dist {
                max_dist = d;
                max_idx = i;
            }
        }
        if max_dist > tolerance {
            keep[max_idx] = true;
            stack.push((first, max_idx));
            stack.push((max_idx, last));
        }
    }

    points
        .iter()
        .zip(keep.iter())
        .filter(|&(_, &k)| k)
        .map(|(p, _)| *p)
        .collect()
}

/// Distance from `p` to the segment `a..b`.
fn perpendicular_distance(p: Point, a: Point, b: Point) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len_sq = dx * dx + dy * dy;
    if len_sq <= 0.0 {
        return p.distance(a);
    }
    let t = ((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq;
    let t = t.clamp(0.0, 1.0);
    p.distance(Point::new(a.x + dx * t, a.y + dy * t))
}

/// Subdivide a polyline so no segment is longer than `max_segment`.
///
/// Analogue of flattening a smoothed path back to evenly dense vertices:
/// the shape is unchanged, only the vertex density goes up.
pub fn flatten_polyline(points: &[Point], max_segment: f64) -> Vec<Point> {
    if points.len() < 2 || max_segment <= 0.0 {
        return points.to_vec();
    }

    let mut out = Vec::with_capacity(points.len());
    out.push(points[0]);
    for w in points.windows(2) {
        let (a, b) = (w[0], w[1]);
        let len = a.distance(b);
        let pieces = (len / max_segment).ceil().max(1.0) as usize;
        for k in 1..=pieces {
            let t = k as f64 / pieces as f64;
            out.push(Point::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t));
        }
    }
    out
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_distance() {
        let p1 = Point::new(0.0, 0.0);
        let p2 = Point::new(3.0, 4.0);
        assert_eq!(p1.distance(p2), 5.0); // 3-4-5 triangle
    }

    #[test]
    fn line_endpoints_and_reverse() {
        let line = Line::new(1.0, 2.0, 3.0, 4.0);
        assert_eq!(line.start(), Point::new(1.0, 2.0));
        assert_eq!(line.end(), Point::new(3.0, 4.0));
        assert_eq!(line.reversed().start(), Point::new(3.0, 4.0));
        assert_eq!(line.midpoint(), Point::new(2.0, 3.0));
    }

    #[test]
    fn rect_contains_is_boundary_inclusive() {
        let r = Rect::from_size(10.0, 10.0);
        assert!(r.contains(Point::new(0.0, 0.0)));
        assert!(r.contains(Point::new(10.0, 10.0)));
        assert!(r.contains(Point::new(5.0, 5.0)));
        assert!(!r.contains(Point::new(10.1, 5.0)));
        assert!(!r.contains(Point::new(5.0, -0.1)));
    }

    #[test]
    fn rect_diagonal() {
        let r = Rect::from_size(3.0, 4.0);
        assert_eq!(r.diagonal(), 5.0);
        assert_eq!(r.center(), Point::new(1.5, 2.0));
    }

    #[test]
    fn polyline_point_at_interpolates() {
        let poly = Polyline::new(vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
        ]);
        assert_eq!(poly.total_length(), 20.0);
        assert_eq!(poly.point_at(5.0), Point::new(5.0, 0.0));
        assert_eq!(poly.point_at(15.0), Point::new(10.0, 5.0));
        // Exactly on a vertex
        assert_eq!(poly.point_at(10.0), Point::new(10.0, 0.0));
    }

    #[test]
    fn polyline_point_at_clamps() {
        let poly = Polyline::new(vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0)]);
        assert_eq!(poly.point_at(-5.0), Point::new(0.0, 0.0));
        assert_eq!(poly.point_at(999.0), Point::new(10.0, 0.0));
    }

    #[test]
    fn simplify_removes_collinear_points() {
        let pts = vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.001),
            Point::new(2.0, 0.0),
            Point::new(3.0, 0.002),
            Point::new(4.0, 0.0),
        ];
        let simplified = simplify_polyline(&pts, 0.1);
        assert_eq!(simplified.len(), 2, "near-collinear interior points should go");
        assert_eq!(simplified[0], pts[0]);
        assert_eq!(simplified[1], pts[4]);
    }

    #[test]
    fn simplify_keeps_corners() {
        let pts = vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
        ];
        let simplified = simplify_polyline(&pts, 0.5);
        assert_eq!(simplified.len(), 3, "a real corner must survive");
    }

    #[test]
    fn flatten_respects_max_segment() {
        let pts = vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0)];
        let flat = flatten_polyline(&pts, 3.0);
        assert!(flat.len() > 2);
        for w in flat.windows(2) {
            assert!(
                w[0].distance(w[1]) <= 3.0 + 1e-9,
                "segment longer than requested maximum"
            );
        }
        assert_eq!(flat[0], pts[0]);
        assert_eq!(flat[flat.len() - 1], pts[1]);
    }

    #[test]
    fn bounds_of_points_basic() {
        let pts = vec![
            Point::new(2.0, 3.0),
            Point::new(-1.0, 7.0),
            Point::new(5.0, 1.0),
        ];
        let b = bounds_of_points(&pts);
        assert_eq!(b, Some(Rect::new(-1.0, 1.0, 5.0, 7.0)));
        assert_eq!(bounds_of_points(&[]), None);
    }
}
