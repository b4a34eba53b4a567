//! Overlay fill: trace a guide curve through a shape.
//!
//! The guide is one long curve (an Archimedean spiral unless the caller
//! brings their own) centered over the shape or the view. The trace walks
//! it one resolution step at a time, keeping the parts where the pen
//! lands on the current shape and skipping the parts where it does not.
//! Entering the shape mid-flight first snaps to the nearest recorded
//! guide/shape intersection so strokes begin on the outline, not just
//! near it.

use std::f64::consts::TAU;
use std::mem;

use tracing::debug;

use crate::geometry::{bounds_of_points, Line, Point, Polyline, Rect};
use crate::shape::Shape;

/// Hard cap on generated spiral vertices, for pathological spacing.
const MAX_SPIRAL_POINTS: usize = 500_000;

/// The guide curve, positionable without rebuilding.
///
/// Sampling math lives on the untranslated base polyline; moving the
/// guide only swaps the offset. That keeps per-shape repositioning free
/// even for guides with hundreds of thousands of vertices.
#[derive(Debug, Clone)]
pub struct GuideCurve {
    base: Polyline,
    base_center: Point,
    offset: (f64, f64),
}

impl GuideCurve {
    /// Wrap a custom polyline as the guide.
    pub fn new(points: Vec<Point>) -> Self {
        let base_center = bounds_of_points(&points)
            .map(|b| b.center())
            .unwrap_or(Point::new(0.0, 0.0));
        Self {
            base: Polyline::new(points),
            base_center,
            offset: (0.0, 0.0),
        }
    }

    /// Archimedean spiral with `spacing` between arms, grown until it
    /// covers `max_radius` in every direction.
    pub fn spiral(spacing: f64, max_radius: f64) -> Self {
        // r = a * theta gives constant arm spacing of 2 * pi * a
        let a = spacing / TAU;
        let chord = (spacing * 0.5).max(0.5);

        let mut points = vec![Point::new(0.0, 0.0)];
        let mut theta: f64 = 0.0;
        loop {
            theta += (chord / (a * theta).max(1.0)).min(0.5);
            let r = a * theta;
            if r > max_radius || points.len() >= MAX_SPIRAL_POINTS {
                break;
            }
            points.push(Point::new(r * theta.cos(), r * theta.sin()));
        }
        GuideCurve::new(points)
    }

    #[inline]
    pub fn total_length(&self) -> f64 {
        self.base.total_length()
    }

    /// Sample the positioned guide at arc length `s`, clamped to its ends.
    pub fn point_at(&self, s: f64) -> Point {
        self.base.point_at(s).translated(self.offset.0, self.offset.1)
    }

    /// Move the guide so its bounding-box center sits on `center`.
    pub fn center_on(&mut self, center: Point) {
        self.offset = (center.x - self.base_center.x, center.y - self.base_center.y);
    }

    /// All crossings with a shape's outline, in guide traversal order.
    pub fn intersections(&self, shape: &Shape) -> Vec<Point> {
        let points = self.base.points();
        let mut hits = Vec::new();
        for w in points.windows(2) {
            let a = w[0].translated(self.offset.0, self.offset.1);
            let b = w[1].translated(self.offset.0, self.offset.1);
            for (x, y, _) in shape.line_intersections(Line::from_points(a, b)) {
                hits.push(Point::new(x, y));
            }
        }
        hits
    }
}

/// Why an overlay trace over one shape ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceEnd {
    /// Aligned mode sampled past the shape's bounding box.
    LeftBounds,
    /// Ran out of guide before running out of shape.
    GuideExhausted,
    /// Every recorded guide/shape crossing has been consumed.
    IntersectionsDepleted,
}

impl TraceEnd {
    fn describe(self) -> &'static str {
        match self {
            TraceEnd::LeftBounds => "left shape bounds",
            TraceEnd::GuideExhausted => "guide length exhausted",
            TraceEnd::IntersectionsDepleted => "intersections depleted",
        }
    }
}

/// One trace unit's outcome.
#[derive(Debug)]
pub enum TraceStep {
    Advanced,
    Done(TraceEnd),
}

/// Resumable per-shape trace state.
#[derive(Debug, Default)]
pub struct TraceCursor {
    /// Arc-length position along the guide.
    pub pos: f64,
    /// Whether the previous sample landed on the shape.
    pub last_good: bool,
    /// Unconsumed guide/shape crossings. `None` until the first unit
    /// positions the guide and computes them.
    pub hits: Option<Vec<Point>>,
    /// Stroke under construction.
    pub current: Vec<Point>,
}

impl TraceCursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Index of the topmost shape whose fill contains `p`, scanning the
/// stack front-to-back.
pub fn topmost_fill_hit(stack: &[Shape], p: Point) -> Option<usize> {
    stack
        .iter()
        .enumerate()
        .rev()
        .find(|(_, shape)| shape.contains(p))
        .map(|(i, _)| i)
}

/// Nearest unconsumed crossing to `p`, by straight-line distance.
fn nearest_hit(hits: &[Point], p: Point) -> Option<usize> {
    let mut best = f64::INFINITY;
    let mut found = None;
    for (i, hit) in hits.iter().enumerate() {
        let d = hit.distance(p);
        if d < best {
            best = d;
            found = Some(i);
        }
    }
    found
}

/// Perform one overlay trace unit for the shape at `shape_index`.
///
/// A unit samples the guide once, extends or breaks the running stroke,
/// then either advances the cursor or reports the shape done. When the
/// sample misses the shape and no end condition holds, the cursor probes
/// ahead along the guide until it lands on the shape again, so one unit
/// can consume a long off-shape stretch of guide.
///
/// Closed strokes are appended to `closed`; the caller owns shape
/// removal and stroke metadata.
#[allow(clippy::too_many_arguments)]
pub fn trace_step(
    cursor: &mut TraceCursor,
    guide: &mut GuideCurve,
    stack: &[Shape],
    shape_index: usize,
    shape_bounds: Rect,
    view: Rect,
    align_to_shape: bool,
    resolution: f64,
    closed: &mut Vec<Vec<Point>>,
) -> TraceStep {
    // First unit for this shape: position the guide and record crossings
    if cursor.hits.is_none() {
        let center = if align_to_shape {
            shape_bounds.center()
        } else {
            view.center()
        };
        guide.center_on(center);
        cursor.hits = Some(guide.intersections(&stack[shape_index]));
    }

    let mut test_point = guide.point_at(cursor.pos);
    let mut on_shape = topmost_fill_hit(stack, test_point) == Some(shape_index);

    let mut consumed = None;
    if on_shape {
        // Coming off a bad stretch: snap to the nearest crossing first,
        // so the stroke starts on the outline
        if !cursor.last_good && cursor.pos != 0.0 {
            if let Some(hits) = cursor.hits.as_ref() {
                if let Some(i) = nearest_hit(hits, test_point) {
                    cursor.current.push(hits[i]);
                    consumed = Some(i);
                }
            }
        }
        cursor.current.push(test_point);
        cursor.last_good = true;
    } else {
        // Obstructed: the running stroke (if any) is finished
        if cursor.current.len() >= 2 {
            closed.push(mem::take(&mut cursor.current));
        } else {
            cursor.current.clear();
        }
        cursor.last_good = false;
    }

    if let (Some(i), Some(hits)) = (consumed, cursor.hits.as_mut()) {
        hits.remove(i);
    }

    // End-of-shape checks, cheapest meaningful signal last
    let mut end = None;
    if align_to_shape && !shape_bounds.contains(test_point) {
        end = Some(TraceEnd::LeftBounds);
    }
    if end.is_none() && cursor.pos + resolution > guide.total_length() {
        end = Some(TraceEnd::GuideExhausted);
    }
    if end.is_none() && cursor.hits.as_ref().is_some_and(|h| h.is_empty()) {
        end = Some(TraceEnd::IntersectionsDepleted);
    }

    // Off the shape with no end in sight: probe ahead until the guide
    // re-enters the shape, then roll back one step
    if !on_shape && end.is_none() {
        while cursor.pos < guide.total_length() && !on_shape && end.is_none() {
            cursor.pos += resolution;
            test_point = guide.point_at(cursor.pos);
            on_shape = topmost_fill_hit(stack, test_point) == Some(shape_index);

            if align_to_shape && !shape_bounds.contains(test_point) {
                end = Some(TraceEnd::LeftBounds);
            }
        }
        if on_shape {
            cursor.pos -= resolution;
        }
    }

    match end {
        Some(end) => {
            if cursor.current.len() >= 2 {
                closed.push(mem::take(&mut cursor.current));
            }
            cursor.reset();
            debug!(reason = end.describe(), "overlay trace complete");
            TraceStep::Done(end)
        }
        None => {
            cursor.pos += resolution;
            TraceStep::Advanced
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
