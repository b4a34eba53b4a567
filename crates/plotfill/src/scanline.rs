//! Scan-line sweep: parallel fill lines across a shape.
//!
//! The sweep walks a bounding ellipse, twice the shape's size, so every
//! angle gets full coverage without per-angle bounds math. The scan line
//! starts on the ellipse at the requested angle and translates straight
//! toward the opposite side, one spacing per iteration.

use crate::clamp::clamp_intersections;
use crate::geometry::{Line, Point, Polyline, Rect};
use crate::group::assign_group;
use crate::shape::Shape;

/// Vertex count for the sampled bounding ellipse.
const ELLIPSE_SAMPLES: usize = 720;

/// Precomputed sweep over one shape.
///
/// `line_at` is pure, so a resumed sweep only needs its index.
#[derive(Debug, Clone)]
pub struct ScanSweep {
    origin: Point,
    dir: (f64, f64),
    half_len: f64,
    step: (f64, f64),
    pub iterations: u32,
    pub index: u32,
}

impl ScanSweep {
    /// Build the sweep for a shape, or `None` for an empty shape.
    ///
    /// `angle_deg` is the direction of the scan lines themselves:
    /// 0 sweeps horizontal lines from top to bottom.
    pub fn new(shape: &Shape, angle_deg: f64, spacing: f64) -> Option<Self> {
        let bounds = shape.bounding_box()?;
        let (w, h) = (bounds.width(), bounds.height());

        // Radii equal to the full width/height put the ellipse at twice
        // the shape's extent, so scan lines begin and end clear of it.
        let ellipse = bound_ellipse(bounds.center(), w, h);
        let arc_per_degree = ellipse.total_length() / 360.0;

        let origin = ellipse.point_at(arc_per_degree * angle_deg);

        let mut dest_deg = angle_deg + 180.0;
        if dest_deg > 360.0 {
            dest_deg -= 360.0;
        }
        let dest = ellipse.point_at((dest_deg * arc_per_degree).min(ellipse.total_length()));

        let vx = dest.x - origin.x;
        let vy = dest.y - origin.y;
        let span = (vx * vx + vy * vy).sqrt();
        // A shape narrower than the spacing still gets one line
        let iterations = ((span / spacing) as u32).max(1);

        let rad = angle_deg.to_radians();
        Some(Self {
            origin,
            dir: (rad.cos(), rad.sin()),
            half_len: (w + h) / 2.0,
            step: (vx / iterations as f64, vy / iterations as f64),
            iterations,
            index: 0,
        })
    }

    /// Scan line for a given iteration, centered on the sweep axis.
    pub fn line_at(&self, index: u32) -> Line {
        let k = index as f64;
        let cx = self.origin.x + self.step.0 * k;
        let cy = self.origin.y + self.step.1 * k;
        Line::new(
            cx - self.dir.0 * self.half_len,
            cy - self.dir.1 * self.half_len,
            cx + self.dir.0 * self.half_len,
            cy + self.dir.1 * self.half_len,
        )
    }

    /// Scan line for the current iteration.
    #[inline]
    pub fn current_line(&self) -> Line {
        self.line_at(self.index)
    }

    /// Move to the next iteration. Returns `false` when the sweep is
    /// past its last line.
    #[inline]
    pub fn advance(&mut self) -> bool {
        self.index += 1;
        self.index < self.iterations
    }
}

/// Sampled bounding ellipse, starting at the top and winding clockwise
/// (top, right, bottom, left in screen coordinates). Closed: the last
/// vertex repeats the first so arc length covers the full perimeter.
fn bound_ellipse(center: Point, rx: f64, ry: f64) -> Polyline {
    let mut points = Vec::with_capacity(ELLIPSE_SAMPLES + 1);
    for i in 0..=ELLIPSE_SAMPLES {
        let theta = (i as f64 / ELLIPSE_SAMPLES as f64) * std::f64::consts::TAU;
        points.push(Point::new(
            center.x + rx * theta.sin(),
            center.y - ry * theta.cos(),
        ));
    }
    Polyline::new(points)
}

/// Run one sweep iteration: intersect, clamp, pair, group.
///
/// Crossings are paired in sorted order into inside segments. An odd
/// crossing count means the line grazed a vertex or edge; such lines are
/// skipped whole rather than half-paired.
pub fn generate_step(
    sweep: &ScanSweep,
    shape: &Shape,
    view: Rect,
    threshold: f64,
    groups: &mut Vec<Vec<Line>>,
) {
    let line = sweep.current_line();
    let raw = shape.line_intersections(line);
    let points = clamp_intersections(line, &raw, view);

    if points.len() % 2 != 0 {
        return;
    }

    for pair in points.chunks_exact(2) {
        let segment = Line::from_points(pair[0], pair[1]);
        let group_id = assign_group(segment.start(), groups, threshold);
        if group_id == groups.len() {
            groups.push(Vec::new());
        }
        groups[group_id].push(segment);
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Shape {
        Shape::from_rect(Rect::new(0.0, 0.0, 100.0, 100.0), (0, 0, 0))
    }

    #[test]
    fn sweep_spans_the_ellipse_diameter() {
        let shape = square();
        let sweep = ScanSweep::new(&shape, 0.0, 7.0).unwrap();
        // Ellipse radii are 100, so the sweep runs 200 units
        assert_eq!(sweep.iterations, (200.0_f64 / 7.0) as u32);
        let first = sweep.line_at(0);
        let last = sweep.line_at(sweep.iterations - 1);
        assert!(first.y1 < 0.0, "sweep starts above the shape");
        assert!(last.y1 > 100.0, "sweep ends below the shape");
    }

    #[test]
    fn angle_zero_gives_horizontal_lines_top_down() {
        let shape = square();
        let sweep = ScanSweep::new(&shape, 0.0, 10.0).unwrap();
        let line = sweep.line_at(0);
        assert!(
            (line.y1 - line.y2).abs() < 1e-9,
            "angle 0 must produce horizontal scan lines"
        );
        // Starts at the top of the ellipse: center (50,50) minus ry=100
        assert!((line.midpoint().y - -50.0).abs() < 1e-6);
        let later = sweep.line_at(10);
        assert!(later.y1 > line.y1, "sweep descends");
    }

    #[test]
    fn angle_ninety_gives_vertical_lines() {
        let shape = square();
        let sweep = ScanSweep::new(&shape, 90.0, 10.0).unwrap();
        let line = sweep.line_at(0);
        assert!(
            (line.x1 - line.x2).abs() < 1e-6,
            "angle 90 must produce vertical scan lines"
        );
    }

    #[test]
    fn scan_line_length_covers_the_shape() {
        let shape = square();
        let sweep = ScanSweep::new(&shape, 37.0, 10.0).unwrap();
        let line = sweep.line_at(sweep.iterations / 2);
        assert!((line.length() - 200.0).abs() < 1e-6, "w + h long");
    }

    #[test]
    fn tiny_shape_still_gets_one_iteration() {
        let shape = Shape::from_rect(Rect::new(0.0, 0.0, 2.0, 2.0), (0, 0, 0));
        let sweep = ScanSweep::new(&shape, 0.0, 13.0).unwrap();
        assert_eq!(sweep.iterations, 1);
        // advance() immediately reports the sweep done
        let mut sweep = sweep;
        assert!(!sweep.advance());
    }

    #[test]
    fn empty_shape_has_no_sweep() {
        let shape = Shape::new(vec![], crate::shape::FillRule::EvenOdd, (0, 0, 0));
        assert!(ScanSweep::new(&shape, 0.0, 13.0).is_none());
    }

    #[test]
    fn full_sweep_collects_interior_segments() {
        let shape = square();
        let view = Rect::from_size(300.0, 300.0);
        let mut sweep = ScanSweep::new(&shape, 0.0, 7.0).unwrap();
        let mut groups: Vec<Vec<Line>> = Vec::new();

        loop {
            generate_step(&sweep, &shape, view, 40.0, &mut groups);
            if !sweep.advance() {
                break;
            }
        }

        let total: usize = groups.iter().map(|g| g.len()).sum();
        assert!(total >= 12, "expected a dozen-plus chords, got {total}");
        // Horizontal sweep over a convex shape: consecutive starts are one
        // spacing apart, well under the threshold, so one group
        assert_eq!(groups.len(), 1);
        for segment in &groups[0] {
            assert!(segment.y1 >= -1e-6 && segment.y1 <= 100.0 + 1e-6);
            assert!(
                (segment.length() - 100.0).abs() < 1e-6,
                "chords of a square span its width"
            );
        }
    }

    #[test]
    fn view_clamping_flows_through_generate_step() {
        // Shape pokes out the right side of a narrow view
        let shape = Shape::from_rect(Rect::new(10.0, 10.0, 200.0, 20.0), (0, 0, 0));
        let view = Rect::from_size(100.0, 100.0);
        let mut sweep = ScanSweep::new(&shape, 0.0, 5.0).unwrap();
        let mut groups: Vec<Vec<Line>> = Vec::new();
        loop {
            generate_step(&sweep, &shape, view, 40.0, &mut groups);
            if !sweep.advance() {
                break;
            }
        }
        let mut seen = 0;
        for segment in groups.iter().flatten() {
            seen += 1;
            assert!(segment.x1 <= 100.0 + 1e-6 && segment.x2 <= 100.0 + 1e-6);
        }
        assert!(seen > 0, "some chords must survive clamping");
    }

    #[test]
    fn fully_outside_view_yields_nothing() {
        let shape = Shape::from_rect(Rect::new(300.0, 300.0, 400.0, 400.0), (0, 0, 0));
        let view = Rect::from_size(100.0, 100.0);
        let mut sweep = ScanSweep::new(&shape, 0.0, 10.0).unwrap();
        let mut groups: Vec<Vec<Line>> = Vec::new();
        loop {
            generate_step(&sweep, &shape, view, 40.0, &mut groups);
            if !sweep.advance() {
                break;
            }
        }
        assert!(groups.is_empty(), "nothing plottable outside the view");
    }

    #[test]
    fn odd_crossing_count_yields_no_segments() {
        // Scan segment ends inside the right prong of a U: three
        // crossings, which cannot pair into chords, so the line is
        // skipped whole.
        let u = Shape::new(
            vec![vec![
                Point::new(0.0, 0.0),
                Point::new(2.0, 0.0),
                Point::new(2.0, 6.0),
                Point::new(4.0, 6.0),
                Point::new(4.0, 0.0),
                Point::new(6.0, 0.0),
                Point::new(6.0, 10.0),
                Point::new(0.0, 10.0),
            ]],
            crate::shape::FillRule::EvenOdd,
            (0, 0, 0),
        );
        let sweep = ScanSweep {
            origin: Point::new(2.0, 3.0),
            dir: (1.0, 0.0),
            half_len: 3.0,
            step: (0.0, 0.0),
            iterations: 1,
            index: 0,
        };
        let mut groups: Vec<Vec<Line>> = Vec::new();
        generate_step(&sweep, &u, Rect::from_size(20.0, 20.0), 40.0, &mut groups);
        assert!(groups.is_empty(), "odd crossing counts must contribute nothing");
    }

    #[test]
    fn unit_circle_chords_peak_at_the_diameter() {
        // Radius-1 circle as a dense polygon, horizontal lines half a
        // unit apart landing exactly on the four cardinal vertices. The
        // equator line passes through two vertices and must still yield
        // one full-diameter chord; the tangent lines at top and bottom
        // graze a single vertex and must yield nothing.
        let center = Point::new(2.0, 2.0);
        let points = (0..720)
            .map(|i| {
                let theta = (i as f64 / 720.0) * std::f64::consts::TAU;
                Point::new(center.x + theta.sin(), center.y - theta.cos())
            })
            .collect();
        let circle = Shape::new(vec![points], crate::shape::FillRule::EvenOdd, (0, 0, 0));

        let mut sweep = ScanSweep {
            origin: Point::new(2.0, 1.0),
            dir: (1.0, 0.0),
            half_len: 2.0,
            step: (0.0, 0.5),
            iterations: 5,
            index: 0,
        };
        let mut groups: Vec<Vec<Line>> = Vec::new();
        loop {
            // Threshold under the spacing: every chord opens its own group
            generate_step(&sweep, &circle, Rect::from_size(10.0, 10.0), 0.4, &mut groups);
            if !sweep.advance() {
                break;
            }
        }

        assert_eq!(groups.len(), 3, "one group per non-grazing line");
        let lengths: Vec<f64> = groups
            .iter()
            .map(|g| {
                assert_eq!(g.len(), 1, "one chord per group");
                g[0].length()
            })
            .collect();
        assert!(
            lengths[0] < lengths[1] && lengths[1] > lengths[2],
            "chord lengths rise to the middle then fall: {lengths:?}"
        );
        assert!(
            (lengths[1] - 2.0).abs() < 1e-3,
            "peak chord should be the diameter, got {}",
            lengths[1]
        );
        assert!((lengths[0] - 3.0_f64.sqrt()).abs() < 1e-3);
        assert!((lengths[2] - 3.0_f64.sqrt()).abs() < 1e-3);
    }
}
