//! Segment grouping and stroke joining.
//!
//! The scan-line sweep emits short segments in sweep order. Grouping
//! buckets them by proximity so separate lobes of a concave shape become
//! separate buckets; joining then walks each bucket and stitches
//! neighboring segments into continuous pen strokes wherever the
//! connecting move stays on inked ground.

use std::mem;

use crate::geometry::{Line, Point};
use crate::shape::Shape;

/// Simplification tolerance for smoothed strokes, in document units.
const SMOOTH_TOLERANCE: f64 = 2.5;

/// A connector crossing more than this many contour edges is rejected.
const MAX_CONNECTOR_CROSSINGS: usize = 3;

/// Pick the group for a segment starting at `point`.
///
/// Compares against the start of each group's most recent segment and
/// takes the closest one under `threshold`. No group close enough means
/// the returned index is one past the end: the caller starts a new group
/// there. Distances exactly at the threshold do not match.
pub fn assign_group(point: Point, groups: &[Vec<Line>], threshold: f64) -> usize {
    let mut best = threshold;
    let mut found = None;
    for (i, group) in groups.iter().enumerate() {
        let Some(last) = group.last() else {
            continue;
        };
        let d = last.start().distance(point);
        if d < best {
            best = d;
            found = Some(i);
        }
    }
    found.unwrap_or(groups.len())
}

/// Incremental stroke joiner over grouped segments.
///
/// One `step()` call does one unit of work: entering a group closes the
/// running stroke and seeds a new one from that group's first segment,
/// then each unit stitches the next segment onto the stroke. Closed
/// strokes land in the caller's buffer as they finish, so a host can
/// display them mid-job.
#[derive(Debug)]
pub struct Joiner {
    groups: Vec<Vec<Line>>,
    group: usize,
    member: usize,
    current: Vec<Point>,
}

impl Joiner {
    pub fn new(groups: Vec<Vec<Line>>) -> Self {
        Self {
            groups,
            group: 0,
            member: 0,
            current: Vec::new(),
        }
    }

    /// Perform one join unit. Returns `false` once every group is
    /// consumed; the final stroke is closed before that last return.
    ///
    /// `reverse_before_join` flips a segment end-for-end when its far end
    /// is closer to the pen. `smooth_resolution` enables simplify and
    /// re-flatten on every stroke close.
    pub fn step(
        &mut self,
        shape: &Shape,
        reverse_before_join: bool,
        smooth_resolution: Option<f64>,
        closed: &mut Vec<Vec<Point>>,
    ) -> bool {
        if self.groups.is_empty() {
            self.close_current(smooth_resolution, closed);
            return false;
        }

        if self.member == 0 {
            // Entering a group: the running stroke (if any) is done
            self.close_current(smooth_resolution, closed);
            let seed = self.groups[self.group][0];
            self.current.push(seed.start());
            self.current.push(seed.end());
            self.member = 1;
        }

        if let Some(&segment) = self.groups[self.group].get(self.member) {
            // current is never empty here; it was seeded above
            let pen = self.current[self.current.len() - 1];
            let connector = Line::from_points(pen, segment.start());
            let crossings = shape.line_intersections(connector).len();

            if !shape.contains(connector.midpoint()) || crossings > MAX_CONNECTOR_CROSSINGS {
                // Connector would leave the ink; break the stroke here
                self.close_current(smooth_resolution, closed);
                self.current.push(segment.start());
                self.current.push(segment.end());
            } else {
                let segment = if reverse_before_join
                    && pen.distance(segment.start()) > pen.distance(segment.end())
                {
                    segment.reversed()
                } else {
                    segment
                };
                self.current.push(segment.start());
                self.current.push(segment.end());
            }
        }

        self.member += 1;
        if self.member >= self.groups[self.group].len() {
            self.member = 0;
            self.group += 1;
            if self.group >= self.groups.len() {
                self.close_current(smooth_resolution, closed);
                return false;
            }
        }
        true
    }

    /// Close the running stroke into the output buffer.
    fn close_current(&mut self, smooth_resolution: Option<f64>, closed: &mut Vec<Vec<Point>>) {
        if self.current.is_empty() {
            return;
        }
        let mut stroke = mem::take(&mut self.current);
        if let Some(resolution) = smooth_resolution {
            stroke = crate::geometry::flatten_polyline(
                &crate::geometry::simplify_polyline(&stroke, SMOOTH_TOLERANCE),
                resolution,
            );
        }
        if stroke.len() >= 2 {
            closed.push(stroke);
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
