//! Filled shapes as the engine sees them.
//!
//! A shape is one or more closed contours plus the paint metadata that
//! decides how (and whether) it gets filled. Contours may describe holes;
//! the fill rule says which regions count as inked.

use crate::clip::{line_contour_intersections, point_in_polygon, winding_number};
use crate::geometry::{bounds_of_points, Line, Point, Rect};
use crate::palette::{snap_color, ColorId};

/// Crossings closer together than this collapse into one hit.
const COINCIDENT_HIT_EPSILON: f64 = 1e-9;

/// How overlapping contours combine into a filled region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillRule {
    EvenOdd,
    NonZero,
}

/// A closed filled region queued for fill generation.
#[derive(Debug, Clone)]
pub struct Shape {
    /// Closed contours; implicit edge from last point back to first.
    pub contours: Vec<Vec<Point>>,
    /// Fill rule the contours were authored under.
    pub fill_rule: FillRule,
    /// Current fill color. Raw from the SVG until staging snaps it.
    pub fill: (u8, u8, u8),
    /// Palette slot the fill snaps to. Stable across staging.
    pub color_id: ColorId,
    /// Element id from the source document, when present.
    pub name: Option<String>,
    /// Marked when this shape is the single requested fill target.
    pub target: bool,
    /// Set once occlusion subtraction has run over this shape.
    pub processed: bool,
}

impl Shape {
    /// Create a shape from contours and a raw fill color.
    pub fn new(contours: Vec<Vec<Point>>, fill_rule: FillRule, fill: (u8, u8, u8)) -> Self {
        Self {
            contours,
            fill_rule,
            fill,
            color_id: snap_color(fill),
            name: None,
            target: false,
            processed: false,
        }
    }

    /// Convenience constructor for an axis-aligned rectangle shape.
    pub fn from_rect(rect: Rect, fill: (u8, u8, u8)) -> Self {
        Self::new(vec![rect.corners().to_vec()], FillRule::NonZero, fill)
    }

    /// Same shape with a name attached.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Bounding box over all contours, or `None` for an empty shape.
    pub fn bounding_box(&self) -> Option<Rect> {
        let mut bounds: Option<Rect> = None;
        for contour in &self.contours {
            let Some(b) = bounds_of_points(contour) else {
                continue;
            };
            bounds = Some(match bounds {
                None => b,
                Some(acc) => Rect::new(
                    acc.min_x.min(b.min_x),
                    acc.min_y.min(b.min_y),
                    acc.max_x.max(b.max_x),
                    acc.max_y.max(b.max_y),
                ),
            });
        }
        bounds
    }

    /// Center of the bounding box.
    pub fn center(&self) -> Option<Point> {
        self.bounding_box().map(|b| b.center())
    }

    /// Point containment under this shape's fill rule.
    ///
    /// Even-odd XORs the per-contour ray casts; non-zero sums windings.
    /// Either way holes behave as holes.
    pub fn contains(&self, p: Point) -> bool {
        match self.fill_rule {
            FillRule::EvenOdd => {
                let mut inside = false;
                for contour in &self.contours {
                    if point_in_polygon(p.x, p.y, contour) {
                        inside = !inside;
                    }
                }
                inside
            }
            FillRule::NonZero => {
                let mut winding = 0;
                for contour in &self.contours {
                    winding += winding_number(p.x, p.y, contour);
                }
                winding != 0
            }
        }
    }

    /// All crossings of a line with this shape's contours, sorted along
    /// the line. A crossing exactly at a contour vertex counts once, not
    /// once per adjacent edge.
    pub fn line_intersections(&self, line: Line) -> Vec<(f64, f64, f64)> {
        let mut hits = Vec::new();
        for contour in &self.contours {
            hits.extend(line_contour_intersections(line, contour));
        }
        hits.sort_by(|a, b| a.2.total_cmp(&b.2));
        hits.dedup_by(|a, b| {
            (a.0 - b.0).abs() < COINCIDENT_HIT_EPSILON && (a.1 - b.1).abs() < COINCIDENT_HIT_EPSILON
        });
        hits
    }
}

// ============================================================================
// TESTS
// ============================================================================
