//! Shape staging: the one-time pass from document shapes to a fill stack.
//!
//! Staging clones the scene, marks the requested target, snaps every fill
//! to the pen palette, and (when occlusion checking is on) subtracts each
//! shape's later siblings from it so hidden regions never get inked. The
//! stack keeps document order: index 0 is the bottom of the paint order.
//!
//! White shapes stay in the stack. They are skipped lazily when their
//! turn comes up, which keeps fill progress honest about the document.

use i_overlay::core::fill_rule::FillRule as OverlayFillRule;
use i_overlay::core::overlay_rule::OverlayRule;
use i_overlay::float::single::SingleFloatOverlay;
use tracing::debug;

use crate::geometry::Point;
use crate::palette::snap_color;
use crate::settings::FillSettings;
use crate::shape::{FillRule, Shape};

fn to_boolean_shape(contours: &[Vec<Point>]) -> Vec<Vec<[f64; 2]>> {
    contours
        .iter()
        .map(|c| c.iter().map(|p| [p.x, p.y]).collect())
        .collect()
}

fn from_boolean_shapes(shapes: Vec<Vec<Vec<[f64; 2]>>>) -> Vec<Vec<Point>> {
    shapes
        .into_iter()
        .flatten()
        .map(|c| c.into_iter().map(|[x, y]| Point::new(x, y)).collect())
        .collect()
}

fn boolean_fill_rule(rule: FillRule) -> OverlayFillRule {
    match rule {
        FillRule::EvenOdd => OverlayFillRule::EvenOdd,
        FillRule::NonZero => OverlayFillRule::NonZero,
    }
}

/// Build the working stack a fill job consumes.
///
/// The source shapes are never modified; the job owns its copies because
/// filling removes shapes as they complete. Color snapping happens before
/// any subtraction so a clipped shape keeps the pen its author picked.
pub fn stage_shapes(source: &[Shape], settings: &FillSettings) -> Vec<Shape> {
    let mut stack: Vec<Shape> = source.to_vec();

    for shape in &mut stack {
        shape.target = match (&settings.target, &shape.name) {
            (Some(want), Some(name)) => want == name,
            _ => false,
        };
        shape.color_id = snap_color(shape.fill);
        shape.fill = shape.color_id.rgb();
    }

    if settings.check_occlusion {
        for src in 0..stack.len() {
            let mut result = vec![to_boolean_shape(&stack[src].contours)];
            let rule = boolean_fill_rule(stack[src].fill_rule);
            let mut cut = false;
            for clip in stack.iter().skip(src + 1) {
                if clip.contours.is_empty() {
                    continue;
                }
                result = result.overlay(
                    &vec![to_boolean_shape(&clip.contours)],
                    OverlayRule::Difference,
                    rule,
                );
                cut = true;
                if result.is_empty() {
                    break;
                }
            }
            if cut {
                // Boolean output comes back as clean even-odd contours
                stack[src].contours = from_boolean_shapes(result);
                stack[src].fill_rule = FillRule::EvenOdd;
            }
            stack[src].processed = true;
        }
    } else {
        for shape in &mut stack {
            shape.processed = true;
        }
    }

    debug!(
        shapes = stack.len(),
        occlusion = settings.check_occlusion,
        "staged fill stack"
    );
    stack
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;

    fn square(min: f64, size: f64, fill: (u8, u8, u8)) -> Shape {
        Shape::from_rect(Rect::new(min, min, min + size, min + size), fill)
    }

    #[test]
    fn fills_snap_to_the_pen_palette() {
        let source = vec![square(0.0, 10.0, (10, 10, 10))];
        let staged = stage_shapes(&source, &FillSettings::default());
        assert_eq!(staged[0].fill, (0, 0, 0), "near-black snaps to black");
        assert_eq!(staged[0].color_id.label(), "color0");
        // The source is left as authored
        assert_eq!(source[0].fill, (10, 10, 10));
    }

    #[test]
    fn target_marking_follows_the_name() {
        let source = vec![
            square(0.0, 10.0, (0, 0, 0)).with_name("sea"),
            square(20.0, 10.0, (0, 0, 0)).with_name("sun"),
            square(40.0, 10.0, (0, 0, 0)),
        ];
        let settings = FillSettings {
            target: Some("sun".into()),
            ..FillSettings::default()
        };
        let staged = stage_shapes(&source, &settings);
        assert!(!staged[0].target);
        assert!(staged[1].target);
        assert!(!staged[2].target);

        let staged = stage_shapes(&source, &FillSettings::default());
        assert!(staged.iter().all(|s| !s.target), "no target requested");
    }

    #[test]
    fn later_shapes_cut_into_earlier_ones() {
        let below = Shape::from_rect(Rect::new(0.0, 0.0, 100.0, 100.0), (0, 0, 0));
        let above = Shape::from_rect(Rect::new(50.0, 50.0, 150.0, 150.0), (211, 47, 47));
        let staged = stage_shapes(&[below, above], &FillSettings::default());

        // The overlapped quadrant now belongs to the upper shape only
        assert!(!staged[0].contains(Point::new(75.0, 75.0)));
        assert!(staged[0].contains(Point::new(25.0, 25.0)));
        assert!(staged[0].contains(Point::new(75.0, 25.0)));
        assert!(staged[1].contains(Point::new(75.0, 75.0)));

        assert_eq!(staged[0].fill_rule, FillRule::EvenOdd);
        // Topmost shape had nothing to subtract
        assert_eq!(staged[1].fill_rule, FillRule::NonZero);
        assert!(staged.iter().all(|s| s.processed));
    }

    #[test]
    fn fully_occluded_shape_loses_its_outline() {
        let below = square(20.0, 20.0, (0, 0, 0));
        let above = Shape::from_rect(Rect::new(0.0, 0.0, 100.0, 100.0), (0, 0, 0));
        let staged = stage_shapes(&[below, above], &FillSettings::default());
        assert_eq!(staged.len(), 2, "occluded shapes stay in the stack");
        assert!(staged[0].bounding_box().is_none());
    }

    #[test]
    fn occlusion_off_leaves_outlines_alone() {
        let below = Shape::from_rect(Rect::new(0.0, 0.0, 100.0, 100.0), (0, 0, 0));
        let above = Shape::from_rect(Rect::new(50.0, 50.0, 150.0, 150.0), (0, 0, 0));
        let settings = FillSettings {
            check_occlusion: false,
            ..FillSettings::default()
        };
        let staged = stage_shapes(&[below, above], &settings);
        assert!(staged[0].contains(Point::new(75.0, 75.0)));
        assert_eq!(staged[0].fill_rule, FillRule::NonZero);
        assert!(staged.iter().all(|s| s.processed));
    }

    #[test]
    fn white_shapes_stay_in_the_stack() {
        let source = vec![
            square(0.0, 10.0, (254, 254, 254)),
            square(20.0, 10.0, (0, 0, 0)),
        ];
        let staged = stage_shapes(&source, &FillSettings::default());
        assert_eq!(staged.len(), 2);
        assert!(staged[0].color_id.is_paper());
        assert!(!staged[1].color_id.is_paper());
    }
}
