//! # plotfill
//!
//! Fill engine for pen plotters: turns closed, filled shapes into
//! toolpath strokes a plotter can draw.
//!
//! The pipeline: parse a document into [`shape::Shape`]s, stage them
//! (palette snapping, occlusion subtraction), then run a [`job::FillJob`]
//! one frame-sized [`job::FillJob::step`] at a time. Scan-line modes
//! sweep chords across each shape and join them into continuous strokes;
//! overlay mode traces a guide curve (a spiral by default) clipped to the
//! shape.

pub mod clamp;
pub mod clip;
pub mod geometry;
pub mod group;
pub mod job;
pub mod overlay;
pub mod palette;
pub mod rng;
pub mod scanline;
pub mod settings;
pub mod shape;
pub mod stage;
pub mod svg;

// Re-export common types at crate root for convenience.
pub use geometry::{Line, Point, Rect};
pub use job::{FillJob, Progress, StepStatus, TraceStroke};
pub use palette::ColorId;
pub use settings::{FillMode, FillSettings};
pub use shape::{FillRule, Shape};
pub use stage::stage_shapes;
pub use svg::{extract_scene_from_svg, parse_guide_path, Scene, SvgError};
