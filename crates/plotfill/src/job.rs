//! The fill job: a resumable state machine over a stack of shapes.
//!
//! Filling a whole document can take far longer than anyone wants to
//! block for, so the job never runs to completion on its own. Each call
//! to [`FillJob::step`] performs a bounded number of work units and
//! returns; the caller decides the cadence, whether that is once per UI
//! frame or a tight loop in a batch tool.
//!
//! A unit is deliberately small: select (or skip) one shape, generate
//! one scan line, join one segment, or sample the guide curve once. Work
//! in progress lives entirely inside the current phase value, so a job
//! can be dropped mid-fill without cleanup.

use std::mem;

use tracing::{debug, trace};

use crate::geometry::{Line, Point, Rect};
use crate::group::Joiner;
use crate::overlay::{trace_step, GuideCurve, TraceCursor, TraceStep};
use crate::palette::ColorId;
use crate::rng::Rng;
use crate::scanline::{generate_step, ScanSweep};
use crate::settings::FillSettings;
use crate::shape::Shape;
use crate::stage::stage_shapes;

/// What a call to [`FillJob::step`] left behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    /// More work remains; call `step` again.
    Running,
    /// Every shape is done (or the job was stopped). Further calls are
    /// no-ops.
    Complete,
}

/// Progress snapshot, suitable for a status line or a progress bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// 1-based shape currently being filled, clamped to the total.
    pub current_shape: u32,
    /// Shapes this job set out to fill.
    pub total_shapes: u32,
    /// Phase completions so far, across all passes.
    pub steps: u32,
    /// Upper bound on `steps` at completion: scan shapes complete two
    /// phases each, overlay shapes one, and hatching doubles the pass
    /// count.
    pub expected_steps: u32,
}

/// One finished pen stroke, in document coordinates.
#[derive(Debug, Clone)]
pub struct TraceStroke {
    pub points: Vec<Point>,
    /// Palette color, already snapped.
    pub color: (u8, u8, u8),
    pub color_id: ColorId,
    /// Name of the source shape, when it had one.
    pub name: Option<String>,
    /// Pen width, straight from the settings.
    pub width: f64,
}

/// Where the job is inside the current shape.
enum Phase {
    /// Looking at the active end of the stack for the next shape.
    Select,
    /// Sweeping scan lines across the current shape.
    Scan {
        sweep: ScanSweep,
        groups: Vec<Vec<Line>>,
    },
    /// Joining the swept segments into strokes.
    Join { joiner: Joiner },
    /// Walking the guide curve over the current shape.
    Overlay { cursor: TraceCursor, bounds: Rect },
    /// Nothing left to do.
    Done,
}

/// What shape selection found.
enum Selected {
    /// The stack is exhausted for this pass.
    Empty,
    /// One shape was discarded; the unit is spent.
    Skipped,
    /// A shape was entered and its fill phase is set up.
    Entered,
}

/// A cooperative fill over one document.
///
/// ```
/// use plotfill::geometry::Rect;
/// use plotfill::job::{FillJob, StepStatus};
/// use plotfill::settings::FillSettings;
/// use plotfill::shape::Shape;
///
/// let shape = Shape::from_rect(Rect::new(20.0, 20.0, 80.0, 80.0), (0, 0, 0));
/// let mut job = FillJob::new(FillSettings::default());
/// job.start(vec![shape], Rect::from_size(100.0, 100.0));
/// while job.step() == StepStatus::Running {}
/// assert!(!job.strokes().is_empty());
/// ```
pub struct FillJob {
    settings: FillSettings,
    /// Shapes as handed to `start`, kept for the hatch re-pass.
    source: Vec<Shape>,
    /// Working stack; shapes are removed as they complete.
    stack: Vec<Shape>,
    guide: Option<GuideCurve>,
    view: Rect,
    phase: Phase,
    running: bool,
    strokes: Vec<TraceStroke>,
    rng: Rng,
    /// Extra rotation applied to every shape angle; 90 on the hatch pass.
    pass_angle: f64,
    hatch_pending: bool,
    total_shapes: u32,
    current_shape: u32,
    steps: u32,
}

impl FillJob {
    pub fn new(settings: FillSettings) -> Self {
        let settings = settings.normalized();
        let rng = Rng::new(settings.random_seed);
        Self {
            settings,
            source: Vec::new(),
            stack: Vec::new(),
            guide: None,
            view: Rect::from_size(0.0, 0.0),
            phase: Phase::Done,
            running: false,
            strokes: Vec::new(),
            rng,
            pass_angle: 0.0,
            hatch_pending: false,
            total_shapes: 0,
            current_shape: 1,
            steps: 0,
        }
    }

    pub fn settings(&self) -> &FillSettings {
        &self.settings
    }

    /// Begin filling `source` clipped to `view`. Any previous run's
    /// strokes and progress are discarded.
    pub fn start(&mut self, source: Vec<Shape>, view: Rect) {
        self.source = source;
        self.view = view;
        self.strokes.clear();
        self.steps = 0;
        self.pass_angle = 0.0;
        self.hatch_pending = self.settings.hatch;
        self.rng = Rng::new(self.settings.random_seed);
        self.guide = self
            .settings
            .mode
            .is_overlay()
            .then(|| build_guide(&self.settings, view));
        self.begin_pass();
        self.total_shapes = if self.settings.target.is_some() {
            1
        } else {
            self.stack.len() as u32
        };
        self.running = true;
        debug!(
            shapes = self.stack.len(),
            mode = self.settings.mode.name(),
            "fill job started"
        );
    }

    /// Perform up to one budget's worth of work units.
    pub fn step(&mut self) -> StepStatus {
        if !self.running {
            return StepStatus::Complete;
        }
        for _ in 0..self.settings.step_budget {
            self.advance_once(0);
            if !self.running {
                break;
            }
        }
        if self.running {
            StepStatus::Running
        } else {
            StepStatus::Complete
        }
    }

    /// Abandon the job. Closed strokes are kept; the stroke in flight and
    /// all progress counters are discarded.
    pub fn stop(&mut self) {
        self.running = false;
        self.phase = Phase::Done;
        self.stack.clear();
        self.guide = None;
        self.total_shapes = 0;
        self.current_shape = 1;
        self.steps = 0;
        debug!(strokes = self.strokes.len(), "fill job stopped");
    }

    pub fn is_complete(&self) -> bool {
        !self.running
    }

    pub fn progress(&self) -> Progress {
        let per_shape = if self.settings.mode.is_overlay() { 1 } else { 2 };
        let passes = if self.settings.hatch { 2 } else { 1 };
        Progress {
            current_shape: self.current_shape.min(self.total_shapes),
            total_shapes: self.total_shapes,
            steps: self.steps,
            expected_steps: self.total_shapes * per_shape * passes,
        }
    }

    /// Strokes closed so far. Grows as the job runs; never shrinks.
    pub fn strokes(&self) -> &[TraceStroke] {
        &self.strokes
    }

    pub fn into_strokes(self) -> Vec<TraceStroke> {
        self.strokes
    }

    /// (Re)build the working stack for a pass.
    fn begin_pass(&mut self) {
        self.stack = stage_shapes(&self.source, &self.settings);
        self.current_shape = 1;
        self.phase = Phase::Select;
    }

    /// The end of the stack work happens at. Overlay without occlusion
    /// checking fills front-to-back so upper shapes win overlaps; every
    /// other combination fills in document order. Callers ensure the
    /// stack is non-empty.
    fn active_index(&self) -> usize {
        if self.settings.mode.is_overlay() && !self.settings.check_occlusion {
            self.stack.len() - 1
        } else {
            0
        }
    }

    /// One work unit. `depth` guards the select-then-work recursion:
    /// entering a shape immediately performs its first fill unit, so a
    /// skip-heavy document still makes fill progress every frame.
    fn advance_once(&mut self, depth: u8) {
        match mem::replace(&mut self.phase, Phase::Select) {
            Phase::Select => match self.select_shape() {
                Selected::Empty => self.finish_pass(),
                Selected::Skipped => {
                    self.phase = Phase::Select;
                }
                Selected::Entered => {
                    if depth == 0 {
                        self.advance_once(depth + 1);
                    }
                }
            },
            Phase::Scan { mut sweep, mut groups } => {
                let idx = self.active_index();
                generate_step(
                    &sweep,
                    &self.stack[idx],
                    self.view,
                    self.settings.threshold,
                    &mut groups,
                );
                if sweep.advance() {
                    self.phase = Phase::Scan { sweep, groups };
                } else {
                    self.steps += 1;
                    trace!(groups = groups.len(), "sweep complete, joining");
                    self.phase = Phase::Join {
                        joiner: Joiner::new(groups),
                    };
                }
            }
            Phase::Join { mut joiner } => {
                let idx = self.active_index();
                let mut closed = Vec::new();
                let more = joiner.step(
                    &self.stack[idx],
                    self.settings.mode.reverses_before_join(),
                    self.settings
                        .mode
                        .smooths_on_close()
                        .then_some(self.settings.flatten_resolution),
                    &mut closed,
                );
                self.emit_strokes(idx, closed);
                if more {
                    self.phase = Phase::Join { joiner };
                } else {
                    self.finish_shape(idx);
                }
            }
            Phase::Overlay { mut cursor, bounds } => {
                let idx = self.active_index();
                let Some(guide) = self.guide.as_mut() else {
                    self.finish_shape(idx);
                    return;
                };
                let mut closed = Vec::new();
                let outcome = trace_step(
                    &mut cursor,
                    guide,
                    &self.stack,
                    idx,
                    bounds,
                    self.view,
                    self.settings.align_guide_to_shape,
                    self.settings.flatten_resolution,
                    &mut closed,
                );
                self.emit_strokes(idx, closed);
                match outcome {
                    TraceStep::Advanced => self.phase = Phase::Overlay { cursor, bounds },
                    TraceStep::Done(_) => self.finish_shape(idx),
                }
            }
            Phase::Done => {
                self.phase = Phase::Done;
            }
        }
    }

    /// Look at the active shape and either discard it or enter its fill
    /// phase. Returns [`Selected::Empty`] without touching the phase when
    /// the stack has run dry.
    fn select_shape(&mut self) -> Selected {
        if self.stack.is_empty() {
            return Selected::Empty;
        }
        let idx = self.active_index();

        let inspection = {
            let shape = &self.stack[idx];
            if shape.color_id.is_paper() {
                Err("paper-white fill")
            } else if self.settings.target.is_some() && !shape.target {
                Err("not the requested target")
            } else {
                match shape.bounding_box() {
                    None => Err("no outline"),
                    Some(b) if b.width() == 0.0 || b.height() == 0.0 => Err("degenerate outline"),
                    Some(b) => Ok(b),
                }
            }
        };

        let bounds = match inspection {
            Err(reason) => {
                debug!(shape = idx, reason, "skipping shape");
                self.stack.remove(idx);
                return Selected::Skipped;
            }
            Ok(bounds) => bounds,
        };

        if self.settings.mode.is_overlay() {
            self.phase = Phase::Overlay {
                cursor: TraceCursor::new(),
                bounds,
            };
            debug!(shape = idx, "tracing guide over shape");
            return Selected::Entered;
        }

        let angle = self.pick_angle();
        match ScanSweep::new(&self.stack[idx], angle, self.settings.spacing) {
            Some(sweep) => {
                debug!(shape = idx, angle, lines = sweep.iterations, "sweeping shape");
                self.phase = Phase::Scan {
                    sweep,
                    groups: Vec::new(),
                };
                Selected::Entered
            }
            None => {
                self.stack.remove(idx);
                Selected::Skipped
            }
        }
    }

    /// Scan direction for the shape about to be entered.
    fn pick_angle(&mut self) -> f64 {
        let base = if self.settings.randomize_angle {
            (self.rng.next_f64() * 179.0).ceil()
        } else {
            self.settings.angle
        };
        (base + self.pass_angle).rem_euclid(360.0)
    }

    /// Retire a finished shape and go looking for the next one.
    fn finish_shape(&mut self, idx: usize) {
        self.stack.remove(idx);
        self.steps += 1;
        if self.current_shape != self.total_shapes {
            self.current_shape += 1;
        }
        debug!(remaining = self.stack.len(), "shape complete");
        self.phase = Phase::Select;
    }

    /// The stack ran dry: either flip into the hatch pass or finish.
    fn finish_pass(&mut self) {
        if self.hatch_pending && self.total_shapes > 0 {
            self.hatch_pending = false;
            self.pass_angle = (self.pass_angle + 90.0).rem_euclid(360.0);
            self.begin_pass();
            debug!("hatch pass begins");
        } else {
            self.running = false;
            self.phase = Phase::Done;
            debug!(
                steps = self.steps,
                strokes = self.strokes.len(),
                "fill complete"
            );
        }
    }

    /// Attach the shape's pen metadata to freshly closed strokes.
    fn emit_strokes(&mut self, shape_index: usize, closed: Vec<Vec<Point>>) {
        if closed.is_empty() {
            return;
        }
        let shape = &self.stack[shape_index];
        let color = shape.fill;
        let color_id = shape.color_id;
        let name = shape.name.clone();
        trace!(count = closed.len(), "strokes closed");
        for points in closed {
            self.strokes.push(TraceStroke {
                points,
                color,
                color_id,
                name: name.clone(),
                width: self.settings.stroke_width,
            });
        }
    }
}

/// The guide for overlay mode: the caller's own curve, or a spiral big
/// enough to cover the view from anywhere inside it.
fn build_guide(settings: &FillSettings, view: Rect) -> GuideCurve {
    match &settings.guide {
        Some(points) => GuideCurve::new(points.clone()),
        None => GuideCurve::spiral(settings.spacing, view.diagonal()),
    }
}

// ============================================================================
// TESTS
// ============================================================================
