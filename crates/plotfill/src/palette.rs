//! Pen palette and color snapping.
//!
//! A plotter carousel holds a fixed set of pens plus "no pen at all",
//! which is the paper itself. Every source fill is snapped to the nearest
//! entry so the engine can tell real pen work apart from regions that the
//! paper already renders for free.

/// One pen in the carousel.
#[derive(Debug, Clone, Copy)]
pub struct PenColor {
    pub name: &'static str,
    pub rgb: (u8, u8, u8),
}

/// Index of the paper pseudo-pen in [`PEN_SET`].
pub const PAPER_INDEX: u8 = 8;

/// The default eight-pen carousel, with paper white as the ninth entry.
pub const PEN_SET: [PenColor; 9] = [
    PenColor { name: "black", rgb: (0, 0, 0) },
    PenColor { name: "red", rgb: (211, 47, 47) },
    PenColor { name: "orange", rgb: (245, 124, 0) },
    PenColor { name: "yellow", rgb: (251, 192, 45) },
    PenColor { name: "green", rgb: (56, 142, 60) },
    PenColor { name: "blue", rgb: (25, 118, 210) },
    PenColor { name: "violet", rgb: (123, 31, 162) },
    PenColor { name: "brown", rgb: (93, 64, 55) },
    PenColor { name: "paper", rgb: (255, 255, 255) },
];

/// Stable identifier of a palette slot.
///
/// Survives occlusion subtraction and hatch re-passes, so strokes can be
/// grouped by pen long after the source fill color is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColorId(pub u8);

impl ColorId {
    /// True when this slot is the paper, i.e. nothing to draw.
    #[inline]
    pub fn is_paper(self) -> bool {
        self.0 == PAPER_INDEX
    }

    /// Slot label in `color0`..`color8` form.
    pub fn label(self) -> String {
        format!("color{}", self.0)
    }

    /// Human-readable pen name.
    pub fn name(self) -> &'static str {
        PEN_SET[self.0 as usize % PEN_SET.len()].name
    }

    /// The palette RGB for this slot.
    pub fn rgb(self) -> (u8, u8, u8) {
        PEN_SET[self.0 as usize % PEN_SET.len()].rgb
    }
}

/// Snap an arbitrary RGB fill to the nearest palette slot.
///
/// Nearest by squared RGB distance; ties keep the lower slot index.
pub fn snap_color(rgb: (u8, u8, u8)) -> ColorId {
    let mut best = 0usize;
    let mut best_dist = u32::MAX;
    for (i, pen) in PEN_SET.iter().enumerate() {
        let dr = rgb.0 as i32 - pen.rgb.0 as i32;
        let dg = rgb.1 as i32 - pen.rgb.1 as i32;
        let db = rgb.2 as i32 - pen.rgb.2 as i32;
        let dist = (dr * dr + dg * dg + db * db) as u32;
        if dist < best_dist {
            best_dist = dist;
            best = i;
        }
    }
    ColorId(best as u8)
}

// ============================================================================
// TESTS
// ============================================================================
