//! Path recorder: the command stream a shape is built from.
//!
//! `ShapePath` records moves, lines, quadratic ("conic") and cubic curves,
//! closes and ends. It tracks the current point, the anchor of the open
//! subpath and the control point of the previous curve segment so the smooth
//! variants can be resolved when they are recorded.

use crate::basics::PointD;
use crate::curves::{flatten_conic, flatten_cubic};
use crate::math::points_coincide;

/// A single recorded path command. Smooth curve variants are stored already
/// resolved into explicit control points.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PathCommand {
    MoveTo(PointD),
    LineTo(PointD),
    ConicTo { ctrl: PointD, to: PointD },
    CurveTo { ctrl1: PointD, ctrl2: PointD, to: PointD },
    Close,
    End,
}

/// Control point left behind by the previous segment, tagged by the kind of
/// segment that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
enum LastControl {
    #[default]
    None,
    Conic(PointD),
    Cubic(PointD),
}

/// Recorder for shape path commands.
///
/// Every drawing command operates from the current point. A drawing command
/// issued while no subpath is open starts one at the current point, which is
/// (0, 0) for a fresh recorder and the anchor after `close`.
#[derive(Debug, Clone, Default)]
pub struct ShapePath {
    commands: Vec<PathCommand>,
    current: PointD,
    anchor: PointD,
    last_control: LastControl,
    subpath_open: bool,
    version: u64,
}

impl ShapePath {
    pub fn new() -> Self {
        Self::default()
    }

    /// Discard every command and reset the recorder state.
    pub fn clear(&mut self) {
        self.commands.clear();
        self.current = PointD::default();
        self.anchor = PointD::default();
        self.last_control = LastControl::None;
        self.subpath_open = false;
        self.bump();
    }

    // ---------------------------------------------------------------
    // Path construction
    // ---------------------------------------------------------------

    /// Begin a new subpath at (x, y).
    pub fn move_to(&mut self, x: f64, y: f64) {
        let p = PointD::new(x, y);
        self.commands.push(PathCommand::MoveTo(p));
        self.current = p;
        self.anchor = p;
        self.last_control = LastControl::None;
        self.subpath_open = true;
        self.bump();
    }

    pub fn line_to(&mut self, x: f64, y: f64) {
        self.begin_segment();
        let p = PointD::new(x, y);
        self.commands.push(PathCommand::LineTo(p));
        self.current = p;
        self.last_control = LastControl::None;
        self.bump();
    }

    /// Quadratic Bezier with control point (x1, y1) ending at (x, y).
    pub fn conic_to(&mut self, x1: f64, y1: f64, x: f64, y: f64) {
        self.begin_segment();
        let ctrl = PointD::new(x1, y1);
        let to = PointD::new(x, y);
        self.commands.push(PathCommand::ConicTo { ctrl, to });
        self.current = to;
        self.last_control = LastControl::Conic(ctrl);
        self.bump();
    }

    /// Quadratic Bezier whose control point mirrors the previous quadratic
    /// control point through the current point. Without a preceding
    /// quadratic segment the control point is the current point.
    pub fn conic_to_smooth(&mut self, x: f64, y: f64) {
        let ctrl = match self.last_control {
            LastControl::Conic(c) => c.reflect_through(&self.current),
            _ => self.current,
        };
        self.conic_to(ctrl.x, ctrl.y, x, y);
    }

    /// Cubic Bezier with control points (x1, y1), (x2, y2) ending at (x, y).
    #[allow(clippy::too_many_arguments)]
    pub fn curve_to(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, x: f64, y: f64) {
        self.begin_segment();
        let ctrl1 = PointD::new(x1, y1);
        let ctrl2 = PointD::new(x2, y2);
        let to = PointD::new(x, y);
        self.commands.push(PathCommand::CurveTo { ctrl1, ctrl2, to });
        self.current = to;
        self.last_control = LastControl::Cubic(ctrl2);
        self.bump();
    }

    /// Cubic Bezier whose first control point mirrors the previous cubic's
    /// second control point through the current point, falling back to the
    /// current point.
    pub fn curve_to_smooth(&mut self, x2: f64, y2: f64, x: f64, y: f64) {
        let ctrl1 = match self.last_control {
            LastControl::Cubic(c) => c.reflect_through(&self.current),
            _ => self.current,
        };
        self.curve_to(ctrl1.x, ctrl1.y, x2, y2, x, y);
    }

    /// Connect back to the subpath anchor and end the subpath. Ignored when
    /// no subpath is open.
    pub fn close(&mut self) {
        if !self.subpath_open {
            return;
        }
        self.commands.push(PathCommand::Close);
        self.current = self.anchor;
        self.last_control = LastControl::None;
        self.subpath_open = false;
        self.bump();
    }

    /// End the subpath without an explicit closing edge.
    pub fn endpath(&mut self) {
        if !self.subpath_open {
            return;
        }
        self.commands.push(PathCommand::End);
        self.last_control = LastControl::None;
        self.subpath_open = false;
        self.bump();
    }

    fn begin_segment(&mut self) {
        if !self.subpath_open {
            let p = self.current;
            self.commands.push(PathCommand::MoveTo(p));
            self.anchor = p;
            self.subpath_open = true;
        }
    }

    #[inline]
    fn bump(&mut self) {
        self.version = self.version.wrapping_add(1);
    }

    // ---------------------------------------------------------------
    // Accessors
    // ---------------------------------------------------------------

    pub fn commands(&self) -> &[PathCommand] {
        &self.commands
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn current_point(&self) -> PointD {
        self.current
    }

    /// Modification counter, bumped by every mutating call.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Flatten every subpath into a polyline translated by `origin`.
    ///
    /// Curves are subdivided with approximation `scale` (pixels per world
    /// unit). Each polyline is implicitly closed; a trailing point equal to
    /// the first is dropped. Subpaths with fewer than two points are omitted.
    pub fn flatten(&self, origin: PointD, scale: f64) -> Vec<Vec<PointD>> {
        let mut polys = Vec::new();
        let mut cur: Vec<PointD> = Vec::new();

        for cmd in &self.commands {
            match *cmd {
                PathCommand::MoveTo(p) => {
                    flush_polyline(&mut cur, &mut polys);
                    cur.push(p.offset(&origin));
                }
                PathCommand::LineTo(p) => {
                    let p = p.offset(&origin);
                    match cur.last() {
                        Some(last) if points_coincide(last, &p) => {}
                        _ => cur.push(p),
                    }
                }
                PathCommand::ConicTo { ctrl, to } => {
                    let start = cur.last().copied().unwrap_or(origin);
                    if cur.is_empty() {
                        cur.push(start);
                    }
                    flatten_conic(start, ctrl.offset(&origin), to.offset(&origin), scale, &mut cur);
                }
                PathCommand::CurveTo { ctrl1, ctrl2, to } => {
                    let start = cur.last().copied().unwrap_or(origin);
                    if cur.is_empty() {
                        cur.push(start);
                    }
                    flatten_cubic(
                        start,
                        ctrl1.offset(&origin),
                        ctrl2.offset(&origin),
                        to.offset(&origin),
                        scale,
                        &mut cur,
                    );
                }
                PathCommand::Close | PathCommand::End => flush_polyline(&mut cur, &mut polys),
            }
        }
        flush_polyline(&mut cur, &mut polys);
        polys
    }
}

fn flush_polyline(cur: &mut Vec<PointD>, polys: &mut Vec<Vec<PointD>>) {
    if cur.len() > 2 && points_coincide(&cur[0], &cur[cur.len() - 1]) {
        cur.pop();
    }
    if cur.len() >= 2 {
        polys.push(std::mem::take(cur));
    } else {
        cur.clear();
    }
}

// ============================================================================
// Tests
// ============================================================================
