//! Offset correction for straight strokes.
//!
//! The offset service displaces a path along its own normal, scaled
//! separately in x and y. Driving only one of those components gives the
//! designer a duplicate that stays on the same baseline (or the same
//! vertical), but a diagonal line then moves less than requested. The
//! correction computed here compensates for the slope so the measured
//! perpendicular distance is exact.

use glyphs_model::Path;
use kurbo::{Point, Vec2};

/// Below this a direction component counts as zero.
pub const EPSILON: f64 = 1e-6;

/// Which side of the path a split duplicate goes to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OffsetDirection {
    /// Direction 0, the positive normal side.
    Positive,
    /// Direction 1, the negative normal side.
    Negative,
}

impl OffsetDirection {
    pub const BOTH: [OffsetDirection; 2] = [OffsetDirection::Positive, OffsetDirection::Negative];

    pub fn sign(self) -> f64 {
        match self {
            OffsetDirection::Positive => 1.0,
            OffsetDirection::Negative => -1.0,
        }
    }

    pub fn index(self) -> usize {
        match self {
            OffsetDirection::Positive => 0,
            OffsetDirection::Negative => 1,
        }
    }
}

/// The first two nodes of a path, used only to estimate its direction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment {
    pub start: Point,
    pub end: Point,
}

impl Segment {
    pub fn new(start: impl Into<Point>, end: impl Into<Point>) -> Segment {
        Segment {
            start: start.into(),
            end: end.into(),
        }
    }

    pub fn from_path(path: &Path) -> Option<Segment> {
        match path.nodes.as_slice() {
            [first, second, ..] => Some(Segment::new(first.pt, second.pt)),
            _ => None,
        }
    }

    /// Unit direction from start to end, `None` if the points coincide.
    pub fn direction(&self) -> Option<Vec2> {
        let delta = self.end - self.start;
        let length = delta.hypot();
        if length < EPSILON {
            return None;
        }
        Some(delta / length)
    }
}

/// Normal of a segment plus the scalar to feed the offset service.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OffsetCorrection {
    pub normal: Vec2,
    pub offset: f64,
}

impl OffsetCorrection {
    /// Correction for a segment so that two duplicates, one per side, end up
    /// `distance` apart.
    ///
    /// Degenerate input yields a zero normal and the uncorrected distance.
    pub fn new(segment: Option<Segment>, distance: f64) -> OffsetCorrection {
        let Some(direction) = segment.and_then(|s| s.direction()) else {
            return OffsetCorrection {
                normal: Vec2::ZERO,
                offset: distance,
            };
        };
        let half = distance / 2.0;
        if direction.y.abs() < EPSILON {
            return OffsetCorrection {
                normal: Vec2::new(0.0, 1.0),
                offset: half,
            };
        }
        if direction.x.abs() < EPSILON {
            return OffsetCorrection {
                normal: Vec2::new(1.0, 0.0),
                offset: half,
            };
        }
        // |sin| of the angle to the x axis
        let correction_factor = direction.atan2().sin().abs().max(EPSILON);
        OffsetCorrection {
            normal: Vec2::new(direction.y, -direction.x),
            offset: half / correction_factor,
        }
    }

    /// The `(dx, dy)` pair to hand to the offset service for one side.
    ///
    /// Only the dominant axis is driven: y for a horizontal normal, x
    /// otherwise. Dividing by the normal component undoes the scaling the
    /// service applies.
    pub fn drive(&self, direction: OffsetDirection) -> Vec2 {
        let signed = direction.sign() * self.offset;
        let Vec2 { x: nx, y: ny } = self.normal;
        if nx.abs() < EPSILON {
            let dy = if ny.abs() < EPSILON {
                signed
            } else {
                signed / ny
            };
            Vec2::new(0.0, dy)
        } else {
            Vec2::new(signed / nx, 0.0)
        }
    }
}

/// Correction for a path, estimated from its first two nodes.
pub fn diagonal_offset(path: &Path, distance: f64) -> OffsetCorrection {
    OffsetCorrection::new(Segment::from_path(path), distance)
}
