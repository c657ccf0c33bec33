//! The curve offset service the engine delegates to.

use glyphs_model::{Node, NodeType, Path};
use kurbo::{Point, Vec2};

use crate::geometry::EPSILON;

/// Miter limit passed on every offset call.
pub const MITER_LIMIT: f64 = 0.5;

/// How corners are joined when offsetting.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum JoinType {
    #[default]
    Miter,
    Round,
    Bevel,
}

impl JoinType {
    /// The numeric code the Glyphs offset filter uses.
    pub fn code(self) -> u8 {
        match self {
            JoinType::Miter => 0,
            JoinType::Round => 1,
            JoinType::Bevel => 2,
        }
    }
}

/// Offsets a single path.
///
/// `dx` and `dy` scale the displacement along the path normal per axis.
/// Returns zero or one path; the result carries no stroke attributes.
pub trait OffsetCurve {
    fn offset(&self, path: &Path, dx: f64, dy: f64, join: JoinType, miter_limit: f64)
        -> Vec<Path>;
}

impl<F> OffsetCurve for F
where
    F: Fn(&Path, f64, f64, JoinType, f64) -> Vec<Path>,
{
    fn offset(
        &self,
        path: &Path,
        dx: f64,
        dy: f64,
        join: JoinType,
        miter_limit: f64,
    ) -> Vec<Path> {
        self(path, dx, dy, join, miter_limit)
    }
}

/// Moves every node along its local normal, `(n.x * dx, n.y * dy)`.
///
/// On-curve nodes use the bisector of the normals of their neighbouring
/// segments, stretched at miter corners. Off-curve nodes travel with the
/// on-curve node that owns them, so straight segments stay exactly parallel.
#[derive(Clone, Copy, Debug, Default)]
pub struct NormalOffset;

impl OffsetCurve for NormalOffset {
    fn offset(
        &self,
        path: &Path,
        dx: f64,
        dy: f64,
        join: JoinType,
        miter_limit: f64,
    ) -> Vec<Path> {
        match normal_offset(path, dx, dy, join, miter_limit) {
            Some(result) => vec![result],
            None => {
                log::debug!("No offset for degenerate path with {} nodes", path.nodes.len());
                Vec::new()
            }
        }
    }
}

fn normal_offset(
    path: &Path,
    dx: f64,
    dy: f64,
    join: JoinType,
    miter_limit: f64,
) -> Option<Path> {
    if path.nodes.len() < 2 || !path.nodes.iter().any(|n| n.node_type.is_on_curve()) {
        return None;
    }
    let points: Vec<Point> = path.nodes.iter().map(|n| n.pt.into()).collect();

    let mut moves = vec![Vec2::ZERO; points.len()];
    for (idx, node) in path.nodes.iter().enumerate() {
        if !node.node_type.is_on_curve() {
            continue;
        }
        let incoming = distinct_neighbour(&points, idx, path.closed, -1).map(|p| points[idx] - p);
        let outgoing = distinct_neighbour(&points, idx, path.closed, 1).map(|p| p - points[idx]);
        let normal = vertex_normal(incoming, outgoing, join, miter_limit)?;
        moves[idx] = Vec2::new(normal.x * dx, normal.y * dy);
    }
    for (idx, node) in path.nodes.iter().enumerate() {
        if node.node_type == NodeType::OffCurve {
            moves[idx] = off_curve_move(&path.nodes, &moves, idx, path.closed);
        }
    }

    let mut result = Path::new(path.closed);
    result.nodes = path
        .nodes
        .iter()
        .zip(moves)
        .map(|(node, delta)| Node {
            pt: node.pt.translate(delta.x, delta.y),
            node_type: node.node_type,
        })
        .collect();
    Some(result)
}

/// Index `step` positions away, wrapping for closed paths.
fn step_index(len: usize, idx: usize, closed: bool, step: isize) -> Option<usize> {
    let target = idx as isize + step;
    if closed {
        Some(target.rem_euclid(len as isize) as usize)
    } else if (0..len as isize).contains(&target) {
        Some(target as usize)
    } else {
        None
    }
}

/// The nearest point in direction `dir` (+1/-1) that does not coincide with `idx`.
fn distinct_neighbour(points: &[Point], idx: usize, closed: bool, dir: isize) -> Option<Point> {
    (1..points.len() as isize)
        .map_while(|k| step_index(points.len(), idx, closed, dir * k))
        .map(|i| points[i])
        .find(|p| (*p - points[idx]).hypot() >= EPSILON)
}

fn unit_normal(direction: Vec2) -> Vec2 {
    let d = direction.normalize();
    Vec2::new(d.y, -d.x)
}

fn vertex_normal(
    incoming: Option<Vec2>,
    outgoing: Option<Vec2>,
    join: JoinType,
    miter_limit: f64,
) -> Option<Vec2> {
    match (incoming.map(unit_normal), outgoing.map(unit_normal)) {
        (None, None) => None,
        (Some(normal), None) | (None, Some(normal)) => Some(normal),
        (Some(a), Some(b)) => {
            let sum = a + b;
            if sum.hypot() < EPSILON {
                // a full reversal, keep the incoming side
                return Some(a);
            }
            let bisector = sum.normalize();
            let scale = match join {
                JoinType::Miter => 1.0 / bisector.dot(a).max(miter_limit.max(EPSILON)),
                JoinType::Round | JoinType::Bevel => 1.0,
            };
            Some(bisector * scale)
        }
    }
}

/// Off-curve nodes follow the closer on-curve node; equidistant ones, like
/// a quadratic control point, take the average.
fn off_curve_move(nodes: &[Node], moves: &[Vec2], idx: usize, closed: bool) -> Vec2 {
    let nearest = |dir: isize| {
        (1..nodes.len() as isize)
            .map_while(|k| step_index(nodes.len(), idx, closed, dir * k).map(|i| (k, i)))
            .find(|(_, i)| nodes[*i].node_type.is_on_curve())
    };
    match (nearest(-1), nearest(1)) {
        (Some((back, before)), Some((fwd, after))) => {
            if back < fwd {
                moves[before]
            } else if fwd < back {
                moves[after]
            } else {
                (moves[before] + moves[after]) / 2.0
            }
        }
        (Some((_, on_curve)), None) | (None, Some((_, on_curve))) => moves[on_curve],
        (None, None) => Vec2::ZERO,
    }
}
