//! Paths, nodes, and the stroke attributes Glyphs keeps on open paths.

use kurbo::{BezPath, Rect, Shape};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::error::Error;

// We do not use kurbo's point because it does not hash
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Point {
    x: OrderedFloat<f64>,
    y: OrderedFloat<f64>,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Point {
        Point {
            x: x.into(),
            y: y.into(),
        }
    }

    pub fn x(&self) -> f64 {
        self.x.0
    }

    pub fn y(&self) -> f64 {
        self.y.0
    }

    pub fn translate(self, dx: f64, dy: f64) -> Point {
        Point::new(self.x() + dx, self.y() + dy)
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Point::new(x, y)
    }
}

impl From<kurbo::Point> for Point {
    fn from(value: kurbo::Point) -> Self {
        Point::new(value.x, value.y)
    }
}

impl From<Point> for kurbo::Point {
    fn from(value: Point) -> Self {
        kurbo::Point::new(value.x(), value.y())
    }
}

/// Node types, serialized with the short Glyphs 3 names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeType {
    #[serde(rename = "l")]
    Line,
    #[serde(rename = "ls")]
    LineSmooth,
    #[serde(rename = "o")]
    OffCurve,
    #[serde(rename = "c")]
    Curve,
    #[serde(rename = "cs")]
    CurveSmooth,
}

impl NodeType {
    pub fn is_on_curve(self) -> bool {
        !matches!(self, NodeType::OffCurve)
    }
}

/// A node is written as `[x, y, type]`, as in Glyphs 3 files.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RawNode", into = "RawNode")]
pub struct Node {
    pub pt: Point,
    pub node_type: NodeType,
}

#[derive(Serialize, Deserialize)]
struct RawNode(f64, f64, NodeType);

impl From<RawNode> for Node {
    fn from(RawNode(x, y, node_type): RawNode) -> Self {
        Node {
            pt: Point::new(x, y),
            node_type,
        }
    }
}

impl From<Node> for RawNode {
    fn from(node: Node) -> Self {
        RawNode(node.pt.x(), node.pt.y(), node.node_type)
    }
}

/// Where the stroke is drawn relative to the path.
///
/// Paths without an explicit placement are stroked centered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrokePlacement {
    Left,
    #[default]
    Center,
    Right,
}

/// The stroke related entries of a path's attribute dictionary.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathAttributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<OrderedFloat<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_height: Option<OrderedFloat<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_pos: Option<StrokePlacement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_cap_start: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_cap_end: Option<i64>,
}

impl PathAttributes {
    pub fn is_empty(&self) -> bool {
        self == &PathAttributes::default()
    }

    pub fn placement(&self) -> StrokePlacement {
        self.stroke_pos.unwrap_or_default()
    }

    pub fn set_stroke(&mut self, width: f64, height: f64) {
        self.stroke_width = Some(width.into());
        self.stroke_height = Some(height.into());
    }

    /// Copy every stroke key present on `source`; keys `source` lacks are left alone.
    pub fn copy_stroke_from(&mut self, source: &PathAttributes) {
        if source.line_cap_start.is_some() {
            self.line_cap_start = source.line_cap_start;
        }
        if source.line_cap_end.is_some() {
            self.line_cap_end = source.line_cap_end;
        }
        if source.stroke_width.is_some() {
            self.stroke_width = source.stroke_width;
        }
        if source.stroke_height.is_some() {
            self.stroke_height = source.stroke_height;
        }
        if source.stroke_pos.is_some() {
            self.stroke_pos = source.stroke_pos;
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Path {
    pub closed: bool,
    pub nodes: Vec<Node>,
    #[serde(default, skip_serializing_if = "PathAttributes::is_empty")]
    pub attributes: PathAttributes,
}

impl Path {
    pub fn new(closed: bool) -> Path {
        Path {
            closed,
            ..Default::default()
        }
    }

    pub fn add(&mut self, pt: impl Into<Point>, node_type: NodeType) {
        let pt = pt.into();
        self.nodes.push(Node { pt, node_type });
    }

    pub fn translate(&mut self, dx: f64, dy: f64) {
        for node in self.nodes.iter_mut() {
            node.pt = node.pt.translate(dx, dy);
        }
    }

    /// Convert to a kurbo path.
    ///
    /// Closed Glyphs paths list their start node last, so the last on-curve
    /// node becomes the move-to.
    pub fn to_bez(&self) -> Result<BezPath, Error> {
        let mut bez = BezPath::new();
        if self.nodes.is_empty() {
            return Ok(bez);
        }

        let (start, rest): (&Node, Vec<&Node>) = if self.closed {
            let Some(start_idx) = self.nodes.iter().rposition(|n| n.node_type.is_on_curve())
            else {
                return Err(Error::InvalidPath(
                    "closed path has no on-curve node".to_string(),
                ));
            };
            let rest = self.nodes[start_idx + 1..]
                .iter()
                .chain(self.nodes[..=start_idx].iter())
                .collect();
            (&self.nodes[start_idx], rest)
        } else {
            let start = &self.nodes[0];
            if !start.node_type.is_on_curve() {
                return Err(Error::InvalidPath(
                    "open path starts with an off-curve node".to_string(),
                ));
            }
            (start, self.nodes[1..].iter().collect())
        };

        bez.move_to(start.pt);
        let mut off_curve: Vec<kurbo::Point> = Vec::new();
        for node in rest {
            let pt: kurbo::Point = node.pt.into();
            match node.node_type {
                NodeType::OffCurve => off_curve.push(pt),
                NodeType::Line | NodeType::LineSmooth => {
                    if !off_curve.is_empty() {
                        return Err(Error::InvalidPath(format!(
                            "line node at {pt:?} follows off-curve nodes"
                        )));
                    }
                    bez.line_to(pt);
                }
                NodeType::Curve | NodeType::CurveSmooth => {
                    match off_curve.as_slice() {
                        [] => bez.line_to(pt),
                        [c0] => bez.quad_to(*c0, pt),
                        [c0, c1] => bez.curve_to(*c0, *c1, pt),
                        _ => {
                            return Err(Error::InvalidPath(format!(
                                "{} off-curve nodes before {pt:?}",
                                off_curve.len()
                            )))
                        }
                    }
                    off_curve.clear();
                }
            }
        }
        if !off_curve.is_empty() {
            return Err(Error::InvalidPath(
                "path ends with off-curve nodes".to_string(),
            ));
        }
        if self.closed {
            bez.close_path();
        }
        Ok(bez)
    }

    /// The tight bounds of the outline, `None` for a path without nodes.
    pub fn bounds(&self) -> Option<Rect> {
        if self.nodes.len() < 2 {
            return self.control_bounds();
        }
        match self.to_bez() {
            Ok(bez) => Some(bez.bounding_box()),
            Err(e) => {
                log::warn!("{e}, using control point bounds");
                self.control_bounds()
            }
        }
    }

    fn control_bounds(&self) -> Option<Rect> {
        let mut nodes = self.nodes.iter().map(|n| kurbo::Point::from(n.pt));
        let first = nodes.next()?;
        Some(nodes.fold(Rect::from_points(first, first), |rect, pt| {
            rect.union_pt(pt)
        }))
    }
}

#[cfg(test)]
mod tests {
    use kurbo::PathEl;
    use pretty_assertions::assert_eq;

    use super::*;

    fn line(from: (f64, f64), to: (f64, f64)) -> Path {
        let mut path = Path::new(false);
        path.add(from, NodeType::Line);
        path.add(to, NodeType::Line);
        path
    }

    #[test]
    fn node_is_glyphs3_array() {
        let node = Node {
            pt: Point::new(354.0, 183.0),
            node_type: NodeType::Line,
        };
        assert_eq!("[354.0,183.0,\"l\"]", serde_json::to_string(&node).unwrap());
        assert_eq!(
            node,
            serde_json::from_str::<Node>("[354, 183, \"l\"]").unwrap()
        );
    }

    #[test]
    fn missing_stroke_pos_means_centered() {
        let path: Path = serde_json::from_str(
            r#"{"closed": false, "nodes": [[0, 0, "l"], [10, 0, "l"]], "attributes": {"strokeWidth": 10}}"#,
        )
        .unwrap();
        assert_eq!(StrokePlacement::Center, path.attributes.placement());
        assert_eq!(Some(10.0.into()), path.attributes.stroke_width);
    }

    #[test]
    fn copy_stroke_keeps_keys_the_source_lacks() {
        let mut target = PathAttributes {
            line_cap_end: Some(2),
            ..Default::default()
        };
        let source = PathAttributes {
            stroke_width: Some(20.0.into()),
            stroke_pos: Some(StrokePlacement::Left),
            line_cap_start: Some(1),
            ..Default::default()
        };
        target.copy_stroke_from(&source);
        assert_eq!(
            PathAttributes {
                stroke_width: Some(20.0.into()),
                stroke_height: None,
                stroke_pos: Some(StrokePlacement::Left),
                line_cap_start: Some(1),
                line_cap_end: Some(2),
            },
            target
        );
    }

    #[test]
    fn closed_path_starts_at_last_node() {
        let mut path = Path::new(true);
        path.add((100.0, 0.0), NodeType::Line);
        path.add((100.0, 100.0), NodeType::Line);
        path.add((0.0, 0.0), NodeType::Line);
        let bez = path.to_bez().unwrap();
        assert_eq!(
            vec![
                PathEl::MoveTo((0.0, 0.0).into()),
                PathEl::LineTo((100.0, 0.0).into()),
                PathEl::LineTo((100.0, 100.0).into()),
                PathEl::LineTo((0.0, 0.0).into()),
                PathEl::ClosePath,
            ],
            bez.elements().to_vec()
        );
    }

    #[test]
    fn curve_bounds_are_tight() {
        let mut path = Path::new(false);
        path.add((0.0, 0.0), NodeType::Line);
        path.add((0.0, 100.0), NodeType::OffCurve);
        path.add((100.0, 100.0), NodeType::OffCurve);
        path.add((100.0, 0.0), NodeType::Curve);
        let bounds = path.bounds().unwrap();
        assert_eq!((0.0, 100.0), (bounds.x0, bounds.x1));
        // the control points reach 100, the curve only 75
        assert!((bounds.y1 - 75.0).abs() < 1e-9, "{bounds:?}");
    }

    #[test]
    fn horizontal_line_bounds() {
        let bounds = line((50.0, 300.0), (450.0, 300.0)).bounds().unwrap();
        assert_eq!(Rect::new(50.0, 300.0, 450.0, 300.0), bounds);
    }

    #[test]
    fn single_node_bounds() {
        let mut path = Path::new(false);
        path.add((7.0, 9.0), NodeType::Line);
        assert_eq!(Some(Rect::new(7.0, 9.0, 7.0, 9.0)), path.bounds());
        assert_eq!(None, Path::new(false).bounds());
    }

    #[test]
    fn too_many_off_curves_is_an_error() {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut path = Path::new(false);
        path.add((0.0, 0.0), NodeType::Line);
        for _ in 0..3 {
            path.add((1.0, 1.0), NodeType::OffCurve);
        }
        path.add((2.0, 0.0), NodeType::Curve);
        assert!(matches!(path.to_bez(), Err(Error::InvalidPath(..))));
        // but bounds still work from the control points
        assert_eq!(Some(Rect::new(0.0, 0.0, 2.0, 1.0)), path.bounds());
    }

    #[test]
    fn translate_moves_every_node() {
        let mut path = line((0.0, 0.0), (10.0, 5.0));
        path.translate(3.0, -1.0);
        assert_eq!(line((3.0, -1.0), (13.0, 4.0)), path);
    }
}
