//! Lightweight in-memory model of a Glyphs style font: masters, glyphs,
//! layers and stroked paths.

pub mod error;
mod font;
mod path;

pub use font::{Axis, AxisBounds, AxisMax, AxisRange, AxisRule, Font, FontMaster, Glyph, Layer};
pub use path::{Node, NodeType, Path, PathAttributes, Point, StrokePlacement};
