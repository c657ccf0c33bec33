//! Turns reference paths into the tagged path groups the masters draw from.

use glyphs_model::{Path, StrokePlacement};
use log::{debug, trace, warn};

pub use crate::geometry::OffsetDirection;
use crate::{
    geometry::diagonal_offset,
    offset::{JoinType, OffsetCurve, MITER_LIMIT},
};

/// What a synthesized path is relative to its reference path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PathRole {
    Original,
    /// An offset copy; the direction is set only for the two halves of a
    /// split centered stroke.
    Duplicate(Option<OffsetDirection>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct TaggedPath {
    /// Index of the reference path this was made from.
    pub source: usize,
    pub role: PathRole,
    pub path: Path,
}

/// The output of duplicating every reference path of a glyph.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Duplication {
    /// Paths for the reference ("thin") master.
    pub reference: Vec<TaggedPath>,
    /// Paths for every other master.
    pub derived: Vec<TaggedPath>,
    /// Offsets that produced nothing.
    pub skipped: usize,
}

impl Duplication {
    pub fn duplicates(&self) -> impl Iterator<Item = &TaggedPath> {
        self.derived
            .iter()
            .filter(|t| matches!(t.role, PathRole::Duplicate(_)))
    }
}

pub struct Duplicator<'a, O: OffsetCurve + ?Sized> {
    offset: &'a O,
    distance: f64,
    maintain_y: bool,
}

impl<'a, O: OffsetCurve + ?Sized> Duplicator<'a, O> {
    pub fn new(offset: &'a O, distance: f64, maintain_y: bool) -> Self {
        Duplicator {
            offset,
            distance,
            maintain_y,
        }
    }

    pub fn duplicate(&self, paths: &[Path]) -> Duplication {
        let mut duplication = Duplication::default();
        for (source, path) in paths.iter().enumerate() {
            let original = TaggedPath {
                source,
                role: PathRole::Original,
                path: path.clone(),
            };
            let centered = path.attributes.placement() == StrokePlacement::Center;

            if centered && self.maintain_y {
                let correction = diagonal_offset(path, self.distance);
                debug!("Path {source}: splitting with {correction:?}");
                for direction in OffsetDirection::BOTH {
                    let drive = correction.drive(direction);
                    match self.offset_once(path, drive.x, drive.y) {
                        Some(result) => duplication.derived.push(TaggedPath {
                            source,
                            role: PathRole::Duplicate(Some(direction)),
                            path: result,
                        }),
                        None => {
                            warn!("Path {source}: {direction:?} offset produced nothing, skipped");
                            duplication.skipped += 1;
                        }
                    }
                }
                duplication.reference.push(original);
                continue;
            }

            let amount = if centered {
                self.distance / 2.0
            } else {
                self.distance
            };
            duplication.reference.push(original.clone());
            duplication.derived.push(original);
            match self.offset_once(path, amount, amount) {
                Some(result) => duplication.derived.push(TaggedPath {
                    source,
                    role: PathRole::Duplicate(None),
                    path: result,
                }),
                None => {
                    warn!("Path {source}: offset produced nothing, skipped");
                    duplication.skipped += 1;
                }
            }
        }
        duplication
    }

    /// One offset call; the result inherits the source's stroke attributes.
    fn offset_once(&self, source: &Path, dx: f64, dy: f64) -> Option<Path> {
        let join = JoinType::Miter;
        trace!(
            "offset ({dx}, {dy}) join {} miter limit {MITER_LIMIT}",
            join.code()
        );
        let mut result = self
            .offset
            .offset(source, dx, dy, join, MITER_LIMIT)
            .into_iter()
            .next()?;
        result.attributes.copy_stroke_from(&source.attributes);
        Some(result)
    }
}
