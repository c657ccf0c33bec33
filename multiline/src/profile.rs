//! Per master stroke weights.
//!
//! A [`StrokeProfile`] has one row per target master. Each row picks the path
//! group it draws from and the stroke size for every path role. The built in
//! presets are plain data; any row can be edited after construction.

use glyphs_model::Path;
use serde::{Deserialize, Serialize};

use crate::duplicate::{Duplication, PathRole, TaggedPath};

/// Number of masters every preset synthesizes.
pub const MASTER_COUNT: usize = 5;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct StrokeSize {
    pub width: f64,
    pub height: f64,
}

impl StrokeSize {
    pub const fn new(width: f64, height: f64) -> StrokeSize {
        StrokeSize { width, height }
    }

    pub const fn square(size: f64) -> StrokeSize {
        StrokeSize::new(size, size)
    }
}

/// The three named stroke weights the two preset families are built from.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StrokeWidths {
    pub min: f64,
    pub medium: f64,
    pub max: f64,
}

/// An original/duplicate pair of stroke sizes for one master.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MasterStroke {
    pub original: StrokeSize,
    pub duplicate: StrokeSize,
}

impl MasterStroke {
    pub const fn new(original: StrokeSize, duplicate: StrokeSize) -> MasterStroke {
        MasterStroke {
            original,
            duplicate,
        }
    }
}

pub const DEFAULT_MASTER_STROKES: [MasterStroke; MASTER_COUNT] = [
    MasterStroke::new(StrokeSize::square(10.0), StrokeSize::square(1.0)),
    MasterStroke::new(StrokeSize::square(10.0), StrokeSize::square(40.0)),
    MasterStroke::new(StrokeSize::square(40.0), StrokeSize::square(40.0)),
    MasterStroke::new(StrokeSize::square(80.0), StrokeSize::square(80.0)),
    MasterStroke::new(StrokeSize::new(80.0, 10.0), StrokeSize::new(10.0, 80.0)),
];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "kebab-case")]
pub enum Preset {
    /// Five masters spanning weight and line count
    #[default]
    TwoAxis,
    /// Five masters along a single weight axis
    SingleAxis,
    /// Explicit original/duplicate sizes per master
    PerMaster,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PathGroup {
    /// Only the untouched reference paths.
    Reference,
    /// Reference paths plus their offset duplicates.
    Derived,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MasterProfile {
    pub group: PathGroup,
    /// `None` keeps whatever stroke the original path had.
    pub original: Option<StrokeSize>,
    pub duplicate: StrokeSize,
    /// Indexed by [`OffsetDirection::index`](crate::duplicate::OffsetDirection::index).
    pub split: [StrokeSize; 2],
}

impl MasterProfile {
    fn uniform(group: PathGroup, size: StrokeSize) -> MasterProfile {
        MasterProfile {
            group,
            original: Some(size),
            duplicate: size,
            split: [size, size],
        }
    }

    pub fn stroke_for(&self, role: PathRole) -> Option<StrokeSize> {
        match role {
            PathRole::Original => self.original,
            PathRole::Duplicate(None) => Some(self.duplicate),
            PathRole::Duplicate(Some(direction)) => Some(self.split[direction.index()]),
        }
    }

    pub fn paths<'d>(&self, duplication: &'d Duplication) -> &'d [TaggedPath] {
        match self.group {
            PathGroup::Reference => &duplication.reference,
            PathGroup::Derived => &duplication.derived,
        }
    }

    /// A copy of the tagged path with this master's stroke applied.
    ///
    /// Only the stroke width and height change.
    pub fn apply(&self, tagged: &TaggedPath) -> Path {
        let mut path = tagged.path.clone();
        if let Some(size) = self.stroke_for(tagged.role) {
            path.attributes.set_stroke(size.width, size.height);
        }
        path
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct StrokeProfile {
    masters: Vec<MasterProfile>,
}

impl StrokeProfile {
    pub fn new(masters: Vec<MasterProfile>) -> StrokeProfile {
        StrokeProfile { masters }
    }

    /// Thin, light, medium, bold and heavy along weight, with the light and
    /// medium masters mixing stroke sizes between original and duplicate.
    pub fn two_axis(widths: StrokeWidths) -> StrokeProfile {
        let min = StrokeSize::square(widths.min);
        let medium = StrokeSize::square(widths.medium);
        let max = StrokeSize::square(widths.max);
        StrokeProfile::new(vec![
            MasterProfile::uniform(PathGroup::Reference, min),
            MasterProfile::uniform(PathGroup::Derived, min),
            MasterProfile {
                group: PathGroup::Derived,
                original: Some(medium),
                duplicate: min,
                split: [medium, min],
            },
            MasterProfile {
                group: PathGroup::Derived,
                original: Some(min),
                duplicate: max,
                split: [min, max],
            },
            MasterProfile::uniform(PathGroup::Derived, max),
        ])
    }

    pub fn single_axis(widths: StrokeWidths) -> StrokeProfile {
        let min = StrokeSize::square(widths.min);
        let medium = StrokeSize::square(widths.medium);
        let max = StrokeSize::square(widths.max);
        StrokeProfile::new(vec![
            MasterProfile {
                original: None,
                ..MasterProfile::uniform(PathGroup::Reference, min)
            },
            MasterProfile::uniform(PathGroup::Derived, min),
            MasterProfile {
                group: PathGroup::Derived,
                original: Some(min),
                duplicate: medium,
                split: [min, medium],
            },
            MasterProfile::uniform(PathGroup::Derived, medium),
            MasterProfile::uniform(PathGroup::Derived, max),
        ])
    }

    pub fn per_master(strokes: &[MasterStroke; MASTER_COUNT]) -> StrokeProfile {
        StrokeProfile::new(
            strokes
                .iter()
                .map(|stroke| MasterProfile {
                    group: PathGroup::Derived,
                    original: Some(stroke.original),
                    duplicate: stroke.duplicate,
                    split: [stroke.duplicate, stroke.duplicate],
                })
                .collect(),
        )
    }

    pub fn masters(&self) -> &[MasterProfile] {
        &self.masters
    }

    pub fn master_mut(&mut self, idx: usize) -> Option<&mut MasterProfile> {
        self.masters.get_mut(idx)
    }

    pub fn len(&self) -> usize {
        self.masters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.masters.is_empty()
    }
}
