//! Fonts, masters, glyphs and layers.
//!
//! The layout follows the Glyphs 3 object model closely enough that a layer
//! behaves the way a script author expects: master layers are keyed by master
//! id, everything else hangs off a master through `associatedMasterId`, and
//! side bearings are derived from the outline rather than stored.

use std::{collections::BTreeMap, fmt, fs, path};

use kurbo::Rect;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::{error::Error, path::Path};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Font {
    pub family_name: String,
    #[serde(default)]
    pub axes: Vec<Axis>,
    #[serde(rename = "fontMaster")]
    pub masters: Vec<FontMaster>,
    #[serde(default)]
    pub glyphs: Vec<Glyph>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Axis {
    pub name: String,
    pub tag: String,
    /// The key used by axis rules, e.g. `a01`.
    pub id: SmolStr,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FontMaster {
    pub id: SmolStr,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub axes_values: Vec<OrderedFloat<f64>>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Glyph {
    #[serde(rename = "glyphname")]
    pub name: SmolStr,
    #[serde(default)]
    pub layers: Vec<Layer>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layer {
    pub layer_id: SmolStr,
    /// Present on every layer that is not itself a master layer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub associated_master_id: Option<SmolStr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub axis_rules: Option<AxisRule>,
    pub width: f64,
    #[serde(default)]
    pub shapes: Vec<Path>,
}

/// The design space region in which a bracket layer replaces its master.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<SmolStr, AxisBounds>", into = "BTreeMap<SmolStr, AxisBounds>")]
pub enum AxisRule {
    /// No bounds at all; the layer applies everywhere.
    Unconditional,
    /// Applies while every listed axis is at or below its maximum.
    MaxThreshold(Vec<AxisMax>),
    /// Arbitrary per-axis bounds, as found in hand made files.
    Range(Vec<AxisRange>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct AxisMax {
    pub axis: SmolStr,
    pub max: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AxisRange {
    pub axis: SmolStr,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// The serialized form of one axis entry, `{"min": .., "max": ..}`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AxisBounds {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl AxisRule {
    /// A rule capping each of `axes` at `max`.
    pub fn max_threshold<I, S>(axes: I, max: f64) -> AxisRule
    where
        I: IntoIterator<Item = S>,
        S: Into<SmolStr>,
    {
        let axes: Vec<_> = axes
            .into_iter()
            .map(|axis| AxisMax {
                axis: axis.into(),
                max,
            })
            .collect();
        if axes.is_empty() {
            AxisRule::Unconditional
        } else {
            AxisRule::MaxThreshold(axes)
        }
    }

    /// Whether a design space location, keyed by axis id, falls inside the rule.
    ///
    /// An axis the rule constrains but the location omits never matches.
    pub fn matches(&self, location: &BTreeMap<SmolStr, f64>) -> bool {
        match self {
            AxisRule::Unconditional => true,
            AxisRule::MaxThreshold(axes) => axes.iter().all(|AxisMax { axis, max }| {
                location.get(axis).is_some_and(|value| value <= max)
            }),
            AxisRule::Range(axes) => axes.iter().all(|range| {
                location.get(&range.axis).is_some_and(|value| {
                    range.min.map_or(true, |min| *value >= min)
                        && range.max.map_or(true, |max| *value <= max)
                })
            }),
        }
    }
}

impl From<BTreeMap<SmolStr, AxisBounds>> for AxisRule {
    fn from(raw: BTreeMap<SmolStr, AxisBounds>) -> Self {
        if raw.is_empty() {
            return AxisRule::Unconditional;
        }
        if raw.values().all(|b| b.min.is_none() && b.max.is_some()) {
            return AxisRule::MaxThreshold(
                raw.into_iter()
                    .filter_map(|(axis, b)| b.max.map(|max| AxisMax { axis, max }))
                    .collect(),
            );
        }
        AxisRule::Range(
            raw.into_iter()
                .map(|(axis, b)| AxisRange {
                    axis,
                    min: b.min,
                    max: b.max,
                })
                .collect(),
        )
    }
}

impl From<AxisRule> for BTreeMap<SmolStr, AxisBounds> {
    fn from(rule: AxisRule) -> Self {
        match rule {
            AxisRule::Unconditional => BTreeMap::new(),
            AxisRule::MaxThreshold(axes) => axes
                .into_iter()
                .map(|a| {
                    (
                        a.axis,
                        AxisBounds {
                            min: None,
                            max: Some(a.max),
                        },
                    )
                })
                .collect(),
            AxisRule::Range(axes) => axes
                .into_iter()
                .map(|a| {
                    (
                        a.axis,
                        AxisBounds {
                            min: a.min,
                            max: a.max,
                        },
                    )
                })
                .collect(),
        }
    }
}

/// Renders like a Glyphs bracket layer name, e.g. `[a01<=100]`.
impl fmt::Display for AxisRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = match self {
            AxisRule::Unconditional => Vec::new(),
            AxisRule::MaxThreshold(axes) => axes
                .iter()
                .map(|a| format!("{}<={}", a.axis, a.max))
                .collect(),
            AxisRule::Range(axes) => axes
                .iter()
                .map(|a| match (a.min, a.max) {
                    (Some(min), Some(max)) => format!("{min}<={}<={max}", a.axis),
                    (Some(min), None) => format!("{}>={min}", a.axis),
                    (None, Some(max)) => format!("{}<={max}", a.axis),
                    (None, None) => a.axis.to_string(),
                })
                .collect(),
        };
        write!(f, "[{}]", parts.join(","))
    }
}

impl Font {
    pub fn load(font_file: &path::Path) -> Result<Font, Error> {
        let raw_content = fs::read_to_string(font_file).map_err(|source| Error::FileIo {
            path: font_file.to_path_buf(),
            source,
        })?;
        let font: Font = serde_json::from_str(&raw_content)
            .map_err(|e| Error::ParseError(font_file.to_path_buf(), e.to_string()))?;
        font.validate()?;
        Ok(font)
    }

    pub fn from_json(json: &str) -> Result<Font, Error> {
        let font: Font = serde_json::from_str(json)?;
        font.validate()?;
        Ok(font)
    }

    pub fn save(&self, font_file: &path::Path) -> Result<(), Error> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(font_file, json).map_err(|source| Error::FileIo {
            path: font_file.to_path_buf(),
            source,
        })
    }

    /// Every glyph must have exactly one layer per master.
    pub fn validate(&self) -> Result<(), Error> {
        for glyph in self.glyphs.iter() {
            glyph.validate(&self.masters)?;
        }
        Ok(())
    }

    pub fn get_glyph(&self, glyphname: &str) -> Option<&Glyph> {
        self.glyphs.iter().find(|g| g.name == glyphname)
    }

    pub fn get_glyph_mut(&mut self, glyphname: &str) -> Option<&mut Glyph> {
        self.glyphs.iter_mut().find(|g| g.name == glyphname)
    }

    pub fn get_master(&self, master_id: &str) -> Option<&FontMaster> {
        self.masters.iter().find(|m| m.id == master_id)
    }

    /// The design space location of a master, keyed by axis id.
    pub fn master_location(&self, master: &FontMaster) -> BTreeMap<SmolStr, f64> {
        self.axes
            .iter()
            .zip(master.axes_values.iter())
            .map(|(axis, value)| (axis.id.clone(), value.0))
            .collect()
    }
}

impl Glyph {
    pub fn new(name: impl Into<SmolStr>) -> Glyph {
        Glyph {
            name: name.into(),
            layers: Vec::new(),
        }
    }

    pub fn master_layer(&self, master_id: &str) -> Option<&Layer> {
        self.layers
            .iter()
            .find(|l| l.is_master_layer() && l.layer_id == master_id)
    }

    pub fn master_layer_mut(&mut self, master_id: &str) -> Option<&mut Layer> {
        self.layers
            .iter_mut()
            .find(|l| l.is_master_layer() && l.layer_id == master_id)
    }

    pub fn get_layer(&self, layer_id: &str) -> Option<&Layer> {
        self.layers.iter().find(|l| l.layer_id == layer_id)
    }

    /// Ids of every layer that is not a master layer, in layer order.
    pub fn non_master_layer_ids(&self) -> Vec<SmolStr> {
        self.layers
            .iter()
            .filter(|l| !l.is_master_layer())
            .map(|l| l.layer_id.clone())
            .collect()
    }

    pub fn bracket_layers(&self) -> impl Iterator<Item = &Layer> {
        self.layers.iter().filter(|l| l.is_bracket_layer())
    }

    pub fn remove_layer(&mut self, layer_id: &str) -> Option<Layer> {
        let idx = self.layers.iter().position(|l| l.layer_id == layer_id)?;
        Some(self.layers.remove(idx))
    }

    /// Append a layer; layer ids are unique within a glyph.
    pub fn push_layer(&mut self, layer: Layer) -> Result<(), Error> {
        if self.get_layer(&layer.layer_id).is_some() {
            return Err(Error::DuplicateLayerId {
                glyph: self.name.clone(),
                layer_id: layer.layer_id,
            });
        }
        self.layers.push(layer);
        Ok(())
    }

    /// The layer that renders this glyph for `master_id` at `location`.
    ///
    /// The first bracket layer of the master whose rule matches wins,
    /// otherwise the master layer itself.
    pub fn active_layer(
        &self,
        master_id: &str,
        location: &BTreeMap<SmolStr, f64>,
    ) -> Option<&Layer> {
        self.bracket_layers()
            .filter(|l| l.associated_master_id.as_deref() == Some(master_id))
            .find(|l| l.axis_rules.as_ref().is_some_and(|r| r.matches(location)))
            .or_else(|| self.master_layer(master_id))
    }

    fn validate(&self, masters: &[FontMaster]) -> Result<(), Error> {
        for master in masters {
            let count = self
                .layers
                .iter()
                .filter(|l| l.is_master_layer() && l.layer_id == master.id)
                .count();
            match count {
                1 => (),
                0 => {
                    return Err(Error::MissingMasterLayer {
                        glyph: self.name.clone(),
                        master: master.id.clone(),
                    })
                }
                count => {
                    return Err(Error::DuplicateMasterLayer {
                        glyph: self.name.clone(),
                        master: master.id.clone(),
                        count,
                    })
                }
            }
        }
        Ok(())
    }
}

impl Layer {
    /// The primary layer of a master.
    pub fn master(master_id: impl Into<SmolStr>, width: f64) -> Layer {
        Layer {
            layer_id: master_id.into(),
            width,
            ..Default::default()
        }
    }

    /// A layer attached to `master_id` that substitutes for it where `rule` matches.
    pub fn bracket(
        layer_id: impl Into<SmolStr>,
        master_id: impl Into<SmolStr>,
        rule: AxisRule,
        width: f64,
    ) -> Layer {
        Layer {
            layer_id: layer_id.into(),
            associated_master_id: Some(master_id.into()),
            name: Some(rule.to_string()),
            axis_rules: Some(rule),
            width,
            shapes: Vec::new(),
        }
    }

    pub fn is_master_layer(&self) -> bool {
        self.associated_master_id.is_none()
    }

    pub fn is_bracket_layer(&self) -> bool {
        !self.is_master_layer() && self.axis_rules.is_some()
    }

    pub fn master_id(&self) -> &str {
        self.associated_master_id
            .as_deref()
            .unwrap_or(self.layer_id.as_str())
    }

    pub fn clear(&mut self) {
        self.shapes.clear();
    }

    /// Union of the tight bounds of every path.
    pub fn bounds(&self) -> Option<Rect> {
        self.shapes
            .iter()
            .filter_map(Path::bounds)
            .reduce(|acc, b| acc.union(b))
    }

    /// Horizontal extent of the outline; zero for an empty layer.
    pub fn paths_width(&self) -> f64 {
        self.bounds().map(|b| b.width()).unwrap_or_default()
    }

    /// Left side bearing; an empty layer has all its space on the right.
    pub fn lsb(&self) -> f64 {
        self.bounds().map(|b| b.x0).unwrap_or_default()
    }

    pub fn rsb(&self) -> f64 {
        match self.bounds() {
            Some(bounds) => self.width - bounds.x1,
            None => self.width,
        }
    }

    /// Move the outline horizontally so its left edge sits at `lsb`.
    ///
    /// The width is unchanged. Does nothing to an empty layer.
    pub fn set_lsb(&mut self, lsb: f64) {
        let Some(bounds) = self.bounds() else {
            return;
        };
        let dx = lsb - bounds.x0;
        for path in self.shapes.iter_mut() {
            path.translate(dx, 0.0);
        }
    }

    /// Set the width so that `rsb` remains right of the outline.
    pub fn set_rsb(&mut self, rsb: f64) {
        self.width = match self.bounds() {
            Some(bounds) => bounds.x1 + rsb,
            None => rsb,
        };
    }
}
