//! Settings for a synthesis run.
//!
//! Settings come from an optional YAML file, then command line overrides.
//! Values are parsed leniently: numbers may be written as strings, and
//! anything that does not parse falls back to its default with a warning
//! rather than failing the run.

use std::{fs, path::Path};

use log::warn;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use smol_str::SmolStr;

use crate::{
    bracket::BracketRule,
    error::Error,
    profile::{
        MasterStroke, Preset, StrokeProfile, StrokeSize, StrokeWidths, DEFAULT_MASTER_STROKES,
        MASTER_COUNT,
    },
};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawSettings", rename_all = "camelCase")]
pub struct Settings {
    /// Distance between the two halves of a split stroke, or the offset of
    /// a single duplicate.
    pub original_offset: f64,
    pub min_stroke_width: f64,
    pub medium_stroke_width: f64,
    pub max_stroke_width: f64,
    /// Split centered strokes into two duplicates that keep the original's
    /// position on the dominant axis.
    pub maintain_y_position: bool,
    pub preset: Preset,
    /// Axis ids the non-reference bracket layers are conditioned on.
    pub bracket_axes: Vec<SmolStr>,
    pub bracket_threshold: f64,
    /// Stroke sizes for the per-master preset.
    pub masters: [MasterStroke; MASTER_COUNT],
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            original_offset: -70.0,
            min_stroke_width: 10.0,
            medium_stroke_width: 40.0,
            max_stroke_width: 80.0,
            maintain_y_position: true,
            preset: Preset::TwoAxis,
            bracket_axes: vec![SmolStr::new("a01"), SmolStr::new("a02")],
            bracket_threshold: 100.0,
            masters: DEFAULT_MASTER_STROKES,
        }
    }
}

/// Command line values, still unparsed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SettingsOverrides {
    pub original_offset: Option<String>,
    pub min_stroke_width: Option<String>,
    pub medium_stroke_width: Option<String>,
    pub max_stroke_width: Option<String>,
    pub maintain_y_position: Option<String>,
    pub preset: Option<Preset>,
    pub bracket_axes: Option<String>,
    pub bracket_threshold: Option<String>,
}

impl Settings {
    pub fn load(file: &Path) -> Result<Settings, Error> {
        let yml = fs::read_to_string(file).map_err(|source| Error::FileIo {
            path: file.to_path_buf(),
            source,
        })?;
        Settings::from_yaml(&yml)
    }

    pub fn from_yaml(yml: &str) -> Result<Settings, Error> {
        if yml.trim().is_empty() {
            return Ok(Settings::default());
        }
        serde_yaml::from_str(yml).map_err(Into::into)
    }

    /// Apply command line values on top; unparseable ones reset to the default.
    pub fn apply_overrides(&mut self, overrides: &SettingsOverrides) {
        let defaults = Settings::default();
        let text = |value: &Option<String>| value.clone().map(Value::String);

        if let Some(v) = text(&overrides.original_offset) {
            self.original_offset = number("originalOffset", &v, defaults.original_offset);
        }
        if let Some(v) = text(&overrides.min_stroke_width) {
            self.min_stroke_width = number("minStrokeWidth", &v, defaults.min_stroke_width);
        }
        if let Some(v) = text(&overrides.medium_stroke_width) {
            self.medium_stroke_width =
                number("mediumStrokeWidth", &v, defaults.medium_stroke_width);
        }
        if let Some(v) = text(&overrides.max_stroke_width) {
            self.max_stroke_width = number("maxStrokeWidth", &v, defaults.max_stroke_width);
        }
        if let Some(v) = text(&overrides.maintain_y_position) {
            self.maintain_y_position =
                boolean("maintainYPosition", &v, defaults.maintain_y_position);
        }
        if let Some(preset) = overrides.preset {
            self.preset = preset;
        }
        if let Some(v) = text(&overrides.bracket_axes) {
            self.bracket_axes = axes(&v, defaults.bracket_axes);
        }
        if let Some(v) = text(&overrides.bracket_threshold) {
            self.bracket_threshold = number("bracketThreshold", &v, defaults.bracket_threshold);
        }
    }

    pub fn stroke_widths(&self) -> StrokeWidths {
        StrokeWidths {
            min: self.min_stroke_width,
            medium: self.medium_stroke_width,
            max: self.max_stroke_width,
        }
    }

    pub fn stroke_profile(&self) -> StrokeProfile {
        match self.preset {
            Preset::TwoAxis => StrokeProfile::two_axis(self.stroke_widths()),
            Preset::SingleAxis => StrokeProfile::single_axis(self.stroke_widths()),
            Preset::PerMaster => StrokeProfile::per_master(&self.masters),
        }
    }

    pub fn bracket_rule(&self) -> BracketRule {
        BracketRule {
            axes: self.bracket_axes.clone(),
            threshold: self.bracket_threshold,
        }
    }
}

/// The settings file as written, before lenient parsing.
#[derive(Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawSettings {
    original_offset: Option<Value>,
    min_stroke_width: Option<Value>,
    medium_stroke_width: Option<Value>,
    max_stroke_width: Option<Value>,
    maintain_y_position: Option<Value>,
    preset: Option<Value>,
    bracket_axes: Option<Value>,
    bracket_threshold: Option<Value>,
    masters: Option<Value>,
}

impl From<RawSettings> for Settings {
    fn from(raw: RawSettings) -> Self {
        let defaults = Settings::default();
        let num = |name: &str, value: Option<Value>, default: f64| match value {
            Some(value) => number(name, &value, default),
            None => default,
        };
        Settings {
            original_offset: num("originalOffset", raw.original_offset, defaults.original_offset),
            min_stroke_width: num("minStrokeWidth", raw.min_stroke_width, defaults.min_stroke_width),
            medium_stroke_width: num(
                "mediumStrokeWidth",
                raw.medium_stroke_width,
                defaults.medium_stroke_width,
            ),
            max_stroke_width: num("maxStrokeWidth", raw.max_stroke_width, defaults.max_stroke_width),
            maintain_y_position: raw
                .maintain_y_position
                .map(|v| boolean("maintainYPosition", &v, defaults.maintain_y_position))
                .unwrap_or(defaults.maintain_y_position),
            preset: raw
                .preset
                .map(|v| preset(&v, defaults.preset))
                .unwrap_or(defaults.preset),
            bracket_axes: match raw.bracket_axes {
                Some(v) => axes(&v, defaults.bracket_axes),
                None => defaults.bracket_axes,
            },
            bracket_threshold: num(
                "bracketThreshold",
                raw.bracket_threshold,
                defaults.bracket_threshold,
            ),
            masters: raw
                .masters
                .map(|v| master_strokes(&v, defaults.masters))
                .unwrap_or(defaults.masters),
        }
    }
}

fn parse_number(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

fn number(name: &str, value: &Value, default: f64) -> f64 {
    if value.is_null() {
        return default;
    }
    parse_number(value).unwrap_or_else(|| {
        warn!("Invalid {name} {value:?}, using {default}");
        default
    })
}

fn boolean(name: &str, value: &Value, default: bool) -> bool {
    let parsed = match value {
        Value::Null => return default,
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|n| n != 0.0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Some(true),
            "false" | "no" | "off" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    };
    parsed.unwrap_or_else(|| {
        warn!("Invalid {name} {value:?}, using {default}");
        default
    })
}

fn preset(value: &Value, default: Preset) -> Preset {
    serde_yaml::from_value(value.clone()).unwrap_or_else(|e| {
        warn!("Invalid preset {value:?} ({e}), using {default:?}");
        default
    })
}

/// A list of axis ids, or a single comma separated string.
fn axes(value: &Value, default: Vec<SmolStr>) -> Vec<SmolStr> {
    let parsed: Option<Vec<SmolStr>> = match value {
        Value::String(s) => Some(
            s.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(SmolStr::new)
                .collect(),
        ),
        Value::Sequence(items) => items
            .iter()
            .map(|item| item.as_str().map(|s| SmolStr::new(s.trim())))
            .collect(),
        _ => None,
    };
    parsed.unwrap_or_else(|| {
        warn!("Invalid bracketAxes {value:?}, using {default:?}");
        default
    })
}

/// `{width, height}`, or a single number for a square stroke.
fn stroke_size(name: &str, value: Option<&Value>, default: StrokeSize) -> StrokeSize {
    match value {
        None | Some(Value::Null) => default,
        Some(Value::Mapping(_)) => {
            let field = |key: &str, default: f64| match value.and_then(|v| v.get(key)) {
                Some(v) => number(&format!("{name}.{key}"), v, default),
                None => default,
            };
            StrokeSize::new(field("width", default.width), field("height", default.height))
        }
        Some(scalar) => match parse_number(scalar) {
            Some(size) => StrokeSize::square(size),
            None => {
                warn!("Invalid {name} {scalar:?}, using {default:?}");
                default
            }
        },
    }
}

fn master_strokes(
    value: &Value,
    default: [MasterStroke; MASTER_COUNT],
) -> [MasterStroke; MASTER_COUNT] {
    let Value::Sequence(entries) = value else {
        warn!("Invalid masters {value:?}, using defaults");
        return default;
    };
    if entries.len() > MASTER_COUNT {
        warn!(
            "{} master stroke entries, only the first {MASTER_COUNT} are used",
            entries.len()
        );
    }
    let mut strokes = default;
    for (idx, (entry, stroke)) in entries.iter().zip(strokes.iter_mut()).enumerate() {
        let name = format!("masters[{idx}]");
        stroke.original = stroke_size(
            &format!("{name}.original"),
            entry.get("original"),
            stroke.original,
        );
        stroke.duplicate = stroke_size(
            &format!("{name}.duplicate"),
            entry.get("duplicate"),
            stroke.duplicate,
        );
    }
    strokes
}
