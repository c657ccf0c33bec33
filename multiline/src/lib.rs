//! Synthesizes the masters of a multi-line stroke font from a single
//! reference outline.
//!
//! The reference (first) master of each glyph holds stroked paths. Every path
//! is duplicated at an exact perpendicular distance, the masters are filled
//! from a per master stroke table, bracket layers are added for discrete
//! substitutions, and the side bearings of every layer are reconciled so the
//! advance width is preserved.

#[cfg(feature = "cli")]
mod args;
pub mod bracket;
mod config;
pub mod duplicate;
pub mod engine;
mod error;
pub mod geometry;
pub mod metrics;
pub mod offset;
pub mod profile;
pub mod synthesize;

#[cfg(feature = "cli")]
pub use args::{Args, Command, FontArgs, SettingsArgs};
pub use config::{Settings, SettingsOverrides};
pub use engine::{Engine, GlyphReport, GlyphSelection, RunReport};
pub use error::Error;
