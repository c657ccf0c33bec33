use std::{io, path::PathBuf};

use smol_str::SmolStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("io failed for '{path}': '{source}'")]
    FileIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    YamlSerError(#[from] serde_yaml::Error),
    #[error(transparent)]
    Model(#[from] glyphs_model::error::Error),
    #[error("Need {required} masters, the font has {found}")]
    NotEnoughMasters { required: usize, found: usize },
    #[error("'{glyph}' has no layer for master '{master}'")]
    MissingMasterLayer { glyph: SmolStr, master: SmolStr },
    #[error("Bad glyph name filter: {0}")]
    InvalidGlyphFilter(#[from] regex::Error),
    #[error("Processing panicked: '{0}'")]
    Panic(String),
    #[error("{0} glyph(s) failed, see log for details")]
    GlyphsFailed(usize),
}
