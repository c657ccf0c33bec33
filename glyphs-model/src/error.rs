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
    #[error("Unable to parse {0}: {1}")]
    ParseError(PathBuf, String),
    #[error("Invalid font json: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("Glyph '{glyph}' has no layer for master '{master}'")]
    MissingMasterLayer { glyph: SmolStr, master: SmolStr },
    #[error("Glyph '{glyph}' has {count} layers for master '{master}'")]
    DuplicateMasterLayer {
        glyph: SmolStr,
        master: SmolStr,
        count: usize,
    },
    #[error("Glyph '{glyph}' already has a layer '{layer_id}'")]
    DuplicateLayerId { glyph: SmolStr, layer_id: SmolStr },
    #[error("Invalid path: {0}")]
    InvalidPath(String),
}
