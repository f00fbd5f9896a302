//! Text transport seam for callers of the bridge.
//!
//! The bridge itself works on strings; these let an application move those
//! strings to and from a clipboard or a file.

use std::path::PathBuf;

use crate::error::Result;

/// Source and sink of exchange text
pub trait TextIo {
    fn read_text(&self) -> Result<String>;
    fn write_text(&mut self, text: &str) -> Result<()>;
}

/// In-process clipboard
#[derive(Clone, Debug, Default)]
pub struct MemoryClipboard {
    content: String,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            content: text.into(),
        }
    }
}

impl TextIo for MemoryClipboard {
    fn read_text(&self) -> Result<String> {
        Ok(self.content.clone())
    }

    fn write_text(&mut self, text: &str) -> Result<()> {
        self.content = text.to_string();
        Ok(())
    }
}

/// Exchange file on disk
#[derive(Clone, Debug)]
pub struct TextFile {
    path: PathBuf,
}

impl TextFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TextIo for TextFile {
    fn read_text(&self) -> Result<String> {
        Ok(std::fs::read_to_string(&self.path)?)
    }

    fn write_text(&mut self, text: &str) -> Result<()> {
        std::fs::write(&self.path, text)?;
        Ok(())
    }
}
