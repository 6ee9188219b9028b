//! Path helpers: create data directories lazily and return safe paths

use crate::config::Config;
use crate::error::Result;
use std::path::PathBuf;

/// Layout of the on-disk data root
#[derive(Debug, Clone)]
pub struct DataPaths {
    pub root: PathBuf,
}

impl DataPaths {
    pub fn from_config(config: &Config) -> Self {
        Self {
            root: config.runtime.data_dir.clone(),
        }
    }

    pub fn db_path(&self) -> PathBuf {
        self.root.join("veridex.sqlite3")
    }

    pub fn raw_dir(&self, source_id: &str) -> Result<PathBuf> {
        self.ensure(self.root.join("raw").join(source_id))
    }

    pub fn transcript_dir(&self, source_id: &str) -> Result<PathBuf> {
        self.ensure(self.root.join("transcripts").join(source_id))
    }

    pub fn transcript_path(&self, source_id: &str) -> Result<PathBuf> {
        Ok(self.transcript_dir(source_id)?.join("transcript.json"))
    }

    pub fn export_dir(&self, source_id: &str) -> Result<PathBuf> {
        self.ensure(self.root.join("exports").join(source_id))
    }

    pub fn edgar_cache_dir(&self) -> Result<PathBuf> {
        self.ensure(self.root.join("cache").join("edgar"))
    }

    pub fn datasets_dir(&self) -> Result<PathBuf> {
        self.ensure(self.root.join("datasets"))
    }

    fn ensure(&self, p: PathBuf) -> Result<PathBuf> {
        std::fs::create_dir_all(&p)?;
        Ok(p)
    }
}
