use std::path::{Path, PathBuf};
use image::DynamicImage;
use crate::common::AlprError;
use crate::data::create_directory;

/// Receives every crop exactly as the OCR model will see it, after resize and colour conversion.
///
/// Opt-in debugging aid; a failing sink is logged and never fails a prediction.
pub trait PreprocessTrace: Send {
    fn record(&mut self, image: &DynamicImage) -> anyhow::Result<()>;

    /// Records `image`, downgrading a failure to a warning. Returns whether it was recorded.
    fn record_logged(&mut self, image: &DynamicImage) -> bool {
        match self.record(image) {
            Ok(()) => true,
            Err(err) => {
                log::warn!("Failed to trace preprocessed plate: {err:#}");
                false
            }
        }
    }
}

/// Writes each preprocessed crop as `preprocessed_<timestamp>_<seq>.png` under a directory.
#[derive(Debug)]
pub struct DirectoryTrace {
    dir: PathBuf,
    seq: u64,
}

impl DirectoryTrace {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Result<Self, AlprError> {
        let dir = dir.into();
        create_directory(&dir)?;
        Ok(Self { dir, seq: 0 })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl PreprocessTrace for DirectoryTrace {
    fn record(&mut self, image: &DynamicImage) -> anyhow::Result<()> {
        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let path = self.dir.join(format!("preprocessed_{}_{:06}.png", timestamp, self.seq));
        self.seq += 1;
        image.save(&path)?;
        Ok(())
    }
}
