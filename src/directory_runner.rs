use std::path::{Path, PathBuf};
use crate::alpr::Alpr;
use crate::common::{has_image_extension, AlprError, PlateResult};

/// Outcome of running the pipeline over a directory.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub processed: Vec<(PathBuf, Vec<PlateResult>)>,
    pub failures: Vec<(PathBuf, AlprError)>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.processed.len() + self.failures.len()
    }

    pub fn decode_failures(&self) -> usize {
        self.failures.iter().filter(|(_, err)| err.is_decode()).count()
    }
}

/// Image files (`jpg`, `jpeg`, `png`, any case) directly inside `dir`, sorted by path.
pub fn collect_images<P: AsRef<Path>>(dir: P) -> crate::Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(AlprError::invalid_input(format!("{} is not a directory", dir.display())));
    }

    let mut images = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && has_image_extension(&path) {
            images.push(path);
        }
    }
    images.sort();
    Ok(images)
}

/// Runs `alpr` over every image in `dir`; a failing image is logged and recorded, never fatal.
pub fn run_directory<P: AsRef<Path>>(alpr: &mut Alpr, dir: P) -> crate::Result<BatchReport> {
    Ok(run_images(alpr, collect_images(dir)?))
}

pub fn run_images(alpr: &mut Alpr, images: Vec<PathBuf>) -> BatchReport {
    let mut report = BatchReport::default();
    for path in images {
        match alpr.predict_path(&path) {
            Ok(plates) => {
                log::debug!("{}: {} plate(s)", path.display(), plates.len());
                report.processed.push((path, plates));
            }
            Err(err) => {
                log::error!("Error processing {}: {}", path.display(), err);
                report.failures.push((path, err));
            }
        }
    }
    report
}
