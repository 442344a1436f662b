use std::path::PathBuf;
use anyhow::Result;
use clap::Parser;

use bvr_alpr::{directory_runner, Alpr, AlprConfig, InferenceDevice};

/// Reads license plates in every .jpg/.jpeg/.png image of a directory.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Directory holding the images
    #[arg(value_name = "DIR")]
    pub dir: PathBuf,

    /// Detector preset name
    #[arg(long, value_name = "NAME")]
    pub detector_model: Option<String>,

    /// OCR preset name
    #[arg(long, value_name = "NAME")]
    pub ocr_model: Option<String>,

    /// Directory holding `<preset>.onnx` model files
    #[arg(long, value_name = "DIR")]
    pub models_dir: Option<PathBuf>,

    /// ONNX Runtime shared library to load
    #[arg(long, value_name = "PATH")]
    pub ort_lib_path: Option<String>,

    /// Inference device: cpu, cuda, tensorrt or coreml
    #[arg(long, value_name = "DEVICE")]
    pub device: Option<String>,

    #[arg(long, default_value_t = 0)]
    pub device_id: usize,

    /// Detector confidence threshold
    #[arg(long, value_name = "CONF")]
    pub conf: Option<f32>,

    /// Save every cropped plate into this directory
    #[arg(long, value_name = "DIR")]
    pub save_crops: Option<PathBuf>,

    /// Dump every preprocessed OCR input into this directory
    #[arg(long, value_name = "DIR")]
    pub trace_dir: Option<PathBuf>,

    /// ONNX Runtime intra-op threads per session
    #[arg(long, value_name = "N")]
    pub threads: Option<usize>,

    /// JSON file with an `AlprConfig`; flags override its values
    #[arg(long, value_name = "JSON")]
    pub config: Option<PathBuf>,

    /// Print one JSON line per image instead of the plate text
    #[arg(long)]
    pub json: bool,
}

impl Args {
    fn alpr_config(&self) -> Result<AlprConfig> {
        let mut config = match &self.config {
            Some(path) => AlprConfig::from_json_file(path)?,
            None => AlprConfig::default(),
        };

        if let Some(name) = &self.detector_model {
            config.detector_model = Some(name.clone());
        }
        if let Some(name) = &self.ocr_model {
            config.ocr_model = Some(name.clone());
        }
        if self.models_dir.is_some() {
            config.models_dir = self.models_dir.clone();
        }
        if self.ort_lib_path.is_some() {
            config.ort_lib_path = self.ort_lib_path.clone();
        }
        if let Some(device) = &self.device {
            config.device = InferenceDevice::from_str(device, self.device_id).ok_or_else(|| {
                anyhow::anyhow!(
                    "Unknown device `{}`, expected one of {:?}",
                    device,
                    InferenceDevice::all_inference_devices()
                )
            })?;
        }
        if let Some(conf) = self.conf {
            config.detector_conf_threshold = conf;
        }
        if let Some(dir) = &self.save_crops {
            config.save_cropped_plates = true;
            config.cropped_plates_dir = dir.clone();
        }
        if self.trace_dir.is_some() {
            config.ocr_trace_dir = self.trace_dir.clone();
        }
        if self.threads.is_some() {
            config.intra_threads = self.threads;
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let config = args.alpr_config()?;

    log::info!(
        "Detector: {} | OCR: {} | Device: {}",
        config.detector_model.as_deref().unwrap_or("none"),
        config.ocr_model.as_deref().unwrap_or("none"),
        config.device
    );

    let images = directory_runner::collect_images(&args.dir)?;
    log::info!("Found {} image(s) in {}", images.len(), args.dir.display());

    let mut alpr = Alpr::new(config)?;

    let now = std::time::Instant::now();
    for path in images {
        // one image at a time so results print as they come
        let report = directory_runner::run_images(&mut alpr, vec![path]);
        for (path, plates) in report.processed {
            if args.json {
                println!("{}", serde_json::json!({ "image": path, "plates": plates }));
            } else {
                match plates.first().and_then(|plate| plate.text()) {
                    Some(text) => println!("{}: {}", path.display(), text),
                    None => println!("{}: no plate recognised", path.display()),
                }
            }
        }
    }
    log::info!("Done in {:.2?}", now.elapsed());

    Ok(())
}
