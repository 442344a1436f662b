use std::time::{Duration, Instant};
use crate::data::X;
use crate::utils;

/// Preprocess, run, postprocess: the three steps every ONNX Runtime backed adapter goes through.
pub trait InferenceProcess: Sized {
    type Input;
    type Output;
    type Config;

    /// Builds the adapter and its session from `config`.
    fn new(config: Self::Config) -> anyhow::Result<Self>;

    /// Pre-process the input data.
    fn preprocess(&mut self, x: &Self::Input) -> anyhow::Result<Vec<X>>;

    /// Executes the model on the preprocessed data.
    fn inference(&mut self, xs: Vec<X>) -> anyhow::Result<Vec<X>>;

    /// Post-process the model's output.
    fn postprocess(&self, ys: Vec<X>, x0: &Self::Input) -> anyhow::Result<Self::Output>;

    /// Executes the full pipeline.
    fn run(&mut self, x: &Self::Input) -> anyhow::Result<Self::Output> {
        let ys = self.preprocess(x)?;
        let ys = self.inference(ys)?;
        self.postprocess(ys, x)
    }

    /// Executes the full pipeline, tracing the time spent in each step.
    fn forward(&mut self, x: &Self::Input, profile: bool) -> anyhow::Result<Self::Output> {
        let detect_time = Instant::now();

        let t_pre = Instant::now();
        let ys = self.preprocess(x)?;
        let t_pre = t_pre.elapsed();

        let mut mark = utils::trace("TIME", "Preprocessing input", detect_time, Duration::ZERO);

        let t_exe = Instant::now();
        let ys = self.inference(ys)?;
        let t_exe = t_exe.elapsed();

        mark = utils::trace("TIME", "Inference run", detect_time, mark);

        let t_post = Instant::now();
        let ys = self.postprocess(ys, x)?;
        let t_post = t_post.elapsed();

        utils::trace("TIME", "Postprocessing", detect_time, mark);

        if profile {
            log::info!("> Preprocess: {t_pre:?} | Inference: {t_exe:?} | Postprocess: {t_post:?}");
        }

        Ok(ys)
    }
}
