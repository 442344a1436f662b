//! File/code adapted from https://github.com/jamjamjon/usls

use anyhow::Result;
use half::{bf16, f16};
use ndarray::{Array, IxDyn};
use ort::{
    execution_providers::{ExecutionProvider,
                          CPUExecutionProvider,
                          CUDAExecutionProvider,
                          TensorRTExecutionProvider,
                          CoreMLExecutionProvider},
    session::builder::{GraphOptimizationLevel, SessionBuilder},
    session::{Session, SessionInputValue},
    tensor::TensorElementType,
    value::{DynValue, Value, ValueType},
};
use crate::common::InferenceDevice;
use crate::data::{ConfigOrt, TimeCalc, CROSS_MARK};
use crate::data::X;
use crate::utils::human_bytes;

/// ONNX Runtime tensor attributes containing names, data types, and dimensions.
#[derive(Debug, Clone, Default)]
pub struct OrtTensorAttr {
    /// Tensor names.
    pub names: Vec<String>,
    /// Tensor data types.
    pub dtypes: Vec<TensorElementType>,
    /// Tensor dimensions for each tensor, `0` marking a dynamic axis.
    pub dimss: Vec<Vec<usize>>,
}

/// ONNXRuntime Backend
///
/// Owns one session for its whole lifetime; `run` takes `&mut self`, so a session
/// is never driven from two calls at once.
pub struct OrtEngine {
    session: Session,
    device: InferenceDevice,
    inputs_attrs: OrtTensorAttr,
    outputs_attrs: OrtTensorAttr,
    profile: bool,
    infer_time: TimeCalc,
}

impl std::fmt::Debug for OrtEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrtEngine")
            .field("device", &self.device)
            .field("inputs", &self.inputs_attrs)
            .field("outputs", &self.outputs_attrs)
            .finish()
    }
}

impl OrtEngine {
    pub fn new(config: &ConfigOrt) -> Result<Self> {
        if !config.onnx_path.is_file() {
            anyhow::bail!("{CROSS_MARK} Model file not found: {}", config.onnx_path.display());
        }

        if let Some(ort_lib_path) = &config.ort_lib_path {
            match ort::init_from(ort_lib_path).commit() {
                Ok(_) => {},
                Err(e) => anyhow::bail!("Failed to commit ORT from {}: {:?}", ort_lib_path, e),
            };
        }

        let mut builder = Session::builder()?;

        let mut device = config.device;
        match device {
            InferenceDevice::TensorRT(device_id) => {
                Self::build_trt(&mut builder, device_id, config.trt_engine_cache_enable)?;
            }
            InferenceDevice::CUDA(device_id) => {
                Self::build_cuda(&mut builder, device_id).unwrap_or_else(|err| {
                    log::warn!("{err}, Using cpu");
                    device = InferenceDevice::CPU;
                })
            }
            InferenceDevice::CoreML(_) => Self::build_coreml(&mut builder).unwrap_or_else(|err| {
                log::warn!("{err}, Using cpu");
                device = InferenceDevice::CPU;
            }),
            InferenceDevice::CPU => {
                Self::build_cpu(&mut builder)?;
            }
        }

        if let Some(n) = config.intra_threads {
            builder = builder.with_intra_threads(n)?;
        }

        let session = builder
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .commit_from_file(&config.onnx_path)?;

        let inputs_attrs = Self::io_attrs(session.inputs.iter().map(|x| (&x.name, &x.input_type)))?;
        let outputs_attrs = Self::io_attrs(session.outputs.iter().map(|x| (&x.name, &x.output_type)))?;
        if inputs_attrs.names.is_empty() || outputs_attrs.names.is_empty() {
            anyhow::bail!("{CROSS_MARK} Model exposes no tensor inputs or outputs");
        }

        // summary
        let model_size = std::fs::metadata(&config.onnx_path).map(|m| m.len()).unwrap_or(0);
        log::info!(
            "Backend: ONNXRuntime | Model: {} ({}B) | Device: {} | Inputs: {:?} {:?} | Outputs: {:?} {:?}",
            config.onnx_path.display(),
            human_bytes(model_size as f64),
            device,
            inputs_attrs.names,
            inputs_attrs.dimss,
            outputs_attrs.names,
            outputs_attrs.dimss,
        );

        Ok(Self {
            session,
            device,
            inputs_attrs,
            outputs_attrs,
            profile: config.profile,
            infer_time: TimeCalc::default(),
        })
    }

    fn build_trt(builder: &mut SessionBuilder, device_id: usize, engine_cache_enable: bool) -> Result<()> {
        let trt = TensorRTExecutionProvider::default()
            .with_device_id(device_id as i32)
            .with_engine_cache(engine_cache_enable)
            .with_engine_cache_path("trt-cache");
        if trt.is_available()? {
            match trt.register(builder) {
                Ok(_) => { }
                Err(err) => { anyhow::bail!("{CROSS_MARK} TensorRT initialization failed: {:?}", err) }
            }
            log::info!("Initial model serialization with TensorRT may take some time...");
            Ok(())
        } else {
            anyhow::bail!("{CROSS_MARK} TensorRT execution provider not available")
        }
    }

    fn build_cuda(builder: &mut SessionBuilder, device_id: usize) -> Result<()> {
        let ep = CUDAExecutionProvider::default()
            .with_device_id(device_id as i32);
        if ep.is_available()? {
            match ep.register(builder) {
                Ok(_) => { }
                Err(err) => { anyhow::bail!("{CROSS_MARK} CUDA initialization failed: {:?}", err) }
            }
            Ok(())
        } else {
            anyhow::bail!("{CROSS_MARK} CUDA execution provider not available")
        }
    }

    fn build_coreml(builder: &mut SessionBuilder) -> Result<()> {
        let ep = CoreMLExecutionProvider::default();
        if ep.is_available()? {
            match ep.register(builder) {
                Ok(_) => { }
                Err(err) => { anyhow::bail!("{CROSS_MARK} CoreML initialization failed: {:?}", err) }
            }
            Ok(())
        } else {
            anyhow::bail!("{CROSS_MARK} CoreML execution provider not available")
        }
    }

    fn build_cpu(builder: &mut SessionBuilder) -> Result<()> {
        let ep = CPUExecutionProvider::default();
        if ep.is_available()? {
            match ep.register(builder) {
                Ok(_) => { }
                Err(err) => { anyhow::bail!("{CROSS_MARK} CPU initialization failed: {:?}", err) }
            }
            Ok(())
        } else {
            anyhow::bail!("{CROSS_MARK} CPU execution provider not available")
        }
    }

    fn tensor_preprocess(x: &X, dtype: &TensorElementType) -> Result<DynValue> {
        let x = match dtype {
            TensorElementType::Float32 => Value::from_array(x.0.clone())?.into_dyn(),
            TensorElementType::Float64 => Value::from_array(x.mapv(|x_| x_ as f64))?.into_dyn(),
            TensorElementType::Float16 => Value::from_array(x.mapv(f16::from_f32))?.into_dyn(),
            TensorElementType::Bfloat16 => Value::from_array(x.mapv(bf16::from_f32))?.into_dyn(),
            TensorElementType::Int8 => Value::from_array(x.mapv(|x_| x_ as i8))?.into_dyn(),
            TensorElementType::Int16 => Value::from_array(x.mapv(|x_| x_ as i16))?.into_dyn(),
            TensorElementType::Int32 => Value::from_array(x.mapv(|x_| x_ as i32))?.into_dyn(),
            TensorElementType::Int64 => Value::from_array(x.mapv(|x_| x_ as i64))?.into_dyn(),
            TensorElementType::Uint8 => Value::from_array(x.mapv(|x_| x_ as u8))?.into_dyn(),
            TensorElementType::Uint16 => Value::from_array(x.mapv(|x_| x_ as u16))?.into_dyn(),
            TensorElementType::Uint32 => Value::from_array(x.mapv(|x_| x_ as u32))?.into_dyn(),
            TensorElementType::Uint64 => Value::from_array(x.mapv(|x_| x_ as u64))?.into_dyn(),
            TensorElementType::Bool => Value::from_array(x.mapv(|x_| x_ != 0.))?.into_dyn(),
            _ => anyhow::bail!("Unsupported ort input tensor type: {:?}", dtype),
        };
        Ok(x)
    }

    fn tensor_postprocess(x: &DynValue, dtype: &TensorElementType) -> Result<Array<f32, IxDyn>> {
        fn _extract_and_convert<T>(x: &DynValue, map_fn: impl Fn(T) -> f32) -> Result<Array<f32, IxDyn>>
        where
            T: Clone + 'static + ort::tensor::PrimitiveTensorElementType,
        {
            Ok(x.try_extract_array::<T>()?.mapv(map_fn))
        }
        match dtype {
            TensorElementType::Float32 => _extract_and_convert::<f32>(x, |x| x),
            TensorElementType::Float16 => _extract_and_convert::<f16>(x, f16::to_f32),
            TensorElementType::Bfloat16 => _extract_and_convert::<bf16>(x, bf16::to_f32),
            TensorElementType::Float64 => _extract_and_convert::<f64>(x, |x| x as f32),
            TensorElementType::Int64 => _extract_and_convert::<i64>(x, |x| x as f32),
            TensorElementType::Int32 => _extract_and_convert::<i32>(x, |x| x as f32),
            TensorElementType::Int16 => _extract_and_convert::<i16>(x, |x| x as f32),
            TensorElementType::Int8 => _extract_and_convert::<i8>(x, |x| x as f32),
            TensorElementType::Uint64 => _extract_and_convert::<u64>(x, |x| x as f32),
            TensorElementType::Uint32 => _extract_and_convert::<u32>(x, |x| x as f32),
            TensorElementType::Uint16 => _extract_and_convert::<u16>(x, |x| x as f32),
            TensorElementType::Uint8 => _extract_and_convert::<u8>(x, |x| x as f32),
            TensorElementType::Bool => _extract_and_convert::<bool>(x, |x| x as u8 as f32),
            _ => Err(anyhow::anyhow!("Unsupported ort output tensor type: {:?}", dtype)),
        }
    }

    /// Runs the session on `xs` (one tensor per model input, in order) and returns
    /// every output as f32, in the model's output order.
    pub fn run(&mut self, xs: Vec<X>) -> Result<Vec<X>> {
        if xs.len() != self.inputs_attrs.names.len() {
            anyhow::bail!(
                "Model expects {} input tensors, got {}",
                self.inputs_attrs.names.len(),
                xs.len()
            );
        }

        // alignment
        let t_pre = std::time::Instant::now();
        let mut xs_ = Vec::new();
        for (dtype, x) in self.inputs_attrs.dtypes.iter().zip(xs.iter()) {
            xs_.push(Into::<SessionInputValue<'_>>::into(Self::tensor_preprocess(
                x, dtype,
            )?));
        }
        let t_pre = t_pre.elapsed();
        self.infer_time.add_or_push(0, t_pre);

        // inference
        let t_run = std::time::Instant::now();
        let outputs = self.session.run(&xs_[..])?;
        let t_run = t_run.elapsed();
        self.infer_time.add_or_push(1, t_run);

        // extract
        let t_post = std::time::Instant::now();
        let mut ys = Vec::with_capacity(self.outputs_attrs.names.len());
        for (dtype, name) in self.outputs_attrs.dtypes.iter().zip(self.outputs_attrs.names.iter()) {
            let y = Self::tensor_postprocess(&outputs[name.as_str()], dtype)?;
            ys.push(X::from(y));
        }
        let t_post = t_post.elapsed();
        self.infer_time.add_or_push(2, t_post);
        self.infer_time.tick();

        if self.profile {
            log::info!(
                "[Profile] {:?} ({:?} avg) [alignment: {:?} | inference: {:?} | to_f32: {:?}]",
                t_pre + t_run + t_post,
                self.infer_time.avg(),
                t_pre,
                t_run,
                t_post,
            );
        }

        Ok(ys)
    }

    fn io_attrs<'a>(values: impl Iterator<Item = (&'a String, &'a ValueType)>) -> Result<OrtTensorAttr> {
        let mut attrs = OrtTensorAttr::default();
        for (name, value_type) in values {
            match value_type {
                ValueType::Tensor { ty, shape, .. } => {
                    attrs.names.push(name.to_string());
                    attrs.dtypes.push(*ty);
                    attrs.dimss.push(shape.iter().map(|&d| if d < 0 { 0 } else { d as usize }).collect());
                }
                other => anyhow::bail!("Unsupported non-tensor model io `{}`: {:?}", name, other),
            }
        }
        Ok(attrs)
    }

    pub fn out_dimss(&self) -> &Vec<Vec<usize>> {
        &self.outputs_attrs.dimss
    }

    pub fn out_names(&self) -> &Vec<String> {
        &self.outputs_attrs.names
    }

    pub fn in_dimss(&self) -> &Vec<Vec<usize>> {
        &self.inputs_attrs.dimss
    }

    pub fn in_names(&self) -> &Vec<String> {
        &self.inputs_attrs.names
    }

    pub fn device(&self) -> &InferenceDevice {
        &self.device
    }

    /// Static size of the `ii`-th axis of the first input, `None` when dynamic or absent.
    pub fn input_dim(&self, ii: usize) -> Option<usize> {
        self.inputs_attrs
            .dimss
            .first()
            .and_then(|dims| dims.get(ii))
            .copied()
            .filter(|&d| d > 0)
    }

    pub fn try_fetch(&self, key: &str) -> Option<String> {
        match self.session.metadata() {
            Err(_) => None,
            Ok(metadata) => metadata.custom(key).unwrap_or_default(),
        }
    }
}
