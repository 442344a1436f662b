use std::path::Path;
use fast_image_resize::images::Image as FirImage;
use fast_image_resize::PixelType;
use image::{DynamicImage, GrayImage, RgbImage, RgbaImage};
use serde::{Deserialize, Serialize};
use crate::common::{AlprError, BoundingBox};

/// File extensions accepted wherever a frame is given by path.
pub const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Order of the three colour channels in a pixel buffer.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelOrder {
    #[default] Rgb,
    Bgr,
}

/// A frame handed to the pipeline: 8-bit, 3 channels, in a known channel order.
#[derive(Debug, Clone, Default)]
pub struct AlprImage {
    pub image: RgbImage,
    pub channel_order: ChannelOrder,
}

/// How a resize/letterbox step mapped the source frame onto the model input.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ImageTransformInfo {
    pub width_src: u32,
    pub height_src: u32,
    pub width_dst: u32,
    pub height_dst: u32,
    pub height_scale: f32,
    pub width_scale: f32,
    pub height_pad: f32,
    pub width_pad: f32,
}

impl ImageTransformInfo {
    /// Maps a point from model-input space back into source-frame space.
    pub fn to_source(&self, x: f32, y: f32) -> (f32, f32) {
        ((x - self.width_pad) / self.width_scale, (y - self.height_pad) / self.height_scale)
    }
}

impl std::ops::Deref for AlprImage {
    type Target = RgbImage;

    fn deref(&self) -> &Self::Target {
        &self.image
    }
}

impl From<DynamicImage> for AlprImage {
    fn from(image: DynamicImage) -> Self {
        Self {
            image: image.to_rgb8(),
            ..Default::default()
        }
    }
}

impl From<GrayImage> for AlprImage {
    fn from(image: GrayImage) -> Self {
        Self {
            image: DynamicImage::from(image).to_rgb8(),
            ..Default::default()
        }
    }
}

impl From<RgbImage> for AlprImage {
    fn from(image: RgbImage) -> Self {
        Self {
            image,
            ..Default::default()
        }
    }
}

impl From<RgbaImage> for AlprImage {
    fn from(image: RgbaImage) -> Self {
        Self {
            image: DynamicImage::from(image).to_rgb8(),
            ..Default::default()
        }
    }
}

impl AlprImage {
    pub fn new(image: RgbImage, channel_order: ChannelOrder) -> Self {
        Self { image, channel_order }
    }

    /// Wraps a packed, row-major, 3-channel buffer (e.g. a BGR frame from a capture device).
    pub fn from_raw(width: u32, height: u32, buffer: Vec<u8>, channel_order: ChannelOrder) -> Result<Self, AlprError> {
        let expected = width as usize * height as usize * 3;
        if buffer.len() != expected {
            return Err(AlprError::invalid_input(format!(
                "pixel buffer holds {} bytes, expected {expected} for {width}x{height}x3",
                buffer.len()
            )));
        }
        let image = RgbImage::from_raw(width, height, buffer)
            .ok_or_else(|| AlprError::invalid_input("pixel buffer does not match its dimensions"))?;
        Ok(Self::new(image, channel_order))
    }

    /// Decodes a `.jpg`/`.jpeg`/`.png` file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, AlprError> {
        let path = path.as_ref();
        if !has_image_extension(path) {
            return Err(AlprError::invalid_input(format!(
                "{} is not a supported image (expected one of {:?})",
                path.display(),
                IMAGE_EXTENSIONS
            )));
        }
        if !path.is_file() {
            return Err(AlprError::invalid_input(format!("{} does not exist", path.display())));
        }
        let image = image::open(path).map_err(|source| AlprError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from(image))
    }

    pub fn is_empty(&self) -> bool {
        self.image.width() == 0 || self.image.height() == 0
    }

    /// Fails with `InvalidInput` on a zero-sized frame.
    pub fn ensure_not_empty(&self) -> Result<(), AlprError> {
        if self.is_empty() {
            return Err(AlprError::invalid_input(format!(
                "empty frame ({}x{})",
                self.image.width(),
                self.image.height()
            )));
        }
        Ok(())
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Pixel buffer in the requested channel order, swapping R and B when they differ.
    pub fn to_channel_order(&self, order: ChannelOrder) -> RgbImage {
        let mut image = self.image.clone();
        if order != self.channel_order {
            image.pixels_mut().for_each(|p| p.0.swap(0, 2));
        }
        image
    }

    /// Copies out the region under `bbox`, keeping the channel order.
    pub fn crop(&self, bbox: &BoundingBox) -> Result<AlprImage, AlprError> {
        let (w, h) = self.dimensions();
        let bbox = bbox.clamp_to(w, h).ok_or_else(|| {
            AlprError::invalid_input(format!("box {:?} lies outside the {w}x{h} frame", bbox))
        })?;
        let (x, y, bw, bh) = bbox.xy1_wh();
        let image = image::imageops::crop_imm(&self.image, x, y, bw, bh).to_image();
        Ok(AlprImage::new(image, self.channel_order))
    }

    /// Frame as RGB, ready to be written to disk.
    pub fn to_rgb8(&self) -> RgbImage {
        self.to_channel_order(ChannelOrder::Rgb)
    }

    pub fn to_fir_image(&self, order: ChannelOrder) -> anyhow::Result<FirImage<'static>> {
        let image = self.to_channel_order(order);
        let (width, height) = image.dimensions();
        Ok(FirImage::from_vec_u8(width, height, image.into_raw(), PixelType::U8x3)?)
    }

    pub fn into_rgb8(self) -> RgbImage {
        match self.channel_order {
            ChannelOrder::Rgb => self.image,
            ChannelOrder::Bgr => self.to_rgb8(),
        }
    }
}

pub fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}
