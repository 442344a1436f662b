//! File adapted from: https://github.com/jamjamjon
//!
//! Functions to preprocess images.

use anyhow::{bail, Result};
use fast_image_resize::{
    images::{CroppedImageMut, Image as FirImage},
    pixels::PixelType,
    FilterType, ResizeAlg, ResizeOptions, Resizer,
};
use image::{DynamicImage, GrayImage, RgbImage};
use ndarray::Array;
use rayon::prelude::*;
use crate::common::{AlprImage, ChannelOrder, ColorMode, ImageTransformInfo, TensorLayout};
use crate::data::X;

/// Grey used for letterbox padding.
pub const LETTERBOX_FILL: u8 = 114;

fn bilinear() -> ResizeOptions {
    ResizeOptions::new().resize_alg(ResizeAlg::Interpolation(FilterType::Bilinear))
}

/// Letterboxes `frame` (converted to `order`) into a `target_w x target_h` NCHW tensor in `[0, 1]`.
pub fn detector_tensor(
    frame: &AlprImage,
    order: ChannelOrder,
    target_w: u32,
    target_h: u32,
    center: bool,
) -> Result<(X, ImageTransformInfo)> {
    let src = frame.to_fir_image(order)?;
    let mut resizer = Resizer::new();
    let (padded, info) = letterbox_image(&src, target_h, target_w, LETTERBOX_FILL, center, &mut resizer, &bilinear())?;
    let flat = nchw_normalize_flat(&padded)?;
    let batch = Array::from_shape_vec((1, 3, target_h as usize, target_w as usize), flat)?.into_dyn();
    Ok((X::from(batch), info))
}

/// Stretches `img` to exactly `target_w x target_h`, ignoring aspect ratio.
pub fn resize_image(
    img: &FirImage,
    target_h: u32,
    target_w: u32,
    resizer: &mut Resizer,
    config: &ResizeOptions,
) -> Result<FirImage<'static>> {
    if target_w == 0 || target_h == 0 {
        bail!("Cannot resize to {}x{}", target_w, target_h);
    }
    let mut dst = FirImage::new(target_w, target_h, PixelType::U8x3);
    resizer.resize(img, &mut dst, config)?;
    Ok(dst)
}

/// Scales `img` to fit inside the target while keeping aspect ratio, padding the rest with `bg`.
pub fn letterbox_image(
    img: &FirImage,
    target_h: u32,
    target_w: u32,
    bg: u8,
    center: bool,
    resizer: &mut Resizer,
    resize_options: &ResizeOptions,
) -> Result<(FirImage<'static>, ImageTransformInfo)> {
    let (w0, h0) = (img.width(), img.height());
    if w0 == 0 || h0 == 0 || target_w == 0 || target_h == 0 {
        bail!("Cannot letterbox {}x{} into {}x{}", w0, h0, target_w, target_h);
    }
    let scale = (target_w as f32 / w0 as f32).min(target_h as f32 / h0 as f32);
    let new_w = ((w0 as f32 * scale).round() as u32).clamp(1, target_w);
    let new_h = ((h0 as f32 * scale).round() as u32).clamp(1, target_h);

    let mut padded = FirImage::from_vec_u8(
        target_w,
        target_h,
        vec![bg; (target_w * target_h * 3) as usize],
        PixelType::U8x3,
    )?;

    let (left, top) = if center {
        ((target_w - new_w) / 2, (target_h - new_h) / 2)
    } else {
        (0, 0)
    };

    let mut cropped = CroppedImageMut::new(&mut padded, left, top, new_w, new_h)?;
    resizer.resize(img, &mut cropped, resize_options)?;

    let info = ImageTransformInfo {
        width_src: w0,
        height_src: h0,
        width_dst: target_w,
        height_dst: target_h,
        height_scale: scale,
        width_scale: scale,
        height_pad: top as f32,
        width_pad: left as f32,
    };

    Ok((padded, info))
}

fn nchw_normalize_flat(img: &FirImage) -> Result<Vec<f32>> {
    let buf = img.buffer();
    let w = img.width() as usize;
    let h = img.height() as usize;

    if buf.len() != w * h * 3 {
        bail!("Unexpected buffer size: got {}, expected {}", buf.len(), w * h * 3);
    }

    let mut out = vec![0.0f32; buf.len()];
    let hw = w * h;

    // one plane per channel
    out.par_chunks_mut(hw).enumerate().for_each(|(c, plane)| {
        for (i, v) in plane.iter_mut().enumerate() {
            *v = buf[3 * i + c] as f32 / 255.0;
        }
    });

    Ok(out)
}

/// OpenCV's fixed-point `COLOR_BGR2GRAY`/`COLOR_RGB2GRAY`, so the grey levels match cv2 exactly.
pub fn gray_opencv(image: &RgbImage, order: ChannelOrder) -> GrayImage {
    const R: u32 = 4899;
    const G: u32 = 9617;
    const B: u32 = 1868;
    const ROUND: u32 = 1 << 13;

    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let p = image.get_pixel(x, y).0;
        let (r, g, b) = match order {
            ChannelOrder::Rgb => (p[0], p[1], p[2]),
            ChannelOrder::Bgr => (p[2], p[1], p[0]),
        };
        let v = (r as u32 * R + g as u32 * G + b as u32 * B + ROUND) >> 14;
        image::Luma([v.min(255) as u8])
    })
}

/// A plate crop after resize and colour conversion, before it becomes a tensor.
#[derive(Debug, Clone)]
pub struct PlateInput {
    pub image: DynamicImage,
}

impl PlateInput {
    /// Resizes `crop` bilinearly to `width x height`, then applies the colour mode.
    ///
    /// RGB models receive RGB pixels whatever the crop's channel order.
    pub fn new(crop: &AlprImage, width: u32, height: u32, color_mode: ColorMode) -> Result<Self> {
        let src = crop.to_fir_image(crop.channel_order)?;
        let mut resizer = Resizer::new();
        let resized = resize_image(&src, height, width, &mut resizer, &bilinear())?;
        let resized = RgbImage::from_raw(width, height, resized.into_vec())
            .ok_or_else(|| anyhow::anyhow!("Resized buffer does not match {}x{}", width, height))?;

        let image = match color_mode {
            ColorMode::Grayscale => DynamicImage::ImageLuma8(gray_opencv(&resized, crop.channel_order)),
            ColorMode::Rgb => {
                let resized = AlprImage::new(resized, crop.channel_order);
                DynamicImage::ImageRgb8(resized.to_channel_order(ChannelOrder::Rgb))
            }
        };
        Ok(Self { image })
    }

    pub fn channels(&self) -> usize {
        self.image.color().channel_count() as usize
    }

    /// Adds the batch axis and lays channels out as requested.
    pub fn to_tensor(&self, layout: TensorLayout, normalize: bool) -> Result<X> {
        let (w, h, c) = (self.image.width() as usize, self.image.height() as usize, self.channels());
        let scale = if normalize { 255.0 } else { 1.0 };
        let data: Vec<f32> = self.image.as_bytes().iter().map(|&v| v as f32 / scale).collect();

        let hwc = Array::from_shape_vec((1, h, w, c), data)?;
        let x = match layout {
            TensorLayout::Nhwc => hwc.into_dyn(),
            TensorLayout::Nchw => hwc.permuted_axes([0, 3, 1, 2]).as_standard_layout().to_owned().into_dyn(),
        };
        Ok(X::from(x))
    }
}
