use bvr_alpr::common::{ColorMode, TensorLayout};
use bvr_alpr::detection_runners::image_ops::{detector_tensor, gray_opencv, PlateInput, LETTERBOX_FILL};
use bvr_alpr::{AlprImage, ChannelOrder};
use image::{Rgb, RgbImage};

fn uniform(width: u32, height: u32, pixel: [u8; 3], order: ChannelOrder) -> AlprImage {
    AlprImage::new(RgbImage::from_pixel(width, height, Rgb(pixel)), order)
}

fn close(a: f32, b: f32) -> bool {
    (a - b).abs() <= 1.5 / 255.0
}

#[test]
fn grayscale_matches_opencv_weights() {
    let image = RgbImage::from_fn(3, 1, |x, _| match x {
        0 => Rgb([255, 255, 255]),
        1 => Rgb([255, 0, 0]),
        _ => Rgb([0, 0, 0]),
    });
    let gray = gray_opencv(&image, ChannelOrder::Rgb);
    assert_eq!(gray.get_pixel(0, 0).0, [255]);
    assert_eq!(gray.get_pixel(1, 0).0, [76]);
    assert_eq!(gray.get_pixel(2, 0).0, [0]);

    // the same bytes read as BGR are a pure blue pixel
    let gray = gray_opencv(&image, ChannelOrder::Bgr);
    assert_eq!(gray.get_pixel(1, 0).0, [29]);
}

#[test]
fn detector_input_is_letterboxed_and_centered() {
    let frame = uniform(200, 100, [200, 10, 50], ChannelOrder::Rgb);
    let (x, info) = detector_tensor(&frame, ChannelOrder::Rgb, 64, 64, true).unwrap();

    assert_eq!(x.shape(), &[1, 3, 64, 64]);
    assert_eq!((info.width_pad, info.height_pad), (0.0, 16.0));
    assert!((info.width_scale - 0.32).abs() < 1e-6);

    let fill = LETTERBOX_FILL as f32 / 255.0;
    for c in 0..3 {
        assert!(close(x[[0, c, 0, 0]], fill));
        assert!(close(x[[0, c, 63, 63]], fill));
    }
    assert!(close(x[[0, 0, 32, 32]], 200.0 / 255.0));
    assert!(close(x[[0, 1, 32, 32]], 10.0 / 255.0));
    assert!(close(x[[0, 2, 32, 32]], 50.0 / 255.0));

    // model space back to frame space
    let (fx, fy) = info.to_source(32.0, 16.0);
    assert!((fx - 100.0).abs() < 1e-3);
    assert!(fy.abs() < 1e-3);
}

#[test]
fn detector_input_follows_requested_channel_order() {
    let frame = uniform(32, 32, [10, 20, 30], ChannelOrder::Bgr);
    let (x, _) = detector_tensor(&frame, ChannelOrder::Rgb, 32, 32, true).unwrap();
    assert!(close(x[[0, 0, 16, 16]], 30.0 / 255.0));
    assert!(close(x[[0, 2, 16, 16]], 10.0 / 255.0));
}

#[test]
fn top_left_letterbox_has_no_offset() {
    let frame = uniform(100, 50, [0, 0, 0], ChannelOrder::Rgb);
    let (_, info) = detector_tensor(&frame, ChannelOrder::Rgb, 64, 64, false).unwrap();
    assert_eq!((info.width_pad, info.height_pad), (0.0, 0.0));
    assert_eq!((info.width_src, info.height_src), (100, 50));
}

#[test]
fn plate_input_grayscale_nhwc() {
    let crop = uniform(300, 80, [255, 255, 255], ChannelOrder::Bgr);
    let input = PlateInput::new(&crop, 128, 64, ColorMode::Grayscale).unwrap();
    assert_eq!(input.channels(), 1);

    let x = input.to_tensor(TensorLayout::Nhwc, true).unwrap();
    assert_eq!(x.shape(), &[1, 64, 128, 1]);
    assert!(x.iter().all(|&v| close(v, 1.0)));

    let raw = input.to_tensor(TensorLayout::Nhwc, false).unwrap();
    assert!(raw.iter().all(|&v| (v - 255.0).abs() <= 1.0));
}

#[test]
fn plate_input_gray_level_respects_channel_order() {
    let crop = uniform(40, 20, [255, 0, 0], ChannelOrder::Bgr);
    let input = PlateInput::new(&crop, 40, 20, ColorMode::Grayscale).unwrap();
    let x = input.to_tensor(TensorLayout::Nhwc, false).unwrap();
    assert!(x.iter().all(|&v| v == 29.0));
}

#[test]
fn plate_input_rgb_nchw() {
    let crop = uniform(50, 25, [1, 2, 3], ChannelOrder::Bgr);
    let input = PlateInput::new(&crop, 140, 70, ColorMode::Rgb).unwrap();
    assert_eq!(input.channels(), 3);

    let x = input.to_tensor(TensorLayout::Nchw, false).unwrap();
    assert_eq!(x.shape(), &[1, 3, 70, 140]);
    // BGR [1, 2, 3] arrives as RGB [3, 2, 1]
    assert_eq!(x[[0, 0, 10, 10]], 3.0);
    assert_eq!(x[[0, 1, 10, 10]], 2.0);
    assert_eq!(x[[0, 2, 10, 10]], 1.0);
}
