use bvr_alpr::common::{has_image_extension, PlateAlphabet};
use bvr_alpr::{AlprError, AlprImage, BoundingBox, ChannelOrder, DetectionResult, OcrResult, PlateResult};
use image::{Rgb, RgbImage};
use std::path::Path;

#[test]
fn bounding_box_rejects_malformed_coordinates() {
    assert!(BoundingBox::new(0, 0, 10, 10).is_ok());
    for (x1, y1, x2, y2) in [(-1, 0, 10, 10), (0, -1, 10, 10), (10, 0, 10, 10), (0, 5, 10, 4)] {
        let err = BoundingBox::new(x1, y1, x2, y2).unwrap_err();
        assert!(matches!(err, AlprError::InvalidInput(_)), "{err}");
    }
}

#[test]
fn bounding_box_geometry() {
    let a = BoundingBox::new(0, 0, 10, 10).unwrap();
    let b = BoundingBox::new(5, 5, 15, 15).unwrap();
    assert_eq!(a.area(), 100);
    assert_eq!(a.intersect(&b), 25);
    assert_eq!(a.union(&b), 175);
    assert!((a.iou(&b) - 25.0 / 175.0).abs() < 1e-6);
    assert!(a.contains(&BoundingBox::new(2, 2, 8, 8).unwrap()));
    assert!(!a.contains(&b));
    assert_eq!(a.xy1_wh(), (0, 0, 10, 10));
}

#[test]
fn bounding_box_clamps_into_frame() {
    let b = BoundingBox::new(90, 40, 130, 70).unwrap();
    let clamped = b.clamp_to(100, 50).unwrap();
    assert_eq!(clamped.xy1_xy2(), (90, 40, 100, 50));

    // entirely to the right of the frame
    assert!(BoundingBox::new(120, 0, 130, 10).unwrap().clamp_to(100, 50).is_none());
}

#[test]
fn bounding_box_from_float_output() {
    let b = BoundingBox::from_xyxy_f32(-3.5, 2.9, 50.7, 120.0, 40, 100).unwrap();
    assert_eq!(b.xy1_xy2(), (0, 2, 40, 100));

    assert!(BoundingBox::from_xyxy_f32(f32::NAN, 0., 10., 10., 40, 40).is_none());
    // collapses to zero width after truncation
    assert!(BoundingBox::from_xyxy_f32(5.1, 0., 5.9, 10., 40, 40).is_none());
}

#[test]
fn bounding_box_deserialization_validates() {
    let ok: BoundingBox = serde_json::from_str(r#"{"x1":1,"y1":2,"x2":3,"y2":4}"#).unwrap();
    assert_eq!(ok.xy1_xy2(), (1, 2, 3, 4));
    assert!(serde_json::from_str::<BoundingBox>(r#"{"x1":5,"y1":2,"x2":3,"y2":4}"#).is_err());
}

#[test]
fn detection_confidence_must_be_a_probability() {
    let b = BoundingBox::new(0, 0, 4, 4).unwrap();
    assert!(DetectionResult::new(b, 0.0, "plate").is_ok());
    assert!(DetectionResult::new(b, 1.0, "plate").is_ok());
    assert!(DetectionResult::new(b, 1.01, "plate").is_err());
    assert!(DetectionResult::new(b, -0.1, "plate").is_err());
    assert!(DetectionResult::new(b, f32::NAN, "plate").is_err());

    let d = DetectionResult::new(b, 0.5, "plate").unwrap().with_class_id(3);
    assert_eq!(d.class_id(), 3);
    assert_eq!(d.label(), "plate");
}

#[test]
fn ocr_result_confidence_is_mean_of_characters() {
    let r = OcrResult::from_chars("AB1", vec![0.5, 1.0, 0.75]).unwrap();
    assert_eq!(r.text(), "AB1");
    assert!((r.confidence() - 0.75).abs() < 1e-6);
    assert_eq!(r.char_confidences().len(), 3);

    assert!(OcrResult::from_chars("A", vec![1.5]).is_err());
    assert!(OcrResult::new("A", 2.0).is_err());

    let empty = OcrResult::empty();
    assert!(empty.is_empty());
    assert_eq!(empty.confidence(), 0.0);
}

#[test]
fn plate_result_round_trips_through_json() {
    let detection = DetectionResult::new(BoundingBox::new(1, 2, 30, 12).unwrap(), 0.8, "License Plate").unwrap();
    let plate = PlateResult::new(detection, Some(OcrResult::from_chars("5AU5341", vec![0.9; 7]).unwrap()));
    let json = serde_json::to_string(&plate).unwrap();
    let back: PlateResult = serde_json::from_str(&json).unwrap();
    assert_eq!(back, plate);
    assert_eq!(back.text(), Some("5AU5341"));

    let no_ocr = PlateResult::new(back.detection.clone(), None);
    assert_eq!(no_ocr.text(), None);
}

#[test]
fn alphabet_validation() {
    assert!(PlateAlphabet::new("ABC_", '_').is_ok());
    assert!(PlateAlphabet::new("", '_').is_err());
    assert!(PlateAlphabet::new("ABC", '_').is_err());
    assert!(PlateAlphabet::new("ABCA_", '_').is_err());

    let alphabet = PlateAlphabet::new("0123456789АБВ-", '-').unwrap();
    assert_eq!(alphabet.len(), 14);
    assert_eq!(alphabet.get(10), Some('А'));
    assert_eq!(alphabet.pad(), '-');
}

#[test]
fn image_from_raw_checks_buffer_length() {
    assert!(AlprImage::from_raw(2, 2, vec![0; 12], ChannelOrder::Bgr).is_ok());
    let err = AlprImage::from_raw(2, 2, vec![0; 11], ChannelOrder::Bgr).unwrap_err();
    assert!(matches!(err, AlprError::InvalidInput(_)));
}

#[test]
fn image_channel_order_conversion() {
    let bgr = AlprImage::from_raw(1, 1, vec![10, 20, 30], ChannelOrder::Bgr).unwrap();
    assert_eq!(bgr.to_channel_order(ChannelOrder::Rgb).get_pixel(0, 0).0, [30, 20, 10]);
    assert_eq!(bgr.to_channel_order(ChannelOrder::Bgr).get_pixel(0, 0).0, [10, 20, 30]);
    assert_eq!(bgr.into_rgb8().get_pixel(0, 0).0, [30, 20, 10]);
}

#[test]
fn image_crop_keeps_channel_order_and_clamps() {
    let mut image = RgbImage::from_pixel(20, 10, Rgb([0, 0, 0]));
    image.put_pixel(15, 5, Rgb([1, 2, 3]));
    let frame = AlprImage::new(image, ChannelOrder::Bgr);

    let crop = frame.crop(&BoundingBox::new(15, 5, 40, 40).unwrap()).unwrap();
    assert_eq!(crop.dimensions(), (5, 5));
    assert_eq!(crop.channel_order, ChannelOrder::Bgr);
    assert_eq!(crop.get_pixel(0, 0).0, [1, 2, 3]);
}

#[test]
fn empty_frame_is_invalid_input() {
    let frame = AlprImage::from(RgbImage::new(0, 0));
    assert!(frame.is_empty());
    assert!(matches!(frame.ensure_not_empty(), Err(AlprError::InvalidInput(_))));
}

#[test]
fn open_distinguishes_bad_paths_from_bad_pixels() {
    let dir = tempfile::tempdir().unwrap();

    let txt = dir.path().join("notes.txt");
    std::fs::write(&txt, "hello").unwrap();
    assert!(matches!(AlprImage::open(&txt), Err(AlprError::InvalidInput(_))));

    assert!(matches!(AlprImage::open(dir.path().join("missing.jpg")), Err(AlprError::InvalidInput(_))));

    let corrupt = dir.path().join("corrupt.jpg");
    std::fs::write(&corrupt, b"definitely not a jpeg").unwrap();
    let err = AlprImage::open(&corrupt).unwrap_err();
    assert!(err.is_decode(), "{err}");

    let good = dir.path().join("GOOD.PNG");
    RgbImage::from_pixel(3, 2, Rgb([9, 9, 9])).save(&good).unwrap();
    assert_eq!(AlprImage::open(&good).unwrap().dimensions(), (3, 2));
}

#[test]
fn image_extension_filter_is_case_insensitive() {
    assert!(has_image_extension(Path::new("a.jpg")));
    assert!(has_image_extension(Path::new("a.JPEG")));
    assert!(has_image_extension(Path::new("dir/a.Png")));
    assert!(!has_image_extension(Path::new("a.bmp")));
    assert!(!has_image_extension(Path::new("jpg")));
}

#[test]
fn detection_deserialization_validates_confidence() {
    let ok: DetectionResult = serde_json::from_str(
        r#"{"bounding_box":{"x1":1,"y1":2,"x2":3,"y2":4},"confidence":0.5,"label":"plate","class_id":2}"#,
    )
    .unwrap();
    assert_eq!(ok.confidence(), 0.5);
    assert_eq!(ok.class_id(), 2);

    let too_high = r#"{"bounding_box":{"x1":1,"y1":2,"x2":3,"y2":4},"confidence":7.5,"label":"plate","class_id":0}"#;
    assert!(serde_json::from_str::<DetectionResult>(too_high).is_err());
    let negative = r#"{"bounding_box":{"x1":1,"y1":2,"x2":3,"y2":4},"confidence":-0.2,"label":"plate"}"#;
    assert!(serde_json::from_str::<DetectionResult>(negative).is_err());
}

#[test]
fn ocr_deserialization_validates_confidences() {
    let ok: OcrResult = serde_json::from_str(r#"{"text":"AB","confidence":0.75,"char_confidences":[0.5,1.0]}"#).unwrap();
    assert_eq!(ok.text(), "AB");
    assert_eq!(ok.char_confidences(), &[0.5, 1.0]);

    let scalar_only: OcrResult = serde_json::from_str(r#"{"text":"AB","confidence":0.3}"#).unwrap();
    assert_eq!(scalar_only.confidence(), 0.3);

    for bad in [
        r#"{"text":"AB","confidence":-3.0,"char_confidences":[9.0]}"#,
        r#"{"text":"AB","confidence":1.5,"char_confidences":[]}"#,
        r#"{"text":"AB","confidence":0.2,"char_confidences":[0.5,1.0]}"#,
    ] {
        assert!(serde_json::from_str::<OcrResult>(bad).is_err(), "{bad}");
    }
}
