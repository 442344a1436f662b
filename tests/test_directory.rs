use bvr_alpr::directory_runner::{collect_images, run_directory};
use bvr_alpr::{Alpr, AlprError};

mod mock_adapters;
use mock_adapters::{EchoOcr, FixedDetector};

fn pipeline() -> Alpr {
    Alpr::builder()
        .with_detector(FixedDetector::new(&[(2, 2, 12, 8, 0.9)]))
        .with_ocr(EchoOcr::new("DIR1"))
        .build()
        .unwrap()
}

#[test]
fn directory_run_survives_corrupt_images() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["c.png", "a.png", "b.PNG"] {
        image::RgbImage::from_pixel(16, 16, image::Rgb([50, 60, 70]))
            .save_with_format(dir.path().join(name), image::ImageFormat::Png)
            .unwrap();
    }
    std::fs::write(dir.path().join("broken.jpg"), b"\xff\xd8 truncated").unwrap();
    std::fs::write(dir.path().join("readme.txt"), "not an image").unwrap();
    std::fs::create_dir(dir.path().join("nested.png")).unwrap();

    let mut alpr = pipeline();
    let report = run_directory(&mut alpr, dir.path()).unwrap();

    assert_eq!(report.total(), 4);
    assert_eq!(report.processed.len(), 3);
    assert_eq!(report.decode_failures(), 1);
    assert!(report.failures[0].0.ends_with("broken.jpg"));

    let names: Vec<_> = report
        .processed
        .iter()
        .map(|(path, _)| path.file_name().unwrap().to_string_lossy().to_string())
        .collect();
    assert_eq!(names, ["a.png", "b.PNG", "c.png"]);

    for (_, plates) in &report.processed {
        assert_eq!(plates.len(), 1);
        assert_eq!(plates[0].text(), Some("DIR1"));
    }
}

#[test]
fn collect_images_is_sorted_and_filtered() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["z.jpeg", "m.jpg", "a.gif", "b.png"] {
        std::fs::write(dir.path().join(name), b"").unwrap();
    }
    let images = collect_images(dir.path()).unwrap();
    let names: Vec<_> = images.iter().map(|p| p.file_name().unwrap().to_str().unwrap()).collect();
    assert_eq!(names, ["b.png", "m.jpg", "z.jpeg"]);
}

#[test]
fn empty_directory_yields_an_empty_report() {
    let dir = tempfile::tempdir().unwrap();
    let report = run_directory(&mut pipeline(), dir.path()).unwrap();
    assert_eq!(report.total(), 0);
}

#[test]
fn missing_directory_is_invalid_input() {
    let dir = tempfile::tempdir().unwrap();
    let err = run_directory(&mut pipeline(), dir.path().join("nope")).unwrap_err();
    assert!(matches!(err, AlprError::InvalidInput(_)), "{err}");
}
