use bvr_alpr::common::PlateAlphabet;
use bvr_alpr::detection_runners::decode_plate;
use bvr_alpr::AlprError;
use ndarray::{Array, Array3, IxDyn};
use rand::{Rng, SeedableRng};

const ALPHABET: &str = "0123456789АБВГДЕЁЖЗИЙКЛМНОӨПРСТУҮФХЦЧШЩЪЫЬЭЮЯ-";
const SLOTS: usize = 10;

fn alphabet() -> PlateAlphabet {
    PlateAlphabet::new(ALPHABET, '-').unwrap()
}

/// One-hot-ish probabilities: `chars[i]` wins slot `i` with probability `p[i]`.
fn probs_for(chars: &str, p: &[f32]) -> Array3<f32> {
    let alphabet = alphabet();
    let vocab = alphabet.len();
    let mut probs = Array3::<f32>::zeros((1, SLOTS, vocab));
    for (slot, c) in chars.chars().enumerate() {
        let index = alphabet.chars().iter().position(|&a| a == c).unwrap();
        probs[[0, slot, index]] = p[slot];
    }
    probs
}

#[test]
fn pad_slots_are_skipped() {
    let probs = probs_for("5АУ53-----", &[0.9, 0.8, 0.7, 0.6, 0.5, 1., 1., 1., 1., 1.]);
    let result = decode_plate(probs.view().into_dyn(), &alphabet(), SLOTS).unwrap();
    assert_eq!(result.text(), "5АУ53");
    // mean over the five non-pad slots only
    assert!((result.confidence() - 0.7).abs() < 1e-6);
    assert_eq!(result.char_confidences().len(), 5);
}

#[test]
fn repeated_characters_are_not_collapsed() {
    let probs = probs_for("1122-33---", &[0.9; SLOTS]);
    let result = decode_plate(probs.view().into_dyn(), &alphabet(), SLOTS).unwrap();
    assert_eq!(result.text(), "112233");
}

#[test]
fn all_pad_decodes_to_empty_zero_confidence() {
    let probs = probs_for("----------", &[0.99; SLOTS]);
    let result = decode_plate(probs.view().into_dyn(), &alphabet(), SLOTS).unwrap();
    assert_eq!(result.text(), "");
    assert_eq!(result.confidence(), 0.0);
    assert!(result.is_empty());
}

#[test]
fn ties_pick_the_first_maximum() {
    let alphabet = alphabet();
    let mut probs = Array3::<f32>::zeros((1, SLOTS, alphabet.len()));
    // slot 0: '3' and '7' tie
    probs[[0, 0, 3]] = 0.5;
    probs[[0, 0, 7]] = 0.5;
    for slot in 1..SLOTS {
        probs[[0, slot, alphabet.len() - 1]] = 1.0;
    }
    let result = decode_plate(probs.view().into_dyn(), &alphabet, SLOTS).unwrap();
    assert_eq!(result.text(), "3");
}

#[test]
fn flat_output_is_accepted() {
    let probs = probs_for("АБ12------", &[0.6; SLOTS]);
    let flat = probs.into_shape_with_order((1, SLOTS * alphabet().len())).unwrap();
    let result = decode_plate(flat.view().into_dyn(), &alphabet(), SLOTS).unwrap();
    assert_eq!(result.text(), "АБ12");
    assert!((result.confidence() - 0.6).abs() < 1e-6);
}

#[test]
fn size_mismatch_is_an_inference_error() {
    let probs = Array::<f32, IxDyn>::zeros(IxDyn(&[1, SLOTS - 1, alphabet().len()]));
    let err = decode_plate(probs.view(), &alphabet(), SLOTS).unwrap_err();
    assert!(matches!(err, AlprError::Inference(_)), "{err}");
}

#[test]
fn out_of_range_scores_are_clamped() {
    let probs = probs_for("7---------", &[3.5, 1., 1., 1., 1., 1., 1., 1., 1., 1.]);
    let result = decode_plate(probs.view().into_dyn(), &alphabet(), SLOTS).unwrap();
    assert_eq!(result.text(), "7");
    assert_eq!(result.confidence(), 1.0);
}

#[test]
fn random_outputs_decode_within_contract() {
    let alphabet = alphabet();
    let vocab = alphabet.len();
    let mut rng = rand::rngs::StdRng::seed_from_u64(7);

    for _ in 0..200 {
        let probs = Array3::<f32>::from_shape_fn((1, SLOTS, vocab), |_| rng.gen::<f32>());
        let a = decode_plate(probs.view().into_dyn(), &alphabet, SLOTS).unwrap();
        let b = decode_plate(probs.view().into_dyn(), &alphabet, SLOTS).unwrap();

        assert_eq!(a, b);
        assert!((0.0..=1.0).contains(&a.confidence()));
        assert!(a.text().chars().count() <= SLOTS);
        assert!(a.text().chars().all(|c| c != '-' && ALPHABET.contains(c)));
        assert!(a.char_confidences().iter().all(|c| (0.0..=1.0).contains(c)));
    }
}
