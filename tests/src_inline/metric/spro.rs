use super::*;
use crate::model::saturation::SaturationRule;

const THRESHOLDS: [f32; 6] = [0.0, 0.2, 0.4, 0.6, 0.8, 1.0];

fn reference_mask_rows() -> Vec<Vec<u32>> {
    let mut sample = vec![vec![0u32; 5]; 8];
    for row in [1, 3, 5, 7] {
        sample[row] = vec![255; 5];
    }
    for row in [0, 6] {
        sample[row] = vec![254; 5];
    }
    sample
}

fn reference_masks() -> MaskBatch {
    MaskBatch::from_nested(vec![reference_mask_rows()]).unwrap()
}

fn reference_predictions() -> PredictionBatch {
    let sample = (0..8).map(|r| vec![r as f32 / 10.0 + 0.05; 5]).collect();
    PredictionBatch::from_nested(vec![sample]).unwrap()
}

fn reference_saturation() -> SaturationConfig {
    SaturationConfig::from_rules([
        (255, SaturationRule::absolute(10.0)),
        (254, SaturationRule::relative(0.5)),
    ])
    .unwrap()
}

fn only_label(rows: &[Vec<u32>], keep: u32) -> Vec<Vec<u32>> {
    rows.iter()
        .map(|row| row.iter().map(|&v| if v == keep { v } else { 0 }).collect())
        .collect()
}

#[test]
fn test_reference_scores_with_saturation() {
    let preds = reference_predictions();
    let masks = reference_masks();
    let targets = [1.0, 1.0, 1.0, 0.75, 0.0, 0.0];
    for (threshold, target) in THRESHOLDS.into_iter().zip(targets) {
        let mut spro = Spro::new(threshold, Some(reference_saturation())).unwrap();
        spro.update(&preds, &masks).unwrap();
        assert_eq!(spro.compute().unwrap(), target, "threshold {threshold}");
    }
}

#[test]
fn test_reference_scores_without_saturation() {
    let preds = reference_predictions();
    let masks = reference_masks();
    let targets = [1.0, 0.625, 0.5, 0.375, 0.0, 0.0];
    for (threshold, target) in THRESHOLDS.into_iter().zip(targets) {
        let mut spro = Spro::new(threshold, None).unwrap();
        spro.update(&preds, &masks).unwrap();
        assert_eq!(spro.compute().unwrap(), target, "threshold {threshold}");
    }
}

#[test]
fn test_reference_scores_non_increasing() {
    let preds = reference_predictions();
    let masks = reference_masks();
    for saturation in [None, Some(reference_saturation())] {
        let mut last = f64::INFINITY;
        for threshold in THRESHOLDS {
            let score = spro_score(&preds, &masks, threshold, saturation.as_ref()).unwrap();
            assert!(score <= last);
            assert!((0.0..=1.0).contains(&score));
            last = score;
        }
    }
}

#[test]
fn test_per_region_breakdown() {
    let mut spro = Spro::new(0.6, Some(reference_saturation())).unwrap();
    spro.update(&reference_predictions(), &reference_masks())
        .unwrap();

    let per_id = spro.per_region_id();
    let r255 = &per_id[&255];
    assert_eq!(r255.regions, 1);
    assert_eq!(r255.area, 20);
    assert_eq!(r255.hits, 5);
    assert_eq!(r255.requirement, 10.0);
    assert_eq!(r255.mean_score(), 0.5);

    let r254 = &per_id[&254];
    assert_eq!(r254.area, 10);
    assert_eq!(r254.hits, 5);
    assert_eq!(r254.requirement, 5.0);
    assert_eq!(r254.mean_score(), 1.0);
}

#[test]
fn test_excess_hits_do_not_inflate() {
    let mut spro = Spro::new(0.0, Some(reference_saturation())).unwrap();
    spro.update(&reference_predictions(), &reference_masks())
        .unwrap();
    let r255 = &spro.per_region_id()[&255];
    assert_eq!(r255.hits, 20);
    assert_eq!(r255.satisfied, 10.0);
    assert_eq!(spro.pooled_coverage().unwrap(), 1.0);
}

#[test]
fn test_pooled_coverage() {
    let mut spro = Spro::new(0.2, None).unwrap();
    spro.update(&reference_predictions(), &reference_masks())
        .unwrap();
    assert_eq!(spro.compute().unwrap(), 0.625);
    assert!((spro.pooled_coverage().unwrap() - 20.0 / 30.0).abs() < 1e-12);
}

#[test]
fn test_compute_without_regions_errors() {
    let spro = Spro::new(0.5, None).unwrap();
    assert_eq!(spro.compute(), Err(SproError::NoRegions));
    assert_eq!(spro.pooled_coverage(), Err(SproError::NoRegions));

    let mut spro = Spro::new(0.5, None).unwrap();
    let masks = MaskBatch::from_nested(vec![vec![vec![0u32; 5]; 8]]).unwrap();
    spro.update(&reference_predictions(), &masks).unwrap();
    assert_eq!(spro.n_samples(), 1);
    assert_eq!(spro.compute(), Err(SproError::NoRegions));
}

#[test]
fn test_repeated_update_keeps_score() {
    let preds = reference_predictions();
    let masks = reference_masks();
    let mut spro = Spro::new(0.2, None).unwrap();
    spro.update(&preds, &masks).unwrap();
    let once = spro.compute().unwrap();
    spro.update(&preds, &masks).unwrap();
    assert_eq!(spro.n_regions(), 4);
    assert_eq!(spro.compute().unwrap(), once);
    assert_eq!(spro.per_region_id()[&255].regions, 2);
}

#[test]
fn test_split_batches_match_concatenated() {
    let preds_a = reference_predictions();
    let masks_a = reference_masks();
    let preds_b = PredictionBatch::from_nested(vec![vec![vec![0.7f32; 5]; 8]]).unwrap();
    let masks_b = MaskBatch::from_nested(vec![only_label(&reference_mask_rows(), 254)]).unwrap();

    let mut split = Spro::new(0.4, Some(reference_saturation())).unwrap();
    split.update(&preds_a, &masks_a).unwrap();
    split.update(&preds_b, &masks_b).unwrap();

    let mut whole = Spro::new(0.4, Some(reference_saturation())).unwrap();
    whole
        .update(
            &preds_a.concat(&preds_b).unwrap(),
            &masks_a.concat(&masks_b).unwrap(),
        )
        .unwrap();

    assert_eq!(split, whole);
    assert_eq!(whole.n_samples(), 2);
    assert_eq!(whole.n_regions(), 3);
}

#[test]
fn test_saturation_relaxation_never_decreases() {
    let preds = reference_predictions();
    let masks = reference_masks();
    for threshold in THRESHOLDS {
        let strict = spro_score(&preds, &masks, threshold, None).unwrap();
        let relaxed =
            spro_score(&preds, &masks, threshold, Some(&reference_saturation())).unwrap();
        assert!(relaxed >= strict, "threshold {threshold}");
    }
}

#[test]
fn test_unconfigured_regions_require_full_area() {
    let config = SaturationConfig::from_rules([(999, SaturationRule::absolute(1.0))]).unwrap();
    let preds = reference_predictions();
    let masks = reference_masks();
    for threshold in THRESHOLDS {
        let mut spro = Spro::new(threshold, Some(config.clone())).unwrap();
        spro.update(&preds, &masks).unwrap();
        assert_eq!(
            spro.compute().unwrap(),
            spro_score(&preds, &masks, threshold, None).unwrap()
        );
        assert_eq!(spro.per_region_id()[&255].requirement, 20.0);
        assert_eq!(spro.per_region_id()[&254].requirement, 10.0);
        assert_eq!(spro.unused_saturation_ids(), vec![999]);
    }
}

#[test]
fn test_mask_shape_mismatch() {
    let mut spro = Spro::new(0.5, None).unwrap();
    let masks = MaskBatch::from_nested(vec![vec![vec![1u32; 4]; 8]]).unwrap();
    let err = spro.update(&reference_predictions(), &masks).unwrap_err();
    assert!(matches!(err, SproError::ShapeMismatch { .. }));
}

#[test]
fn test_batch_size_mismatch() {
    let mut spro = Spro::new(0.5, None).unwrap();
    let masks = reference_masks().concat(&reference_masks()).unwrap();
    let err = spro.update(&reference_predictions(), &masks).unwrap_err();
    assert_eq!(
        err,
        SproError::BatchMismatch {
            predictions: 1,
            masks: 2
        }
    );
}

#[test]
fn test_shape_locked_across_updates() {
    let mut spro = Spro::new(0.2, None).unwrap();
    spro.update(&reference_predictions(), &reference_masks())
        .unwrap();
    let before = spro.clone();

    let preds = PredictionBatch::from_nested(vec![vec![vec![0.9f32; 3]; 3]]).unwrap();
    let masks = MaskBatch::from_nested(vec![vec![vec![1u32; 3]; 3]]).unwrap();
    let err = spro.update(&preds, &masks).unwrap_err();
    assert!(matches!(err, SproError::ShapeMismatch { .. }));
    assert_eq!(spro, before);

    spro.reset();
    spro.update(&preds, &masks).unwrap();
    assert_eq!(spro.compute().unwrap(), 1.0);
}

#[test]
fn test_reset_clears_state() {
    let mut spro = Spro::new(0.2, Some(reference_saturation())).unwrap();
    spro.update(&reference_predictions(), &reference_masks())
        .unwrap();
    spro.reset();
    assert_eq!(spro.n_regions(), 0);
    assert_eq!(spro.n_samples(), 0);
    assert_eq!(spro.shape(), None);
    assert!(spro.per_region_id().is_empty());
    assert_eq!(spro.compute(), Err(SproError::NoRegions));
    assert_eq!(spro.threshold(), 0.2);
    assert!(spro.saturation().is_some());
}

#[test]
fn test_layers_score_regions_independently() {
    let rows = reference_mask_rows();
    let layers = vec![
        MaskBatch::from_nested(vec![only_label(&rows, 255)]).unwrap(),
        MaskBatch::from_nested(vec![only_label(&rows, 254)]).unwrap(),
    ];
    let preds = reference_predictions();
    for threshold in THRESHOLDS {
        let mut layered = Spro::new(threshold, Some(reference_saturation())).unwrap();
        layered.update_layers(&preds, &layers).unwrap();
        let merged =
            spro_score(&preds, &reference_masks(), threshold, Some(&reference_saturation()))
                .unwrap();
        assert_eq!(layered.compute().unwrap(), merged);
    }
}

#[test]
fn test_same_id_in_two_layers_counts_twice() {
    let preds = reference_predictions();
    let masks = reference_masks();
    let mut spro = Spro::new(0.2, None).unwrap();
    spro.update_layers(&preds, &[masks.clone(), masks]).unwrap();
    assert_eq!(spro.n_regions(), 4);
    assert_eq!(spro.n_samples(), 1);
    assert_eq!(spro.compute().unwrap(), 0.625);
}

#[test]
fn test_update_layers_requires_a_layer() {
    let mut spro = Spro::new(0.2, None).unwrap();
    let err = spro.update_layers(&reference_predictions(), &[]).unwrap_err();
    assert!(matches!(err, SproError::InvalidGrid(_)));
}

#[test]
fn test_merge_matches_single_accumulator() {
    let preds = reference_predictions();
    let masks = reference_masks();

    let mut a = Spro::new(0.6, None).unwrap();
    a.update(&preds, &masks).unwrap();
    let mut b = Spro::new(0.6, None).unwrap();
    b.update(&preds, &masks).unwrap();
    a.merge(&b).unwrap();

    let mut single = Spro::new(0.6, None).unwrap();
    single.update(&preds, &masks).unwrap();
    single.update(&preds, &masks).unwrap();

    assert_eq!(a.compute().unwrap(), single.compute().unwrap());
    assert_eq!(a.n_regions(), single.n_regions());
    assert_eq!(a.per_region_id(), single.per_region_id());

    let mut empty = Spro::new(0.6, None).unwrap();
    empty.merge(&a).unwrap();
    assert_eq!(empty.shape(), a.shape());
}

#[test]
fn test_merge_rejects_incompatible() {
    let mut a = Spro::new(0.6, None).unwrap();
    let b = Spro::new(0.4, None).unwrap();
    assert!(matches!(a.merge(&b), Err(SproError::IncompatibleMerge(_))));

    let c = Spro::new(0.6, Some(reference_saturation())).unwrap();
    assert!(matches!(a.merge(&c), Err(SproError::IncompatibleMerge(_))));
}

#[test]
fn test_non_finite_threshold_rejected() {
    assert!(matches!(
        Spro::new(f32::NAN, None),
        Err(SproError::InvalidConfig(_))
    ));
    assert!(matches!(
        Spro::new(f32::INFINITY, None),
        Err(SproError::InvalidConfig(_))
    ));
}

#[test]
fn test_empty_batch_is_noop() {
    let mut spro = Spro::new(0.5, None).unwrap();
    let preds = PredictionBatch::from_nested(Vec::new()).unwrap();
    let masks = MaskBatch::from_nested(Vec::new()).unwrap();
    spro.update(&preds, &masks).unwrap();
    assert_eq!(spro.shape(), None);
    assert_eq!(spro.n_samples(), 0);
}

#[test]
fn test_score_determinism_bits() {
    let preds = reference_predictions();
    let masks = reference_masks();
    let a = spro_score(&preds, &masks, 0.3, Some(&reference_saturation())).unwrap();
    let b = spro_score(&preds, &masks, 0.3, Some(&reference_saturation())).unwrap();
    assert_eq!(a.to_bits(), b.to_bits());
}
