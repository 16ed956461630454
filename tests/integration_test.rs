// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Integration tests for the decode library

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use yolo_decode::geometry::{intersection, iou};
use yolo_decode::{
    BoundingBox, ClassScope, DecodeConfig, DecodeError, DecodePipeline, Detection, FrameSize,
    ModelVariant, ResizeMode, TensorLayout, non_max_suppression,
};

const CONF: f32 = 0.25;
const IOU: f32 = 0.45;

/// Transpose `[N, C]` rows into a flat `[C, N]` buffer.
fn channels_first(rows: &[Vec<f32>]) -> Vec<f32> {
    let (n, c) = (rows.len(), rows.first().map_or(0, Vec::len));
    let mut out = vec![0.0; n * c];
    for (i, row) in rows.iter().enumerate() {
        for (j, &v) in row.iter().enumerate() {
            out[j * n + i] = v;
        }
    }
    out
}

fn random_detect_rows(rng: &mut StdRng, n: usize) -> Vec<Vec<f32>> {
    (0..n)
        .map(|_| {
            let mut row = vec![0.0; 84];
            row[0] = rng.random_range(0.0..640.0);
            row[1] = rng.random_range(0.0..640.0);
            row[2] = rng.random_range(4.0..160.0);
            row[3] = rng.random_range(4.0..160.0);
            // A few classes per anchor, most of them weak
            for _ in 0..3 {
                let class_id = rng.random_range(0..80);
                row[4 + class_id] = rng.random_range(0.0..0.6);
            }
            row
        })
        .collect()
}

fn random_pose_rows(rng: &mut StdRng, n: usize) -> Vec<Vec<f32>> {
    (0..n)
        .map(|_| {
            let mut row: Vec<f32> = (0..56).map(|_| rng.random_range(0.0..1.0)).collect();
            row[0] = rng.random_range(0.0..640.0);
            row[1] = rng.random_range(0.0..640.0);
            row[2] = rng.random_range(4.0..160.0);
            row[3] = rng.random_range(4.0..160.0);
            for k in 0..17 {
                row[5 + k * 3] = rng.random_range(0.0..640.0);
                row[5 + k * 3 + 1] = rng.random_range(0.0..640.0);
            }
            row
        })
        .collect()
}

fn assert_sorted_desc(dets: &[Detection]) {
    for pair in dets.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
}

fn assert_no_overlap(dets: &[Detection], scope: ClassScope) {
    for (i, a) in dets.iter().enumerate() {
        for b in &dets[i + 1..] {
            if scope == ClassScope::Agnostic || a.class_id == b.class_id {
                assert!(iou(&a.bbox, &b.bbox) < IOU, "{a:?} overlaps {b:?}");
            }
        }
    }
}

#[test]
fn test_decode_config_defaults() {
    let config = DecodeConfig::default();
    assert_eq!(config.variant, ModelVariant::Detect);
    assert!((config.confidence_threshold - 0.25).abs() < f32::EPSILON);
    assert!((config.iou_threshold - 0.45).abs() < f32::EPSILON);
    assert_eq!(config.imgsz, (640, 640));
    assert_eq!(config.max_detections, 300);
}

#[test]
fn test_geometry_properties() {
    let a = BoundingBox::new(3.0, 4.0, 13.0, 24.0);
    assert!((intersection(&a, &a) - a.area()).abs() < 1e-6);
    assert!((iou(&a, &a) - 1.0).abs() < 1e-6);

    let far = BoundingBox::new(100.0, 100.0, 110.0, 110.0);
    assert_eq!(intersection(&a, &far), 0.0);

    let point = BoundingBox::new(5.0, 5.0, 5.0, 5.0);
    let value = iou(&point, &point);
    assert!(!value.is_nan());
    assert_eq!(value, 0.0);
}

#[test]
fn test_nms_literals() {
    let nested = vec![
        Detection::new(BoundingBox::new(0.0, 0.0, 10.0, 10.0), 0.9, 0),
        Detection::new(BoundingBox::new(1.0, 1.0, 10.0, 10.0), 0.8, 0),
    ];
    let kept = non_max_suppression(nested, IOU, ClassScope::Agnostic);
    assert_eq!(kept.len(), 1);
    assert_eq!(kept[0].bbox.xyxy(), [0.0, 0.0, 10.0, 10.0]);

    for scope in [ClassScope::Agnostic, ClassScope::PerClass] {
        let disjoint = vec![
            Detection::new(BoundingBox::new(0.0, 0.0, 10.0, 10.0), 0.9, 0),
            Detection::new(BoundingBox::new(100.0, 100.0, 110.0, 110.0), 0.8, 1),
        ];
        assert_eq!(non_max_suppression(disjoint, IOU, scope).len(), 2);
    }
}

#[test]
fn test_rescale_literal() {
    let mut row = vec![0.0; 84];
    row[..4].copy_from_slice(&[50.0, 50.0, 20.0, 20.0]);
    row[4] = 0.9;

    let config = DecodeConfig::new().with_imgsz(100, 100);
    let mut pipeline = DecodePipeline::new(config).unwrap();
    let dets = pipeline.run(&row, &[1, 84, 1], FrameSize::new(200, 200)).unwrap();

    assert_eq!(dets.len(), 1);
    assert_eq!(dets[0].bbox.xyxy(), [80.0, 80.0, 120.0, 120.0]);
    assert_eq!(dets[0].to_record().bbox, [80, 80, 120, 120]);
}

#[test]
fn test_detect_end_to_end_properties() {
    let mut rng = StdRng::seed_from_u64(7);
    let rows = random_detect_rows(&mut rng, 400);
    let tensor = channels_first(&rows);
    let frame = FrameSize::new(1280, 720);

    for scope in [ClassScope::Agnostic, ClassScope::PerClass] {
        let config = DecodeConfig::new()
            .with_confidence(CONF)
            .with_iou(IOU)
            .with_class_scope(scope);
        let mut pipeline = DecodePipeline::new(config).unwrap();
        let dets = pipeline.run(&tensor, &[1, 84, 400], frame).unwrap();

        let stats = pipeline.last_stats();
        assert!(stats.candidates <= rows.len());
        assert!(dets.len() <= stats.candidates);
        assert!(!dets.is_empty());

        for det in &dets {
            assert!(det.score >= CONF);
            assert!(det.label.is_some());
            assert!(det.keypoints.is_none());
            assert!(det.bbox.x1 <= det.bbox.x2 && det.bbox.y1 <= det.bbox.y2);
        }
        assert_sorted_desc(&dets);
        assert_no_overlap(&dets, scope);

        // Suppression is a fixed point on its own output
        assert_eq!(non_max_suppression(dets.clone(), IOU, scope), dets);
    }
}

#[test]
fn test_layouts_agree() {
    let mut rng = StdRng::seed_from_u64(11);
    let rows = random_detect_rows(&mut rng, 200);
    let frame = FrameSize::new(640, 480);

    let mut first = DecodePipeline::new(DecodeConfig::default()).unwrap();
    let expected = first.run(&channels_first(&rows), &[1, 84, 200], frame).unwrap();

    let mut last =
        DecodePipeline::new(DecodeConfig::new().with_layout(TensorLayout::ChannelsLast)).unwrap();
    let flat: Vec<f32> = rows.concat();
    assert_eq!(last.run(&flat, &[1, 200, 84], frame).unwrap(), expected);
    assert_eq!(
        last.run_rows(rows.iter().map(Vec::as_slice), frame).unwrap(),
        expected
    );
}

#[test]
fn test_pose_end_to_end() {
    let mut rng = StdRng::seed_from_u64(3);
    let rows = random_pose_rows(&mut rng, 150);
    let config = DecodeConfig::new()
        .with_variant(ModelVariant::Pose)
        .with_confidence(0.5);
    let mut pipeline = DecodePipeline::new(config).unwrap();
    let dets = pipeline
        .run(&channels_first(&rows), &[1, 56, 150], FrameSize::new(640, 640))
        .unwrap();

    assert!(!dets.is_empty());
    for det in &dets {
        assert!(det.score >= 0.5);
        assert_eq!(det.class_id, 0);
        assert!(det.label.is_none());
        let kpts = det.keypoints.expect("pose detections carry keypoints");
        assert_eq!(kpts.len(), 17);
    }
    assert_no_overlap(&dets, ClassScope::Agnostic);

    let json = serde_json::to_value(dets[0].to_record()).unwrap();
    assert_eq!(json["keypoints"].as_array().map(Vec::len), Some(17));
    assert!(json.get("label").is_none());
}

#[test]
fn test_threshold_equal_score_retained() {
    let mut row = vec![0.0; 56];
    row[..5].copy_from_slice(&[320.0, 320.0, 40.0, 40.0, 0.4]);
    let config = DecodeConfig::new()
        .with_variant(ModelVariant::Pose)
        .with_confidence(0.4);
    let dets = yolo_decode::decode(&row, &[56, 1], FrameSize::new(640, 640), &config).unwrap();
    assert_eq!(dets.len(), 1);
}

#[test]
fn test_letterbox_end_to_end() {
    // 1280x720 letterboxed into 640x640: gain 0.5, 140 px bars top and bottom
    let mut row = vec![0.0; 84];
    row[..4].copy_from_slice(&[320.0, 320.0, 100.0, 100.0]);
    row[4 + 2] = 0.8;

    let config = DecodeConfig::new().with_resize_mode(ResizeMode::Letterbox);
    let mut pipeline = DecodePipeline::new(config).unwrap();
    let dets = pipeline.run(&row, &[1, 84, 1], FrameSize::new(1280, 720)).unwrap();

    assert_eq!(dets[0].label, Some("car"));
    assert_eq!(dets[0].to_record().bbox, [540, 260, 740, 460]);
}

#[test]
fn test_shape_errors() {
    let mut pipeline = DecodePipeline::new(DecodeConfig::default()).unwrap();
    let frame = FrameSize::new(640, 640);
    let data = vec![0.0; 56 * 10];

    // Pose-sized tensor into a detect pipeline
    let err = pipeline.run(&data, &[1, 56, 10], frame).unwrap_err();
    assert!(matches!(err, DecodeError::ShapeError(_)));
    assert!(err.is_fatal());

    // Batch of two
    assert!(pipeline.run(&vec![0.0; 84 * 4], &[2, 84, 2], frame).is_err());

    // Truncated data
    assert!(pipeline.run(&data[..100], &[1, 84, 10], frame).is_err());

    // Ragged rows
    let rows = [vec![0.0; 84], vec![0.0; 83]];
    let err = pipeline
        .run_rows(rows.iter().map(Vec::as_slice), frame)
        .unwrap_err();
    assert!(matches!(err, DecodeError::ShapeError(_)));
}

#[test]
fn test_invalid_config() {
    for config in [
        DecodeConfig::new().with_confidence(-0.1),
        DecodeConfig::new().with_iou(f32::NAN),
        DecodeConfig::new().with_imgsz(640, 0),
    ] {
        let err = DecodePipeline::new(config).unwrap_err();
        assert!(matches!(err, DecodeError::ConfigError(_)));
    }
    assert!("segment".parse::<ModelVariant>().is_err());
}
