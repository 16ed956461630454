// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use std::process;

use crate::cli::args::DecodeArgs;
use crate::cli::logging::set_verbose;
use crate::error::Result;
use crate::io::{load_tensor, parse_shape};
use crate::nms::ClassScope;
use crate::pipeline::{DecodePipeline, DecodeStats};
use crate::rescale::ResizeMode;
use crate::results::{Detection, DetectionRecord};
use crate::skeleton::visible_limbs;
use crate::utils::format_class_counts;
use crate::{DecodeConfig, VERSION};
use crate::{error, info, section, verbose, warn};

/// Minimum keypoint confidence for a limb to count as visible in the summary.
const LIMB_CONF: f32 = 0.5;

/// Decode a tensor file and print the detections.
pub fn run_decode(args: &DecodeArgs) {
    // Keep stdout clean for JSON consumers
    set_verbose(args.verbose && !args.json);

    section!("yolo-decode {VERSION}");

    if warns_non_square(args) {
        warn!(
            "Frame {} is not square; boxes assume a plain stretch to {}x{}. Pass --letterbox if the input was padded.",
            args.frame,
            args.imgsz,
            args.imgsz
        );
    }

    let (detections, stats) = match execute(args) {
        Ok(res) => res,
        Err(e) => {
            error!("{e}");
            process::exit(1);
        }
    };

    if args.json {
        let records: Vec<DetectionRecord> = detections.iter().map(Detection::to_record).collect();
        match serde_json::to_string_pretty(&records) {
            Ok(json) => info!("{json}"),
            Err(e) => {
                error!("Failed to serialize detections: {e}");
                process::exit(1);
            }
        }
        return;
    }

    let summary = format_class_counts(&detections);
    info!(
        "{} {}: {}, {:.1}ms",
        args.tensor.display(),
        args.frame,
        if summary.is_empty() { "(no detections)" } else { summary.as_str() },
        stats.total_ms()
    );
    for det in &detections {
        info!("{}", format_detection(det));
    }

    verbose!(
        "Speed: {:.1}ms decode, {:.1}ms nms per tensor ({} candidates, {} kept)",
        stats.decode_ms,
        stats.nms_ms,
        stats.candidates,
        stats.kept
    );
}

/// A non-square frame under the default stretch is only worth flagging in verbose runs.
fn warns_non_square(args: &DecodeArgs) -> bool {
    args.verbose && !args.json && !args.letterbox && args.frame.width != args.frame.height
}

/// Translate command-line arguments into a decode configuration.
///
/// # Errors
///
/// Returns a configuration error if any value is out of range.
pub fn build_config(args: &DecodeArgs) -> Result<DecodeConfig> {
    let config = DecodeConfig::new()
        .with_variant(args.variant)
        .with_confidence(args.conf)
        .with_iou(args.iou)
        .with_imgsz(args.imgsz, args.imgsz)
        .with_max_detections(args.max_det)
        .with_layout(args.layout)
        .with_class_scope(if args.class_aware {
            ClassScope::PerClass
        } else {
            args.class_scope
        })
        .with_resize_mode(if args.letterbox {
            ResizeMode::Letterbox
        } else {
            ResizeMode::Stretch
        });
    config.validate()?;
    Ok(config)
}

fn execute(args: &DecodeArgs) -> Result<(Vec<Detection>, DecodeStats)> {
    let config = build_config(args)?;
    let shape = args.shape.as_deref().map(parse_shape).transpose()?;
    let tensor = load_tensor(&args.tensor, shape.as_deref())?;

    verbose!(
        "Tensor: {} {:?} ({}, {})",
        args.tensor.display(),
        tensor.shape,
        config.variant,
        config.layout
    );
    verbose!(
        "Config: conf={} iou={} imgsz={} {} NMS, {} resize",
        config.confidence_threshold,
        config.iou_threshold,
        args.imgsz,
        config.class_scope,
        config.resize_mode
    );

    let mut pipeline = DecodePipeline::new(config)?;
    let detections = pipeline.run(&tensor.data, &tensor.shape, args.frame)?;
    Ok((detections, pipeline.last_stats()))
}

/// One summary line per detection, e.g. `person 0.91 [12, 40, 200, 380]`.
fn format_detection(det: &Detection) -> String {
    let rec = det.to_record();
    let [x1, y1, x2, y2] = rec.bbox;
    let mut line = format!("  {} {:.2} [{x1}, {y1}, {x2}, {y2}]", det.name(), det.score);
    if let Some(ref kpts) = det.keypoints {
        let visible = kpts.iter().filter(|k| k.conf > LIMB_CONF).count();
        let limbs = visible_limbs(kpts, LIMB_CONF).count();
        line.push_str(&format!(" {visible}/{} keypoints, {limbs} limbs", kpts.len()));
    }
    line
}
