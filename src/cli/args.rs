// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::decode::TensorLayout;
use crate::nms::ClassScope;
use crate::rescale::FrameSize;
use crate::variant::ModelVariant;

/// CLI arguments parser.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(after_help = r#"Decode Options:
    --tensor, -t <PATH>    Raw output tensor (.json with shape, or raw f32 little-endian)
    --shape <SHAPE>        Tensor shape for raw files, e.g. 1,84,8400
    --variant <VARIANT>    Model variant (detect, pose) [default: detect]
    --imgsz <IMGSZ>        Model input size [default: 640]
    --frame <WxH>          Original frame size, e.g. 1280x720
    --conf <CONF>          Confidence threshold [default: 0.25]
    --iou <IOU>            IoU threshold for NMS [default: 0.45]
    --class-scope <SCOPE>  NMS class scope (agnostic, per-class) [default: agnostic]
    --class-aware          Shorthand for --class-scope per-class
    --letterbox            Tensor came from a letterboxed input
    --layout <LAYOUT>      Tensor layout (channels-first, channels-last)
    --max-det <N>          Maximum detections to keep [default: 300]
    --json                 Print detections as JSON
    --verbose              Show verbose output

Examples:
    yolo-decode decode --tensor output.json --frame 1280x720
    yolo-decode decode -t output.bin --shape 1,56,8400 --variant pose --frame 640x480
    yolo-decode decode -t output.json --frame 1920x1080 --conf 0.5 --class-aware --json
    yolo-decode decode -t output.json --frame 1280x720 --letterbox --imgsz 640"#)]
pub struct Cli {
    #[command(subcommand)]
    /// Subcommand to execute.
    pub command: Commands,
}

/// Commands for the CLI.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Decode a raw YOLO output tensor into detections
    Decode(DecodeArgs),
}

/// Arguments for the decode command.
#[derive(Args, Debug)]
#[allow(clippy::struct_excessive_bools)]
pub struct DecodeArgs {
    /// Raw output tensor file
    #[arg(short, long)]
    pub tensor: PathBuf,

    /// Tensor shape, required for raw files (e.g. 1,84,8400)
    #[arg(long)]
    pub shape: Option<String>,

    /// Model variant (detect, pose)
    #[arg(long, default_value_t = ModelVariant::Detect)]
    pub variant: ModelVariant,

    /// Model input size
    #[arg(long, default_value_t = 640)]
    pub imgsz: usize,

    /// Original frame size as WxH
    #[arg(long)]
    pub frame: FrameSize,

    /// Confidence threshold
    #[arg(long, default_value_t = 0.25)]
    pub conf: f32,

    /// `IoU` threshold for NMS
    #[arg(long, default_value_t = 0.45)]
    pub iou: f32,

    /// NMS class scope (agnostic, per-class)
    #[arg(long, default_value_t = ClassScope::Agnostic)]
    pub class_scope: ClassScope,

    /// Shorthand for --class-scope per-class
    #[arg(long, default_value_t = false)]
    pub class_aware: bool,

    /// Map coordinates back through letterbox padding instead of a plain stretch
    #[arg(long, default_value_t = false)]
    pub letterbox: bool,

    /// Tensor layout (channels-first, channels-last)
    #[arg(long, default_value_t = TensorLayout::ChannelsFirst)]
    pub layout: TensorLayout,

    /// Maximum number of detections
    #[arg(long, default_value_t = 300)]
    pub max_det: usize,

    /// Print detections as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Show verbose output
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub verbose: bool,
}
