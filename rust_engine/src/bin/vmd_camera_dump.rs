use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use mmd_camera_importer::camera::{get_settings, set_settings, ChannelProperty, MAX_CAMERA_COUNT};
use mmd_camera_importer::{
    import_camera, CameraCutImportType, FrameRate, RecordingScene, RecordingTimeline,
    VmdImporter,
};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CutMode {
    AsIs,
    ConstantKey,
    OneFrameInterval,
    OneFrameIntervalConstant,
}

impl From<CutMode> for CameraCutImportType {
    fn from(mode: CutMode) -> Self {
        match mode {
            CutMode::AsIs => CameraCutImportType::ImportAsIs,
            CutMode::ConstantKey => CameraCutImportType::ConstantKey,
            CutMode::OneFrameInterval => CameraCutImportType::OneFrameInterval,
            CutMode::OneFrameIntervalConstant => {
                CameraCutImportType::OneFrameIntervalWithConstantKey
            }
        }
    }
}

#[derive(Parser)]
#[command(name = "vmd_camera_dump", about = "Validate a VMD file and retime its camera motion")]
struct Args {
    /// Input .vmd file
    input: PathBuf,

    /// Host tick resolution (ticks per second)
    #[arg(long, default_value_t = 24000)]
    tick_resolution: u32,

    /// Host display rate (frames per second)
    #[arg(long, default_value_t = 30)]
    display_rate: u32,

    /// Number of cameras to rotate between on cuts [default: 2]
    #[arg(
        long,
        value_parser = clap::value_parser!(u32).range(1..=MAX_CAMERA_COUNT as i64)
    )]
    camera_count: Option<u32>,

    /// How to import camera cuts [default: one-frame-interval]
    #[arg(long, value_enum)]
    cut_mode: Option<CutMode>,

    /// Uniform scale for positions and distance [default: 10]
    #[arg(long)]
    scale: Option<f32>,

    /// Add motion blur keys with this amount (0..1)
    #[arg(long)]
    motion_blur: Option<f32>,

    /// Only validate the file, don't parse or import
    #[arg(long)]
    validate_only: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let args = Args::parse();
    apply_overrides(&args);

    if let Err(e) = run(&args) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

/// 命令行参数覆盖到全局配置上
fn apply_overrides(args: &Args) {
    let mut settings = get_settings();
    if let Some(scale) = args.scale {
        settings.import_uniform_scale = scale;
    }
    if let Some(mode) = args.cut_mode {
        settings.camera_cut_import_type = mode.into();
    }
    if let Some(count) = args.camera_count {
        settings.camera_count = count;
    }
    if let Some(amount) = args.motion_blur {
        settings.add_motion_blur_key = true;
        settings.motion_blur_amount = amount;
    }
    set_settings(settings);
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let mut importer = VmdImporter::open(&args.input);

    let report = importer.inspect()?;
    println!("{}", args.input.display());
    println!("  size:         {} bytes ({} declared)", report.stream_len, report.declared_len);
    println!("  bone:         {}", report.bone_keyframe_count);
    println!("  morph:        {}", report.morph_keyframe_count);
    println!("  camera:       {}", report.camera_keyframe_count);
    println!("  light:        {}", report.light_keyframe_count);
    println!("  self shadow:  {}", report.self_shadow_keyframe_count);
    println!(
        "  property:     {} ({} IK states)",
        report.property_keyframe_count, report.ik_state_count
    );
    for warning in &report.warnings {
        println!("  warning:      {}", warning);
    }

    if args.validate_only {
        return Ok(());
    }

    let parse = importer.parse();
    if !parse.is_success() {
        return Err("failed to parse VMD".into());
    }
    println!("  model:        {}", parse.header.model_name_str());

    let settings = get_settings();

    let mut timeline = RecordingTimeline::new(
        FrameRate::new(args.tick_resolution, 1),
        FrameRate::new(args.display_rate, 1),
    );
    let mut scene = RecordingScene::new();
    let summary = import_camera(&parse, &mut timeline, &mut scene, &settings)?;

    println!();
    println!(
        "frame ratio {}, one sample frame {}, {} keys written",
        summary.frame_ratio, summary.one_sample_frame, summary.keys_written
    );

    println!("{:>4} {:>8} {:>8} {:>12}", "CUT", "START", "END", "CAMERA");
    for (index, cut) in summary.cuts.iter().enumerate() {
        let camera = summary.rigs[index % summary.rigs.len()].camera;
        println!("{:>4} {:>8} {:>8} {:>12}", index, cut.start, cut.end, camera.to_string());
    }

    println!();
    println!("{:>8} {:<40} {:>6}", "BINDING", "CHANNEL", "KEYS");
    for (channel, recorded) in timeline.channels() {
        let keys = recorded.key_count();
        let default = match (channel.property, recorded.default_value) {
            (ChannelProperty::MotionBlurAmount, Some(value)) => format!(" (default {})", value),
            _ => String::new(),
        };
        println!(
            "{:>8} {:<40} {:>6}{}",
            channel.binding.to_string(),
            channel.property.path(),
            keys,
            default
        );
    }

    Ok(())
}
