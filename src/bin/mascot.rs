use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

use mascot::{
    Avatar, AvatarRenderer, BlinkConfig, FramePose, FrameRGBA, ManualClock, RenderSettings,
    Theme, TimeSource as _,
};

#[derive(Parser, Debug)]
#[command(name = "mascot", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a single avatar frame as a PNG.
    Frame(FrameArgs),
    /// Render a frame sequence (one PNG per frame) driven by the session.
    Sequence(SequenceArgs),
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Animation timestamp, in milliseconds.
    #[arg(long, default_value_t = 0.0)]
    at_ms: f64,

    /// Render the speaking pose (mouth driven by the oscillator).
    #[arg(long)]
    speaking: bool,

    /// Seed for the decoration jitter stream.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Optional theme JSON; omitted fields keep their defaults.
    #[arg(long)]
    theme: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct SequenceArgs {
    /// Output directory; frames are written as frame_00000.png, ...
    #[arg(long)]
    out_dir: PathBuf,

    /// Sequence length, in milliseconds.
    #[arg(long, default_value_t = 3000.0)]
    duration_ms: f64,

    /// Frames per second.
    #[arg(long, default_value_t = 30)]
    fps: u32,

    /// Run the whole sequence in the speaking state.
    #[arg(long)]
    speaking: bool,

    /// Seed for blink scheduling and decoration jitter.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Optional theme JSON; omitted fields keep their defaults.
    #[arg(long)]
    theme: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Frame(args) => cmd_frame(args),
        Command::Sequence(args) => cmd_sequence(args),
    }
}

fn read_theme_json(path: Option<&Path>) -> anyhow::Result<Theme> {
    let Some(path) = path else {
        return Ok(Theme::default());
    };
    let f = File::open(path).with_context(|| format!("open theme '{}'", path.display()))?;
    let theme = serde_json::from_reader(BufReader::new(f)).with_context(|| "parse theme JSON")?;
    Ok(theme)
}

fn write_png(path: &Path, frame: &FrameRGBA) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    // The scene starts from an opaque background, so premultiplied and
    // straight alpha coincide for the saved frame.
    image::save_buffer_with_format(
        path,
        &frame.data,
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", path.display()))?;
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let settings = RenderSettings {
        seed: args.seed,
        theme: read_theme_json(args.theme.as_deref())?,
        ..Default::default()
    };
    let mut renderer = AvatarRenderer::new(settings)?;

    let mouth = if args.speaking {
        mascot::signals::mouth_openness(args.at_ms)
    } else {
        0.0
    };
    let pose = FramePose::new(mouth, false, args.speaking, args.at_ms);
    let frame = renderer.render(&pose)?;

    write_png(&args.out, &frame)?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_sequence(args: SequenceArgs) -> anyhow::Result<()> {
    anyhow::ensure!(args.fps > 0, "fps must be > 0");
    anyhow::ensure!(
        args.duration_ms.is_finite() && args.duration_ms > 0.0,
        "duration must be > 0"
    );

    let settings = RenderSettings {
        seed: args.seed,
        theme: read_theme_json(args.theme.as_deref())?,
        ..Default::default()
    };
    let mut avatar = Avatar::start(BlinkConfig::default(), settings, 0.0)?;
    avatar.set_speaking(args.speaking);

    let step_ms = 1000.0 / f64::from(args.fps);
    let frame_count = (args.duration_ms / step_ms).ceil() as u64;

    // Offline sequencing: the manual clock stands in for the display refresh.
    let clock = ManualClock::at(0.0);
    for i in 0..frame_count {
        clock.advance(step_ms);
        let frame = avatar
            .on_frame(clock.now_ms())?
            .context("session stopped mid-sequence")?;
        let path = args.out_dir.join(format!("frame_{i:05}.png"));
        write_png(&path, &frame)?;
    }

    eprintln!(
        "wrote {} frames to {}",
        frame_count,
        args.out_dir.display()
    );
    Ok(())
}
