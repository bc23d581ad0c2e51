#![warn(unused_extern_crates)]
use anyhow::{Context, Result};
use chinify::config::{load_config, to_toml};
use chinify::{
    LandmarkDetector, Landmarks, NoDetector, PlacementParams, RendererKind, Session,
    StaticDetector,
};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct CmdArgs {
    /// Photo to draw on
    #[arg(short, long, required_unless_present = "print_config")]
    input: Option<PathBuf>,

    /// Where to write the PNG result. Defaults to the configured filename
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Config file to read from
    #[arg(short, long, value_name = "FILE", default_value = "chinify.toml")]
    config: PathBuf,

    /// Face landmarks as JSON, normalized to [0, 1]. Uses the fixed layout
    /// if unset
    #[arg(short, long, value_name = "FILE")]
    landmarks: Option<PathBuf>,

    /// How far the chin grows past its base size, 0 to 1
    #[arg(long, default_value = "0.5")]
    intensity: f32,

    /// Chin width as a fraction of face width
    #[arg(long)]
    width_factor: Option<f32>,

    /// Vertical nudge as a fraction of face height
    #[arg(long, allow_hyphen_values = true)]
    vertical_offset: Option<f32>,

    /// Overrides the configured renderer
    #[arg(short, long)]
    renderer: Option<RendererArg>,

    /// Print the effective config as TOML and exit
    #[arg(long)]
    print_config: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum RendererArg {
    Procedural,
    Asset,
}

impl From<RendererArg> for RendererKind {
    fn from(r: RendererArg) -> RendererKind {
        match r {
            RendererArg::Procedural => RendererKind::Procedural,
            RendererArg::Asset => RendererKind::Asset,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let filter = EnvFilter::from_default_env();
    tracing_subscriber::fmt()
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_env_filter(filter)
        .init();

    let args = CmdArgs::parse();

    let mut config = load_config(&args.config)?;
    if let Some(kind) = args.renderer {
        config.render.kind = kind.into();
    }

    if args.print_config {
        print!("{}", to_toml(&config)?);
        return Ok(());
    }

    let detector: Box<dyn LandmarkDetector> = match &args.landmarks {
        Some(path) => Box::new(StaticDetector::new(Landmarks::from_json_file(path)?)),
        None => Box::new(NoDetector),
    };

    let params = PlacementParams {
        intensity: args.intensity,
        width_factor: args.width_factor,
        vertical_offset: args.vertical_offset,
    };

    let mut session = Session::new(config);
    let output = args
        .output
        .unwrap_or_else(|| PathBuf::from(session.download_name()));

    // Guaranteed by clap unless --print-config was given
    let Some(input) = args.input else {
        return Ok(());
    };

    let bytes = std::fs::read(&input).with_context(|| format!("reading {}", input.display()))?;
    session.load_image(&bytes)?;

    let generated = session.generate(detector.as_ref(), params).await?;
    let png = session.encode_png()?;
    std::fs::write(&output, png).with_context(|| format!("writing {}", output.display()))?;

    info!(
        "Wrote {} from {} ({}, color {:?})",
        output.display(),
        input.display(),
        if generated.placement.is_detected() {
            "face"
        } else {
            "fallback"
        },
        generated.color.0
    );

    Ok(())
}
