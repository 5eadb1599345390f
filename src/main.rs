//! Cerebral Viz entry point
//!
//! Natively, runs the animation headless on the virtual clock and prints the
//! resulting SVG document. The browser build is driven from `web`.

#[cfg(not(target_arch = "wasm32"))]
mod cli {
    use std::path::PathBuf;

    use clap::Parser;

    #[derive(Parser, Debug)]
    #[command(name = "cerebral-viz")]
    #[command(about = "Run the animation headless and export an SVG snapshot")]
    #[command(version)]
    pub struct Cli {
        /// Container width in pixels
        #[arg(default_value_t = 1280.0)]
        pub width: f32,

        /// Container height in pixels
        #[arg(default_value_t = 600.0)]
        pub height: f32,

        /// JSON configuration file (missing fields take defaults)
        #[arg(short, long)]
        pub config: Option<PathBuf>,

        /// Preset applied on top of the configuration (component, embedded)
        #[arg(short, long)]
        pub preset: Option<String>,

        /// Virtual milliseconds to run before exporting
        #[arg(short, long, default_value_t = 15_000.0)]
        pub ms: f64,

        /// Resize to WIDTHxHEIGHT halfway through the run
        #[arg(long)]
        pub resize: Option<String>,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        pub output: Option<PathBuf>,
    }

    pub fn parse_size(s: &str) -> Option<(f32, f32)> {
        let (w, h) = s.split_once(['x', 'X'])?;
        Some((w.trim().parse().ok()?, h.trim().parse().ok()?))
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    use clap::Parser;
    use cerebral_viz::{AnimationConfig, Orchestrator, Preset, SvgRenderer};

    env_logger::init();
    let cli = cli::Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AnimationConfig::from_json(&std::fs::read_to_string(path)?)?,
        None => AnimationConfig::default(),
    };
    if let Some(name) = &cli.preset {
        let preset = Preset::from_str(name).ok_or_else(|| format!("unknown preset '{name}'"))?;
        config.apply_preset(preset);
    }
    let resize = match &cli.resize {
        Some(s) => Some(cli::parse_size(s).ok_or_else(|| format!("bad size '{s}', expected WIDTHxHEIGHT"))?),
        None => None,
    };

    log::info!("Cerebral Viz (headless) {}x{} for {} ms", cli.width, cli.height, cli.ms);
    let mut orchestrator = Orchestrator::new(config, cli.width, cli.height, SvgRenderer::new())?;

    match resize {
        Some((w, h)) => {
            orchestrator.run_for(cli.ms / 2.0);
            orchestrator.resize(w, h);
            orchestrator.run_for(cli.ms / 2.0);
        }
        None => orchestrator.run_for(cli.ms),
    }
    log::info!(
        "Stopped in phase {} at {:.0} ms",
        orchestrator.phase().as_str(),
        orchestrator.now_ms()
    );

    let document = orchestrator.renderer().document();
    orchestrator.dispose();

    match &cli.output {
        Some(path) => std::fs::write(path, document)?,
        None => println!("{document}"),
    }
    Ok(())
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Browser entry point is `web::start`
}
