use std::ffi::CString;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use vvvst_host::{
    info, Engine, EngineLibrary, EnginePlugin, LibraryResolver, PluginCallbacks, ProcessContext,
    ResolverConfig, SymbolSource, TimePosition,
};

#[derive(Parser, Debug)]
#[command(about = "Check that an engine library exports the full plug-in ABI")]
struct Args {
    /// Engine library to load. Defaults to the path the plug-in would use.
    #[arg(long)]
    engine: Option<PathBuf>,
    /// Also create an instance, render some blocks and round-trip its state.
    #[arg(long)]
    smoke: bool,
    #[arg(long, default_value_t = 48000.0)]
    sample_rate: f64,
    #[arg(long, default_value_t = 512)]
    frames: u32,
    #[arg(long, default_value_t = 16)]
    blocks: u32,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init()
        .ok();

    let args = Args::parse();
    let path = match &args.engine {
        Some(path) => path.clone(),
        None => LibraryResolver::new(ResolverConfig::load())
            .library_path()
            .context("Could not determine the engine library path")?,
    };

    let library = EngineLibrary::load(&path)
        .with_context(|| format!("Failed to load engine library {}", path.display()))?;
    let engine = Arc::new(Engine::new(Arc::new(library) as Arc<dyn SymbolSource>));

    let missing = engine.missing_symbols();
    if !missing.is_empty() {
        anyhow::bail!("{} does not export: {}", path.display(), missing.join(", "));
    }

    let version = engine.get_version()?;
    let name = engine.plugin_name()?;
    println!(
        "{} {}.{}.{} at {}",
        name,
        version.major,
        version.minor,
        version.patch,
        path.display()
    );

    let descriptor = &info::DESCRIPTOR;
    println!(
        "Shell {} [{}], {} outputs",
        descriptor.name, descriptor.clap_id, descriptor.num_outputs
    );

    if args.smoke {
        smoke(engine, &args)?;
    }
    Ok(())
}

fn smoke(engine: Arc<Engine>, args: &Args) -> Result<()> {
    let mut plugin = EnginePlugin::with_engine(engine).context("Engine refused an instance")?;

    let frames = args.frames as usize;
    let mut channels: Vec<Vec<f32>> = (0..info::NUM_OUTPUTS)
        .map(|_| vec![0.0; frames])
        .collect();
    let mut outputs: Vec<*mut f32> = channels.iter_mut().map(|c| c.as_mut_ptr()).collect();

    let mut position = 0u64;
    for _ in 0..args.blocks {
        let context = ProcessContext {
            sample_rate: args.sample_rate,
            time: TimePosition {
                playing: true,
                frame: position,
            },
        };
        plugin.run(&[], &mut outputs, args.frames, &[], &context);
        position += u64::from(args.frames);
    }
    let peak = channels
        .iter()
        .flatten()
        .fold(0.0f32, |peak, sample| peak.max(sample.abs()));
    tracing::info!(blocks = args.blocks, frames, peak, "rendered");

    let state = plugin.state(info::STATE_KEY)?;
    plugin.set_state(info::STATE_KEY, &state)?;
    let restored: CString = plugin.state(info::STATE_KEY)?;
    if restored != state {
        anyhow::bail!("State changed across a save/load cycle");
    }
    println!(
        "Smoke run passed: {} blocks x {} frames, {} state bytes",
        args.blocks,
        args.frames,
        state.as_bytes().len()
    );
    Ok(())
}
