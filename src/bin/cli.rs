//! chaosgen CLI: list generators, render MIDI files, run live.
//!
//! Usage:
//!   cg-cli list
//!   cg-cli ports
//!   cg-cli render rack.toml in.mid out.mid
//!   cg-cli live rack.toml --input Keystation --output FluidSynth

use cg_master::{list_ports, Controller, HostError, GENERATORS};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[cfg(all(feature = "alloc_check", debug_assertions))]
#[global_allocator]
static A: assert_no_alloc::AllocDisabler = assert_no_alloc::AllocDisabler;

#[derive(Parser)]
#[command(name = "cg-cli")]
#[command(about = "Chaotic MIDI bass, chord and drum generators", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List generators and their controls
    List,
    /// List MIDI input and output ports
    Ports,
    /// Render a MIDI file through a rack
    Render {
        /// Rack configuration (TOML)
        config: PathBuf,
        /// Input Standard MIDI File
        input: PathBuf,
        /// Output Standard MIDI File
        output: PathBuf,
    },
    /// Run a rack between live MIDI ports until Enter is pressed
    Live {
        /// Rack configuration (TOML)
        config: PathBuf,
        /// Substring of the input port name
        #[arg(short, long)]
        input: String,
        /// Substring of the output port name
        #[arg(short, long)]
        output: String,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::List => {
            list_generators();
            Ok(())
        }
        Commands::Ports => print_ports(),
        Commands::Render { config, input, output } => render(&config, &input, &output),
        Commands::Live { config, input, output } => live(&config, &input, &output),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn list_generators() {
    for info in GENERATORS {
        println!("{} ({})", info.name, info.short_name);
        println!("  {}", info.uri);
        for param in info.params {
            println!(
                "  {:<18} {:<22} [{} .. {}] default {}",
                param.symbol, param.name, param.min, param.max, param.default
            );
        }
        println!();
    }
}

fn print_ports() -> Result<(), HostError> {
    let ports = list_ports()?;
    println!("Inputs:");
    for name in &ports.inputs {
        println!("  {}", name);
    }
    println!("Outputs:");
    for name in &ports.outputs {
        println!("  {}", name);
    }
    Ok(())
}

fn render(config: &Path, input: &Path, output: &Path) -> Result<(), HostError> {
    let ctrl = Controller::load(config)?;
    ctrl.render_file(input, output)?;
    println!("Wrote {}", output.display());
    Ok(())
}

fn live(config: &Path, input: &str, output: &str) -> Result<(), HostError> {
    let ctrl = Controller::load(config)?;
    let stop = Arc::new(AtomicBool::new(false));

    let stop_on_enter = stop.clone();
    std::thread::spawn(move || {
        let mut line = String::new();
        let _ = std::io::stdin().read_line(&mut line);
        stop_on_enter.store(true, Ordering::Relaxed);
    });

    println!("Running, press Enter to stop.");
    ctrl.run_live(input, output, &stop)
}
