//! Meridian command-line interface.
//!
//! Group and inspect lens prescriptions from TOML files:
//! ```sh
//! meridian-cli elements lens.toml --save elements.json
//! meridian-cli elements lens.toml --restore elements.json
//! meridian-cli validate lens.toml
//! meridian-cli diffract doe.toml
//! ```

mod config;
mod runner;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "meridian-cli")]
#[command(about = "Meridian: lens element grouping and diffractive surfaces")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Group a lens prescription into elements and list them.
    Elements {
        /// Path to the lens prescription.
        config: PathBuf,
        /// Save the element model as JSON.
        #[arg(short, long)]
        save: Option<PathBuf>,
        /// Restore a previously saved element model instead of regrouping.
        #[arg(short, long)]
        restore: Option<PathBuf>,
        /// Write element outlines as CSV.
        #[arg(long)]
        outlines: Option<PathBuf>,
    },
    /// Validate a lens prescription without grouping it.
    Validate {
        /// Path to the lens prescription.
        config: PathBuf,
    },
    /// Send a single ray through a diffractive surface.
    Diffract {
        /// Path to the diffractive surface description.
        config: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Elements {
            config,
            save,
            restore,
            outlines,
        } => {
            let lens = config::load_lens(&config)?;
            let seq = config::build_sequence(&lens)?;
            println!("Prescription: {} ({} surfaces)", config.display(), seq.interface_count());

            let em = runner::group_elements(&seq, restore.as_deref())?;
            println!("{}", em.list_elements(&seq));

            if let Some(path) = save {
                runner::write_elements_json(&em, &path)?;
            }
            if let Some(path) = outlines {
                runner::write_outlines_csv(&em, &seq, &path)?;
            }
            Ok(())
        }
        Commands::Validate { config } => {
            let lens = config::load_lens(&config)?;
            let seq = config::build_sequence(&lens)?;
            println!(
                "Prescription is valid: {} ({} surfaces)",
                config.display(),
                seq.interface_count()
            );
            Ok(())
        }
        Commands::Diffract { config } => {
            let cfg = config::load_doe(&config)?;
            let (doe, res) = runner::run_diffraction(&cfg)?;
            println!("{}", doe.list_doe());
            println!(
                "out_dir: {:12.8} {:12.8} {:12.8}",
                res.out_dir.x, res.out_dir.y, res.out_dir.z
            );
            println!("phase:   {:12.8}", res.phase);
            Ok(())
        }
    }
}
