//! `tbr` - tritium breeding ratio runs on DAGMC geometry
//!
//! ## Commands
//!
//! - `run`: resolve materials, write the source, run OpenMC, report the TBR
//! - `extract`: sum a tally from an existing result artifact
//! - `deck`: render the OpenMC input deck without running it
//! - `materials`: list or resolve entries of the material database
//! - `source`: write the plasma source artifact

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, Level};

use breeder_core::{
    build_model, extract_tally_sum, material_database, publish_summary, resolve, run_pipeline,
    write_summary, MaterialCatalog, MaterialDatabase, MaterialRequest, MaterialSet,
    ParameterFileCompiler, ResultHandle, RunConfig, RunSpan, SourceCompiler,
};
use breeder_core::tally::TBR_TALLY;
use openmc_runner::{CommandSourceCompiler, InputDeck, OpenmcEngine};

#[derive(Parser)]
#[command(name = "tbr")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Tritium breeding ratio of a DAGMC fusion model via OpenMC", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline and report the TBR
    Run(RunArgs),

    /// Sum a tally's mean column from an existing result artifact
    Extract {
        /// tallies.out or JSON export
        artifact: PathBuf,

        /// Tally to reduce
        #[arg(short, long, default_value = "TBR")]
        tally: String,

        /// Write the summary JSON here
        #[arg(short, long)]
        summary: Option<PathBuf>,

        /// Copy the summary into this existing directory
        #[arg(long, requires = "summary")]
        publish_dir: Option<PathBuf>,
    },

    /// Render the OpenMC input deck without running the engine
    Deck {
        /// Run configuration (TOML)
        #[arg(short, long, env = "TBR_CONFIG")]
        config: Option<PathBuf>,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        out: PathBuf,
    },

    /// Inspect the material database
    Materials {
        /// Extra JSON catalog overlaid on the built-in one
        #[arg(long)]
        catalog: Option<PathBuf>,

        #[command(subcommand)]
        action: Option<MaterialsAction>,
    },

    /// Write the plasma source artifact only
    Source {
        /// Run configuration (TOML)
        #[arg(short, long, env = "TBR_CONFIG")]
        config: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum MaterialsAction {
    /// Resolve one material into nuclide fractions
    Resolve {
        name: String,

        /// Li-6 enrichment in percent
        #[arg(short, long)]
        enrichment: Option<f64>,
    },
}

#[derive(Args, Debug, Default)]
struct RunArgs {
    /// Run configuration (TOML)
    #[arg(short, long, env = "TBR_CONFIG")]
    config: Option<PathBuf>,

    /// Number of batches
    #[arg(long)]
    batches: Option<u32>,

    /// Particles per batch
    #[arg(long)]
    particles: Option<u64>,

    /// Directory for the input deck and engine outputs
    #[arg(long)]
    working_dir: Option<PathBuf>,

    /// OpenMC executable
    #[arg(long, env = "TBR_OPENMC")]
    openmc: Option<PathBuf>,

    /// OpenMP threads for the engine
    #[arg(long)]
    threads: Option<u32>,

    /// Copy the summary into this existing directory
    #[arg(long, conflicts_with = "no_publish")]
    publish_dir: Option<PathBuf>,

    /// Do not copy the summary anywhere
    #[arg(long)]
    no_publish: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    breeder_core::init_tracing(cli.json, level);
    tracing::debug!(version = breeder_core::VERSION, "tbr starting");

    match cli.command {
        Commands::Run(args) => cmd_run(&args).await,
        Commands::Extract {
            artifact,
            tally,
            summary,
            publish_dir,
        } => cmd_extract(&artifact, &tally, summary.as_deref(), publish_dir.as_deref()),
        Commands::Deck { config, out } => cmd_deck(config.as_deref(), &out).await,
        Commands::Materials { catalog, action } => match action {
            None => cmd_materials_list(catalog.as_deref()),
            Some(MaterialsAction::Resolve { name, enrichment }) => {
                cmd_materials_resolve(catalog.as_deref(), &name, enrichment)
            }
        },
        Commands::Source { config } => cmd_source(config.as_deref()).await,
    }
}

fn load_config(path: Option<&Path>) -> Result<RunConfig> {
    RunConfig::load_or_default(path).with_context(|| match path {
        Some(p) => format!("Failed to load run configuration {}", p.display()),
        None => "Failed to build default run configuration".to_string(),
    })
}

/// Command-line flags win over the configuration file.
fn apply_overrides(config: &mut RunConfig, args: &RunArgs) {
    if let Some(batches) = args.batches {
        config.settings.batches = batches;
    }
    if let Some(particles) = args.particles {
        config.settings.particles = particles;
    }
    if let Some(dir) = &args.working_dir {
        config.engine.working_dir = dir.clone();
    }
    if let Some(exe) = &args.openmc {
        config.engine.executable = exe.clone();
    }
    if let Some(threads) = args.threads {
        config.engine.threads = Some(threads);
    }
    if let Some(dir) = &args.publish_dir {
        config.output.publish = true;
        config.output.publish_dir = Some(dir.clone());
    }
    if args.no_publish {
        config.output.publish = false;
    }
}

fn source_compiler(config: &RunConfig) -> Box<dyn SourceCompiler> {
    match &config.source.build_command {
        Some(command) => Box::new(CommandSourceCompiler::new(command.clone())),
        None => Box::new(ParameterFileCompiler::new(
            config.source.sampler_library.clone(),
        )),
    }
}

fn print_value(tally: &str, value: f64) {
    if tally == TBR_TALLY {
        println!("The tritium breeding ratio was found, TBR = {value}");
    } else {
        println!("{tally} = {value}");
    }
}

/// Run the full pipeline
async fn cmd_run(args: &RunArgs) -> Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    apply_overrides(&mut config, args);

    let db = material_database(&config).context("Failed to load material database")?;
    let compiler = source_compiler(&config);
    let engine = OpenmcEngine::from_config(&config.engine);

    let outcome = run_pipeline(&config, &db, compiler.as_ref(), &engine)
        .await
        .context("TBR run failed")?;

    print_value(&outcome.tally, outcome.value);
    info!(
        run_id = %outcome.run_id,
        summary = %outcome.summary.display(),
        published = ?outcome.published_to,
        "run complete"
    );
    Ok(())
}

/// Reduce a tally from an existing artifact
fn cmd_extract(
    artifact: &Path,
    tally: &str,
    summary: Option<&Path>,
    publish_dir: Option<&Path>,
) -> Result<()> {
    let _span = RunSpan::enter(&format!("extract:{}", artifact.display()));

    let handle = ResultHandle::from_path(artifact);
    let value = extract_tally_sum(&handle, tally)
        .with_context(|| format!("Failed to extract tally {tally} from {}", artifact.display()))?;
    print_value(&value.tally, value.value);

    if let Some(path) = summary {
        write_summary(path, &value)
            .with_context(|| format!("Failed to write summary {}", path.display()))?;
        if let Some(dir) = publish_dir {
            let copy = publish_summary(path, dir).context("Failed to publish summary")?;
            println!("Published: {}", copy.display());
        }
    }
    Ok(())
}

/// Render the input deck into `out`
async fn cmd_deck(config: Option<&Path>, out: &Path) -> Result<()> {
    let config = load_config(config)?;
    let db = material_database(&config).context("Failed to load material database")?;
    let materials =
        MaterialSet::resolve_all(&db, &config.materials).context("Failed to resolve materials")?;
    let compiled = source_compiler(&config)
        .compile(&config.source.plasma(), &config.source.artifact)
        .await
        .context("Failed to write plasma source")?;
    let model = build_model(&config, materials, compiled.reference)
        .context("Invalid run configuration")?;

    std::fs::create_dir_all(out)
        .with_context(|| format!("Failed to create {}", out.display()))?;
    let written = InputDeck::render(&model)
        .and_then(|deck| deck.write_to(out))
        .context("Failed to write input deck")?;
    for path in written {
        println!("{}", path.display());
    }
    Ok(())
}

/// Built-in catalog plus an optional overlay file
fn catalog(path: Option<&Path>) -> Result<MaterialCatalog> {
    let config = RunConfig {
        material_catalog: path.map(Path::to_path_buf),
        ..RunConfig::default()
    };
    material_database(&config).context("Failed to load material database")
}

/// List material names with density and basis
fn cmd_materials_list(path: Option<&Path>) -> Result<()> {
    let db = catalog(path)?;
    for name in db.names() {
        if let Some(entry) = db.lookup(&name) {
            let enrichable = entry
                .enrichment_target
                .as_deref()
                .map(|t| format!("  enrichable ({t})"))
                .unwrap_or_default();
            println!(
                "{:<16} {:>8.3} g/cm3  {:?}{}",
                entry.name, entry.density, entry.basis, enrichable
            );
        }
    }
    Ok(())
}

/// Resolve one material and print it as JSON
fn cmd_materials_resolve(path: Option<&Path>, name: &str, enrichment: Option<f64>) -> Result<()> {
    let db = catalog(path)?;
    let request = MaterialRequest {
        name: name.to_string(),
        enrichment,
    };
    let material = resolve(&db, &request).with_context(|| format!("Failed to resolve {name}"))?;
    println!("{}", serde_json::to_string_pretty(&material)?);
    Ok(())
}

/// Write the plasma source artifact
async fn cmd_source(config: Option<&Path>) -> Result<()> {
    let config = load_config(config)?;
    let compiled = source_compiler(&config)
        .compile(&config.source.plasma(), &config.source.artifact)
        .await
        .context("Failed to write plasma source")?;
    println!("Source artifact: {}", compiled.artifact.display());
    println!("Digest: {}", compiled.digest.short());
    Ok(())
}
