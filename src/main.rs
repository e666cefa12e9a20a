use std::io::{self, BufRead};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use jarvis_match::config::Config;
use jarvis_match::device::{self, DeviceResolver};
use jarvis_match::exe::ExecutableResolver;
use jarvis_match::normalize::normalize;
use jarvis_match::wake::WakePhraseSpotter;

#[derive(Parser)]
#[command(name = "jarvis-match", about = "Fuzzy wake phrase, program and audio device matching")]
struct Cli {
    /// Config file (defaults to ./config.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Read transcribed fragments from stdin, one per line, and report wake triggers
    Wake {
        /// Override the configured wake phrase
        #[arg(long)]
        phrase: Option<String>,
    },
    /// Find the executable that best matches a program name
    FindExe {
        name: String,
        /// Print the full ranking instead of the best path
        #[arg(long)]
        all: bool,
        /// Maximum directory depth below each root
        #[arg(long)]
        depth: Option<usize>,
        /// Search these directories instead of every drive root
        #[arg(long = "root")]
        roots: Vec<PathBuf>,
        /// Rows printed with --all
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Pick the audio device that best matches a name
    Device {
        query: Option<String>,
        /// List the enumerated devices
        #[arg(long)]
        list: bool,
    },
    /// Print the normalized form of some text
    Normalize { text: String },
}

#[hotpath::main]
fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("jarvis_match=info")),
        )
        .with_writer(io::stderr)
        .init();

    let config = match &cli.config {
        Some(path) => Config::from_path(path)?,
        None => Config::load(),
    };

    match cli.command {
        Command::Wake { phrase } => run_wake(config, phrase),
        Command::FindExe {
            name,
            all,
            depth,
            roots,
            limit,
        } => run_find_exe(config, &name, all, depth, roots, limit),
        Command::Device { query, list } => run_device(config, query.as_deref(), list),
        Command::Normalize { text } => {
            println!("{}", normalize(&text));
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn run_wake(mut config: Config, phrase: Option<String>) -> Result<ExitCode> {
    if let Some(phrase) = phrase {
        config.wake.phrase = phrase;
    }
    let mut spotter = WakePhraseSpotter::new(&config.wake);
    if spotter.phrase().is_empty() {
        anyhow::bail!("wake phrase {:?} is empty after normalization", config.wake.phrase);
    }
    eprintln!("Listening for \"{}\"", spotter.phrase());

    for line in io::stdin().lock().lines() {
        let line = line?;
        if spotter.check(line.trim()) {
            println!("WAKE");
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn run_find_exe(
    mut config: Config,
    name: &str,
    all: bool,
    depth: Option<usize>,
    roots: Vec<PathBuf>,
    limit: usize,
) -> Result<ExitCode> {
    if !roots.is_empty() {
        config.executables.roots = roots;
    }
    let depth = depth.unwrap_or(config.executables.max_depth);
    let resolver = ExecutableResolver::new(&config.executables);
    let search = resolver.rank_at_depth(name, depth);

    if search.diagnostics.timed_out {
        eprintln!("Search deadline reached, ranking partial results");
    }
    if !search.diagnostics.skipped.is_empty() {
        eprintln!(
            "Skipped {} unreadable directories",
            search.diagnostics.skipped.len()
        );
    }

    if all {
        for (i, c) in search.candidates.iter().take(limit).enumerate() {
            let details: Vec<String> = c
                .signals
                .entries()
                .iter()
                .map(|(k, v)| format!("{k}={v:.2}"))
                .collect();
            println!("{:>3}. {:.3}  {}  [{}]", i + 1, c.score, c.path.display(), details.join(" "));
        }
    }

    match search.best_path() {
        Some(path) => {
            if !all {
                println!("{}", path.display());
            }
            Ok(ExitCode::SUCCESS)
        }
        None => {
            eprintln!("No executable found for \"{}\"", name);
            Ok(ExitCode::from(1))
        }
    }
}

fn run_device(config: Config, query: Option<&str>, list: bool) -> Result<ExitCode> {
    let devices = device::enumerate_devices()?;

    if list || query.is_none() {
        for d in &devices {
            println!("[{}] {:?} {}", d.index, d.capability, d.name);
        }
    }
    let Some(query) = query else {
        return Ok(ExitCode::SUCCESS);
    };

    let resolver = DeviceResolver::new(&config.devices);
    match resolver.resolve(query, &devices) {
        Ok(m) => {
            println!("{}", m.name);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            eprintln!("{}", e);
            Ok(ExitCode::from(1))
        }
    }
}
