use std::{
	fs::File,
	io::{self, Write},
	path::PathBuf,
};

use ansimark::{Colorizer, Config, Emitter, InlineEmitter, LineWriter, NoteEmitter, Palette};
use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Bring your shell colors to the web: reads ANSI colored output and writes HTML
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
	/// Files to convert, reads stdin when none are given
	files: Vec<PathBuf>,

	/// Palette to resolve colors with
	#[arg(short, long)]
	palette: Option<String>,

	/// TOML file with the default palette and custom palettes
	#[arg(short, long)]
	config: Option<PathBuf>,

	/// Encode markup as annotations instead of writing inline HTML
	#[arg(long)]
	notes: bool,

	/// Print the names of all known palettes and exit
	#[arg(long)]
	list_palettes: bool,

	/// More logging on stderr, repeat for more
	#[arg(short, long, action = clap::ArgAction::Count)]
	verbose: u8,
}

fn init_tracing(verbose: u8) {
	let level = match verbose {
		0 => "warn",
		1 => "info",
		2 => "debug",
		_ => "trace",
	};
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
	tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();
}

fn convert<W: Write, E: Emitter>(files: &[PathBuf], mut writer: LineWriter<W, E>) -> anyhow::Result<()> {
	if files.is_empty() {
		io::copy(&mut io::stdin().lock(), &mut writer).context("Failed to convert stdin")?;
	}

	// every file starts out plain
	for path in files {
		let mut file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
		io::copy(&mut file, &mut writer).with_context(|| format!("Failed to convert {}", path.display()))?;
		writer.reset().with_context(|| format!("Failed to convert {}", path.display()))?;
	}

	writer.finish().context("Failed to write output")?;
	Ok(())
}

fn main() -> anyhow::Result<()> {
	let args = Args::parse();
	init_tracing(args.verbose);

	let config = match &args.config {
		Some(path) => Config::load(path).with_context(|| format!("Failed to load config {}", path.display()))?,
		None => Config::default(),
	};
	let registry = config.registry().context("Invalid palette in config")?;

	if args.list_palettes {
		let mut stdout = io::stdout().lock();
		for name in registry.names() {
			writeln!(stdout, "{name}")?;
		}
		return Ok(());
	}

	let name = args.palette.as_deref().unwrap_or(config.palette_name());
	if registry.get(name).is_none() {
		tracing::warn!(palette = name, fallback = Palette::DEFAULT_NAME, "unknown palette");
	}
	let palette = registry.resolve(name);
	tracing::info!(palette = palette.name(), "converting");

	let stdout = io::stdout().lock();
	if args.notes {
		convert(&args.files, LineWriter::from_colorizer(Colorizer::with_emitter(stdout, palette, NoteEmitter)))
	} else {
		convert(&args.files, LineWriter::from_colorizer(Colorizer::with_emitter(stdout, palette, InlineEmitter)))
	}
}
