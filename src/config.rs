//! TOML configuration: which palette to use and any custom palettes.
//!
//! ```toml
//! palette = "solarized"
//!
//! [[palettes]]
//! name = "solarized"
//! black = "#073642"
//! # ... all 16 slots
//! default-foreground = "#839496"
//! default-background = "black"
//! ```

use std::{
	fs, io,
	path::{Path, PathBuf},
};

use serde::Deserialize;

use crate::palette::{Palette, PaletteError, PaletteRegistry};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	#[error("Failed to read config {path}: {source}")]
	Read { path: PathBuf, source: io::Error },

	#[error("Failed to parse config: {0}")]
	Parse(#[from] toml::de::Error),

	#[error(transparent)]
	Palette(#[from] PaletteError),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
	/// Name of the palette to render with
	pub palette: Option<String>,
	#[serde(default)]
	pub palettes: Vec<PaletteConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct PaletteConfig {
	pub name: String,
	pub black: String,
	pub red: String,
	pub green: String,
	pub yellow: String,
	pub blue: String,
	pub magenta: String,
	pub cyan: String,
	pub white: String,
	pub bright_black: String,
	pub bright_red: String,
	pub bright_green: String,
	pub bright_yellow: String,
	pub bright_blue: String,
	pub bright_magenta: String,
	pub bright_cyan: String,
	pub bright_white: String,
	/// A color or the name of one of the slots above
	pub default_foreground: Option<String>,
	pub default_background: Option<String>,
}

impl PaletteConfig {
	/// # Errors
	///
	/// Fails when the palette doesn't pass [`Palette::new`] validation.
	pub fn build(&self) -> Result<Palette, PaletteError> {
		let colors = [
			&self.black,
			&self.red,
			&self.green,
			&self.yellow,
			&self.blue,
			&self.magenta,
			&self.cyan,
			&self.white,
			&self.bright_black,
			&self.bright_red,
			&self.bright_green,
			&self.bright_yellow,
			&self.bright_blue,
			&self.bright_magenta,
			&self.bright_cyan,
			&self.bright_white,
		]
		.map(String::clone);

		Palette::new(self.name.as_str(), colors)?
			.with_defaults(self.default_foreground.as_deref(), self.default_background.as_deref())
	}
}

impl Config {
	/// # Errors
	///
	/// Fails on invalid TOML or unknown keys.
	pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
		Ok(toml::from_str(input)?)
	}

	/// # Errors
	///
	/// Fails when the file can't be read or parsed.
	pub fn load(path: &Path) -> Result<Self, ConfigError> {
		let input = fs::read_to_string(path).map_err(|source| ConfigError::Read {
			path: path.to_path_buf(),
			source,
		})?;
		tracing::debug!(path = %path.display(), "loaded config");
		Self::from_toml_str(&input)
	}

	pub fn palette_name(&self) -> &str {
		self.palette.as_deref().unwrap_or(Palette::DEFAULT_NAME)
	}

	/// Built-in palettes plus the valid custom ones from this config.
	///
	/// # Errors
	///
	/// Fails on the first invalid custom palette.
	pub fn registry(&self) -> Result<PaletteRegistry, ConfigError> {
		let custom = self.palettes.iter().map(PaletteConfig::build).collect::<Result<Vec<Palette>, PaletteError>>()?;
		Ok(PaletteRegistry::with_custom(custom))
	}
}
