//! Named color palettes and the registry they are looked up in.

use std::{fmt, str::FromStr, sync::Arc};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorSlot {
	Black,
	Red,
	Green,
	Yellow,
	Blue,
	Magenta,
	Cyan,
	White,
	BrightBlack,
	BrightRed,
	BrightGreen,
	BrightYellow,
	BrightBlue,
	BrightMagenta,
	BrightCyan,
	BrightWhite,
	/// Host default text color, only resolvable when the palette defines one
	DefaultForeground,
	/// Host default background color, only resolvable when the palette defines one
	DefaultBackground,
}

impl ColorSlot {
	/// The 16 slots every palette has to define, in SGR order
	pub const ALL: [ColorSlot; 16] = [
		ColorSlot::Black,
		ColorSlot::Red,
		ColorSlot::Green,
		ColorSlot::Yellow,
		ColorSlot::Blue,
		ColorSlot::Magenta,
		ColorSlot::Cyan,
		ColorSlot::White,
		ColorSlot::BrightBlack,
		ColorSlot::BrightRed,
		ColorSlot::BrightGreen,
		ColorSlot::BrightYellow,
		ColorSlot::BrightBlue,
		ColorSlot::BrightMagenta,
		ColorSlot::BrightCyan,
		ColorSlot::BrightWhite,
	];

	/// Normal color for an SGR offset (`30 + offset`, `40 + offset`)
	pub fn normal(offset: u16) -> Option<Self> {
		if offset < 8 { Self::ALL.get(usize::from(offset)).copied() } else { None }
	}

	/// Bright color for an SGR offset (`90 + offset`, `100 + offset`)
	pub fn bright(offset: u16) -> Option<Self> {
		if offset < 8 { Self::ALL.get(usize::from(offset) + 8).copied() } else { None }
	}

	/// Position inside [`ColorSlot::ALL`], `None` for the two default sentinels
	pub fn index(self) -> Option<usize> {
		Self::ALL.iter().position(|slot| *slot == self)
	}

	pub fn name(self) -> &'static str {
		match self {
			ColorSlot::Black => "black",
			ColorSlot::Red => "red",
			ColorSlot::Green => "green",
			ColorSlot::Yellow => "yellow",
			ColorSlot::Blue => "blue",
			ColorSlot::Magenta => "magenta",
			ColorSlot::Cyan => "cyan",
			ColorSlot::White => "white",
			ColorSlot::BrightBlack => "bright-black",
			ColorSlot::BrightRed => "bright-red",
			ColorSlot::BrightGreen => "bright-green",
			ColorSlot::BrightYellow => "bright-yellow",
			ColorSlot::BrightBlue => "bright-blue",
			ColorSlot::BrightMagenta => "bright-magenta",
			ColorSlot::BrightCyan => "bright-cyan",
			ColorSlot::BrightWhite => "bright-white",
			ColorSlot::DefaultForeground => "default-foreground",
			ColorSlot::DefaultBackground => "default-background",
		}
	}
}

impl fmt::Display for ColorSlot {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "{}", self.name())
	}
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown color slot: {0}")]
pub struct UnknownSlot(pub String);

impl FromStr for ColorSlot {
	type Err = UnknownSlot;

	fn from_str(input: &str) -> Result<Self, Self::Err> {
		let wanted = input.trim().to_ascii_lowercase().replace('_', "-");
		[ColorSlot::DefaultForeground, ColorSlot::DefaultBackground]
			.into_iter()
			.chain(Self::ALL)
			.find(|slot| slot.name() == wanted)
			.ok_or_else(|| UnknownSlot(String::from(input)))
	}
}

/// Errors raised while building a palette from user supplied values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PaletteError {
	#[error("Palette name cannot be empty")]
	EmptyName,

	#[error("Palette '{palette}' has no value for {slot}")]
	EmptyColor { palette: String, slot: ColorSlot },

	#[error("Palette '{palette}' has an invalid value for {slot}: {value:?}")]
	InvalidColor {
		palette: String,
		slot: ColorSlot,
		value: String,
	},
}

/// An immutable mapping from [`ColorSlot`] to a CSS color value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
	name: String,
	colors: [String; 16],
	default_foreground: Option<String>,
	default_background: Option<String>,
}

impl Palette {
	pub const DEFAULT_NAME: &'static str = "xterm";

	/// Build a custom palette from the 16 slot colors in [`ColorSlot::ALL`] order.
	///
	/// # Errors
	///
	/// Fails if the name is blank or any value is empty or could escape a `style` attribute.
	pub fn new(name: impl Into<String>, colors: [String; 16]) -> Result<Self, PaletteError> {
		let name = name.into().trim().to_string();
		if name.is_empty() {
			return Err(PaletteError::EmptyName);
		}

		for (slot, value) in ColorSlot::ALL.iter().zip(colors.iter()) {
			Self::validate(&name, *slot, value)?;
		}

		Ok(Self {
			name,
			colors,
			default_foreground: None,
			default_background: None,
		})
	}

	/// Set the host default colors.
	///
	/// Each value is either a concrete color or the name of one of the 16 slots of this palette.
	///
	/// # Errors
	///
	/// Fails when a value is neither a slot name nor a valid color.
	pub fn with_defaults(mut self, foreground: Option<&str>, background: Option<&str>) -> Result<Self, PaletteError> {
		self.default_foreground = foreground
			.map(|value| self.resolve_default(ColorSlot::DefaultForeground, value))
			.transpose()?;
		self.default_background = background
			.map(|value| self.resolve_default(ColorSlot::DefaultBackground, value))
			.transpose()?;
		Ok(self)
	}

	fn resolve_default(&self, slot: ColorSlot, value: &str) -> Result<String, PaletteError> {
		if let Some(index) = value.parse::<ColorSlot>().ok().and_then(ColorSlot::index) {
			return Ok(self.colors[index].clone());
		}
		Self::validate(&self.name, slot, value)?;
		Ok(value.trim().to_string())
	}

	fn validate(palette: &str, slot: ColorSlot, value: &str) -> Result<(), PaletteError> {
		let value = value.trim();
		if value.is_empty() {
			return Err(PaletteError::EmptyColor {
				palette: String::from(palette),
				slot,
			});
		}

		let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '#' | '(' | ')' | ',' | '.' | '%' | '-' | ' ');
		if !value.chars().all(allowed) {
			return Err(PaletteError::InvalidColor {
				palette: String::from(palette),
				slot,
				value: String::from(value),
			});
		}

		Ok(())
	}

	fn builtin(name: &str, colors: [&str; 16]) -> Self {
		Self {
			name: String::from(name),
			colors: colors.map(String::from),
			default_foreground: None,
			default_background: None,
		}
	}

	pub fn xterm() -> Self {
		Self::builtin(
			"xterm",
			[
				"#000000", "#cd0000", "#00cd00", "#cdcd00", "#1e90ff", "#cd00cd", "#00cdcd", "#e5e5e5", "#4c4c4c", "#ff0000",
				"#00ff00", "#ffff00", "#4682b4", "#ff00ff", "#00ffff", "#ffffff",
			],
		)
	}

	pub fn vga() -> Self {
		Self::builtin(
			"vga",
			[
				"#000000", "#aa0000", "#00aa00", "#aa5500", "#0000aa", "#aa00aa", "#00aaaa", "#aaaaaa", "#555555", "#ff5555",
				"#55ff55", "#ffff55", "#5555ff", "#ff55ff", "#55ffff", "#ffffff",
			],
		)
	}

	/// Plain CSS color names, bright slots share the normal names
	pub fn css() -> Self {
		Self::builtin(
			"css",
			[
				"black", "red", "green", "yellow", "blue", "magenta", "cyan", "white", "black", "red", "green", "yellow", "blue",
				"magenta", "cyan", "white",
			],
		)
	}

	pub fn gnome_terminal() -> Self {
		Self::builtin(
			"gnome-terminal",
			[
				"#000000", "#cc0000", "#4e9a06", "#c4a000", "#3465a4", "#75507b", "#06989a", "#d3d7cf", "#555753", "#ef2929",
				"#8ae234", "#fce94f", "#729fcf", "#ad7fa8", "#34e2e2", "#eeeeec",
			],
		)
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	/// Concrete color for a slot, `None` when the palette leaves a default slot to the host
	pub fn color(&self, slot: ColorSlot) -> Option<&str> {
		match slot {
			ColorSlot::DefaultForeground => self.default_foreground.as_deref(),
			ColorSlot::DefaultBackground => self.default_background.as_deref(),
			slot => slot.index().map(|index| self.colors[index].as_str()),
		}
	}
}

impl Default for Palette {
	fn default() -> Self {
		Self::xterm()
	}
}

/// All palettes available to a run: the built-in presets plus user palettes.
///
/// Built once by the composing application and only read afterwards.
#[derive(Debug, Clone)]
pub struct PaletteRegistry {
	palettes: Vec<Arc<Palette>>,
}

impl PaletteRegistry {
	pub fn builtin() -> Self {
		Self {
			palettes: vec![
				Arc::new(Palette::xterm()),
				Arc::new(Palette::vga()),
				Arc::new(Palette::css()),
				Arc::new(Palette::gnome_terminal()),
			],
		}
	}

	/// Built-ins first, then `custom`; a later palette replaces an earlier one with the same name.
	pub fn with_custom(custom: impl IntoIterator<Item = Palette>) -> Self {
		let mut registry = Self::builtin();
		for palette in custom {
			registry.register(palette);
		}
		registry
	}

	fn register(&mut self, palette: Palette) {
		let palette = Arc::new(palette);
		match self.palettes.iter_mut().find(|existing| existing.name() == palette.name()) {
			Some(existing) => *existing = palette,
			None => self.palettes.push(palette),
		}
	}

	pub fn get(&self, name: &str) -> Option<&Arc<Palette>> {
		self.palettes.iter().find(|palette| palette.name() == name)
	}

	/// Look a palette up by name, falling back to the default palette for unknown names.
	pub fn resolve(&self, name: &str) -> Arc<Palette> {
		if let Some(palette) = self.get(name) {
			return Arc::clone(palette);
		}

		tracing::debug!(palette = name, fallback = Palette::DEFAULT_NAME, "unknown palette");
		self.default_palette()
	}

	pub fn default_palette(&self) -> Arc<Palette> {
		self.get(Palette::DEFAULT_NAME).cloned().unwrap_or_else(|| Arc::new(Palette::xterm()))
	}

	pub fn names(&self) -> impl Iterator<Item = &str> {
		self.palettes.iter().map(|palette| palette.name())
	}
}

impl Default for PaletteRegistry {
	fn default() -> Self {
		Self::builtin()
	}
}
