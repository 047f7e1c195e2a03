//! Turn ANSI colored console output into well-formed HTML.
//!
//! ```
//! use ansimark::{Palette, colorize};
//!
//! assert_eq!(colorize("\x1b[1mhello", Palette::css()), "<b>hello</b>");
//! assert_eq!(
//! 	colorize("\x1b[47;32mhi", Palette::css()),
//! 	"<span style=\"background-color: white;\"><span style=\"color: green;\">hi</span></span>"
//! );
//! ```
//!
//! For streams use a [`Colorizer`] or, when the output is line oriented, a [`LineWriter`].

pub mod colorizer;
pub mod config;
pub mod emitter;
pub mod escape;
pub mod palette;
pub mod parser;
pub mod render;
pub mod styles;
pub mod writer;

pub use crate::{
	colorizer::{Colorizer, colorize},
	config::{Config, ConfigError},
	emitter::{EmitError, Emitter, InlineEmitter, NoteEmitter},
	palette::{ColorSlot, Palette, PaletteError, PaletteRegistry},
	styles::StyleState,
	writer::LineWriter,
};
