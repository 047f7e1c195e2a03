//! Where generated markup goes.
//!
//! The colorizer never writes tags to its sink itself, it hands every fragment to an [`Emitter`]. A plain HTML page
//! wants the tags inline, a host that stores markup next to the console text wants them encoded as annotations.

use std::io::{self, Write};

use base64::{Engine as _, engine::general_purpose::STANDARD};

use crate::escape::{POSTAMBLE, PREAMBLE};

#[derive(Debug, thiserror::Error)]
pub enum EmitError {
	#[error("Failed to write markup: {0}")]
	Io(#[from] io::Error),

	#[error("Markup rejected: {0}")]
	Rejected(String),
}

pub trait Emitter {
	/// Attach `fragment` at the current position of `out`
	///
	/// # Errors
	///
	/// Any error is logged by the caller and otherwise ignored.
	fn emit(&mut self, out: &mut dyn Write, fragment: &str) -> Result<(), EmitError>;
}

impl<F> Emitter for F
where
	F: FnMut(&mut dyn Write, &str) -> Result<(), EmitError>,
{
	fn emit(&mut self, out: &mut dyn Write, fragment: &str) -> Result<(), EmitError> {
		self(out, fragment)
	}
}

/// Writes markup straight into the output
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineEmitter;

impl Emitter for InlineEmitter {
	fn emit(&mut self, out: &mut dyn Write, fragment: &str) -> Result<(), EmitError> {
		out.write_all(fragment.as_bytes())?;
		Ok(())
	}
}

/// Wraps markup into an annotation: preamble, base64 of the fragment, postamble
#[derive(Debug, Default, Clone, Copy)]
pub struct NoteEmitter;

impl NoteEmitter {
	pub fn encode(fragment: &str) -> String {
		format!("{PREAMBLE}{}{POSTAMBLE}", STANDARD.encode(fragment))
	}

	/// Reverse of [`NoteEmitter::encode`], `None` for anything that isn't a note
	pub fn decode(note: &str) -> Option<String> {
		let payload = note.strip_prefix(PREAMBLE)?.strip_suffix(POSTAMBLE)?;
		let bytes = STANDARD.decode(payload).ok()?;
		String::from_utf8(bytes).ok()
	}
}

impl Emitter for NoteEmitter {
	fn emit(&mut self, out: &mut dyn Write, fragment: &str) -> Result<(), EmitError> {
		out.write_all(Self::encode(fragment).as_bytes())?;
		Ok(())
	}
}
