//! A line oriented [`Write`] adapter around [`Colorizer`].
//!
//! Bytes are collected until a newline, decoded and pushed through the colorizer. Open elements are closed in front of
//! the line ending and reopened on the next line, so every line on its own is well formed markup. This is the shape a console log filter takes: hand it the log's output
//! stream and write raw process output into it.

use std::{
	io::{self, Write},
	mem,
	sync::Arc,
};

use crate::{
	colorizer::Colorizer,
	emitter::{Emitter, InlineEmitter},
	palette::Palette,
};

#[derive(Debug)]
pub struct LineWriter<W: Write, E: Emitter = InlineEmitter> {
	colorizer: Option<Colorizer<W, E>>,
	line: Vec<u8>,
}

fn finished() -> io::Error {
	io::Error::other("line writer already finished")
}

/// Convert one line including its `\n` or `\r\n`, closing all elements in front of the line ending
fn convert_line<W: Write, E: Emitter>(colorizer: &mut Colorizer<W, E>, line: &[u8]) -> io::Result<()> {
	let (body, ending) = match line.strip_suffix(b"\r\n") {
		Some(body) => (body, "\r\n"),
		None => (line.strip_suffix(b"\n").unwrap_or(line), "\n"),
	};

	colorizer.push(&String::from_utf8_lossy(body))?;
	colorizer.end_line(ending)?;
	colorizer.get_mut().flush()
}

impl<W: Write> LineWriter<W, InlineEmitter> {
	pub fn new(out: W, palette: Arc<Palette>) -> Self {
		Self::from_colorizer(Colorizer::new(out, palette))
	}
}

impl<W: Write, E: Emitter> LineWriter<W, E> {
	pub fn from_colorizer(colorizer: Colorizer<W, E>) -> Self {
		Self {
			colorizer: Some(colorizer),
			line: Vec::with_capacity(256),
		}
	}

	/// Convert every complete line in the buffer.
	///
	/// On error the line that failed is dropped and the lines after it stay buffered.
	fn convert_lines(&mut self) -> io::Result<()> {
		let Some(last) = self.line.iter().rposition(|byte| *byte == b'\n') else {
			return Ok(());
		};

		let colorizer = self.colorizer.as_mut().ok_or_else(finished)?;
		let partial = self.line.split_off(last + 1);
		let complete = mem::replace(&mut self.line, partial);

		let mut converted = 0;
		for line in complete.split_inclusive(|byte| *byte == b'\n') {
			converted += line.len();
			if let Err(error) = convert_line(colorizer, line) {
				let mut unconverted = complete[converted..].to_vec();
				unconverted.append(&mut self.line);
				self.line = unconverted;
				return Err(error);
			}
		}

		Ok(())
	}

	/// End the current input: convert what is left, including an unterminated last line, close every element and
	/// forget the style so the next input starts plain.
	///
	/// # Errors
	///
	/// Returns the first error writing to the output.
	pub fn reset(&mut self) -> io::Result<()> {
		self.convert_lines()?;

		let line = mem::take(&mut self.line);
		let colorizer = self.colorizer.as_mut().ok_or_else(finished)?;
		if !line.is_empty() {
			colorizer.push(&String::from_utf8_lossy(&line))?;
		}
		colorizer.finish()
	}

	/// Convert the last, unterminated line, close everything and hand back the output.
	///
	/// # Errors
	///
	/// Returns the first error writing to the output.
	pub fn finish(mut self) -> io::Result<W> {
		self.reset()?;
		self.colorizer.take().map(Colorizer::into_inner).ok_or_else(finished)
	}

	pub fn get_ref(&self) -> Option<&W> {
		self.colorizer.as_ref().map(Colorizer::get_ref)
	}
}

impl<W: Write, E: Emitter> Write for LineWriter<W, E> {
	/// Buffers `buf` and converts every line it completes.
	///
	/// When writing a line fails, that line is lost but the lines after it stay buffered for the next call.
	fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
		if self.colorizer.is_none() {
			return Err(finished());
		}

		self.line.extend_from_slice(buf);
		self.convert_lines()?;
		Ok(buf.len())
	}

	/// Flushes the output; a partial line stays buffered until its newline arrives
	fn flush(&mut self) -> io::Result<()> {
		self.colorizer.as_mut().ok_or_else(finished)?.get_mut().flush()
	}
}

impl<W: Write, E: Emitter> Drop for LineWriter<W, E> {
	fn drop(&mut self) {
		if self.colorizer.is_some() {
			if let Err(error) = self.reset() {
				tracing::warn!(%error, "failed to close console output");
			}
		}
	}
}
