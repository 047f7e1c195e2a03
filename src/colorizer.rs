use std::{
	io::{self, Write},
	sync::Arc,
};

use crate::{
	emitter::{Emitter, InlineEmitter},
	escape::escape_html,
	palette::Palette,
	parser::{Scanner, Token},
	render::Renderer,
	styles::{Element, StyleState},
};

/// Streams console text into `out`, replacing SGR sequences with markup handed to an [`Emitter`].
///
/// One colorizer serves exactly one output. Text is written as soon as it is pushed; only an escape sequence cut off
/// at the end of a chunk is held back until the next chunk completes it.
#[derive(Debug)]
pub struct Colorizer<W: Write, E: Emitter = InlineEmitter> {
	scanner: Scanner,
	styler: Styler<W, E>,
}

#[derive(Debug)]
struct Styler<W, E> {
	out: W,
	emitter: E,
	state: StyleState,
	renderer: Renderer,
	markup: String,
}

impl<W: Write> Colorizer<W, InlineEmitter> {
	pub fn new(out: W, palette: Arc<Palette>) -> Self {
		Self::with_emitter(out, palette, InlineEmitter)
	}
}

impl<W: Write, E: Emitter> Colorizer<W, E> {
	pub fn with_emitter(out: W, palette: Arc<Palette>, emitter: E) -> Self {
		Self {
			scanner: Scanner::new(),
			styler: Styler {
				out,
				emitter,
				state: StyleState::default(),
				renderer: Renderer::new(palette),
				markup: String::new(),
			},
		}
	}

	/// Process the next chunk of the stream.
	///
	/// # Errors
	///
	/// Returns the first error writing to the output. The style state stays intact so later chunks can still be
	/// pushed.
	pub fn push(&mut self, text: &str) -> io::Result<()> {
		for token in self.scanner.scan(text) {
			self.styler.handle(token)?;
		}
		Ok(())
	}

	/// Close all open elements so the output written so far is well formed.
	///
	/// The style stays active: the elements are opened again in front of the next text.
	pub fn boundary(&mut self) {
		let styler = &mut self.styler;
		styler.markup.clear();
		styler.renderer.suspend(&mut styler.markup);
		styler.emit();
	}

	/// Finish the current line: resolve anything held back, close all open elements, then write `ending` after them.
	///
	/// # Errors
	///
	/// Returns the first error writing to the output.
	pub fn end_line(&mut self, ending: &str) -> io::Result<()> {
		for token in self.scanner.end_line() {
			self.styler.handle(token)?;
		}
		self.boundary();
		self.styler.out.write_all(ending.as_bytes())
	}

	/// End of stream: flush anything pending, close every element and flush the output.
	///
	/// # Errors
	///
	/// Returns the first error writing to or flushing the output.
	pub fn finish(&mut self) -> io::Result<()> {
		for token in self.scanner.finish() {
			self.styler.handle(token)?;
		}

		let styler = &mut self.styler;
		styler.markup.clear();
		styler.renderer.finish(&mut styler.markup);
		styler.emit();
		styler.state = StyleState::default();
		styler.out.flush()
	}

	pub fn state(&self) -> StyleState {
		self.styler.state
	}

	pub fn open_elements(&self) -> &[Element] {
		self.styler.renderer.open_elements()
	}

	pub fn palette(&self) -> &Palette {
		self.styler.renderer.palette()
	}

	pub fn get_ref(&self) -> &W {
		&self.styler.out
	}

	pub fn get_mut(&mut self) -> &mut W {
		&mut self.styler.out
	}

	pub fn into_inner(self) -> W {
		self.styler.out
	}
}

impl<W: Write, E: Emitter> Styler<W, E> {
	fn handle(&mut self, token: Token) -> io::Result<()> {
		match token {
			Token::Literal(text) => {
				if text.is_empty() {
					return Ok(());
				}

				self.markup.clear();
				self.renderer.resume(&mut self.markup);
				self.emit();
				self.out.write_all(escape_html(&text).as_bytes())
			},
			Token::Sgr(params) => {
				let (state, changes) = self.state.apply(&params);
				self.state = state;

				self.markup.clear();
				self.renderer.apply(&changes, &mut self.markup);
				self.emit();
				Ok(())
			},
			Token::Annotation(raw) => self.out.write_all(raw.as_bytes()),
		}
	}

	fn emit(&mut self) {
		if self.markup.is_empty() {
			return;
		}

		if let Err(error) = self.emitter.emit(&mut self.out, &self.markup) {
			tracing::warn!(%error, markup = %self.markup, "failed to add markup");
		}
	}
}

/// Convert a complete input in one go
pub fn colorize(input: &str, palette: impl Into<Arc<Palette>>) -> String {
	let mut colorizer = Colorizer::new(Vec::new(), palette.into());
	if let Err(error) = colorizer.push(input).and_then(|()| colorizer.finish()) {
		tracing::warn!(%error, "failed to colorize");
	}
	String::from_utf8_lossy(&colorizer.into_inner()).into_owned()
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::{
		emitter::{EmitError, NoteEmitter},
		escape::{POSTAMBLE, PREAMBLE},
		palette::ColorSlot,
	};

	fn css(input: &str) -> String {
		colorize(input, Palette::css())
	}

	#[test]
	fn no_markup_test() {
		assert_eq!(css("line"), "line");
		assert_eq!(css(""), "");
		assert_eq!(css("two\nlines\n"), "two\nlines\n");
	}

	#[test]
	fn clear_test() {
		assert_eq!(css("\x1B[0m"), "");
		assert_eq!(css("\x1B[0m\x1B[K"), "");
		assert_eq!(css("\x1B[0mhello world"), "hello world");
	}

	#[test]
	fn bold_test() {
		assert_eq!(css("\x1B[1mhello world"), "<b>hello world</b>");
		assert_eq!(css("\x1B[1mhello\x1B[22m world"), "<b>hello</b> world");
	}

	#[test]
	fn green_test() {
		assert_eq!(css("\x1B[32mhello world"), "<span style=\"color: green;\">hello world</span>");
		assert_eq!(
			colorize("\x1B[32mhello world", Palette::xterm()),
			"<span style=\"color: #00cd00;\">hello world</span>"
		);
	}

	#[test]
	fn green_on_white_test() {
		assert_eq!(
			css("\x1B[47;32mhello world"),
			"<span style=\"background-color: white;\"><span style=\"color: green;\">hello world</span></span>"
		);

		let xterm = Palette::xterm();
		assert_eq!(
			colorize("\x1B[47;32mhello world", xterm.clone()),
			format!(
				"<span style=\"background-color: {};\"><span style=\"color: {};\">hello world</span></span>",
				xterm.color(ColorSlot::White).unwrap(),
				xterm.color(ColorSlot::Green).unwrap(),
			)
		);
	}

	#[test]
	fn palettes_only_change_values_test() {
		let input = "\x1B[1;31mfail\x1B[0m: \x1B[44;93mwarn\x1B[39m ok";
		let strip = |html: String| html.replace(|c: char| c == '#' || c.is_ascii_alphanumeric(), "");

		let css = strip(colorize(input, Palette::css()));
		for palette in [Palette::xterm(), Palette::vga(), Palette::gnome_terminal()] {
			assert_eq!(strip(colorize(input, palette)), css);
		}
	}

	#[test]
	fn annotation_passthrough_test() {
		let note = format!("{PREAMBLE}hello world{POSTAMBLE}");
		assert_eq!(css(&note), note);

		let tricky = format!("{PREAMBLE}<&\">{POSTAMBLE}");
		assert_eq!(css(&format!("\x1B[1ma{tricky}b")), format!("<b>a{tricky}b</b>"));
	}

	#[test]
	fn escape_html_test() {
		assert_eq!(css("\""), "&quot;");
		assert_eq!(css("&"), "&amp;");
		assert_eq!(css("<"), "&lt;");
		assert_eq!(css(">"), "&gt;");
		assert_eq!(css("&lt;"), "&amp;lt;");
	}

	#[test]
	fn utf8_test() {
		assert_eq!(
			css("\x1B[1m\u{3053}\u{3093}\u{306b}\u{3061}\u{306f}"),
			"<b>\u{3053}\u{3093}\u{306b}\u{3061}\u{306f}</b>"
		);
		assert_eq!(css("🎨\x1B[31müß\x1B[0m🔴"), "🎨<span style=\"color: red;\">üß</span>🔴");
	}

	#[test]
	fn malformed_sequences_stay_visible_test() {
		assert_eq!(css("\x1B[31\nred?"), "\x1B[31\nred?");
		assert_eq!(css("50%\x1B[3"), "50%\x1B[3");
	}

	#[test]
	fn mid_style_end_is_closed_test() {
		assert_eq!(
			css("\x1B[1;32mok \x1B[41mbad"),
			"<b><span style=\"color: green;\">ok <span style=\"background-color: red;\">bad</span></span></b>"
		);
	}

	#[test]
	fn turn_off_inside_nesting_test() {
		assert_eq!(
			css("\x1B[1m\x1B[32mA\x1B[22mB\x1B[0mC"),
			"<b><span style=\"color: green;\">A</span></b><span style=\"color: green;\">B</span>C"
		);
	}

	#[test]
	fn toggle_without_text_test() {
		assert_eq!(css("a\x1B[1m\x1B[22mb"), "ab");
		assert_eq!(
			css("\x1B[31ma\x1B[1m\x1B[0;31mb"),
			"<span style=\"color: red;\">ab</span>"
		);
		assert_eq!(css("a\x1B[44m\x1B[0m"), "a");
	}

	#[test]
	fn chunked_push_test() {
		let mut colorizer = Colorizer::new(Vec::new(), Arc::new(Palette::css()));
		for chunk in ["he\x1B", "[3", "2mll", "o\x1B[", "0m!"] {
			colorizer.push(chunk).unwrap();
		}
		colorizer.finish().unwrap();

		assert_eq!(
			String::from_utf8(colorizer.into_inner()).unwrap(),
			"he<span style=\"color: green;\">llo</span>!"
		);
	}

	#[test]
	fn boundary_carries_style_test() {
		let mut colorizer = Colorizer::new(Vec::new(), Arc::new(Palette::css()));
		colorizer.push("\x1B[1mone\n").unwrap();
		colorizer.boundary();
		assert!(colorizer.open_elements().is_empty());
		assert!(colorizer.state().bold);

		colorizer.push("two\x1B[0m\n").unwrap();
		colorizer.boundary();
		colorizer.push("three\n").unwrap();
		colorizer.finish().unwrap();

		assert_eq!(
			String::from_utf8(colorizer.into_inner()).unwrap(),
			"<b>one\n</b><b>two</b>\nthree\n"
		);
	}

	#[test]
	fn end_line_closes_before_ending_test() {
		let mut colorizer = Colorizer::new(Vec::new(), Arc::new(Palette::css()));
		colorizer.push("\x1B[1mone").unwrap();
		colorizer.end_line("\n").unwrap();
		colorizer.push("two\x1B[3").unwrap();
		colorizer.end_line("\r\n").unwrap();
		colorizer.finish().unwrap();

		assert_eq!(
			String::from_utf8(colorizer.into_inner()).unwrap(),
			"<b>one</b>\n<b>two\x1B[3</b>\r\n"
		);
	}

	#[test]
	fn finish_resets_state_test() {
		let mut colorizer = Colorizer::new(Vec::new(), Arc::new(Palette::css()));
		colorizer.push("\x1B[45mx").unwrap();
		assert_eq!(colorizer.open_elements(), &[Element::Background(ColorSlot::Magenta)]);

		colorizer.finish().unwrap();
		assert!(colorizer.open_elements().is_empty());
		assert!(colorizer.state().is_empty());
	}

	#[test]
	fn note_emitter_test() {
		let mut colorizer = Colorizer::with_emitter(Vec::new(), Arc::new(Palette::css()), NoteEmitter);
		colorizer.push("\x1B[1mhi").unwrap();
		colorizer.finish().unwrap();

		let output = String::from_utf8(colorizer.into_inner()).unwrap();
		assert_eq!(output, format!("{}hi{}", NoteEmitter::encode("<b>"), NoteEmitter::encode("</b>")));

		// notes written by one pass are left alone by the next
		assert_eq!(css(&output), output);
	}

	#[test]
	fn failing_emitter_is_not_fatal_test() {
		let emitter = |_: &mut dyn Write, _: &str| -> Result<(), EmitError> { Err(EmitError::Rejected(String::from("nope"))) };
		let mut colorizer = Colorizer::with_emitter(Vec::new(), Arc::new(Palette::css()), emitter);
		colorizer.push("\x1B[1mstill <here>").unwrap();
		colorizer.finish().unwrap();

		assert_eq!(String::from_utf8(colorizer.into_inner()).unwrap(), "still &lt;here&gt;");
	}

	#[test]
	fn failing_sink_keeps_state_test() {
		struct Broken;

		impl Write for Broken {
			fn write(&mut self, _: &[u8]) -> io::Result<usize> {
				Err(io::Error::other("disk full"))
			}

			fn flush(&mut self) -> io::Result<()> {
				Ok(())
			}
		}

		let mut colorizer = Colorizer::new(Broken, Arc::new(Palette::css()));
		assert!(colorizer.push("\x1B[32mtext").is_err());
		assert_eq!(colorizer.state().foreground, Some(ColorSlot::Green));
		assert!(colorizer.push("\x1B[0m").is_ok());
		assert!(colorizer.state().is_empty());
	}
}
