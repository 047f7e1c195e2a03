use std::mem;

use vte::{Parser, Perform};

use crate::escape::{POSTAMBLE, PREAMBLE};

const ESC: char = '\x1b';

/// Longest escape sequence we wait for before giving up and printing it as text
pub const MAX_SEQUENCE_LEN: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
	/// Plain text, not yet escaped
	Literal(String),
	/// Parameters of a Select Graphic Rendition sequence, `ESC[...m`
	Sgr(Vec<u16>),
	/// Raw annotation content including its preamble and postamble, to be passed through untouched
	Annotation(String),
}

/// Collects the parameters of a single SGR sequence
#[derive(Default)]
struct SgrParams {
	params: Option<Vec<u16>>,
}

impl Perform for SgrParams {
	fn csi_dispatch(&mut self, params: &vte::Params, intermediates: &[u8], _ignore: bool, code: char) {
		if code == 'm' && intermediates.is_empty() {
			self.params = Some(params.iter().flat_map(|subparams| subparams.iter().copied()).collect());
		}
	}
}

/// Splits console text into [`Token`]s.
///
/// Text can be fed in arbitrary chunks: an escape sequence or annotation that is cut off at the end of a chunk is
/// kept and completed by the next one.
#[derive(Debug, Default)]
pub struct Scanner {
	pending: String,
	in_annotation: bool,
	queued: Option<Token>,
}

impl Scanner {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn scan<'a>(&'a mut self, chunk: &'a str) -> Tokens<'a> {
		Tokens {
			scanner: self,
			rest: chunk,
		}
	}

	/// Flush whatever is still pending at the end of the stream
	pub fn finish(&mut self) -> Vec<Token> {
		let tokens = self.end_line();
		self.in_annotation = false;
		tokens
	}

	/// Stop waiting for the rest of a sequence cut off by a line ending.
	///
	/// No escape sequence spans a line ending, so whatever is pending is resolved now. An open annotation stays open.
	pub fn end_line(&mut self) -> Vec<Token> {
		let mut tokens = Vec::with_capacity(2);

		if self.in_annotation {
			let raw = mem::take(&mut self.pending);
			if !raw.is_empty() {
				tokens.push(Token::Annotation(raw));
			}
		} else if let Some(token) = self.settle() {
			tokens.push(token);
		}

		tokens.extend(self.queued.take());
		tokens
	}

	pub fn is_idle(&self) -> bool {
		self.pending.is_empty() && !self.in_annotation && self.queued.is_none()
	}

	/// Resolve a pending sequence that can't grow any further
	fn settle(&mut self) -> Option<Token> {
		let pending = mem::take(&mut self.pending);
		if pending.is_empty() {
			return None;
		}

		// a complete sequence followed by a partial preamble match, e.g. `ESC[8mh`
		let end = pending
			.char_indices()
			.skip(2)
			.find(|(_, c)| is_final(*c))
			.map(|(index, c)| index + c.len_utf8());

		match end {
			Some(end) if pending.starts_with("\x1b[") => {
				let leftover = &pending[end..];
				if !leftover.is_empty() {
					self.queued = Some(Token::Literal(String::from(leftover)));
				}
				Self::finalize(&pending[..end]).or_else(|| self.queued.take())
			},
			_ => Some(Token::Literal(pending)),
		}
	}

	/// Turn a complete control sequence into a token, `None` if it carries no style
	fn finalize(sequence: &str) -> Option<Token> {
		let body = &sequence[2..sequence.len() - 1];
		if sequence.ends_with('m') && body.chars().all(|c| c.is_ascii_digit() || c == ';' || c == ':') {
			let mut performer = SgrParams::default();
			let mut parser = Parser::new();
			parser.advance(&mut performer, sequence.as_bytes());

			if let Some(params) = performer.params {
				return Some(Token::Sgr(params));
			}
		}

		tracing::debug!(sequence = %sequence.escape_debug(), "dropping control sequence");
		None
	}
}

pub struct Tokens<'a> {
	scanner: &'a mut Scanner,
	rest: &'a str,
}

enum Step {
	NeedMore,
	Token(Token),
	Dropped,
}

impl Tokens<'_> {
	fn advance(&mut self, bytes: usize) {
		self.rest = &self.rest[bytes..];
	}

	fn escape(&mut self) -> Step {
		while let Some(c) = self.rest.chars().next() {
			let mut candidate = self.scanner.pending.clone();
			candidate.push(c);
			if PREAMBLE.starts_with(&candidate) {
				self.scanner.pending = candidate;
				self.advance(c.len_utf8());
				if self.scanner.pending == PREAMBLE {
					self.scanner.in_annotation = true;
					return Step::Token(Token::Annotation(mem::take(&mut self.scanner.pending)));
				}
				continue;
			}

			if !Self::grows(&self.scanner.pending, c) {
				return match self.scanner.settle() {
					Some(token) => Step::Token(token),
					None => Step::Dropped,
				};
			}

			self.scanner.pending.push(c);
			self.advance(c.len_utf8());

			if is_final(c) && self.scanner.pending.len() > 2 {
				let sequence = mem::take(&mut self.scanner.pending);
				return match Scanner::finalize(&sequence) {
					Some(token) => Step::Token(token),
					None => Step::Dropped,
				};
			}
		}

		Step::NeedMore
	}

	/// Whether `c` continues the CSI sequence collected so far
	fn grows(pending: &str, c: char) -> bool {
		if pending.len() >= MAX_SEQUENCE_LEN {
			return false;
		}

		if pending.len() == 1 {
			return c == '[';
		}

		// already complete, only kept around for a possible preamble
		if pending.len() > 2 && pending.chars().last().is_some_and(is_final) {
			return false;
		}

		let has_intermediate = pending[2..].chars().any(is_intermediate);
		is_intermediate(c) || is_final(c) || (is_parameter(c) && !has_intermediate)
	}

	fn annotation(&mut self) -> Option<Token> {
		if self.rest.is_empty() {
			return None;
		}

		let carried = self.scanner.pending.len();
		let mut raw = mem::take(&mut self.scanner.pending);
		raw.push_str(self.rest);

		if let Some(start) = raw.find(POSTAMBLE) {
			let end = start + POSTAMBLE.len();
			self.advance(end - carried);
			raw.truncate(end);
			self.scanner.in_annotation = false;
			return Some(Token::Annotation(raw));
		}

		// hold back a possible partial postamble
		let keep = (1..POSTAMBLE.len())
			.rev()
			.find(|len| raw.ends_with(&POSTAMBLE[..*len]))
			.unwrap_or(0);
		self.scanner.pending = raw.split_off(raw.len() - keep);
		self.rest = "";

		if raw.is_empty() { None } else { Some(Token::Annotation(raw)) }
	}
}

impl Iterator for Tokens<'_> {
	type Item = Token;

	fn next(&mut self) -> Option<Token> {
		loop {
			if let Some(token) = self.scanner.queued.take() {
				return Some(token);
			}

			if self.scanner.in_annotation {
				return self.annotation();
			}

			if !self.scanner.pending.is_empty() {
				match self.escape() {
					Step::NeedMore => return None,
					Step::Token(token) => return Some(token),
					Step::Dropped => continue,
				}
			}

			match self.rest.find(ESC) {
				Some(0) => {
					self.scanner.pending.push(ESC);
					self.advance(ESC.len_utf8());
				},
				Some(index) => {
					let text = String::from(&self.rest[..index]);
					self.advance(index);
					return Some(Token::Literal(text));
				},
				None if self.rest.is_empty() => return None,
				None => {
					let text = String::from(self.rest);
					self.rest = "";
					return Some(Token::Literal(text));
				},
			}
		}
	}
}

fn is_parameter(c: char) -> bool {
	('\x30'..='\x3f').contains(&c)
}

fn is_intermediate(c: char) -> bool {
	('\x20'..='\x2f').contains(&c)
}

fn is_final(c: char) -> bool {
	('\x40'..='\x7e').contains(&c)
}

/// Tokenize a complete input in one go
pub fn tokenize(input: &str) -> Vec<Token> {
	let mut scanner = Scanner::new();
	let mut tokens = scanner.scan(input).collect::<Vec<Token>>();
	tokens.extend(scanner.finish());
	tokens
}
