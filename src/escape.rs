//! HTML escaping for literal console text.
//!
//! Annotation markers delimit content that was already encoded by the host. The scanner hands that content through
//! untouched, so it never reaches [`escape_html`].

use std::borrow::Cow;

/// Starts an opaque, already encoded annotation embedded in the console stream
pub const PREAMBLE: &str = "\x1b[8mha:";

/// Ends an annotation started with [`PREAMBLE`]
pub const POSTAMBLE: &str = "\x1b[0m";

fn entity(c: char) -> Option<&'static str> {
	match c {
		'"' => Some("&quot;"),
		'&' => Some("&amp;"),
		'<' => Some("&lt;"),
		'>' => Some("&gt;"),
		_ => None,
	}
}

pub fn escape_html(text: &str) -> Cow<'_, str> {
	let Some(first) = text.find(|c: char| entity(c).is_some()) else {
		return Cow::Borrowed(text);
	};

	let mut escaped = String::with_capacity(text.len() + 16);
	escaped.push_str(&text[..first]);
	for c in text[first..].chars() {
		match entity(c) {
			Some(entity) => escaped.push_str(entity),
			None => escaped.push(c),
		}
	}

	Cow::Owned(escaped)
}
