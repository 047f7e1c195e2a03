use std::sync::Arc;

use crate::{
	palette::{ColorSlot, Palette},
	styles::{Change, Element},
};

/// Keeps the stack of active markup elements and turns style changes into correctly nested tags.
///
/// The stack is in opening order, innermost element last. Only its bottom `opened` elements have been written out;
/// the rest are pending and get opened by [`Renderer::resume`] right before the next text. An element that is turned
/// on and off again without text in between therefore never shows up in the output.
#[derive(Debug)]
pub struct Renderer {
	palette: Arc<Palette>,
	stack: Vec<Element>,
	opened: usize,
	base_opened: bool,
}

impl Renderer {
	pub fn new(palette: Arc<Palette>) -> Self {
		Self {
			palette,
			stack: Vec::new(),
			opened: 0,
			base_opened: false,
		}
	}

	pub fn palette(&self) -> &Palette {
		&self.palette
	}

	/// All active elements, written out or not
	pub fn stack(&self) -> &[Element] {
		&self.stack
	}

	/// The elements currently open in the output
	pub fn open_elements(&self) -> &[Element] {
		&self.stack[..self.opened]
	}

	pub fn open_tag(&self, element: Element) -> Option<String> {
		match element {
			Element::Bold => Some(String::from("<b>")),
			Element::Foreground(slot) => self.palette.color(slot).map(|color| format!("<span style=\"color: {color};\">")),
			Element::Background(slot) => self
				.palette
				.color(slot)
				.map(|color| format!("<span style=\"background-color: {color};\">")),
		}
	}

	pub fn close_tag(&self, element: Element) -> Option<&'static str> {
		match element {
			Element::Bold => Some("</b>"),
			Element::Foreground(slot) | Element::Background(slot) => self.palette.color(slot).map(|_| "</span>"),
		}
	}

	/// Wrapper carrying the palette's default colors, `None` when the palette leaves them to the host
	fn base_tag(&self) -> Option<String> {
		let foreground = self.palette.color(ColorSlot::DefaultForeground);
		let background = self.palette.color(ColorSlot::DefaultBackground);
		if foreground.is_none() && background.is_none() {
			return None;
		}

		let mut tag = String::from("<span style=\"");
		if let Some(color) = foreground {
			tag.push_str("color: ");
			tag.push_str(color);
			tag.push(';');
		}
		if let Some(color) = background {
			tag.push_str("background-color: ");
			tag.push_str(color);
			tag.push(';');
		}
		tag.push_str("\">");
		Some(tag)
	}

	fn open(&self, element: Element, markup: &mut String) {
		if let Some(tag) = self.open_tag(element) {
			markup.push_str(&tag);
		}
	}

	fn close(&self, element: Element, markup: &mut String) {
		if let Some(tag) = self.close_tag(element) {
			markup.push_str(tag);
		}
	}

	/// Apply a batch of changes, writing the closing tags needed to `markup`.
	///
	/// Turn-offs are handled innermost first and before any turn-on. Turned on elements stay pending until the next
	/// [`Renderer::resume`].
	pub fn apply(&mut self, changes: &[Change], markup: &mut String) {
		let mut offs = changes
			.iter()
			.filter_map(|change| match change {
				Change::Off(element) => self.position(*element),
				Change::On(_) => None,
			})
			.collect::<Vec<usize>>();
		offs.sort_unstable_by(|a, b| b.cmp(a));
		offs.dedup();

		for position in offs {
			self.turn_off(position, markup);
		}

		for change in changes {
			if let Change::On(element) = change {
				if let Some(position) = self.position(*element) {
					self.turn_off(position, markup);
				}
				self.stack.push(*element);
			}
		}
	}

	fn position(&self, element: Element) -> Option<usize> {
		self.stack.iter().position(|open| open.attribute() == element.attribute())
	}

	/// Remove the element at `position`, closing whatever is open from there up.
	///
	/// The elements above it stay on the stack as pending.
	fn turn_off(&mut self, position: usize, markup: &mut String) {
		for element in self.stack[position..self.opened.max(position)].iter().rev() {
			self.close(*element, markup);
		}
		self.opened = self.opened.min(position);
		self.stack.remove(position);
	}

	/// Open the base wrapper and every pending element, outermost first
	pub fn resume(&mut self, markup: &mut String) {
		if !self.base_opened {
			self.base_opened = true;
			if let Some(tag) = self.base_tag() {
				markup.push_str(&tag);
			}
		}

		for element in &self.stack[self.opened..] {
			self.open(*element, markup);
		}
		self.opened = self.stack.len();
	}

	/// Close every open element, innermost first, keeping the stack to resume later
	pub fn suspend(&mut self, markup: &mut String) {
		for element in self.stack[..self.opened].iter().rev() {
			self.close(*element, markup);
		}
		self.opened = 0;

		if self.base_opened {
			self.base_opened = false;
			if self.base_tag().is_some() {
				markup.push_str("</span>");
			}
		}
	}

	/// Close everything and forget the stack
	pub fn finish(&mut self, markup: &mut String) {
		self.suspend(markup);
		self.stack.clear();
	}
}

#[cfg(test)]
mod test {
	use super::*;

	fn renderer(palette: Palette) -> Renderer {
		Renderer::new(Arc::new(palette))
	}

	/// Apply the changes and open everything, like a change followed by text does
	fn render(renderer: &mut Renderer, changes: &[Change]) -> String {
		let mut markup = String::new();
		renderer.apply(changes, &mut markup);
		renderer.resume(&mut markup);
		markup
	}

	#[test]
	fn tags_test() {
		let renderer = renderer(Palette::css());
		assert_eq!(renderer.open_tag(Element::Bold), Some(String::from("<b>")));
		assert_eq!(
			renderer.open_tag(Element::Foreground(ColorSlot::Green)),
			Some(String::from("<span style=\"color: green;\">"))
		);
		assert_eq!(
			renderer.open_tag(Element::Background(ColorSlot::White)),
			Some(String::from("<span style=\"background-color: white;\">"))
		);
		assert_eq!(renderer.close_tag(Element::Foreground(ColorSlot::Green)), Some("</span>"));
	}

	#[test]
	fn unresolved_slot_emits_nothing_test() {
		let mut renderer = renderer(Palette::css());
		let element = Element::Foreground(ColorSlot::DefaultForeground);
		assert_eq!(renderer.open_tag(element), None);
		assert_eq!(renderer.close_tag(element), None);

		assert_eq!(render(&mut renderer, &[Change::On(element), Change::On(Element::Bold)]), "<b>");
		assert_eq!(renderer.stack(), &[element, Element::Bold]);
		assert_eq!(render(&mut renderer, &[Change::Off(element)]), "</b><b>");
		assert_eq!(renderer.stack(), &[Element::Bold]);
	}

	#[test]
	fn turn_on_nests_innermost_test() {
		let mut renderer = renderer(Palette::css());
		assert_eq!(
			render(
				&mut renderer,
				&[Change::On(Element::Background(ColorSlot::White)), Change::On(Element::Foreground(ColorSlot::Green))]
			),
			"<span style=\"background-color: white;\"><span style=\"color: green;\">"
		);

		let mut markup = String::new();
		renderer.finish(&mut markup);
		assert_eq!(markup, "</span></span>");
		assert!(renderer.stack().is_empty());
	}

	#[test]
	fn turn_off_reopens_later_elements_test() {
		let mut renderer = renderer(Palette::css());
		render(
			&mut renderer,
			&[
				Change::On(Element::Bold),
				Change::On(Element::Foreground(ColorSlot::Red)),
				Change::On(Element::Background(ColorSlot::Blue)),
			],
		);

		let mut markup = String::new();
		renderer.apply(&[Change::Off(Element::Bold)], &mut markup);
		assert_eq!(markup, "</span></span></b>");
		assert!(renderer.open_elements().is_empty());
		assert_eq!(
			renderer.stack(),
			&[Element::Foreground(ColorSlot::Red), Element::Background(ColorSlot::Blue)]
		);

		markup.clear();
		renderer.resume(&mut markup);
		assert_eq!(markup, "<span style=\"color: red;\"><span style=\"background-color: blue;\">");

		// innermost needs no reopening
		assert_eq!(render(&mut renderer, &[Change::Off(Element::Background(ColorSlot::Blue))]), "</span>");
	}

	#[test]
	fn replace_color_test() {
		let mut renderer = renderer(Palette::css());
		render(
			&mut renderer,
			&[Change::On(Element::Foreground(ColorSlot::Red)), Change::On(Element::Bold)],
		);

		assert_eq!(
			render(
				&mut renderer,
				&[Change::Off(Element::Foreground(ColorSlot::Red)), Change::On(Element::Foreground(ColorSlot::Blue))]
			),
			"</b></span><b><span style=\"color: blue;\">"
		);
		assert_eq!(renderer.stack(), &[Element::Bold, Element::Foreground(ColorSlot::Blue)]);
	}

	#[test]
	fn reset_closes_innermost_first_test() {
		let mut renderer = renderer(Palette::css());
		render(
			&mut renderer,
			&[Change::On(Element::Foreground(ColorSlot::Red)), Change::On(Element::Bold)],
		);

		let mut markup = String::new();
		renderer.apply(&[Change::Off(Element::Bold), Change::Off(Element::Foreground(ColorSlot::Red))], &mut markup);
		assert_eq!(markup, "</b></span>");
		assert!(renderer.stack().is_empty());
	}

	#[test]
	fn pending_changes_are_silent_test() {
		let mut renderer = renderer(Palette::css());
		let mut markup = String::new();
		renderer.apply(&[Change::On(Element::Bold)], &mut markup);
		renderer.apply(&[Change::On(Element::Foreground(ColorSlot::Red))], &mut markup);
		renderer.apply(&[Change::Off(Element::Bold)], &mut markup);
		assert_eq!(markup, "");
		assert!(renderer.open_elements().is_empty());

		renderer.resume(&mut markup);
		assert_eq!(markup, "<span style=\"color: red;\">");

		markup.clear();
		renderer.suspend(&mut markup);
		assert_eq!(markup, "</span>");
		assert_eq!(renderer.stack(), &[Element::Foreground(ColorSlot::Red)]);

		markup.clear();
		renderer.resume(&mut markup);
		assert_eq!(markup, "<span style=\"color: red;\">");
	}

	#[test]
	fn toggle_without_text_leaves_no_trace_test() {
		let mut renderer = renderer(Palette::css());
		render(&mut renderer, &[Change::On(Element::Foreground(ColorSlot::Red))]);

		let mut markup = String::new();
		renderer.apply(&[Change::On(Element::Bold)], &mut markup);
		renderer.apply(&[Change::Off(Element::Bold)], &mut markup);
		renderer.resume(&mut markup);
		assert_eq!(markup, "");
		assert_eq!(renderer.open_elements(), &[Element::Foreground(ColorSlot::Red)]);
	}

	#[test]
	fn default_colors_wrap_everything_test() {
		let palette = Palette::css().with_defaults(Some("#ccc"), Some("black")).unwrap();
		let mut renderer = renderer(palette);
		let mut markup = String::new();

		renderer.apply(&[Change::On(Element::Bold)], &mut markup);
		renderer.resume(&mut markup);
		renderer.apply(&[Change::Off(Element::Bold)], &mut markup);
		renderer.resume(&mut markup);
		renderer.finish(&mut markup);
		assert_eq!(markup, "<span style=\"color: #ccc;background-color: black;\"><b></b></span>");

		// nothing to close when nothing was opened
		markup.clear();
		renderer.finish(&mut markup);
		assert_eq!(markup, "");
	}
}
