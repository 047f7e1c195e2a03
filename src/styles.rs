use crate::palette::ColorSlot;

/// One styling attribute that can be switched on, and the markup element representing it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Element {
	Bold,
	Foreground(ColorSlot),
	Background(ColorSlot),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attribute {
	Bold,
	Foreground,
	Background,
}

impl Element {
	pub fn attribute(self) -> Attribute {
		match self {
			Element::Bold => Attribute::Bold,
			Element::Foreground(_) => Attribute::Foreground,
			Element::Background(_) => Attribute::Background,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
	Off(Element),
	On(Element),
}

/// The attributes active at a point in the stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StyleState {
	pub bold: bool,
	pub foreground: Option<ColorSlot>,
	pub background: Option<ColorSlot>,
}

impl StyleState {
	pub fn is_empty(&self) -> bool {
		*self == Self::default()
	}

	fn element(&self, attribute: Attribute) -> Option<Element> {
		match attribute {
			Attribute::Bold => self.bold.then_some(Element::Bold),
			Attribute::Foreground => self.foreground.map(Element::Foreground),
			Attribute::Background => self.background.map(Element::Background),
		}
	}

	/// Apply the parameters of one SGR sequence, left to right.
	///
	/// Returns the resulting state and the changes that lead there: every turn-off first, then the turn-ons in the
	/// order their parameters appeared. An attribute that ends up where it started produces no change.
	///
	/// The changes are the net difference between the two states, not a replay of every parameter. A reset followed by
	/// codes restoring attributes that were already active, like `0;1;31` on bold red text, leaves those elements open
	/// and in their existing nesting order.
	pub fn apply(&self, params: &[u16]) -> (StyleState, Vec<Change>) {
		let mut result = *self;
		// position of the parameter that last touched bold, foreground, background
		let mut touched = [0usize; 3];

		for (position, param) in params.iter().enumerate() {
			match *param {
				// Reset all
				0 => {
					result = Self::default();
					touched = [position; 3];
				},

				1 => {
					result.bold = true;
					touched[0] = position;
				},
				22 => {
					result.bold = false;
					touched[0] = position;
				},

				// Foreground colors
				n @ 30..=37 => {
					result.foreground = ColorSlot::normal(n - 30);
					touched[1] = position;
				},
				n @ 90..=97 => {
					result.foreground = ColorSlot::bright(n - 90);
					touched[1] = position;
				},
				39 => {
					result.foreground = None;
					touched[1] = position;
				},

				// Background colors
				n @ 40..=47 => {
					result.background = ColorSlot::normal(n - 40);
					touched[2] = position;
				},
				n @ 100..=107 => {
					result.background = ColorSlot::bright(n - 100);
					touched[2] = position;
				},
				49 => {
					result.background = None;
					touched[2] = position;
				},

				_ => {}, // Unknown SGR code, ignore
			}
		}

		let mut offs = Vec::new();
		let mut ons = Vec::new();
		for (attribute, position) in [Attribute::Bold, Attribute::Foreground, Attribute::Background].into_iter().zip(touched) {
			let before = self.element(attribute);
			let after = result.element(attribute);
			if before == after {
				continue;
			}

			if let Some(element) = before {
				offs.push(Change::Off(element));
			}
			if let Some(element) = after {
				ons.push((position, Change::On(element)));
			}
		}

		ons.sort_by_key(|(position, _)| *position);
		offs.extend(ons.into_iter().map(|(_, change)| change));

		(result, offs)
	}
}
