//! Button edge detection between consecutive input snapshots.

use input_proto::Buttons;

/// A press or release of a single button between two polls.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ButtonEdge {
    /// Single-bit mask of the button that changed.
    pub button: Buttons,
    pub pressed: bool,
}

/// Iterator over the edges between two button bitmaps, lowest bit first.
#[derive(Clone, Debug)]
pub struct Edges {
    changed: u16,
    current: u16,
}

impl Edges {
    #[must_use]
    pub fn between(previous: Buttons, current: Buttons) -> Self {
        Self {
            changed: (previous ^ current).raw(),
            current: current.raw(),
        }
    }
}

impl Iterator for Edges {
    type Item = ButtonEdge;

    fn next(&mut self) -> Option<ButtonEdge> {
        if self.changed == 0 {
            return None;
        }
        let bit = self.changed & self.changed.wrapping_neg();
        self.changed &= !bit;
        Some(ButtonEdge {
            button: Buttons(bit),
            pressed: self.current & bit != 0,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.changed.count_ones() as usize;
        (n, Some(n))
    }
}

impl ExactSizeIterator for Edges {}

/// Remembers the previous button bitmap so each edge is reported once.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EdgeDetector {
    previous: Buttons,
}

impl EdgeDetector {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            previous: Buttons::NONE,
        }
    }

    /// Button bitmap from the last call to [`EdgeDetector::update`].
    #[inline]
    #[must_use]
    pub const fn previous(&self) -> Buttons {
        self.previous
    }

    /// Compute the edges from the stored bitmap to `current` and store
    /// `current` for the next poll.
    pub fn update(&mut self, current: Buttons) -> Edges {
        let edges = Edges::between(self.previous, current);
        self.previous = current;
        edges
    }

    pub fn reset(&mut self) {
        self.previous = Buttons::NONE;
    }
}
