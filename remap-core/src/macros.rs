//! Macro definitions and the macro table.

use heapless::Vec;

/// Maximum number of macros in a [`MacroTable`].
pub const MAX_MACROS: usize = 16;

/// Maximum number of steps in one [`Macro`].
pub const MAX_MACRO_STEPS: usize = 128;

/// One macro step. Every kind except [`MacroStep::Delay`] completes in the
/// tick that dispatches it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MacroStep {
    KeyPress(u8),
    KeyRelease,
    MouseMove { dx: i8, dy: i8 },
    MouseButtonPress(u8),
    MouseButtonRelease,
    /// Hold this step until the given number of milliseconds has elapsed.
    Delay(u16),
    /// Unsupported action code from a stored macro. Skipped when executed.
    Unknown(u8),
}

impl MacroStep {
    pub const ACTION_KEY_PRESS: u8 = 0;
    pub const ACTION_KEY_RELEASE: u8 = 1;
    pub const ACTION_MOUSE_MOVE: u8 = 2;
    pub const ACTION_MOUSE_BUTTON_PRESS: u8 = 3;
    pub const ACTION_MOUSE_BUTTON_RELEASE: u8 = 4;
    pub const ACTION_DELAY: u8 = 5;

    /// Decode a stored `(action, param1, param2, param3)` step.
    ///
    /// `param1` is the key code, button mask or delay; `param2`/`param3` are
    /// the mouse deltas, truncated to the report's 8-bit range.
    #[must_use]
    pub const fn from_raw(action: u8, param1: u16, param2: i16, param3: i16) -> Self {
        match action {
            Self::ACTION_KEY_PRESS => Self::KeyPress(param1 as u8),
            Self::ACTION_KEY_RELEASE => Self::KeyRelease,
            Self::ACTION_MOUSE_MOVE => Self::MouseMove {
                dx: param2 as i8,
                dy: param3 as i8,
            },
            Self::ACTION_MOUSE_BUTTON_PRESS => Self::MouseButtonPress(param1 as u8),
            Self::ACTION_MOUSE_BUTTON_RELEASE => Self::MouseButtonRelease,
            Self::ACTION_DELAY => Self::Delay(param1),
            other => Self::Unknown(other),
        }
    }
}

/// A named, finite sequence of steps.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Macro {
    id: u8,
    steps: Vec<MacroStep, MAX_MACRO_STEPS>,
}

impl Macro {
    /// Build a macro from a step list.
    ///
    /// Returns `None` if `steps` is longer than [`MAX_MACRO_STEPS`].
    #[must_use]
    pub fn new(id: u8, steps: &[MacroStep]) -> Option<Self> {
        Some(Self {
            id,
            steps: Vec::from_slice(steps).ok()?,
        })
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> u8 {
        self.id
    }

    #[inline]
    #[must_use]
    pub fn steps(&self) -> &[MacroStep] {
        &self.steps
    }

    #[inline]
    #[must_use]
    pub fn step(&self, index: usize) -> Option<&MacroStep> {
        self.steps.get(index)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Error type for macro operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MacroError {
    /// No macro with this id.
    NotFound(u8),
    /// A macro is already running; the request for this id was dropped.
    AlreadyRunning(u8),
    /// The macro table is at capacity.
    TableFull,
}

impl core::fmt::Display for MacroError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "macro {id} not found"),
            Self::AlreadyRunning(id) => write!(f, "another macro is running, dropped macro {id}"),
            Self::TableFull => write!(f, "macro table full ({MAX_MACROS} entries)"),
        }
    }
}

/// Fixed-capacity macro storage keyed by id.
#[derive(Clone, Debug, Default)]
pub struct MacroTable {
    macros: Vec<Macro, MAX_MACROS>,
}

impl MacroTable {
    #[must_use]
    pub const fn new() -> Self {
        Self { macros: Vec::new() }
    }

    /// Add a macro, replacing any macro with the same id.
    ///
    /// # Errors
    ///
    /// Returns [`MacroError::TableFull`] when the id is new and the table is full.
    pub fn add(&mut self, mac: Macro) -> Result<(), MacroError> {
        if let Some(existing) = self.macros.iter_mut().find(|m| m.id == mac.id) {
            debug!("Updated macro {}", mac.id);
            *existing = mac;
            return Ok(());
        }

        let (id, steps) = (mac.id, mac.len());
        self.macros.push(mac).map_err(|_| {
            warn!("Macro table full, rejected macro {}", id);
            MacroError::TableFull
        })?;
        debug!("Added macro {} with {} steps", id, steps);
        Ok(())
    }

    /// Remove the macro with `id`, keeping the order of the rest.
    ///
    /// # Errors
    ///
    /// Returns [`MacroError::NotFound`] if no macro has this id.
    pub fn remove(&mut self, id: u8) -> Result<(), MacroError> {
        match self.macros.iter().position(|m| m.id == id) {
            Some(index) => {
                self.macros.remove(index);
                debug!("Removed macro {}", id);
                Ok(())
            }
            None => {
                warn!("Macro {} not found", id);
                Err(MacroError::NotFound(id))
            }
        }
    }

    #[must_use]
    pub fn get(&self, id: u8) -> Option<&Macro> {
        self.macros.iter().find(|m| m.id == id)
    }

    pub fn clear(&mut self) {
        self.macros.clear();
        info!("Cleared all macros");
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.macros.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.macros.is_empty()
    }
}
