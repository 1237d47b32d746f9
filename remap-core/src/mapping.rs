//! Button mappings, the mapping table and the configuration collaborator.

use heapless::Vec;
use input_proto::Buttons;

/// Maximum number of mappings in a [`MappingTable`].
pub const MAX_MAPPINGS: usize = 32;

/// Output device class presented to the host.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum OutputType {
    #[default]
    Gamepad = 0,
    Keyboard = 1,
    Mouse = 2,
    /// Keyboard and mouse together.
    Combo = 3,
}

impl OutputType {
    #[must_use]
    pub const fn from_u8(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::Gamepad),
            1 => Some(Self::Keyboard),
            2 => Some(Self::Mouse),
            3 => Some(Self::Combo),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub const fn sends_gamepad(self) -> bool {
        matches!(self, Self::Gamepad)
    }

    #[inline]
    #[must_use]
    pub const fn sends_keyboard(self) -> bool {
        matches!(self, Self::Keyboard | Self::Combo)
    }

    #[inline]
    #[must_use]
    pub const fn sends_mouse(self) -> bool {
        matches!(self, Self::Mouse | Self::Combo)
    }
}

/// What a mapped source button does.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MappingAction {
    /// Explicitly unmapped.
    None,
    /// Remap to another gamepad button. Currently informational only.
    Button(Buttons),
    /// Single keyboard key (HID usage code).
    Key(u8),
    /// Mouse button mask.
    MouseButton(u8),
    /// Start the macro with this id on press.
    Macro(u8),
}

impl MappingAction {
    pub const KIND_NONE: u8 = 0;
    pub const KIND_BUTTON: u8 = 1;
    pub const KIND_KEY: u8 = 2;
    pub const KIND_MOUSE_BUTTON: u8 = 3;
    pub const KIND_MACRO: u8 = 4;

    /// Build an action from its stored `(kind, target, macro_id)` form.
    ///
    /// Returns `None` for an unknown kind or a key/mouse target wider than a byte.
    #[must_use]
    pub fn from_raw(kind: u8, target: u16, macro_id: u8) -> Option<Self> {
        match kind {
            Self::KIND_NONE => Some(Self::None),
            Self::KIND_BUTTON => Some(Self::Button(Buttons(target))),
            Self::KIND_KEY => u8::try_from(target).ok().map(Self::Key),
            Self::KIND_MOUSE_BUTTON => u8::try_from(target).ok().map(Self::MouseButton),
            Self::KIND_MACRO => Some(Self::Macro(macro_id)),
            _ => None,
        }
    }

    /// Inverse of [`MappingAction::from_raw`].
    #[must_use]
    pub const fn to_raw(self) -> (u8, u16, u8) {
        match self {
            Self::None => (Self::KIND_NONE, 0, 0),
            Self::Button(b) => (Self::KIND_BUTTON, b.raw(), 0),
            Self::Key(code) => (Self::KIND_KEY, code as u16, 0),
            Self::MouseButton(mask) => (Self::KIND_MOUSE_BUTTON, mask as u16, 0),
            Self::Macro(id) => (Self::KIND_MACRO, 0, id),
        }
    }
}

/// A rule translating one source button bit into one output action.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Mapping {
    /// Must hold exactly one bit to ever fire. Edges are reported per
    /// button, so a chord or empty source is stored but never matched.
    pub source: Buttons,
    pub action: MappingAction,
}

impl Mapping {
    #[must_use]
    pub const fn new(source: Buttons, action: MappingAction) -> Self {
        Self { source, action }
    }

    /// True when the source names exactly one button.
    #[inline]
    #[must_use]
    pub const fn is_single_button(&self) -> bool {
        self.source.raw().count_ones() == 1
    }
}

/// Error type for configuration changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// The mapping table is at capacity.
    Full,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Full => write!(f, "mapping table full ({MAX_MAPPINGS} entries)"),
        }
    }
}

/// Ordered, fixed-capacity set of mappings with at most one entry per source.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MappingTable {
    entries: Vec<Mapping, MAX_MAPPINGS>,
}

impl MappingTable {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Linear lookup by source button.
    #[must_use]
    pub fn find(&self, source: Buttons) -> Option<&Mapping> {
        self.entries.iter().find(|m| m.source == source)
    }

    /// Insert a mapping, replacing any existing entry for the same source.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Full`] when the source is new and the table
    /// already holds [`MAX_MAPPINGS`] entries. Existing entries are untouched.
    pub fn add(&mut self, mapping: Mapping) -> Result<(), ConfigError> {
        if let Some(existing) = self.entries.iter_mut().find(|m| m.source == mapping.source) {
            *existing = mapping;
            return Ok(());
        }
        self.entries.push(mapping).map_err(|_| ConfigError::Full)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Mapping> {
        self.entries.iter()
    }
}

/// Converter configuration: output device class plus the mapping table.
///
/// Populated at boot and changed only between ticks.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Config {
    output_type: OutputType,
    mappings: MappingTable,
}

impl Config {
    /// Defaults: gamepad output with an empty table, i.e. passthrough.
    #[must_use]
    pub const fn new(output_type: OutputType) -> Self {
        Self {
            output_type,
            mappings: MappingTable::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn output_type(&self) -> OutputType {
        self.output_type
    }

    pub fn set_output_type(&mut self, output_type: OutputType) {
        if output_type != self.output_type {
            info!("Output type changed to {:?}", output_type);
            self.output_type = output_type;
        }
    }

    #[inline]
    #[must_use]
    pub fn mappings(&self) -> &MappingTable {
        &self.mappings
    }

    #[must_use]
    pub fn find_mapping(&self, source: Buttons) -> Option<&Mapping> {
        self.mappings.find(source)
    }

    /// Add a mapping to the table. See [`MappingTable::add`].
    ///
    /// A source that is not a single button is accepted with a warning; it
    /// takes a table slot but can never fire.
    pub fn add_mapping(&mut self, mapping: Mapping) -> Result<(), ConfigError> {
        if !mapping.is_single_button() {
            warn!(
                "Mapping source {} is not a single button and will never fire",
                mapping.source.raw()
            );
        }
        match self.mappings.add(mapping) {
            Ok(()) => {
                debug!("Added mapping for button {}", mapping.source.raw());
                Ok(())
            }
            Err(e) => {
                warn!("Mapping table full, rejected button {}", mapping.source.raw());
                Err(e)
            }
        }
    }

    pub fn clear_mappings(&mut self) {
        self.mappings.clear();
        info!("Cleared all mappings");
    }
}
