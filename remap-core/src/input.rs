//! Input source trait.

use input_proto::InputState;

/// Pull-style source of controller snapshots.
///
/// The control loop polls once per tick. Implementations return the most
/// recent complete snapshot received since the previous poll, or `None` when
/// nothing new is available or the device is gone.
///
/// # `no_std` Compatibility
///
/// All implementations must be `#![no_std]` compatible with no heap allocation.
pub trait InputSource {
    /// Take the latest valid state, if any.
    fn poll(&mut self) -> Option<InputState>;

    /// Whether an input device is currently attached.
    fn is_connected(&self) -> bool;
}

impl<T: InputSource + ?Sized> InputSource for &mut T {
    fn poll(&mut self) -> Option<InputState> {
        (**self).poll()
    }

    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }
}
