//! Output transport trait and error types.

use crate::report::Report;

/// Error type for output operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OutputError {
    /// Transport not ready (e.g., USB not enumerated, endpoint busy).
    NotReady,
    /// Transport I/O error.
    Io,
}

/// Destination for rendered reports.
///
/// Sends are fire-and-forget from the engine's point of view: a report that
/// cannot be delivered right now is dropped, never queued.
///
/// # `no_std` Compatibility
///
/// All implementations must be `#![no_std]` compatible with no heap allocation.
pub trait ReportSink {
    /// Hand one report to the transport without blocking.
    fn send(&mut self, report: &Report) -> Result<(), OutputError>;

    /// Check if the transport can accept a report now.
    fn is_ready(&self) -> bool;
}

impl<S: ReportSink + ?Sized> ReportSink for &mut S {
    fn send(&mut self, report: &Report) -> Result<(), OutputError> {
        (**self).send(report)
    }

    fn is_ready(&self) -> bool {
        (**self).is_ready()
    }
}
