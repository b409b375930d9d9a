#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Event system for async communication in atgmlogger
//!
//! Library crates report operational progress (install steps, unit
//! lifecycle, copy-out activity) as events on this channel instead of
//! printing. The CLI owns the receiver and renders events for the user.

pub mod events;
pub use events::{AppEvent, GeneralEvent, InstallEvent, LoggerEvent, UninstallEvent};

use tokio::sync::mpsc::UnboundedSender;

/// Type alias for event sender
pub type EventSender = UnboundedSender<AppEvent>;

/// Type alias for event receiver
pub type EventReceiver = tokio::sync::mpsc::UnboundedReceiver<AppEvent>;

/// Create a new event channel
#[must_use]
pub fn channel() -> (EventSender, EventReceiver) {
    tokio::sync::mpsc::unbounded_channel()
}

/// The unified trait for emitting events throughout atgmlogger
///
/// Implementors expose their optional sender; the default methods cover the
/// common emission shapes so call sites stay terse.
pub trait EventEmitter {
    /// Get the event sender for this emitter
    fn event_sender(&self) -> Option<&EventSender>;

    /// Emit an event through this emitter
    fn emit(&self, event: AppEvent) {
        if let Some(sender) = self.event_sender() {
            // Ignore send errors - if receiver is dropped, we just continue
            let _ = sender.send(event);
        }
    }

    /// Emit a debug log event
    fn emit_debug(&self, message: impl Into<String>) {
        self.emit(AppEvent::General(GeneralEvent::Debug {
            message: message.into(),
        }));
    }

    /// Emit a warning event
    fn emit_warning(&self, message: impl Into<String>) {
        self.emit(AppEvent::General(GeneralEvent::Warning {
            message: message.into(),
        }));
    }

    /// Emit an error event
    fn emit_error(&self, message: impl Into<String>) {
        self.emit(AppEvent::General(GeneralEvent::Error {
            message: message.into(),
        }));
    }

    /// Emit an operation started event
    fn emit_operation_started(&self, operation: impl Into<String>) {
        self.emit(AppEvent::General(GeneralEvent::OperationStarted {
            operation: operation.into(),
        }));
    }

    /// Emit an operation completed event
    fn emit_operation_completed(&self, operation: impl Into<String>, success: bool) {
        self.emit(AppEvent::General(GeneralEvent::OperationCompleted {
            operation: operation.into(),
            success,
        }));
    }
}

/// Implementation of `EventEmitter` for the raw `EventSender`
impl EventEmitter for EventSender {
    fn event_sender(&self) -> Option<&EventSender> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn emitter_delivers_in_order() {
        let (tx, mut rx) = channel();
        tx.emit_operation_started("install");
        tx.emit_warning("unit already enabled");
        tx.emit_operation_completed("install", true);

        assert!(matches!(
            rx.recv().await,
            Some(AppEvent::General(GeneralEvent::OperationStarted { .. }))
        ));
        assert!(matches!(
            rx.recv().await,
            Some(AppEvent::General(GeneralEvent::Warning { .. }))
        ));
        assert!(matches!(
            rx.recv().await,
            Some(AppEvent::General(GeneralEvent::OperationCompleted {
                success: true,
                ..
            }))
        ));
    }

    #[test]
    fn emit_without_receiver_is_silent() {
        let (tx, rx) = channel();
        drop(rx);
        tx.emit_debug("nobody listening");
    }
}
