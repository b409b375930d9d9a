//! Line dispatcher
//!
//! Receives decoded lines from the listener and fans them out to the
//! registered handlers. Rotation requests (SIGHUP) and shutdown travel the
//! same channel so ordering relative to data is preserved.

use async_trait::async_trait;
use atgmlogger_events::{AppEvent, EventEmitter, EventSender, LoggerEvent};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info};

/// Messages consumed by the dispatcher
#[derive(Debug)]
pub enum DispatchMessage {
    /// A decoded data line
    Line(String),
    /// Log files were rotated; reopen handles
    Rotate,
    /// Drain and exit
    Shutdown,
}

/// A consumer of dispatched lines
#[async_trait]
pub trait Handler: Send {
    fn name(&self) -> &'static str;

    /// Whether this handler consumes the given line
    fn wants(&self, line: &str) -> bool {
        let _ = line;
        true
    }

    async fn handle(&mut self, line: &str);

    /// Log files were rotated externally
    async fn rotate(&mut self) {}

    /// Flush and release resources
    async fn shutdown(&mut self) {}
}

/// Fans lines out to handlers in registration order
pub struct Dispatcher {
    handlers: Vec<Box<dyn Handler>>,
    rx: UnboundedReceiver<DispatchMessage>,
    events: Option<EventSender>,
}

impl Dispatcher {
    #[must_use]
    pub fn new(rx: UnboundedReceiver<DispatchMessage>) -> Self {
        Self {
            handlers: Vec::new(),
            rx,
            events: None,
        }
    }

    /// Attach an event channel for progress reporting
    #[must_use]
    pub fn with_events(mut self, events: EventSender) -> Self {
        self.events = Some(events);
        self
    }

    pub fn register(&mut self, handler: Box<dyn Handler>) {
        debug!(handler = handler.name(), "registering handler");
        self.handlers.push(handler);
    }

    /// Number of registered handlers
    #[must_use]
    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Run until `Shutdown` arrives or every sender is dropped
    pub async fn run(mut self) {
        while let Some(message) = self.rx.recv().await {
            match message {
                DispatchMessage::Line(line) => {
                    for handler in &mut self.handlers {
                        if handler.wants(&line) {
                            handler.handle(&line).await;
                        }
                    }
                }
                DispatchMessage::Rotate => {
                    info!("rotation requested, reopening handles");
                    for handler in &mut self.handlers {
                        handler.rotate().await;
                    }
                    self.emit(AppEvent::Logger(LoggerEvent::RotateCompleted));
                }
                DispatchMessage::Shutdown => break,
            }
        }

        for handler in &mut self.handlers {
            handler.shutdown().await;
        }
        debug!("dispatcher exited");
    }
}

impl EventEmitter for Dispatcher {
    fn event_sender(&self) -> Option<&EventSender> {
        self.events.as_ref()
    }
}
