#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Serial capture and dispatch for atgmlogger
//!
//! The listener reads raw serial data and frames it into lines; the
//! dispatcher fans lines out to handlers (data logging, time sync). The
//! removable-storage watcher and the GPIO worker run as independent tasks
//! beside the line pipeline.

pub mod datalogger;
pub mod dispatcher;
pub mod framing;
pub mod gpio;
pub mod listener;
pub mod removable;
pub mod timesync;

pub use datalogger::DataLogger;
pub use dispatcher::{DispatchMessage, Dispatcher, Handler};
pub use framing::LineFramer;
pub use gpio::{GpioCommand, GpioWorker, Led};
pub use listener::{open_port, SerialListener};
pub use removable::RemovableStorageWatcher;
pub use timesync::TimeSync;
