//! Daemon assembly and lifecycle
//!
//! Wires listener -> dispatcher -> handlers, starts the removable-storage
//! watcher and GPIO worker, and owns signal handling: SIGHUP rotates log
//! handles, SIGINT/SIGTERM drain and exit.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use atgmlogger_config::Config;
use atgmlogger_errors::Error;
use atgmlogger_events::{AppEvent, EventEmitter, EventSender, LoggerEvent};
use atgmlogger_logger::{
    open_port, DataLogger, DispatchMessage, Dispatcher, GpioCommand, GpioWorker,
    RemovableStorageWatcher, SerialListener, TimeSync,
};
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::mpsc;
use tracing::{info, warn};

/// CLI overrides applied on top of the loaded configuration
pub struct RunOverrides {
    pub device: Option<String>,
    pub logdir: Option<PathBuf>,
    pub mountdir: Option<PathBuf>,
    pub no_gpio: bool,
}

/// Run the logging daemon until SIGINT/SIGTERM
///
/// # Errors
///
/// Returns an error if the serial port cannot be opened or signal
/// handlers cannot be installed.
pub async fn run(
    mut config: Config,
    overrides: RunOverrides,
    events: EventSender,
) -> Result<(), Error> {
    if let Some(device) = overrides.device {
        config.serial.port = device;
    }
    if let Some(logdir) = overrides.logdir {
        config.logging.logdir = logdir;
    }
    if let Some(mountdir) = overrides.mountdir {
        config.usb.mount = mountdir;
    }

    if let Err(e) =
        atgmlogger_platform::fs::create_dir_all_mode(&config.logging.logdir, 0o750).await
    {
        warn!(
            "log directory {} could not be created ({e}), logging to current directory",
            config.logging.logdir.display()
        );
        config.logging.logdir = PathBuf::from(".");
    }

    let shutdown = Arc::new(AtomicBool::new(false));

    let gpio = if config.gpio.enabled && !overrides.no_gpio {
        let (gpio_tx, gpio_rx) = mpsc::unbounded_channel();
        tokio::spawn(GpioWorker::new(&config.gpio, gpio_rx).run());
        Some(gpio_tx)
    } else {
        None
    };

    let (dispatch_tx, dispatch_rx) = mpsc::unbounded_channel();
    let mut dispatcher = Dispatcher::new(dispatch_rx).with_events(events.clone());

    let mut datalogger = DataLogger::new(config.logging.data_path());
    if let Some(gpio) = &gpio {
        datalogger = datalogger.with_gpio(gpio.clone());
    }
    dispatcher.register(Box::new(datalogger));

    if config.timesync.enabled {
        dispatcher.register(Box::new(
            TimeSync::new(config.timesync.interval).with_events(events.clone()),
        ));
    }
    info!(
        "dispatcher configured with {} handlers",
        dispatcher.handler_count()
    );

    let port = open_port(&config.serial)?;
    events.emit(AppEvent::Logger(LoggerEvent::ListenerStarted {
        port: config.serial.port.clone(),
    }));

    let listener = SerialListener::new(port, dispatch_tx.clone(), Arc::clone(&shutdown));
    let listener_task = tokio::task::spawn_blocking(move || listener.listen());

    let mut watcher = RemovableStorageWatcher::new(&config).with_events(events.clone());
    if let Some(gpio) = &gpio {
        watcher = watcher.with_gpio(gpio.clone());
    }
    let watcher_task = tokio::spawn(watcher.run(Arc::clone(&shutdown)));

    let dispatcher_task = tokio::spawn(dispatcher.run());

    let mut sighup = signal(SignalKind::hangup())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    loop {
        tokio::select! {
            _ = sighup.recv() => {
                info!("SIGHUP received, rotating log handles");
                let _ = dispatch_tx.send(DispatchMessage::Rotate);
            }
            _ = sigterm.recv() => break,
            result = tokio::signal::ctrl_c() => {
                result?;
                break;
            }
        }
    }

    info!("shutdown requested, draining handlers");
    events.emit(AppEvent::Logger(LoggerEvent::ShuttingDown));
    shutdown.store(true, Ordering::Relaxed);
    let _ = dispatch_tx.send(DispatchMessage::Shutdown);
    if let Some(gpio) = &gpio {
        let _ = gpio.send(GpioCommand::Shutdown);
    }

    let _ = dispatcher_task.await;
    let _ = watcher_task.await;
    let _ = listener_task.await;
    Ok(())
}
