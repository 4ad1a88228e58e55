//! # BenchView: script-driven views for bench instruments
//!
//! A measurement session holds devices (power supplies, electronic loads,
//! multimeters) with their channels, signals and configurables. User
//! scripts lay out views on those devices while running on a worker thread;
//! the views themselves are only ever touched on the GUI thread.
//!
//! ## Architecture
//!
//! - **Session**: registry of devices, shared between threads
//! - **UI bridge**: [`ui::UiRequestProxy`] on the script side, [`ui::UiHost`]
//!   on the GUI side, connected by a FIFO event queue and a view-added
//!   notification
//! - **Scripting**: Rhai scripts executed by [`scripting::ScriptRunner`],
//!   with their output forwarded to the GUI thread
//! - **Communication**: Crossbeam channels for thread-safe data transfer
//!
//! ## Configuration
//!
//! Settings are stored as TOML in the platform-appropriate data directory
//! under `dev.benchview.benchview-rs`:
//!
//! - **Linux**: `~/.local/share/dev.benchview.benchview-rs/`
//! - **macOS**: `~/Library/Application Support/dev.benchview.benchview-rs/`
//! - **Windows**: `%APPDATA%\dev.benchview.benchview-rs\`
//!
//! ## Example
//!
//! ```ignore
//! use benchview::{config::AppConfig, scripting::ScriptRunner, session::Session, ui};
//! use std::sync::Arc;
//!
//! let config = AppConfig::default();
//! let session = Session::demo();
//! let (proxy, queue) = ui::channel(&config.ui);
//! let mut host = ui::UiHost::new(queue, session.clone(), ui::DockLayout::new());
//!
//! let (runner, messages) = ScriptRunner::new(Arc::new(proxy), session, config.scripting);
//! runner.run("layout", r#"ui_add_plot_view("psu", "right", channel("psu", "CH1"));"#)?;
//!
//! while runner.is_running() {
//!     host.process_for(std::time::Duration::from_millis(16));
//!     for msg in messages.try_iter() {
//!         println!("{:?}", msg);
//!     }
//! }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod scripting;
pub mod session;
pub mod types;
pub mod ui;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{BenchViewError, Result};
pub use scripting::{ScriptMessage, ScriptRunner};
pub use session::Session;
pub use types::{ChannelRef, ConfigurableRef, DeviceId, DockArea, SignalRef, ViewHandle};
pub use ui::{UiHost, UiRequestProxy};
