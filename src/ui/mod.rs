//! Cross-thread UI requests
//!
//! Views may only be created and mutated on the GUI thread, while user
//! scripts run on a worker thread. This module bridges the two:
//!
//! - [`UiRequestProxy`] - called from the script thread. Blocking requests
//!   suspend the caller until the GUI thread answers with a
//!   [`ViewHandle`](crate::types::ViewHandle) or the timeout elapses;
//!   fire-and-forget requests return once queued.
//! - [`UiEventQueue`] - FIFO queue of [`ViewRequest`]s, drained by the host.
//! - [`UiHost`] - runs on the GUI thread, resolves references against the
//!   session, calls the [`ViewFactory`] and emits the view-added
//!   notification.
//! - [`ViewAddedSignal`] / [`Connection`] - notification with scoped
//!   listeners.
//!
//! # Example
//!
//! ```ignore
//! use benchview::config::UiConfig;
//! use benchview::session::Session;
//! use benchview::types::{DeviceId, DockArea, SignalRef};
//! use benchview::ui::{self, DockLayout, UiHost, ViewContent};
//!
//! let (proxy, queue) = ui::channel(&UiConfig::default());
//! let mut host = UiHost::new(queue, Session::demo(), DockLayout::new());
//!
//! std::thread::spawn(move || {
//!     let handle = proxy.request_view(
//!         &DeviceId::new("psu"),
//!         DockArea::Right,
//!         ViewContent::SignalPlot { signal: SignalRef::new("psu", "CH1", "V") },
//!     );
//! });
//!
//! loop {
//!     host.process_for(std::time::Duration::from_millis(16));
//! }
//! ```

pub mod bridge;
pub mod host;
pub mod proxy;
pub mod request;
pub mod signal;
pub mod views;

pub use bridge::{channel, UiEventQueue};
pub use host::{HostStats, UiHost};
pub use proxy::UiRequestProxy;
pub use request::{Attachment, UiAction, ViewContent, ViewRequest, ViewRequestKind};
pub use signal::{Connection, ViewAddedListener, ViewAddedSignal};
pub use views::{DockLayout, DockedView, ViewFactory};
