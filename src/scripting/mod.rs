//! User scripts
//!
//! Scripts are written in Rhai and run on a worker thread owned by
//! [`ScriptRunner`]. They query the session, build references to channels,
//! signals and configurables, and lay out views through the
//! [`UiRequestProxy`](crate::ui::UiRequestProxy). See [`engine`] for the
//! full list of script functions.
//!
//! ## Example Script
//!
//! ```rhai
//! ui_add_device_tab("psu");
//!
//! let v = signal("psu", "CH1", "V");
//! let i = signal("psu", "CH1", "I");
//! let plot = ui_add_plot_view("psu", "right", v);
//! if plot != "" {
//!     ui_add_signal_to_plot_view("psu", plot, i);
//! }
//! print("plot: " + plot);
//! ```

pub mod engine;
pub mod redirect;
pub mod runner;

pub use engine::{ScriptApi, STOPPED_MESSAGE};
pub use redirect::{OutputSink, RedirectSlot, ScriptMessage, StreamKind, StreamRedirect};
pub use runner::ScriptRunner;
