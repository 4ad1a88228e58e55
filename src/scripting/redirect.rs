//! Script output capture.
//!
//! Text printed by a script is forwarded to the GUI thread as
//! [`ScriptMessage::Output`]. The sink currently in effect lives in a
//! [`RedirectSlot`] shared with the engine callbacks; [`StreamRedirect`]
//! installs a sink for a scope and puts the previous one back when it is
//! dropped, including during unwinding.

use crossbeam_channel::Sender;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Output stream a piece of text was written to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
    Stdout,
    Stderr,
}

impl StreamKind {
    pub fn name(&self) -> &'static str {
        match self {
            StreamKind::Stdout => "stdout",
            StreamKind::Stderr => "stderr",
        }
    }
}

/// Messages sent from the script thread to the GUI thread
#[derive(Debug, Clone)]
pub enum ScriptMessage {
    /// A script started executing
    Started { name: String },
    /// Text written by the script
    Output {
        stream: StreamKind,
        text: String,
        at: chrono::DateTime<chrono::Local>,
    },
    /// The script failed
    Error { name: String, message: String },
    /// The script returned, failed or was stopped
    Finished {
        name: String,
        elapsed: Duration,
        cancelled: bool,
    },
}

/// Thread-safe writer forwarding script output to the GUI thread
#[derive(Debug, Clone)]
pub struct OutputSink {
    tx: Sender<ScriptMessage>,
}

impl OutputSink {
    pub fn new(tx: Sender<ScriptMessage>) -> Self {
        Self { tx }
    }

    /// Queue `text` for display. Never blocks; returns `false` if nobody is
    /// listening any more.
    pub fn write(&self, stream: StreamKind, text: impl Into<String>) -> bool {
        self.tx
            .send(ScriptMessage::Output {
                stream,
                text: text.into(),
                at: chrono::Local::now(),
            })
            .is_ok()
    }
}

/// Holds the sink script output currently goes to
#[derive(Debug, Clone, Default)]
pub struct RedirectSlot {
    inner: Arc<Mutex<Option<OutputSink>>>,
}

impl RedirectSlot {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Option<OutputSink>> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Write to the installed sink, or to the log when nothing is installed
    pub fn write(&self, stream: StreamKind, text: &str) {
        let sink = self.lock().clone();
        match sink {
            Some(sink) => {
                if !sink.write(stream, text) {
                    tracing::debug!(target: "script", "[{}] (no receiver) {}", stream.name(), text.trim_end());
                }
            }
            None => match stream {
                StreamKind::Stdout => tracing::info!(target: "script", "{}", text.trim_end()),
                StreamKind::Stderr => tracing::warn!(target: "script", "{}", text.trim_end()),
            },
        }
    }

    pub fn is_redirected(&self) -> bool {
        self.lock().is_some()
    }

    fn replace(&self, sink: Option<OutputSink>) -> Option<OutputSink> {
        std::mem::replace(&mut *self.lock(), sink)
    }
}

/// Scoped redirection of script output
#[must_use = "the previous sink is restored as soon as the guard is dropped"]
pub struct StreamRedirect {
    slot: RedirectSlot,
    previous: Option<OutputSink>,
}

impl StreamRedirect {
    pub fn install(slot: &RedirectSlot, sink: OutputSink) -> Self {
        let previous = slot.replace(Some(sink));
        Self {
            slot: slot.clone(),
            previous,
        }
    }
}

impl Drop for StreamRedirect {
    fn drop(&mut self) {
        self.slot.replace(self.previous.take());
    }
}
