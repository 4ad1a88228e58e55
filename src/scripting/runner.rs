//! Script execution on a worker thread
//!
//! [`ScriptRunner`] owns the script thread. It forwards everything the
//! script prints, plus lifecycle events, as [`ScriptMessage`]s; the GUI
//! thread polls the receiver returned by [`ScriptRunner::new`] alongside its
//! UI event queue.

use super::engine::ScriptApi;
use super::redirect::{OutputSink, ScriptMessage, StreamKind, StreamRedirect};
use crate::config::ScriptConfig;
use crate::error::{BenchViewError, Result};
use crate::session::Session;
use crate::types::DockArea;
use crate::ui::UiRequestProxy;
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Instant;

/// Resets the running flag when the script thread finishes or unwinds
struct RunningGuard(Arc<AtomicBool>);

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Runs one user script at a time on a dedicated thread
pub struct ScriptRunner {
    api: ScriptApi,
    config: ScriptConfig,
    messages: Sender<ScriptMessage>,
    running: Arc<AtomicBool>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl ScriptRunner {
    pub fn new(
        proxy: Arc<UiRequestProxy>,
        session: Session,
        config: ScriptConfig,
    ) -> (Self, Receiver<ScriptMessage>) {
        let (messages, rx) = unbounded();
        let runner = Self {
            api: ScriptApi::new(proxy, session),
            config,
            messages,
            running: Arc::new(AtomicBool::new(false)),
            worker: Mutex::new(None),
        };
        (runner, rx)
    }

    /// Dock area used when a script passes an empty area name
    pub fn with_default_area(mut self, area: DockArea) -> Self {
        self.api = self.api.clone().with_default_area(area);
        self
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Check a script for syntax errors without running it
    pub fn validate(&self, source: &str) -> Result<()> {
        self.api
            .build_engine(&self.config)
            .compile(source)
            .map(|_| ())
            .map_err(|e| BenchViewError::Script(format!("Validation error: {}", e)))
    }

    /// Start `source` on the script thread
    pub fn run(&self, name: impl Into<String>, source: impl Into<String>) -> Result<()> {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(BenchViewError::ScriptBusy);
        }
        let guard = RunningGuard(self.running.clone());

        // The previous thread has already reset the flag; reap it
        self.join();
        self.api.clear_stop();

        let name = name.into();
        let source = source.into();
        let api = self.api.clone();
        let config = self.config.clone();
        let tx = self.messages.clone();

        tracing::info!("Starting script '{}'", name);
        let handle = std::thread::Builder::new()
            .name("script-runner".into())
            .spawn(move || execute(api, config, tx, name, source, guard))?;

        *self.worker.lock().unwrap_or_else(|e| e.into_inner()) = Some(handle);
        Ok(())
    }

    /// Read a script file and start it
    pub fn run_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| {
            BenchViewError::Script(format!("Failed to read script {:?}: {}", path, e))
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        self.run(name, source)
    }

    /// Ask the running script to stop.
    ///
    /// The script stops at its next operation or sleep slice; a UI request
    /// that is already waiting finishes (or times out) first.
    pub fn stop(&self) {
        if self.is_running() {
            tracing::info!("Stopping script");
            self.api.request_stop();
        }
    }

    /// Wait for the script thread to exit
    pub fn join(&self) {
        let handle = self
            .worker
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                tracing::error!("Script thread panicked");
            }
        }
    }
}

impl Drop for ScriptRunner {
    fn drop(&mut self) {
        // Joining here could deadlock if the script waits on this thread
        self.stop();
    }
}

impl std::fmt::Debug for ScriptRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptRunner")
            .field("running", &self.is_running())
            .field("config", &self.config)
            .finish()
    }
}

fn execute(
    api: ScriptApi,
    config: ScriptConfig,
    tx: Sender<ScriptMessage>,
    name: String,
    source: String,
    running: RunningGuard,
) {
    let started = Instant::now();
    let _ = tx.send(ScriptMessage::Started { name: name.clone() });

    let failure = {
        let _redirect = StreamRedirect::install(api.output(), OutputSink::new(tx.clone()));
        let engine = api.build_engine(&config);
        match engine.run(&source) {
            Ok(()) => None,
            Err(_) if api.stop_requested() => None,
            Err(e) => {
                let message = e.to_string();
                api.output()
                    .write(StreamKind::Stderr, &format!("{}\n", message));
                Some(message)
            }
        }
    };

    let cancelled = api.stop_requested();
    let elapsed = started.elapsed();
    if let Some(message) = failure {
        tracing::warn!("Script '{}' failed: {}", name, message);
        let _ = tx.send(ScriptMessage::Error {
            name: name.clone(),
            message,
        });
    } else {
        tracing::info!(
            "Script '{}' {} after {:?}",
            name,
            if cancelled { "stopped" } else { "finished" },
            elapsed
        );
    }

    // Allow the next run before announcing the end
    drop(running);
    let _ = tx.send(ScriptMessage::Finished {
        name,
        elapsed,
        cancelled,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UiConfig;
    use crate::ui;
    use std::time::Duration;

    fn runner() -> (ScriptRunner, Receiver<ScriptMessage>, ui::UiEventQueue) {
        let (proxy, queue) = ui::channel(&UiConfig::default());
        let (runner, rx) = ScriptRunner::new(Arc::new(proxy), Session::demo(), ScriptConfig::default());
        (runner, rx, queue)
    }

    fn wait_finished(rx: &Receiver<ScriptMessage>) -> Vec<ScriptMessage> {
        let mut messages = Vec::new();
        while let Ok(msg) = rx.recv_timeout(Duration::from_secs(5)) {
            let done = matches!(msg, ScriptMessage::Finished { .. });
            messages.push(msg);
            if done {
                break;
            }
        }
        messages
    }

    #[test]
    fn test_run_reports_lifecycle_and_output() {
        let (runner, rx, _queue) = runner();
        runner.run("hello", r#"print("hi");"#).unwrap();
        let messages = wait_finished(&rx);

        assert!(matches!(&messages[0], ScriptMessage::Started { name } if name == "hello"));
        assert!(matches!(
            &messages[1],
            ScriptMessage::Output { stream: StreamKind::Stdout, text, .. } if text == "hi\n"
        ));
        assert!(matches!(
            messages.last(),
            Some(ScriptMessage::Finished { cancelled: false, .. })
        ));
        runner.join();
        assert!(!runner.is_running());
    }

    #[test]
    fn test_script_error_is_reported() {
        let (runner, rx, _queue) = runner();
        runner.run("broken", r#"signal("psu", "CH7", "V");"#).unwrap();
        let messages = wait_finished(&rx);

        let error = messages.iter().find_map(|m| match m {
            ScriptMessage::Error { message, .. } => Some(message.clone()),
            _ => None,
        });
        assert!(error.unwrap().contains("CH7"));
        assert!(messages.iter().any(|m| matches!(
            m,
            ScriptMessage::Output { stream: StreamKind::Stderr, .. }
        )));
    }

    #[test]
    fn test_second_run_is_rejected_while_busy() {
        let (runner, rx, _queue) = runner();
        runner.run("slow", "sleep(2000);").unwrap();

        assert!(matches!(
            runner.run("other", "print(1);"),
            Err(BenchViewError::ScriptBusy)
        ));

        runner.stop();
        let messages = wait_finished(&rx);
        assert!(matches!(
            messages.last(),
            Some(ScriptMessage::Finished { cancelled: true, .. })
        ));
        assert!(!messages
            .iter()
            .any(|m| matches!(m, ScriptMessage::Error { .. })));

        // Runner is reusable once finished
        runner.run("again", "print(2);").unwrap();
        wait_finished(&rx);
    }

    #[test]
    fn test_finished_is_queued_once_joined() {
        let (runner, rx, _queue) = runner();
        runner.run("quick", "let x = 1;").unwrap();

        // Hosts stop polling once the flag drops; after join nothing is lost
        while runner.is_running() {
            std::thread::sleep(Duration::from_millis(1));
        }
        runner.join();

        let messages: Vec<ScriptMessage> = rx.try_iter().collect();
        assert!(matches!(messages.first(), Some(ScriptMessage::Started { .. })));
        assert!(matches!(
            messages.last(),
            Some(ScriptMessage::Finished { cancelled: false, .. })
        ));
    }

    #[test]
    fn test_validate() {
        let (runner, _rx, _queue) = runner();
        assert!(runner.validate("let x = 1 + 2;").is_ok());
        assert!(runner.validate("let x = ;").is_err());
    }

    #[test]
    fn test_run_missing_file() {
        let (runner, _rx, _queue) = runner();
        let dir = tempfile::tempdir().unwrap();
        let result = runner.run_file(dir.path().join("missing.rhai"));
        assert!(matches!(result, Err(BenchViewError::Script(_))));
        assert!(!runner.is_running());
    }
}
