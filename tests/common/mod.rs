//! Common test utilities and helpers

#![allow(dead_code)] // Test utilities may not all be used in every test file

pub mod builders;
pub mod mock_helpers;

use benchview::scripting::ScriptMessage;
use benchview::ui::{UiHost, ViewFactory};
use crossbeam_channel::Receiver;
use std::time::{Duration, Instant};

/// Upper bound for anything a test waits on
pub fn test_timeout() -> Duration {
    Duration::from_secs(5)
}

/// One GUI frame
pub fn frame() -> Duration {
    Duration::from_millis(5)
}

/// Run the host loop on the current thread until `done` returns true.
/// Returns `false` if the test timeout elapsed first.
pub fn pump_until<F: ViewFactory>(host: &mut UiHost<F>, mut done: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + test_timeout();
    while Instant::now() < deadline {
        host.process_for(frame());
        if done() {
            return true;
        }
    }
    false
}

/// Run the host loop until the script reports `Finished`, collecting every
/// message received on the way.
pub fn pump_script<F: ViewFactory>(
    host: &mut UiHost<F>,
    messages: &Receiver<ScriptMessage>,
) -> Vec<ScriptMessage> {
    let mut received = Vec::new();
    let mut finished = false;
    pump_until(host, || {
        for msg in messages.try_iter() {
            finished |= matches!(msg, ScriptMessage::Finished { .. });
            received.push(msg);
        }
        finished
    });
    assert!(finished, "script did not finish in time: {:?}", received);
    received
}

/// Everything the script printed to stdout, concatenated
pub fn stdout_of(messages: &[ScriptMessage]) -> String {
    messages
        .iter()
        .filter_map(|m| match m {
            ScriptMessage::Output {
                stream: benchview::scripting::StreamKind::Stdout,
                text,
                ..
            } => Some(text.as_str()),
            _ => None,
        })
        .collect()
}
