//! BenchView - Headless Entry Point
//!
//! Runs a layout script against a demo session. The main thread plays the
//! GUI thread: it services view requests and prints script output until the
//! script finishes, then logs the resulting dock layout.
//!
//! Usage: `benchview [script.rhai]`

use anyhow::Context;
use benchview::{
    config::AppConfig,
    logging,
    scripting::{ScriptMessage, ScriptRunner, StreamKind},
    session::Session,
    types::DockArea,
    ui::{self, DockLayout, UiHost},
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

const FRAME: Duration = Duration::from_millis(16);

const DEMO_SCRIPT: &str = r#"
for device in devices() {
    print("Found " + device_name(device));
    ui_add_device_tab(device);
}

let v = signal("psu", "CH1", "V");
let i = signal("psu", "CH1", "I");

let data = ui_add_data_view("psu", "left", v);
ui_add_signal_to_data_view("psu", data, i);

let plot = ui_add_plot_view("psu", "right", channel("psu", "CH1"));
ui_add_signal_to_plot_view("psu", plot, signal("psu", "CH1", "P"));

let xy = ui_add_plot_view("load", "bottom", signal("load", "CH1", "V"), signal("load", "CH1", "I"));
ui_add_power_panel_view("psu", "", v, i);
ui_add_value_panel_view("dmm", "top", signal("dmm", "P1", "V"));
ui_add_control_view("load", "", configurable("load", "CH1"));

print("Created " + data + ", " + plot + " and " + xy);
"#;

fn main() -> anyhow::Result<()> {
    let script_path = std::env::args().nth(1).map(PathBuf::from);

    let config = match AppConfig::default_path() {
        Some(path) => AppConfig::load_or_default(path),
        None => AppConfig::default(),
    };
    let _log_guard = logging::init(&config.logging);

    tracing::info!("Starting BenchView");

    let session = Session::demo();
    let (proxy, queue) = ui::channel(&config.ui);
    let mut host = UiHost::new(queue, session.clone(), DockLayout::new());

    let (runner, messages) = ScriptRunner::new(Arc::new(proxy), session, config.scripting.clone());
    let runner = runner.with_default_area(config.ui.default_dock_area);

    match &script_path {
        Some(path) => runner
            .run_file(path)
            .with_context(|| format!("Failed to start {}", path.display()))?,
        None => runner
            .run("demo", DEMO_SCRIPT)
            .context("Failed to start demo script")?,
    }

    let mut failed = false;
    'frames: loop {
        host.process_for(FRAME);

        for msg in messages.try_iter() {
            if report(msg, &mut failed) {
                break 'frames;
            }
        }

        // Script thread died without reporting
        if !runner.is_running() && messages.is_empty() {
            break;
        }
    }

    runner.join();
    // The running flag drops just before `Finished` is sent
    for msg in messages.try_iter() {
        report(msg, &mut failed);
    }
    // Fire-and-forget requests may still be queued
    host.process_pending();

    let stats = host.stats();
    tracing::info!(
        "Processed {} requests: {} views, {} attachments, {} stale, {} failed",
        stats.processed,
        stats.views_created,
        stats.attached,
        stats.stale,
        stats.failed
    );

    let layout = host.factory();
    for tab in layout.device_tabs() {
        tracing::info!("Device tab: {}", tab);
    }
    for area in DockArea::ALL {
        for view in layout.views_in(area) {
            tracing::info!(
                "[{}] {} {} ({} signals)",
                area,
                view.handle,
                view.title,
                view.signals().len()
            );
        }
    }

    if failed {
        anyhow::bail!("Script failed");
    }
    Ok(())
}

/// Print or log one script message. Returns true once the script finished.
fn report(msg: ScriptMessage, failed: &mut bool) -> bool {
    match msg {
        ScriptMessage::Started { name } => tracing::info!("Running {}", name),
        ScriptMessage::Output { stream, text, .. } => match stream {
            StreamKind::Stdout => print!("{}", text),
            StreamKind::Stderr => eprint!("{}", text),
        },
        ScriptMessage::Error { .. } => *failed = true,
        ScriptMessage::Finished {
            name,
            elapsed,
            cancelled,
        } => {
            tracing::info!(
                "{} finished in {:?}{}",
                name,
                elapsed,
                if cancelled { " (stopped)" } else { "" }
            );
            return true;
        }
    }
    false
}
