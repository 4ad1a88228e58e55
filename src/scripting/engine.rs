//! Rhai engine setup for user scripts
//!
//! ## Session Queries
//!
//! - `devices()` - Ids of all devices in the session
//! - `device_name(device)` - Display name of a device
//! - `channels(device)` / `configurables(device)` - Names on a device
//! - `signals(device, channel)` - Signal names of a channel
//!
//! ## References
//!
//! - `channel(device, name)`
//! - `signal(device, channel, name)`
//! - `configurable(device, name)`
//!
//! All three fail if the entity does not exist in the session.
//!
//! ## UI Requests
//!
//! The `area` argument is one of `"left"`, `"right"`, `"top"`, `"bottom"`;
//! an empty string selects the configured default.
//!
//! These block until the view exists and return its id, or `""` on timeout:
//!
//! - `ui_add_data_view(device, area, signal)`
//! - `ui_add_control_view(device, area, configurable)`
//! - `ui_add_plot_view(device, area, channel)`
//! - `ui_add_plot_view(device, area, signal)`
//! - `ui_add_plot_view(device, area, x_signal, y_signal)`
//! - `ui_add_power_panel_view(device, area, voltage, current)`
//! - `ui_add_value_panel_view(device, area, channel)`
//! - `ui_add_value_panel_view(device, area, signal)`
//!
//! These return as soon as the request is queued:
//!
//! - `ui_add_device_tab(device)`
//! - `ui_add_signal_to_data_view(device, view_id, signal)`
//! - `ui_add_signal_to_plot_view(device, view_id, signal)`
//! - `ui_add_signals_to_xy_plot_view(device, view_id, x_signal, y_signal)`
//!
//! `ui_set_timeout(ms)` / `ui_timeout()` control how long the blocking
//! calls wait (0 = forever).
//!
//! ## Misc
//!
//! - `sleep(ms)` - Pause the script; interrupted by a stop request
//! - `eprint(text)` - Write a line to the error stream
//! - `print` / `debug` - Written to the output / error stream

use super::redirect::{RedirectSlot, StreamKind};
use crate::config::ScriptConfig;
use crate::error::BenchViewError;
use crate::session::Session;
use crate::types::{ChannelRef, ConfigurableRef, DeviceId, DockArea, SignalRef, ViewHandle};
use crate::ui::{Attachment, UiRequestProxy, ViewContent};
use rhai::{Array, Dynamic, Engine, EvalAltResult, Position};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

type RhaiResult<T> = std::result::Result<T, Box<EvalAltResult>>;

/// Message carried by the error that aborts a stopped script
pub const STOPPED_MESSAGE: &str = "Script stopped";

const SLEEP_SLICE: Duration = Duration::from_millis(10);

fn to_rhai(err: BenchViewError) -> Box<EvalAltResult> {
    err.to_string().into()
}

/// Everything the script API functions need, shared by all registered closures
#[derive(Clone)]
pub struct ScriptApi {
    proxy: Arc<UiRequestProxy>,
    session: Session,
    output: RedirectSlot,
    cancel: Arc<AtomicBool>,
    default_area: DockArea,
}

impl ScriptApi {
    pub fn new(proxy: Arc<UiRequestProxy>, session: Session) -> Self {
        Self {
            proxy,
            session,
            output: RedirectSlot::new(),
            cancel: Arc::new(AtomicBool::new(false)),
            default_area: DockArea::default(),
        }
    }

    pub fn with_default_area(mut self, area: DockArea) -> Self {
        self.default_area = area;
        self
    }

    pub fn proxy(&self) -> &Arc<UiRequestProxy> {
        &self.proxy
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Slot the engine's print callbacks write to
    pub fn output(&self) -> &RedirectSlot {
        &self.output
    }

    /// Ask a running script to stop at its next operation or sleep slice
    pub fn request_stop(&self) {
        self.cancel.store(true, Ordering::Release);
    }

    pub fn clear_stop(&self) {
        self.cancel.store(false, Ordering::Release);
    }

    pub fn stop_requested(&self) -> bool {
        self.cancel.load(Ordering::Acquire)
    }

    /// Build an engine with the script API registered and sandbox limits applied
    pub fn build_engine(&self, config: &ScriptConfig) -> Engine {
        let mut engine = Engine::new();
        self.configure_engine(&mut engine, config);
        engine
    }

    fn configure_engine(&self, engine: &mut Engine, config: &ScriptConfig) {
        engine.set_max_expr_depths(64, 64);
        engine.set_max_call_levels(config.max_call_levels);
        engine.set_max_operations(config.max_operations);
        engine.set_max_string_size(config.max_string_size);

        {
            let cancel = self.cancel.clone();
            engine.on_progress(move |_ops| {
                if cancel.load(Ordering::Acquire) {
                    Some(Dynamic::from(STOPPED_MESSAGE.to_string()))
                } else {
                    None
                }
            });
        }

        self.register_output(engine);
        self.register_session_api(engine);
        self.register_ui_api(engine);
        self.register_sleep(engine, Duration::from_millis(config.max_sleep_ms));
    }

    fn register_output(&self, engine: &mut Engine) {
        {
            let out = self.output.clone();
            engine.on_print(move |text: &str| {
                out.write(StreamKind::Stdout, &format!("{}\n", text));
            });
        }
        {
            let out = self.output.clone();
            engine.on_debug(move |text: &str, source: Option<&str>, pos: Position| {
                let line = match (source, pos.line()) {
                    (Some(src), Some(line)) => format!("debug @ {}:{}: {}\n", src, line, text),
                    (None, Some(line)) => format!("debug @ {}: {}\n", line, text),
                    _ => format!("debug: {}\n", text),
                };
                out.write(StreamKind::Stderr, &line);
            });
        }
        {
            let out = self.output.clone();
            engine.register_fn("eprint", move |text: &str| {
                out.write(StreamKind::Stderr, &format!("{}\n", text));
            });
        }
    }

    fn register_session_api(&self, engine: &mut Engine) {
        engine
            .register_type_with_name::<ChannelRef>("Channel")
            .register_get("device", |c: &mut ChannelRef| c.device.to_string())
            .register_get("name", |c: &mut ChannelRef| c.channel.clone())
            .register_fn("to_string", |c: &mut ChannelRef| c.to_string());
        engine
            .register_type_with_name::<SignalRef>("Signal")
            .register_get("device", |s: &mut SignalRef| s.device.to_string())
            .register_get("channel", |s: &mut SignalRef| s.channel.clone())
            .register_get("name", |s: &mut SignalRef| s.signal.clone())
            .register_fn("to_string", |s: &mut SignalRef| s.to_string());
        engine
            .register_type_with_name::<ConfigurableRef>("Configurable")
            .register_get("device", |c: &mut ConfigurableRef| c.device.to_string())
            .register_get("name", |c: &mut ConfigurableRef| c.configurable.clone())
            .register_fn("to_string", |c: &mut ConfigurableRef| c.to_string());

        {
            let session = self.session.clone();
            engine.register_fn("devices", move || -> Array {
                session
                    .read()
                    .device_ids()
                    .into_iter()
                    .map(|id| Dynamic::from(id.to_string()))
                    .collect()
            });
        }
        {
            let session = self.session.clone();
            engine.register_fn("device_name", move |device: &str| -> RhaiResult<String> {
                let registry = session.read();
                let dev = registry
                    .require_device(&DeviceId::new(device))
                    .map_err(to_rhai)?;
                Ok(dev.display_name())
            });
        }
        {
            let session = self.session.clone();
            engine.register_fn("channels", move |device: &str| -> RhaiResult<Array> {
                let registry = session.read();
                let dev = registry
                    .require_device(&DeviceId::new(device))
                    .map_err(to_rhai)?;
                Ok(dev.channels.keys().cloned().map(Dynamic::from).collect())
            });
        }
        {
            let session = self.session.clone();
            engine.register_fn(
                "signals",
                move |device: &str, channel: &str| -> RhaiResult<Array> {
                    let registry = session.read();
                    let reference = registry
                        .channel_ref(&DeviceId::new(device), channel)
                        .map_err(to_rhai)?;
                    Ok(registry
                        .resolve_channel(&reference)
                        .map(|ch| ch.signals.keys().cloned().map(Dynamic::from).collect())
                        .unwrap_or_default())
                },
            );
        }
        {
            let session = self.session.clone();
            engine.register_fn("configurables", move |device: &str| -> RhaiResult<Array> {
                let registry = session.read();
                let dev = registry
                    .require_device(&DeviceId::new(device))
                    .map_err(to_rhai)?;
                Ok(dev.configurables.keys().cloned().map(Dynamic::from).collect())
            });
        }

        {
            let session = self.session.clone();
            engine.register_fn(
                "channel",
                move |device: &str, channel: &str| -> RhaiResult<ChannelRef> {
                    session
                        .read()
                        .channel_ref(&DeviceId::new(device), channel)
                        .map_err(to_rhai)
                },
            );
        }
        {
            let session = self.session.clone();
            engine.register_fn(
                "signal",
                move |device: &str, channel: &str, signal: &str| -> RhaiResult<SignalRef> {
                    session
                        .read()
                        .signal_ref(&DeviceId::new(device), channel, signal)
                        .map_err(to_rhai)
                },
            );
        }
        {
            let session = self.session.clone();
            engine.register_fn(
                "configurable",
                move |device: &str, name: &str| -> RhaiResult<ConfigurableRef> {
                    session
                        .read()
                        .configurable_ref(&DeviceId::new(device), name)
                        .map_err(to_rhai)
                },
            );
        }
    }

    fn register_ui_api(&self, engine: &mut Engine) {
        // ===== Blocking view requests =====
        {
            let api = self.clone();
            engine.register_fn(
                "ui_add_data_view",
                move |device: &str, area: &str, signal: SignalRef| {
                    api.add_view(device, area, ViewContent::Data { signal })
                },
            );
        }
        {
            let api = self.clone();
            engine.register_fn(
                "ui_add_control_view",
                move |device: &str, area: &str, configurable: ConfigurableRef| {
                    api.add_view(device, area, ViewContent::Control { configurable })
                },
            );
        }
        {
            let api = self.clone();
            engine.register_fn(
                "ui_add_plot_view",
                move |device: &str, area: &str, channel: ChannelRef| {
                    api.add_view(device, area, ViewContent::ChannelPlot { channel })
                },
            );
        }
        {
            let api = self.clone();
            engine.register_fn(
                "ui_add_plot_view",
                move |device: &str, area: &str, signal: SignalRef| {
                    api.add_view(device, area, ViewContent::SignalPlot { signal })
                },
            );
        }
        {
            let api = self.clone();
            engine.register_fn(
                "ui_add_plot_view",
                move |device: &str, area: &str, x: SignalRef, y: SignalRef| {
                    api.add_view(device, area, ViewContent::XyPlot { x, y })
                },
            );
        }
        {
            let api = self.clone();
            engine.register_fn(
                "ui_add_power_panel_view",
                move |device: &str, area: &str, voltage: SignalRef, current: SignalRef| {
                    api.add_view(device, area, ViewContent::PowerPanel { voltage, current })
                },
            );
        }
        {
            let api = self.clone();
            engine.register_fn(
                "ui_add_value_panel_view",
                move |device: &str, area: &str, channel: ChannelRef| {
                    api.add_view(device, area, ViewContent::ChannelValuePanel { channel })
                },
            );
        }
        {
            let api = self.clone();
            engine.register_fn(
                "ui_add_value_panel_view",
                move |device: &str, area: &str, signal: SignalRef| {
                    api.add_view(device, area, ViewContent::SignalValuePanel { signal })
                },
            );
        }

        // ===== Fire-and-forget requests =====
        {
            let api = self.clone();
            engine.register_fn("ui_add_device_tab", move |device: &str| -> RhaiResult<()> {
                let device = api.existing_device(device)?;
                api.proxy.request_device_tab(&device).map_err(to_rhai)
            });
        }
        {
            let api = self.clone();
            engine.register_fn(
                "ui_add_signal_to_data_view",
                move |device: &str, view_id: &str, signal: SignalRef| {
                    api.attach(device, view_id, Attachment::DataSignal(signal))
                },
            );
        }
        {
            let api = self.clone();
            engine.register_fn(
                "ui_add_signal_to_plot_view",
                move |device: &str, view_id: &str, signal: SignalRef| {
                    api.attach(device, view_id, Attachment::PlotSignal(signal))
                },
            );
        }
        {
            let api = self.clone();
            engine.register_fn(
                "ui_add_signals_to_xy_plot_view",
                move |device: &str, view_id: &str, x: SignalRef, y: SignalRef| {
                    api.attach(device, view_id, Attachment::XyCurve { x, y })
                },
            );
        }

        // ===== Timeout =====
        {
            let proxy = self.proxy.clone();
            engine.register_fn("ui_set_timeout", move |ms: i64| {
                let timeout = if ms <= 0 {
                    None
                } else {
                    Some(Duration::from_millis(ms as u64))
                };
                proxy.set_timeout(timeout);
            });
        }
        {
            let proxy = self.proxy.clone();
            engine.register_fn("ui_timeout", move || -> i64 {
                proxy
                    .timeout()
                    .map(|t| i64::try_from(t.as_millis()).unwrap_or(i64::MAX))
                    .unwrap_or(0)
            });
        }
    }

    fn register_sleep(&self, engine: &mut Engine, max_sleep: Duration) {
        let cancel = self.cancel.clone();
        engine.register_fn("sleep", move |ms: i64| -> RhaiResult<()> {
            if ms <= 0 {
                return Ok(());
            }
            let deadline = Instant::now() + Duration::from_millis(ms as u64).min(max_sleep);
            loop {
                if cancel.load(Ordering::Acquire) {
                    return Err(STOPPED_MESSAGE.into());
                }
                let now = Instant::now();
                if now >= deadline {
                    return Ok(());
                }
                std::thread::sleep(SLEEP_SLICE.min(deadline - now));
            }
        });
    }

    fn parse_area(&self, area: &str) -> RhaiResult<DockArea> {
        if area.is_empty() {
            return Ok(self.default_area);
        }
        area.parse::<DockArea>().map_err(|e| e.into())
    }

    fn existing_device(&self, device: &str) -> RhaiResult<DeviceId> {
        let id = DeviceId::new(device);
        if !self.session.contains_device(&id) {
            return Err(format!("Unknown device '{}'", device).into());
        }
        Ok(id)
    }

    fn add_view(&self, device: &str, area: &str, content: ViewContent) -> RhaiResult<String> {
        let device = self.existing_device(device)?;
        let area = self.parse_area(area)?;
        self.proxy
            .request_view(&device, area, content)
            .map(ViewHandle::into_string)
            .map_err(to_rhai)
    }

    fn attach(&self, device: &str, view_id: &str, attachment: Attachment) -> RhaiResult<()> {
        let device = self.existing_device(device)?;
        if view_id.is_empty() {
            return Err("Cannot add signals to a view that was never created".into());
        }
        self.proxy
            .request_attach(&device, &ViewHandle::new(view_id), attachment)
            .map_err(to_rhai)
    }
}

impl std::fmt::Debug for ScriptApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptApi")
            .field("default_area", &self.default_area)
            .field("stop_requested", &self.stop_requested())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UiConfig;
    use crate::scripting::redirect::{OutputSink, ScriptMessage, StreamRedirect};
    use crate::ui::{self, UiAction, UiEventQueue};

    fn setup() -> (ScriptApi, UiEventQueue) {
        let (proxy, queue) = ui::channel(&UiConfig::default());
        (ScriptApi::new(Arc::new(proxy), Session::demo()), queue)
    }

    #[test]
    fn test_session_queries() {
        let (api, _queue) = setup();
        let engine = api.build_engine(&ScriptConfig::default());

        let devices = engine.eval::<Array>("devices()").unwrap();
        assert_eq!(devices.len(), 3);

        let signals = engine.eval::<Array>(r#"signals("psu", "CH1")"#).unwrap();
        let names: Vec<String> = signals.into_iter().map(|s| s.to_string()).collect();
        assert_eq!(names, vec!["I", "P", "V"]);

        let name = engine.eval::<String>(r#"signal("psu", "CH2", "V").name"#).unwrap();
        assert_eq!(name, "V");
    }

    #[test]
    fn test_reference_constructors_fail_on_missing_entities() {
        let (api, _queue) = setup();
        let engine = api.build_engine(&ScriptConfig::default());

        assert!(engine.eval::<SignalRef>(r#"signal("psu", "CH1", "V")"#).is_ok());
        let err = engine
            .eval::<SignalRef>(r#"signal("psu", "CH9", "V")"#)
            .unwrap_err();
        assert!(err.to_string().contains("CH9"));
        assert!(engine.eval::<ChannelRef>(r#"channel("scope", "CH1")"#).is_err());
        assert!(engine
            .eval::<ConfigurableRef>(r#"configurable("dmm", "P9")"#)
            .is_err());
    }

    #[test]
    fn test_device_tab_is_queued() {
        let (api, queue) = setup();
        let engine = api.build_engine(&ScriptConfig::default());

        engine.run(r#"ui_add_device_tab("load");"#).unwrap();

        let request = queue.try_recv().unwrap();
        assert_eq!(request.device_id(), &DeviceId::new("load"));
        assert!(matches!(request.action(), UiAction::AddDeviceTab));
    }

    #[test]
    fn test_unknown_device_is_rejected_before_posting() {
        let (api, queue) = setup();
        let engine = api.build_engine(&ScriptConfig::default());

        assert!(engine.run(r#"ui_add_device_tab("scope");"#).is_err());
        assert!(queue.is_empty());
    }

    #[test]
    fn test_blocking_view_times_out_without_gui() {
        let (api, queue) = setup();
        let engine = api.build_engine(&ScriptConfig::default());

        let id = engine
            .eval::<String>(
                r#"
ui_set_timeout(5);
ui_add_plot_view("psu", "left", signal("psu", "CH1", "V"))
"#,
            )
            .unwrap();

        assert_eq!(id, "");
        assert_eq!(api.proxy().timeout(), Some(Duration::from_millis(5)));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_ui_timeout_saturates() {
        let (api, _queue) = setup();
        let engine = api.build_engine(&ScriptConfig::default());

        assert_eq!(engine.eval::<i64>("ui_timeout()").unwrap(), 0);
        api.proxy().set_timeout(Some(Duration::MAX));
        assert_eq!(engine.eval::<i64>("ui_timeout()").unwrap(), i64::MAX);

        engine.run("ui_set_timeout(1500);").unwrap();
        assert_eq!(engine.eval::<i64>("ui_timeout()").unwrap(), 1500);
    }

    #[test]
    fn test_invalid_area() {
        let (api, queue) = setup();
        let engine = api.build_engine(&ScriptConfig::default());

        let result = engine.eval::<String>(r#"ui_add_plot_view("psu", "middle", channel("psu", "CH1"))"#);
        assert!(result.is_err());
        assert!(queue.is_empty());
    }

    #[test]
    fn test_attach_to_empty_view_id_is_rejected() {
        let (api, queue) = setup();
        let engine = api.build_engine(&ScriptConfig::default());

        let result = engine.run(r#"ui_add_signal_to_plot_view("psu", "", signal("psu", "CH1", "I"));"#);
        assert!(result.is_err());
        assert!(queue.is_empty());
    }

    #[test]
    fn test_print_is_redirected() {
        let (api, _queue) = setup();
        let engine = api.build_engine(&ScriptConfig::default());
        let (tx, rx) = crossbeam_channel::unbounded();

        {
            let _redirect = StreamRedirect::install(api.output(), OutputSink::new(tx));
            engine.run(r#"print("hello"); eprint("careful");"#).unwrap();
        }

        let outputs: Vec<(StreamKind, String)> = rx
            .try_iter()
            .filter_map(|m| match m {
                ScriptMessage::Output { stream, text, .. } => Some((stream, text)),
                _ => None,
            })
            .collect();
        assert_eq!(
            outputs,
            vec![
                (StreamKind::Stdout, "hello\n".to_string()),
                (StreamKind::Stderr, "careful\n".to_string()),
            ]
        );
    }

    #[test]
    fn test_stop_interrupts_sleep() {
        let (api, _queue) = setup();
        let engine = api.build_engine(&ScriptConfig::default());

        let stopper = api.clone();
        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(50));
            stopper.request_stop();
        });

        let started = Instant::now();
        assert!(engine.run("sleep(5000);").is_err());
        assert!(started.elapsed() < Duration::from_secs(2));
        handle.join().unwrap();
    }

    #[test]
    fn test_stop_before_run_terminates() {
        let (api, _queue) = setup();
        let engine = api.build_engine(&ScriptConfig::default());

        api.request_stop();
        assert!(engine.run("let x = 1; x += 1;").is_err());
        api.clear_stop();
        assert!(engine.run("let x = 1; x += 1;").is_ok());
    }

    #[test]
    fn test_operation_limit() {
        let (api, _queue) = setup();
        let config = ScriptConfig {
            max_operations: 1_000,
            ..Default::default()
        };
        let engine = api.build_engine(&config);

        assert!(engine.run("let x = 0; loop { x += 1; }").is_err());
    }
}
