//! Benchmarks for UI request dispatch
//!
//! Compares the cost of queueing fire-and-forget requests with a full
//! blocking round-trip through a GUI thread.
//!
//! Run with: cargo bench

use benchview::config::UiConfig;
use benchview::error::Result;
use benchview::session::Session;
use benchview::types::{DeviceId, DockArea, SignalRef, ViewHandle};
use benchview::ui::{self, Attachment, UiHost, ViewContent, ViewFactory};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Factory that builds nothing, so only dispatch is measured
struct NullFactory {
    next: u64,
}

impl ViewFactory for NullFactory {
    fn create_view(&mut self, _: &DeviceId, _: DockArea, _: &ViewContent) -> Result<ViewHandle> {
        self.next += 1;
        Ok(ViewHandle::new(format!("view-{}", self.next)))
    }

    fn attach(&mut self, _: &ViewHandle, _: &Attachment) -> Result<()> {
        Ok(())
    }

    fn open_device_tab(&mut self, _: &DeviceId) -> Result<()> {
        Ok(())
    }
}

fn bench_fire_and_forget(c: &mut Criterion) {
    let mut group = c.benchmark_group("fire_and_forget");
    let device = DeviceId::new("psu");

    for batch in [1usize, 100, 1_000] {
        group.throughput(Throughput::Elements(batch as u64));
        group.bench_with_input(BenchmarkId::from_parameter(batch), &batch, |b, &batch| {
            let (proxy, queue) = ui::channel(&UiConfig::default());
            b.iter(|| {
                for _ in 0..batch {
                    proxy.request_device_tab(black_box(&device)).unwrap();
                }
                black_box(queue.drain());
            });
        });
    }

    group.finish();
}

fn bench_blocking_round_trip(c: &mut Criterion) {
    let running = Arc::new(AtomicBool::new(true));
    let (proxy_tx, proxy_rx) = crossbeam_channel::bounded(1);

    let gui_running = running.clone();
    let gui = std::thread::spawn(move || {
        let (proxy, queue) = ui::channel(&UiConfig::default());
        let mut host = UiHost::new(queue, Session::demo(), NullFactory { next: 0 });
        proxy_tx.send(Arc::new(proxy)).unwrap();
        while gui_running.load(Ordering::Relaxed) {
            host.process_for(Duration::from_millis(1));
        }
    });
    let proxy = proxy_rx.recv().unwrap();

    let device = DeviceId::new("psu");
    let content = ViewContent::SignalPlot {
        signal: SignalRef::new("psu", "CH1", "V"),
    };
    c.bench_function("blocking_round_trip", |b| {
        b.iter(|| {
            let handle = proxy
                .request_view(&device, DockArea::Right, black_box(content.clone()))
                .unwrap();
            black_box(handle)
        });
    });

    running.store(false, Ordering::Relaxed);
    gui.join().unwrap();
}

criterion_group!(benches, bench_fire_and_forget, bench_blocking_round_trip);
criterion_main!(benches);
