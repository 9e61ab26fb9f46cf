//! Frame scheduling: when to render the next frame.
//!
//! Rendering itself is synchronous and single-threaded. What arrives from
//! other threads is only a wish for a new frame. The scheduler folds any
//! number of such wishes into one, so frames are coalesced and never
//! interleaved. An optional ticker thread adds a steady cadence for
//! animations.

use crate::config::RenderConfig;
use crossbeam_channel::{bounded, never, select, Receiver, Sender};
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// A tick event sent at regular intervals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    /// Tick number (monotonically increasing).
    pub frame: u64,
    /// Time elapsed since the ticker was started.
    pub elapsed: Duration,
}

/// Why [`FrameScheduler::wait`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wake {
    /// Someone called [`RedrawHandle::request`].
    Redraw,
    /// The ticker fired and no redraw was pending.
    Tick(Tick),
}

/// Cloneable, thread-safe way to ask for a new frame.
#[derive(Debug, Clone)]
pub struct RedrawHandle {
    tx: Sender<()>,
}

impl RedrawHandle {
    /// Ask for a frame. Never blocks; requests made before the next frame
    /// starts are merged into one.
    pub fn request(&self) {
        // Full means a redraw is already pending.
        let _ = self.tx.try_send(());
    }
}

/// Waits for the next reason to render.
pub struct FrameScheduler {
    redraw_tx: Sender<()>,
    redraw_rx: Receiver<()>,
    ticker: Option<Ticker>,
}

impl FrameScheduler {
    /// A scheduler that only wakes on redraw requests.
    pub fn new() -> Self {
        let (redraw_tx, redraw_rx) = bounded(1);
        Self {
            redraw_tx,
            redraw_rx,
            ticker: None,
        }
    }

    /// A scheduler that also ticks at `config.target_fps`, or none when the
    /// target is zero.
    ///
    /// # Errors
    ///
    /// Returns an error if the ticker thread cannot be spawned.
    pub fn from_config(config: &RenderConfig) -> io::Result<Self> {
        let mut scheduler = Self::new();
        if let Some(interval) = config.frame_interval() {
            scheduler.ticker = Some(Ticker::spawn(interval)?);
        }
        Ok(scheduler)
    }

    /// A handle other threads can use to request frames.
    pub fn handle(&self) -> RedrawHandle {
        RedrawHandle {
            tx: self.redraw_tx.clone(),
        }
    }

    /// Block until a frame is due or `timeout` passes.
    ///
    /// Everything pending when this returns is consumed, so one wake
    /// accounts for all requests and ticks that piled up meanwhile.
    pub fn wait(&self, timeout: Duration) -> Option<Wake> {
        let ticks = self.ticker.as_ref().map_or_else(never, |t| t.rx.clone());

        let woke = select! {
            recv(self.redraw_rx) -> msg => msg.ok().map(|()| Wake::Redraw),
            recv(ticks) -> tick => tick.ok().map(Wake::Tick),
            default(timeout) => None,
        };
        let mut latest = woke?;

        let redraw_pending = self.redraw_rx.try_recv().is_ok();
        while let Ok(tick) = ticks.try_recv() {
            if latest != Wake::Redraw {
                latest = Wake::Tick(tick);
            }
        }
        if redraw_pending {
            latest = Wake::Redraw;
        }
        Some(latest)
    }
}

impl Default for FrameScheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// Dedicated thread sending [`Tick`]s at a fixed interval.
struct Ticker {
    handle: Option<JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
    rx: Receiver<Tick>,
}

impl Ticker {
    fn spawn(interval: Duration) -> io::Result<Self> {
        let shutdown = Arc::new(AtomicBool::new(false));
        let flag = shutdown.clone();

        // Ticks never queue up behind a slow consumer.
        let (tx, rx) = bounded(2);

        let handle = thread::Builder::new()
            .name("weft-ticker".to_string())
            .spawn(move || run_ticker(&tx, &flag, interval))?;

        Ok(Self {
            handle: Some(handle),
            shutdown,
            rx,
        })
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn run_ticker(tx: &Sender<Tick>, shutdown: &AtomicBool, interval: Duration) {
    let start = Instant::now();
    let mut frame = 0u64;
    let mut next_tick = start + interval;

    while !shutdown.load(Ordering::Relaxed) {
        let now = Instant::now();
        if now < next_tick {
            // Short sleeps keep shutdown responsive.
            thread::sleep((next_tick - now).min(Duration::from_millis(1)));
            continue;
        }

        let _ = tx.try_send(Tick {
            frame,
            elapsed: now - start,
        });
        frame += 1;
        next_tick += interval;

        // Behind schedule: skip ahead instead of bursting.
        if next_tick < now {
            next_tick = now + interval;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requests_coalesce() {
        let scheduler = FrameScheduler::new();
        let handle = scheduler.handle();
        for _ in 0..10 {
            handle.request();
        }

        assert_eq!(scheduler.wait(Duration::from_millis(10)), Some(Wake::Redraw));
        assert_eq!(scheduler.wait(Duration::from_millis(10)), None);
    }

    #[test]
    fn test_request_from_another_thread() {
        let scheduler = FrameScheduler::new();
        let handle = scheduler.handle();
        let worker = thread::spawn(move || handle.request());
        worker.join().unwrap();

        assert_eq!(scheduler.wait(Duration::from_secs(1)), Some(Wake::Redraw));
    }

    #[test]
    fn test_timeout_without_ticker() {
        let scheduler = FrameScheduler::new();
        let started = Instant::now();
        assert_eq!(scheduler.wait(Duration::from_millis(20)), None);
        assert!(started.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn test_ticker_wakes() {
        let config = RenderConfig::default().with_target_fps(100);
        let scheduler = FrameScheduler::from_config(&config).unwrap();

        match scheduler.wait(Duration::from_secs(1)) {
            Some(Wake::Tick(tick)) => assert!(tick.elapsed >= Duration::from_millis(10)),
            other => panic!("expected a tick, got {other:?}"),
        }
    }

    #[test]
    fn test_redraw_wins_over_tick() {
        let config = RenderConfig::default().with_target_fps(1000);
        let scheduler = FrameScheduler::from_config(&config).unwrap();
        thread::sleep(Duration::from_millis(20));
        scheduler.handle().request();

        assert_eq!(scheduler.wait(Duration::from_secs(1)), Some(Wake::Redraw));
    }

    #[test]
    fn test_zero_fps_has_no_ticker() {
        let config = RenderConfig::default().with_target_fps(0);
        let scheduler = FrameScheduler::from_config(&config).unwrap();
        assert_eq!(scheduler.wait(Duration::from_millis(5)), None);
    }
}
