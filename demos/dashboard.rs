//! Dashboard demo: a live-updating screen driven by the frame scheduler.
//!
//! A background thread produces samples and requests redraws; a ticker
//! animates the spinner. Runs for ten seconds, then restores the terminal.
//!
//! Logs go to stderr; run with `RUST_LOG=weft=trace 2>weft.log` to see
//! per-frame statistics.

use std::cell::{Cell as StdCell, RefCell};
use std::collections::VecDeque;
use std::io;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, Sender};
use tracing_subscriber::EnvFilter;
use weft::render::Wake;
use weft::terminal::{AnsiBackend, TerminalGuard};
use weft::widget::Widget;
use weft::{
    Buffer, Cell, Constraint, Flow, FrameScheduler, Margin, Modifiers, PaintError, Rect,
    RenderConfig, Rgb, Style, Terminal, View,
};

const RUN_FOR: Duration = Duration::from_secs(10);
const SPINNER: [&str; 4] = ["◐", "◓", "◑", "◒"];

/// One-line title bar with a spinner.
struct Header<'a> {
    frame: &'a StdCell<u64>,
}

impl Widget for Header<'_> {
    fn paint(&self, area: Rect, buffer: &mut Buffer) -> Result<(), PaintError> {
        let style = Style::DEFAULT
            .fg(Rgb::new(255, 255, 255))
            .bg(Rgb::new(40, 80, 120))
            .modifiers(Modifiers::BOLD);
        buffer.fill_rect(area, Cell::EMPTY.with_style(style));
        let spinner = SPINNER[usize::try_from(self.frame.get() % 4).unwrap_or(0)];
        let end = buffer.set_span(area.x + 1, area.y, spinner, style);
        buffer.set_span(end + 1, area.y, "Weft Dashboard", style);
        Ok(())
    }
}

/// Horizontal gauge filled to `value` percent.
struct Gauge<'a> {
    label: &'static str,
    value: &'a StdCell<u16>,
    color: Rgb,
}

impl Widget for Gauge<'_> {
    fn paint(&self, area: Rect, buffer: &mut Buffer) -> Result<(), PaintError> {
        let value = self.value.get();
        if value > 100 {
            return Err(format!("{} out of range: {value}", self.label).into());
        }

        let text = format!("{:<6}{value:>3}% ", self.label);
        let end = buffer.set_span(area.x, area.y, &text, Style::DEFAULT);
        let bar = Rect::new(end, area.y, area.right().saturating_sub(end), 1).intersection(&area);
        let filled = u32::from(bar.width) * u32::from(value) / 100;
        let filled = u16::try_from(filled).unwrap_or(bar.width);

        buffer.fill_rect(
            Rect::new(bar.x, bar.y, filled, 1),
            Cell::from_char('█').with_fg(self.color),
        );
        buffer.fill_rect(
            Rect::new(bar.x + filled, bar.y, bar.width - filled, 1),
            Cell::from_char('░').with_fg(Rgb::new(80, 80, 80)),
        );
        Ok(())
    }
}

/// Most recent log lines, newest at the bottom.
struct LogPanel<'a> {
    lines: &'a RefCell<VecDeque<String>>,
}

impl Widget for LogPanel<'_> {
    fn paint(&self, area: Rect, buffer: &mut Buffer) -> Result<(), PaintError> {
        let lines = self.lines.borrow();
        let shown = lines.len().min(usize::from(area.height));
        let style = Style::DEFAULT.fg(Rgb::new(180, 180, 180));
        for (line, y) in lines.iter().skip(lines.len() - shown).zip(area.y..) {
            buffer.set_span(area.x, y, line, style);
        }
        Ok(())
    }
}

/// A reading produced by the sampler thread.
struct Sample {
    cpu: u16,
    memory: u16,
    message: String,
}

fn spawn_sampler(redraw: weft::RedrawHandle, tx: Sender<Sample>) -> io::Result<()> {
    thread::Builder::new()
        .name("sampler".to_string())
        .spawn(move || {
            let mut n: u16 = 0;
            loop {
                n = (n + 1) % 1000;
                let sample = Sample {
                    cpu: (n * 37) % 101,
                    memory: 40 + (n * 7) % 40,
                    message: format!("sample #{n}: 日本語 ok"),
                };
                if tx.send(sample).is_err() {
                    break;
                }
                redraw.request();
                thread::sleep(Duration::from_millis(250));
            }
        })?;
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let config = RenderConfig::default().with_target_fps(10);
    let scheduler = FrameScheduler::from_config(&config)?;
    let (tx, rx) = unbounded();
    spawn_sampler(scheduler.handle(), tx)?;

    let frame = StdCell::new(0u64);
    let cpu = StdCell::new(0u16);
    let memory = StdCell::new(0u16);
    let log = RefCell::new(VecDeque::new());

    let mut view = View::new(Flow::vertical().with_spacing(1));
    let root = view.root();
    view.add_widget(root, Constraint::Length(1), Header { frame: &frame });
    let body = view.add_container(
        root,
        Constraint::Fill(1),
        Flow::horizontal().with_spacing(2).with_margin(Margin::symmetric(0, 1)),
    );
    let gauges = view.add_container(body, Constraint::Percentage(40), Flow::vertical());
    view.add_widget(gauges, Constraint::Length(1), Gauge {
        label: "cpu",
        value: &cpu,
        color: Rgb::new(80, 200, 120),
    });
    view.add_widget(gauges, Constraint::Length(1), Gauge {
        label: "mem",
        value: &memory,
        color: Rgb::new(90, 150, 230),
    });
    view.add_widget(body, Constraint::Fill(1), LogPanel { lines: &log });

    let guard = TerminalGuard::enter(&config)?;
    let mut terminal = Terminal::new(AnsiBackend::with_config(io::stdout(), &config));
    terminal.draw(&view)?;

    let started = Instant::now();
    while started.elapsed() < RUN_FOR {
        match scheduler.wait(Duration::from_millis(500)) {
            Some(Wake::Tick(_)) => frame.set(frame.get() + 1),
            Some(Wake::Redraw) => {
                for sample in rx.try_iter() {
                    cpu.set(sample.cpu);
                    memory.set(sample.memory);
                    let mut lines = log.borrow_mut();
                    lines.push_back(sample.message);
                    if lines.len() > 200 {
                        lines.pop_front();
                    }
                }
            }
            None => continue,
        }
        terminal.draw(&view)?;
    }

    let stats = terminal.stats().clone();
    drop(terminal);
    drop(guard);
    tracing::info!(
        frames = stats.frames,
        cells_changed = stats.cells_changed,
        avg_render_us = stats.avg_render_us,
        "dashboard finished"
    );
    Ok(())
}
