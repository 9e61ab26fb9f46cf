//! Smoke test: render two frames headlessly and show what reached the screen.

use weft::terminal::{AnsiBackend, TestBackend};
use weft::{
    Buffer, Constraint, Flow, Margin, PaintError, Rect, Rgb, Size, Style, Terminal, View,
};

fn label(text: String, style: Style) -> impl Fn(Rect, &mut Buffer) -> Result<(), PaintError> {
    move |area: Rect, buf: &mut Buffer| {
        buf.fill_rect(area, weft::Cell::EMPTY.with_style(style));
        buf.set_span(area.x, area.y, &text, style);
        Ok(())
    }
}

fn build_view(count: u32) -> View<'static> {
    let mut view = View::new(Flow::vertical().with_margin(Margin::uniform(1)));
    let root = view.root();
    let header = Style::DEFAULT.fg(Rgb::new(255, 255, 255)).bg(Rgb::new(40, 80, 120));
    view.add_widget(root, Constraint::Length(1), label("Weft Smoke Test".into(), header));

    let row = view.add_container(root, Constraint::Fill(1), Flow::horizontal().with_spacing(2));
    view.add_widget(row, Constraint::Percentage(50), label(format!("count: {count}"), Style::DEFAULT));
    view.add_widget(row, Constraint::Fill(1), label("日本語 wide text".into(), Style::DEFAULT));
    view
}

fn main() -> Result<(), weft::RenderError> {
    println!("Weft Smoke Test");
    println!("===============");
    println!();
    println!("Cell size: {} bytes", std::mem::size_of::<weft::Cell>());
    println!("Rgb size:  {} bytes", std::mem::size_of::<Rgb>());
    println!();

    let mut terminal = Terminal::new(TestBackend::new(40, 5));
    for count in [1, 2] {
        let stats = terminal.draw(&build_view(count))?;
        println!(
            "frame {}: {} cells in {} runs (full repaint: {})",
            stats.frame, stats.cells_changed, stats.runs, stats.full_repaint
        );
    }
    println!();
    for y in 0..5 {
        println!("|{}|", terminal.backend().line(y));
    }
    println!();

    // Same frames through the ANSI encoder.
    let backend = AnsiBackend::new(Vec::new()).with_size(Size::new(40, 5));
    let mut terminal = Terminal::new(backend);
    terminal.draw(&build_view(1))?;
    let first = terminal.backend().writer().len();
    terminal.draw(&build_view(2))?;
    let second = terminal.backend().writer().len() - first;
    println!("ANSI bytes: {first} for the first frame, {second} for the update");

    Ok(())
}
