use ratatui::{
    layout::Rect,
    style::Color,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

fn keybind<'a>(keys: &'a str, pad: usize, action: &'a str) -> Line<'a> {
    Line::from(vec![
        Span::raw("  "),
        Span::styled(keys, Style::default().fg(Color::Magenta)),
        Span::raw(format!("{:pad$}{action}", "")),
    ])
}

pub fn draw_help(area: Rect, f: &mut Frame) {
    let p = Paragraph::new(vec![
        Line::from("Keybinds:"),
        Line::from(vec![
            Span::raw("  "),
            Span::styled("q", Style::default().fg(Color::Magenta)),
            Span::raw(" / "),
            Span::styled("Ctrl-C", Style::default().fg(Color::Magenta)),
            Span::raw("  Quit"),
        ]),
        keybind("enter", 7, "Run backtest"),
        keybind("c", 11, "Clear price cache"),
        keybind("e", 11, "Export equity curve as CSV"),
        keybind("y", 11, "Copy exported path to clipboard"),
        keybind("tab", 9, "Switch result tabs"),
        keybind("?", 11, "Toggle this help"),
        Line::from(""),
        Line::from("Form:"),
        Line::from(vec![
            Span::raw("  "),
            Span::styled("↑/↓", Style::default().fg(Color::Magenta)),
            Span::raw(" or "),
            Span::styled("j/k", Style::default().fg(Color::Magenta)),
            Span::raw("  Move between fields"),
        ]),
        keybind("←/→", 9, "Change fund, currency, rebalance or benchmark cursor"),
        keybind("space", 7, "Toggle fee or the benchmark under the cursor"),
        keybind("0-9 . -", 5, "Type into date and number fields"),
        keybind("backspace", 3, "Delete last character"),
        Line::from(""),
        Line::from("At most 3 benchmarks can be selected at once."),
    ])
    .block(Block::default().borders(Borders::ALL).title("Help"));
    f.render_widget(p, area);
}
