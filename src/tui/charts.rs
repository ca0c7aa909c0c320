use crate::render::{AnalyticsView, Curve, EquityView};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Color,
    style::Style,
    symbols,
    text::{Line, Span},
    widgets::{Axis, Bar, BarChart, BarGroup, Block, Borders, Chart, Dataset, GraphType, Paragraph},
    Frame,
};

/// Overlay colours, portfolio first.
const SERIES_COLORS: [Color; 5] = [
    Color::Green,
    Color::Cyan,
    Color::Magenta,
    Color::Yellow,
    Color::Blue,
];

pub struct ChartRenderParams<'a> {
    pub area: Rect,
    pub curves: Vec<&'a Curve>,
    pub title: Line<'a>,
    pub x_labels: [String; 2],
    pub y_format: fn(f64) -> String,
}

/// (min, max) over every point's y, or `None` when there are no points.
fn y_bounds(curves: &[&Curve]) -> Option<(f64, f64)> {
    curves
        .iter()
        .flat_map(|c| c.points.iter().map(|(_, y)| *y))
        .filter(|y| y.is_finite())
        .fold(None, |acc, y| match acc {
            None => Some((y, y)),
            Some((lo, hi)) => Some((lo.min(y), hi.max(y))),
        })
}

fn x_max(curves: &[&Curve]) -> f64 {
    curves
        .iter()
        .filter_map(|c| c.points.last().map(|(x, _)| *x))
        .fold(0.0_f64, f64::max)
}

/// Line chart with a colour legend in the title row.
pub fn render_line_chart(f: &mut Frame, params: ChartRenderParams) {
    let Some((lo, hi)) = y_bounds(&params.curves) else {
        let empty = Paragraph::new("No data.")
            .block(Block::default().borders(Borders::ALL).title(params.title));
        f.render_widget(empty, params.area);
        return;
    };
    let pad = ((hi - lo) * 0.05).max(hi.abs() * 0.01).max(f64::EPSILON);
    let (lo, hi) = (lo - pad, hi + pad);

    let datasets: Vec<Dataset> = params
        .curves
        .iter()
        .enumerate()
        .map(|(i, c)| {
            Dataset::default()
                .name(c.name.as_str())
                .graph_type(GraphType::Line)
                .marker(symbols::Marker::Braille)
                .style(Style::default().fg(SERIES_COLORS[i % SERIES_COLORS.len()]))
                .data(&c.points)
        })
        .collect();

    let [first, last] = params.x_labels;
    let y_format = params.y_format;
    let chart = Chart::new(datasets)
        .block(Block::default().borders(Borders::ALL).title(params.title))
        .x_axis(
            Axis::default()
                .bounds([0.0, x_max(&params.curves).max(1.0)])
                .labels([Line::from(first), Line::from(last)]),
        )
        .y_axis(
            Axis::default()
                .bounds([lo, hi])
                .labels([Line::from(y_format(lo)), Line::from(y_format(hi))]),
        );
    f.render_widget(chart, params.area);
}

pub fn draw_equity(area: Rect, f: &mut Frame, view: &EquityView) {
    let mut curves = vec![&view.portfolio];
    curves.extend(view.benchmarks.iter());

    let mut legend = vec![Span::raw("Equity curve ")];
    for (i, c) in curves.iter().enumerate() {
        legend.push(Span::styled(
            format!("■ {} ", c.name),
            Style::default().fg(SERIES_COLORS[i % SERIES_COLORS.len()]),
        ));
    }

    render_line_chart(
        f,
        ChartRenderParams {
            area,
            curves,
            title: Line::from(legend),
            x_labels: [view.first_date.clone(), view.last_date.clone()],
            y_format: |v| format!("{v:.2}"),
        },
    );
}

pub fn draw_analytics(area: Rect, f: &mut Frame, view: &AnalyticsView) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(50),
            Constraint::Min(5),
            Constraint::Length(1),
        ])
        .split(area);

    draw_yearly(rows[0], f, &view.yearly);

    let first = rolling_label(view, true);
    let last = rolling_label(view, false);
    render_line_chart(
        f,
        ChartRenderParams {
            area: rows[1],
            curves: vec![&view.rolling_12m],
            title: Line::from("Rolling 12-month return"),
            x_labels: [first, last],
            y_format: |v| format!("{:.1}%", v * 100.0),
        },
    );

    let months = if view.months == 0 {
        Line::from("No monthly returns.")
    } else {
        Line::from(vec![
            Span::raw("Positive months: "),
            Span::styled(
                format!("{} of {}", view.positive_months, view.months),
                Style::default().fg(Color::Green),
            ),
        ])
    };
    f.render_widget(Paragraph::new(months), rows[2]);
}

fn rolling_label(view: &AnalyticsView, first: bool) -> String {
    let points = &view.rolling_12m.points;
    let p = if first { points.first() } else { points.last() };
    p.map(|(x, _)| format!("day {x:.0}")).unwrap_or_default()
}

/// Bars scale with |return|; colour carries the sign.
fn draw_yearly(area: Rect, f: &mut Frame, yearly: &[(String, f64)]) {
    let block = Block::default().borders(Borders::ALL).title("Yearly returns");
    if yearly.is_empty() {
        f.render_widget(Paragraph::new("No yearly returns.").block(block), area);
        return;
    }

    let bars: Vec<Bar> = yearly
        .iter()
        .map(|(year, r)| {
            let color = if *r < 0.0 { Color::Red } else { Color::Green };
            Bar::default()
                .value((r.abs() * 10_000.0).round() as u64)
                .text_value(format!("{:.1}%", r * 100.0))
                .label(Line::from(year.as_str()))
                .style(Style::default().fg(color))
        })
        .collect();

    let inner_width = area.width.saturating_sub(2) as usize;
    let bar_width = (inner_width / yearly.len().max(1)).saturating_sub(1).clamp(1, 8) as u16;
    let chart = BarChart::default()
        .block(block)
        .data(BarGroup::default().bars(&bars))
        .bar_width(bar_width)
        .bar_gap(1);
    f.render_widget(chart, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn y_bounds_skip_non_finite() {
        let a = Curve {
            name: "a".into(),
            points: vec![(0.0, 1.0), (1.0, f64::NAN), (2.0, 3.0)],
        };
        let b = Curve {
            name: "b".into(),
            points: vec![(0.0, 0.5)],
        };
        assert_eq!(y_bounds(&[&a, &b]), Some((0.5, 3.0)));
        assert_eq!(x_max(&[&a, &b]), 2.0);
        assert_eq!(y_bounds(&[]), None);
    }
}
