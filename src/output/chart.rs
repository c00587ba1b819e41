use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::symbols;
use ratatui::text::Line;
use ratatui::widgets::{
    Axis, Bar, BarChart, BarGroup, Block, Borders, Chart, Dataset, GraphType, Widget,
};

use crate::forecast::Projection;
use crate::portfolio::AllocationSlice;
use crate::trend::TrendTable;

const MIN_WIDTH: u16 = 48;
const MIN_HEIGHT: u16 = 12;
const SERIES_COLORS: &[Color] = &[
    Color::Cyan,
    Color::Yellow,
    Color::Magenta,
    Color::Green,
    Color::Blue,
    Color::Red,
];

/// Render every column of a trend table as one line per coin.
pub fn render_trend_chart(
    table: &TrendTable,
    title: &str,
    currency: &str,
    width: u16,
    height: u16,
) -> String {
    if table.is_empty() {
        return String::new();
    }

    let series: Vec<(String, Vec<(f64, f64)>)> = table
        .columns
        .iter()
        .enumerate()
        .map(|(idx, name)| (name.clone(), table.column_points(idx)))
        .collect();

    let datasets: Vec<Dataset> = series
        .iter()
        .enumerate()
        .map(|(idx, (name, points))| {
            let color = SERIES_COLORS[idx % SERIES_COLORS.len()];
            Dataset::default()
                .name(name.clone())
                .graph_type(GraphType::Line)
                .marker(symbols::Marker::Braille)
                .style(Style::default().fg(color))
                .data(points)
        })
        .collect();

    let all_points: Vec<(f64, f64)> = series.iter().flat_map(|(_, p)| p.iter().copied()).collect();
    let first_label = table
        .rows
        .first()
        .map(|r| r.date.format("%Y-%m-%d").to_string())
        .unwrap_or_default();
    let last_label = table
        .rows
        .last()
        .map(|r| r.date.format("%Y-%m-%d").to_string())
        .unwrap_or_default();

    render_lines(
        datasets,
        title,
        currency,
        (table.rows.len().saturating_sub(1) as f64).max(1.0),
        y_bounds(&all_points),
        [first_label, last_label],
        (width, height),
    )
}

/// Render observed prices, the fitted line, and the forecast on one axis.
pub fn render_projection_chart(
    projection: &Projection,
    title: &str,
    currency: &str,
    width: u16,
    height: u16,
) -> String {
    let actual: Vec<(f64, f64)> = projection
        .fitted
        .iter()
        .map(|p| (p.day_index as f64, p.actual))
        .collect();
    let fitted: Vec<(f64, f64)> = projection
        .fitted
        .iter()
        .map(|p| (p.day_index as f64, p.fitted))
        .collect();
    let forecast: Vec<(f64, f64)> = projection
        .forecast
        .iter()
        .map(|p| (p.day_index as f64, p.price))
        .collect();

    if actual.is_empty() {
        return String::new();
    }

    let all_points: Vec<(f64, f64)> = actual
        .iter()
        .chain(fitted.iter())
        .chain(forecast.iter())
        .copied()
        .collect();
    let x_max = all_points.iter().map(|(x, _)| *x).fold(1.0, f64::max);

    let first_label = projection
        .fitted
        .first()
        .map(|p| p.timestamp.format("%Y-%m-%d").to_string())
        .unwrap_or_default();
    let last_label = projection
        .forecast
        .last()
        .map(|p| p.timestamp.format("%Y-%m-%d").to_string())
        .unwrap_or_default();

    let datasets = vec![
        Dataset::default()
            .name("price")
            .graph_type(GraphType::Line)
            .marker(symbols::Marker::Braille)
            .style(Style::default().fg(Color::Green))
            .data(&actual),
        Dataset::default()
            .name("fitted")
            .graph_type(GraphType::Line)
            .marker(symbols::Marker::Dot)
            .style(Style::default().fg(Color::Blue))
            .data(&fitted),
        Dataset::default()
            .name("forecast")
            .graph_type(GraphType::Line)
            .marker(symbols::Marker::Dot)
            .style(Style::default().fg(Color::Red))
            .data(&forecast),
    ];

    render_lines(
        datasets,
        title,
        currency,
        x_max,
        y_bounds(&all_points),
        [first_label, last_label],
        (width, height),
    )
}

/// Render positive holdings as vertical bars of their value.
pub fn render_allocation_bars(
    slices: &[AllocationSlice],
    title: &str,
    width: u16,
    height: u16,
) -> String {
    if slices.is_empty() {
        return String::new();
    }

    let bar_width = ((width.max(MIN_WIDTH) - 2) / slices.len() as u16)
        .saturating_sub(1)
        .clamp(3, 12);
    let bars: Vec<Bar> = slices
        .iter()
        .map(|s| {
            Bar::default()
                .value(s.value.round().max(0.0) as u64)
                .label(Line::from(s.name.clone()))
                .text_value(format!("{:.0}%", s.share * 100.0))
        })
        .collect();

    let chart = BarChart::default()
        .block(
            Block::default()
                .title(title.to_string())
                .borders(Borders::ALL),
        )
        .bar_width(bar_width)
        .bar_gap(1)
        .data(BarGroup::default().bars(&bars));

    let area = Rect::new(0, 0, width.max(MIN_WIDTH), height.max(MIN_HEIGHT));
    let mut buffer = Buffer::empty(area);
    chart.render(area, &mut buffer);
    buffer_to_string(&buffer, area)
}

fn render_lines(
    datasets: Vec<Dataset>,
    title: &str,
    currency: &str,
    x_max: f64,
    (y_min, y_max): (f64, f64),
    [first_label, last_label]: [String; 2],
    (width, height): (u16, u16),
) -> String {
    let area = Rect::new(0, 0, width.max(MIN_WIDTH), height.max(MIN_HEIGHT));

    let chart = Chart::new(datasets)
        .block(
            Block::default()
                .title(title.to_string())
                .borders(Borders::ALL),
        )
        .x_axis(
            Axis::default()
                .title(Line::from("Date"))
                .bounds([0.0, x_max])
                .labels(vec![Line::from(first_label), Line::from(last_label)]),
        )
        .y_axis(
            Axis::default()
                .title(Line::from(currency.to_uppercase()))
                .bounds([y_min, y_max])
                .labels(vec![
                    Line::from(format_price_label(y_min)),
                    Line::from(format_price_label(y_max)),
                ]),
        );

    let mut buffer = Buffer::empty(area);
    chart.render(area, &mut buffer);
    buffer_to_string(&buffer, area)
}

fn y_bounds(points: &[(f64, f64)]) -> (f64, f64) {
    let min = points.iter().map(|(_, y)| *y).fold(f64::INFINITY, f64::min);
    let max = points
        .iter()
        .map(|(_, y)| *y)
        .fold(f64::NEG_INFINITY, f64::max);

    if !min.is_finite() || !max.is_finite() {
        return (0.0, 1.0);
    }

    let span = max - min;
    if span <= f64::EPSILON {
        let padding = if max.abs() <= 1.0 {
            1.0
        } else {
            (max.abs() * 0.01).max(1.0)
        };
        (min - padding, max + padding)
    } else {
        let padding = span * 0.08;
        (min - padding, max + padding)
    }
}

fn format_price_label(value: f64) -> String {
    if value.abs() >= 1_000.0 {
        format!("{value:.0}")
    } else if value.abs() >= 1.0 {
        format!("{value:.2}")
    } else {
        format!("{value:.4}")
    }
}

fn buffer_to_string(buffer: &Buffer, area: Rect) -> String {
    (area.y..area.y + area.height)
        .map(|y| {
            let line: String = (area.x..area.x + area.width)
                .map(|x| buffer[(x, y)].symbol())
                .collect();
            line.trim_end().to_string()
        })
        .collect::<Vec<_>>()
        .join("\n")
}
