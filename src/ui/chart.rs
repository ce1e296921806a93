//! Time-series chart rendering
//!
//! Draws the temperature and humidity series over the current viewport
//! with fixed value axes: temperature 0-30 C on the left, humidity
//! 0-100 % on the right. Time labels along the bottom switch format with
//! the visible span.

use anyhow::Result;
use chrono::{Local, TimeZone};
use cairo::{Context, FontSlant, FontWeight, LineCap, LineJoin};

use crate::core::{BoundedSeries, TimeViewport};

/// RGBA color in 0.0-1.0 components.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Color {
    pub const fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }
}

fn set_color(cr: &Context, c: Color) {
    cr.set_source_rgba(c.r, c.g, c.b, c.a);
}

/// Chart margins around the plot area.
#[derive(Debug, Clone, Copy)]
pub struct Margin {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Default for Margin {
    fn default() -> Self {
        Self {
            top: 10.0,
            right: 55.0,
            bottom: 34.0,
            left: 55.0,
        }
    }
}

/// Colors, fonts and fixed axis ranges for the chart.
#[derive(Debug, Clone)]
pub struct ChartStyle {
    pub background: Color,
    pub plot_background: Color,
    pub grid: Color,
    pub axis: Color,
    pub label: Color,
    pub temperature_line: Color,
    pub humidity_line: Color,
    pub line_width: f64,
    pub label_font_family: String,
    pub label_font_size: f64,
    pub margin: Margin,
    pub temperature_range: (f64, f64),
    pub humidity_range: (f64, f64),
}

impl Default for ChartStyle {
    fn default() -> Self {
        Self {
            background: Color::rgb(0.07, 0.07, 0.07),
            plot_background: Color::rgb(0.11, 0.11, 0.11),
            grid: Color::rgba(0.3, 0.3, 0.3, 0.5),
            axis: Color::rgb(0.7, 0.7, 0.7),
            label: Color::rgb(0.75, 0.75, 0.75),
            temperature_line: Color::rgb(1.0, 0.42, 0.42),
            humidity_line: Color::rgb(0.4, 0.65, 1.0),
            line_width: 3.0,
            label_font_family: "Sans".to_string(),
            label_font_size: 14.0,
            margin: Margin::default(),
            temperature_range: (0.0, 30.0),
            humidity_range: (0.0, 100.0),
        }
    }
}

/// Render both series over the viewport into a `width` x `height` area.
pub fn render_chart(
    cr: &Context,
    style: &ChartStyle,
    temperature: &BoundedSeries,
    humidity: &BoundedSeries,
    view: &TimeViewport,
    width: f64,
    height: f64,
) -> Result<()> {
    cr.save()?;
    set_color(cr, style.background);
    cr.rectangle(0.0, 0.0, width, height);
    cr.fill()?;
    cr.restore()?;

    let plot_x = style.margin.left;
    let plot_y = style.margin.top;
    let plot_width = width - style.margin.left - style.margin.right;
    let plot_height = height - style.margin.top - style.margin.bottom;
    if plot_width <= 0.0 || plot_height <= 0.0 {
        return Ok(());
    }

    cr.save()?;
    set_color(cr, style.plot_background);
    cr.rectangle(plot_x, plot_y, plot_width, plot_height);
    cr.fill()?;
    cr.restore()?;

    // Horizontal grid
    cr.save()?;
    set_color(cr, style.grid);
    cr.set_line_width(0.5);
    cr.set_dash(&[1.0, 2.0], 0.0);
    let grid_lines = 5;
    for i in 0..=grid_lines {
        let y = plot_y + (i as f64 / grid_lines as f64) * plot_height;
        cr.move_to(plot_x, y);
        cr.line_to(plot_x + plot_width, y);
        cr.stroke()?;
    }
    cr.restore()?;

    // Series, clipped to the plot area
    cr.save()?;
    cr.rectangle(plot_x, plot_y, plot_width, plot_height);
    cr.clip();
    draw_series(
        cr,
        style,
        temperature,
        view,
        style.temperature_range,
        style.temperature_line,
        plot_x,
        plot_y,
        plot_width,
        plot_height,
    )?;
    draw_series(
        cr,
        style,
        humidity,
        view,
        style.humidity_range,
        style.humidity_line,
        plot_x,
        plot_y,
        plot_width,
        plot_height,
    )?;
    cr.restore()?;

    // Axes
    cr.save()?;
    set_color(cr, style.axis);
    cr.set_line_width(1.0);
    cr.move_to(plot_x, plot_y);
    cr.line_to(plot_x, plot_y + plot_height);
    cr.move_to(plot_x + plot_width, plot_y);
    cr.line_to(plot_x + plot_width, plot_y + plot_height);
    cr.move_to(plot_x, plot_y + plot_height);
    cr.line_to(plot_x + plot_width, plot_y + plot_height);
    cr.stroke()?;
    cr.restore()?;

    // Value labels
    cr.save()?;
    set_color(cr, style.label);
    cr.select_font_face(
        &style.label_font_family,
        FontSlant::Normal,
        FontWeight::Normal,
    );
    cr.set_font_size(style.label_font_size);
    for i in 0..=grid_lines {
        let frac = i as f64 / grid_lines as f64;
        let y = plot_y + frac * plot_height;

        let temp_val =
            style.temperature_range.1 - frac * (style.temperature_range.1 - style.temperature_range.0);
        let label = format!("{temp_val:.0}");
        let extents = cr.text_extents(&label)?;
        cr.move_to(
            (plot_x - extents.width() - 6.0).max(2.0),
            y + extents.height() / 2.0,
        );
        cr.show_text(&label)?;

        let hum_val =
            style.humidity_range.1 - frac * (style.humidity_range.1 - style.humidity_range.0);
        let label = format!("{hum_val:.0}");
        let extents = cr.text_extents(&label)?;
        cr.move_to(plot_x + plot_width + 6.0, y + extents.height() / 2.0);
        cr.show_text(&label)?;
    }

    // Time labels
    let ticks = 4;
    for i in 0..=ticks {
        let frac = i as f64 / ticks as f64;
        let ts_ms = view.start_ms() + (view.span_ms() as f64 * frac) as i64;
        let label = format_tick(ts_ms, view.span_ms());
        let extents = cr.text_extents(&label)?;
        let x = (plot_x + frac * plot_width - extents.width() / 2.0)
            .clamp(2.0, width - extents.width() - 2.0);
        cr.move_to(x, plot_y + plot_height + extents.height() + 8.0);
        cr.show_text(&label)?;
    }
    cr.restore()?;

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn draw_series(
    cr: &Context,
    style: &ChartStyle,
    series: &BoundedSeries,
    view: &TimeViewport,
    value_range: (f64, f64),
    color: Color,
    plot_x: f64,
    plot_y: f64,
    plot_width: f64,
    plot_height: f64,
) -> Result<()> {
    let span = value_range.1 - value_range.0;
    if span <= 0.0 {
        return Ok(());
    }

    cr.save()?;
    set_color(cr, color);
    cr.set_line_width(style.line_width);
    cr.set_line_cap(LineCap::Round);
    cr.set_line_join(LineJoin::Round);

    let mut started = false;
    for point in series.iter() {
        let x = plot_x + view.x_for(point.ts_ms, plot_width);
        let normalized = ((point.value - value_range.0) / span).clamp(0.0, 1.0);
        let y = plot_y + plot_height - normalized * plot_height;
        if started {
            cr.line_to(x, y);
        } else {
            cr.move_to(x, y);
            started = true;
        }
    }
    if started {
        cr.stroke()?;
    }
    cr.restore()?;
    Ok(())
}

/// Tick label format depends on the visible span: time-of-day for less
/// than a day, day.month plus time otherwise.
fn format_tick(ts_ms: i64, span_ms: i64) -> String {
    const DAY_MS: i64 = 86_400_000;
    match Local.timestamp_millis_opt(ts_ms).single() {
        Some(dt) if span_ms < DAY_MS => dt.format("%H:%M").to_string(),
        Some(dt) => dt.format("%d.%m %H:%M").to_string(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_format_switches_with_span() {
        let ms = 1_700_000_000_000;
        let short = format_tick(ms, 3_600_000);
        let long = format_tick(ms, 7 * 86_400_000);
        assert_eq!(short.len(), 5);
        assert!(long.len() > short.len());
        assert!(long.contains('.'));
    }
}
