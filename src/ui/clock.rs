//! Fullscreen digital clock rendering
//!
//! Large HH:MM with a colon that blinks on even seconds, the date below,
//! and a stats line with the latest reading. The time font size is fitted
//! to the available area by binary search over text extents so the clock
//! fills an 800x480 panel without manual tuning.

use anyhow::Result;
use chrono::{DateTime, Local, Timelike};
use cairo::{Context, FontSlant, FontWeight};

use super::chart::Color;
use crate::sensor::Measurement;

#[derive(Debug, Clone)]
pub struct ClockStyle {
    pub background: Color,
    pub time_color: Color,
    pub date_color: Color,
    pub temperature_color: Color,
    pub humidity_color: Color,
    pub muted: Color,
    pub font_family: String,
}

impl Default for ClockStyle {
    fn default() -> Self {
        Self {
            background: Color::rgb(0.07, 0.07, 0.07),
            time_color: Color::rgb(1.0, 1.0, 1.0),
            date_color: Color::rgb(0.67, 0.67, 0.67),
            temperature_color: Color::rgb(1.0, 0.42, 0.42),
            humidity_color: Color::rgb(0.4, 0.65, 1.0),
            muted: Color::rgb(0.53, 0.53, 0.53),
            font_family: "Sans".to_string(),
        }
    }
}

fn set_color(cr: &Context, c: Color) {
    cr.set_source_rgba(c.r, c.g, c.b, c.a);
}

/// Largest font size whose `sample` extents fit `max_w` x `max_h`.
fn fit_font_size(cr: &Context, sample: &str, max_w: f64, max_h: f64) -> Result<f64> {
    let (mut lo, mut hi) = (6u32, 400u32);
    let mut best = lo;
    while lo <= hi {
        let mid = (lo + hi) / 2;
        cr.set_font_size(f64::from(mid));
        let extents = cr.text_extents(sample)?;
        if extents.width() <= max_w && extents.height() <= max_h {
            best = mid;
            lo = mid + 1;
        } else {
            hi = mid - 1;
        }
    }
    Ok(f64::from(best))
}

/// Render the clock page.
pub fn render_clock(
    cr: &Context,
    style: &ClockStyle,
    now: DateTime<Local>,
    latest: Option<Measurement>,
    width: f64,
    height: f64,
) -> Result<()> {
    cr.save()?;
    set_color(cr, style.background);
    cr.rectangle(0.0, 0.0, width, height);
    cr.fill()?;
    cr.restore()?;

    cr.select_font_face(&style.font_family, FontSlant::Normal, FontWeight::Bold);

    // Time, fitted to roughly the upper two thirds
    let padding = 20.0;
    let time_text = now.format("%H:%M").to_string();
    let size = fit_font_size(cr, "88:88", width - padding * 2.0, height * 0.62)?;
    cr.set_font_size(size);
    let extents = cr.text_extents(&time_text)?;
    let time_x = (width - extents.width()) / 2.0;
    let time_y = height * 0.52;

    // Blink the colon: visible on even seconds. Both halves are placed
    // from the full string's extents so the digits never shift.
    let hours = now.format("%H").to_string();
    let minutes = now.format("%M").to_string();
    let hours_w = cr.text_extents(&hours)?.x_advance();
    let colon_w = cr.text_extents(":")?.x_advance();

    set_color(cr, style.time_color);
    cr.move_to(time_x, time_y);
    cr.show_text(&hours)?;
    if now.second() % 2 == 0 {
        cr.move_to(time_x + hours_w, time_y);
        cr.show_text(":")?;
    }
    cr.move_to(time_x + hours_w + colon_w, time_y);
    cr.show_text(&minutes)?;

    // Date line
    cr.select_font_face(&style.font_family, FontSlant::Normal, FontWeight::Normal);
    cr.set_font_size((height * 0.07).clamp(12.0, 40.0));
    let date_text = now.format("%A, %d %B %Y").to_string();
    let extents = cr.text_extents(&date_text)?;
    set_color(cr, style.date_color);
    cr.move_to((width - extents.width()) / 2.0, height * 0.70);
    cr.show_text(&date_text)?;

    // Stats line: latest reading or a placeholder
    cr.set_font_size((height * 0.08).clamp(12.0, 44.0));
    let stats_y = height * 0.85;
    match latest {
        Some(m) => {
            let temp_text = format!("{:.1} \u{b0}C", m.temperature_c);
            let sep_text = "  \u{2022}  ";
            let hum_text = format!("{:.1} %", m.humidity);
            let temp_w = cr.text_extents(&temp_text)?.x_advance();
            let sep_w = cr.text_extents(sep_text)?.x_advance();
            let hum_w = cr.text_extents(&hum_text)?.x_advance();
            let mut x = (width - temp_w - sep_w - hum_w) / 2.0;

            set_color(cr, style.temperature_color);
            cr.move_to(x, stats_y);
            cr.show_text(&temp_text)?;
            x += temp_w;

            set_color(cr, style.muted);
            cr.move_to(x, stats_y);
            cr.show_text(sep_text)?;
            x += sep_w;

            set_color(cr, style.humidity_color);
            cr.move_to(x, stats_y);
            cr.show_text(&hum_text)?;
        }
        None => {
            let text = "No data";
            let extents = cr.text_extents(text)?;
            set_color(cr, style.muted);
            cr.move_to((width - extents.width()) / 2.0, stats_y);
            cr.show_text(text)?;
        }
    }

    Ok(())
}
