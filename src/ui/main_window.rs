//! Dashboard window
//!
//! One `gtk4::Stack` with two pages: the dashboard (values readout, chart,
//! controls) and the fullscreen clock. Everything runs on the GTK main
//! loop off four timers: the poll interval, a one second clock tick while
//! the clock page is visible, a daily prune, and a single-shot idle timer
//! that switches to the clock page. Any pointer interaction re-arms the
//! idle timer and returns to the dashboard.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use chrono::{Local, Utc};
use gtk4::glib;
use gtk4::prelude::*;
use gtk4::{
    Application, ApplicationWindow, Box as GtkBox, Button, DrawingArea, DropDown,
    EventControllerMotion, EventControllerScroll, EventControllerScrollFlags, GestureClick,
    GestureDrag, Label, Orientation, SpinButton, Stack, ToggleButton,
};
use log::{debug, info, warn};

use super::chart::{render_chart, ChartStyle};
use super::clock::{render_clock, ClockStyle};
use crate::config::Settings;
use crate::core::{BoundedSeries, TimeViewport, WindowUnit};
use crate::sensor::{self, Measurement, SensorKind};
use crate::storage;

const MAX_CHART_POINTS: usize = 10_000;
const DEFAULT_POLL_MINUTES: f64 = 5.0;
const DEFAULT_WINDOW_UNIT: u32 = 4; // Weeks
const CLOCK_TICK: Duration = Duration::from_secs(1);
const PRUNE_INTERVAL: Duration = Duration::from_secs(24 * 3600);
const ZOOM_STEP: f64 = 1.2;

const PAGE_DASHBOARD: &str = "dashboard";
const PAGE_CLOCK: &str = "clock";

struct State {
    settings: Settings,
    kind: SensorKind,
    pin: u32,
    db_ready: Cell<bool>,
    temperature: RefCell<BoundedSeries>,
    humidity: RefCell<BoundedSeries>,
    viewport: RefCell<TimeViewport>,
    window_ms: Cell<i64>,
    latest: Cell<Option<Measurement>>,
    chart_style: ChartStyle,
    clock_style: ClockStyle,
    poll_source: RefCell<Option<glib::SourceId>>,
    idle_source: RefCell<Option<glib::SourceId>>,
    clock_source: RefCell<Option<glib::SourceId>>,
    pointer_x: Cell<f64>,
    drag_last: Cell<f64>,
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

fn values_markup(m: &Measurement, time_text: &str) -> String {
    format!(
        "<span size='x-large' weight='bold'>\
         <span foreground='#ff6b6b'>Temperature: {:.1} \u{b0}C</span>\
         <span foreground='#999999'>  \u{2022}  </span>\
         <span foreground='#65a6ff'>Humidity: {:.1} %</span></span> \
         <span foreground='#888888'>({time_text})</span>",
        m.temperature_c, m.humidity
    )
}

/// Plot width in pixels for pixel-to-time conversions.
fn plot_width(state: &State, chart_area: &DrawingArea) -> f64 {
    f64::from(chart_area.width()) - state.chart_style.margin.left - state.chart_style.margin.right
}

/// One poll cycle: read the sensor, update the readout, append to the
/// store, extend the in-memory series and redraw.
fn read_once(state: &Rc<State>, values_label: &Label, chart_area: &DrawingArea) {
    let outcome = match sensor::read(state.kind, state.pin, state.settings.driver) {
        Ok(outcome) => outcome,
        Err(err) => {
            // Fatal only to this read; polling continues.
            values_label.set_text(&format!("Error: {err}"));
            return;
        }
    };

    let m = outcome.measurement;
    state.latest.set(Some(m));
    let time_text = Local::now().format("%H:%M").to_string();
    values_label.set_markup(&values_markup(&m, &time_text));

    // Late database creation: init may have failed at startup (read-only
    // filesystem, missing directory). Retry once per reading.
    if !state.db_ready.get() {
        match storage::init(&state.settings.db_path) {
            Ok(()) => state.db_ready.set(true),
            Err(err) => debug!("database still unavailable: {err}"),
        }
    }
    if state.db_ready.get() {
        if let Err(err) = storage::append(
            &state.settings.db_path,
            m.temperature_c,
            m.humidity,
            Some(state.kind.label()),
            Some(state.pin),
        ) {
            warn!("failed to save reading: {err}");
            values_label.set_text(&format!("Save error: {err}"));
        }
    }

    let ts = now_ms();
    state.temperature.borrow_mut().push(ts, m.temperature_c);
    state.humidity.borrow_mut().push(ts, m.humidity);
    state.viewport.borrow_mut().reset(state.window_ms.get(), ts);
    chart_area.queue_draw();
}

/// Seed the chart and readout from stored history.
fn load_history(state: &Rc<State>, values_label: &Label) {
    let rows = match storage::recent(&state.settings.db_path, MAX_CHART_POINTS) {
        Ok(rows) => rows,
        Err(err) => {
            // Degrades gracefully: the chart just starts empty.
            debug!("could not load history: {err}");
            return;
        }
    };
    let mut temperature = state.temperature.borrow_mut();
    let mut humidity = state.humidity.borrow_mut();
    for row in &rows {
        let ts = row.ts.timestamp_millis();
        temperature.push(ts, row.temperature_c);
        humidity.push(ts, row.humidity);
    }
    if let Some(last) = rows.last() {
        let m = Measurement::new(last.temperature_c, last.humidity);
        state.latest.set(Some(m));
        let time_text = last.ts.with_timezone(&Local).format("%H:%M").to_string();
        values_label.set_markup(&values_markup(&m, &time_text));
    }
}

fn stop_poll(state: &State) {
    if let Some(id) = state.poll_source.borrow_mut().take() {
        id.remove();
    }
}

fn restart_poll(state: &Rc<State>, minutes: f64, do_read: &Rc<dyn Fn()>) {
    stop_poll(state);
    let interval = Duration::from_secs(minutes.max(1.0) as u64 * 60);
    let do_read = do_read.clone();
    let id = glib::timeout_add_local(interval, move || {
        do_read();
        glib::ControlFlow::Continue
    });
    *state.poll_source.borrow_mut() = Some(id);
}

fn run_prune(state: &State) {
    if !state.settings.prune_active() || !state.db_ready.get() {
        return;
    }
    match storage::prune(&state.settings.db_path, state.settings.prune_months) {
        Ok(0) => {}
        Ok(deleted) => info!(
            "pruned {deleted} readings older than {} months",
            state.settings.prune_months
        ),
        // Prune failures skip a cycle, nothing more.
        Err(err) => debug!("prune skipped: {err}"),
    }
}

/// Build and present the dashboard window.
pub fn build_ui(app: &Application, settings: Settings, kind: SensorKind, pin: u32) {
    let window_ms = WindowUnit::Weeks.millis();
    let db_ready = storage::init(&settings.db_path)
        .map_err(|err| warn!("database init failed: {err}"))
        .is_ok();

    let state = Rc::new(State {
        kind,
        pin,
        db_ready: Cell::new(db_ready),
        temperature: RefCell::new(BoundedSeries::new(MAX_CHART_POINTS, window_ms)),
        humidity: RefCell::new(BoundedSeries::new(MAX_CHART_POINTS, window_ms)),
        viewport: RefCell::new(TimeViewport::ending_now(window_ms, now_ms())),
        window_ms: Cell::new(window_ms),
        latest: Cell::new(None),
        chart_style: ChartStyle::default(),
        clock_style: ClockStyle::default(),
        poll_source: RefCell::new(None),
        idle_source: RefCell::new(None),
        clock_source: RefCell::new(None),
        pointer_x: Cell::new(0.0),
        drag_last: Cell::new(0.0),
        settings,
    });

    run_prune(&state);

    // --- Widgets ---------------------------------------------------------

    let values_label = Label::new(Some("Temp: -- \u{b0}C  Humid: -- %"));
    values_label.set_halign(gtk4::Align::Center);

    let chart_area = DrawingArea::new();
    chart_area.set_vexpand(true);
    chart_area.set_hexpand(true);
    {
        let state = state.clone();
        chart_area.set_draw_func(move |_, cr, width, height| {
            let result = render_chart(
                cr,
                &state.chart_style,
                &state.temperature.borrow(),
                &state.humidity.borrow(),
                &state.viewport.borrow(),
                f64::from(width),
                f64::from(height),
            );
            if let Err(err) = result {
                warn!("chart render failed: {err}");
            }
        });
    }

    let clock_area = DrawingArea::new();
    clock_area.set_vexpand(true);
    clock_area.set_hexpand(true);
    {
        let state = state.clone();
        clock_area.set_draw_func(move |_, cr, width, height| {
            let result = render_clock(
                cr,
                &state.clock_style,
                Local::now(),
                state.latest.get(),
                f64::from(width),
                f64::from(height),
            );
            if let Err(err) = result {
                warn!("clock render failed: {err}");
            }
        });
    }

    let interval_spin = SpinButton::with_range(1.0, 60.0, 1.0);
    interval_spin.set_value(DEFAULT_POLL_MINUTES);
    interval_spin.set_tooltip_text(Some("Poll interval in minutes"));

    let auto_button = ToggleButton::with_label("Start Auto");

    let window_spin = SpinButton::with_range(1.0, 10_000.0, 1.0);
    window_spin.set_value(1.0);
    window_spin.set_tooltip_text(Some("Chart time window"));

    let unit_labels: Vec<&str> = WindowUnit::ALL.iter().map(|u| u.label()).collect();
    let unit_dropdown = DropDown::from_strings(&unit_labels);
    unit_dropdown.set_selected(DEFAULT_WINDOW_UNIT);

    let clock_button = Button::with_label("Show Clock");
    let clear_button = Button::with_label("Clear Data");

    let controls = GtkBox::new(Orientation::Horizontal, 6);
    controls.set_margin_top(6);
    controls.set_margin_bottom(6);
    controls.set_margin_start(6);
    controls.set_margin_end(6);
    controls.append(&interval_spin);
    controls.append(&auto_button);
    controls.append(&window_spin);
    controls.append(&unit_dropdown);
    let spacer = GtkBox::new(Orientation::Horizontal, 0);
    spacer.set_hexpand(true);
    controls.append(&spacer);
    controls.append(&clock_button);
    controls.append(&clear_button);

    let dashboard = GtkBox::new(Orientation::Vertical, 8);
    dashboard.set_margin_top(8);
    dashboard.set_margin_bottom(8);
    dashboard.set_margin_start(8);
    dashboard.set_margin_end(8);
    dashboard.append(&values_label);
    dashboard.append(&chart_area);
    dashboard.append(&controls);

    let stack = Stack::new();
    stack.add_named(&dashboard, Some(PAGE_DASHBOARD));
    stack.add_named(&clock_area, Some(PAGE_CLOCK));
    stack.set_visible_child_name(PAGE_DASHBOARD);

    let window = ApplicationWindow::builder()
        .application(app)
        .title("PiTempHumid")
        .default_width(state.settings.target_width)
        .default_height(state.settings.target_height)
        .build();
    window.set_child(Some(&stack));

    // --- Shared actions --------------------------------------------------

    let do_read: Rc<dyn Fn()> = {
        let state = state.clone();
        let values_label = values_label.clone();
        let chart_area = chart_area.clone();
        Rc::new(move || read_once(&state, &values_label, &chart_area))
    };

    let show_clock: Rc<dyn Fn()> = {
        let state = state.clone();
        let stack = stack.clone();
        let clock_area = clock_area.clone();
        Rc::new(move || {
            stack.set_visible_child_name(PAGE_CLOCK);
            clock_area.queue_draw();
            if let Some(id) = state.clock_source.borrow_mut().take() {
                id.remove();
            }
            let tick_area = clock_area.clone();
            let id = glib::timeout_add_local(CLOCK_TICK, move || {
                tick_area.queue_draw();
                glib::ControlFlow::Continue
            });
            *state.clock_source.borrow_mut() = Some(id);
        })
    };

    // Re-arm the single-shot idle timer; called on every interaction.
    let arm_idle: Rc<dyn Fn()> = {
        let state = state.clone();
        let show_clock = show_clock.clone();
        Rc::new(move || {
            if let Some(id) = state.idle_source.borrow_mut().take() {
                id.remove();
            }
            let fired_state = state.clone();
            let show_clock = show_clock.clone();
            let id = glib::timeout_add_local_once(
                Duration::from_secs(state.settings.idle_secs),
                move || {
                    *fired_state.idle_source.borrow_mut() = None;
                    show_clock();
                },
            );
            *state.idle_source.borrow_mut() = Some(id);
        })
    };

    // Leave the clock page (stopping its tick) and restart the idle timer.
    let wake: Rc<dyn Fn()> = {
        let state = state.clone();
        let stack = stack.clone();
        let arm_idle = arm_idle.clone();
        Rc::new(move || {
            if let Some(id) = state.clock_source.borrow_mut().take() {
                id.remove();
            }
            if stack.visible_child_name().as_deref() == Some(PAGE_CLOCK) {
                stack.set_visible_child_name(PAGE_DASHBOARD);
            }
            arm_idle();
        })
    };

    // --- Input wiring ----------------------------------------------------

    {
        let state = state.clone();
        let chart_ref = chart_area.clone();
        let arm_idle = arm_idle.clone();
        let drag = GestureDrag::new();
        drag.connect_drag_begin({
            let state = state.clone();
            let arm_idle = arm_idle.clone();
            move |_, _, _| {
                state.drag_last.set(0.0);
                arm_idle();
            }
        });
        drag.connect_drag_update(move |_, dx, _| {
            let delta = dx - state.drag_last.get();
            state.drag_last.set(dx);
            let width = plot_width(&state, &chart_ref);
            // Dragging right moves the window toward earlier times.
            state
                .viewport
                .borrow_mut()
                .pan_by_pixels(-delta, width, now_ms());
            chart_ref.queue_draw();
            arm_idle();
        });
        chart_area.add_controller(drag);
    }

    {
        let state = state.clone();
        let motion = EventControllerMotion::new();
        motion.connect_motion(move |_, x, _| state.pointer_x.set(x));
        chart_area.add_controller(motion);
    }

    {
        let state = state.clone();
        let chart_ref = chart_area.clone();
        let arm_idle = arm_idle.clone();
        let scroll = EventControllerScroll::new(EventControllerScrollFlags::VERTICAL);
        scroll.connect_scroll(move |_, _, dy| {
            let factor = if dy < 0.0 { ZOOM_STEP } else { 1.0 / ZOOM_STEP };
            let width = plot_width(&state, &chart_ref);
            let px = state.pointer_x.get() - state.chart_style.margin.left;
            state
                .viewport
                .borrow_mut()
                .zoom_at(factor, px, width, now_ms());
            chart_ref.queue_draw();
            arm_idle();
            glib::Propagation::Stop
        });
        chart_area.add_controller(scroll);
    }

    {
        let state = state.clone();
        let chart_ref = chart_area.clone();
        let arm_idle = arm_idle.clone();
        let click = GestureClick::new();
        click.connect_pressed(move |_, n_press, _, _| {
            // Double-click resets the zoom to the configured window.
            if n_press == 2 {
                state
                    .viewport
                    .borrow_mut()
                    .reset(state.window_ms.get(), now_ms());
                chart_ref.queue_draw();
            }
            arm_idle();
        });
        chart_area.add_controller(click);
    }

    {
        // Any tap on the clock returns to the dashboard.
        let wake = wake.clone();
        let click = GestureClick::new();
        click.connect_pressed(move |_, _, _, _| wake());
        clock_area.add_controller(click);
    }

    // --- Control wiring --------------------------------------------------

    {
        let state = state.clone();
        let do_read = do_read.clone();
        let interval_ref = interval_spin.clone();
        let arm_idle = arm_idle.clone();
        auto_button.connect_toggled(move |button| {
            arm_idle();
            if button.is_active() {
                button.set_label("Stop Auto");
                do_read();
                restart_poll(&state, interval_ref.value(), &do_read);
            } else {
                button.set_label("Start Auto");
                stop_poll(&state);
            }
        });
    }

    {
        let state = state.clone();
        let do_read = do_read.clone();
        let auto_ref = auto_button.clone();
        let arm_idle = arm_idle.clone();
        interval_spin.connect_value_changed(move |spin| {
            arm_idle();
            if auto_ref.is_active() {
                restart_poll(&state, spin.value(), &do_read);
            }
        });
    }

    let apply_window: Rc<dyn Fn()> = {
        let state = state.clone();
        let window_spin = window_spin.clone();
        let unit_dropdown = unit_dropdown.clone();
        let chart_ref = chart_area.clone();
        Rc::new(move || {
            let unit = WindowUnit::ALL
                .get(unit_dropdown.selected() as usize)
                .copied()
                .unwrap_or(WindowUnit::Weeks);
            let window_ms = (window_spin.value() as i64).max(1) * unit.millis();
            state.window_ms.set(window_ms);
            state.temperature.borrow_mut().set_window_ms(window_ms);
            state.humidity.borrow_mut().set_window_ms(window_ms);
            state.viewport.borrow_mut().reset(window_ms, now_ms());
            chart_ref.queue_draw();
        })
    };

    {
        let apply_window = apply_window.clone();
        let arm_idle = arm_idle.clone();
        window_spin.connect_value_changed(move |_| {
            apply_window();
            arm_idle();
        });
    }
    {
        let apply_window = apply_window.clone();
        let arm_idle = arm_idle.clone();
        unit_dropdown.connect_selected_notify(move |_| {
            apply_window();
            arm_idle();
        });
    }

    {
        let show_clock = show_clock.clone();
        clock_button.connect_clicked(move |_| show_clock());
    }

    {
        let state = state.clone();
        let window_ref = window.clone();
        let values_ref = values_label.clone();
        let chart_ref = chart_area.clone();
        let arm_idle = arm_idle.clone();
        clear_button.connect_clicked(move |_| {
            arm_idle();
            let dialog = gtk4::AlertDialog::builder()
                .message("Delete all stored readings?")
                .detail("This removes every reading from the database.")
                .modal(true)
                .build();
            dialog.set_buttons(&["Cancel", "Delete"]);
            dialog.set_cancel_button(0);
            dialog.set_default_button(0);

            let state = state.clone();
            let values_ref = values_ref.clone();
            let chart_ref = chart_ref.clone();
            dialog.choose(
                Some(&window_ref),
                gtk4::gio::Cancellable::NONE,
                move |response| {
                    if !matches!(response, Ok(1)) {
                        return;
                    }
                    match storage::clear(&state.settings.db_path) {
                        Ok(deleted) => {
                            info!("cleared {deleted} readings");
                            state.temperature.borrow_mut().clear();
                            state.humidity.borrow_mut().clear();
                            state.latest.set(None);
                            values_ref.set_text("Cleared data");
                            chart_ref.queue_draw();
                        }
                        Err(err) => values_ref.set_text(&format!("Clear error: {err}")),
                    }
                },
            );
        });
    }

    // --- Startup ---------------------------------------------------------

    if state.db_ready.get() {
        load_history(&state, &values_label);
        state.viewport.borrow_mut().reset(window_ms, now_ms());
    }

    {
        let state = state.clone();
        glib::timeout_add_local(PRUNE_INTERVAL, move || {
            run_prune(&state);
            glib::ControlFlow::Continue
        });
    }

    arm_idle();
    window.present();

    // Auto-polling is on by default; toggling triggers the first read.
    auto_button.set_active(true);
}
