use clap::{Parser, Subcommand};
use gtk4::prelude::*;
use gtk4::Application;
use log::{info, warn};
use pi_temp_humid::config::Settings;
use pi_temp_humid::sensor::{self, DriverPreference, SensorKind};
use pi_temp_humid::{storage, ui};
use std::path::PathBuf;
use std::process::ExitCode;

const APP_ID: &str = "com.github.pi_temp_humid";

/// pi-temp-humid - DHT temperature/humidity logger with a touch dashboard
#[derive(Parser, Debug, Clone)]
#[command(name = "pi-temp-humid")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Debug verbosity level (0=quiet, 1=info, 2=debug, 3=trace)
    #[arg(short = 'd', long = "debug", value_name = "LEVEL", default_value = "0")]
    debug: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// Read the sensor once (or repeatedly) and print the values
    Read {
        /// Produce simulated values instead of touching the hardware
        #[arg(long)]
        simulate: bool,

        /// Sensor type: DHT11, DHT22 or AM2302
        #[arg(long, default_value = "AM2302")]
        sensor: String,

        /// BCM GPIO pin the sensor data line is wired to
        #[arg(long, default_value = "4")]
        pin: u32,

        /// Number of readings to take back to back
        #[arg(long, default_value = "1")]
        count: u32,

        /// Also append each reading to this database file
        #[arg(long, value_name = "PATH")]
        save_db: Option<PathBuf>,

        /// Print the temperature in Fahrenheit
        #[arg(long)]
        fahrenheit: bool,
    },

    /// Launch the dashboard window (the default)
    Gui {
        /// Database file, overriding PI_TEMP_DB and the platform default
        #[arg(long, value_name = "PATH")]
        db: Option<PathBuf>,

        /// Sensor type: DHT11, DHT22 or AM2302
        #[arg(long, default_value = "AM2302")]
        sensor: String,

        /// BCM GPIO pin the sensor data line is wired to
        #[arg(long, default_value = "4")]
        pin: u32,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = match cli.debug {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    // RUST_LOG still overrides the CLI setting
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    match cli.command.unwrap_or(Command::Gui {
        db: None,
        sensor: "AM2302".to_string(),
        pin: 4,
    }) {
        Command::Read {
            simulate,
            sensor,
            pin,
            count,
            save_db,
            fahrenheit,
        } => run_read(simulate, &sensor, pin, count, save_db, fahrenheit),
        Command::Gui { db, sensor, pin } => run_gui(db, &sensor, pin),
    }
}

fn parse_sensor(sensor: &str) -> Result<SensorKind, ExitCode> {
    sensor.parse().map_err(|err| {
        eprintln!("Error: {err}");
        ExitCode::from(2)
    })
}

fn run_read(
    simulate: bool,
    sensor: &str,
    pin: u32,
    count: u32,
    save_db: Option<PathBuf>,
    fahrenheit: bool,
) -> ExitCode {
    let kind = match parse_sensor(sensor) {
        Ok(kind) => kind,
        Err(code) => return code,
    };

    let settings = Settings::from_env();
    let pref = if simulate {
        DriverPreference::Simulated
    } else {
        settings.driver
    };

    // Readings are only persisted when --save-db is given.
    let db_path = save_db;
    if let Some(path) = &db_path {
        if let Err(err) = storage::init(path) {
            eprintln!("Warning: could not open database {}: {err}", path.display());
        }
    }

    for _ in 0..count.max(1) {
        let outcome = match sensor::read(kind, pin, pref) {
            Ok(outcome) => outcome,
            Err(err) => {
                eprintln!("Error: {err}");
                eprintln!("Tip: run with --simulate to produce sample values.");
                return ExitCode::from(2);
            }
        };
        let m = outcome.measurement;
        if fahrenheit {
            println!(
                "Temperature: {:.1} \u{b0}F, Humidity: {:.1} %",
                m.temperature_f(),
                m.humidity
            );
        } else {
            println!(
                "Temperature: {:.1} \u{b0}C, Humidity: {:.1} %",
                m.temperature_c, m.humidity
            );
        }
        println!("(DHT driver: {})", outcome.driver);

        if let Some(path) = &db_path {
            match storage::append(path, m.temperature_c, m.humidity, Some(kind.label()), Some(pin))
            {
                Ok(ts) => info!("saved reading at {ts}"),
                // Persisting is best-effort here; the reading was printed.
                Err(err) => eprintln!("Warning: could not save reading: {err}"),
            }
        }
    }
    ExitCode::SUCCESS
}

fn run_gui(db: Option<PathBuf>, sensor: &str, pin: u32) -> ExitCode {
    let kind = match parse_sensor(sensor) {
        Ok(kind) => kind,
        Err(code) => return code,
    };

    let mut settings = Settings::from_env();
    if let Some(db) = db {
        settings.db_path = db;
    }
    if let Some(parent) = settings.db_path.parent() {
        if !parent.as_os_str().is_empty() {
            if let Err(err) = std::fs::create_dir_all(parent) {
                warn!("could not create data directory {}: {err}", parent.display());
            }
        }
    }
    info!("database at {}", settings.db_path.display());

    let app = Application::builder().application_id(APP_ID).build();
    app.connect_activate(move |app| {
        ui::build_ui(app, settings.clone(), kind, pin);
    });

    // Arguments were already parsed; hand GTK an empty set.
    let status = app.run_with_args::<&str>(&[]);
    ExitCode::from(status.value() as u8)
}
