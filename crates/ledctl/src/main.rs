use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use application::{ControllerSettings, LedController, LedDevice};
use domain::BlinkDescriptor;
use domain::blink::{DEFAULT_DUTY_PERCENT, DEFAULT_PERIOD_MS};
use infrastructure::LedctlConfig;

#[derive(Parser, Debug)]
#[command(author, version, about = "Control sysfs LEDs", long_about = None)]
struct Args {
    /// Path to config directory
    #[arg(long, default_value = "config")]
    config_dir: String,

    /// Override the LED class directory
    #[arg(long)]
    root: Option<PathBuf>,

    /// Override the default blink rate
    #[arg(long)]
    rate: Option<f64>,

    /// LED to act on; may be omitted when only one LED is present
    #[arg(long, short, global = true)]
    led: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the LEDs under the root directory
    List,
    /// Print brightness, bounds and triggers as JSON
    Status,
    /// Turn the LED fully on
    On,
    /// Turn the LED off
    Off,
    /// Set the brightness, clamped to the LED's range
    Brightness { value: i64 },
    /// Select a kernel trigger
    Trigger { name: String },
    /// Blink the LED
    Blink {
        #[arg(long)]
        rate: Option<f64>,
        /// Share of the period the LED is lit, in percent
        #[arg(long, default_value_t = DEFAULT_DUTY_PERCENT)]
        duty: f64,
        /// Period of one cycle in milliseconds
        #[arg(long, default_value_t = DEFAULT_PERIOD_MS)]
        period: f64,
        #[arg(long, default_value_t = 1)]
        count: u32,
    },
    /// Blink a message in morse code
    Morse { text: String },
    /// Discard queued work and turn the LED off
    Reset,
}

fn init_tracing(config: &LedctlConfig) {
    let filter = std::env::var("RUST_LOG")
        .ok()
        .or_else(|| config.log_filter.clone())
        .unwrap_or_else(|| "info,ledctl=debug".into());

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(filter))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run() -> Result<()> {
    dotenv().ok();
    let args = Args::parse();

    let mut config = LedctlConfig::load(&args.config_dir)
        .with_context(|| format!("Failed to load configuration from {}", args.config_dir))?;
    if let Some(root) = &args.root {
        config.root = root.display().to_string();
    }
    if let Some(rate) = args.rate {
        config.rate = rate;
    }

    init_tracing(&config);
    debug!(root = %config.root, rate = config.rate, "Loaded configuration");

    let controller = LedController::sysfs(ControllerSettings::from(&config));

    if let Command::List = args.command {
        for id in controller.discover() {
            println!("{}", id);
        }
        return Ok(());
    }

    let led = controller.open(args.led.as_deref())?;
    execute(&led, args.command).await
}

async fn execute(led: &LedDevice, command: Command) -> Result<()> {
    match command {
        Command::List => {}
        Command::Status => {
            let status = serde_json::json!({
                "id": led.id(),
                "brightness": led.current_value()?,
                "bounds": led.bounds(),
                "triggers": led.triggers()?,
                "encoders": led.encoders(),
            });
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        Command::On => led.turn_on().await?,
        Command::Off => led.turn_off().await?,
        Command::Brightness { value } => led.set_brightness(value).await?,
        Command::Trigger { name } => led.set_trigger(&name).await?,
        Command::Blink {
            rate,
            duty,
            period,
            count,
        } => {
            let mut blink = BlinkDescriptor::new(duty, period);
            blink.rate = rate;

            let cycles: Vec<_> = (0..count).map(|_| led.blink(blink)).collect();
            for cycle in cycles {
                cycle.await?;
            }
        }
        Command::Morse { text } => led.morse(&text).await?,
        Command::Reset => led.reset().await?,
    }

    info!(device_id = %led.id(), "Done");
    Ok(())
}

fn main() {
    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to start runtime: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = rt.block_on(run()) {
        eprintln!("ledctl: {:#}", e);
        std::process::exit(1);
    }
}
