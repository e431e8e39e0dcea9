use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use humus::{SimulationBuilder, SimulationConfig, VirtualTime};

/// Nitrate shared between root and microbial uptake.
const DEFAULT_SCENARIO: &str = r#"
[kernel]
cough_up_interval_hours = 12

[[stores]]
name = "soil"
boxes = 3

[[stores]]
name = "plant"
boxes = 3

[[quantities]]
name = "Nitrate"
store = "soil"
initial = 20.0

[[quantities]]
name = "RootRate"
store = "plant"

[[quantities]]
name = "RootBuffer"
store = "plant"

[[quantities]]
name = "RootN"
store = "plant"

[[quantities]]
name = "MicrobeRate"
store = "soil"

[[quantities]]
name = "MicrobeBuffer"
store = "soil"

[[quantities]]
name = "MicrobeN"
store = "soil"

[[processes]]
id = 1
name = "Mineralisation"
stratum = "soil"
activity = "biological"
quantities = { pool = "Nitrate" }
parameters = { replenish_per_day = 6.0 }
wake_interval_hours = 24

[[processes]]
id = 2
name = "RootUptake"
stratum = "plant"
activity = "plant"
quantities = { supply = "Nitrate", destination = "RootN", rate = "RootRate", buffer = "RootBuffer" }
parameters = { supplier = 1, rate_per_day = 4.0 }
wake_interval_hours = 24

[[processes]]
id = 3
name = "MicrobialUptake"
stratum = "soil"
activity = "biological"
quantities = { supply = "Nitrate", destination = "MicrobeN", rate = "MicrobeRate", buffer = "MicrobeBuffer" }
parameters = { supplier = 1, rate_per_day = 8.0 }
wake_interval_hours = 24
"#;

#[derive(Parser, Debug)]
#[command(name = "humus")]
#[command(about = "Run a soil-process simulation on the virtual-time kernel")]
struct Cli {
    /// TOML scenario; the built-in nitrogen scenario when omitted
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Simulated days to run
    #[arg(long, default_value = "5")]
    days: u64,

    /// Log every dispatch
    #[arg(long, short)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("humus=debug")
        } else {
            EnvFilter::new("humus=info")
        }
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = match &cli.config {
        Some(path) => SimulationConfig::load(path)
            .with_context(|| format!("loading scenario {}", path.display()))?,
        None => SimulationConfig::from_toml_str(DEFAULT_SCENARIO)
            .context("parsing built-in scenario")?,
    };

    // A process naming a supplier is a consumer.
    let consumers: Vec<u64> = config
        .processes
        .iter()
        .filter(|p| p.parameters.contains_key("supplier"))
        .map(|p| p.id)
        .collect();
    let quantities: Vec<String> = config.quantities.iter().map(|q| q.name.clone()).collect();

    let mut builder = SimulationBuilder::new(config);
    for id in consumers {
        builder = builder.uptake(id);
    }
    let mut scenario = builder.build().context("assembling simulation")?;

    println!("═══════════════════════════════════════════════════════");
    println!("  Humus: virtual-time soil-process kernel");
    println!("═══════════════════════════════════════════════════════");

    print!("  {:>5}", "day");
    for name in &quantities {
        print!(" {:>14}", name);
    }
    println!();

    for day in 0..=cli.days {
        scenario.run_until(VirtualTime::from_days(day));
        print!("  {:>5}", day);
        for name in &quantities {
            print!(" {:>14.3}", scenario.total(name).unwrap_or_default());
        }
        println!();
    }

    let mut pictures = String::new();
    scenario.runtime.draw_all(&mut pictures)?;
    println!();
    for line in pictures.lines() {
        println!("  {line}");
    }

    let stats = scenario.runtime.stats();
    info!(
        letters = scenario.simulation.events_processed(),
        dispatched = stats.dispatched,
        unexpected = stats.unexpected,
        undeliverable = stats.undeliverable,
        "run complete"
    );
    let released = scenario.runtime.teardown();
    info!(descriptors = released, "released");
    Ok(())
}
