//! Galvanic CLI - settle DC circuit descriptions from the command line.

use clap::{Parser, Subcommand, ValueEnum};
use galvanic_core::simulation::ComponentSnapshot;
use galvanic_core::{CircuitDescription, CircuitError, CircuitSnapshot, Simulation};
use std::path::{Path, PathBuf};
use std::process;
use tracing::{debug, info};

#[derive(Parser)]
#[command(name = "galvanic")]
#[command(about = "DC circuit simulator driven by signal propagation", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a described circuit and print the settled values
    Simulate {
        /// Path to a JSON circuit description
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Number of reset-and-propagate iterations
        #[arg(short = 'n', long, default_value_t = 5)]
        iterations: usize,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,
    },

    /// Validate a description without running it
    Check {
        /// Path to a JSON circuit description
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON snapshot of every component and wire
    Json,
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let exit_code = match cli.command {
        Commands::Simulate {
            file,
            iterations,
            format,
        } => handle_simulate(&file, iterations, &format),
        Commands::Check { file } => handle_check(&file),
    };

    process::exit(exit_code);
}

fn load(file: &Path) -> Result<CircuitDescription, String> {
    let json = std::fs::read_to_string(file)
        .map_err(|e| format!("Error reading {}: {}", file.display(), e))?;
    CircuitDescription::from_json(&json).map_err(|e| format!("Error parsing {}: {}", file.display(), e))
}

fn handle_simulate(file: &Path, iterations: usize, format: &OutputFormat) -> i32 {
    let description = match load(file) {
        Ok(description) => description,
        Err(message) => {
            eprintln!("{}", message);
            return 1;
        }
    };

    match simulate(&description, iterations) {
        Ok(snapshot) => {
            match format {
                OutputFormat::Human => print_human(&snapshot),
                OutputFormat::Json => match serde_json::to_string_pretty(&snapshot) {
                    Ok(json) => println!("{}", json),
                    Err(e) => {
                        eprintln!("Error serializing snapshot: {}", e);
                        return 1;
                    }
                },
            }
            0
        }
        Err(e) => {
            eprintln!("Simulation error: {}", e);
            1
        }
    }
}

fn simulate(description: &CircuitDescription, iterations: usize) -> Result<CircuitSnapshot, CircuitError> {
    let mut simulation = Simulation::from_description(description)?;
    info!(
        components = simulation.circuit().component_count(),
        iterations, "simulating"
    );
    simulation.run(iterations)?;
    Ok(simulation.snapshot())
}

fn handle_check(file: &Path) -> i32 {
    let description = match load(file) {
        Ok(description) => description,
        Err(message) => {
            eprintln!("{}", message);
            return 1;
        }
    };

    match description.build() {
        Ok(built) => {
            let circuit = built.circuit();
            let sources = circuit.sources();
            println!(
                "{}: {} components, {} nodes, {} wires, {} sources",
                file.display(),
                circuit.component_count(),
                circuit.node_count(),
                circuit.wire_count(),
                sources.len()
            );
            if sources.is_empty() {
                println!("warning: no sources, the circuit will stay at rest");
            }
            debug!(names = ?built.names().keys().collect::<Vec<_>>(), "check passed");
            0
        }
        Err(e) => {
            eprintln!("Invalid circuit: {}", e);
            1
        }
    }
}

fn print_human(snapshot: &CircuitSnapshot) {
    println!("Iterations: {}", snapshot.iterations);
    println!("{}", "─".repeat(60));

    for component in &snapshot.components {
        println!("  {}", describe(component));
        for (index, level) in component.nodes.iter().enumerate() {
            println!(
                "      node {}: {:.6} V  {:.6} A",
                index, level.voltage, level.current
            );
        }
    }
    println!();

    for meter in snapshot.components.iter().filter(|c| c.kind == "voltmeter") {
        if let Some(name) = &meter.name {
            println!("{}:", name);
        }
        println!("voltmeter reading : {:.6}", meter.operands.primary);
    }
}

fn describe(component: &ComponentSnapshot) -> String {
    let name = component
        .name
        .clone()
        .unwrap_or_else(|| component.id.to_string());
    match component.kind.as_str() {
        "source" => format!(
            "{} (source {:.6} V, {:.6} A)",
            name, component.operands.primary, component.operands.secondary
        ),
        "resistor" => format!("{} (resistor {:.6} Ω)", name, component.operands.primary),
        kind => format!("{} ({})", name, kind),
    }
}
