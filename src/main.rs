//! DNF Composer CLI - Run an architecture from a JSON description.

use std::path::PathBuf;
use std::time::Instant;

use dnf_composer::{
    Simulation,
    element::{ElementFactory, OUTPUT},
    simulation::example_architecture,
};

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <architecture.json> [steps]", args[0]);
        eprintln!();
        eprintln!("Run a dynamic neural field architecture from a JSON description.");
        eprintln!();
        eprintln!("Arguments:");
        eprintln!("  architecture.json  Path to the architecture description");
        eprintln!("  steps              Number of simulation steps (default: 100)");
        eprintln!();
        eprintln!("An example architecture is printed with the --example flag.");
        std::process::exit(1);
    }

    if args[1] == "--example" {
        print_example_architecture();
        return;
    }

    let path = PathBuf::from(&args[1]);
    let steps: u64 = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(100);

    let mut factory = ElementFactory::new();
    let mut simulation = Simulation::load_architecture(&path, &mut factory).unwrap_or_else(|e| {
        eprintln!("Error loading architecture: {}", e);
        std::process::exit(1);
    });

    println!("DNF Simulation");
    println!("==============");
    println!("Identifier: {}", simulation.identifier());
    println!("Elements: {}", simulation.number_of_elements());
    for element in simulation.elements() {
        println!(
            "  {} ({}, {} samples, {} inputs)",
            element.unique_name(),
            element.label(),
            element.size(),
            element.inputs().len()
        );
    }
    println!("delta_t: {}", simulation.delta_t());
    println!("Steps: {}", steps);
    println!();

    simulation.init();

    println!("Running simulation...");
    let start = Instant::now();

    for i in 0..steps {
        simulation.step();

        // Print progress every 10%
        if (i + 1) % (steps / 10).max(1) == 0 {
            let elapsed = start.elapsed().as_secs_f32();
            let steps_per_sec = (i + 1) as f32 / elapsed;
            println!(
                "  Step {}/{}: t={}, {:.1} steps/s",
                i + 1,
                steps,
                simulation.t(),
                steps_per_sec
            );
        }
    }

    let elapsed = start.elapsed();
    simulation.close();

    println!();
    println!("Final state:");
    for element in simulation.elements() {
        let Some(field) = element.as_neural_field() else {
            continue;
        };
        let peak = element
            .component(OUTPUT)
            .map(|output| output.iter().cloned().fold(f64::MIN, f64::max))
            .unwrap_or(0.0);
        println!(
            "  {}: centroid={:.2}, bumps={}, stable={}, max output={:.4}",
            element.unique_name(),
            field.centroid(),
            field.bumps().len(),
            field.is_stable(),
            peak
        );
    }
    println!();
    println!(
        "Time: {:.2}s ({:.1} steps/s)",
        elapsed.as_secs_f32(),
        steps as f32 / elapsed.as_secs_f32()
    );
}

fn print_example_architecture() {
    match serde_json::to_string_pretty(&example_architecture()) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error serializing example: {}", e);
            std::process::exit(1);
        }
    }
}
