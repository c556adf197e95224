extern crate colored;
use colored::*;
use std::error::Error;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering::Relaxed;
use std::sync::Arc;
use std::time::Instant;

use clap::{App, Arg};
use log::{info, warn};
#[cfg(feature = "profiling_enabled")]
use rust_hawktracer::{HawktracerInstance, HawktracerListenerType};
#[cfg(feature = "profiling_enabled")]
use std::path::PathBuf;

use decomposition::master::{HighsMaster, SolutionMethod};
#[cfg(feature = "gurobi")]
use decomposition::master::GurobiMaster;
use shared::{DecompositionConfig, Instance};

pub fn main() {
    pretty_env_logger::env_logger::Builder::from_env(
        pretty_env_logger::env_logger::Env::default().default_filter_or("info"),
    )
    .init();

    if let Err(e) = run() {
        eprintln!("{}", format!("♞ Failed: {}", e).on_red().bold());
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let matches = App::new("cflp")
        .about("Capacitated facility location by Benders decomposition")
        .arg(Arg::with_name("facilities")
            .short("f")
            .long("facilities")
            .value_name("FILE")
            .help("Facilities to load (id, capacity, fixed_cost)")
            .required(true)
            .takes_value(true))
        .arg(Arg::with_name("customers")
            .short("c")
            .long("customers")
            .value_name("FILE")
            .help("Customers to load (id, demand)")
            .required(true)
            .takes_value(true))
        .arg(Arg::with_name("costs")
            .short("s")
            .long("costs")
            .value_name("FILE")
            .help("Unit shipping costs to load (customer, facility, cost)")
            .required(true)
            .takes_value(true))
        .arg(Arg::with_name("config")
            .long("config")
            .value_name("FILE")
            .help("Decomposition settings (TOML)")
            .takes_value(true))
        .arg(Arg::with_name("method")
            .long("method")
            .possible_values(&["highs", "gurobi"])
            .default_value("highs"))
        .arg(Arg::with_name("workers")
            .long("workers")
            .env("SLURM_CPUS_PER_TASK")
            .takes_value(true))
        .arg(Arg::with_name("master_lp")
            .long("master_lp")
            .value_name("FILE")
            .help("Write the initial master model to FILE")
            .takes_value(true))
        .arg(Arg::with_name("hawktracer_output")
            .long("hawktracer_output")
            .default_value("/dev/null"))
        .get_matches();

    #[cfg(feature = "perf_statistics")]
    {
        shared::setup_metrics_printer(std::time::Duration::from_secs(5));
    }

    #[cfg(feature = "profiling_enabled")]
    let hawktracer = HawktracerInstance::new();
    #[cfg(feature = "profiling_enabled")]
    let _listener = match matches.value_of("hawktracer_output") {
        Some(path) if path != "/dev/null" => hawktracer.create_listener(HawktracerListenerType::ToFile {
            file_path: PathBuf::from(path),
            buffer_size: 4096,
        }),
        _ => hawktracer.create_listener(HawktracerListenerType::TCP {
            port: 12345,
            buffer_size: 4096,
        }),
    };

    let mut config = match matches.value_of("config") {
        Some(path) => DecompositionConfig::load(path)?,
        None => DecompositionConfig::default(),
    };
    if let Some(workers) = matches.value_of("workers") {
        config.threads = workers.parse::<i32>()?;
    }
    if let Some(path) = matches.value_of("master_lp") {
        config.master_model_output = Some(path.to_string());
    }

    // required arguments, clap rejects the call without them
    let instance = Instance::load(
        matches.value_of("facilities").unwrap_or_default(),
        matches.value_of("customers").unwrap_or_default(),
        matches.value_of("costs").unwrap_or_default(),
    )?;

    eprintln!("{}", "♞ Loading Data Completed".on_green().bold());
    info!(
        "Working with {} customers and {} facilities",
        instance.num_customers(),
        instance.num_facilities()
    );

    let should_stop = Arc::new(AtomicBool::new(false));
    let handler_stop = should_stop.clone();
    ctrlc::set_handler(move || {
        warn!("Interrupted, stopping at the next check");
        handler_stop.store(true, Relaxed);
    })?;

    let method: Box<dyn SolutionMethod> = match matches.value_of("method") {
        #[cfg(feature = "gurobi")]
        Some("gurobi") => Box::new(GurobiMaster::new(config)),
        #[cfg(not(feature = "gurobi"))]
        Some("gurobi") => return Err("built without the gurobi feature".into()),
        _ => Box::new(HighsMaster::new(config)),
    };

    let start = Instant::now();
    let solution = method.run(&instance, should_stop)?;

    eprintln!("{}", "♞ Decomposition Completed".on_green().bold());

    println!("{}", solution);
    println!("Duration: {}s", start.elapsed().as_secs());

    Ok(())
}
