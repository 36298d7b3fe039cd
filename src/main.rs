// External crates
use anyhow::Result;
use std::env;

// Local crate
use neural_stock_predictor::config::PipelineConfig;
use neural_stock_predictor::pipeline;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Optional JSON config file as the only argument; defaults otherwise
    let args: Vec<String> = env::args().collect();
    let config = match args.get(1) {
        Some(path) => PipelineConfig::from_file(path)?,
        None => PipelineConfig::default(),
    };

    let report = pipeline::run(&config, |progress| {
        println!(
            "Network error for iteration {} : {:.6}%",
            progress.iteration,
            progress.total_error * 100.0
        );
    })?;

    println!("{}", report);
    Ok(())
}
