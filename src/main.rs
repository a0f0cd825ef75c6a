use std::env;
use std::path::Path;
use std::process;

use mis_analysis::analyze;
use mis_analysis::config::AnalysisConfig;
use mis_analysis::data::loader::InputError;

fn usage() {
    println!("Usage: mis_analysis <results_directory> [config.json]");
    println!("Example: mis_analysis results/");
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        println!("Error: {}", InputError::MissingArgument);
        usage();
        process::exit(1);
    }

    let config = match args.get(2) {
        Some(path) => AnalysisConfig::load(Path::new(path))?,
        None => AnalysisConfig::default(),
    };

    if let Err(err) = analyze::run(Path::new(&args[1]), &config) {
        if let Some(input) = err.downcast_ref::<InputError>() {
            println!("Error: {input}");
            usage();
            process::exit(1);
        }
        return Err(err);
    }
    Ok(())
}
