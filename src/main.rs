mod animate;
mod app;
mod backend;
mod cli;
mod color;
mod error;
mod gamma;
mod kelvin;

use clap::Parser;
use log::LevelFilter;
use std::process::ExitCode;

use backend::Registry;
use cli::Opts;

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

fn main() -> ExitCode {
    let opts = match Opts::try_parse() {
        Ok(opts) => opts,
        Err(err) => {
            let _ = err.print();
            return ExitCode::from(cli::exit_code(&err));
        }
    };
    init_logging(opts.verbose);

    let registry = Registry::native(opts.state_dir.clone());
    let request = opts.request(&registry);
    log::debug!("{request:?}");

    match app::run(&request, &registry) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err:#}");
            ExitCode::from(err.exit_code())
        }
    }
}
