mod args;
mod config;
mod lexer;
mod line_map;
mod line_reader;
mod logger;
mod paths;
mod pi_mutex;
mod process;
mod reader;
mod reaper;
mod slots;
mod supervisor;
mod sync_util;

use args::Args;
use config::Config;
use log::{error, info};
use supervisor::Supervisor;

fn main() -> anyhow::Result<()> {
    let args = Args::parse_args();

    let config_path = args.config.clone().map(Ok).unwrap_or_else(paths::get_config_path);
    let config = match config_path {
        Ok(path) => Config::load(&path),
        Err(_) => Config::default(),
    };

    if let Err(e) = logger::init_logger(&config.logging) {
        eprintln!("Failed to initialize logger: {e}");
    }

    info!("Config loaded: {:?}", config);

    let max_tasks = args.max_tasks.unwrap_or(config.supervisor.max_tasks);

    let mut supervisor = Supervisor::new(
        max_tasks,
        config.supervisor.max_line,
        config.supervisor.max_command_line,
    )?;

    let stdin = std::io::stdin();
    match supervisor.run(stdin.lock()) {
        Ok(()) => Ok(()),
        Err(e) => {
            error!("fatal supervisor error: {e}");
            std::process::exit(1);
        }
    }
}
