use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;

mod cli_args;
mod commands;
mod tracing;

use cli_args::{CliArgs, Commands};

fn main() -> Result<()> {
    tracing::setup_logging();

    #[cfg(feature = "native-backup")]
    syncml_backup::register_native();

    let args = CliArgs::parse();
    let config = args.config.as_deref();

    match &args.command {
        Commands::Modules => commands::modules::list(config),
        Commands::Capabilities { module } => commands::modules::capabilities(config, module),
        Commands::Write(target) => commands::sync::write(target, config),
        Commands::Read(read_args) => commands::sync::read(read_args, config),
        Commands::CheckConfig { path } => commands::config::check(path),
        Commands::Completion { shell } => {
            let mut cmd = CliArgs::command();
            let name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, name, &mut std::io::stdout());
            Ok(())
        }
    }
}
