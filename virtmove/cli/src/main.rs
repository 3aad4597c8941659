#![warn(clippy::indexing_slicing)]

use clap::{CommandFactory, Parser};
use clap_complete::generate;
use config::{Cli, Commands};
use error::{CliError, CliResult};

mod clone;
mod config;
mod convert;
mod error;
mod kube;
mod logging;
mod output;
mod prompt;
#[cfg(test)]
mod testing;

fn main() -> miette::Result<()> {
    let cli = Cli::parse();

    logging::init_tracing_registry(cli.log_level.as_deref());

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(CliError::RuntimeError)?;

    let res: CliResult<()> = rt.block_on(async move {
        match cli.commands {
            Commands::Clone(args) => clone::clone_command(&cli.kube, *args).await?,
            Commands::Convert(args) => convert::convert_command(&cli.kube, *args).await?,
            Commands::Completions(args) => {
                let mut cmd: clap::Command = Cli::command();
                generate(args.shell, &mut cmd, "virtmove", &mut std::io::stdout());
            }
        };

        Ok(())
    });

    res.map_err(Into::into)
}
