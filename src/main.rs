use std::io;
use std::process;

use anyhow::Result;
use clap::CommandFactory;
use clap_complete::generate;
use tracing::error;

use casetest::cli;

fn main() -> Result<()> {
    let args = cli::parse_args()?;

    // Completion output should be clean without any logging.
    if let cli::Commands::Completions(opts) = &args.command {
        let mut cmd = cli::Cli::command();
        generate(opts.shell, &mut cmd, "casetest", &mut io::stdout());
        return Ok(());
    }

    let log_level = match &args.command {
        cli::Commands::Run(opts) => opts.common.log_level,
        cli::Commands::Validate(opts) => opts.common.log_level,
        cli::Commands::Completions(_) => unreachable!("completions handled above"),
    };
    casetest::init_logging(log_level)?;

    match &args.command {
        cli::Commands::Run(opts) => match casetest::run_run(opts) {
            Ok(true) => {}
            Ok(false) => {
                error!("one or more tests did not complete successfully");
                process::exit(1);
            }
            Err(e) => {
                error!("{:#}", e);
                process::exit(1);
            }
        },
        cli::Commands::Validate(opts) => {
            if let Err(e) = casetest::run_validate(opts) {
                error!("{:#}", e);
                process::exit(1);
            }
        }
        cli::Commands::Completions(_) => unreachable!("completions handled above"),
    }

    Ok(())
}
