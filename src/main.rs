use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

use ksiso::cli::{Cli, Commands};
use ksiso::config;
use ksiso::core::password::{encrypt_password, prompt_root_password, TerminalPrompt};
use ksiso::core::{BuildOptions, Builder, Inspector};
use ksiso::logging;
use ksiso::utils::SystemCommandRunner;

fn run(command: Commands) -> Result<()> {
    let runner = SystemCommandRunner::new();

    match command {
        Commands::Build {
            json,
            suffix,
            firstboot,
            mount_dir,
            checksum_file,
        } => {
            info!("Building ISO from: {}", json.display());
            let image_config = config::load_config(&json)?;

            let password = prompt_root_password(&TerminalPrompt::new())?;
            let encrypted = encrypt_password(&runner, &password)?;

            let options = BuildOptions {
                mount_dir,
                firstboot_script: firstboot,
                suffix,
                write_checksum_file: checksum_file,
                ..BuildOptions::default()
            };
            Builder::new(image_config, encrypted, options, &runner).build()?;
        }
        Commands::ShowKs { iso, mount_dir } => {
            info!("Reading the KS file from: {}", iso.display());
            Inspector::new(&runner, mount_dir).show_kickstart(&iso)?;
        }
        Commands::Validate { json } => {
            info!("Validating configuration: {}", json.display());
            config::validate_config_file(&json)?;
        }
    }

    Ok(())
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = logging::init_logging(&cli.log_dir, cli.verbose) {
        eprintln!("Failed to initialize logging: {:#}", e);
        std::process::exit(1);
    }

    info!("ksiso v{} starting", ksiso::VERSION);

    match run(cli.command) {
        Ok(()) => info!("✓ Operation completed successfully"),
        Err(e) => {
            error!("✗ Operation failed: {:#}", e);
            std::process::exit(1);
        }
    }
}
