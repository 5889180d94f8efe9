//! smtp-diag command line tool
//!
//! This binary is the command-line interface for smtp-diag.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use log::{info, warn};

use smtp_diag::{APP_NAME, VERSION};
use smtp_diag::api::{self, AppState};
use smtp_diag::commands::{self, SEND_TEST_MESSAGE, SEND_TEST_SUBJECT};
use smtp_diag::common::{Console, Result, init_logger};
use smtp_diag::config::{self, ConfigValidator, ConfigValues, MailConfig, parse_socket_addr};
use smtp_diag::mail::transport_from_config;

/// SMTP diagnostics: certificate probe and test email sender
#[derive(Parser, Debug)]
#[clap(author, version = VERSION, about, long_about = None)]
struct Args {
    /// Load configuration from a JSON file
    #[clap(long, global = true)]
    config_file: Option<PathBuf>,

    /// Log level (overridden by RUST_LOG)
    #[clap(long, global = true)]
    log_level: Option<String>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check the TLS certificate of an SMTP server for hostname mismatches
    CheckCert {
        /// SMTP host to check (defaults to the configured host)
        #[clap(long)]
        host: Option<String>,

        /// SMTP port to check (defaults to the configured port)
        #[clap(long)]
        port: Option<u16>,
    },

    /// Send a test email to verify the mail configuration
    SendTest {
        /// Recipient address
        to_email: String,

        /// Subject line
        #[clap(long, default_value = SEND_TEST_SUBJECT)]
        subject: String,

        /// Message body
        #[clap(long, default_value = SEND_TEST_MESSAGE)]
        message: String,
    },

    /// Serve the test email HTTP API
    Serve {
        /// Listen address
        #[clap(long)]
        listen: Option<String>,
    },
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let mut cli_values = ConfigValues {
        log_level: args.log_level.clone(),
        ..Default::default()
    };
    if let Command::Serve { listen: Some(listen) } = &args.command {
        cli_values.listen = Some(parse_socket_addr(listen)?);
    }

    let config = config::load(args.config_file.clone(), cli_values)?;

    // The logger needs the resolved level, so loading itself is not logged
    init_logger(config.log_level());
    info!("Starting {} v{}", APP_NAME, VERSION);
    for warning in config.check_warnings() {
        warn!("{}", warning);
    }
    config.log();

    match args.command {
        Command::CheckCert { host, port } => {
            let mut out = Console::stdout();
            commands::check_cert(&config, host.as_deref(), port, &mut out);
            Ok(ExitCode::SUCCESS)
        }
        Command::SendTest { to_email, subject, message } => {
            let transport = transport_from_config(&config)?;
            let mut out = Console::stdout();
            let sent = commands::send_test(&config, transport.as_ref(), &to_email, &subject, &message, &mut out);
            Ok(if sent { ExitCode::SUCCESS } else { ExitCode::FAILURE })
        }
        Command::Serve { .. } => {
            serve(config)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn serve(config: MailConfig) -> Result<()> {
    let listen = config.listen();
    let state = AppState::from_config(config)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    info!("Service ready, press Ctrl+C to stop");
    runtime.block_on(api::serve(listen, state))
}
