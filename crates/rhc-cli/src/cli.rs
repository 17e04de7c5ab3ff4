//! Argument parsing, logging setup and command dispatch.

use std::env;
use std::io;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use rhc_clients::{FactCollector, daemon, insights, subscription};
use rhc_core::{CredentialFlags, TerminalPrompter};
use rhc_telemetry::{CommandContextGuard, LogFormat, LogLevel, LoggingConfig, init_logging};
use tracing::{debug, info};

use crate::client::{AppContext, CliError, CliResult, HostClients, ToolConfig};
use crate::commands::connect::handle_connect;
use crate::commands::disconnect::handle_disconnect;
use crate::commands::facts::handle_canonical_facts;
use crate::commands::status::handle_status;
use crate::output::Theme;

const BUILD_ID: &str = env!("CARGO_PKG_VERSION");
const VERSION_LINE: &str = concat!("version ", env!("CARGO_PKG_VERSION"));

/// Parses CLI arguments, installs logging and executes the requested command.
/// Returns the process exit code.
pub async fn run() -> i32 {
    let cli = Cli::parse();
    let no_color = cli.no_color || env::var_os("NO_COLOR").is_some();
    let theme = Theme::detect(no_color, cli.format);

    let logging = LoggingConfig {
        level: cli.log_level,
        format: cli.log_format,
        ansi: !no_color,
        build_sha: BUILD_ID,
    };
    if let Err(err) = init_logging(&logging) {
        eprintln!("error: {err}");
        return 1;
    }
    let _context = CommandContextGuard::new(command_label(&cli.command));
    debug!(log_level = %cli.log_level, "command started");

    let ctx = AppContext {
        theme,
        format: cli.format,
        log_level: cli.log_level,
    };

    match dispatch(cli, &ctx).await {
        Ok(()) => {
            info!("command completed");
            0
        }
        Err(err) => {
            if let Some(message) = err.display_message() {
                eprintln!("error: {message}");
            }
            err.exit_code()
        }
    }
}

async fn dispatch(cli: Cli, ctx: &AppContext) -> CliResult<()> {
    let tools = cli.tools.into_config();
    let host = HostClients::new(&tools);
    let clients = host.clients();
    let mut stdout = io::stdout();

    match cli.command {
        Command::Connect(args) => {
            let hostname = rhc_core::host::hostname().map_err(CliError::failure)?;
            handle_connect(
                ctx,
                clients,
                &hostname,
                args.into_flags(),
                TerminalPrompter,
                &mut stdout,
            )
            .await
        }
        Command::Disconnect => {
            let hostname = rhc_core::host::hostname().map_err(CliError::failure)?;
            handle_disconnect(ctx, clients, &hostname, &mut stdout).await
        }
        Command::Status => {
            let hostname = rhc_core::host::hostname().map_err(CliError::failure)?;
            handle_status(ctx, clients, &hostname, &mut stdout).await
        }
        Command::CanonicalFacts => {
            if !tools.facts_root.is_dir() {
                return Err(CliError::validation(format!(
                    "facts root {} is not a directory",
                    tools.facts_root.display()
                )));
            }
            let collector = FactCollector::new(tools.facts_root.clone());
            handle_canonical_facts(&collector, clients.subscription, &mut stdout).await
        }
    }
}

/// Output format for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Human-readable lines with status markers.
    Text,
    /// One JSON document per command.
    Json,
}

#[derive(Parser)]
#[command(
    name = "rhc",
    version = VERSION_LINE,
    about = "Connect the system to Red Hat",
    long_about = "rhc connects the system to Red Hat Subscription Management, Red Hat Insights \
                  and activates the rhc daemon. For details visit: https://red.ht/connector"
)]
pub(crate) struct Cli {
    /// Disable colour and animated output (also set by the NO_COLOR environment variable).
    #[arg(long, global = true)]
    no_color: bool,
    /// Most verbose log level written to stderr: error, warn, info, debug or trace.
    #[arg(long, global = true, env = "RHC_LOG_LEVEL", default_value = "error")]
    log_level: LogLevel,
    /// Log line format: pretty or json.
    #[arg(long, global = true, env = "RHC_LOG_FORMAT", default_value = "pretty")]
    log_format: LogFormat,
    #[arg(
        long,
        global = true,
        value_enum,
        default_value_t = OutputFormat::Text,
        help = "Select output format for command results"
    )]
    format: OutputFormat,
    #[command(flatten)]
    tools: ToolArgs,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Connect the system to Red Hat Subscription Management, Red Hat Insights
    /// and activate the rhc daemon.
    Connect(ConnectArgs),
    /// Disconnect the system from Red Hat and deactivate the rhc daemon.
    Disconnect,
    /// Print the connection state of each subsystem.
    Status,
    /// Print data that uniquely identifies the system in the inventory service.
    #[command(hide = true)]
    CanonicalFacts,
}

#[derive(Args, Default)]
pub(crate) struct ConnectArgs {
    /// Register with this username.
    #[arg(short, long)]
    username: Option<String>,
    /// Register with this password.
    #[arg(short, long)]
    password: Option<String>,
    /// Register with this organization ID (requires activation keys).
    #[arg(short, long)]
    organization: Option<String>,
    /// Register with this activation key; may be repeated.
    #[arg(short = 'a', long = "activation-key", value_name = "KEY")]
    activation_keys: Vec<String>,
    /// Register against this subscription server URL.
    #[arg(long)]
    server: Option<String>,
}

impl ConnectArgs {
    pub(crate) fn into_flags(self) -> CredentialFlags {
        CredentialFlags {
            organization: self.organization.unwrap_or_default(),
            activation_keys: self.activation_keys,
            username: self.username.unwrap_or_default(),
            password: self.password.unwrap_or_default(),
            server: self.server.filter(|url| !url.is_empty()),
        }
    }
}

#[derive(Args)]
struct ToolArgs {
    #[arg(
        long,
        global = true,
        hide = true,
        env = "RHC_SUBSCRIPTION_MANAGER",
        default_value = subscription::PROGRAM
    )]
    subscription_manager: String,
    #[arg(
        long,
        global = true,
        hide = true,
        env = "RHC_INSIGHTS_CLIENT",
        default_value = insights::PROGRAM
    )]
    insights_client: String,
    #[arg(long, global = true, hide = true, env = "RHC_SYSTEMCTL", default_value = daemon::PROGRAM)]
    systemctl: String,
    #[arg(
        long,
        global = true,
        hide = true,
        env = "RHC_DAEMON_UNIT",
        default_value = daemon::DEFAULT_UNIT
    )]
    daemon_unit: String,
    #[arg(long, global = true, hide = true, env = "RHC_FACTS_ROOT", default_value = "/")]
    facts_root: PathBuf,
}

impl ToolArgs {
    fn into_config(self) -> ToolConfig {
        ToolConfig {
            subscription_manager: self.subscription_manager,
            insights_client: self.insights_client,
            systemctl: self.systemctl,
            daemon_unit: self.daemon_unit,
            facts_root: self.facts_root,
        }
    }
}

const fn command_label(command: &Command) -> &'static str {
    match command {
        Command::Connect(_) => "connect",
        Command::Disconnect => "disconnect",
        Command::Status => "status",
        Command::CanonicalFacts => "canonical_facts",
    }
}
