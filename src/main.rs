use clap::{Parser, Subcommand};
use console::style;
use stackadm::auth::TokenAuthenticationFactory;
use stackadm::client::DefaultClientFactory;
use stackadm::commands::{gallery, offers, plans, session, subscriptions, usage};
use stackadm::config::Profile;
use stackadm::context::ProfileContextResolver;
use stackadm::output::{OutputFormat, StreamOutput};
use stackadm::{logging, AdminCommand, CommandFailure, CommandHost};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "stackadm", version)]
#[command(about = "Administrative commands for Azure Stack resource management")]
struct Cli {
    /// Output format
    #[arg(long, short, value_enum, global = true, default_value_t = OutputFormat::Json)]
    output: OutputFormat,

    /// Profile file (defaults to $STACKADM_PROFILE or ~/.stackadm/profile.json)
    #[arg(long, global = true)]
    profile: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(long, short, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Store a signed-in session context
    Login(session::LoginArgs),
    /// Forget the stored session context
    Logout,
    /// Show the current session context
    Context,
    /// Managed offers
    Offers {
        #[command(subcommand)]
        action: OffersAction,
    },
    /// Plans
    Plans {
        #[command(subcommand)]
        action: PlansAction,
    },
    /// Tenant subscriptions
    Subscriptions {
        #[command(subcommand)]
        action: SubscriptionsAction,
    },
    /// Marketplace gallery items
    Gallery {
        #[command(subcommand)]
        action: GalleryAction,
    },
    /// Subscriber usage aggregates
    Usage(usage::UsageCommand),
}

#[derive(Debug, Subcommand)]
enum OffersAction {
    List(offers::ListOffersCommand),
}

#[derive(Debug, Subcommand)]
enum PlansAction {
    List(plans::ListPlansCommand),
}

#[derive(Debug, Subcommand)]
enum SubscriptionsAction {
    List(subscriptions::ListSubscriptionsCommand),
}

#[derive(Debug, Subcommand)]
enum GalleryAction {
    List(gallery::ListGalleryItemsCommand),
}

fn run_admin<C: AdminCommand>(
    host: &CommandHost<DefaultClientFactory>,
    command: &C,
    format: OutputFormat,
) -> Result<(), CommandFailure> {
    let mut out = StreamOutput::stdout(format);
    host.execute(command, &mut out).map(|_| ())
}

fn run(cli: Cli) -> Result<(), CommandFailure> {
    let profile_path = match cli.profile {
        Some(path) => path,
        None => Profile::default_path().map_err(|e| CommandFailure::new("profile", e))?,
    };
    let host = CommandHost::new(
        ProfileContextResolver::new(profile_path.clone()),
        TokenAuthenticationFactory::new(),
        DefaultClientFactory::new(),
    );
    let format = cli.output;

    match cli.command {
        Commands::Login(args) => session::login(args, &profile_path)
            .map(|_| ())
            .map_err(|e| CommandFailure::new("login", e)),
        Commands::Logout => session::logout(&profile_path)
            .map(|_| ())
            .map_err(|e| CommandFailure::new("logout", e)),
        Commands::Context => {
            let resolver = ProfileContextResolver::new(profile_path);
            let mut out = StreamOutput::stdout(format);
            session::show_context(&resolver, &mut out)
                .map(|_| ())
                .map_err(|e| CommandFailure::new("context", e))
        }
        Commands::Offers { action: OffersAction::List(cmd) } => run_admin(&host, &cmd, format),
        Commands::Plans { action: PlansAction::List(cmd) } => run_admin(&host, &cmd, format),
        Commands::Subscriptions { action: SubscriptionsAction::List(cmd) } => {
            run_admin(&host, &cmd, format)
        }
        Commands::Gallery { action: GalleryAction::List(cmd) } => run_admin(&host, &cmd, format),
        Commands::Usage(cmd) => run_admin(&host, &cmd, format),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(failure) => {
            eprintln!(
                "❌ {} {}: {}",
                style(failure.operation).red().bold(),
                style(format!("[{}]", failure.source.code())).dim(),
                failure.source
            );
            ExitCode::FAILURE
        }
    }
}
