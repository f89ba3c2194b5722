#![forbid(unsafe_code)]

mod actor;
mod cmd;
mod output;

use clap::{Parser, Subcommand};
use output::OutputMode;
use std::env;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "fixtrack: repair ticket tracker with a price-history ledger",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Override the recorded actor (skips env resolution).
    #[arg(long, global = true)]
    actor: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// Derive the output mode from flags.
    fn output_mode(&self) -> OutputMode {
        if self.json {
            OutputMode::Json
        } else {
            OutputMode::Human
        }
    }

    fn actor_flag(&self) -> Option<&str> {
        self.actor.as_deref()
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Lifecycle",
        about = "Initialize a fixtrack project",
        long_about = "Initialize a fixtrack project in the current directory.",
        after_help = "EXAMPLES:\n    # Initialize a project in the current directory\n    fxt init\n\n    # Emit machine-readable output\n    fxt init --json"
    )]
    Init(cmd::init::InitArgs),

    #[command(
        next_help_heading = "Lifecycle",
        about = "Manage customers",
        after_help = "EXAMPLES:\n    # Register a customer\n    fxt customer add --name \"Dana Reyes\" --phone \"(212) 555-0140\" --email dana@example.com"
    )]
    Customer {
        #[command(subcommand)]
        command: CustomerCommand,
    },

    #[command(
        next_help_heading = "Lifecycle",
        about = "Open a repair ticket",
        long_about = "Open a repair ticket for a registered customer's device.",
        after_help = "EXAMPLES:\n    # Intake a laptop with an initial estimate\n    fxt intake --customer cu-abc --device-type laptop --brand Lenovo --model T14 \\\n        --issue \"no display\" --repair 120 --parts 80\n\n    # Emit machine-readable output\n    fxt intake --customer cu-abc --device-type phone --brand Apple --model \"iPhone 13\" \\\n        --issue \"cracked screen\" --json"
    )]
    Intake(cmd::intake::IntakeArgs),

    #[command(
        next_help_heading = "Read",
        about = "Show one ticket",
        long_about = "Show full details, price history, and updates for a ticket.",
        after_help = "EXAMPLES:\n    # Show a ticket\n    fxt show FT-7K2M9P\n\n    # Emit machine-readable output\n    fxt show FT-7K2M9P --json"
    )]
    Show(cmd::show::ShowArgs),

    #[command(
        next_help_heading = "Read",
        about = "Find tickets by number, phone, name, or email",
        after_help = "EXAMPLES:\n    # By phone, punctuation ignored\n    fxt find --phone \"(212) 555-0140\"\n\n    # By name substring\n    fxt find --name reyes\n\n    # By exact ticket number\n    fxt find --number FT-7K2M9P"
    )]
    Find(cmd::find::FindArgs),

    #[command(
        next_help_heading = "Read",
        about = "List tickets with filters",
        after_help = "EXAMPLES:\n    # Everything currently in repair\n    fxt list --status in_repair\n\n    # Intake during March\n    fxt list --from 2026-03-01 --to 2026-04-01"
    )]
    List(cmd::list::ListArgs),

    #[command(
        next_help_heading = "Lifecycle",
        about = "Move a ticket to a new status",
        long_about = "Move a ticket along received -> diagnosed -> in_repair -> ready_for_pickup -> delivered, or cancel it.",
        after_help = "EXAMPLES:\n    # Mark diagnosed\n    fxt status FT-7K2M9P diagnosed\n\n    # Cancel\n    fxt status FT-7K2M9P cancelled"
    )]
    Status(cmd::status::StatusArgs),

    #[command(
        next_help_heading = "Lifecycle",
        about = "Edit ticket details",
        long_about = "Edit the diagnosis, technician, notes, issue description, or device on a ticket. Omitted fields keep their value.",
        after_help = "EXAMPLES:\n    # Record the diagnosis and assign a technician\n    fxt edit FT-7K2M9P --diagnosis \"failed inverter board\" --technician ana\n\n    # Correct the device details\n    fxt edit FT-7K2M9P --device-type laptop --brand Lenovo --model T14s"
    )]
    Edit(cmd::edit::EditArgs),

    #[command(
        next_help_heading = "Lifecycle",
        about = "Edit cost components",
        long_about = "Set one or more cost components; every change to the total is recorded in the price history.",
        after_help = "EXAMPLES:\n    # Raise the repair estimate\n    fxt cost FT-7K2M9P --repair 150\n\n    # Attribute the change explicitly\n    fxt cost FT-7K2M9P --parts 80.50 --actor front-desk"
    )]
    Cost(cmd::cost::CostArgs),

    #[command(
        next_help_heading = "Lifecycle",
        about = "Log a customer-facing update",
        after_help = "EXAMPLES:\n    # Record an update sent by WhatsApp\n    fxt log FT-7K2M9P -m \"Parts ordered, ETA Friday\" --whatsapp"
    )]
    Log(cmd::log::LogArgs),

    #[command(
        next_help_heading = "Lifecycle",
        about = "Deliver a ticket and notify the customer",
        long_about = "Mark a ready-for-pickup ticket as delivered, snapshot the final total, log the pickup message, and send the notification.",
        after_help = "EXAMPLES:\n    # Deliver with the default pickup message\n    fxt complete FT-7K2M9P --whatsapp\n\n    # Custom message\n    fxt complete FT-7K2M9P -m \"Ready! We close at 6pm.\" --email"
    )]
    Complete(cmd::complete::CompleteArgs),
}

#[derive(Subcommand, Debug)]
enum CustomerCommand {
    #[command(about = "Register a customer")]
    Add(cmd::customer::CustomerAddArgs),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("FIXTRACK_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "fixtrack=debug,info"
        } else {
            "fixtrack=info,warn"
        })
    });

    let format = env::var("FIXTRACK_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry.with(fmt::layer().json().with_ansi(false)).init();
        }
        _ => {
            registry.with(fmt::layer().compact()).init();
        }
    }
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let project_root = std::env::current_dir()?;
    let output = cli.output_mode();

    match cli.command {
        Commands::Init(ref args) => cmd::init::run_init(args, output, &project_root),
        Commands::Customer {
            command: CustomerCommand::Add(ref args),
        } => cmd::customer::run_customer_add(args, output, &project_root),
        Commands::Intake(ref args) => cmd::intake::run_intake(args, output, &project_root),
        Commands::Show(ref args) => cmd::show::run_show(args, output, &project_root),
        Commands::Find(ref args) => cmd::find::run_find(args, output, &project_root),
        Commands::List(ref args) => cmd::list::run_list(args, output, &project_root),
        Commands::Status(ref args) => cmd::status::run_status(args, output, &project_root),
        Commands::Edit(ref args) => cmd::edit::run_edit(args, output, &project_root),
        Commands::Cost(ref args) => {
            cmd::cost::run_cost(args, cli.actor_flag(), output, &project_root)
        }
        Commands::Log(ref args) => cmd::log::run_log(args, output, &project_root),
        Commands::Complete(ref args) => {
            cmd::complete::run_complete(args, cli.actor_flag(), output, &project_root)
        }
    }
}
