use anyhow::Result;
use clap::{Parser, Subcommand};

use tally::cli::{
    handle_balance_command, handle_expense_command, handle_export_command, handle_group_command,
    handle_settle_command, ExpenseCommands, ExportArgs, GroupCommands, SettleCommands,
};
use tally::config::{paths::TallyPaths, settings::Settings};
use tally::logging::{init_logging, level_for_verbosity};
use tally::services::GroupService;
use tally::storage::Storage;

#[derive(Parser)]
#[command(
    name = "tally",
    version,
    about = "Split shared expenses and settle up from the terminal",
    long_about = "Tally keeps track of who paid what in a group, splits every \
                  expense equally, by percentage or by fixed amounts, and \
                  suggests the transfers that settle everyone up."
)]
struct Cli {
    /// Increase diagnostic output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Group and member management
    #[command(subcommand)]
    Group(GroupCommands),

    /// Expense management
    #[command(subcommand, alias = "exp")]
    Expense(ExpenseCommands),

    /// Show net balances of a group
    Balance {
        /// Group name or ID
        group: String,
    },

    /// Plan or record settlements
    #[command(subcommand)]
    Settle(SettleCommands),

    /// Export data as CSV, JSON or YAML
    Export(ExportArgs),

    /// Initialize the data directory
    Init,

    /// Show current configuration and paths
    Config,

    /// Show recent changes from the audit log
    Audit {
        /// Number of entries to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
        /// Only show changes to this group
        #[arg(short, long)]
        group: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let paths = TallyPaths::new()?;
    let settings = Settings::load_or_create(&paths)?;
    init_logging(&level_for_verbosity(&settings.log_level, cli.verbose));
    tracing::debug!(base_dir = %paths.base_dir().display(), "resolved paths");

    let mut storage = Storage::new(paths.clone())?;
    storage.load_all()?;

    match cli.command {
        Some(Commands::Group(cmd)) => handle_group_command(&storage, &settings, cmd)?,
        Some(Commands::Expense(cmd)) => handle_expense_command(&storage, &settings, cmd)?,
        Some(Commands::Balance { group }) => handle_balance_command(&storage, &group)?,
        Some(Commands::Settle(cmd)) => handle_settle_command(&storage, &settings, cmd)?,
        Some(Commands::Export(args)) => handle_export_command(&storage, args)?,
        Some(Commands::Init) => {
            println!("Initializing Tally at: {}", paths.base_dir().display());
            if tally::storage::init::initialize_storage(&paths)? {
                println!("Initialization complete!");
                println!();
                println!("Create your first group with 'tally group create <name>'.");
            } else {
                println!("Already initialized, nothing to do.");
            }
        }
        Some(Commands::Config) => {
            println!("Tally Configuration");
            println!("===================");
            println!("Base directory: {}", paths.base_dir().display());
            println!("Data directory: {}", paths.data_dir().display());
            println!("Audit log:      {}", paths.audit_log().display());
            println!();
            println!("Settings:");
            println!("  Default currency:   {}", settings.default_currency);
            println!("  Default split:      {}", settings.default_split);
            println!("  Exact search limit: {}", settings.exact_search_limit);
            println!("  Date format:        {}", settings.date_format);
            println!("  Log level:          {}", settings.log_level);
        }
        Some(Commands::Audit { limit, group }) => {
            let group_id = match group {
                Some(identifier) => Some(GroupService::new(&storage).require(&identifier)?.id.to_string()),
                None => None,
            };
            let entries = storage.audit().read_recent(limit, group_id.as_deref())?;
            if entries.is_empty() {
                println!("No audit entries found.");
            }
            for entry in entries {
                println!("{}", entry.format_human_readable());
            }
        }
        None => {
            println!("Tally - shared expense splitting");
            println!();
            println!("Run 'tally --help' for usage information.");
        }
    }

    Ok(())
}
