//! Vitrine binary entry point.

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;
use vitrine::cli::harvest_cmd::HarvestArgs;
use vitrine::cli::{build_cmd, harvest_cmd, query_cmd, status, verify_cmd};
use vitrine::config::{vitrine_home, DataLayout};
use vitrine::pipeline::BuildOptions;
use vitrine::store::{DepartmentLoad, GroupField};

#[derive(Parser)]
#[command(
    name = "vitrine",
    version,
    about = "Harvest, clean, and query a museum collection"
)]
struct Cli {
    /// Data directory (default: ~/.vitrine)
    #[arg(long, global = true, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// SQLite store path (default: <data-dir>/collection.db)
    #[arg(long, global = true, value_name = "FILE")]
    db: Option<PathBuf>,

    /// Machine-readable JSON output
    #[arg(long, global = true)]
    json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch departments and object records from the collection API
    Harvest {
        /// Department ids to harvest (default: all; see --list)
        #[arg(value_name = "DEPARTMENT_ID")]
        departments: Vec<i64>,

        /// Print the published department list and exit
        #[arg(long)]
        list: bool,

        /// Keep running sessions until each department is exhausted
        #[arg(long)]
        auto: bool,

        /// Seconds to pause between sessions in auto mode
        #[arg(long, value_name = "SECS", default_value_t = 60)]
        session_delay: u64,

        /// Cap on successful fetches per session
        #[arg(long, value_name = "N")]
        session_limit: Option<u64>,
    },
    /// Clean harvested exports and load them into the store
    Build {
        /// Rewrite the department reference table instead of merging into it
        #[arg(long)]
        rebuild: bool,
    },
    /// Query the built store
    Query {
        #[command(subcommand)]
        query: QueryCommand,
    },
    /// Check store invariants, exiting non-zero on violations
    Verify,
    /// Show the data directory and store at a glance
    Status,
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum QueryCommand {
    /// List departments
    Departments,
    /// Category counts for one department and field
    Groups {
        #[arg(long)]
        department: String,

        /// classification, culture, country, isHighlight, isPublicDomain, or all
        #[arg(long)]
        field: GroupField,

        /// Collapse categories under this share of the total into one bucket
        #[arg(long, value_name = "RATIO")]
        collapse: Option<f64>,
    },
    /// Display metadata for every artwork in one department
    Details {
        #[arg(long)]
        department: String,

        #[arg(long, value_name = "N")]
        limit: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Output helpers read these flags from the environment.
    if cli.json {
        std::env::set_var("VITRINE_JSON", "1");
    }
    if cli.quiet {
        std::env::set_var("VITRINE_QUIET", "1");
    }
    if cli.verbose {
        std::env::set_var("VITRINE_VERBOSE", "1");
    }
    if cli.no_color {
        std::env::set_var("VITRINE_NO_COLOR", "1");
    }

    init_tracing(cli.verbose, cli.quiet);

    let layout = match &cli.data_dir {
        Some(dir) => DataLayout::new(dir),
        None => DataLayout::new(vitrine_home()),
    };
    let db_path = cli.db.clone().unwrap_or_else(|| layout.default_db_path());

    match cli.command {
        Command::Harvest {
            departments,
            list,
            auto,
            session_delay,
            session_limit,
        } => {
            let args = HarvestArgs {
                departments,
                list,
                auto,
                session_delay,
                session_limit,
            };
            harvest_cmd::run(layout, args).await
        }
        Command::Build { rebuild } => {
            let mut options = BuildOptions::new(layout);
            options.db_path = db_path;
            if rebuild {
                options.department_mode = DepartmentLoad::Replace;
            }
            build_cmd::run(options)
        }
        Command::Query { query } => match query {
            QueryCommand::Departments => query_cmd::departments(&db_path),
            QueryCommand::Groups {
                department,
                field,
                collapse,
            } => query_cmd::groups(&db_path, &department, field, collapse),
            QueryCommand::Details { department, limit } => {
                query_cmd::details(&db_path, &department, limit)
            }
        },
        Command::Verify => verify_cmd::run(&db_path),
        Command::Status => status::run(&layout, &db_path),
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
            Ok(())
        }
    }
}

fn init_tracing(verbose: bool, quiet: bool) {
    let directive = if verbose {
        "vitrine=debug"
    } else if quiet {
        "vitrine=warn"
    } else {
        "vitrine=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(directive.parse().unwrap()),
        )
        .with_writer(std::io::stderr)
        .init();
}
