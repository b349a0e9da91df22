//! ratewise CLI — weighted performance evaluations from the terminal.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "ratewise", version, about = "Weighted performance evaluations")]
struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Output format for sheets and results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Text,
    Markdown,
    Html,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a starter ratewise.toml
    Init,

    /// Remember who is evaluating
    Login {
        #[arg(long)]
        username: String,

        /// pm or user
        #[arg(long, default_value = "pm")]
        role: String,

        /// PM whose team and template are used
        #[arg(long)]
        pm_id: Option<String>,
    },

    /// Forget the stored user
    Logout,

    /// Manage projects
    Projects {
        #[command(subcommand)]
        action: ProjectAction,
    },

    /// List the team of the current PM
    Members {
        /// Project to check for saved evaluations (default: current)
        #[arg(long)]
        project: Option<String>,
    },

    /// Score a member, optionally saving the result
    Evaluate {
        /// Member id or username
        #[arg(long)]
        member: String,

        /// Project id (default: current)
        #[arg(long)]
        project: Option<String>,

        /// Set an item score, e.g. `--score 1=85`
        #[arg(long = "score", value_name = "ID=VALUE")]
        scores: Vec<String>,

        /// Set an item bonus, e.g. `--bonus 1=2`
        #[arg(long = "bonus", value_name = "ID=VALUE")]
        bonuses: Vec<String>,

        /// Set an item comment, e.g. `--comment "1=clean code"`
        #[arg(long = "comment", value_name = "ID=TEXT")]
        comments: Vec<String>,

        /// Submit the evaluation
        #[arg(long)]
        save: bool,
    },

    /// Render a member's evaluation sheet
    Show {
        /// Member id or username
        #[arg(long)]
        member: String,

        /// Project id (default: current)
        #[arg(long)]
        project: Option<String>,

        #[arg(long, value_enum, default_value = "text")]
        format: Format,

        /// Write to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Edit the evaluation items of a project
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },

    /// Show an employee's yearly result
    Report {
        #[arg(long)]
        year: i32,

        /// Login name or employee id (default: the logged-in user)
        #[arg(long)]
        employee: Option<String>,

        #[arg(long, value_enum, default_value = "text")]
        format: Format,

        /// Write to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Send feedback about a member's evaluation
    Feedback {
        #[arg(long)]
        member: String,

        #[arg(long)]
        project: Option<String>,

        #[arg(long)]
        message: String,
    },

    /// Ask for an interview about a member's evaluation
    Interview {
        #[arg(long)]
        member: String,

        #[arg(long)]
        project: Option<String>,

        /// Preferred date, e.g. 2026-11-02
        #[arg(long)]
        date: String,

        /// Preferred time, e.g. 14:00
        #[arg(long)]
        time: String,

        #[arg(long, default_value = "")]
        message: String,
    },

    /// Evaluations saved on this machine
    Records {
        #[command(subcommand)]
        action: RecordAction,
    },
}

#[derive(Subcommand)]
pub enum ProjectAction {
    /// List projects
    List,
    /// Create a project and switch to it
    Add {
        name: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Switch the current project
    Select { id: String },
    /// Rename or redescribe a project
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Delete a project and everything saved for it
    Delete { id: String },
}

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Show the evaluation items
    Show {
        #[arg(long)]
        project: Option<String>,
    },
    /// Change items and optionally save
    Edit {
        #[arg(long)]
        project: Option<String>,

        /// Add an item, e.g. `--add "Teamwork=10"`
        #[arg(long = "add", value_name = "NAME=RATIO")]
        add: Vec<String>,

        /// Remove an item by id
        #[arg(long = "remove", value_name = "ID")]
        remove: Vec<String>,

        /// Change a ratio, e.g. `--set-ratio 1=20`
        #[arg(long = "set-ratio", value_name = "ID=RATIO")]
        set_ratio: Vec<String>,

        /// Rename an item, e.g. `--rename "1=Code health"`
        #[arg(long = "rename", value_name = "ID=NAME")]
        rename: Vec<String>,

        /// Persist the result (ratios must sum to 100)
        #[arg(long)]
        save: bool,
    },
    /// Return to the stock items
    Reset {
        #[arg(long)]
        project: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum RecordAction {
    /// List saved evaluations
    List {
        /// List the server's stored evaluations instead
        #[arg(long)]
        remote: bool,
    },
    /// Show one saved evaluation
    Show {
        #[arg(long)]
        member: String,
        #[arg(long)]
        project: Option<String>,
    },
    /// Delete a saved evaluation from this machine
    Delete {
        #[arg(long)]
        member: String,
        #[arg(long)]
        project: Option<String>,
    },
    /// Upload a saved evaluation to the server's evaluation store
    Push {
        #[arg(long)]
        member: String,
        #[arg(long)]
        project: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ratewise=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.config;

    let result = match cli.command {
        Commands::Init => commands::init::execute(),
        Commands::Login {
            username,
            role,
            pm_id,
        } => commands::login::execute(config, username, role, pm_id),
        Commands::Logout => commands::login::logout(config),
        Commands::Projects { action } => commands::projects::execute(config, action),
        Commands::Members { project } => commands::members::execute(config, project).await,
        Commands::Evaluate {
            member,
            project,
            scores,
            bonuses,
            comments,
            save,
        } => {
            commands::evaluate::execute(
                config,
                commands::evaluate::EvaluateArgs {
                    member,
                    project,
                    scores,
                    bonuses,
                    comments,
                    save,
                },
            )
            .await
        }
        Commands::Show {
            member,
            project,
            format,
            output,
        } => commands::show::execute(config, member, project, format, output).await,
        Commands::Settings { action } => commands::settings::execute(config, action),
        Commands::Report {
            year,
            employee,
            format,
            output,
        } => commands::report::execute(config, year, employee, format, output).await,
        Commands::Feedback {
            member,
            project,
            message,
        } => commands::submit::feedback(config, member, project, message).await,
        Commands::Interview {
            member,
            project,
            date,
            time,
            message,
        } => commands::submit::interview(config, member, project, date, time, message).await,
        Commands::Records { action } => commands::records::execute(config, action).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
