use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use timesheet_core::Config;

mod commands;
mod logging;

#[derive(Parser)]
#[command(name = "timesheet-cli", version, about = "Weekly timesheet CLI")]
struct Cli {
    /// Employee whose timesheet to work on
    #[arg(long, global = true)]
    employee: Option<String>,
    /// Any date inside the week to work on (YYYY-MM-DD, defaults to today)
    #[arg(long, global = true)]
    week: Option<NaiveDate>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Employee directory
    Employee {
        #[command(subcommand)]
        action: commands::employee::EmployeeAction,
    },
    /// Week overview and totals
    Week {
        #[command(subcommand)]
        action: commands::week::WeekAction,
    },
    /// Task management for the selected week
    Task {
        #[command(subcommand)]
        action: commands::task::TaskAction,
    },
    /// Timer control
    Timer {
        #[command(subcommand)]
        action: commands::timer::TimerAction,
    },
    /// Day notes
    Note {
        #[command(subcommand)]
        action: commands::note::NoteAction,
    },
    /// Lock the week, export it and send it to the server
    Submit,
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn main() {
    let cli = Cli::parse();

    let config = Config::load();
    let level = config
        .as_ref()
        .map(|c| c.log.level.clone())
        .unwrap_or_else(|_| "info".to_string());
    logging::init(&level);

    let ctx = commands::Context {
        employee: cli.employee,
        week: cli.week,
    };
    let result = match cli.command {
        // Config commands must work even when the file is broken.
        Commands::Config { action } => commands::config::run(action),
        command => match config {
            Ok(config) => dispatch(command, &ctx, config),
            Err(e) => Err(e.into()),
        },
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn dispatch(command: Commands, ctx: &commands::Context, config: Config) -> commands::CliResult {
    match command {
        Commands::Employee { action } => commands::employee::run(action, config),
        Commands::Week { action } => commands::week::run(action, ctx, config),
        Commands::Task { action } => commands::task::run(action, ctx, config),
        Commands::Timer { action } => commands::timer::run(action, ctx, config),
        Commands::Note { action } => commands::note::run(action, ctx, config),
        Commands::Submit => commands::submit::run(ctx, config),
        Commands::Config { action } => commands::config::run(action),
    }
}
