use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::anyhow;
use chrono::NaiveDate;
use clap::{ArgAction, Args, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::grid::CalendarMode;
use crate::i18n::Language;
use crate::model::Priority;
use crate::views::{AppView, TaskFilter};

#[derive(Debug, Clone)]
pub struct KeyVal {
    pub key: String,
    pub value: String,
}

impl std::str::FromStr for KeyVal {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (k, v) = s
            .split_once('=')
            .ok_or_else(|| anyhow!("expected KEY=VALUE, got: {s}"))?;
        Ok(Self {
            key: k.trim().to_string(),
            value: v.trim().to_string(),
        })
    }
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "agenda",
    version,
    about = "Agenda: calendars, tasks and projects from the terminal",
    disable_help_subcommand = true
)]
pub struct GlobalCli {
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count, global = true)]
    pub quiet: u8,

    /// Override one config key, e.g. `--rc calendar.default_view=week`
    #[arg(
        long = "rc",
        value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<KeyVal>()),
        action = ArgAction::Append,
        global = true
    )]
    pub rc_overrides: Vec<KeyVal>,

    #[arg(long = "config", global = true)]
    pub config: Option<PathBuf>,

    #[arg(long = "data", global = true)]
    pub data: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create an account and sign in
    Signup {
        email: String,
        password: String,
        /// Full name shown in the header
        #[arg(long)]
        name: String,
    },
    Signin {
        email: String,
        password: String,
    },
    Signout,
    Whoami,
    /// Show or change the interface language
    Lang { language: Option<Language> },
    /// List calendars
    Calendars,
    #[command(subcommand)]
    Calendar(CalendarCommand),
    /// List tasks of the selected calendar
    Tasks {
        #[arg(short, long, default_value = "all")]
        filter: TaskFilter,
    },
    #[command(subcommand)]
    Task(TaskCommand),
    /// List projects of the selected calendar
    Projects,
    #[command(subcommand)]
    Project(ProjectCommand),
    /// Create a task, or a project when `--in projects`
    New {
        #[arg(long = "in", default_value = "calendar")]
        view: AppView,
        #[command(flatten)]
        item: NewItemArgs,
    },
    /// Month, week or day grid of the selected calendar
    Cal(CalArgs),
    Upcoming,
    /// Search every task, project and milestone
    Search {
        #[arg(required = true, num_args = 1..)]
        term: Vec<String>,
    },
    Tutorial {
        #[arg(default_value = "show")]
        action: TutorialAction,
    },
    Invite(InviteArgs),
}

#[derive(Subcommand, Debug, Clone)]
pub enum CalendarCommand {
    Add {
        name: String,
        #[arg(short, long, default_value = "")]
        description: String,
        /// Palette colour (`green`, `bg-green-500`, ...)
        #[arg(short, long)]
        color: Option<String>,
    },
    Edit {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(short, long)]
        color: Option<String>,
    },
    /// Select the calendar other commands work on
    Use { id: String },
    Default { id: String },
    Rm { id: String },
}

#[derive(Args, Debug, Clone)]
pub struct TaskArgs {
    #[arg(short, long)]
    pub priority: Option<Priority>,
    #[arg(short, long)]
    pub description: Option<String>,
    /// Project key (`redesign`, `api`, ...) or free-text label
    #[arg(long)]
    pub project: Option<String>,
    /// Roster key or full name
    #[arg(short, long)]
    pub assignee: Option<String>,
    #[arg(long)]
    pub due: Option<NaiveDate>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum TaskCommand {
    Add {
        title: String,
        #[command(flatten)]
        fields: TaskArgs,
    },
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[command(flatten)]
        fields: TaskArgs,
    },
    /// Toggle completion
    Done { id: String },
    Rm { id: String },
}

#[derive(Args, Debug, Clone)]
pub struct ProjectArgs {
    #[arg(short, long)]
    pub priority: Option<Priority>,
    #[arg(short, long)]
    pub description: Option<String>,
    #[arg(long)]
    pub due: Option<NaiveDate>,
    /// Roster keys or names, comma separated
    #[arg(long, value_delimiter = ',')]
    pub team: Option<Vec<String>>,
    /// `name` or `name@YYYY-MM-DD`; repeat for several
    #[arg(short, long = "milestone")]
    pub milestones: Vec<String>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ProjectCommand {
    Add {
        title: String,
        #[command(flatten)]
        fields: ProjectArgs,
    },
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[command(flatten)]
        fields: ProjectArgs,
    },
    Show { id: String },
    Dup { id: String },
    Rm { id: String },
    /// Flip one milestone, by its position
    Toggle { id: String, index: usize },
}

#[derive(Args, Debug, Clone)]
pub struct NewItemArgs {
    pub title: String,
    #[arg(short, long)]
    pub priority: Option<Priority>,
    #[arg(short, long)]
    pub description: Option<String>,
    #[arg(long)]
    pub due: Option<NaiveDate>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct CalArgs {
    pub mode: Option<CalendarMode>,
    /// Focus date; defaults to today
    #[arg(long)]
    pub date: Option<NaiveDate>,
    /// Step back this many months/weeks/days
    #[arg(long, default_value_t = 0)]
    pub prev: u32,
    #[arg(long, default_value_t = 0)]
    pub next: u32,
    /// Show details of one event (`task-<id>`, `project-<id>`, ...)
    #[arg(long)]
    pub event: Option<String>,
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TutorialAction {
    Show,
    Next,
    Prev,
    Skip,
}

#[derive(Args, Debug, Clone)]
pub struct InviteArgs {
    #[arg(short, long = "email")]
    pub emails: Vec<String>,
    #[arg(short, long)]
    pub role: Option<String>,
    #[arg(long = "calendar")]
    pub calendars: Vec<String>,
    #[arg(long = "project")]
    pub projects: Vec<String>,
    #[arg(short, long, default_value = "")]
    pub message: String,
}

pub fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let default_level = if quiet >= 2 {
        "error"
    } else if quiet == 1 {
        "warn"
    } else if verbose >= 3 {
        "trace"
    } else if verbose == 2 {
        "debug"
    } else if verbose == 1 {
        "info"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> GlobalCli {
        GlobalCli::try_parse_from(std::iter::once("agenda").chain(args.iter().copied()))
            .expect("parse args")
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = parse(&["tasks", "-f", "pending", "-vv", "--rc", "toast.duration_ms=100"]);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.rc_overrides.len(), 1);
        assert_eq!(cli.rc_overrides[0].key, "toast.duration_ms");
        assert!(matches!(
            cli.command,
            Some(Command::Tasks {
                filter: TaskFilter::Pending
            })
        ));
    }

    #[test]
    fn project_milestones_and_team() {
        let cli = parse(&[
            "project", "add", "Launch", "-p", "h", "--team", "ana,carlos", "-m", "Design@2024-05-01",
            "-m", "Ship",
        ]);
        let Some(Command::Project(ProjectCommand::Add { title, fields })) = cli.command else {
            panic!("expected project add");
        };
        assert_eq!(title, "Launch");
        assert_eq!(fields.priority, Some(Priority::High));
        assert_eq!(fields.team, Some(vec!["ana".to_string(), "carlos".to_string()]));
        assert_eq!(fields.milestones.len(), 2);
    }

    #[test]
    fn calendar_mode_is_optional() {
        let cli = parse(&["cal", "week", "--next", "2"]);
        let Some(Command::Cal(args)) = cli.command else {
            panic!("expected cal");
        };
        assert_eq!(args.mode, Some(CalendarMode::Week));
        assert_eq!(args.next, 2);
        assert!(parse(&[]).command.is_none());
    }

    #[test]
    fn key_value_requires_equals() {
        assert!("color".parse::<KeyVal>().is_err());
        let kv: KeyVal = " color = off ".parse().expect("key value");
        assert_eq!((kv.key.as_str(), kv.value.as_str()), ("color", "off"));
    }
}
