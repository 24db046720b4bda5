use std::{
    convert::Infallible,
    path::{Path, PathBuf},
};

mod list;
mod promotions;
mod stats;
mod terminal;

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use clap::ArgAction;
use list::List;
use modera::{
    Config, DrinkKind, EventPatch, EventStore, FileStore, StatsEngine,
    assistant::AssistantContext, domain::seed_promotions,
};
use non_empty_string::NonEmptyString;
use promotions::Promotions;
use stats::Stats;
use tracing::instrument;
use uuid::Uuid;

/// Coerce user-supplied units to a safe value.
///
/// Unparseable, negative and non-finite input all become zero.
#[allow(clippy::unnecessary_wraps)]
fn parse_units(s: &str) -> Result<f64, Infallible> {
    let units = s.trim().parse::<f64>().unwrap_or(0.0);
    Ok(if units.is_finite() && units > 0.0 { units } else { 0.0 })
}

/// Parse an instant given either as RFC 3339 or as a local date and time.
fn parse_instant(s: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(instant) = DateTime::parse_from_rfc3339(s) {
        return Ok(instant.with_timezone(&Utc));
    }

    let naive = ["%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
        .ok_or_else(|| format!("'{s}' is not a valid date and time (try 2024-05-15T20:30)"))?;

    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| format!("'{s}' does not exist in the local time zone"))
}

fn parse_name(s: &str) -> Result<NonEmptyString, String> {
    NonEmptyString::new(s.trim().to_string()).map_err(|_| "name must not be empty".to_string())
}

fn open_store(root: &Path) -> anyhow::Result<EventStore<FileStore>> {
    Ok(EventStore::open(FileStore::new(root.to_path_buf()))?)
}

fn load_config(root: &Path) -> Config {
    let path = root.join("config.toml");
    if !path.exists() {
        tracing::debug!("No config at {}, using defaults", path.display());
        return Config::default();
    }
    Config::load(&path).unwrap_or_else(|e| {
        tracing::warn!("{e}; using defaults");
        Config::default()
    })
}

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global=true)]
    verbose: u8,

    /// The directory holding the log, profile and configuration
    #[arg(short, long, default_value = ".modera", global = true)]
    root: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);

        self.command
            .unwrap_or_else(|| Command::Stats(Stats::default()))
            .run(self.root)
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[derive(Debug, clap::Parser)]
pub enum Command {
    /// Show this week's statistics (default)
    Stats(Stats),

    /// Start a session with a new profile
    Login(Login),

    /// End the session; the log is kept
    Logout,

    /// Set the weekly goal in units
    Goal(Goal),

    /// Log a drink
    Add(Add),

    /// Delete a logged drink
    Remove(Remove),

    /// Change a logged drink
    Edit(Edit),

    /// Browse the log, newest first
    List(List),

    /// Show promotions, most relevant first
    Promotions(Promotions),

    /// Print the context shared with the wellness assistant
    Context,
}

impl Command {
    fn run(self, root: PathBuf) -> anyhow::Result<()> {
        match self {
            Self::Stats(command) => command.run(root)?,
            Self::Login(command) => command.run(&root)?,
            Self::Logout => logout(&root)?,
            Self::Goal(command) => command.run(&root)?,
            Self::Add(command) => command.run(&root)?,
            Self::Remove(command) => command.run(&root)?,
            Self::Edit(command) => command.run(&root)?,
            Self::List(command) => command.run(root)?,
            Self::Promotions(command) => command.run(root)?,
            Self::Context => context(&root)?,
        }
        Ok(())
    }
}

#[derive(Debug, clap::Parser)]
pub struct Login {
    /// Name shown in greetings
    #[arg(long, short, value_parser = parse_name)]
    name: NonEmptyString,

    /// Contact address
    #[arg(long, short, default_value = "")]
    email: String,
}

impl Login {
    #[instrument]
    fn run(self, root: &Path) -> anyhow::Result<()> {
        let config = load_config(root);
        let mut store = open_store(root)?;

        let profile = store.login(self.name, self.email, config.default_weekly_goal());

        println!(
            "Welcome, {}! Your weekly goal is {} units.",
            profile.display_name(),
            profile.weekly_goal_units()
        );
        println!("Change it with 'modera goal <units>'.");
        Ok(())
    }
}

#[instrument]
fn logout(root: &Path) -> anyhow::Result<()> {
    let mut store = open_store(root)?;
    match store.logout() {
        Some(profile) => println!("Goodbye, {}.", profile.display_name()),
        None => println!("No one is logged in."),
    }
    Ok(())
}

#[derive(Debug, clap::Parser)]
pub struct Goal {
    /// Weekly ceiling in standard units
    #[arg(value_parser = parse_units)]
    units: f64,
}

impl Goal {
    #[instrument]
    fn run(self, root: &Path) -> anyhow::Result<()> {
        use terminal::Colorize;

        let mut store = open_store(root)?;
        if store.set_weekly_goal(self.units) {
            println!(
                "{}",
                format!("✅ Weekly goal set to {} units", self.units).success()
            );
        } else {
            println!(
                "{}",
                "No active profile. Log in with 'modera login --name <NAME>' first.".warning()
            );
        }
        Ok(())
    }
}

#[derive(Debug, clap::Parser)]
pub struct Add {
    /// What was drunk (beer, wine, cocktail, spirit, cider, liqueur, amaro,
    /// fortified-wine, water, mocktail)
    kind: DrinkKind,

    /// Standard units; defaults to a typical serving of the kind
    #[arg(long, short, value_parser = parse_units)]
    units: Option<f64>,

    /// When it was drunk (RFC 3339 or local 'YYYY-MM-DDTHH:MM'); defaults to now
    #[arg(long, value_parser = parse_instant)]
    at: Option<DateTime<Utc>>,
}

impl Add {
    #[instrument]
    fn run(self, root: &Path) -> anyhow::Result<()> {
        let mut store = open_store(root)?;
        let units = self.units.unwrap_or_else(|| self.kind.default_units());
        let event = store.add_event(self.kind, units, self.at);

        println!(
            "Logged {} unit(s) of {} ({})",
            event.units(),
            event.kind().label().to_lowercase(),
            event.id()
        );
        Ok(())
    }
}

#[derive(Debug, clap::Parser)]
pub struct Remove {
    /// The id of the drink to delete
    id: Uuid,

    /// Skip confirmation prompts
    #[arg(long, short)]
    yes: bool,
}

impl Remove {
    #[instrument]
    fn run(self, root: &Path) -> anyhow::Result<()> {
        use terminal::Colorize;

        let mut store = open_store(root)?;

        let Some(event) = store.event(self.id) else {
            println!("{}", format!("No drink with id {}", self.id).dim());
            return Ok(());
        };

        if !self.yes {
            let prompt = format!(
                "Delete {} unit(s) of {} logged {}?",
                event.units(),
                event.kind().label().to_lowercase(),
                event.occurred_at().with_timezone(&Local).format("%Y-%m-%d %H:%M")
            );
            if !dialoguer::Confirm::new()
                .with_prompt(prompt)
                .default(false)
                .interact()?
            {
                println!("Cancelled");
                return Ok(());
            }
        }

        store.remove_event(self.id);
        println!("{}", "✅ Deleted".success());
        Ok(())
    }
}

#[derive(Debug, clap::Parser)]
pub struct Edit {
    /// The id of the drink to change
    id: Uuid,

    /// New kind
    #[arg(long, short)]
    kind: Option<DrinkKind>,

    /// New units
    #[arg(long, short, value_parser = parse_units)]
    units: Option<f64>,

    /// New time (RFC 3339 or local 'YYYY-MM-DDTHH:MM')
    #[arg(long, value_parser = parse_instant)]
    at: Option<DateTime<Utc>>,
}

impl Edit {
    #[instrument]
    fn run(self, root: &Path) -> anyhow::Result<()> {
        let patch = EventPatch {
            kind: self.kind,
            units: self.units,
            occurred_at: self.at,
        };
        if patch.is_empty() {
            anyhow::bail!("Nothing to change; pass --kind, --units or --at");
        }

        let mut store = open_store(root)?;
        match store.edit_event(self.id, &patch) {
            Some(event) => println!(
                "Updated: {} unit(s) of {} on {}",
                event.units(),
                event.kind().label().to_lowercase(),
                event.date_key()
            ),
            None => println!("No drink with id {}", self.id),
        }
        Ok(())
    }
}

#[instrument]
fn context(root: &Path) -> anyhow::Result<()> {
    let config = load_config(root);
    let store = open_store(root)?;
    let report = StatsEngine::from_config(&config).compute(&store.snapshot(), &Local::now());

    println!(
        "{}",
        AssistantContext::from_report(&report, &seed_promotions())
    );
    Ok(())
}
