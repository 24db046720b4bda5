use std::path::PathBuf;

use chrono::Local;
use clap::{Parser, ValueEnum};
use modera::{ConsumptionEvent, DrinkKind, HistoryQuery};
use serde::Serialize;
use tracing::instrument;

use super::{
    open_store,
    terminal::{Colorize, is_narrow},
};

const DEFAULT_LIMIT: usize = 50;

/// Command arguments for `modera list`.
#[derive(Debug, Parser)]
#[command(about = "List logged drinks, newest first")]
pub struct List {
    /// Only drinks of this kind.
    #[arg(long)]
    kind: Option<DrinkKind>,

    /// Case-insensitive search against the drink name.
    #[arg(long)]
    search: Option<String>,

    /// Limit number of rows returned (0 = unlimited).
    #[arg(long, default_value_t = DEFAULT_LIMIT)]
    limit: usize,

    /// Output format (default: table).
    #[arg(long, value_enum, default_value_t)]
    output: OutputFormat,

    /// Suppress headers and format rows for scripting.
    #[arg(long)]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Debug, Serialize)]
struct Row<'a> {
    #[serde(flatten)]
    event: &'a ConsumptionEvent,
    local_time: String,
}

impl List {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let store = open_store(&root)?;
        let query = HistoryQuery {
            kind: self.kind,
            search: self.search,
            limit: (self.limit > 0).then_some(self.limit),
        };
        let snapshot = store.snapshot();

        match self.output {
            OutputFormat::Json => {
                let rows: Vec<_> = query
                    .select(snapshot.events())
                    .into_iter()
                    .map(|event| Row {
                        event,
                        local_time: local_time(event, "%Y-%m-%dT%H:%M:%S%:z"),
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&rows)?);
            }
            OutputFormat::Table if self.quiet => {
                for event in query.select(snapshot.events()) {
                    println!(
                        "{}\t{}\t{}\t{}",
                        event.id(),
                        event.kind(),
                        event.units(),
                        event.occurred_at().to_rfc3339()
                    );
                }
            }
            OutputFormat::Table => {
                let groups = query.grouped(snapshot.events());
                if groups.is_empty() {
                    println!("No drinks found. Log one with 'modera add <KIND>'.");
                    return Ok(());
                }

                let narrow = is_narrow();
                for group in groups {
                    println!(
                        "{}  {}",
                        group.date.format("%A %Y-%m-%d"),
                        format!("{:.1} units", group.total_units()).dim()
                    );
                    for event in group.events {
                        let time = local_time(event, "%H:%M");
                        if narrow {
                            println!("  {time} {} {}", event.kind().label(), event.units());
                        } else {
                            println!(
                                "  {time}  {:<15} {:>5.1}  {}",
                                event.kind().label(),
                                event.units(),
                                event.id().to_string().dim()
                            );
                        }
                    }
                }
            }
        }

        Ok(())
    }
}

fn local_time(event: &ConsumptionEvent, format: &str) -> String {
    event
        .occurred_at()
        .with_timezone(&Local)
        .format(format)
        .to_string()
}
