use std::{path::PathBuf, process};

use chrono::Local;
use clap::Parser;
use modera::{StatsEngine, StatsReport};
use tracing::instrument;

use super::{
    load_config, open_store,
    terminal::{Colorize, bar, is_narrow},
};

/// Width of the bars in the daily chart and the goal gauge.
const BAR_WIDTH: usize = 20;

#[derive(Debug, Parser, Default)]
#[command(about = "Show this week's consumption against the goal")]
pub struct Stats {
    /// Output format (table, json)
    #[arg(long, value_name = "FORMAT", default_value = "table")]
    output: OutputFormat,

    /// Exit with status 2 when the weekly goal is exceeded
    #[arg(long)]
    check: bool,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Table,
    Json,
}

impl Stats {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let config = load_config(&root);
        let store = open_store(&root)?;
        let snapshot = store.snapshot();
        let report = StatsEngine::from_config(&config).compute(&snapshot, &Local::now());

        match self.output {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
            OutputFormat::Table => {
                let name = snapshot.profile().map(|profile| profile.display_name());
                Self::output_table(&report, name);
            }
        }

        if self.check && report.is_over_limit {
            process::exit(2);
        }

        Ok(())
    }

    fn output_table(report: &StatsReport, name: Option<&str>) {
        if let Some(name) = name {
            println!("Hi, {name}");
            println!();
        }

        Self::output_goal(report);
        println!();
        Self::output_kpis(report);
        println!();
        Self::output_chart(report);
        println!();
        Self::output_distribution(report);
    }

    fn output_goal(report: &StatsReport) {
        println!("Weekly goal");
        println!("{}", "───────────".dim());

        let gauge = bar(report.progress_percentage / 100.0, BAR_WIDTH);
        let gauge = if report.is_over_limit {
            gauge.alert()
        } else if report.progress_percentage >= 80.0 {
            gauge.warning()
        } else {
            gauge.success()
        };
        println!(
            "{gauge} {:.1} / {} units ({:.0}%)",
            report.weekly_units, report.weekly_goal, report.progress_percentage
        );

        if report.is_over_limit {
            println!(
                "{}",
                format!(
                    "⚠️  You are {:.1} units over your weekly goal.",
                    report.weekly_units - report.weekly_goal
                )
                .alert()
            );
        } else {
            println!(
                "{}",
                format!("{:.1} units left this week.", report.remaining_units()).dim()
            );
        }
    }

    fn output_kpis(report: &StatsReport) {
        let trend = report.weekly_trend_percent.map_or_else(
            || "–".dim(),
            |trend| {
                let text = format!("{trend:+.0}% vs last week");
                if trend > 0.0 {
                    text.warning()
                } else {
                    text.success()
                }
            },
        );
        let peak = report
            .peak_day
            .as_ref()
            .map_or_else(|| "–".dim(), ToString::to_string);
        let most = report
            .most_consumed_kind
            .map_or_else(|| "–".dim(), |kind| kind.label().to_string());

        let rows = [
            ("Today", format!("{:.1} units", report.daily_units)),
            ("This week", format!("{:.1} units", report.weekly_units)),
            ("Trend", trend),
            ("Daily average", format!("{:.1} units", report.daily_average)),
            ("Peak day", peak),
            ("This month", format!("{:.1} units", report.monthly_units)),
            ("Most consumed", most),
            ("Savings", format!("${:.2}", report.savings_estimate)),
        ];

        if is_narrow() {
            for (label, value) in rows {
                println!("{label}: {value}");
            }
        } else {
            for (label, value) in rows {
                println!("{label:<14} {value}");
            }
        }
    }

    fn output_chart(report: &StatsReport) {
        println!("Last 7 days");
        println!("{}", "───────────".dim());

        let max = report
            .trailing_7_days
            .iter()
            .map(|point| point.units)
            .fold(0.0, f64::max);

        for point in &report.trailing_7_days {
            let fraction = if max > 0.0 { point.units / max } else { 0.0 };
            println!(
                "{:<4} {} {:.1}",
                point.label,
                bar(fraction, BAR_WIDTH),
                point.units
            );
        }
    }

    fn output_distribution(report: &StatsReport) {
        println!("This month by drink");
        println!("{}", "───────────────────".dim());

        if report.type_distribution.is_empty() {
            println!("{}", "Nothing logged this month. Add a drink with 'modera add'.".dim());
            return;
        }

        for (kind, units) in &report.type_distribution {
            let share = if report.monthly_units > 0.0 {
                units / report.monthly_units * 100.0
            } else {
                0.0
            };
            println!("{:<15} {units:>6.1} {share:>5.1}%", kind.label());
        }
    }
}
