use std::path::PathBuf;

use chrono::Local;
use clap::Parser;
use modera::{
    PromotionOffer, StatsEngine,
    domain::{PromotionTarget, rank_promotions, seed_promotions},
};
use tracing::instrument;

use super::{load_config, open_store, terminal::Colorize};

#[derive(Debug, Parser, Default)]
#[command(about = "List promotions, most relevant to your drinking first")]
pub struct Promotions {
    /// Include offers that can no longer be redeemed
    #[arg(long)]
    all: bool,

    /// Output format (table, json)
    #[arg(long, value_name = "FORMAT", default_value = "table")]
    output: OutputFormat,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Table,
    Json,
}

impl Promotions {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let config = load_config(&root);
        let store = open_store(&root)?;
        let report = StatsEngine::from_config(&config).compute(&store.snapshot(), &Local::now());

        let catalogue = seed_promotions();
        let ranked: Vec<&PromotionOffer> =
            rank_promotions(&catalogue, report.most_consumed_kind)
                .into_iter()
                .filter(|offer| self.all || offer.active)
                .collect();
        let relevant = PromotionTarget::for_kind(report.most_consumed_kind);

        match self.output {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&ranked)?),
            OutputFormat::Table => {
                if ranked.is_empty() {
                    println!("No promotions available right now.");
                    return Ok(());
                }
                for offer in ranked {
                    Self::output_offer(offer, offer.target == relevant);
                }
            }
        }

        Ok(())
    }

    fn output_offer(offer: &PromotionOffer, relevant: bool) {
        let marker = if relevant { "★ " } else { "  " };
        println!("{marker}{} · {}", offer.title, offer.brand.dim());
        println!("  {}", offer.description);
        if offer.active {
            println!("  Code: {}", offer.code.success());
        } else {
            println!("  {}", format!("Code: {} (expired)", offer.code).dim());
        }
        println!();
    }
}
