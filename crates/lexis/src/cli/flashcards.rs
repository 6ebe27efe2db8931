//! Flashcard command

use anyhow::Context;
use clap::Args;
use lexis::{FlashcardLimit, FlashcardRequest, Lexis};
use serde_json::json;

use super::output::print_data_with_meta;

#[derive(Args, Debug, Clone)]
pub struct FlashcardArgs {
    /// User whose packs are drawn from
    #[arg(long = "user")]
    pub owner_id: String,

    /// Language id
    #[arg(long = "lang")]
    pub language_id: String,

    /// Restrict to these pack ids (comma-separated)
    #[arg(long = "packs", value_delimiter = ',')]
    pub pack_ids: Vec<String>,

    /// Number of cards, 1-100 [default: 20]
    #[arg(long)]
    pub limit: Option<String>,
}

pub async fn run(lexis: &Lexis, args: FlashcardArgs) -> anyhow::Result<()> {
    let request = FlashcardRequest {
        owner_id: args.owner_id,
        language_id: args.language_id,
        pack_ids: args.pack_ids,
        limit: FlashcardLimit::parse(args.limit.as_deref()),
    };
    let cards = lexis
        .flashcards(&request)
        .await
        .context("Failed to draw flashcards")?;
    print_data_with_meta(&cards, json!({ "count": cards.len() }))
}
