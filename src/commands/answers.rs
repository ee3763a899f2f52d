//! Answers command - Inspect and grow the answer history

use anyhow::{bail, Context, Result};
use colored::*;
use verdigris::answers::HistoricalAnswer;
use verdigris::cancel::CancelToken;
use verdigris::config::Config;
use verdigris::embeddings::{create_embedder, similarity::cosine_similarity};
use verdigris::storage::{SqliteStorage, Storage};

/// List stored answers, oldest first
pub fn list() -> Result<()> {
    let config = Config::load()?;
    let storage = SqliteStorage::open(&config.data_dir())?;
    let answers = storage.all_historical_answers()?;

    if answers.is_empty() {
        println!("No stored answers yet.");
        println!();
        println!("Run `verdigris answers add <label> <value>` to store one.");
        return Ok(());
    }

    println!("📋 {} stored answers", answers.len());
    println!();
    for answer in &answers {
        println!(
            "  {}  {} = {}",
            answer.created_at.format("%Y-%m-%d").to_string().dimmed(),
            answer.label.bright_cyan(),
            answer.value
        );
    }

    Ok(())
}

/// Embed a question label and store its answer
pub fn add(label: &str, value: &str, kind: &str) -> Result<()> {
    let config = Config::load()?;
    let cancel = CancelToken::new();
    let mut embedder = create_embedder(&config, &cancel).context("Failed to create embedder")?;
    let mut storage = SqliteStorage::open(&config.data_dir())?;

    let embedding = embedder
        .embed(label)
        .context("Failed to embed question label")?;

    let answer = HistoricalAnswer::new(label, value, kind, embedding);
    storage.append_historical_answer(&answer)?;

    println!("✓ Stored answer for {}", label.bright_cyan());

    Ok(())
}

/// Resolve a question against stored answers, showing the closest matches
pub fn match_question(question: &str) -> Result<()> {
    let config = Config::load()?;
    let storage = SqliteStorage::open(&config.data_dir())?;
    let historical = storage.all_historical_answers()?;

    if historical.is_empty() {
        bail!("No stored answers yet.\n\nRun `verdigris answers add <label> <value>` first.");
    }

    let cancel = CancelToken::new();
    let mut embedder = create_embedder(&config, &cancel).context("Failed to create embedder")?;
    let query = embedder
        .embed(question)
        .context("Failed to embed question")?;

    // Rows embedded under a different model sit out, same as resolution.
    let threshold = config.matching.similarity_threshold;
    let mut scored: Vec<(f32, &HistoricalAnswer)> = historical
        .iter()
        .filter(|answer| answer.embedding.len() == query.len())
        .map(|answer| (cosine_similarity(&query, &answer.embedding), answer))
        .collect();
    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

    println!(
        "🔎 Matching against {} stored answers (threshold {:.2})",
        scored.len(),
        threshold
    );
    println!();
    for (score, answer) in scored.iter().take(5) {
        let marker = if *score >= threshold {
            "✓".green()
        } else {
            "·".dimmed()
        };
        println!(
            "  {} {:.4}  {} = {}",
            marker, score, answer.label, answer.value
        );
    }

    println!();
    match scored.first() {
        Some((score, answer)) if *score >= threshold => {
            println!("{} {}", "✅ Cache hit:".green(), answer.value);
        }
        _ => {
            println!(
                "{}",
                "⚠️  No stored answer clears the threshold; this question would go to the fallback provider."
                    .yellow()
            );
        }
    }

    Ok(())
}
