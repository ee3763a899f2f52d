//! Relevance command - Screen a listing title against profile keywords

use anyhow::{bail, Context, Result};
use colored::*;
use verdigris::cancel::CancelToken;
use verdigris::config::Config;
use verdigris::llm::create_generator;

pub fn execute(title: &str) -> Result<()> {
    let config = Config::load()?;
    if config.profile.keywords.is_empty() {
        bail!("No keywords configured.\n\nAdd some under [profile] in ~/.verdigris/config.toml.");
    }

    let cancel = CancelToken::new();
    let mut generator =
        create_generator(&config, &cancel).context("Failed to create fallback provider")?;

    let relevant = generator.classify_relevance(title, &config.profile.keywords)?;

    if relevant {
        println!("{} {}", "✓ relevant".green(), title);
    } else {
        println!("{} {}", "· not relevant".dimmed(), title);
    }

    Ok(())
}
