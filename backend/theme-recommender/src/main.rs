use anyhow::{Context, Result};
use theme_recommender::{EngineConfig, Rating, RecommendationEngine, RecommendationSnapshot, Theme};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const SHOWN_RECOMMENDATIONS: usize = 5;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    // Load config
    let config = EngineConfig::from_env().context("Failed to load engine config")?;
    let engine = RecommendationEngine::with_default_model(config)?;

    info!("Theme recommender started");
    render(&engine.snapshot());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let reward = match line.trim() {
            "q" | "quit" => break,
            "c" | "clean" => Rating::Clean.reward(),
            "m" | "meh" => Rating::Meh.reward(),
            "t" | "trash" => Rating::Trash.reward(),
            other => match other.parse::<f32>() {
                Ok(value) => value,
                Err(_) => {
                    println!("rate with [c]lean, [m]eh, [t]rash, a number, or [q]uit");
                    continue;
                }
            },
        };

        match engine.submit_rating(reward).await {
            Ok(report) => {
                info!(
                    cycle_id = %report.cycle_id,
                    selection = report.selection.as_str(),
                    "Cycle complete"
                );
                render(&engine.snapshot());
            }
            Err(e) => warn!(error = %e, "Rating not applied"),
        }
    }

    Ok(())
}

fn render(snapshot: &RecommendationSnapshot) {
    println!();
    println!("  {}   ({})", swatch(&snapshot.current_theme, " Hello, World! "), snapshot.current_theme);

    if snapshot.recommended.is_empty() {
        println!("  There are no predicted themes yet. Try rating some themes!");
    } else {
        println!("  Themes you may like:");
        for scored in snapshot.recommended.iter().take(SHOWN_RECOMMENDATIONS) {
            println!(
                "    {}  score {:.4}",
                swatch(&scored.theme, " Hello, World! "),
                scored.score
            );
        }
    }
    println!("  rate: [c]lean  [m]eh  [t]rash  [q]uit");
}

/// 24-bit ANSI foreground/background escape around `text`.
fn swatch(theme: &Theme, text: &str) -> String {
    let fg = theme.text_colour;
    let bg = theme.background_colour;
    format!(
        "\x1b[38;2;{};{};{}m\x1b[48;2;{};{};{}m{}\x1b[0m",
        fg.r, fg.g, fg.b, bg.r, bg.g, bg.b, text
    )
}
