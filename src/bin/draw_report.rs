use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};

use jack_tips::combo::{LotteryGame, PredictionRow};

#[derive(Debug, serde::Deserialize)]
struct DrawReport {
    game: LotteryGame,
    #[serde(default)]
    rows: Vec<PredictionRow>,
}

fn main() -> Result<()> {
    let Some(path) = std::env::args().nth(1).map(PathBuf::from) else {
        bail!("usage: draw_report <report.json>");
    };

    let raw = fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
    let report: DrawReport =
        serde_json::from_str(&raw).with_context(|| format!("parse {}", path.display()))?;
    let game = &report.game;

    println!(
        "{} ({} • {}) draws {} of {}",
        game.title(),
        game.provider,
        game.game_code,
        game.draw_size().map_or("?".to_string(), |n| n.to_string()),
        game.main_max.map_or("?".to_string(), |n| n.to_string()),
    );

    for row in &report.rows {
        let score = row.score(Some(game));
        let Some(best) = score.best else {
            println!("{}  no draw yet", row.draw_date);
            continue;
        };
        println!(
            "{}  best {} {}/{} ({:.0}%)",
            row.draw_date,
            best.label,
            best.best_hits,
            best.denominator,
            best.percentage * 100.0
        );
        for (label, summary) in &score.per_combination {
            if let Some(s) = summary {
                println!("    {label}: {}/{}", s.hits, s.denominator);
            }
        }
    }

    Ok(())
}
