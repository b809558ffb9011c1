//! Build a player's opening tree from PGN files.
//!
//! Usage: cargo run --release --bin build-tree -- <pgn_dir> --player <name>
//!        [--perspective white|black|both] [--max-ply N] [--min-games N]
//!
//! Trees are cached under EXPLORER_CACHE_DIR, so a second run over the same
//! games loads from disk instead of rebuilding.

use chess_core::pgn::PgnCollector;
use opening_explorer::{ExplorerConfig, OpeningExplorer, OpeningTree, Perspective, TreeStatus};
use std::env;
use std::fs::File;
use std::io::BufReader;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

fn format_line(moves: &[String]) -> String {
    let mut pgn = String::new();
    for (i, mv) in moves.iter().enumerate() {
        if i % 2 == 0 {
            if !pgn.is_empty() {
                pgn.push(' ');
            }
            pgn.push_str(&format!("{}.", i / 2 + 1));
        }
        pgn.push(' ');
        pgn.push_str(mv);
    }
    pgn
}

fn print_tree(tree: &OpeningTree) {
    println!();
    println!("=== Opening tree ({}) ===", tree.perspective);
    println!("  Games counted: {}", tree.game_count);
    println!("  Included: {}", tree.included_games);
    println!("  Excluded (unplayable moves): {}", tree.excluded_games);
    println!("  Cut at transpositions: {}", tree.truncated_games);
    println!("  Positions: {}", tree.len());
    println!();
    println!("Main line: {}", format_line(&tree.main_line()));
    println!();

    let Some(root) = tree.root_node() else {
        return;
    };
    println!("=== First moves ===");
    for edge in root.edges.iter().take(10) {
        let stats = &edge.stats.aggregate;
        println!(
            "  {:<6} {:>6} games  W:{:<5} L:{:<5} D:{:<5} ({:.1}%)",
            edge.san,
            stats.total,
            stats.wins,
            stats.losses,
            stats.draws,
            stats.win_rate()
        );
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!(
            "Usage: {} <pgn_dir> --player <name> [--perspective white|black|both] [--max-ply N] [--min-games N]",
            args[0]
        );
        std::process::exit(1);
    }

    let pgn_dir = &args[1];
    let mut config = ExplorerConfig::from_env();
    let mut player = None;
    let mut perspective = Perspective::Both;

    let mut i = 2;
    while i < args.len() {
        let value = args.get(i + 1);
        match args[i].as_str() {
            "--player" => player = value.cloned(),
            "--perspective" => {
                if let Some(v) = value {
                    perspective = v.parse()?;
                }
            }
            "--max-ply" => {
                if let Some(n) = value.and_then(|s| s.parse().ok()) {
                    config.build.max_depth_plies = n;
                }
            }
            "--min-games" => {
                if let Some(n) = value.and_then(|s| s.parse().ok()) {
                    config.build.min_games_per_node = n;
                }
            }
            _ => {
                i += 1;
                continue;
            }
        }
        i += 2;
    }

    let Some(player) = player else {
        anyhow::bail!("--player is required");
    };

    let pattern = format!("{}/*.pgn", pgn_dir);
    let pgn_files: Vec<_> = glob::glob(&pattern)?.filter_map(|p| p.ok()).collect();
    if pgn_files.is_empty() {
        anyhow::bail!("No PGN files found in {}", pgn_dir);
    }

    let mut collector = PgnCollector::new(&player, config.build.max_depth_plies);
    for pgn_path in &pgn_files {
        tracing::info!("Reading {}", pgn_path.display());
        collector.read_all(BufReader::new(File::open(pgn_path)?))?;
    }

    println!("Building opening tree:");
    println!("  Player: {}", player);
    println!("  PGN files: {}", pgn_files.len());
    println!("  Games scanned: {}", collector.scanned());
    println!("  Games played by {}: {}", player, collector.games().len());
    println!("  Max ply: {}", config.build.max_depth_plies);
    println!("  Min games per node: {}", config.build.min_games_per_node);

    let start = Instant::now();
    let mut explorer = OpeningExplorer::new(&config)?;
    let status = match explorer.request_tree(collector.games(), perspective)? {
        TreeStatus::Building => explorer.wait().await,
        resolved => Some(resolved),
    };

    match status {
        Some(TreeStatus::Ready(tree)) => {
            let stats = explorer.stats();
            println!();
            println!(
                "Ready in {:.2}s ({})",
                start.elapsed().as_secs_f64(),
                if stats.persistent_hits > 0 { "disk cache" } else { "built" }
            );
            print_tree(&tree);
            Ok(())
        }
        Some(TreeStatus::Failed { reason, .. }) => {
            anyhow::bail!("Could not build opening tree: {reason}")
        }
        Some(TreeStatus::Building) | None => anyhow::bail!("Opening tree build did not resolve"),
    }
}
