// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

use std::env;

use anyhow::{anyhow, Result};
use soundboard::{
    Action, BoardConfig, BoardSnapshot, PlaybackStatus, SimBackend, SoundCatalog, Soundboard,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

type SimBoard = Soundboard<SimBackend, SimBackend, SimBackend>;

fn print_usage() {
    println!("SOUNDBOARD - Fixed sounds and a short recording history");
    println!();
    println!("Usage: soundboard [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --config <FILE>   Load board configuration from a YAML file");
    println!("  --list-sounds     List the fixed sounds and exit");
    println!("  --help            Show this help message");
    println!();
    println!("Commands (one per line on stdin):");
    println!("  play <key>        Play a fixed sound");
    println!("  stop              Stop playback");
    println!("  record            Start or stop recording");
    println!("  clip <n>          Play recorded clip n (1-based)");
    println!("  delete <n>        Delete recorded clip n (1-based)");
    println!("  finish            Pretend the current sound reached its end");
    println!("  status            Show the board");
    println!("  quit              Release everything and exit");
}

fn print_sounds(config: &BoardConfig) {
    let catalog = SoundCatalog::from_config(config);
    for (row, entries) in catalog.rows(config.row_width).into_iter().enumerate() {
        let keys: Vec<&str> = entries.iter().map(|(key, _)| key.as_str()).collect();
        println!("Row {}: {}", row + 1, keys.join("  "));
    }
}

fn print_snapshot(snapshot: &BoardSnapshot) {
    let playback = match &snapshot.playback {
        PlaybackStatus::Empty => "-".to_string(),
        PlaybackStatus::Playing(sound) => format!("playing {}", sound),
        PlaybackStatus::Stopped(sound) => format!("stopped {}", sound),
    };
    println!("Playback:  {}", playback);
    println!("Recording: {:?}", snapshot.recording);
    if snapshot.clips.is_empty() {
        println!("Clips:     (none)");
    } else {
        let labels: Vec<String> = snapshot
            .clips
            .iter()
            .map(|c| format!("Sound {} [{}]", c.display_ordinal, c.id))
            .collect();
        println!("Clips:     {}", labels.join("  "));
    }
}

/// Parse a 1-based clip number into a position
fn parse_clip(arg: Option<&str>) -> Result<usize> {
    let arg = arg.ok_or_else(|| anyhow!("Missing clip number"))?;
    let n: usize = arg
        .parse()
        .map_err(|_| anyhow!("Invalid clip number: {}", arg))?;
    n.checked_sub(1)
        .ok_or_else(|| anyhow!("Clip numbers start at 1"))
}

/// Turn one input line into an action; `Ok(None)` for non-board commands
fn parse_action(line: &str) -> Result<Option<Action>> {
    let mut words = line.split_whitespace();
    let command = words.next().unwrap_or("");
    let action = match command {
        "play" => {
            let key = words
                .next()
                .ok_or_else(|| anyhow!("play requires a sound key"))?;
            Action::PlayFixed(key.to_string())
        }
        "stop" => Action::StopPlayback,
        "record" => Action::ToggleRecording,
        "clip" => Action::PlayClip(parse_clip(words.next())?),
        "delete" => Action::DeleteClip(parse_clip(words.next())?),
        _ => return Ok(None),
    };
    Ok(Some(action))
}

async fn run(board: &SimBoard) -> Result<()> {
    let permission = board.prime_permission().await;
    info!(?permission, "microphone permission");

    print_snapshot(&board.snapshot());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        match line {
            "" => continue,
            "quit" | "exit" => break,
            "status" => print_snapshot(&board.snapshot()),
            "finish" => {
                board.playback().finished().await;
                print_snapshot(&board.snapshot());
            }
            "help" => print_usage(),
            _ => match parse_action(line) {
                Ok(Some(action)) => {
                    let report = board.apply(action).await;
                    if let Some(e) = &report.error {
                        eprintln!("Error: {}", e);
                    }
                    print_snapshot(&report.snapshot);
                }
                Ok(None) => eprintln!("Unknown command: {}", line),
                Err(e) => eprintln!("Error: {}", e),
            },
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();
    let mut config = BoardConfig::default();
    let mut list_only = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                let path = args
                    .get(i + 1)
                    .ok_or_else(|| anyhow!("--config requires a file path"))?;
                config = BoardConfig::load(path)?;
                i += 1;
            }
            "--list-sounds" => list_only = true,
            "--help" | "-h" => {
                print_usage();
                return Ok(());
            }
            other => {
                eprintln!("Unknown option: {}", other);
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    if list_only {
        print_sounds(&config);
        return Ok(());
    }

    let backend = SimBackend::new();
    let board = Soundboard::from_config(&config, backend.clone(), backend.clone(), backend);

    let result = run(&board).await;
    board.teardown().await;
    result
}
