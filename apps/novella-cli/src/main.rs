use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use novella_engine::{NovellaSession, StepCommand, go_next, new_session};
use novella_session::{
    CanvasOptions, GameStateSnapshot, NarrationSubsystem, StorageSubsystem,
};
use serde_json::json;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "novella-cli", about = "CLI tool for novella sessions")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print engine version and crate info
    Info,
    /// Play a scripted scene and write the save file
    Demo {
        /// Where to write the save
        #[arg(short, long, default_value = "demo-save.json")]
        save: PathBuf,
    },
    /// Print a summary of a save file without loading it
    Inspect {
        /// Save file to inspect
        file: PathBuf,
    },
    /// Restore a save file into a fresh session
    Resume {
        /// Save file to restore
        file: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("novella-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("engine version: {}", novella_session::ENGINE_VERSION);
        }
        Commands::Demo { save } => {
            println!("Demo scene: writing save to {}", save.display());

            let mut session = scripted_session()?;
            session.narration_mut().open_label("intro")?;
            while !session.narration().opened_labels().is_empty() {
                let outcome = go_next(&mut session)?;
                for command in &outcome.commands {
                    if let StepCommand::Say { character, text } = command {
                        match character {
                            Some(name) => println!("{name}: {text}"),
                            None => println!("{text}"),
                        }
                    }
                }
            }

            let snapshot = session.export_game_state()?;
            let text = snapshot.to_json()?;
            std::fs::write(&save, text)
                .with_context(|| format!("writing {}", save.display()))?;
            tracing::info!(save = %save.display(), "save file written");
            println!(
                "Saved: steps={}, history entries={}",
                snapshot.step_data["stepCounter"],
                session.history().len()
            );
        }
        Commands::Inspect { file } => {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let snapshot = GameStateSnapshot::from_json(&text)?;
            snapshot.validate()?;

            println!("Save: {}", file.display());
            println!("engine version: {}", snapshot.engine_version);
            println!("path: {}", snapshot.path);
            println!("step counter: {}", snapshot.step_data["stepCounter"]);
            let variables = snapshot.storage_data["variables"]
                .as_object()
                .map(|map| map.len())
                .unwrap_or(0);
            println!("variables: {variables}");
        }
        Commands::Resume { file } => {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let snapshot = GameStateSnapshot::from_json(&text)?;

            let mut session = scripted_session()?;
            pollster::block_on(session.restore_game_state(&snapshot, |path| {
                println!("navigating to {path}");
            }))?;
            tracing::info!(save = %file.display(), "session restored");

            println!(
                "Resumed: step counter={}, gold={}",
                session.narration().step_counter(),
                session
                    .storage()
                    .variable("gold")
                    .unwrap_or(serde_json::Value::Null)
            );
        }
    }

    Ok(())
}

/// An initialized session with the demo script registered.
fn scripted_session() -> anyhow::Result<NovellaSession> {
    let mut session = new_session();
    pollster::block_on(session.initialize(&CanvasOptions::new(800, 600)))?;

    session.narration_mut().new_label("intro", vec![
        vec![
            StepCommand::Say {
                character: Some("Alex".into()),
                text: "You made it. The market closes at dusk.".into(),
            },
            StepCommand::Set {
                key: "gold".into(),
                value: json!(10),
            },
            StepCommand::PlaySound {
                channel: "music".into(),
                track: "market-theme".into(),
            },
        ],
        vec![StepCommand::Call {
            label: "haggle".into(),
        }],
        vec![StepCommand::Say {
            character: Some("Alex".into()),
            text: "Safe travels.".into(),
        }],
    ]);
    session.narration_mut().new_label("haggle", vec![
        vec![
            StepCommand::SetTemp {
                key: "offer".into(),
                value: json!(7),
            },
            StepCommand::Say {
                character: Some("Merchant".into()),
                text: "Seven gold, final price.".into(),
            },
        ],
        vec![StepCommand::SetFlag {
            name: "haggled".into(),
            value: true,
        }],
    ]);

    Ok(session)
}
