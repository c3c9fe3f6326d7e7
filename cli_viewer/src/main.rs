use std::path::PathBuf;
use std::sync::mpsc::{self, Sender};

use clap::Parser;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use tracing::info;

use replay_core::{load_replay_config_from_env, ReplayEngine, ReplayError, StatusSink};
use replay_schema::Dataset;

mod app;
mod surface;
mod ui;

use app::ViewerApp;
use surface::{TerminalSurface, Theme};

/// Sample run shipped with the viewer for a zero-argument start.
const SAMPLE_RUN: &str = include_str!("data/sample_run.json");

#[derive(Clone)]
struct ChannelWriter {
    sender: Sender<String>,
}

impl std::io::Write for ChannelWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        if let Ok(text) = String::from_utf8(buf.to_vec()) {
            let _ = self.sender.send(text);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Terminal playback viewer for recorded swarm runs", long_about = None)]
struct Cli {
    /// Recorded run to load (JSON). Falls back to the embedded sample.
    #[arg(long, short)]
    file: Option<PathBuf>,
    /// Step animation duration in milliseconds (floor 50).
    #[arg(long)]
    duration_ms: Option<u64>,
    /// Render with the dark palette.
    #[arg(long)]
    dark: bool,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let (log_tx, log_rx) = mpsc::channel::<String>();
    let log_writer_tx = log_tx.clone();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .compact()
        .with_writer(move || ChannelWriter {
            sender: log_writer_tx.clone(),
        })
        .init();

    let cli = Cli::parse();

    let (text, file_label) = match &cli.file {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .wrap_err_with(|| format!("failed to read {}", path.display()))?;
            (text, path.display().to_string())
        }
        None => (SAMPLE_RUN.to_string(), "embedded sample".to_string()),
    };
    let dataset = Dataset::from_json_str(&text)?;
    info!(
        target: "swarm_replay::viewer",
        steps = dataset.data().step_count(),
        source = %file_label,
        "run.loaded"
    );

    let mut config = load_replay_config_from_env();
    if let Some(ms) = cli.duration_ms {
        config = config.with_animation_duration_ms(ms);
    }
    let theme = if cli.dark { Theme::Dark } else { Theme::Light };

    let surface = TerminalSurface::new(dataset.data(), theme);
    let (status_tx, status_rx) = mpsc::channel::<String>();
    let status: StatusSink = Box::new(move |line| {
        let _ = status_tx.send(line.to_string());
    });
    let engine = ReplayEngine::load(surface, dataset, config, status);

    let viewer = ViewerApp::new(engine, status_rx, log_rx, file_label)
        .map_err(|err| ReplayError::MissingSurface(err.to_string()))?;
    viewer.run()
}
