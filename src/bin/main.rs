use clap::{Parser, Subcommand};
use log::{LevelFilter, info};
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::BufReader;

use editbridge::config::{RenderMode, SettingsLayer, load_settings};
use editbridge::text::{LineEnding, normalize_line_endings};
use editbridge::{
    BridgeError, BridgeResult, EditorBuffer, FsMaterializer, FsStorage, MemoryBuffer,
    MemoryHost, SessionBridge, run_session,
};

/// Bridge between a live editor buffer and a collaborative editing session
#[derive(Parser)]
#[command(name = "editbridge")]
#[command(version)]
#[command(about = "Bridge between a live editor buffer and a collaborative editing session")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a headless session speaking JSON lines on stdin/stdout
    Serve {
        /// Project root directory
        #[arg(long)]
        root: PathBuf,

        /// File to open as the active buffer (relative to the root or absolute)
        #[arg(long)]
        open: Option<PathBuf>,

        /// Delay before remote selections are rendered, in milliseconds
        #[arg(long)]
        render_delay_ms: Option<u64>,

        /// Collapse rapid highlight batches into a single render pass
        #[arg(long)]
        debounce: bool,

        /// Log level (off, error, warn, info, debug, trace); overrides RUST_LOG
        #[arg(long)]
        log_level: Option<LevelFilter>,
    },
}

struct ServeOptions {
    root: PathBuf,
    open: Option<PathBuf>,
    render_delay_ms: Option<u64>,
    debounce: bool,
}

fn init_logging(level: Option<LevelFilter>) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    builder.target(env_logger::Target::Stderr);
    if let Some(level) = level {
        builder.filter_level(level);
    }
    builder.init();
}

async fn serve(options: ServeOptions) -> BridgeResult<()> {
    let root = path_clean::clean(std::path::absolute(&options.root)?);
    if !root.is_dir() {
        return Err(BridgeError::config(format!(
            "project root {} is not a directory",
            root.display()
        )));
    }

    let override_settings = SettingsLayer {
        render_delay_ms: options.render_delay_ms,
        render_mode: options.debounce.then_some(RenderMode::Debounce),
        ..Default::default()
    };
    let outcome = load_settings(Some(&root), Some(override_settings));
    for event in &outcome.events {
        event.log();
    }

    let host = Arc::new(MemoryHost::new(&root));
    let opened = match options.open {
        Some(open) => {
            let path = if open.is_absolute() {
                open
            } else {
                root.join(open)
            };
            let content = match tokio::fs::read_to_string(&path).await {
                Ok(content) => content,
                Err(e) if e.kind() == ErrorKind::NotFound => String::new(),
                Err(e) => return Err(e.into()),
            };
            let ending = LineEnding::detect(&content);
            let buffer = Arc::new(MemoryBuffer::with_path(
                path,
                normalize_line_endings(&content).into_owned(),
            ));
            host.focus(Arc::clone(&buffer));
            Some((buffer, ending))
        }
        None => None,
    };

    let (bridge, mut events) = SessionBridge::new(
        host,
        Arc::new(FsStorage::new()),
        Arc::new(FsMaterializer::new()),
        outcome.settings,
    );
    bridge.start()?;

    let input = BufReader::new(tokio::io::stdin());
    let result = run_session(&bridge, &mut events, input, tokio::io::stdout()).await;
    bridge.stop();
    result?;

    if let Some((buffer, ending)) = opened
        && let Some(path) = buffer.absolute_path()
    {
        tokio::fs::write(&path, ending.restore(&buffer.content()).as_bytes()).await?;
        info!(target: "editbridge::session", "Saved {}", path.display());
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            root,
            open,
            render_delay_ms,
            debounce,
            log_level,
        } => {
            init_logging(log_level);
            let options = ServeOptions {
                root,
                open,
                render_delay_ms,
                debounce,
            };
            if let Err(e) = serve(options).await {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    }
}
