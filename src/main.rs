use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tokio::time::MissedTickBehavior;

use docchat::app::{self, App};
use docchat::controller::{ChatController, Reply};
use docchat::tui::{self, AppEvent, EventHandler};
use docchat::{handler, logging, ui, Config, DocumentClient};

#[derive(Parser)]
#[command(name = "docchat", version)]
#[command(about = "Upload documents and ask questions about them from the terminal")]
struct Cli {
    /// Base URL of the document service
    #[arg(long, env = "DOCCHAT_URL")]
    url: Option<String>,
    /// Keep request diagnostics and show the debug window
    #[arg(long, env = "DOCCHAT_DEBUG", value_parser = clap::builder::BoolishValueParser::new())]
    debug: bool,
    /// Config file to use instead of the one in the user config directory
    #[arg(long)]
    config: Option<PathBuf>,
    /// Where the interactive session writes its log
    #[arg(long)]
    log_file: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask one question and print the answer
    Ask {
        /// Your question
        #[arg(required = true)]
        query: Vec<String>,
    },
    /// Upload one document
    Upload {
        /// File to upload
        file: PathBuf,
    },
    /// Print the resolved configuration
    Config {
        /// Write the resolved configuration to the config file
        #[arg(long)]
        save: bool,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => Config::get_config_path()?,
    };
    let config = Config::load_from(&config_path)?.with_overrides(cli.url.clone(), cli.debug);

    match cli.command {
        None => {
            let log_path = match cli.log_file {
                Some(path) => path,
                None => logging::default_log_path()?,
            };
            logging::init_file(&log_path, config.debug)?;
            run_tui(&config).await?;
            Ok(ExitCode::SUCCESS)
        }
        Some(Commands::Ask { query }) => {
            logging::init_stderr(config.debug)?;
            Ok(ask(&config, &query.join(" ")).await)
        }
        Some(Commands::Upload { file }) => {
            logging::init_stderr(config.debug)?;
            Ok(upload(&config, &file).await)
        }
        Some(Commands::Config { save }) => {
            show_config(&config, &config_path, save)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn run_tui(config: &Config) -> Result<()> {
    tui::install_panic_hook();
    let mut terminal = tui::init()?;

    let mut app = App::new(config);
    let mut events = EventHandler::new();
    tracing::info!(base_url = %config.base_url, debug = config.debug, "chat session started");

    let result = run_loop(&mut terminal, &mut app, &mut events).await;

    tui::restore()?;
    tracing::info!("chat session ended");
    result
}

enum Wake {
    Event(AppEvent),
    Reply(Reply),
    Closed,
}

const ANIMATION_INTERVAL: Duration = Duration::from_millis(300);

async fn run_loop(terminal: &mut tui::Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    let mut animation = tokio::time::interval(ANIMATION_INTERVAL);
    animation.set_missed_tick_behavior(MissedTickBehavior::Delay);

    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        // Terminal input and finished round trips share the loop
        let animating = app.is_animating();
        let wake = tokio::select! {
            event = events.next() => match event {
                Some(event) => Wake::Event(event),
                None => Wake::Closed,
            },
            Some(reply) = app.controller.next_reply() => Wake::Reply(reply),
            _ = animation.tick(), if animating => Wake::Event(AppEvent::Tick),
        };

        match wake {
            Wake::Event(event) => handler::handle_event(app, event)?,
            Wake::Reply(reply) => app.controller.apply(reply),
            Wake::Closed => break,
        }
    }
    Ok(())
}

async fn ask(config: &Config, query: &str) -> ExitCode {
    let mut controller = ChatController::new(DocumentClient::new(&config.base_url), config.debug);
    controller.query_field_mut().set_text(query);

    if !controller.submit_query() {
        eprintln!("Nothing to ask: the question is empty");
        return ExitCode::FAILURE;
    }

    controller.settle().await;
    print_transcript(&controller)
}

async fn upload(config: &Config, file: &Path) -> ExitCode {
    let mut controller = ChatController::new(DocumentClient::new(&config.base_url), config.debug);

    let selection = (!file.as_os_str().is_empty()).then(|| app::expand_home(file));
    if !controller.select_file(selection) {
        eprintln!("Nothing to upload: no file given");
        return ExitCode::FAILURE;
    }

    controller.settle().await;
    print_transcript(&controller)
}

/// Print the session and report whether any round trip failed.
fn print_transcript(controller: &ChatController) -> ExitCode {
    for entry in controller.transcript().entries() {
        println!("{}", entry.sender.label());
        println!("{}", entry.text);
        println!();
    }

    for line in controller.debug_log() {
        eprintln!("[debug] {}", line);
    }

    if controller.transcript().entries().iter().any(|entry| entry.is_error()) {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn show_config(config: &Config, path: &Path, save: bool) -> Result<()> {
    println!("Config file: {}", path.display());
    println!("{}", serde_json::to_string_pretty(config)?);

    if save {
        config.save_to(path)?;
        println!("Saved.");
    }
    Ok(())
}
