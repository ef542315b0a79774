use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use chatkit_cli::{
    commands::{Command, HELP},
    config::Config,
    handlers::{self, Reply},
    state::AppState,
};
use chatkit_llm::{ChatClient, OpenAIClient};
use chatkit_persist::{JsonFileModelStorage, ModelStorage};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let config = Config::load()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    init_logging(&config);

    let storage: Arc<dyn ModelStorage> = match &config.storage.models_path {
        Some(path) => Arc::new(JsonFileModelStorage::new(path)),
        None => Arc::new(JsonFileModelStorage::default_location()?),
    };

    let mut client = OpenAIClient::builder();
    if let Some(timeout) = config.http.timeout() {
        client = client.timeout(timeout);
    }
    if let Some(timeout) = config.http.connect_timeout() {
        client = client.connect_timeout(timeout);
    }
    let client: Arc<dyn ChatClient> = Arc::new(client.build()?);

    let (state, events) = AppState::start(config, storage, client).await?;
    tracing::info!("Chat session ready");

    let printer = tokio::spawn(handlers::print_events(state.session.clone(), events));
    spawn_interrupt_handler(state.clone());

    println!("{}\n", HELP);
    for turn in state.session.turns() {
        println!("{}> {}", turn.role, turn.content);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = match Command::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                eprintln!("{}", e);
                continue;
            }
        };

        match handlers::execute(&state, command).await {
            Ok(Reply::Text(text)) => println!("{}", text.trim_end()),
            Ok(Reply::Streaming(task)) => {
                tokio::spawn(async move {
                    match task.await {
                        Ok(Ok(outcome)) => tracing::debug!("Send finished: {:?}", outcome),
                        Ok(Err(e)) => eprintln!("{}", e),
                        Err(e) => tracing::error!("Send task failed: {}", e),
                    }
                });
            }
            Ok(Reply::Quit) => break,
            Err(e) => eprintln!("Error: {:#}", e),
        }
    }

    state.session.stop();
    printer.abort();
    Ok(())
}

/// Ctrl-C stops a running stream; it only exits when nothing is streaming
fn spawn_interrupt_handler(state: Arc<AppState>) {
    tokio::spawn(async move {
        loop {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for Ctrl-C: {}", e);
                return;
            }
            if !state.session.stop() {
                std::process::exit(0);
            }
        }
    });
}

fn init_logging(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    match config.logging.format.as_str() {
        "json" => {
            registry
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
                .init();
        }
    }
}
