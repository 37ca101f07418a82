//! Headless host for the playground.
//!
//! Reads one JSON command per line on stdin and writes JSON messages to
//! stdout: results of each command plus a `merge` message whenever two tokens
//! combine. Logs go to stderr.

use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use alchemy_playground::protocol::{DropEvent, HostCommand, HostMessage};
use alchemy_playground::{
    AppConfig, Catalog, Inventory, Playground, Point, RecipeStore, Size, SqliteStore,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("alchemy_playground=info")),
        )
        .init();

    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("alchemy.toml"));
    let config = AppConfig::load_or_default(&config_path)?;

    let mut catalog = Catalog::new();
    catalog.load_from_directory(&config.data_dir)?;

    let store = SqliteStore::new(&config.database_url).await?;
    store.seed(&catalog).await?;
    let store: Arc<dyn RecipeStore> = Arc::new(store);

    let mut inventory = Inventory::load(store.as_ref()).await?;
    let playground = Playground::new(store.clone(), config.playground.clone());
    let mut merges = playground.subscribe();

    info!("Playground ready, reading commands from stdin");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if line.trim().is_empty() {
                    continue;
                }
                let reply = match serde_json::from_str::<HostCommand>(&line) {
                    Ok(command) => handle_command(command, &playground, store.as_ref(), &inventory).await,
                    Err(e) => Some(HostMessage::Error { message: format!("Bad command: {}", e) }),
                };
                if let Some(reply) = reply {
                    emit(&reply);
                }
            }
            merged = merges.recv() => match merged {
                Ok(event) => {
                    inventory.apply_merge(&event);
                    emit(&HostMessage::Merge(event));
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Missed {} merge events, reloading inventory", skipped);
                    if let Err(e) = inventory.reload(store.as_ref()).await {
                        error!("Failed to reload inventory: {}", e);
                    }
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    // Let in-flight merges land before exiting
    for result in playground.settle().await {
        if let Err(e) = result {
            warn!("Merge failed during shutdown: {}", e);
        }
    }
    while let Ok(event) = merges.try_recv() {
        inventory.apply_merge(&event);
        emit(&HostMessage::Merge(event));
    }
    playground.shutdown().await;

    Ok(())
}

async fn handle_command(
    command: HostCommand,
    playground: &Playground,
    store: &dyn RecipeStore,
    inventory: &Inventory,
) -> Option<HostMessage> {
    let reply = match command {
        HostCommand::Drop {
            mime_type,
            payload,
            x,
            y,
        } => {
            let event = DropEvent {
                mime_type,
                text: payload,
                position: Point::new(x, y),
            };
            // Foreign drops are silently ignored
            let token = playground.handle_drop(&event).await?;
            HostMessage::Placed { token }
        }
        HostCommand::Place { item_id, x, y } => match store.item(&item_id).await {
            Ok(item) => HostMessage::Placed {
                token: playground.place_item(item, Point::new(x, y)).await,
            },
            Err(e) => HostMessage::Error {
                message: e.to_string(),
            },
        },
        HostCommand::BeginMove { token } => match playground.begin_move(token).await {
            Ok(()) => return None,
            Err(e) => HostMessage::Error {
                message: e.to_string(),
            },
        },
        HostCommand::Move { token, x, y } => {
            match playground.update_move_position(token, Point::new(x, y)).await {
                Ok(position) => HostMessage::Moved { token, position },
                Err(e) => HostMessage::Error {
                    message: e.to_string(),
                },
            }
        }
        HostCommand::EndMove { token } => match playground.end_move(token).await {
            Ok(_) => return None,
            Err(e) => HostMessage::Error {
                message: e.to_string(),
            },
        },
        HostCommand::Clear => {
            playground.clear().await;
            HostMessage::Snapshot(playground.snapshot().await)
        }
        HostCommand::Resize { width, height } => {
            playground.resize(Size::new(width, height)).await;
            HostMessage::Snapshot(playground.snapshot().await)
        }
        HostCommand::Snapshot => HostMessage::Snapshot(playground.snapshot().await),
        HostCommand::Inventory => {
            let (discovered, total) = inventory.progress();
            HostMessage::Inventory {
                unlocked: inventory.unlocked().to_vec(),
                discovered,
                total,
            }
        }
    };
    Some(reply)
}

fn emit(message: &HostMessage) {
    match serde_json::to_string(message) {
        Ok(json) => println!("{}", json),
        Err(e) => error!("Failed to serialize message: {}", e),
    }
}
