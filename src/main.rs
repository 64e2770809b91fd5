use tracing::info;

use coffer::db::UserRepository;
use coffer::file::NodeRepository;
use coffer::{BlobStore, Config, Database};

#[tokio::main]
async fn main() {
    // Load configuration
    let config = match Config::load_with_env("config.toml") {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config.toml: {e}");
            eprintln!("Using default configuration.");
            Config::default()
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Invalid configuration: {e}");
        std::process::exit(1);
    }

    // Initialize logging
    if let Err(e) = coffer::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        // Fall back to console-only logging
        coffer::logging::init_console_only(&config.logging.level);
    }

    info!("Coffer - multi-user file storage");

    let db = match Database::open(&config.database.path).await {
        Ok(db) => db,
        Err(e) => {
            eprintln!("Failed to open database at {}: {e}", config.database.path);
            std::process::exit(1);
        }
    };

    if let Err(e) = BlobStore::new(&config.storage.path) {
        eprintln!(
            "Failed to prepare blob storage at {}: {e}",
            config.storage.path
        );
        std::process::exit(1);
    }

    let users = UserRepository::new(db.pool());
    let nodes = NodeRepository::new(db.pool());
    match (users.count().await, nodes.count().await) {
        (Ok(user_count), Ok(node_count)) => {
            info!(
                user_count,
                node_count,
                database = %config.database.path,
                storage = %config.storage.path,
                "Store ready"
            );
        }
        (Err(e), _) | (_, Err(e)) => {
            eprintln!("Failed to read database: {e}");
            std::process::exit(1);
        }
    }
}
