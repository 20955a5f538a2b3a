mod routes;
mod store;

use std::{net::SocketAddr, sync::Arc};

use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;

use crate::routes::SharedStore;
use crate::store::{MemoryStore, MongoStore};

#[derive(Parser)]
struct Args {
    /// Port to listen on.
    #[arg(long, env = "PORT", default_value_t = 5001)]
    port: u16,

    /// MongoDB connection string.
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    database_url: String,

    /// Database holding the todo collection.
    #[arg(long, env = "MONGODB_DATABASE", default_value = "moss")]
    database: String,

    /// Keep todos in memory instead of MongoDB.
    #[arg(long)]
    memory: bool,
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    let store: SharedStore = if args.memory {
        Arc::new(MemoryStore::default())
    } else {
        Arc::new(MongoStore::connect(&args.database_url, &args.database).await?)
    };

    let app = routes::router().with_state(store);

    let addr = SocketAddr::from(([0; 4], args.port));
    let listener = TcpListener::bind(addr).await?;

    info!("listening on {addr}");

    axum::serve(listener, app).await?;

    Ok(())
}
