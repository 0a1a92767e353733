use std::sync::Arc;

use clap::Parser;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use caixa::config::Config;
use caixa::db::{create_pool, init_db, queries, AppState};
use caixa::gateway::MercadoPagoClient;
use caixa::handlers;
use caixa::models::{CreateCheckout, CreateProduct, CreateWebhookSubscription};

#[derive(Parser, Debug)]
#[command(name = "caixa")]
#[command(about = "E-commerce back-office API with payment reconciliation")]
struct Cli {
    /// Seed the database with demo catalog data (dev mode only)
    #[arg(long)]
    seed: bool,
}

/// Seeds a demo product, checkout link, and webhook subscription so the
/// dashboard has something to show on a fresh database.
fn seed_demo_data(state: &AppState) {
    let conn = state.db.get().expect("Failed to get db connection for seeding");

    let existing = queries::list_products(&conn).expect("Failed to list products");
    if !existing.is_empty() {
        tracing::info!("Database already has data, skipping seed");
        return;
    }

    let product = queries::create_product(
        &conn,
        &CreateProduct {
            name: "Curso de Fotografia".to_string(),
            description: Some("Acesso vitalício ao curso completo".to_string()),
            price: 149.9,
            currency: "BRL".to_string(),
            active: true,
        },
    )
    .expect("Failed to create demo product");

    let checkout = queries::create_checkout(
        &conn,
        &CreateCheckout {
            product_id: product.id,
            title: product.name.clone(),
            slug: "curso-fotografia".to_string(),
            redirect_url: None,
            active: true,
        },
    )
    .expect("Failed to create demo checkout");

    queries::create_webhook_subscription(
        &conn,
        &CreateWebhookSubscription {
            event: "payment".to_string(),
            url: format!("{}/api/mercadopago/webhook", state.base_url),
            active: true,
        },
    )
    .expect("Failed to create demo webhook subscription");

    tracing::info!("Seeded demo data: product {} / checkout {}", product.id, checkout.id);
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "caixa=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();

    if config.dev_mode {
        tracing::info!("Running in DEVELOPMENT mode");
    }
    if config.mercadopago_access_token.is_empty() {
        tracing::warn!("MP_ACCESS_TOKEN is not set; gateway calls will be rejected upstream");
    }

    let db_pool = create_pool(&config.database_path).expect("Failed to create database pool");
    {
        let conn = db_pool.get().expect("Failed to get connection");
        init_db(&conn).expect("Failed to initialize database");
    }

    let gateway = MercadoPagoClient::new(config.mercadopago_access_token.clone());

    let state = AppState {
        db: db_pool,
        gateway: Arc::new(gateway),
        base_url: config.base_url.clone(),
    };

    if cli.seed {
        if !config.dev_mode {
            tracing::warn!("--seed flag ignored: not in dev mode (set CAIXA_ENV=dev)");
        } else {
            seed_demo_data(&state);
        }
    }

    let app = handlers::router()
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Caixa server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Failed to start server");
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received, stopping server...");
}
