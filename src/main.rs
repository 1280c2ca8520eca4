use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use heartconnect_match::config::{Settings, StorageBackend};
use heartconnect_match::core::{CompatibilityScorer, Recommender};
use heartconnect_match::models::ScoringWeights;
use heartconnect_match::routes::{self, AppState, JwtVerifier};
use heartconnect_match::services::{
    CacheManager, CachedProfileDirectory, MatchService, MemoryPairingStore, PairingStore,
    PostgresPairingStore, ProfileServiceClient,
};

fn init_logging(settings: &Settings) {
    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.logging.level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if settings.logging.format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.compact().init();
    }
}

fn startup_error(what: &str, e: impl std::fmt::Display) -> io::Error {
    error!("{}: {}", what, e);
    io::Error::other(format!("{}: {}", what, e))
}

async fn build_pairing_store(settings: &Settings) -> io::Result<Arc<dyn PairingStore>> {
    match settings.storage.backend {
        StorageBackend::Memory => {
            warn!("Using in-memory pairing store; pairings are lost on restart");
            Ok(Arc::new(MemoryPairingStore::new()))
        }
        StorageBackend::Postgres => {
            let db = &settings.database;
            let store = PostgresPairingStore::from_settings(
                &db.url,
                db.max_connections,
                db.min_connections,
                db.acquire_timeout_secs,
                db.idle_timeout_secs,
            )
            .await
            .map_err(|e| startup_error("Failed to connect to PostgreSQL", e))?;

            info!(
                "PostgreSQL pairing store initialized (max: {} connections)",
                db.max_connections.unwrap_or(10)
            );
            Ok(Arc::new(store))
        }
    }
}

/// Redis is optional; without it profiles are cached in-process only
async fn build_cache(settings: &Settings) -> CacheManager {
    let ttl = settings.cache.ttl_secs.unwrap_or(300);
    let l1_size = settings.cache.l1_cache_size.unwrap_or(1000);

    match CacheManager::new(&settings.cache.redis_url, l1_size, ttl).await {
        Ok(cache) => {
            info!("Cache manager initialized (L1: {} entries, TTL: {}s)", l1_size, ttl);
            cache
        }
        Err(e) => {
            warn!("Failed to connect to Redis ({}), using in-process cache only", e);
            CacheManager::local(l1_size, ttl)
        }
    }
}

/// Periodically expire pending pairings past their window
fn spawn_expiry_sweep(service: Arc<MatchService>, interval_secs: u64) {
    if interval_secs == 0 {
        info!("Expiry sweep disabled");
        return;
    }

    actix_web::rt::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
        loop {
            ticker.tick().await;
            match service.expire_stale(chrono::Utc::now()).await {
                Ok(0) => {}
                Ok(n) => info!("Expiry sweep expired {} pairings", n),
                Err(e) => warn!("Expiry sweep failed: {}", e),
            }
        }
    });
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();

    let settings = Settings::load().map_err(|e| {
        eprintln!("Configuration error: {}", e);
        io::Error::new(io::ErrorKind::InvalidInput, e.to_string())
    })?;

    init_logging(&settings);
    info!("Starting HeartConnect match service...");

    let profile_client = ProfileServiceClient::new(
        settings.profile_service.base_url.clone(),
        settings.profile_service.api_key.clone(),
        Duration::from_secs(settings.profile_service.timeout_secs),
    )
    .map_err(|e| startup_error("Failed to create profile service client", e))?;

    let cache = Arc::new(build_cache(&settings).await);
    let profiles = Arc::new(CachedProfileDirectory::new(profile_client, cache));
    let pairings = build_pairing_store(&settings).await?;

    let weights = ScoringWeights::from(&settings.scoring.weights);
    info!("Compatibility scorer initialized with weights: {:?}", weights);
    let recommender = Recommender::new(CompatibilityScorer::new(weights));

    let service = Arc::new(MatchService::new(
        pairings,
        profiles,
        recommender,
        settings.matching.options(),
    ));

    spawn_expiry_sweep(service.clone(), settings.matching.expiry_sweep_interval_secs);

    let app_state = AppState { service };
    let verifier = web::Data::new(JwtVerifier::new(&settings.auth.jwt_secret));

    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(verifier.clone())
            .app_data(web::JsonConfig::default().error_handler(routes::handle_json_payload_error))
            .app_data(web::QueryConfig::default().error_handler(routes::handle_query_payload_error))
            .wrap(Cors::permissive())
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
