use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use anyhow::Context;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agile_modeling_portal::infrastructure::storage::build_store;
use agile_modeling_portal::infrastructure::ProjectRegistry;
use agile_modeling_portal::utils::Config;
use agile_modeling_portal::{api, AppState, NAME, VERSION};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Chargement de la configuration (.env puis variables d'environnement)
    let config = Config::from_env().map_err(|e| {
        eprintln!("❌ Impossible de charger la configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    setup_tracing(&config);
    info!("🚀 Démarrage de {} v{}", NAME, VERSION);
    info!("🔧 Mode: {}", config.run_mode);

    let app_state = match build_state(&config).await {
        Ok(state) => web::Data::new(state),
        Err(e) => {
            error!("❌ Initialisation impossible: {:#}", e);
            return Err(std::io::Error::new(std::io::ErrorKind::Other, format!("{:#}", e)));
        }
    };

    let bind_address = format!("{}:{}", config.server_host, config.server_port);
    let server = HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .supports_credentials()
            .max_age(3600);

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .app_data(app_state.clone())
            .configure(api::config)
    })
    .bind(&bind_address)?
    .workers(config.workers)
    .shutdown_timeout(10);

    info!("✅ Portail démarré avec succès!");
    info!("🔗 API disponible sur http://{}", bind_address);
    info!("🔗 Backend: {}", config.backend_url);

    server.run().await
}

/// Initialise le stockage, le registre des projets et les services
async fn build_state(config: &Config) -> anyhow::Result<AppState> {
    let store = build_store(config)
        .await
        .context("initialisation du stockage objet")?;
    let registry = ProjectRegistry::load(&config.projects_file)
        .await
        .with_context(|| format!("lecture de {}", config.projects_file.display()))?;
    let state = AppState::new(config, store, registry).context("création du client backend")?;
    Ok(state)
}

/// Configure le tracing pour le logging structuré
fn setup_tracing(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));

    let layer = if config.logging_format == "json" {
        Box::new(
            tracing_subscriber::fmt::layer()
                .json()
                .flatten_event(true)
                .with_current_span(true)
                .with_span_list(true),
        ) as Box<dyn tracing_subscriber::Layer<_> + Send + Sync>
    } else {
        Box::new(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_line_number(true)
                .with_file(true),
        ) as Box<dyn tracing_subscriber::Layer<_> + Send + Sync>
    };

    tracing_subscriber::registry().with(filter).with(layer).init();
}
