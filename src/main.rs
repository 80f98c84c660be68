use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use anyhow::Context;
use dotenvy::dotenv;

use attendance::admin::{AdminGate, HashedSecretGate, SharedSecretGate};
use attendance::capture::SnapshotCamera;
use attendance::config::Config;
use attendance::db::init_db;
use attendance::docs::ApiDoc;
use attendance::location::FixedLocation;
use attendance::routes;
use attendance::state::{AppState, Kiosk};
use attendance::store::{MemoryRecordStore, MySqlRecordStore, Store};
use attendance::workflow::{AttendanceWorkflow, RefreshPolicy};

use tracing::{info, warn};
use tracing_appender::rolling;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[get("/")]
async fn index() -> impl Responder {
    "Attendance service is running"
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = Config::from_env();

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Server starting...");

    let store = match &config.database_url {
        Some(url) => {
            let pool = init_db(url).await.context("connecting to DATABASE_URL")?;
            Store::MySql(MySqlRecordStore::new(pool))
        }
        None => {
            warn!("DATABASE_URL not set, records are kept in memory and lost on restart");
            Store::Memory(MemoryRecordStore::new())
        }
    };
    info!(backend = store.backend_name(), "Record store ready");

    let gate: Box<dyn AdminGate> = match &config.admin_password_hash {
        Some(hash) => Box::new(
            HashedSecretGate::new(hash.clone())
                .map_err(|e| anyhow::anyhow!("ADMIN_PASSWORD_HASH is not a valid hash: {e}"))?,
        ),
        None => {
            if config.admin_password == "admin123" {
                warn!("Admin password is the default, set ADMIN_PASSWORD or ADMIN_PASSWORD_HASH");
            }
            Box::new(SharedSecretGate::new(config.admin_password.clone()))
        }
    };

    let kiosk = match &config.kiosk_camera_url {
        Some(url) => {
            let locator = FixedLocation::from_parts(config.kiosk_latitude, config.kiosk_longitude);
            let workflow =
                AttendanceWorkflow::start(store.clone(), &locator, RefreshPolicy::Refetch).await;
            info!(camera = %url, location = %workflow.location(), "Kiosk camera enabled");
            Some(Kiosk {
                camera: SnapshotCamera::new(url.clone()),
                capture: Kiosk::capture_config(config.camera_timeout_secs),
                workflow,
            })
        }
        None => None,
    };

    let state = Data::new(AppState { store, gate, kiosk });
    let server_addr = config.server_addr.clone();
    let config_data = config.clone();

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // wildcard so the JS/CSS assets match
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(state.clone())
            .app_data(Data::new(config.clone()))
            .service(index)
            .configure(|cfg| routes::configure(cfg, config_data.clone()))
    })
    .bind(&server_addr)
    .with_context(|| format!("binding {server_addr}"))?
    .run()
    .await?;

    Ok(())
}
