use crate::{
    api::{admin, attendance, kiosk},
    config::Config,
    error::AppError,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::web;
use std::sync::Arc;
use tracing::debug;

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-route limiter
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let requests_per_min = requests_per_min.max(1);
        let cfg = GovernorConfigBuilder::default()
            .per_millisecond(60_000 / requests_per_min as u64)
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .expect("non-zero period and burst");
        Governor::new(&cfg)
    }

    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let submit_limiter = Arc::new(build_limiter(config.rate_submit_per_min));
    let admin_limiter = Arc::new(build_limiter(config.rate_admin_per_min));

    // photos travel inline, so the body limit is larger than actix's default
    let json_config = web::JsonConfig::default()
        .limit(config.max_payload_bytes)
        .error_handler(|err, _req| {
            debug!(error = %err, "Rejected JSON body");
            AppError::BadRequest(err.to_string()).into()
        });

    let query_config = web::QueryConfig::default().error_handler(|err, _req| {
        debug!(error = %err, "Rejected query string");
        AppError::BadRequest(err.to_string()).into()
    });

    cfg.service(
        web::scope(&config.api_prefix)
            .app_data(json_config)
            .app_data(query_config)
            .service(
                // /attendance
                web::resource("/attendance")
                    .wrap(submit_limiter.clone())
                    .route(web::post().to(attendance::submit_attendance))
                    .route(web::get().to(attendance::list_attendance)),
            )
            .service(
                // /kiosk/attendance
                web::resource("/kiosk/attendance")
                    .wrap(submit_limiter)
                    .route(web::post().to(kiosk::kiosk_attendance))
                    .route(web::get().to(kiosk::kiosk_records)),
            )
            .service(
                web::scope("/admin")
                    .service(
                        web::resource("/login")
                            .wrap(login_limiter.clone())
                            .route(web::post().to(admin::login)),
                    )
                    .service(
                        web::resource("/logout")
                            .wrap(login_limiter)
                            .route(web::post().to(admin::logout)),
                    )
                    .service(
                        web::resource("/stats")
                            .wrap(admin_limiter.clone())
                            .route(web::get().to(admin::stats)),
                    )
                    .service(
                        web::resource("/records")
                            .wrap(admin_limiter.clone())
                            .route(web::get().to(admin::list_records)),
                    )
                    // before /records/{id}, or "export" is taken for an id
                    .service(
                        web::resource("/records/export")
                            .wrap(admin_limiter.clone())
                            .route(web::get().to(admin::export_records)),
                    )
                    .service(
                        web::resource("/records/{id}")
                            .wrap(admin_limiter)
                            .route(web::get().to(admin::get_record))
                            .route(web::delete().to(admin::delete_record)),
                    ),
            ),
    );
}

// ADMIN LOGIN
//  └─ access_token (ADMIN_SESSION_TTL, 8h by default)

// ADMIN REQUEST
//  └─ Authorization: Bearer access_token

// LOGOUT
//  └─ token id revoked until the cache forgets it
