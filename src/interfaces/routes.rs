use actix_web::web;

use crate::{errors::AppError, handlers::system::home};

mod admin;
mod images;
mod snapshots;

/// Generated images arrive base64-encoded inside JSON bodies.
const JSON_BODY_LIMIT: usize = 32 * 1024 * 1024;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .limit(JSON_BODY_LIMIT)
            .error_handler(|err, _req| {
                AppError::InvalidInput(format!("JSON payload error: {}", err)).into()
            })
    );

    cfg.service(home);

    cfg.service(
        web::scope("/api/v1")
            .configure(images::config_routes)
            .configure(snapshots::config_routes)
    );

    cfg.configure(admin::config_routes);
}
