use actix_web::web;

use crate::handlers::system::{admin_health_check, cleanup_images, clear_all_snapshots};

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .service(admin_health_check)
            .service(
                web::resource("/images/cleanup")
                    .route(web::post().to(cleanup_images))
            )
            .service(
                web::resource("/snapshots")
                    .route(web::delete().to(clear_all_snapshots))
            )
    );
}
