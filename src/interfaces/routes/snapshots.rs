use actix_web::web;

use crate::handlers::snapshots;

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/snapshots")
            .service(
                web::resource("")
                    .route(web::get().to(snapshots::get_snapshots))
                    .route(web::delete().to(snapshots::clear_my_snapshots))
            )
            .service(
                web::resource("/{snapshot_id}")
                    .route(web::put().to(snapshots::save_snapshot))
                    .route(web::delete().to(snapshots::delete_snapshot))
            )
    );
}
