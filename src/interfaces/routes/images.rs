use actix_web::web;

use crate::handlers::images;

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/images")
            .service(
                web::resource("")
                    .route(web::post().to(images::save_image))
                    .route(web::get().to(images::get_all_images))
            )
            .service(
                web::resource("/{image_id}")
                    .route(web::get().to(images::get_image))
                    .route(web::delete().to(images::delete_image))
            )
    );
}
