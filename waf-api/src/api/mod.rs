//! Route wiring for the control-plane HTTP surface (spec.md §6). Mirrors
//! the teacher's `router-api/src/api/mod.rs::configure` shape: one
//! `ServiceConfig` closure registering every scope, public endpoints
//! unguarded and everything else behind [`crate::auth::JwtAuth`] plus a
//! minimum [`crate::auth::RoleAuth`].

pub mod error_pages;
pub mod global_config;
pub mod ingress;
pub mod ops;
pub mod routes;
pub mod rules;
pub mod users;

use actix_web::web;

use crate::auth::{JwtAuth, RoleAuth};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .service(users::login)
            .service(ingress::evaluate)
            .service(
                web::scope("")
                    .wrap(JwtAuth::new())
                    .service(users::get)
                    .service(
                        web::scope("")
                            .wrap(RoleAuth::staff())
                            .service(global_config::get)
                            .service(rules::list_global)
                            .service(rules::get_global)
                            .service(rules::create_global)
                            .service(rules::update_global)
                            .service(rules::delete_global)
                            .service(rules::reorder_global)
                            .service(rules::list_route)
                            .service(rules::get_route)
                            .service(rules::create_route)
                            .service(rules::update_route)
                            .service(rules::delete_route)
                            .service(rules::reorder_route)
                            .service(routes::list)
                            .service(routes::get)
                            .service(routes::create)
                            .service(routes::update)
                            .service(routes::delete)
                            .service(error_pages::list)
                            .service(error_pages::put)
                            .service(error_pages::delete),
                    )
                    .service(
                        web::scope("")
                            .wrap(RoleAuth::admin())
                            .service(users::list)
                            .service(users::create)
                            .service(users::delete),
                    ),
            ),
    );

    // Scheduled-task hooks live outside `/api/v1`, matching the teacher's
    // separate `/ops` surface rather than the versioned configuration API.
    cfg.service(
        web::scope("/ops")
            .wrap(RoleAuth::staff())
            .wrap(JwtAuth::new())
            .service(ops::refresh_feeds)
            .service(ops::aggregate_events),
    );
}
