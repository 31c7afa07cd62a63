use utoipa_axum::{router::OpenApiRouter, routes};

use crate::config::AppConfig;
use crate::handlers;
use crate::state::AppState;

pub fn api_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/auth", auth_routes())
        .nest("/companies", company_routes(config))
}

fn auth_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::auth::login))
        .routes(routes!(handlers::auth::logout))
        .routes(routes!(handlers::auth::me))
}

fn company_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::company::list_companies,
            handlers::company::create_company
        ))
        .routes(routes!(handlers::company::create_form))
        .routes(routes!(
            handlers::company::get_company,
            handlers::company::update_company,
            handlers::company::delete_company
        ))
        .routes(routes!(handlers::company::edit_form))
        .layer(handlers::company::company_form_body_limit(
            config.storage.max_logo_size,
        ))
}
