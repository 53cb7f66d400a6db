use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::middleware::{auth_middleware, metrics_middleware};
use super::{
    activities, collaborators, contracts, education, handlers, organization, reference, run,
    tickets,
};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Routes that require authentication
    let protected_routes = Router::new()
        .route("/config", get(handlers::get_config))
        .route("/metrics", get(handlers::metrics))
        // RUN
        .route("/run/validate", post(run::validate))
        // Collaborators
        .route(
            "/collaborators",
            get(collaborators::list_collaborators).post(collaborators::create_collaborator),
        )
        .route(
            "/collaborators/{id}",
            get(collaborators::get_collaborator)
                .patch(collaborators::update_collaborator)
                .delete(collaborators::delete_collaborator),
        )
        // Records owned by a collaborator
        .route(
            "/collaborators/{id}/contracts",
            get(contracts::list_contracts).post(contracts::create_contract),
        )
        .route(
            "/contracts/{id}",
            get(contracts::get_contract)
                .patch(contracts::update_contract)
                .delete(contracts::delete_contract),
        )
        .route(
            "/contracts/{id}/placement",
            get(contracts::get_contract_placement),
        )
        .route(
            "/collaborators/{id}/placements",
            get(organization::list_placements).post(organization::create_placement),
        )
        .route(
            "/collaborators/{id}/reports",
            get(organization::list_reports),
        )
        .route(
            "/placements/{id}",
            get(organization::get_placement)
                .patch(organization::update_placement)
                .delete(organization::delete_placement),
        )
        .route(
            "/collaborators/{id}/education",
            get(education::list_records).post(education::create_record),
        )
        .route(
            "/education/{id}",
            get(education::get_record)
                .patch(education::update_record)
                .delete(education::delete_record),
        )
        .route(
            "/collaborators/{id}/activities",
            get(activities::list_activities).post(activities::create_activity),
        )
        .route(
            "/activities/{id}",
            get(activities::get_activity)
                .patch(activities::update_activity)
                .delete(activities::delete_activity),
        )
        // Tickets
        .route(
            "/tickets",
            get(tickets::list_tickets).post(tickets::create_ticket),
        )
        .route(
            "/tickets/{id}",
            get(tickets::get_ticket).patch(tickets::update_ticket),
        )
        .route("/tickets/{id}/history", get(tickets::get_history))
        .route(
            "/tickets/{id}/messages",
            get(tickets::list_messages).post(tickets::create_message),
        )
        // Reference data
        .route(
            "/reference/{kind}",
            get(reference::list_items).post(reference::create_item),
        )
        .route(
            "/reference/{kind}/{id}",
            get(reference::get_item)
                .patch(reference::update_item)
                .delete(reference::delete_item),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let api_routes = Router::new()
        .route("/health", get(handlers::health))
        .merge(protected_routes)
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
}
