use axum::{
    Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Basic},
};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

use std::{net::SocketAddr, sync::Arc};

use crate::{ServerError, change_requests, memberships, teams, transactions, user, view_mode};
use engine::{Actor, Engine};

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub db: DatabaseConnection,
}

impl ServerState {
    /// Resolves the Identity Context of the authenticated user in `team_id`.
    ///
    /// A user who is not a member gets the same answer as for a team that
    /// does not exist.
    pub(crate) async fn actor(&self, team_id: &str, user: &user::Model) -> Result<Actor, ServerError> {
        Ok(self.engine.actor(team_id, &user.username).await?)
    }
}

async fn auth(
    auth_header: Option<TypedHeader<Authorization<Basic>>>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(auth_header) = auth_header else {
        return Err(StatusCode::UNAUTHORIZED);
    };
    if auth_header.username().is_empty() || auth_header.password().is_empty() {
        return Err(StatusCode::UNAUTHORIZED);
    }

    let user: Option<user::Model> = user::Entity::find()
        .filter(user::Column::Username.eq(auth_header.username()))
        .filter(user::Column::Password.eq(auth_header.password()))
        .one(&state.db)
        .await
        .map_err(|err| {
            tracing::error!("failed to look up user: {err}");
            StatusCode::UNAUTHORIZED
        })?;

    let Some(user) = user else {
        return Err(StatusCode::UNAUTHORIZED);
    };

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/teams", get(teams::list).post(teams::create))
        .route(
            "/teams/{team_id}/members",
            get(memberships::list).post(memberships::add),
        )
        .route(
            "/teams/{team_id}/members/{username}",
            axum::routing::patch(memberships::assign_role).delete(memberships::remove),
        )
        .route("/teams/{team_id}/view-mode", post(view_mode::select))
        .route(
            "/teams/{team_id}/transactions",
            get(transactions::list).post(transactions::create),
        )
        .route(
            "/teams/{team_id}/transactions/{id}",
            get(transactions::get)
                .patch(transactions::update)
                .delete(transactions::delete),
        )
        .route(
            "/teams/{team_id}/transactions/{id}/edit-requests",
            post(transactions::request_edit),
        )
        .route(
            "/teams/{team_id}/transactions/{id}/delete-requests",
            post(transactions::request_delete),
        )
        .route("/teams/{team_id}/change-requests", get(change_requests::list))
        .route(
            "/teams/{team_id}/change-requests/{id}",
            get(change_requests::get),
        )
        .route(
            "/teams/{team_id}/change-requests/{id}/resolve",
            post(change_requests::resolve),
        )
        .route(
            "/teams/{team_id}/change-requests/{id}/cancel",
            post(change_requests::cancel),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), auth))
        .with_state(state)
}

pub async fn run(engine: Arc<Engine>, db: DatabaseConnection, addr: SocketAddr) {
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener on {addr}: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(engine, db, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    engine: Arc<Engine>,
    db: DatabaseConnection,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let state = ServerState { engine, db };

    axum::serve(listener, router(state)).await
}
