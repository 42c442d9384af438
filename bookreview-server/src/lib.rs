mod auth;
mod book_genres;
mod bookmarks;
mod books;
mod context;
mod docs;
mod errors;
mod genres;
mod members;
mod reviews;
mod schemas;
mod serialized;

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json,
};
use log::info;
use serde::Serialize;
use std::{
    io,
    net::{Ipv6Addr, SocketAddr},
};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

pub use context::ServerContext;
pub use errors::{ServerError, ServerResult};

/// The default port the server will listen on.
pub const DEFAULT_PORT: u16 = 9050;

pub type Router = axum::Router<ServerContext>;

/// Builds the complete application, with every resource nested under `/api`
pub fn router(context: ServerContext) -> axum::Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_router = Router::new()
        .nest("/Books", books::router())
        .nest("/Genres", genres::router())
        .nest("/BookGenres", book_genres::router())
        .nest("/Reviews", reviews::router())
        .nest("/Bookmarks", bookmarks::router())
        .nest("/Members", members::router())
        .nest("/Account", auth::router());

    Router::new()
        .nest("/api", api_router)
        .route("/api.json", get(docs::docs))
        .layer(cors)
        .with_state(context)
}

/// Starts the book review server
pub async fn run_server(context: ServerContext, port: u16) -> io::Result<()> {
    let addr: SocketAddr = (Ipv6Addr::UNSPECIFIED, port).into();
    let listener = TcpListener::bind(&addr).await?;

    info!("Listening on {}", addr);
    axum::serve(listener, router(context).into_make_service()).await
}

/// A 201 response pointing at where the new resource can be fetched
fn created<T>(location: String, body: T) -> Response
where
    T: Serialize,
{
    (
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(body),
    )
        .into_response()
}
