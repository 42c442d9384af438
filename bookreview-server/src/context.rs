use std::sync::Arc;

use axum::extract::FromRef;
use bookreview_domain::{Library, SqliteDatabase};

#[derive(Clone, FromRef)]
pub struct ServerContext {
    pub library: Arc<Library<SqliteDatabase>>,
}

impl ServerContext {
    pub fn new(library: Library<SqliteDatabase>) -> Self {
        Self {
            library: Arc::new(library),
        }
    }
}
