use std::sync::Arc;

use bookreview_domain::{DatabaseError, Library, LogMailer, MailError, Mailer, SmtpMailer, SqliteDatabase};
use bookreview_server::{run_server, ServerContext};
use colored::Colorize;
use config::{Config, ConfigError};
use log::{error, info, warn};
use thiserror::Error;
use tokio::runtime::{self, Runtime};

mod config;
mod logging;

/// The book review application, ready to serve
struct BookReview {
    config: Config,
    context: ServerContext,
    runtime: Runtime,
}

#[derive(Debug, Error)]
enum StartupError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Could not initialize database: {0}")]
    Database(#[from] DatabaseError),

    #[error("Could not set up mail: {0}")]
    Mail(#[from] MailError),

    #[error("Server stopped: {0}")]
    Server(std::io::Error),

    #[error("Fatal error: {0}")]
    Fatal(String),
}

impl BookReview {
    fn new() -> Result<Self, StartupError> {
        config::load_dotenv();
        let config = Config::from_env()?;

        info!("Building async runtime...");
        let runtime = runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("bookreview-async")
            .build()
            .map_err(|e| StartupError::Fatal(e.to_string()))?;

        info!("Connecting to database...");
        let database = runtime.block_on(SqliteDatabase::new(&config.database_url))?;

        let mailer: Arc<dyn Mailer> = match &config.smtp {
            Some(settings) => Arc::new(SmtpMailer::new(settings)?),
            None => {
                warn!("SMTP_SERVER is not set, outgoing mail will only be logged");
                Arc::new(LogMailer)
            }
        };

        let library = Library::new(database, mailer);

        Ok(Self {
            config,
            context: ServerContext::new(library),
            runtime,
        })
    }

    fn run(self) -> Result<(), StartupError> {
        let Self {
            config,
            context,
            runtime,
        } = self;

        runtime
            .block_on(run_server(context, config.port))
            .map_err(StartupError::Server)
    }
}

impl StartupError {
    fn hint(&self) -> String {
        match self {
            StartupError::Config(_) => "Check the environment variables, or the .env file, and try again.".to_string(),
            StartupError::Database(_) => "This is a database error. Make sure DATABASE_URL points to a writable SQLite file, then try again.".to_string(),
            StartupError::Mail(_) => "Make sure SMTP_SERVER is a valid host and SMTP_USERNAME is a valid email address, or unset SMTP_SERVER to disable mail.".to_string(),
            StartupError::Server(_) => "Make sure BOOKREVIEW_PORT is not used by another process.".to_string(),
            StartupError::Fatal(_) => "This error is fatal, and should not happen.".to_string(),
        }
    }
}

fn report(error: StartupError) {
    error!(
        "{} Read the error below to troubleshoot the issue.",
        "Book Review failed to start!".bold().red()
    );
    error!("{}", error);
    error!(
        "{}",
        format!("Hint: {}", error.hint()).dimmed().italic()
    );
}

fn main() {
    if let Err(e) = logging::init_logger() {
        eprintln!("Could not initialize logging: {}", e);
        return;
    }

    match BookReview::new() {
        Ok(app) => {
            info!("Initialized successfully.");

            if let Err(error) = app.run() {
                report(error);
            }
        }
        Err(error) => report(error),
    }
}
