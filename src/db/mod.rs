//! MongoDB connection handling and index bootstrap.
//!
//! [`Db::connect`] is the single place the process talks to the cluster for
//! the first time: it parses the connection string, bounds server selection
//! so a dead cluster cannot stall startup, pings the `admin` database to
//! prove the connection is live, and logs the resolved host list. Callers
//! decide what a failure means; at startup it is fatal.

use std::time::Duration;

use anyhow::{Context, Result};
use mongodb::bson::doc;
use mongodb::options::{ClientOptions, IndexOptions};
use mongodb::{Client, Collection, Database, IndexModel};
use tracing::info;

pub mod models;
pub mod questions;
pub mod search;
pub mod sessions;

use models::{InterviewSession, Question};

pub const QUESTIONS_COLLECTION: &str = "questions";
pub const SESSIONS_COLLECTION: &str = "sessions";

/// Full-text index spanning the searchable question fields.
pub const QUESTION_TEXT_INDEX: &str = "question_text";

/// A handle to the application database. Cheap to clone; the underlying
/// driver multiplexes a shared connection pool.
#[derive(Clone)]
pub struct Db {
    database: Database,
    hosts: Vec<String>,
}

impl Db {
    /// Connect to MongoDB and verify the connection with a ping.
    ///
    /// No retry and no backoff: the caller treats failure here as fatal
    /// because the server cannot run without its primary data store.
    pub async fn connect(cfg: &crate::config::MongoConfig) -> Result<Self> {
        let mut options = ClientOptions::parse(&cfg.uri)
            .await
            .context("failed to parse MongoDB connection string")?;
        options.app_name = Some("qbank".to_string());
        options.server_selection_timeout =
            Some(Duration::from_secs(cfg.server_selection_timeout_secs));

        let hosts: Vec<String> = options.hosts.iter().map(ToString::to_string).collect();

        let client = Client::with_options(options).context("failed to build MongoDB client")?;

        client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await
            .context("failed to reach MongoDB")?;

        info!("MongoDB connected: {}", hosts.join(", "));

        Ok(Self {
            database: client.database(&cfg.database),
            hosts,
        })
    }

    /// Hosts resolved from the connection string, for status logging.
    #[must_use]
    pub fn hosts(&self) -> &[String] {
        &self.hosts
    }

    #[must_use]
    pub fn questions(&self) -> Collection<Question> {
        self.database.collection(QUESTIONS_COLLECTION)
    }

    #[must_use]
    pub fn sessions(&self) -> Collection<InterviewSession> {
        self.database.collection(SESSIONS_COLLECTION)
    }

    /// Create the indexes the query layer relies on.
    ///
    /// The text index spans `question`, `answer`, and `topics` and backs
    /// keyword search; the compound index backs the filterable listing and
    /// the descending `createdAt` index backs newest-first pagination.
    /// Index creation is idempotent.
    pub async fn ensure_indexes(&self) -> Result<()> {
        let questions = self.questions();

        questions
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "question": "text", "answer": "text", "topics": "text" })
                    .options(
                        IndexOptions::builder()
                            .name(QUESTION_TEXT_INDEX.to_string())
                            .build(),
                    )
                    .build(),
            )
            .await
            .context("failed to create question text index")?;

        questions
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "type": 1, "category": 1, "difficulty": 1 })
                    .build(),
            )
            .await
            .context("failed to create question filter index")?;

        questions
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "createdAt": -1 })
                    .build(),
            )
            .await
            .context("failed to create question recency index")?;

        self.sessions()
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "userId": 1, "startTime": -1 })
                    .build(),
            )
            .await
            .context("failed to create session index")?;

        info!("Database indexes ensured");
        Ok(())
    }
}
