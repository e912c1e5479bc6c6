//! Query attribution from `pg_stat_activity`.
//!
//! For each process id the service opens a fresh read-only connection and
//! asks the server what that backend is running. Looking the query up right
//! after the process was measured keeps the two in step; a batched lookup
//! would report queries that started after the scan.

use sqlx::postgres::{PgConnectOptions, PgConnection};
use sqlx::{ConnectOptions, Connection};
use tokio::runtime::Runtime;
use tracing::{debug, info};

use crate::snapshot::QueryInfo;

/// Looks up the query a process is currently running.
pub trait QueryAttribution {
    /// Returns `None` when nothing is known; never fails the scan.
    fn query_for(&mut self, pid: u32) -> Option<QueryInfo>;
}

/// Shape of the activity query, chosen by server version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityQuery {
    /// 9.2 up to 9.5: boolean `waiting` column.
    WaitingFlag,
    /// 9.6 and later: `wait_event_type` / `wait_event`.
    WaitEvent,
}

impl ActivityQuery {
    /// Picks the query shape for a `server_version_num`; `None` before 9.2.
    pub fn for_version(version_num: i32) -> Option<Self> {
        match version_num {
            v if v >= 90600 => Some(ActivityQuery::WaitEvent),
            v if v >= 90200 => Some(ActivityQuery::WaitingFlag),
            _ => None,
        }
    }

    pub fn sql(self) -> &'static str {
        match self {
            ActivityQuery::WaitingFlag => {
                "SELECT state AS qry_state, \
                        coalesce(waiting::text, '') AS waiting_state, \
                        query \
                 FROM pg_catalog.pg_stat_activity WHERE pid = $1"
            }
            ActivityQuery::WaitEvent => {
                "SELECT state AS qry_state, \
                        (CASE WHEN wait_event_type IS NOT NULL \
                              THEN wait_event_type || ':' || coalesce(wait_event, '') \
                              ELSE '' END) AS waiting_state, \
                        query \
                 FROM pg_catalog.pg_stat_activity WHERE pid = $1"
            }
        }
    }
}

/// Failures while setting up the attribution service. Fatal to the run.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("invalid database connection string: {0}")]
    InvalidUrl(#[source] sqlx::Error),

    #[error("cannot connect to the database server: {0}")]
    Connect(#[source] sqlx::Error),

    #[error("cannot read the server version: {0}")]
    Version(String),

    #[error("cannot start the database runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

/// Builds connection options: an explicit URL, or user and database
/// `postgres` over the default local socket / `PG*` environment.
pub fn connect_options(database_url: Option<&str>) -> Result<PgConnectOptions, QueryError> {
    let options = match database_url {
        Some(url) => url.parse::<PgConnectOptions>().map_err(QueryError::InvalidUrl)?,
        None => PgConnectOptions::new().username("postgres").database("postgres"),
    };
    Ok(options.application_name("pg-meminfo").disable_statement_logging())
}

async fn open_read_only(options: &PgConnectOptions) -> Result<PgConnection, sqlx::Error> {
    let mut conn = PgConnection::connect_with(options).await?;
    sqlx::query("SET SESSION CHARACTERISTICS AS TRANSACTION READ ONLY")
        .execute(&mut conn)
        .await?;
    Ok(conn)
}

/// Per-pid `pg_stat_activity` lookups, one connection per lookup.
pub struct PgActivityService {
    runtime: Runtime,
    options: PgConnectOptions,
    query: Option<ActivityQuery>,
}

impl PgActivityService {
    /// Connects once to verify access and learn the server version.
    pub fn connect(options: PgConnectOptions) -> Result<Self, QueryError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(QueryError::Runtime)?;

        let version_num = runtime.block_on(async {
            let mut conn = open_read_only(&options).await.map_err(QueryError::Connect)?;
            let (raw,): (String,) =
                sqlx::query_as("SELECT current_setting('server_version_num')")
                    .fetch_one(&mut conn)
                    .await
                    .map_err(|e| QueryError::Version(e.to_string()))?;
            let _ = conn.close().await;
            let version = raw
                .trim()
                .parse::<i32>()
                .map_err(|e| QueryError::Version(format!("'{}': {}", raw, e)))?;
            Ok::<i32, QueryError>(version)
        })?;

        let query = ActivityQuery::for_version(version_num);
        match query {
            Some(shape) => info!("Query attribution enabled (server {}, {:?})", version_num, shape),
            None => info!(
                "Server version {} predates pg_stat_activity.state; no query attribution",
                version_num
            ),
        }

        Ok(Self {
            runtime,
            options,
            query,
        })
    }

    /// Query shape in use; `None` when the server is too old for attribution.
    pub fn activity_query(&self) -> Option<ActivityQuery> {
        self.query
    }

    async fn lookup(
        options: &PgConnectOptions,
        query: ActivityQuery,
        pid: u32,
    ) -> Result<Option<QueryInfo>, sqlx::Error> {
        let mut conn = open_read_only(options).await?;
        let row: Option<(Option<String>, Option<String>, Option<String>)> =
            sqlx::query_as(query.sql())
                .bind(pid as i32)
                .fetch_optional(&mut conn)
                .await?;
        let _ = conn.close().await;

        Ok(row.map(|(state, wait_state, text)| QueryInfo {
            state: state.unwrap_or_default(),
            wait_state: wait_state.unwrap_or_default(),
            text: text.unwrap_or_default(),
        }))
    }
}

impl QueryAttribution for PgActivityService {
    fn query_for(&mut self, pid: u32) -> Option<QueryInfo> {
        let query = self.query?;
        match self.runtime.block_on(Self::lookup(&self.options, query, pid)) {
            Ok(info) => info.filter(|q| !q.text.is_empty()),
            Err(e) => {
                debug!("No query attribution for pid {}: {}", pid, e);
                None
            }
        }
    }
}
