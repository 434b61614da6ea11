use std::path::Path;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::Mutex;
use rusqlite::types::Type;
use rusqlite::{params, Connection, InterruptHandle};
use tracing::{debug, info, warn};

use crate::quoting::pipeline::QuoteSink;
use crate::quoting::types::Quote;
use crate::resilience::Deadline;
use crate::storage::error::{PersistError, StoreError};
use crate::storage::schema;

const PENDING: u8 = 0;
const RUNNING: u8 = 1;
const ABANDONED: u8 = 2;
const DONE: u8 = 3;

/// One stored quote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteRecord {
    pub id: i64,
    pub captured_at: DateTime<Utc>,
    pub bid: String,
}

/// Append-only quote log on SQLite.
/// A single connection behind parking_lot::Mutex, shared by all requests.
#[derive(Clone)]
pub struct QuoteStore {
    conn: Arc<Mutex<Connection>>,
    interrupt: Arc<InterruptHandle>,
    // Held while a write is marked finished and while a timed-out caller
    // decides to interrupt, so an interrupt never outlives its own write.
    finishing: Arc<Mutex<()>>,
}

impl QuoteStore {
    /// Open or create the database at `path` and ensure the schema exists.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::Io(format!("create dir: {e}")))?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch(schema::PRAGMAS)
            .map_err(|e| StoreError::Database(format!("pragmas: {e}")))?;
        conn.execute_batch(schema::CREATE_TABLES)
            .map_err(|e| StoreError::Database(format!("schema: {e}")))?;

        info!(path = %path.display(), "quote store opened");
        Ok(Self::from_connection(conn))
    }

    /// Open an in-memory database (for testing).
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(schema::CREATE_TABLES)
            .map_err(|e| StoreError::Database(format!("schema: {e}")))?;
        Ok(Self::from_connection(conn))
    }

    fn from_connection(conn: Connection) -> Self {
        let interrupt = Arc::new(conn.get_interrupt_handle());
        Self {
            conn: Arc::new(Mutex::new(conn)),
            interrupt,
            finishing: Arc::new(Mutex::new(())),
        }
    }

    /// Append one row synchronously. Returns the new row id.
    pub fn insert(&self, captured_at: DateTime<Utc>, bid: &str) -> Result<i64, StoreError> {
        let conn = self.conn.lock();
        insert_row(&conn, captured_at, bid)
    }

    /// Number of stored quotes.
    pub fn count(&self) -> Result<u64, StoreError> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM quotes", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Most recent quotes, newest first.
    pub fn recent(&self, limit: usize) -> Result<Vec<QuoteRecord>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt =
            conn.prepare("SELECT id, captured_at, bid FROM quotes ORDER BY id DESC LIMIT ?1")?;
        let rows = stmt.query_map([limit as i64], |row| {
            let raw: String = row.get(1)?;
            let captured_at = DateTime::parse_from_rfc3339(&raw)
                .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1, Type::Text, Box::new(e)))?
                .with_timezone(&Utc);
            Ok(QuoteRecord {
                id: row.get(0)?,
                captured_at,
                bid: row.get(2)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

fn insert_row(conn: &Connection, captured_at: DateTime<Utc>, bid: &str) -> Result<i64, StoreError> {
    let captured_at = captured_at.to_rfc3339_opts(SecondsFormat::Micros, true);
    conn.execute(schema::INSERT_QUOTE, params![captured_at, bid])?;
    Ok(conn.last_insert_rowid())
}

#[async_trait]
impl QuoteSink for QuoteStore {
    /// Append the quote on the blocking pool, bounded by `deadline`.
    ///
    /// On expiry a write that has not started is abandoned and one that is
    /// in flight is interrupted; the single INSERT either commits whole or
    /// rolls back.
    async fn persist(&self, quote: &Quote, deadline: Deadline) -> Result<(), PersistError> {
        let state = Arc::new(AtomicU8::new(PENDING));
        let conn = self.conn.clone();
        let bid = quote.bid().to_string();
        let captured_at = Utc::now();

        let task_state = state.clone();
        let finishing = self.finishing.clone();
        let write = tokio::task::spawn_blocking(move || {
            let conn = conn.lock();
            if task_state
                .compare_exchange(PENDING, RUNNING, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
            {
                return Err(StoreError::Abandoned);
            }
            let result = insert_row(&conn, captured_at, &bid);
            // DONE must be visible before the connection is released.
            let _finishing = finishing.lock();
            task_state.store(DONE, Ordering::Release);
            result
        });

        match deadline.run(write).await {
            Ok(Ok(Ok(id))) => {
                debug!(id, bid = quote.bid(), "quote persisted");
                Ok(())
            }
            Ok(Ok(Err(e))) => Err(e.into()),
            Ok(Err(join)) => Err(StoreError::Task(join.to_string()).into()),
            Err(exceeded) => {
                let abandoned = state
                    .compare_exchange(PENDING, ABANDONED, Ordering::AcqRel, Ordering::Acquire)
                    .is_ok();
                if !abandoned {
                    let _finishing = self.finishing.lock();
                    if state.load(Ordering::Acquire) == RUNNING {
                        warn!("interrupting in-flight quote insert");
                        self.interrupt.interrupt();
                    }
                }
                Err(PersistError::Timeout(exceeded.budget))
            }
        }
    }
}
