use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;
use storefront_db::database::{DatabaseClient, DbError, DbResult};

/// Scripted stand-in for the database client
///
/// Queued responses are consumed by `execute_query` in order; once the queue
/// is empty every query answers with `default_response`.
#[derive(Debug)]
pub struct MockDatabaseClient {
    responses: Mutex<VecDeque<DbResult<Option<String>>>>,
    default_response: Mutex<DbResult<Option<String>>>,
    delay: Mutex<Option<Duration>>,
    hang: AtomicBool,
    connected: AtomicBool,
    queries: AtomicU32,
    raw_statements: AtomicU32,
    connects: AtomicU32,
    disconnects: AtomicU32,
}

impl Default for MockDatabaseClient {
    fn default() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            default_response: Mutex::new(Ok(Some("1".to_string()))),
            delay: Mutex::new(None),
            hang: AtomicBool::new(false),
            connected: AtomicBool::new(false),
            queries: AtomicU32::new(0),
            raw_statements: AtomicU32::new(0),
            connects: AtomicU32::new(0),
            disconnects: AtomicU32::new(0),
        }
    }
}

impl MockDatabaseClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every query fails with `message`
    pub fn failing(message: &str) -> Self {
        let client = Self::default();
        client.set_default_response(Err(DbError::new(message)));
        client
    }

    /// Queries never resolve
    pub fn hanging() -> Self {
        let client = Self::default();
        client.hang.store(true, Ordering::SeqCst);
        client
    }

    pub fn push_response(&self, response: DbResult<Option<String>>) {
        self.responses.lock().push_back(response);
    }

    pub fn push_error(&self, message: &str) {
        self.push_response(Err(DbError::new(message)));
    }

    pub fn set_default_response(&self, response: DbResult<Option<String>>) {
        *self.default_response.lock() = response;
    }

    /// Sleep this long before answering each query
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = Some(delay);
    }

    pub fn query_count(&self) -> u32 {
        self.queries.load(Ordering::SeqCst)
    }

    pub fn raw_count(&self) -> u32 {
        self.raw_statements.load(Ordering::SeqCst)
    }

    pub fn connect_count(&self) -> u32 {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn disconnect_count(&self) -> u32 {
        self.disconnects.load(Ordering::SeqCst)
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn next_response(&self) -> DbResult<Option<String>> {
        self.responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| self.default_response.lock().clone())
    }
}

#[async_trait]
impl DatabaseClient for MockDatabaseClient {
    async fn connect(&self) -> DbResult<()> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn disconnect(&self) -> DbResult<()> {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn execute_query(&self, _query: &str) -> DbResult<Option<String>> {
        self.queries.fetch_add(1, Ordering::SeqCst);

        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.hang.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }

        self.next_response()
    }

    async fn execute_raw(&self, _statement: &str) -> DbResult<u64> {
        self.raw_statements.fetch_add(1, Ordering::SeqCst);
        self.next_response().map(|_| 1)
    }
}
