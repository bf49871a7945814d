use std::time::Duration;

use async_trait::async_trait;
use futures::stream::BoxStream;
use thiserror::Error;

/// Errors raised by client and connection implementations.
///
/// These are never fatal to a workload run: the executor captures them
/// into the `error` field of the corresponding query report.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClientError {
    #[error("failed to connect: {0}")]
    Connect(String),

    #[error("failed to execute statement: {0}")]
    Execute(String),

    #[error("statement timed out after {0:?}")]
    Timeout(Duration),

    #[error("connection is already closed")]
    Closed,
}

/// An asynchronous connection to a database.
///
/// A connection performs one operation at a time; concurrency comes from
/// opening multiple connections. The workload executor owns a connection
/// exclusively for the duration of one query and closes it on every exit
/// path, success or failure.
#[async_trait]
pub trait AsyncConnection: Send {
    /// The row type produced by `execute`; opaque to the runner.
    type Row: Send + 'static;

    /// Executes one SQL statement and streams the resulting rows. Every
    /// row read is a suspension point.
    fn execute<'a>(&'a mut self, sql: &'a str) -> BoxStream<'a, Result<Self::Row, ClientError>>;

    /// Closes this connection. Fails when already closed.
    async fn close(&mut self) -> Result<(), ClientError>;
}

/// An asynchronous client interface for a database.
///
/// A client hands out connections, each representing a single session.
/// The runner imposes no global connection cap; how many concurrent
/// `connect` calls are tolerated is the implementation's concern, as is
/// any pooling.
#[async_trait]
pub trait AsyncClient: Send + Sync {
    type Conn: AsyncConnection;

    /// Opens a connection. When `statement_timeout` is given, `execute`
    /// on the resulting connection is expected to fail with
    /// [`ClientError::Timeout`] if a statement exceeds it.
    async fn connect(
        &self,
        statement_timeout: Option<Duration>,
    ) -> Result<Self::Conn, ClientError>;
}

/// The row type a client's connections produce.
pub type RowOf<C> = <<C as AsyncClient>::Conn as AsyncConnection>::Row;
