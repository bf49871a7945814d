use std::future::Future;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::Duration;
use futures::StreamExt;
use log::{debug, warn};
use thiserror::Error;
use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedSender};
use tokio::task::JoinSet;
use tokio::time::Instant;

use crate::client::{AsyncClient, AsyncConnection, ClientError, RowOf};
use crate::query::{Query, QueryReport, QuerySource, ScheduledQuery};
use crate::queue::BoundedPriorityQueue;
use crate::reporter::QueryReporter;
use crate::schedule::Schedule;
use crate::time::{now_utc, TimeMeasurement};
use crate::user::User;
use crate::workload::Workload;

// Don't consume a query source all at once: the per-user scheduled queue
// backpressures the producer.
const MAX_SCHEDULED_QUEUE_SIZE: usize = 10;

/// Errors that abort a whole workload run. Per-query execution failures
/// are not among them; those are captured into query reports.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("reporter failed: {0}")]
    Reporter(#[from] crate::reporter::ReporterError),

    #[error("workload task failed: {0}")]
    Task(String),

    #[error("workload run was cancelled")]
    Cancelled,
}

/// Items flowing from the producer to the per-user executor.
enum ScheduledItem {
    Query(ScheduledQuery),
    Done,
}

/// Items flowing from the executors to the shared reporter loop.
enum CompletedItem<R> {
    Report(QueryReport<R>),
    OneDone,
}

/// Runs the workload against the given client, delivering exactly one
/// report per query execution and one final `done` to the reporter.
///
/// Per user, queries run serially in schedule order; across users they
/// run concurrently. No query executes before its scheduled time, and
/// repeating queries are re-enqueued until their schedule is exhausted.
pub async fn run_workload<C, R>(
    workload: &Workload,
    client: Arc<C>,
    reporter: &mut R,
    statement_timeout: Option<StdDuration>,
) -> Result<(), RunnerError>
where
    C: AsyncClient + 'static,
    C::Conn: 'static,
    R: QueryReporter<RowOf<C>>,
{
    run_workload_with_shutdown(
        workload,
        client,
        reporter,
        statement_timeout,
        std::future::pending(),
    )
    .await
}

/// Like [`run_workload`], but additionally stops when `shutdown`
/// completes. On shutdown the reporter still receives every report
/// already produced, then `done`, and the call returns
/// [`RunnerError::Cancelled`].
pub async fn run_workload_with_shutdown<C, R, F>(
    workload: &Workload,
    client: Arc<C>,
    reporter: &mut R,
    statement_timeout: Option<StdDuration>,
    shutdown: F,
) -> Result<(), RunnerError>
where
    C: AsyncClient + 'static,
    C::Conn: 'static,
    R: QueryReporter<RowOf<C>>,
    F: Future<Output = ()>,
{
    // Wall-clock targets become offsets from this anchor; the priority
    // keys must be monotonic even when the wall clock is not.
    let anchor = Instant::now();
    let num_users = workload.len();

    let (completed_tx, mut completed_rx) = mpsc::unbounded_channel::<CompletedItem<RowOf<C>>>();
    let mut tasks: JoinSet<()> = JoinSet::new();

    for (user, query_source) in workload.iter() {
        let scheduled_queue: Arc<BoundedPriorityQueue<ScheduledItem>> =
            Arc::new(BoundedPriorityQueue::new(MAX_SCHEDULED_QUEUE_SIZE));

        tasks.spawn(producer_worker(
            user,
            query_source,
            Arc::clone(&scheduled_queue),
            anchor,
        ));
        tasks.spawn(executor_worker(
            scheduled_queue,
            completed_tx.clone(),
            Arc::clone(&client),
            statement_timeout,
            anchor,
        ));
    }

    // The reporter loop holds no sender; `recv` returning `None` means
    // every worker is gone.
    drop(completed_tx);

    tokio::pin!(shutdown);

    let mut num_users_done = 0usize;
    let run_result: Result<(), RunnerError> = loop {
        tokio::select! {
            _ = &mut shutdown => {
                debug!("workload run cancelled, draining reports");
                break Err(RunnerError::Cancelled);
            }

            maybe_item = completed_rx.recv() => {
                match maybe_item {
                    Some(CompletedItem::Report(query_report)) => {
                        if let Err(reporter_error) = reporter.report(&query_report).await {
                            break Err(reporter_error.into());
                        }
                    }
                    Some(CompletedItem::OneDone) => {
                        num_users_done += 1;
                        // Finish only when every user's executor finished
                        if num_users_done == num_users {
                            break Ok(());
                        }
                    }
                    None => break Ok(()),
                }
            }

            Some(join_result) = tasks.join_next(), if !tasks.is_empty() => {
                if let Err(join_error) = join_result {
                    warn!("workload task failed: {join_error}");
                    break Err(RunnerError::Task(join_error.to_string()));
                }
            }
        }
    };

    // Tear down whatever is still running, flush the reports already in
    // the completed queue (sentinels no longer matter), and signal `done`
    // exactly once before surfacing the result.
    tasks.abort_all();
    while tasks.join_next().await.is_some() {}

    loop {
        match completed_rx.try_recv() {
            Ok(CompletedItem::Report(query_report)) => {
                if reporter.report(&query_report).await.is_err() {
                    break;
                }
            }
            Ok(CompletedItem::OneDone) => continue,
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
        }
    }

    let done_result = reporter.done().await.map_err(RunnerError::from);
    run_result.and(done_result)
}

/// Converts a query's schedule into a monotonic priority key and hands the
/// scheduled query to the executor queue. Shared by the producer path
/// (bounded) and the executor's repeat re-enqueue path (capacity-exempt).
async fn schedule_single_query(
    user: &User,
    query: Query,
    scheduled_queue: &BoundedPriorityQueue<ScheduledItem>,
    anchor: Instant,
    bounded: bool,
) {
    let processed_time = now_utc();
    let time_until_next = query.schedule.time_until_next();

    let priority = monotonic_key(anchor, time_until_next);
    let scheduled = query.start(
        user.clone(),
        processed_time,
        processed_time + time_until_next,
    );

    if bounded {
        scheduled_queue
            .push(priority, ScheduledItem::Query(scheduled))
            .await;
    } else {
        scheduled_queue
            .push_unbounded(priority, ScheduledItem::Query(scheduled))
            .await;
    }
}

/// Monotonic nanoseconds (relative to the runner's anchor) at which the
/// item becomes due. Negative offsets mean "overdue" and order by how
/// overdue they are.
fn monotonic_key(anchor: Instant, time_until_next: Duration) -> i64 {
    let now_nanos = anchor.elapsed().as_nanos() as i64;
    let offset_nanos = time_until_next.num_nanoseconds().unwrap_or({
        if time_until_next > Duration::zero() {
            i64::MAX
        } else {
            i64::MIN
        }
    });
    now_nanos.saturating_add(offset_nanos)
}

/// Feeds one user's query source into the scheduled queue, then signals
/// the executor with a sentinel that sorts after everything else.
async fn producer_worker(
    user: User,
    query_source: Arc<dyn QuerySource>,
    scheduled_queue: Arc<BoundedPriorityQueue<ScheduledItem>>,
    anchor: Instant,
) {
    for query in query_source.iter() {
        // Every query is executed at least once
        schedule_single_query(&user, query, &scheduled_queue, anchor, true).await;
    }
    scheduled_queue
        .push(i64::MAX, ScheduledItem::Done)
        .await;
}

/// Executes one user's scheduled queries in due-time order: sleep until
/// due, run through a fresh connection, report, and re-enqueue repeats.
/// One executor per user is what gives per-user serial order.
async fn executor_worker<C>(
    scheduled_queue: Arc<BoundedPriorityQueue<ScheduledItem>>,
    completed_tx: UnboundedSender<CompletedItem<RowOf<C>>>,
    client: Arc<C>,
    statement_timeout: Option<StdDuration>,
    anchor: Instant,
) where
    C: AsyncClient + 'static,
    C::Conn: 'static,
{
    loop {
        let (priority, item) = scheduled_queue.pop().await;
        let scheduled = match item {
            ScheduledItem::Query(scheduled) => scheduled,
            ScheduledItem::Done => {
                let _ = completed_tx.send(CompletedItem::OneDone);
                return;
            }
        };

        // Wait if the query is not due yet
        let now_nanos = anchor.elapsed().as_nanos() as i64;
        if now_nanos < priority {
            tokio::time::sleep(StdDuration::from_nanos((priority - now_nanos) as u64)).await;
        }

        let user = scheduled.user.clone();
        let query = scheduled.query.clone();

        let measurement = TimeMeasurement::start();
        let outcome = execute_query(client.as_ref(), statement_timeout, &query.sql).await;
        let execution_time = measurement.elapsed();

        let report = scheduled.into_report(measurement.start_time(), execution_time, outcome);
        if completed_tx.send(CompletedItem::Report(report)).is_err() {
            // The reporter loop is gone; nothing left to do
            return;
        }

        // Re-enqueue a repeating query whose schedule has not ended
        if let Schedule::Repeat(repeat) = &query.schedule {
            if repeat.time_until_next() >= Duration::zero() {
                schedule_single_query(&user, query, &scheduled_queue, anchor, false).await;
            }
        }
    }
}

/// Runs one statement through a fresh connection, draining all rows.
/// The connection is closed on every path; all client errors are captured
/// into the returned outcome instead of propagating.
async fn execute_query<C: AsyncClient>(
    client: &C,
    statement_timeout: Option<StdDuration>,
    sql: &str,
) -> Result<Vec<RowOf<C>>, ClientError> {
    let mut connection = client.connect(statement_timeout).await?;
    let result = drain_rows::<C>(&mut connection, sql).await;
    let close_result = connection.close().await;

    match (result, close_result) {
        (Err(execute_error), _) => Err(execute_error),
        (Ok(_), Err(close_error)) => Err(close_error),
        (Ok(rows), Ok(())) => Ok(rows),
    }
}

async fn drain_rows<C: AsyncClient>(
    connection: &mut C::Conn,
    sql: &str,
) -> Result<Vec<RowOf<C>>, ClientError> {
    let mut rows = Vec::new();
    let mut stream = connection.execute(sql);
    while let Some(row) = stream.next().await {
        rows.push(row?);
    }
    Ok(rows)
}
