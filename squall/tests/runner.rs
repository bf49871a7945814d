//! End-to-end workload runner scenarios with fake clients.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::Duration;
use futures::stream::{self, BoxStream};
use futures::StreamExt;
use squall::client::{AsyncClient, AsyncConnection, ClientError};
use squall::query::{Query, QueryReport, QuerySource};
use squall::reporter::{QueryReporter, ReporterError};
use squall::runner::{run_workload, run_workload_with_shutdown, RunnerError};
use squall::schedule::{Once, Repeat, Schedule};
use squall::time::now_utc;
use squall::user::User;
use squall::workload::Workload;

/// Client whose connections echo the executed SQL back as the only row.
struct EchoClient;

struct EchoConnection {
    closed: bool,
}

#[async_trait]
impl AsyncConnection for EchoConnection {
    type Row = String;

    fn execute<'a>(&'a mut self, sql: &'a str) -> BoxStream<'a, Result<String, ClientError>> {
        stream::once(async move { Ok(sql.to_string()) }).boxed()
    }

    async fn close(&mut self) -> Result<(), ClientError> {
        if self.closed {
            return Err(ClientError::Closed);
        }
        self.closed = true;
        Ok(())
    }
}

#[async_trait]
impl AsyncClient for EchoClient {
    type Conn = EchoConnection;

    async fn connect(
        &self,
        _statement_timeout: Option<StdDuration>,
    ) -> Result<EchoConnection, ClientError> {
        Ok(EchoConnection { closed: false })
    }
}

/// Client whose connections return a global execution counter.
struct CountingClient {
    counter: Arc<AtomicU64>,
}

struct CountingConnection {
    counter: Arc<AtomicU64>,
}

#[async_trait]
impl AsyncConnection for CountingConnection {
    type Row = u64;

    fn execute<'a>(&'a mut self, _sql: &'a str) -> BoxStream<'a, Result<u64, ClientError>> {
        let count = self.counter.fetch_add(1, Ordering::SeqCst);
        stream::once(async move { Ok(count) }).boxed()
    }

    async fn close(&mut self) -> Result<(), ClientError> {
        Ok(())
    }
}

#[async_trait]
impl AsyncClient for CountingClient {
    type Conn = CountingConnection;

    async fn connect(
        &self,
        _statement_timeout: Option<StdDuration>,
    ) -> Result<CountingConnection, ClientError> {
        Ok(CountingConnection {
            counter: Arc::clone(&self.counter),
        })
    }
}

/// Client whose statements always fail.
struct FailingClient;

struct FailingConnection;

#[async_trait]
impl AsyncConnection for FailingConnection {
    type Row = String;

    fn execute<'a>(&'a mut self, _sql: &'a str) -> BoxStream<'a, Result<String, ClientError>> {
        stream::once(async { Err(ClientError::Execute("synthetic failure".into())) }).boxed()
    }

    async fn close(&mut self) -> Result<(), ClientError> {
        Ok(())
    }
}

#[async_trait]
impl AsyncClient for FailingClient {
    type Conn = FailingConnection;

    async fn connect(
        &self,
        _statement_timeout: Option<StdDuration>,
    ) -> Result<FailingConnection, ClientError> {
        Ok(FailingConnection)
    }
}

/// Reporter that collects reports in memory.
#[derive(Default)]
struct MemoryReporter<R> {
    reports: Vec<QueryReport<R>>,
    num_done: usize,
}

#[async_trait]
impl<R: Clone + Send + Sync> QueryReporter<R> for MemoryReporter<R> {
    async fn report(&mut self, query_report: &QueryReport<R>) -> Result<(), ReporterError> {
        self.reports.push(query_report.clone());
        Ok(())
    }

    async fn done(&mut self) -> Result<(), ReporterError> {
        self.num_done += 1;
        Ok(())
    }
}

/// An unbounded source of immediately-due queries.
struct InfiniteSource;

impl QuerySource for InfiniteSource {
    fn iter(&self) -> Box<dyn Iterator<Item = Query> + Send + '_> {
        Box::new(
            (0..).map(|i| Query::new(&format!("SELECT {i};"), Schedule::once_now())),
        )
    }
}

fn past_queries(user_index: usize, count: usize) -> Vec<Query> {
    let base = now_utc() - Duration::milliseconds(500);
    (0..count)
        .map(|i| {
            Query::new(
                &format!("SELECT {user_index}, {i};"),
                Schedule::once(base + Duration::milliseconds(i as i64)),
            )
        })
        .collect()
}

#[tokio::test]
async fn test_three_users_thirty_reports() {
    let _ = env_logger::builder().is_test(true).try_init();

    let sources: Vec<(User, Vec<Query>)> = (0..3)
        .map(|u| (User::named(&format!("user-{u}")), past_queries(u, 10)))
        .collect();

    let workload = Workload::concurrent_with_users(sources.iter().map(|(user, queries)| {
        (
            user.clone(),
            Arc::new(queries.clone()) as Arc<dyn QuerySource>,
        )
    }));

    let mut reporter = MemoryReporter::<String>::default();
    run_workload(&workload, Arc::new(EchoClient), &mut reporter, None)
        .await
        .unwrap();

    // Exactly one report per execution, done exactly once
    assert_eq!(reporter.reports.len(), 30);
    assert_eq!(reporter.num_done, 1);

    // Every report succeeded and echoes its own SQL
    for report in &reporter.reports {
        assert_eq!(report.results(), Some(&[report.query.sql.clone()][..]));
        assert!(report.error().is_none());
    }

    // Per user: the reported SQL sequence equals the source, in target
    // time order (all targets were in the past)
    let mut by_user: HashMap<String, Vec<String>> = HashMap::new();
    for report in &reporter.reports {
        by_user
            .entry(report.user.to_string())
            .or_default()
            .push(report.query.sql.clone());
    }
    assert_eq!(by_user.len(), 3);
    for (user, queries) in &sources {
        let expected: Vec<String> = queries.iter().map(|q| q.sql.clone()).collect();
        assert_eq!(by_user[&user.to_string()], expected);
    }

    // Scheduled times are non-decreasing per user
    for (user, _) in &sources {
        let times: Vec<_> = reporter
            .reports
            .iter()
            .filter(|r| r.user.to_string() == user.to_string())
            .map(|r| r.scheduled_time)
            .collect();
        assert!(times.windows(2).all(|pair| pair[0] <= pair[1]));
    }
}

#[tokio::test]
async fn test_repeat_schedule_produces_bounded_executions() {
    let interval = Duration::milliseconds(5);
    let repeat = Repeat::starting_now(interval, 20).unwrap();
    let query = Query::new("SELECT COUNT(*) FROM t;", Schedule::Repeat(repeat));

    let workload = Workload::serial(Arc::new(vec![query]) as Arc<dyn QuerySource>, None);
    let counter = Arc::new(AtomicU64::new(0));
    let client = Arc::new(CountingClient {
        counter: Arc::clone(&counter),
    });

    let mut reporter = MemoryReporter::<u64>::default();
    run_workload(&workload, client, &mut reporter, None)
        .await
        .unwrap();

    // At most `num_repeat` executions, each reported exactly once
    assert!(reporter.reports.len() <= 20, "got {}", reporter.reports.len());
    assert!(reporter.reports.len() >= 5, "got {}", reporter.reports.len());
    assert_eq!(counter.load(Ordering::SeqCst), reporter.reports.len() as u64);
    assert_eq!(reporter.num_done, 1);

    // Successive occurrences stay on the interval grid
    let times: Vec<_> = reporter.reports.iter().map(|r| r.scheduled_time).collect();
    for pair in times.windows(2) {
        let gap = pair[1] - pair[0];
        assert!(gap >= Duration::milliseconds(4), "gap was {gap}");
    }

    // Nothing ran meaningfully before its scheduled time
    for report in &reporter.reports {
        assert!(report.executed_time >= report.scheduled_time - Duration::milliseconds(50));
    }
}

#[tokio::test]
async fn test_execution_errors_become_reports_not_failures() {
    let workload = Workload::serial(
        Arc::new(past_queries(0, 5)) as Arc<dyn QuerySource>,
        Some(User::named("failing")),
    );

    let mut reporter = MemoryReporter::<String>::default();
    run_workload(&workload, Arc::new(FailingClient), &mut reporter, None)
        .await
        .unwrap();

    assert_eq!(reporter.reports.len(), 5);
    assert_eq!(reporter.num_done, 1);
    for report in &reporter.reports {
        assert!(report.results().is_none());
        assert!(matches!(report.error(), Some(ClientError::Execute(_))));
    }
}

#[tokio::test]
async fn test_shutdown_drains_and_reports_done_once() {
    let workload = Workload::serial(Arc::new(InfiniteSource) as Arc<dyn QuerySource>, None);

    let mut reporter = MemoryReporter::<String>::default();
    let result = run_workload_with_shutdown(
        &workload,
        Arc::new(EchoClient),
        &mut reporter,
        None,
        tokio::time::sleep(StdDuration::from_millis(100)),
    )
    .await;

    assert!(matches!(result, Err(RunnerError::Cancelled)));
    // The infinite source produced something, the drain flushed it, and
    // done fired exactly once
    assert!(!reporter.reports.is_empty());
    assert_eq!(reporter.num_done, 1);
}

#[tokio::test]
async fn test_empty_workload_reports_done_once() {
    let workload = Workload::default();
    let mut reporter = MemoryReporter::<String>::default();
    run_workload(&workload, Arc::new(EchoClient), &mut reporter, None)
        .await
        .unwrap();
    assert!(reporter.reports.is_empty());
    assert_eq!(reporter.num_done, 1);
}

#[tokio::test]
async fn test_future_once_schedule_waits() {
    let at = now_utc() + Duration::milliseconds(80);
    let query = Query::new("SELECT 1;", Schedule::Once(Once::new(at)));
    let workload = Workload::serial(Arc::new(vec![query]) as Arc<dyn QuerySource>, None);

    let mut reporter = MemoryReporter::<String>::default();
    run_workload(&workload, Arc::new(EchoClient), &mut reporter, None)
        .await
        .unwrap();

    assert_eq!(reporter.reports.len(), 1);
    let report = &reporter.reports[0];
    // R2: not executed meaningfully before its scheduled time
    assert!(report.executed_time >= at - Duration::milliseconds(20));
}
