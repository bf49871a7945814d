use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use squall_sqlgen::SqlGenerator;

use crate::client::ClientError;
use crate::schedule::{Once, Schedule};
use crate::time::now_utc;
use crate::user::User;

/// A SQL query with an execution schedule.
///
/// A query moves through the runner as `INITIAL -> STARTED -> SCHEDULED ->
/// RUNNING -> COMPLETED`; a recurring query bounces between `SCHEDULED`
/// and `RUNNING` until its schedule is exhausted.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub sql: String,
    pub schedule: Schedule,
}

impl Query {
    pub fn new(sql: &str, schedule: Schedule) -> Query {
        Query {
            sql: sql.to_string(),
            schedule,
        }
    }

    /// Schedules this query to be executed once in the future.
    pub fn start(
        &self,
        user: User,
        processed_time: DateTime<Utc>,
        scheduled_time: DateTime<Utc>,
    ) -> ScheduledQuery {
        ScheduledQuery {
            user,
            query: self.clone(),
            processed_time,
            scheduled_time,
        }
    }
}

/// A user query scheduled by the runner to run once at some time.
///
/// `processed_time` is when the query entered the `SCHEDULED` state;
/// `scheduled_time` is when it is due to execute. All timestamps are UTC
/// wall-clock.
#[derive(Debug, Clone)]
pub struct ScheduledQuery {
    pub user: User,
    pub query: Query,
    pub processed_time: DateTime<Utc>,
    pub scheduled_time: DateTime<Utc>,
}

impl ScheduledQuery {
    /// Builds the completion report of this scheduled query from the
    /// outcome of one execution.
    pub fn into_report<R>(
        self,
        executed_time: DateTime<Utc>,
        execution_time: StdDuration,
        outcome: Result<Vec<R>, ClientError>,
    ) -> QueryReport<R> {
        let (results, error) = match outcome {
            Ok(rows) => (Some(rows), None),
            Err(client_error) => (None, Some(client_error)),
        };
        QueryReport {
            user: self.user,
            query: self.query,
            processed_time: self.processed_time,
            scheduled_time: self.scheduled_time,
            executed_time,
            execution_time,
            results,
            error,
        }
    }
}

/// A report of one complete execution of a scheduled query, either a
/// success carrying the returned rows or a failure carrying the error.
///
/// `executed_time` is the wall-clock instant execution began;
/// `execution_time` is the monotonic elapsed duration, so it is unaffected
/// by wall-clock adjustments.
#[derive(Debug, Clone)]
pub struct QueryReport<R> {
    pub user: User,
    pub query: Query,
    pub processed_time: DateTime<Utc>,
    pub scheduled_time: DateTime<Utc>,
    pub executed_time: DateTime<Utc>,
    pub execution_time: StdDuration,
    results: Option<Vec<R>>,
    error: Option<ClientError>,
}

impl<R> QueryReport<R> {
    pub fn results(&self) -> Option<&[R]> {
        self.results.as_deref()
    }

    pub fn error(&self) -> Option<&ClientError> {
        self.error.as_ref()
    }

    /// Exactly one of `results` and `error` is set.
    pub fn outcome(&self) -> Result<&[R], &ClientError> {
        match (&self.results, &self.error) {
            (Some(rows), None) => Ok(rows),
            (None, Some(client_error)) => Err(client_error),
            _ => unreachable!("a report carries exactly one of results and error"),
        }
    }

    /// When the query transitioned from `RUNNING` to `COMPLETED`.
    pub fn completed_time(&self) -> DateTime<Utc> {
        self.executed_time
            + Duration::from_std(self.execution_time).unwrap_or_else(|_| Duration::zero())
    }
}

/// The flat, serializable form of a query report, used by the file
/// reporter. Exactly one of `results` and `error_message` is non-null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimpleQueryReport<R> {
    pub sql: String,
    pub execution_time_seconds: f64,
    pub results: Option<Vec<R>>,
    pub error_message: Option<String>,
}

impl<R: Clone> SimpleQueryReport<R> {
    pub fn from_report(report: &QueryReport<R>) -> SimpleQueryReport<R> {
        SimpleQueryReport {
            sql: report.query.sql.clone(),
            execution_time_seconds: report.execution_time.as_secs_f64(),
            results: report.results.clone(),
            error_message: report.error.as_ref().map(ClientError::to_string),
        }
    }
}

impl<R: Serialize> SimpleQueryReport<R> {
    pub fn dumps(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl<R: DeserializeOwned> SimpleQueryReport<R> {
    pub fn loads(line: &str) -> Result<SimpleQueryReport<R>, serde_json::Error> {
        serde_json::from_str(line)
    }
}

/// An immutable, restartable source of queries.
///
/// Implementations must not rely on iteration side effects: every call to
/// `iter` yields the same sequence. Finite sources are plain vectors;
/// unbounded ones are closures over seeded generator state.
pub trait QuerySource: Send + Sync {
    fn iter(&self) -> Box<dyn Iterator<Item = Query> + Send + '_>;
}

impl QuerySource for Vec<Query> {
    fn iter(&self) -> Box<dyn Iterator<Item = Query> + Send + '_> {
        Box::new(self.as_slice().iter().cloned())
    }
}

/// Query sources chained back to back, in order.
pub struct ChainedQueries {
    sources: Vec<Arc<dyn QuerySource>>,
}

impl ChainedQueries {
    pub fn new(sources: Vec<Arc<dyn QuerySource>>) -> ChainedQueries {
        ChainedQueries { sources }
    }
}

impl QuerySource for ChainedQueries {
    fn iter(&self) -> Box<dyn Iterator<Item = Query> + Send + '_> {
        Box::new(self.sources.iter().flat_map(|source| source.iter()))
    }
}

/// The SQL strings a [`QueryGenerator`] attaches schedules to: either a
/// fixed list or a lazy generator.
#[derive(Clone)]
pub enum SqlSource {
    Fixed(Arc<[String]>),
    Generator(Arc<dyn SqlGenerator>),
}

impl SqlSource {
    pub fn fixed(sqls: impl IntoIterator<Item = String>) -> SqlSource {
        SqlSource::Fixed(sqls.into_iter().collect())
    }

    fn iter(&self) -> Box<dyn Iterator<Item = String> + Send + '_> {
        match self {
            SqlSource::Fixed(sqls) => Box::new(sqls.iter().cloned()),
            SqlSource::Generator(generator) => generator.iter(),
        }
    }
}

enum QueryTiming {
    /// Every query shares one fixed `Once` schedule.
    FixedTime(Once),
    /// Queries are scheduled at evenly-spaced offsets from the moment
    /// iteration starts.
    FixedInterval(Duration),
}

/// An immutable generator of scheduled queries over a SQL source.
///
/// Attached schedules are always `Once`: recurring queries are built
/// directly with [`Schedule::Repeat`], not through a generator.
pub struct QueryGenerator {
    sql_source: SqlSource,
    timing: QueryTiming,
}

impl QueryGenerator {
    /// Queries all carrying the given fixed schedule.
    pub fn with_fixed_time(sql_source: SqlSource, schedule: Once) -> QueryGenerator {
        QueryGenerator {
            sql_source,
            timing: QueryTiming::FixedTime(schedule),
        }
    }

    /// Queries scheduled `interval` apart, starting from the first yield.
    pub fn with_fixed_interval(sql_source: SqlSource, interval: Duration) -> QueryGenerator {
        QueryGenerator {
            sql_source,
            timing: QueryTiming::FixedInterval(interval),
        }
    }

    /// Queries scheduled so that no more than `queries_per_second` fall
    /// within any one-second window.
    pub fn with_fixed_rate(sql_source: SqlSource, queries_per_second: f64) -> QueryGenerator {
        QueryGenerator::with_fixed_interval(
            sql_source,
            Duration::nanoseconds((1e9 / queries_per_second) as i64),
        )
    }
}

impl QuerySource for QueryGenerator {
    fn iter(&self) -> Box<dyn Iterator<Item = Query> + Send + '_> {
        match &self.timing {
            QueryTiming::FixedTime(once) => {
                let once = *once;
                Box::new(
                    self.sql_source
                        .iter()
                        .map(move |sql| Query::new(&sql, Schedule::Once(once))),
                )
            }
            QueryTiming::FixedInterval(interval) => {
                let interval = *interval;
                let start_time = now_utc();
                Box::new(self.sql_source.iter().enumerate().map(move |(i, sql)| {
                    Query::new(
                        &sql,
                        Schedule::once(start_time + interval * i as i32),
                    )
                }))
            }
        }
    }
}
