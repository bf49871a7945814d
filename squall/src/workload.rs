use std::collections::HashSet;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::query::{ChainedQueries, QuerySource};
use crate::user::{User, UserLabel};

/// An immutable workload: a mapping from users to query sources.
///
/// Each user is one serial unit of execution; the runner executes a user's
/// queries in order, and different users concurrently. Workloads are
/// cheaply composable from smaller workloads.
#[derive(Clone, Default)]
pub struct Workload {
    queries_by_user: IndexMap<User, Arc<dyn QuerySource>>,
}

impl Workload {
    /// A workload with a single serial unit. An unlabeled user gets an
    /// integer label at iteration time.
    pub fn serial(source: Arc<dyn QuerySource>, user: Option<User>) -> Workload {
        let user = user.unwrap_or_else(User::random);
        Workload {
            queries_by_user: IndexMap::from([(user, source)]),
        }
    }

    /// A workload with one anonymous user per source.
    pub fn concurrent(sources: impl IntoIterator<Item = Arc<dyn QuerySource>>) -> Workload {
        Workload::combine(
            sources
                .into_iter()
                .map(|source| Workload::serial(source, None)),
        )
    }

    /// A workload with the given users.
    pub fn concurrent_with_users(
        pairs: impl IntoIterator<Item = (User, Arc<dyn QuerySource>)>,
    ) -> Workload {
        Workload::combine(
            pairs
                .into_iter()
                .map(|(user, source)| Workload::serial(source, Some(user))),
        )
    }

    /// Combines workloads into one. When several inputs define the same
    /// user, that user's query sources are chained in input order.
    pub fn combine(workloads: impl IntoIterator<Item = Workload>) -> Workload {
        let mut queries_by_user: IndexMap<User, Arc<dyn QuerySource>> = IndexMap::new();

        for workload in workloads {
            for (user, source) in workload.queries_by_user {
                // A user seen before keeps its original position
                match queries_by_user.get_mut(&user) {
                    Some(existing) => {
                        *existing =
                            Arc::new(ChainedQueries::new(vec![Arc::clone(existing), source]));
                    }
                    None => {
                        queries_by_user.insert(user, source);
                    }
                }
            }
        }

        Workload { queries_by_user }
    }

    /// Number of users in this workload.
    pub fn len(&self) -> usize {
        self.queries_by_user.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queries_by_user.is_empty()
    }

    /// Iterates over `(user, query_source)` pairs, assigning deterministic
    /// integer labels to unlabeled users: integers are taken from the
    /// counter 0, 1, 2, … in iteration order, skipping any integer already
    /// used as a pre-existing label. Repeated iterations yield identical
    /// labels.
    pub fn iter(&self) -> Vec<(User, Arc<dyn QuerySource>)> {
        let taken: HashSet<u64> = self
            .queries_by_user
            .keys()
            .filter_map(|user| match user.label() {
                Some(UserLabel::Index(index)) => Some(*index),
                _ => None,
            })
            .collect();

        let mut counter = 0u64;
        let mut next_unused = || {
            while taken.contains(&counter) {
                counter += 1;
            }
            let next = counter;
            counter += 1;
            next
        };

        self.queries_by_user
            .iter()
            .map(|(user, source)| {
                let labeled = match user.label() {
                    Some(_) => user.clone(),
                    None => user.relabel(UserLabel::Index(next_unused())),
                };
                (labeled, Arc::clone(source))
            })
            .collect()
    }
}
