//! # RequestRouter: scheme-based dispatch of batched queries.
//!
//! ```text
//! route_read([a://1, b://2, a://3], period)
//!   1. validate every scheme         ─► MissingScheme / UnknownScheme (nothing invoked)
//!   2. group by scheme, keep indices   a: [(0,"1"), (2,"3")]   b: [(1,"2")]
//!   3. one read per repository       ─► join_all(a.read(["1","3"]), b.read(["2"]))
//!   4. check counts, reassemble      ─► [a1, b2, a3]
//! ```
//!
//! ## Rules
//! - Output position `i` always answers input identifier `i`.
//! - Each repository is called at most once per routed call.
//! - Repository failures surface as [`RouteError::Repository`] naming the scheme.

use std::sync::Arc;

use futures::future::join_all;

use crate::error::RouteError;
use crate::series::{NamedSeries, TimeSeries, TsInfo, UtcPeriod};

use super::identifier::split_scheme;
use super::registry::RepositoryRegistry;
use super::repository::Repository;

/// Identifiers of one scheme, with their positions in the routed call.
struct Group<'a> {
    scheme: &'a str,
    repository: &'a Arc<dyn Repository>,
    indices: Vec<usize>,
    paths: Vec<String>,
}

/// Dispatches identifiers to repositories by scheme.
#[derive(Debug, Clone)]
pub struct RequestRouter {
    registry: RepositoryRegistry,
}

impl RequestRouter {
    /// Creates a router over an explicit registry.
    pub fn new(registry: RepositoryRegistry) -> Self {
        Self { registry }
    }

    /// Registered schemes, in registration order.
    pub fn schemes(&self) -> Vec<&str> {
        self.registry.schemes().collect()
    }

    fn resolve<'a>(
        &'a self,
        id: &'a str,
    ) -> Result<(&'a str, &'a Arc<dyn Repository>, &'a str), RouteError> {
        let (scheme, path) = split_scheme(id)?;
        let repository = self
            .registry
            .get(scheme)
            .ok_or_else(|| RouteError::UnknownScheme {
                scheme: scheme.to_string(),
                known: self.registry.schemes().map(str::to_string).collect(),
            })?;
        Ok((scheme, repository, path))
    }

    fn group<'a>(
        &'a self,
        ids: impl IntoIterator<Item = &'a str>,
    ) -> Result<Vec<Group<'a>>, RouteError> {
        let mut groups: Vec<Group<'a>> = Vec::new();
        for (index, id) in ids.into_iter().enumerate() {
            let (scheme, repository, path) = self.resolve(id)?;
            let group = match groups.iter().position(|g| g.scheme == scheme) {
                Some(pos) => &mut groups[pos],
                None => {
                    groups.push(Group {
                        scheme,
                        repository,
                        indices: Vec::new(),
                        paths: Vec::new(),
                    });
                    let last = groups.len() - 1;
                    &mut groups[last]
                }
            };
            group.indices.push(index);
            group.paths.push(path.to_string());
        }
        Ok(groups)
    }

    /// Reads every identifier, one batched call per repository.
    ///
    /// # Errors
    /// Scheme errors before any repository is invoked; otherwise the first
    /// failing repository, or [`RouteError::ShortRead`] on a count mismatch.
    pub async fn route_read(
        &self,
        ids: &[String],
        period: UtcPeriod,
    ) -> Result<Vec<TimeSeries>, RouteError> {
        let groups = self.group(ids.iter().map(String::as_str))?;
        tracing::debug!(ids = ids.len(), repositories = groups.len(), "routing read");

        let answers = join_all(
            groups
                .iter()
                .map(|g| g.repository.read(&g.paths, period)),
        )
        .await;

        let mut slots: Vec<Option<TimeSeries>> = vec![None; ids.len()];
        for (group, answer) in groups.iter().zip(answers) {
            let series = answer.map_err(|e| RouteError::Repository {
                scheme: group.scheme.to_string(),
                error: e.to_string(),
            })?;
            if series.len() != group.indices.len() {
                return Err(RouteError::ShortRead {
                    scheme: group.scheme.to_string(),
                    expected: group.indices.len(),
                    got: series.len(),
                });
            }
            for (&index, ts) in group.indices.iter().zip(series) {
                slots[index] = Some(ts);
            }
        }
        Ok(slots.into_iter().map(Option::unwrap_or_default).collect())
    }

    /// Sends a find query to the repository named by its scheme; the answer is unchanged.
    pub async fn route_find(&self, query: &str) -> Result<Vec<TsInfo>, RouteError> {
        let (scheme, repository, path) = self.resolve(query)?;
        repository
            .find(path)
            .await
            .map_err(|e| RouteError::Repository {
                scheme: scheme.to_string(),
                error: e.to_string(),
            })
    }

    /// Stores named series, one batched call per repository.
    pub async fn route_store(&self, series: Vec<NamedSeries>) -> Result<(), RouteError> {
        let groups = self.group(series.iter().map(|s| s.id.as_str()))?;
        let batches: Vec<Vec<NamedSeries>> = groups
            .iter()
            .map(|g| {
                g.indices
                    .iter()
                    .zip(&g.paths)
                    .map(|(&index, path)| {
                        NamedSeries::new(path.clone(), series[index].series.clone())
                    })
                    .collect()
            })
            .collect();

        let answers = join_all(
            groups
                .iter()
                .zip(batches)
                .map(|(g, batch)| g.repository.store(batch)),
        )
        .await;

        for (group, answer) in groups.iter().zip(answers) {
            answer.map_err(|e| RouteError::Repository {
                scheme: group.scheme.to_string(),
                error: e.to_string(),
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EndpointError;
    use crate::series::Point;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use parking_lot::Mutex;

    /// Answers each path with a one-point series whose value is `tag * 100 + path`.
    struct Recording {
        tag: f64,
        calls: Mutex<Vec<Vec<String>>>,
    }

    impl Recording {
        fn new(tag: f64) -> Arc<Self> {
            Arc::new(Self {
                tag,
                calls: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl Repository for Recording {
        async fn read(
            &self,
            paths: &[String],
            period: UtcPeriod,
        ) -> Result<Vec<TimeSeries>, EndpointError> {
            self.calls.lock().push(paths.to_vec());
            Ok(paths
                .iter()
                .map(|p| {
                    let v: f64 = p.parse().unwrap_or(0.0);
                    TimeSeries::new([Point::new(period.start, self.tag * 100.0 + v)])
                })
                .collect())
        }

        async fn find(&self, query: &str) -> Result<Vec<TsInfo>, EndpointError> {
            Ok(vec![TsInfo::now(query, None)])
        }
    }

    fn period() -> UtcPeriod {
        UtcPeriod::new(
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 1, 1, 0, 0).unwrap(),
        )
    }

    fn ids(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    fn values(series: &[TimeSeries]) -> Vec<f64> {
        series.iter().map(|s| s.points()[0].value).collect()
    }

    #[tokio::test]
    async fn reassembles_in_input_order() {
        let (a, b) = (Recording::new(1.0), Recording::new(2.0));
        let registry = RepositoryRegistry::new()
            .with("a", a.clone())
            .unwrap()
            .with("b", b.clone())
            .unwrap();
        let router = RequestRouter::new(registry);

        let out = router
            .route_read(&ids(&["a://1", "b://2", "a://3"]), period())
            .await
            .unwrap();

        assert_eq!(values(&out), vec![101.0, 202.0, 103.0]);
        assert_eq!(*a.calls.lock(), vec![ids(&["1", "3"])]);
        assert_eq!(*b.calls.lock(), vec![ids(&["2"])]);
    }

    #[tokio::test]
    async fn unknown_scheme_invokes_nothing() {
        let a = Recording::new(1.0);
        let router = RequestRouter::new(RepositoryRegistry::new().with("a", a.clone()).unwrap());

        let err = router
            .route_read(&ids(&["a://1", "c://2"]), period())
            .await
            .unwrap_err();

        assert!(matches!(err, RouteError::UnknownScheme { ref scheme, .. } if scheme == "c"));
        assert!(err.to_string().contains("a"));
        assert!(a.calls.lock().is_empty());
    }

    #[tokio::test]
    async fn missing_scheme_is_rejected() {
        let router = RequestRouter::new(
            RepositoryRegistry::new().with("a", Recording::new(1.0)).unwrap(),
        );
        let err = router.route_read(&ids(&["plain"]), period()).await.unwrap_err();
        assert_eq!(err, RouteError::MissingScheme { id: "plain".into() });
    }

    #[tokio::test]
    async fn empty_request_returns_empty() {
        let router = RequestRouter::new(RepositoryRegistry::new());
        assert!(router.route_read(&[], period()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn find_forwards_path() {
        let router = RequestRouter::new(
            RepositoryRegistry::new().with("a", Recording::new(1.0)).unwrap(),
        );
        let found = router.route_find("a://station/.*").await.unwrap();
        assert_eq!(found[0].name, "station/.*");
    }

    #[tokio::test]
    async fn store_on_read_only_repository_fails() {
        let router = RequestRouter::new(
            RepositoryRegistry::new().with("a", Recording::new(1.0)).unwrap(),
        );
        let err = router
            .route_store(vec![NamedSeries::new("a://x", TimeSeries::empty())])
            .await
            .unwrap_err();
        assert_eq!(err.as_label(), "route_repository_failed");
    }
}
