//! # In-memory series container.
//!
//! [`MemoryStore`] is a [`Repository`] keeping named series in a map:
//! - `store` creates a series or merges new points into it (later values win);
//! - `read` returns the stored points inside the period, or an empty series;
//! - `find` matches a regular expression against whole stored identifiers.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use regex::Regex;

use crate::error::EndpointError;
use crate::series::{NamedSeries, TimeSeries, TsInfo, UtcPeriod};

use super::repository::Repository;

struct Entry {
    series: TimeSeries,
    created: DateTime<Utc>,
    modified: DateTime<Utc>,
}

/// Thread-safe map of identifier → series.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Entry>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Full stored series for `id`.
    pub fn get(&self, id: &str) -> Option<TimeSeries> {
        self.entries.read().get(id).map(|e| e.series.clone())
    }

    /// Stored identifiers, sorted.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.entries.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Number of stored series.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// True if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("series", &self.len())
            .finish()
    }
}

#[async_trait]
impl Repository for MemoryStore {
    async fn read(
        &self,
        paths: &[String],
        period: UtcPeriod,
    ) -> Result<Vec<TimeSeries>, EndpointError> {
        let entries = self.entries.read();
        Ok(paths
            .iter()
            .map(|p| {
                entries
                    .get(p)
                    .map(|e| e.series.slice(period))
                    .unwrap_or_default()
            })
            .collect())
    }

    async fn find(&self, query: &str) -> Result<Vec<TsInfo>, EndpointError> {
        let pattern = Regex::new(&format!("^(?:{query})$"))
            .map_err(|e| EndpointError::Other(format!("invalid find pattern: {e}")))?;
        let entries = self.entries.read();
        let mut found: Vec<TsInfo> = entries
            .iter()
            .filter(|(id, _)| pattern.is_match(id))
            .map(|(id, e)| TsInfo {
                name: id.clone(),
                data_period: e.series.data_period(),
                created: e.created,
                modified: e.modified,
            })
            .collect();
        found.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(found)
    }

    async fn store(&self, series: Vec<NamedSeries>) -> Result<(), EndpointError> {
        let now = Utc::now();
        let mut entries = self.entries.write();
        for named in series {
            entries
                .entry(named.id)
                .and_modify(|e| {
                    e.series.merge(&named.series);
                    e.modified = now;
                })
                .or_insert_with(|| Entry {
                    series: named.series.clone(),
                    created: now,
                    modified: now,
                });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::Point;
    use chrono::{TimeDelta, TimeZone};

    fn at(h: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + TimeDelta::hours(h)
    }

    fn series(hours: &[i64], value: f64) -> TimeSeries {
        TimeSeries::new(hours.iter().map(|&h| Point::new(at(h), value)))
    }

    #[tokio::test]
    async fn store_merges_and_read_slices() {
        let store = MemoryStore::new();
        store
            .store(vec![NamedSeries::new("t", series(&[0, 1], 1.0))])
            .await
            .unwrap();
        store
            .store(vec![NamedSeries::new("t", series(&[1, 2], 2.0))])
            .await
            .unwrap();

        let full = store.get("t").unwrap();
        assert_eq!(full.len(), 3);
        assert_eq!(full.points()[1].value, 2.0);

        let out = store
            .read(&["t".to_string(), "missing".to_string()], UtcPeriod::new(at(1), at(2)))
            .await
            .unwrap();
        assert_eq!(out[0].len(), 1);
        assert!(out[1].is_empty());
    }

    #[tokio::test]
    async fn find_matches_whole_ids() {
        let store = MemoryStore::new();
        store
            .store(vec![
                NamedSeries::new("station/temp", series(&[0], 1.0)),
                NamedSeries::new("station/temp_max", series(&[0], 1.0)),
                NamedSeries::new("other/temp", series(&[0], 1.0)),
            ])
            .await
            .unwrap();

        let names: Vec<String> = store
            .find("station/.*")
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.name)
            .collect();
        assert_eq!(names, vec!["station/temp", "station/temp_max"]);

        let exact = store.find("station/temp").await.unwrap();
        assert_eq!(exact.len(), 1);
        assert!(store.find("(").await.is_err());
    }
}
