//! Snapshot persistence and CSV export.
//!
//! A [`Snapshot`] is the schema-stable view of a [`CrawlBatch`] handed to
//! downstream reporting: a JSON object mapping each query to its ordered
//! `{rank, title, link}` array. Failed and cancelled queries keep their
//! key with an empty array. Key order follows the batch on both write and
//! read.

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::Result;
use crate::types::{CrawlBatch, SearchResult};

/// CSV header row.
const CSV_HEADER: [&str; 4] = ["keyword", "rank", "title", "link"];

/// Ordered query → results mapping, as persisted.
///
/// Duplicate queries are kept as separate entries, so the JSON object then
/// repeats a key. [`read_snapshot`] returns every entry in file order, but
/// generic JSON readers usually keep only the last value for a repeated key
/// (JavaScript's `JSON.parse` does). Deduplicate queries before crawling if
/// the snapshot is consumed that way.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Snapshot {
    entries: Vec<(String, Vec<SearchResult>)>,
}

impl Snapshot {
    /// Iterate over `(query, results)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[SearchResult])> {
        self.entries.iter().map(|(q, r)| (q.as_str(), r.as_slice()))
    }

    /// Results for the first entry whose query equals `query`.
    pub fn get(&self, query: &str) -> Option<&[SearchResult]> {
        self.entries
            .iter()
            .find(|(q, _)| q == query)
            .map(|(_, r)| r.as_slice())
    }

    /// Number of queries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the snapshot has no queries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<&CrawlBatch> for Snapshot {
    fn from(batch: &CrawlBatch) -> Self {
        Self {
            entries: batch
                .iter()
                .map(|(query, outcome)| (query.to_string(), outcome.results.clone()))
                .collect(),
        }
    }
}

impl Serialize for Snapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (query, results) in &self.entries {
            map.serialize_entry(query, results)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Snapshot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct SnapshotVisitor;

        impl<'de> Visitor<'de> for SnapshotVisitor {
            type Value = Snapshot;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object mapping queries to result arrays")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<Snapshot, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((query, results)) = access.next_entry::<String, Vec<SearchResult>>()? {
                    entries.push((query, results));
                }
                Ok(Snapshot { entries })
            }
        }

        deserializer.deserialize_map(SnapshotVisitor)
    }
}

/// Write `snapshot` as pretty-printed JSON, creating parent directories.
///
/// # Errors
///
/// Returns [`crate::CrawlError::Io`] or [`crate::CrawlError::Json`] on failure.
pub fn write_snapshot(snapshot: &Snapshot, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(snapshot)?;
    fs::write(path, json)?;
    tracing::debug!(path = %path.display(), queries = snapshot.len(), "snapshot written");
    Ok(())
}

/// Read a snapshot previously written by [`write_snapshot`].
///
/// # Errors
///
/// Returns [`crate::CrawlError::Io`] if the file cannot be read, or
/// [`crate::CrawlError::Json`] if it is not a valid snapshot.
pub fn read_snapshot(path: &Path) -> Result<Snapshot> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Write `snapshot` as CSV: header `keyword,rank,title,link`, one row per
/// result, every field quoted and embedded quotes doubled.
///
/// # Errors
///
/// Returns [`crate::CrawlError::Csv`] if writing fails.
pub fn write_csv<W: io::Write>(snapshot: &Snapshot, writer: W) -> Result<()> {
    let mut csv = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);

    csv.write_record(CSV_HEADER)?;
    for (query, results) in snapshot.iter() {
        for result in results {
            csv.write_record([
                query,
                result.rank.to_string().as_str(),
                result.title.as_str(),
                result.link.as_str(),
            ])?;
        }
    }
    csv.flush()?;
    Ok(())
}

/// Render `snapshot` as a CSV string. See [`write_csv`].
///
/// # Errors
///
/// Returns [`crate::CrawlError::Csv`] if encoding fails.
pub fn to_csv_string(snapshot: &Snapshot) -> Result<String> {
    let mut buf = Vec::new();
    write_csv(snapshot, &mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Write `snapshot` as CSV to `path`, creating parent directories.
///
/// # Errors
///
/// Returns [`crate::CrawlError::Io`] or [`crate::CrawlError::Csv`] on failure.
pub fn export_csv(snapshot: &Snapshot, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let file = fs::File::create(path)?;
    write_csv(snapshot, io::BufWriter::new(file))?;
    tracing::debug!(path = %path.display(), "CSV export written");
    Ok(())
}
