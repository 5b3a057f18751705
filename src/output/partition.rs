//! Time-derived output partitions
//!
//! Layout: `{root}/ingest_year=YYYY/ingest_month=MM/ingest_day=DD/ingest_hour=HH/`

use chrono::{DateTime, Datelike, Timelike, Utc};
use std::fmt;

/// Source of wall-clock time for partitioning
pub trait Clock: Send + Sync {
    /// Current time
    fn now(&self) -> DateTime<Utc>;
}

/// System wall clock (UTC)
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock frozen at a fixed instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Hour partition of the output location
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OutputPartition {
    root: String,
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
}

impl OutputPartition {
    /// Partition containing `time` under `root`
    pub fn at(root: &str, time: DateTime<Utc>) -> Self {
        Self {
            root: if root.ends_with("://") {
                root.to_string()
            } else {
                root.trim_end_matches('/').to_string()
            },
            year: time.year(),
            month: time.month(),
            day: time.day(),
            hour: time.hour(),
        }
    }

    /// Partition for the current wall-clock hour
    pub fn current(root: &str, clock: &dyn Clock) -> Self {
        Self::at(root, clock.now())
    }

    /// Output root this partition lives under
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Partition key prefix relative to the root, with trailing slash
    pub fn prefix(&self) -> String {
        self.keys()
            .iter()
            .map(|(key, value)| format!("{key}={value}/"))
            .collect()
    }

    /// Full partition path, with trailing slash
    pub fn path(&self) -> String {
        if self.root.is_empty() || self.root.ends_with('/') {
            format!("{}{}", self.root, self.prefix())
        } else {
            format!("{}/{}", self.root, self.prefix())
        }
    }

    /// Partition key/value pairs in layout order
    pub fn keys(&self) -> [(&'static str, String); 4] {
        [
            ("ingest_year", format!("{:04}", self.year)),
            ("ingest_month", format!("{:02}", self.month)),
            ("ingest_day", format!("{:02}", self.day)),
            ("ingest_hour", format!("{:02}", self.hour)),
        ]
    }
}

impl fmt::Display for OutputPartition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Build the partition path for `time` under `root`
pub fn partition_path(root: &str, time: DateTime<Utc>) -> String {
    OutputPartition::at(root, time).path()
}
