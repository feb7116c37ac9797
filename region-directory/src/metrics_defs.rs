//! Metrics definitions for the region directory.

use shared::metrics_defs::{MetricDef, MetricType};

pub const DIRECTORY_CACHE_HIT: MetricDef = MetricDef {
    name: "directory.cache.hit",
    metric_type: MetricType::Counter,
    description: "Number of resolutions served from a fresh directory snapshot",
};

pub const DIRECTORY_REFRESH: MetricDef = MetricDef {
    name: "directory.refresh",
    metric_type: MetricType::Counter,
    description: "Number of directory refresh attempts. Tagged with result.",
};

pub const DIRECTORY_REFRESH_DURATION: MetricDef = MetricDef {
    name: "directory.refresh.duration",
    metric_type: MetricType::Histogram,
    description: "Time to fetch the region list from the catalog in seconds",
};

pub const DIRECTORY_COUNTRIES: MetricDef = MetricDef {
    name: "directory.countries",
    metric_type: MetricType::Gauge,
    description: "Number of country codes in the current directory snapshot",
};

pub const ALL_METRICS: &[MetricDef] = &[
    DIRECTORY_CACHE_HIT,
    DIRECTORY_REFRESH,
    DIRECTORY_REFRESH_DURATION,
    DIRECTORY_COUNTRIES,
];
