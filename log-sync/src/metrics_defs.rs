//! Metrics definitions for log-sync.

use shared::metrics_defs::{MetricDef, MetricType};

pub const ENTRIES_RECEIVED: MetricDef = MetricDef {
    name: "entries.received",
    metric_type: MetricType::Counter,
    description: "Number of entries submitted. Tagged with route.",
};

pub const ENTRIES_SKIPPED: MetricDef = MetricDef {
    name: "entries.skipped",
    metric_type: MetricType::Counter,
    description: "Number of bulk entries dropped for missing fields",
};

pub const ROWS_APPENDED: MetricDef = MetricDef {
    name: "sheets.rows_appended",
    metric_type: MetricType::Counter,
    description: "Number of rows appended to the spreadsheet. Tagged with route.",
};

pub const REQUEST_ERRORS: MetricDef = MetricDef {
    name: "requests.errors",
    metric_type: MetricType::Counter,
    description: "Number of requests answered with an error. Tagged with route, reason.",
};

pub const APPEND_DURATION: MetricDef = MetricDef {
    name: "sheets.append.duration",
    metric_type: MetricType::Histogram,
    description: "Duration of the spreadsheet append call in seconds. Tagged with route.",
};

pub const ALL_METRICS: &[MetricDef] = &[
    ENTRIES_RECEIVED,
    ENTRIES_SKIPPED,
    ROWS_APPENDED,
    REQUEST_ERRORS,
    APPEND_DURATION,
];
