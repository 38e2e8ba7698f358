//! Metrics definitions for the storage layer.

use shared::metrics_defs::{MetricDef, MetricType};

pub const STORAGE_OPERATIONS: MetricDef = MetricDef {
    name: "storage.operations",
    metric_type: MetricType::Counter,
    description: "Number of bucket operations, tagged by operation and outcome",
};

pub const STORAGE_OPERATION_DURATION: MetricDef = MetricDef {
    name: "storage.operation.duration",
    metric_type: MetricType::Histogram,
    description: "Time to complete a bucket operation in seconds",
};

pub const ALL_METRICS: &[MetricDef] = &[STORAGE_OPERATIONS, STORAGE_OPERATION_DURATION];
