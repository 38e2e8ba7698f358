//! Metrics definitions for optimization requests.

use shared::metrics_defs::{MetricDef, MetricType};

pub const OPTIMIZE_REQUESTS: MetricDef = MetricDef {
    name: "optimize_tours.requests",
    metric_type: MetricType::Counter,
    description: "Number of optimize-tours requests, tagged by outcome",
};

pub const OPTIMIZE_DURATION: MetricDef = MetricDef {
    name: "optimize_tours.upstream.duration",
    metric_type: MetricType::Histogram,
    description: "Time spent waiting for the optimization service in seconds",
};

pub const OPTIMIZE_SHIPMENTS: MetricDef = MetricDef {
    name: "optimize_tours.shipments",
    metric_type: MetricType::Histogram,
    description: "Number of shipments per forwarded request",
};

pub const ALL_METRICS: &[MetricDef] = &[OPTIMIZE_REQUESTS, OPTIMIZE_DURATION, OPTIMIZE_SHIPMENTS];
