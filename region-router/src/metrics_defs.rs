use shared::metrics_defs::{MetricDef, MetricType};

pub const REQUEST_DURATION: MetricDef = MetricDef {
    name: "request.duration",
    metric_type: MetricType::Histogram,
    description: "Request duration in seconds. Tagged with status.",
};

pub const REGION_DECISIONS: MetricDef = MetricDef {
    name: "region.decision",
    metric_type: MetricType::Counter,
    description: "Number of requests per routing decision. Tagged with decision.",
};

pub const UPSTREAM_ERRORS: MetricDef = MetricDef {
    name: "upstream.errors",
    metric_type: MetricType::Counter,
    description: "Number of failed forwards to the storefront upstream. Tagged with kind.",
};

pub const ALL_METRICS: &[MetricDef] = &[REQUEST_DURATION, REGION_DECISIONS, UPSTREAM_ERRORS];
