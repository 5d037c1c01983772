//! Common types for metrics definitions.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricType {
    Counter,
    Histogram,
}

#[derive(Debug, Clone, Copy)]
pub struct MetricDef {
    pub name: &'static str,
    pub metric_type: MetricType,
    pub description: &'static str,
}

/// Registers the descriptions of `defs` with the installed recorder.
pub fn describe_all(defs: &[MetricDef]) {
    for def in defs {
        match def.metric_type {
            MetricType::Counter => metrics::describe_counter!(def.name, def.description),
            MetricType::Histogram => metrics::describe_histogram!(def.name, def.description),
        }
    }
}

#[macro_export]
macro_rules! counter {
    ($def:expr $(, $label:expr => $value:expr)* $(,)?) => {
        metrics::counter!($def.name $(, $label => $value)*)
    };
}

#[macro_export]
macro_rules! histogram {
    ($def:expr $(, $label:expr => $value:expr)* $(,)?) => {
        metrics::histogram!($def.name $(, $label => $value)*)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFS: &[MetricDef] = &[
        MetricDef {
            name: "test.counter",
            metric_type: MetricType::Counter,
            description: "counter",
        },
        MetricDef {
            name: "test.histogram",
            metric_type: MetricType::Histogram,
            description: "histogram",
        },
    ];

    #[test]
    fn test_macros_without_recorder() {
        // With no recorder installed these are no-ops.
        describe_all(DEFS);
        counter!(DEFS[0], "route" => "test").increment(1);
        histogram!(DEFS[1]).record(0.5);
    }
}
