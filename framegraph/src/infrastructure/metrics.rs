// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Prometheus metrics for the DAG runtime, independent of the profiler's
//! own fps/latency bookkeeping: these are the ambient operational counters
//! an operator scrapes, not replayable trace data.

use prometheus::{IntCounterVec, IntGaugeVec, Opts, Registry, TextEncoder};

pub struct MetricsRegistry {
    registry: Registry,
    pub completed_total: IntCounterVec,
    pub dropped_total: IntCounterVec,
    pub queue_depth: IntGaugeVec,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        let registry = Registry::new();

        let completed_total = IntCounterVec::new(
            Opts::new("framegraph_completed_total", "Frames that completed a stage"),
            &["stage"],
        )
        .expect("metric definition is valid");
        let dropped_total = IntCounterVec::new(
            Opts::new("framegraph_dropped_total", "Frames dropped by the DPB sweep or stream EOS"),
            &["stage"],
        )
        .expect("metric definition is valid");
        let queue_depth = IntGaugeVec::new(
            Opts::new("framegraph_queue_depth", "Current depth of a stage's input conveyor"),
            &["stage"],
        )
        .expect("metric definition is valid");

        registry.register(Box::new(completed_total.clone())).expect("unique metric name");
        registry.register(Box::new(dropped_total.clone())).expect("unique metric name");
        registry.register(Box::new(queue_depth.clone())).expect("unique metric name");

        MetricsRegistry {
            registry,
            completed_total,
            dropped_total,
            queue_depth,
        }
    }

    /// Renders every registered metric in Prometheus text exposition format,
    /// for a `/metrics` endpoint.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        encoder.encode_to_string(&metric_families)
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_includes_registered_metric_names() {
        let registry = MetricsRegistry::new();
        registry.completed_total.with_label_values(&["decode"]).inc();
        registry.queue_depth.with_label_values(&["decode"]).set(3);
        let text = registry.encode().unwrap();
        assert!(text.contains("framegraph_completed_total"));
        assert!(text.contains("framegraph_queue_depth"));
    }
}
