use axum::http::StatusCode;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;

#[derive(Default)]
pub(crate) struct RequestMetrics {
    counts: Mutex<HashMap<(String, u16), u64>>,
    latency_ns: Mutex<HashMap<String, Vec<u64>>>,
}

impl RequestMetrics {
    pub(crate) async fn observe_request(&self, route: &str, status: StatusCode, latency: Duration) {
        let mut counts = self.counts.lock().await;
        *counts
            .entry((route.to_string(), status.as_u16()))
            .or_insert(0) += 1;
        drop(counts);
        let mut latency_map = self.latency_ns.lock().await;
        latency_map
            .entry(route.to_string())
            .or_default()
            .push(latency.as_nanos() as u64);
    }

    /// Prometheus text exposition of request counts and latency quantiles.
    pub(crate) async fn render_prometheus(&self) -> String {
        let mut out = String::new();
        out.push_str("# TYPE pluggin_requests_total counter\n");
        let counts = self.counts.lock().await;
        let mut count_rows: Vec<(&(String, u16), &u64)> = counts.iter().collect();
        count_rows.sort();
        for ((route, status), count) in count_rows {
            out.push_str(&format!(
                "pluggin_requests_total{{route=\"{route}\",status=\"{status}\"}} {count}\n"
            ));
        }
        drop(counts);

        out.push_str("# TYPE pluggin_request_latency_seconds summary\n");
        let latency = self.latency_ns.lock().await;
        let mut routes: Vec<&String> = latency.keys().collect();
        routes.sort();
        for route in routes {
            let samples = &latency[route];
            for (label, q) in [("0.5", 0.5_f64), ("0.95", 0.95), ("0.99", 0.99)] {
                let value = percentile_ns(samples, q) as f64 / 1e9;
                out.push_str(&format!(
                    "pluggin_request_latency_seconds{{route=\"{route}\",quantile=\"{label}\"}} {value}\n"
                ));
            }
            out.push_str(&format!(
                "pluggin_request_latency_seconds_count{{route=\"{route}\"}} {}\n",
                samples.len()
            ));
        }
        out
    }
}

fn percentile_ns(samples: &[u64], quantile: f64) -> u64 {
    if samples.is_empty() {
        return 0;
    }
    let mut sorted: Vec<u64> = samples.to_vec();
    sorted.sort_unstable();
    let idx = ((sorted.len() as f64) * quantile).ceil() as usize;
    sorted[idx.saturating_sub(1).min(sorted.len() - 1)]
}
