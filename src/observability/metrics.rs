use prometheus::{
    Encoder, Histogram, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub transitions_total: IntCounterVec,
    pub active_rides: IntGauge,
    pub match_requests_total: IntCounterVec,
    pub match_latency_seconds: Histogram,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let transitions_total = IntCounterVec::new(
            Opts::new("transitions_total", "Ride transitions by kind and outcome"),
            &["transition", "outcome"],
        )
        .expect("valid transitions_total metric");

        let active_rides = IntGauge::new("active_rides", "Rides currently in a non-terminal status")
            .expect("valid active_rides metric");

        let match_requests_total = IntCounterVec::new(
            Opts::new("match_requests_total", "Nearby-driver queries by outcome"),
            &["outcome"],
        )
        .expect("valid match_requests_total metric");

        let match_latency_seconds = Histogram::with_opts(prometheus::HistogramOpts::new(
            "match_latency_seconds",
            "Latency of nearby-driver matching in seconds",
        ))
        .expect("valid match_latency_seconds metric");

        registry
            .register(Box::new(transitions_total.clone()))
            .expect("register transitions_total");
        registry
            .register(Box::new(active_rides.clone()))
            .expect("register active_rides");
        registry
            .register(Box::new(match_requests_total.clone()))
            .expect("register match_requests_total");
        registry
            .register(Box::new(match_latency_seconds.clone()))
            .expect("register match_latency_seconds");

        Self {
            registry,
            transitions_total,
            active_rides,
            match_requests_total,
            match_latency_seconds,
        }
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
