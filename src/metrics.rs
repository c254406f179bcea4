// Prometheus metrics definitions for the Green GPT backend.

use lazy_static::lazy_static;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // ── Counters ─────────────────────────────────────────────────────

    /// Questions successfully generated, by game mode.
    pub static ref QUESTIONS_GENERATED_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("greengpt_questions_generated_total", "Questions successfully generated"),
        &["mode"],
    )
    .unwrap();

    /// Upstream generation failures, by error kind (auth, quota, api, ...).
    pub static ref GENERATION_FAILURES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("greengpt_generation_failures_total", "Upstream generation failures"),
        &["kind"],
    )
    .unwrap();

    /// Model replies that could not be parsed into JSON, by failure kind.
    pub static ref PARSE_FAILURES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("greengpt_parse_failures_total", "Model replies that failed JSON recovery"),
        &["kind"],
    )
    .unwrap();

    /// Fallback questions served in place of a generated one.
    pub static ref FALLBACKS_SERVED_TOTAL: IntCounter = IntCounter::new(
        "greengpt_fallbacks_served_total",
        "Fallback questions served",
    )
    .unwrap();

    /// Answer verdicts produced, by outcome (correct, incorrect, retry).
    pub static ref ANSWERS_CHECKED_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("greengpt_answers_checked_total", "Answer verdicts produced"),
        &["outcome"],
    )
    .unwrap();

    /// New player profiles created.
    pub static ref PROFILES_CREATED_TOTAL: IntCounter = IntCounter::new(
        "greengpt_profiles_created_total",
        "New player profiles created",
    )
    .unwrap();

    /// Badges newly unlocked, by badge id.
    pub static ref BADGES_UNLOCKED_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("greengpt_badges_unlocked_total", "Badges newly unlocked"),
        &["badge"],
    )
    .unwrap();

    // ── Histograms ───────────────────────────────────────────────────

    /// Upstream generation call duration in seconds, by endpoint.
    pub static ref GENERATION_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "greengpt_generation_duration_seconds",
            "Upstream generation call duration in seconds",
        )
        .buckets(vec![0.25, 0.5, 1.0, 2.0, 4.0, 8.0, 15.0, 30.0]),
        &["endpoint"],
    )
    .unwrap();
}

/// Register all metrics with the custom registry. Call once at startup.
pub fn register_metrics() {
    let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(QUESTIONS_GENERATED_TOTAL.clone()),
        Box::new(GENERATION_FAILURES_TOTAL.clone()),
        Box::new(PARSE_FAILURES_TOTAL.clone()),
        Box::new(FALLBACKS_SERVED_TOTAL.clone()),
        Box::new(ANSWERS_CHECKED_TOTAL.clone()),
        Box::new(PROFILES_CREATED_TOTAL.clone()),
        Box::new(BADGES_UNLOCKED_TOTAL.clone()),
        Box::new(GENERATION_DURATION_SECONDS.clone()),
    ];

    for c in collectors {
        REGISTRY.register(c).expect("failed to register metric");
    }
}

/// Serialize all registered metrics to the Prometheus text exposition format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}
