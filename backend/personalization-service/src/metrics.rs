use actix_web::HttpResponse;
use once_cell::sync::Lazy;
use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, TextEncoder};

static REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let counter = IntCounterVec::new(
        Opts::new(
            "personalization_service_requests_total",
            "Requests handled by personalization-service, by endpoint",
        ),
        &["endpoint"],
    )
    .expect("failed to create personalization_service_requests_total");
    if let Err(e) = prometheus::default_registry().register(Box::new(counter.clone())) {
        tracing::warn!(error = %e, "Failed to register personalization_service_requests_total");
    }
    counter
});

static ITEMS_SCORED: Lazy<HistogramVec> = Lazy::new(|| {
    let histogram = HistogramVec::new(
        HistogramOpts::new(
            "personalization_service_items_per_request",
            "Content items scored per request",
        )
        .buckets(vec![0.0, 1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0]),
        &["endpoint"],
    )
    .expect("failed to create personalization_service_items_per_request");
    if let Err(e) = prometheus::default_registry().register(Box::new(histogram.clone())) {
        tracing::warn!(error = %e, "Failed to register personalization_service_items_per_request");
    }
    histogram
});

pub fn observe_request(endpoint: &str) {
    REQUESTS_TOTAL.with_label_values(&[endpoint]).inc();
}

pub fn observe_items_scored(endpoint: &str, count: usize) {
    ITEMS_SCORED
        .with_label_values(&[endpoint])
        .observe(count as f64);
}

pub async fn serve_metrics() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return HttpResponse::InternalServerError().body(err.to_string());
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}
