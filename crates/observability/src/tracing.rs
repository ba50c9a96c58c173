//! Span helpers shared by the server and the extraction pipeline

/// Create a span with common HTTP request fields
///
/// # Example
///
/// ```rust
/// use sitehue_observability::http_request_span;
///
/// let span = http_request_span!("POST", "/api/colors", "12345");
/// let _guard = span.enter();
/// ```
#[macro_export]
macro_rules! http_request_span {
    ($method:expr, $path:expr, $request_id:expr) => {
        tracing::info_span!(
            "http.request",
            http.method = $method,
            http.route = $path,
            http.status_code = tracing::field::Empty,
            request.id = $request_id,
            duration_ms = tracing::field::Empty,
            error = tracing::field::Empty,
            error.message = tracing::field::Empty,
        )
    };
}

/// Create a span for one attempt of a fallback strategy
///
/// `stage` names the chain ("page", "favicon", "decode"), `strategy` the
/// attempt within it.
///
/// # Example
///
/// ```rust
/// use sitehue_observability::strategy_span;
///
/// let span = strategy_span!("page", "http", "https://example.com");
/// let _guard = span.enter();
/// ```
#[macro_export]
macro_rules! strategy_span {
    ($stage:expr, $strategy:expr, $target:expr) => {
        tracing::debug_span!(
            "extract.strategy",
            stage = $stage,
            strategy = $strategy,
            target = $target,
            duration_ms = tracing::field::Empty,
        )
    };
}

/// Record an error on the current span and emit an error event
pub fn record_error<E: std::fmt::Display + ?Sized>(error: &E) {
    let span = tracing::Span::current();
    span.record("error", true);
    span.record("error.message", error.to_string());
    tracing::error!(error = %error, "Operation failed");
}

/// Record a duration in milliseconds on the current span
pub fn record_duration(key: &str, duration: std::time::Duration) {
    let span = tracing::Span::current();
    span.record(key, duration.as_millis() as u64);
}
