use std::time::Duration;

/// One served HTTP request, kept as an access log line
#[derive(Debug, Clone, PartialEq)]
pub struct RequestLog {
    pub method: String,
    /// Path and query string as requested
    pub path: String,
    pub status: u16,
    pub latency: Duration,
}
