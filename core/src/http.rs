//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! Requests and responses are plain data. `LbsClient` builds `HttpRequest`
//! values and parses `HttpResponse` values without touching the network;
//! whoever holds a transport (the async `LbsService`, a C host through the
//! FFI crate, or a test harness) performs the actual round-trip.
//!
//! Query parameters are kept as ordered pairs rather than a pre-rendered
//! string so callers and tests can inspect them before encoding.

use url::form_urlencoded;

/// HTTP method for a request. The geodata API is driven entirely by GET.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
        }
    }
}

/// An HTTP request described as plain data.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    /// Endpoint URL without the query string.
    pub path: String,
    /// Query parameters in the order they are sent.
    pub query: Vec<(String, String)>,
}

impl HttpRequest {
    /// Look up the first query value for `key`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Render the form-urlencoded query string.
    pub fn query_string(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.query.iter())
            .finish()
    }

    /// Full request URL: endpoint plus encoded query.
    pub fn url(&self) -> String {
        if self.query.is_empty() {
            return self.path.clone();
        }
        format!("{}?{}", self.path, self.query_string())
    }
}

/// An HTTP response described as plain data.
///
/// Constructed by the transport after executing an `HttpRequest`, then passed
/// to `LbsClient::parse_*`.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(query: &[(&str, &str)]) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            path: "http://api.map.baidu.com/geosearch/v4/nearby".to_string(),
            query: query
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    #[test]
    fn url_without_query_is_bare_path() {
        let req = request(&[]);
        assert_eq!(req.url(), "http://api.map.baidu.com/geosearch/v4/nearby");
    }

    #[test]
    fn url_keeps_parameter_order() {
        let req = request(&[("ak", "secret"), ("radius", "500"), ("output", "json")]);
        assert_eq!(
            req.url(),
            "http://api.map.baidu.com/geosearch/v4/nearby?ak=secret&radius=500&output=json"
        );
    }

    #[test]
    fn literal_percent_in_value_is_escaped() {
        let req = request(&[("location", "31.2%2C121.5")]);
        assert_eq!(req.query_string(), "location=31.2%252C121.5");
    }

    #[test]
    fn non_ascii_values_are_percent_encoded() {
        let req = request(&[("address", "宾馆")]);
        assert_eq!(req.query_string(), "address=%E5%AE%BE%E9%A6%86");
    }

    #[test]
    fn param_returns_first_match() {
        let req = request(&[("ak", "a"), ("ak", "b")]);
        assert_eq!(req.param("ak"), Some("a"));
        assert_eq!(req.param("missing"), None);
    }

    #[test]
    fn success_range() {
        assert!(HttpResponse { status: 200, body: String::new() }.is_success());
        assert!(HttpResponse { status: 204, body: String::new() }.is_success());
        assert!(!HttpResponse { status: 302, body: String::new() }.is_success());
        assert!(!HttpResponse { status: 500, body: String::new() }.is_success());
    }
}
