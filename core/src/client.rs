//! Stateless HTTP request builder and response parser for the delivery API.
//!
//! # Design
//! `ApiClient` holds only a `base_url`. Every endpoint is split into a
//! `build_*` method that produces an `HttpRequest` and a `parse_*` method
//! that consumes an `HttpResponse`; the caller executes the round-trip.
//! The session token is passed in per request rather than stored, so the
//! client never holds a stale credential.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{
    decode_deliveries, Business, Customer, Delivery, DeliveryStatus, LoginRequest, LoginResponse,
    Package, PackageStatus, StatusUpdate,
};

/// Backend paths, relative to the base URL.
pub mod endpoints {
    pub const LOGIN: &str = "/login";
    pub const DELIVERIES: &str = "/deliveries";

    pub fn delivery(id: u64) -> String {
        format!("/deliveries/{id}")
    }

    pub fn packages(delivery_id: u64) -> String {
        format!("/deliveries/{delivery_id}/packages")
    }

    pub fn package(delivery_id: u64, package_id: u64) -> String {
        format!("/deliveries/{delivery_id}/packages/{package_id}")
    }

    pub fn business(id: u64) -> String {
        format!("/business/{id}")
    }

    pub fn customer(id: u64) -> String {
        format!("/customer/{id}")
    }
}

/// Synchronous, stateless request builder for the delivery API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(&config.base_url)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // -----------------------------------------------------------------------
    // Generic builders
    // -----------------------------------------------------------------------

    /// Build a GET for `path`, attaching `token` as a bearer credential if given.
    pub fn build_get(&self, path: &str, token: Option<&str>) -> HttpRequest {
        self.request(HttpMethod::Get, path, token, None)
    }

    pub fn build_post<B: Serialize>(
        &self,
        path: &str,
        body: &B,
        token: Option<&str>,
    ) -> Result<HttpRequest, ApiError> {
        let body = to_json(body)?;
        Ok(self.request(HttpMethod::Post, path, token, Some(body)))
    }

    pub fn build_put<B: Serialize>(
        &self,
        path: &str,
        body: &B,
        token: Option<&str>,
    ) -> Result<HttpRequest, ApiError> {
        let body = to_json(body)?;
        Ok(self.request(HttpMethod::Put, path, token, Some(body)))
    }

    fn request(
        &self,
        method: HttpMethod,
        path: &str,
        token: Option<&str>,
        body: Option<String>,
    ) -> HttpRequest {
        let mut headers = Vec::new();
        if body.is_some() {
            headers.push(("content-type".to_string(), "application/json".to_string()));
        }
        if let Some(token) = token {
            headers.push(("authorization".to_string(), format!("Bearer {token}")));
        }
        let separator = if path.starts_with('/') { "" } else { "/" };
        HttpRequest {
            method,
            path: format!("{}{separator}{path}", self.base_url),
            headers,
            body,
        }
    }

    /// Check the status and decode the JSON body into `T`.
    pub fn parse<T: DeserializeOwned>(&self, response: HttpResponse) -> Result<T, ApiError> {
        check_status(&response)?;
        serde_json::from_str(&response.body)
            .map_err(|e| ApiError::DeserializationError(e.to_string()))
    }

    // -----------------------------------------------------------------------
    // Endpoint builders
    // -----------------------------------------------------------------------

    /// Login never carries a bearer token.
    pub fn build_login(&self, credentials: &LoginRequest) -> Result<HttpRequest, ApiError> {
        self.build_post(endpoints::LOGIN, credentials, None)
    }

    pub fn build_list_deliveries(&self, token: Option<&str>) -> HttpRequest {
        self.build_get(endpoints::DELIVERIES, token)
    }

    pub fn build_get_delivery(&self, id: u64, token: Option<&str>) -> HttpRequest {
        self.build_get(&endpoints::delivery(id), token)
    }

    pub fn build_get_packages(&self, delivery_id: u64, token: Option<&str>) -> HttpRequest {
        self.build_get(&endpoints::packages(delivery_id), token)
    }

    pub fn build_set_package_status(
        &self,
        delivery_id: u64,
        package_id: u64,
        status: &PackageStatus,
        token: Option<&str>,
    ) -> Result<HttpRequest, ApiError> {
        let body = StatusUpdate {
            status: status.clone(),
        };
        self.build_put(&endpoints::package(delivery_id, package_id), &body, token)
    }

    pub fn build_complete_delivery(
        &self,
        delivery_id: u64,
        token: Option<&str>,
    ) -> Result<HttpRequest, ApiError> {
        let body = StatusUpdate {
            status: DeliveryStatus::Completed,
        };
        self.build_put(&endpoints::delivery(delivery_id), &body, token)
    }

    pub fn build_get_business(&self, id: u64, token: Option<&str>) -> HttpRequest {
        self.build_get(&endpoints::business(id), token)
    }

    pub fn build_get_customer(&self, id: u64, token: Option<&str>) -> HttpRequest {
        self.build_get(&endpoints::customer(id), token)
    }

    // -----------------------------------------------------------------------
    // Endpoint parsers
    // -----------------------------------------------------------------------

    pub fn parse_login(&self, response: HttpResponse) -> Result<LoginResponse, ApiError> {
        self.parse(response)
    }

    /// Decode the delivery list record by record. Records that fail
    /// validation are dropped with a warning; the list itself must still be
    /// a JSON array.
    pub fn parse_list_deliveries(&self, response: HttpResponse) -> Result<Vec<Delivery>, ApiError> {
        let records: Vec<serde_json::Value> = self.parse(response)?;
        Ok(decode_deliveries(records))
    }

    pub fn parse_get_delivery(&self, response: HttpResponse) -> Result<Delivery, ApiError> {
        self.parse(response)
    }

    pub fn parse_get_packages(&self, response: HttpResponse) -> Result<Vec<Package>, ApiError> {
        self.parse(response)
    }

    pub fn parse_set_package_status(&self, response: HttpResponse) -> Result<Package, ApiError> {
        self.parse(response)
    }

    pub fn parse_complete_delivery(&self, response: HttpResponse) -> Result<Delivery, ApiError> {
        self.parse(response)
    }

    pub fn parse_get_business(&self, response: HttpResponse) -> Result<Business, ApiError> {
        self.parse(response)
    }

    pub fn parse_get_customer(&self, response: HttpResponse) -> Result<Customer, ApiError> {
        self.parse(response)
    }
}

fn to_json<B: Serialize>(body: &B) -> Result<String, ApiError> {
    serde_json::to_string(body).map_err(|e| ApiError::SerializationError(e.to_string()))
}

/// Map non-2xx status codes to the appropriate `ApiError` variant.
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    match response.status {
        200..=299 => Ok(()),
        404 => Err(ApiError::NotFound),
        status => Err(ApiError::HttpError {
            status,
            body: response.body.clone(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SenderRef;

    fn client() -> ApiClient {
        ApiClient::new("http://localhost:8000")
    }

    fn ok(body: &str) -> HttpResponse {
        HttpResponse::new(200, body)
    }

    #[test]
    fn build_list_deliveries_with_token() {
        let req = client().build_list_deliveries(Some("T"));
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.path, "http://localhost:8000/deliveries");
        assert_eq!(req.header("authorization"), Some("Bearer T"));
        assert!(req.body.is_none());
    }

    #[test]
    fn build_without_token_has_no_headers() {
        let req = client().build_get_delivery(7, None);
        assert_eq!(req.path, "http://localhost:8000/deliveries/7");
        assert!(req.headers.is_empty());
    }

    #[test]
    fn build_login_is_unauthenticated_json_post() {
        let req = client()
            .build_login(&LoginRequest {
                email: "a@b.com".to_string(),
                password: "pw".to_string(),
            })
            .unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.path, "http://localhost:8000/login");
        assert_eq!(req.header("content-type"), Some("application/json"));
        assert_eq!(req.header("authorization"), None);
        let body: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, serde_json::json!({"email": "a@b.com", "password": "pw"}));
    }

    #[test]
    fn build_set_package_status_puts_status() {
        let req = client()
            .build_set_package_status(3, 11, &PackageStatus::Delivered, Some("T"))
            .unwrap();
        assert_eq!(req.method, HttpMethod::Put);
        assert_eq!(req.path, "http://localhost:8000/deliveries/3/packages/11");
        assert_eq!(req.header("authorization"), Some("Bearer T"));
        let body: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, serde_json::json!({"status": "delivered"}));
    }

    #[test]
    fn build_complete_delivery_puts_completed() {
        let req = client().build_complete_delivery(3, None).unwrap();
        assert_eq!(req.method, HttpMethod::Put);
        assert_eq!(req.path, "http://localhost:8000/deliveries/3");
        let body: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, serde_json::json!({"status": "completed"}));
    }

    #[test]
    fn build_sender_lookups() {
        assert_eq!(
            client().build_get_business(5, None).path,
            "http://localhost:8000/business/5"
        );
        assert_eq!(
            client().build_get_customer(6, None).path,
            "http://localhost:8000/customer/6"
        );
        assert_eq!(
            client().build_get_packages(2, None).path,
            "http://localhost:8000/deliveries/2/packages"
        );
    }

    #[test]
    fn relative_paths_get_a_separator() {
        let req = client().build_get("deliveries", None);
        assert_eq!(req.path, "http://localhost:8000/deliveries");
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let client = ApiClient::new("http://localhost:8000/");
        assert_eq!(client.build_list_deliveries(None).path, "http://localhost:8000/deliveries");
    }

    #[test]
    fn parse_list_deliveries_success() {
        let deliveries = client()
            .parse_list_deliveries(ok(
                r#"[{"id":1,"sender_id":2,"latitude":1.0,"longitude":2.0,"status":"pending"}]"#,
            ))
            .unwrap();
        assert_eq!(deliveries.len(), 1);
        assert_eq!(deliveries[0].sender, Some(SenderRef::Customer(2)));
    }

    #[test]
    fn parse_accepts_any_2xx() {
        let pkg = client()
            .parse_set_package_status(HttpResponse::new(
                202,
                r#"{"id":1,"size":"small","status":"delivered"}"#,
            ))
            .unwrap();
        assert!(pkg.status.is_delivered());
    }

    #[test]
    fn parse_not_found() {
        let err = client().parse_get_delivery(HttpResponse::new(404, "")).unwrap_err();
        assert!(matches!(err, ApiError::NotFound));
    }

    #[test]
    fn parse_unauthorized() {
        let err = client()
            .parse_login(HttpResponse::new(401, "invalid credentials"))
            .unwrap_err();
        assert!(matches!(err, ApiError::HttpError { status: 401, .. }));
        assert!(err.is_unauthorized());
    }

    #[test]
    fn parse_bad_json() {
        let err = client().parse_get_packages(ok("not json")).unwrap_err();
        assert!(matches!(err, ApiError::DeserializationError(_)));
    }

    #[test]
    fn parse_schema_mismatch_is_a_decode_error() {
        let err = client()
            .parse_get_delivery(ok(r#"{"id":1,"latitude":1.0,"longtitude":2.0}"#))
            .unwrap_err();
        match err {
            ApiError::DeserializationError(msg) => assert!(msg.contains("longtitude")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn parse_list_drops_only_the_bad_record() {
        let deliveries = client()
            .parse_list_deliveries(ok(
                r#"[{"id":1,"latitude":1.0,"longitude":2.0},
                    {"id":2,"latitude":1.0,"longtitude":2.0},
                    {"id":3,"receipient_id":7},
                    {"id":4,"business_id":1,"sender_id":2}]"#,
            ))
            .unwrap();
        let ids: Vec<u64> = deliveries.iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![1]);
    }

    #[test]
    fn parse_list_requires_an_array() {
        let err = client().parse_list_deliveries(ok(r#"{"id":1}"#)).unwrap_err();
        assert!(matches!(err, ApiError::DeserializationError(_)));
    }

    #[test]
    fn parse_customer_optional_fields() {
        let customer = client()
            .parse_get_customer(ok(r#"{"first_name":"Ada","last_name":"Lovelace"}"#))
            .unwrap();
        assert_eq!(customer.full_name(), "Ada Lovelace");
        assert!(customer.phone_number.is_none());
    }
}
