//! Session-aware API client.
//!
//! `Session` glues the sans-IO `ApiClient` to a `Transport` and a
//! `TokenStore`. Every authenticated call re-reads the token from the store
//! and attaches it when present; with no token the request still goes out,
//! just without an `authorization` header.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::client::ApiClient;
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpRequest, Transport};
use crate::token::TokenStore;

#[derive(Debug)]
pub struct Session<T, S> {
    client: ApiClient,
    transport: T,
    store: S,
}

impl<T: Transport, S: TokenStore> Session<T, S> {
    pub fn new(client: ApiClient, transport: T, store: S) -> Self {
        Self {
            client,
            transport,
            store,
        }
    }

    pub fn from_config(config: &ClientConfig, transport: T, store: S) -> Self {
        Self::new(ApiClient::from_config(config), transport, store)
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn get<R: DeserializeOwned>(&self, path: &str) -> Result<R, ApiError> {
        let token = self.store.get();
        let request = self.client.build_get(path, token.as_deref());
        self.send(request)
    }

    pub fn post<B: Serialize, R: DeserializeOwned>(&self, path: &str, body: &B) -> Result<R, ApiError> {
        let token = self.store.get();
        let request = self.client.build_post(path, body, token.as_deref())?;
        self.send(request)
    }

    pub fn put<B: Serialize, R: DeserializeOwned>(&self, path: &str, body: &B) -> Result<R, ApiError> {
        let token = self.store.get();
        let request = self.client.build_put(path, body, token.as_deref())?;
        self.send(request)
    }

    /// POST without a bearer token, for the login exchange.
    pub fn login<B: Serialize, R: DeserializeOwned>(&self, path: &str, body: &B) -> Result<R, ApiError> {
        let request = self.client.build_post(path, body, None)?;
        self.send(request)
    }

    fn send<R: DeserializeOwned>(&self, request: HttpRequest) -> Result<R, ApiError> {
        tracing::debug!(
            method = request.method.as_str(),
            path = %request.path,
            authenticated = request.header("authorization").is_some(),
            "sending request"
        );
        let response = self.transport.execute(request)?;
        tracing::debug!(status = response.status, "received response");
        self.client.parse(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{HttpMethod, HttpResponse};
    use crate::mock::MockTransport;
    use crate::token::MemoryTokenStore;
    use crate::types::{Business, LoginRequest, LoginResponse, StatusUpdate};

    fn session(transport: &MockTransport, store: MemoryTokenStore) -> Session<&MockTransport, MemoryTokenStore> {
        Session::new(ApiClient::new("http://backend"), transport, store)
    }

    #[test]
    fn get_attaches_current_token() {
        let transport = MockTransport::new();
        transport.queue_response(HttpResponse::new(200, r#"{"name":"Acme"}"#));
        transport.queue_response(HttpResponse::new(200, r#"{"name":"Acme"}"#));
        let session = session(&transport, MemoryTokenStore::with_token("first"));

        let _: Business = session.get("/business/1").unwrap();
        session.store().set("second").unwrap();
        let _: Business = session.get("/business/1").unwrap();

        let sent = transport.sent_requests();
        assert_eq!(sent[0].header("authorization"), Some("Bearer first"));
        assert_eq!(sent[1].header("authorization"), Some("Bearer second"));
    }

    #[test]
    fn requests_without_token_still_go_out() {
        let transport = MockTransport::new();
        transport.queue_response(HttpResponse::new(200, r#"{"name":"Acme"}"#));
        let session = session(&transport, MemoryTokenStore::new());

        let business: Business = session.get("/business/1").unwrap();
        assert_eq!(business.name, "Acme");
        let sent = transport.last_sent().unwrap();
        assert_eq!(sent.header("authorization"), None);
    }

    #[test]
    fn put_sends_json_with_token() {
        let transport = MockTransport::new();
        transport.queue_response(HttpResponse::new(200, r#"{"status":"completed"}"#));
        let session = session(&transport, MemoryTokenStore::with_token("T"));

        let _: StatusUpdate<String> = session
            .put("/deliveries/1", &StatusUpdate { status: "completed" })
            .unwrap();
        let sent = transport.last_sent().unwrap();
        assert_eq!(sent.method, HttpMethod::Put);
        assert_eq!(sent.header("authorization"), Some("Bearer T"));
        assert_eq!(sent.header("content-type"), Some("application/json"));
    }

    #[test]
    fn login_never_attaches_token() {
        let transport = MockTransport::new();
        transport.queue_response(HttpResponse::new(200, r#"{"token":"new"}"#));
        let session = session(&transport, MemoryTokenStore::with_token("old"));

        let response: LoginResponse = session
            .login(
                "/login",
                &LoginRequest {
                    email: "a@b.com".to_string(),
                    password: "pw".to_string(),
                },
            )
            .unwrap();
        assert_eq!(response.token, "new");
        assert_eq!(transport.last_sent().unwrap().header("authorization"), None);
    }

    #[test]
    fn transport_failure_propagates() {
        let transport = MockTransport::new();
        transport.fail_next("connection refused");
        let session = session(&transport, MemoryTokenStore::new());

        let err = session.get::<Business>("/business/1").unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)));
    }
}
