//! Verify build/parse methods against JSON test vectors stored in `test-vectors/`.
//!
//! Each vector file describes inputs, expected requests, simulated responses,
//! and expected parse results. Comparing parsed JSON (not raw strings) avoids
//! false negatives from field-ordering differences.

use delivery_core::{
    ApiClient, ApiError, Delivery, HttpMethod, HttpRequest, HttpResponse, LoginRequest, Package,
    PackageStatus,
};

const BASE_URL: &str = "http://localhost:8000";
const TOKEN: &str = "T";

fn client() -> ApiClient {
    ApiClient::new(BASE_URL)
}

/// Parse the method string from test vectors into `HttpMethod`.
fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        "PUT" => HttpMethod::Put,
        other => panic!("unknown method: {other}"),
    }
}

fn simulated_response(case: &serde_json::Value) -> HttpResponse {
    let sim = &case["simulated_response"];
    HttpResponse::new(
        sim["status"].as_u64().unwrap() as u16,
        sim["body"].as_str().unwrap(),
    )
}

/// Check method, path, and (when the vector has one) the JSON body.
fn assert_request(name: &str, req: &HttpRequest, expected: &serde_json::Value) {
    assert_eq!(req.method, parse_method(expected["method"].as_str().unwrap()), "{name}: method");
    assert_eq!(req.path, format!("{BASE_URL}{}", expected["path"].as_str().unwrap()), "{name}: path");
    match expected.get("body") {
        Some(body) => {
            let req_body: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
            assert_eq!(&req_body, body, "{name}: body");
        }
        None => assert!(req.body.is_none(), "{name}: body should be None"),
    }
}

fn assert_error(name: &str, err: ApiError, expected: &str) {
    match expected {
        "NotFound" => assert!(matches!(err, ApiError::NotFound), "{name}: expected NotFound, got {err:?}"),
        "Deserialization" => assert!(
            matches!(err, ApiError::DeserializationError(_)),
            "{name}: expected DeserializationError, got {err:?}"
        ),
        http if http.starts_with("Http") => {
            let status: u16 = http["Http".len()..].parse().unwrap();
            assert!(
                matches!(err, ApiError::HttpError { status: s, .. } if s == status),
                "{name}: expected HTTP {status}, got {err:?}"
            );
        }
        other => panic!("{name}: unknown expected_error: {other}"),
    }
}

// ---------------------------------------------------------------------------
// Login
// ---------------------------------------------------------------------------

#[test]
fn login_test_vectors() {
    let raw = include_str!("../../test-vectors/login.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    let c = client();
    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let input: LoginRequest = serde_json::from_value(case["input"].clone()).unwrap();
        let expected_req = &case["expected_request"];

        // Verify build
        let req = c.build_login(&input).unwrap();
        assert_request(name, &req, expected_req);

        let expected_headers: Vec<(String, String)> = expected_req["headers"]
            .as_array()
            .unwrap()
            .iter()
            .map(|h| {
                let arr = h.as_array().unwrap();
                (arr[0].as_str().unwrap().to_string(), arr[1].as_str().unwrap().to_string())
            })
            .collect();
        assert_eq!(req.headers, expected_headers, "{name}: headers");

        // Verify parse
        let result = c.parse_login(simulated_response(case));
        match case.get("expected_error") {
            Some(expected) => assert_error(name, result.err().unwrap(), expected.as_str().unwrap()),
            None => {
                let response = result.unwrap();
                assert_eq!(response.token, case["expected_result"]["token"], "{name}: token");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Deliveries
// ---------------------------------------------------------------------------

#[test]
fn list_deliveries_test_vectors() {
    let raw = include_str!("../../test-vectors/deliveries.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    let c = client();
    for case in vectors["list"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();

        let req = c.build_list_deliveries(Some(TOKEN));
        assert_eq!(req.path, format!("{BASE_URL}/deliveries"), "{name}: path");
        assert_eq!(req.header("authorization"), Some("Bearer T"), "{name}: auth");

        let result = c.parse_list_deliveries(simulated_response(case));
        match case.get("expected_error") {
            Some(expected) => assert_error(name, result.unwrap_err(), expected.as_str().unwrap()),
            None => {
                let expected: Vec<Delivery> =
                    serde_json::from_value(case["expected_result"].clone()).unwrap();
                assert_eq!(result.unwrap(), expected, "{name}: parsed result");
            }
        }
    }
}

#[test]
fn get_delivery_test_vectors() {
    let raw = include_str!("../../test-vectors/deliveries.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    let c = client();
    for case in vectors["get"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let id = case["input_id"].as_u64().unwrap();

        let req = c.build_get_delivery(id, Some(TOKEN));
        assert_request(name, &req, &case["expected_request"]);

        let result = c.parse_get_delivery(simulated_response(case));
        match case.get("expected_error") {
            Some(expected) => assert_error(name, result.unwrap_err(), expected.as_str().unwrap()),
            None => {
                let expected: Delivery = serde_json::from_value(case["expected_result"].clone()).unwrap();
                assert_eq!(result.unwrap(), expected, "{name}: parsed result");
            }
        }
    }
}

#[test]
fn complete_delivery_test_vectors() {
    let raw = include_str!("../../test-vectors/deliveries.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    let c = client();
    for case in vectors["complete"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let id = case["input_id"].as_u64().unwrap();

        let req = c.build_complete_delivery(id, Some(TOKEN)).unwrap();
        assert_request(name, &req, &case["expected_request"]);

        let delivery = c.parse_complete_delivery(simulated_response(case)).unwrap();
        let expected: Delivery = serde_json::from_value(case["expected_result"].clone()).unwrap();
        assert_eq!(delivery, expected, "{name}: parsed result");
        assert!(delivery.is_completed(), "{name}: completed");
    }
}

// ---------------------------------------------------------------------------
// Packages
// ---------------------------------------------------------------------------

#[test]
fn list_packages_test_vectors() {
    let raw = include_str!("../../test-vectors/packages.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    let c = client();
    for case in vectors["list"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let delivery_id = case["input_delivery_id"].as_u64().unwrap();

        let req = c.build_get_packages(delivery_id, Some(TOKEN));
        assert_request(name, &req, &case["expected_request"]);

        let packages = c.parse_get_packages(simulated_response(case)).unwrap();
        let expected: Vec<Package> = serde_json::from_value(case["expected_result"].clone()).unwrap();
        assert_eq!(packages, expected, "{name}: parsed result");
    }
}

#[test]
fn set_package_status_test_vectors() {
    let raw = include_str!("../../test-vectors/packages.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    let c = client();
    for case in vectors["set_status"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let delivery_id = case["input_delivery_id"].as_u64().unwrap();
        let package_id = case["input_package_id"].as_u64().unwrap();
        let status = PackageStatus::from(case["input_status"].as_str().unwrap().to_string());

        let req = c
            .build_set_package_status(delivery_id, package_id, &status, Some(TOKEN))
            .unwrap();
        assert_request(name, &req, &case["expected_request"]);
        assert_eq!(req.header("authorization"), Some("Bearer T"), "{name}: auth");

        let result = c.parse_set_package_status(simulated_response(case));
        match case.get("expected_error") {
            Some(expected) => assert_error(name, result.unwrap_err(), expected.as_str().unwrap()),
            None => {
                let expected: Package = serde_json::from_value(case["expected_result"].clone()).unwrap();
                assert_eq!(result.unwrap(), expected, "{name}: parsed result");
            }
        }
    }
}
