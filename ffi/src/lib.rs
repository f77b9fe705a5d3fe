//! C-ABI wrapper around `delivery-core`.
//!
//! # Overview
//! Exposes the delivery API through `extern "C"` functions so the native
//! mobile shell can build requests, run them on its own HTTP stack, and
//! parse the responses without linking to Rust's HTTP client.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - The host owns the session token (keychain/keystore) and passes it to
//!   each `delivery_build_*` call; null means "send unauthenticated".
//!   `delivery_build_login` never attaches one.
//! - A single `FfiDeliveryResult` envelope with `FfiDataTag` + `void* data`
//!   conveys success payloads and errors uniformly.
//! - The caller owns all returned pointers and must call the matching
//!   `delivery_free_*` function to release them.

pub mod types;

use std::ffi::CStr;
use std::os::raw::c_char;
use std::panic::catch_unwind;

use delivery_core::{ApiClient, HttpResponse, LoginRequest, Package, PackageStatus};

use types::*;

/// Borrow a C string as `&str`. Null or invalid UTF-8 yields `None`.
///
/// # Safety
/// `s` must be null or a valid NUL-terminated string that outlives the borrow.
unsafe fn opt_str<'a>(s: *const c_char) -> Option<&'a str> {
    if s.is_null() {
        return None;
    }
    CStr::from_ptr(s).to_str().ok()
}

// ---------------------------------------------------------------------------
// Client lifecycle
// ---------------------------------------------------------------------------

/// Create a new client bound to `base_url`.
///
/// Returns null if `base_url` is null or not UTF-8, or if an internal panic
/// occurs. The caller must free the returned pointer with
/// `delivery_client_free`.
#[unsafe(no_mangle)]
pub extern "C" fn delivery_client_new(base_url: *const c_char) -> *mut FfiDeliveryClient {
    catch_unwind(|| match unsafe { opt_str(base_url) } {
        Some(url) => Box::into_raw(Box::new(FfiDeliveryClient {
            inner: ApiClient::new(url),
        })),
        None => std::ptr::null_mut(),
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a client created by `delivery_client_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn delivery_client_free(client: *mut FfiDeliveryClient) {
    if !client.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(client) });
        });
    }
}

// ---------------------------------------------------------------------------
// Build request functions
// ---------------------------------------------------------------------------

/// Run `build` against the client with the optional token, or return null
/// if `client` is null.
fn build_with<F>(client: *const FfiDeliveryClient, token: *const c_char, build: F) -> *mut FfiHttpRequest
where
    F: FnOnce(&ApiClient, Option<&str>) -> Option<delivery_core::HttpRequest> + std::panic::UnwindSafe,
{
    catch_unwind(|| {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        let token = unsafe { opt_str(token) };
        match build(&client.inner, token) {
            Some(req) => FfiHttpRequest::from_core(req),
            None => std::ptr::null_mut(),
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Build the `/login` request. Never carries a token.
///
/// Returns null if any argument is null.
#[unsafe(no_mangle)]
pub extern "C" fn delivery_build_login(
    client: *const FfiDeliveryClient,
    email: *const c_char,
    password: *const c_char,
) -> *mut FfiHttpRequest {
    build_with(client, std::ptr::null(), |c, _| {
        let credentials = LoginRequest {
            email: unsafe { opt_str(email) }?.to_string(),
            password: unsafe { opt_str(password) }?.to_string(),
        };
        c.build_login(&credentials).ok()
    })
}

/// Build the request listing all deliveries. `token` may be null.
#[unsafe(no_mangle)]
pub extern "C" fn delivery_build_list_deliveries(
    client: *const FfiDeliveryClient,
    token: *const c_char,
) -> *mut FfiHttpRequest {
    build_with(client, token, |c, token| Some(c.build_list_deliveries(token)))
}

/// Build the request fetching one delivery. `token` may be null.
#[unsafe(no_mangle)]
pub extern "C" fn delivery_build_get_delivery(
    client: *const FfiDeliveryClient,
    delivery_id: u64,
    token: *const c_char,
) -> *mut FfiHttpRequest {
    build_with(client, token, |c, token| Some(c.build_get_delivery(delivery_id, token)))
}

/// Build the request fetching a delivery's packages. `token` may be null.
#[unsafe(no_mangle)]
pub extern "C" fn delivery_build_get_packages(
    client: *const FfiDeliveryClient,
    delivery_id: u64,
    token: *const c_char,
) -> *mut FfiHttpRequest {
    build_with(client, token, |c, token| Some(c.build_get_packages(delivery_id, token)))
}

/// Build the PUT that sets a package's status (`"delivered"` or
/// `"incomplete"`). Returns null if `status` is null.
#[unsafe(no_mangle)]
pub extern "C" fn delivery_build_set_package_status(
    client: *const FfiDeliveryClient,
    delivery_id: u64,
    package_id: u64,
    status: *const c_char,
    token: *const c_char,
) -> *mut FfiHttpRequest {
    build_with(client, token, |c, token| {
        let status = PackageStatus::from(unsafe { opt_str(status) }?.to_string());
        c.build_set_package_status(delivery_id, package_id, &status, token).ok()
    })
}

/// Build the PUT that marks a delivery completed.
#[unsafe(no_mangle)]
pub extern "C" fn delivery_build_complete_delivery(
    client: *const FfiDeliveryClient,
    delivery_id: u64,
    token: *const c_char,
) -> *mut FfiHttpRequest {
    build_with(client, token, |c, token| c.build_complete_delivery(delivery_id, token).ok())
}

/// Build the request fetching a business sender.
#[unsafe(no_mangle)]
pub extern "C" fn delivery_build_get_business(
    client: *const FfiDeliveryClient,
    business_id: u64,
    token: *const c_char,
) -> *mut FfiHttpRequest {
    build_with(client, token, |c, token| Some(c.build_get_business(business_id, token)))
}

/// Build the request fetching a customer (sender or recipient).
#[unsafe(no_mangle)]
pub extern "C" fn delivery_build_get_customer(
    client: *const FfiDeliveryClient,
    customer_id: u64,
    token: *const c_char,
) -> *mut FfiHttpRequest {
    build_with(client, token, |c, token| Some(c.build_get_customer(customer_id, token)))
}

// ---------------------------------------------------------------------------
// Parse response functions
// ---------------------------------------------------------------------------

/// Convert an `FfiHttpResponse` to a core `HttpResponse`. A null body is
/// treated as empty.
fn ffi_response_to_core(resp: &FfiHttpResponse) -> HttpResponse {
    let body = unsafe { opt_str(resp.body) }.unwrap_or("");
    HttpResponse::new(resp.status, body)
}

/// Validate arguments, convert the response, and run `parse`.
fn parse_with<F>(
    name: &str,
    client: *const FfiDeliveryClient,
    response: *const FfiHttpResponse,
    parse: F,
) -> *mut FfiDeliveryResult
where
    F: FnOnce(&ApiClient, HttpResponse) -> *mut FfiDeliveryResult + std::panic::UnwindSafe,
{
    catch_unwind(|| {
        if client.is_null() {
            return FfiDeliveryResult::null_arg("client");
        }
        if response.is_null() {
            return FfiDeliveryResult::null_arg("response");
        }
        let client = unsafe { &*client };
        let resp = unsafe { &*response };
        parse(&client.inner, ffi_response_to_core(resp))
    })
    .unwrap_or_else(|_| FfiDeliveryResult::panic(&format!("panic in {name}")))
}

/// Parse a `/login` response. `data_tag = Token`, `data` is a `char*`.
#[unsafe(no_mangle)]
pub extern "C" fn delivery_parse_login(
    client: *const FfiDeliveryClient,
    response: *const FfiHttpResponse,
) -> *mut FfiDeliveryResult {
    parse_with("delivery_parse_login", client, response, |c, resp| {
        match c.parse_login(resp) {
            Ok(login) => FfiDeliveryResult::ok_token(login.token),
            Err(e) => FfiDeliveryResult::from_error(e),
        }
    })
}

/// Parse a delivery list into map markers. `data_tag = MarkerList`.
/// Deliveries without coordinates are left out.
#[unsafe(no_mangle)]
pub extern "C" fn delivery_parse_list_deliveries(
    client: *const FfiDeliveryClient,
    response: *const FfiHttpResponse,
) -> *mut FfiDeliveryResult {
    parse_with("delivery_parse_list_deliveries", client, response, |c, resp| {
        match c.parse_list_deliveries(resp) {
            Ok(deliveries) => FfiDeliveryResult::ok_markers(deliveries),
            Err(e) => FfiDeliveryResult::from_error(e),
        }
    })
}

/// Parse a single delivery. `data_tag = Delivery`.
#[unsafe(no_mangle)]
pub extern "C" fn delivery_parse_get_delivery(
    client: *const FfiDeliveryClient,
    response: *const FfiHttpResponse,
) -> *mut FfiDeliveryResult {
    parse_with("delivery_parse_get_delivery", client, response, |c, resp| {
        match c.parse_get_delivery(resp) {
            Ok(delivery) => FfiDeliveryResult::ok_delivery(delivery),
            Err(e) => FfiDeliveryResult::from_error(e),
        }
    })
}

/// Parse the response to a completion PUT. `data_tag = Delivery`.
#[unsafe(no_mangle)]
pub extern "C" fn delivery_parse_complete_delivery(
    client: *const FfiDeliveryClient,
    response: *const FfiHttpResponse,
) -> *mut FfiDeliveryResult {
    parse_with("delivery_parse_complete_delivery", client, response, |c, resp| {
        match c.parse_complete_delivery(resp) {
            Ok(delivery) => FfiDeliveryResult::ok_delivery(delivery),
            Err(e) => FfiDeliveryResult::from_error(e),
        }
    })
}

/// Parse a package list. `data_tag = PackageList`.
#[unsafe(no_mangle)]
pub extern "C" fn delivery_parse_get_packages(
    client: *const FfiDeliveryClient,
    response: *const FfiHttpResponse,
) -> *mut FfiDeliveryResult {
    parse_with("delivery_parse_get_packages", client, response, |c, resp| {
        match c.parse_get_packages(resp) {
            Ok(packages) => FfiDeliveryResult::ok_packages(packages),
            Err(e) => FfiDeliveryResult::from_error(e),
        }
    })
}

/// Parse the package the server accepted after a status PUT.
/// `data_tag = Package`.
#[unsafe(no_mangle)]
pub extern "C" fn delivery_parse_set_package_status(
    client: *const FfiDeliveryClient,
    response: *const FfiHttpResponse,
) -> *mut FfiDeliveryResult {
    parse_with("delivery_parse_set_package_status", client, response, |c, resp| {
        match c.parse_set_package_status(resp) {
            Ok(package) => FfiDeliveryResult::ok_package(package),
            Err(e) => FfiDeliveryResult::from_error(e),
        }
    })
}

/// Parse a business record. `data_tag = Contact`.
#[unsafe(no_mangle)]
pub extern "C" fn delivery_parse_get_business(
    client: *const FfiDeliveryClient,
    response: *const FfiHttpResponse,
) -> *mut FfiDeliveryResult {
    parse_with("delivery_parse_get_business", client, response, |c, resp| {
        match c.parse_get_business(resp) {
            Ok(business) => FfiDeliveryResult::ok_business(business),
            Err(e) => FfiDeliveryResult::from_error(e),
        }
    })
}

/// Parse a customer record. `data_tag = Contact`.
#[unsafe(no_mangle)]
pub extern "C" fn delivery_parse_get_customer(
    client: *const FfiDeliveryClient,
    response: *const FfiHttpResponse,
) -> *mut FfiDeliveryResult {
    parse_with("delivery_parse_get_customer", client, response, |c, resp| {
        match c.parse_get_customer(resp) {
            Ok(customer) => FfiDeliveryResult::ok_customer(customer),
            Err(e) => FfiDeliveryResult::from_error(e),
        }
    })
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// True when the list is non-empty and every package is delivered. The
/// package screen uses this to gate the completion control.
#[unsafe(no_mangle)]
pub extern "C" fn delivery_all_delivered(list: *const FfiPackageList) -> bool {
    catch_unwind(|| {
        if list.is_null() {
            return false;
        }
        let list = unsafe { &*list };
        if list.items.is_null() || list.len == 0 {
            return false;
        }
        let items = unsafe { std::slice::from_raw_parts(list.items, list.len as usize) };
        let packages: Vec<Package> = items
            .iter()
            .map(|p| Package {
                id: p.id,
                size: String::new(),
                status: if p.delivered {
                    PackageStatus::Delivered
                } else {
                    PackageStatus::Incomplete
                },
            })
            .collect();
        delivery_core::all_delivered(&packages)
    })
    .unwrap_or(false)
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free an `FfiHttpRequest` returned by any `delivery_build_*` function.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn delivery_free_request(req: *mut FfiHttpRequest) {
    if req.is_null() {
        return;
    }
    let _ = catch_unwind(|| unsafe {
        let req = Box::from_raw(req);
        free_c_string(req.path);
        free_c_string(req.body);
        for h in from_raw_slice(req.headers, req.headers_len).iter() {
            free_c_string(h.key);
            free_c_string(h.value);
        }
    });
}

/// Free an `FfiDeliveryResult` returned by any `delivery_parse_*` function.
/// Safe to call with null. Uses `data_tag` to determine what `data` points to.
#[unsafe(no_mangle)]
pub extern "C" fn delivery_free_result(result: *mut FfiDeliveryResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(|| unsafe {
        let result = Box::from_raw(result);
        free_c_string(result.error_message);
        if result.data.is_null() {
            return;
        }
        match result.data_tag {
            FfiDataTag::Token => free_c_string(result.data as *mut c_char),
            FfiDataTag::MarkerList => {
                let list = Box::from_raw(result.data as *mut FfiMarkerList);
                for marker in from_raw_slice(list.items, list.len).iter() {
                    marker.free_fields();
                }
            }
            FfiDataTag::Delivery => {
                let delivery = Box::from_raw(result.data as *mut FfiDelivery);
                delivery.free_fields();
            }
            FfiDataTag::PackageList => {
                let list = Box::from_raw(result.data as *mut FfiPackageList);
                list.free_items();
            }
            FfiDataTag::Package => {
                let package = Box::from_raw(result.data as *mut FfiPackage);
                package.free_fields();
            }
            FfiDataTag::Contact => {
                let contact = Box::from_raw(result.data as *mut FfiContact);
                contact.free_fields();
            }
            FfiDataTag::None => {}
        }
    });
}

/// Free a C string allocated by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn delivery_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = catch_unwind(|| unsafe { free_c_string(s) });
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
