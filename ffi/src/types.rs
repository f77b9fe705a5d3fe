//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Each type mirrors a core type but uses C-compatible representations:
//! `*mut c_char` instead of `String`, pointer + length instead of `Vec`, and
//! tagged enums with explicit discriminants. Conversion functions live here
//! to keep `lib.rs` focused on the `extern "C"` surface.
//!
//! Nullable string fields are null when the backend omitted the value.

use std::ffi::{c_void, CString};
use std::os::raw::c_char;

use delivery_core::{
    ApiError, Business, Customer, Delivery, HttpMethod, Marker, Package, SenderRef,
};

/// Opaque handle to an `ApiClient`. C callers receive a pointer to this
/// and pass it back into every FFI function.
pub struct FfiDeliveryClient {
    pub(crate) inner: delivery_core::ApiClient,
}

// ---------------------------------------------------------------------------
// Allocation helpers
// ---------------------------------------------------------------------------

/// Hand a Rust string to C. Interior NULs are dropped rather than failing.
pub(crate) fn to_c_string(s: impl Into<String>) -> *mut c_char {
    let s: String = s.into();
    CString::new(s.replace('\0', ""))
        .unwrap_or_default()
        .into_raw()
}

pub(crate) fn to_c_string_opt(s: Option<impl Into<String>>) -> *mut c_char {
    s.map(to_c_string).unwrap_or(std::ptr::null_mut())
}

/// Free a string produced by `to_c_string`. Null is ignored.
///
/// # Safety
/// `s` must be null or come from `to_c_string` and not have been freed.
pub(crate) unsafe fn free_c_string(s: *mut c_char) {
    if !s.is_null() {
        drop(CString::from_raw(s));
    }
}

/// Leak a vector as pointer + length. Empty vectors become null.
pub(crate) fn into_raw_slice<T>(items: Vec<T>) -> (*mut T, u32) {
    if items.is_empty() {
        return (std::ptr::null_mut(), 0);
    }
    let len = items.len() as u32;
    let ptr = Box::into_raw(items.into_boxed_slice()) as *mut T;
    (ptr, len)
}

/// Reclaim a slice produced by `into_raw_slice`.
///
/// # Safety
/// `ptr`/`len` must come from `into_raw_slice` and not have been freed.
pub(crate) unsafe fn from_raw_slice<T>(ptr: *mut T, len: u32) -> Box<[T]> {
    if ptr.is_null() || len == 0 {
        return Box::new([]);
    }
    Box::from_raw(std::ptr::slice_from_raw_parts_mut(ptr, len as usize))
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// HTTP method as a C enum.
#[repr(C)]
#[derive(Debug, PartialEq, Eq)]
pub enum FfiHttpMethod {
    Get = 0,
    Post = 1,
    Put = 2,
}

impl From<HttpMethod> for FfiHttpMethod {
    fn from(m: HttpMethod) -> Self {
        match m {
            HttpMethod::Get => FfiHttpMethod::Get,
            HttpMethod::Post => FfiHttpMethod::Post,
            HttpMethod::Put => FfiHttpMethod::Put,
        }
    }
}

/// A single HTTP header as a key-value pair of C strings.
#[repr(C)]
pub struct FfiHeader {
    pub key: *mut c_char,
    pub value: *mut c_char,
}

/// An HTTP request described as C-compatible plain data.
///
/// Built by `delivery_build_*` functions. The host executes the request
/// and passes the response back through `delivery_parse_*`.
#[repr(C)]
pub struct FfiHttpRequest {
    pub method: FfiHttpMethod,
    pub path: *mut c_char,
    pub headers: *mut FfiHeader,
    pub headers_len: u32,
    pub body: *mut c_char,
}

impl FfiHttpRequest {
    /// Convert a core `HttpRequest` into a heap-allocated `FfiHttpRequest`.
    pub(crate) fn from_core(req: delivery_core::HttpRequest) -> *mut Self {
        let headers: Vec<FfiHeader> = req
            .headers
            .into_iter()
            .map(|(k, v)| FfiHeader {
                key: to_c_string(k),
                value: to_c_string(v),
            })
            .collect();
        let (headers, headers_len) = into_raw_slice(headers);

        Box::into_raw(Box::new(FfiHttpRequest {
            method: req.method.into(),
            path: to_c_string(req.path),
            headers,
            headers_len,
            body: to_c_string_opt(req.body),
        }))
    }
}

// ---------------------------------------------------------------------------
// Response input (caller-provided, not heap-allocated by us)
// ---------------------------------------------------------------------------

/// An HTTP response described as C-compatible plain data.
///
/// The host constructs this on the stack after executing a request, then
/// passes a pointer to a `delivery_parse_*` function. The FFI layer reads
/// but does not free these fields.
#[repr(C)]
pub struct FfiHttpResponse {
    pub status: u16,
    pub body: *const c_char,
}

// ---------------------------------------------------------------------------
// Payload types
// ---------------------------------------------------------------------------

/// Error codes returned in `FfiDeliveryResult`.
#[repr(C)]
#[derive(Debug, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    NotFound = 1,
    Http = 2,
    Transport = 3,
    Deserialization = 4,
    Serialization = 5,
    TokenStore = 6,
    Panic = 7,
    NullArg = 8,
}

/// Tag that tells `delivery_free_result` what `FfiDeliveryResult::data` points to.
#[repr(C)]
#[derive(Debug, PartialEq, Eq)]
pub enum FfiDataTag {
    None = 0,
    Token = 1,
    MarkerList = 2,
    Delivery = 3,
    PackageList = 4,
    Package = 5,
    Contact = 6,
}

/// A map marker.
#[repr(C)]
pub struct FfiMarker {
    pub id: u64,
    pub latitude: f64,
    pub longitude: f64,
    pub title: *mut c_char,
    pub description: *mut c_char,
}

#[repr(C)]
pub struct FfiMarkerList {
    pub items: *mut FfiMarker,
    pub len: u32,
}

#[repr(C)]
pub struct FfiPackage {
    pub id: u64,
    pub size: *mut c_char,
    pub status: *mut c_char,
    pub delivered: bool,
}

#[repr(C)]
pub struct FfiPackageList {
    pub items: *mut FfiPackage,
    pub len: u32,
}

/// Which lookup resolves a delivery's sender.
#[repr(C)]
#[derive(Debug, PartialEq, Eq)]
pub enum FfiSenderKind {
    None = 0,
    /// `sender_id` names a `/business/{id}` record.
    Business = 1,
    /// `sender_id` names a `/customer/{id}` record.
    Customer = 2,
}

/// A delivery. `address` and `status` may be null; `recipient_id` is only
/// meaningful when `has_recipient` is true, and `latitude`/`longitude` only
/// when `has_coordinates` is true.
#[repr(C)]
pub struct FfiDelivery {
    pub id: u64,
    pub sender_kind: FfiSenderKind,
    pub sender_id: u64,
    pub has_recipient: bool,
    pub recipient_id: u64,
    pub has_coordinates: bool,
    pub latitude: f64,
    pub longitude: f64,
    pub address: *mut c_char,
    pub status: *mut c_char,
    pub completed: bool,
    pub number_of_packages: u32,
    pub packages: FfiPackageList,
}

/// A business or customer, flattened for display. Businesses only have a
/// name; `phone_number` and `address` are null for them.
#[repr(C)]
pub struct FfiContact {
    pub name: *mut c_char,
    pub phone_number: *mut c_char,
    pub address: *mut c_char,
}

impl FfiMarker {
    fn from_core(marker: Marker) -> Self {
        FfiMarker {
            id: marker.id,
            latitude: marker.latlng.latitude,
            longitude: marker.latlng.longitude,
            title: to_c_string(marker.title),
            description: to_c_string(marker.description),
        }
    }

    /// # Safety
    /// Fields must come from `from_core` and not have been freed.
    pub(crate) unsafe fn free_fields(&self) {
        free_c_string(self.title);
        free_c_string(self.description);
    }
}

impl FfiPackage {
    pub(crate) fn from_core(package: Package) -> Self {
        FfiPackage {
            id: package.id,
            size: to_c_string(package.size),
            delivered: package.status.is_delivered(),
            status: to_c_string(package.status),
        }
    }

    /// # Safety
    /// Fields must come from `from_core` and not have been freed.
    pub(crate) unsafe fn free_fields(&self) {
        free_c_string(self.size);
        free_c_string(self.status);
    }
}

impl FfiPackageList {
    pub(crate) fn from_core(packages: Vec<Package>) -> Self {
        let items: Vec<FfiPackage> = packages.into_iter().map(FfiPackage::from_core).collect();
        let (items, len) = into_raw_slice(items);
        FfiPackageList { items, len }
    }

    /// # Safety
    /// Must come from `from_core` and not have been freed.
    pub(crate) unsafe fn free_items(&self) {
        for item in from_raw_slice(self.items, self.len).iter() {
            item.free_fields();
        }
    }
}

impl FfiDelivery {
    fn from_core(delivery: Delivery) -> Self {
        let (sender_kind, sender_id) = match delivery.sender {
            Some(SenderRef::Business(id)) => (FfiSenderKind::Business, id),
            Some(SenderRef::Customer(id)) => (FfiSenderKind::Customer, id),
            None => (FfiSenderKind::None, 0),
        };
        let coordinates = delivery.coordinates();
        FfiDelivery {
            id: delivery.id,
            sender_kind,
            sender_id,
            has_recipient: delivery.recipient_id.is_some(),
            recipient_id: delivery.recipient_id.unwrap_or(0),
            has_coordinates: coordinates.is_some(),
            latitude: coordinates.map_or(0.0, |c| c.latitude),
            longitude: coordinates.map_or(0.0, |c| c.longitude),
            completed: delivery.is_completed(),
            address: to_c_string_opt(delivery.address),
            status: to_c_string_opt(delivery.status),
            number_of_packages: delivery.number_of_packages.unwrap_or(0),
            packages: FfiPackageList::from_core(delivery.packages),
        }
    }

    /// # Safety
    /// Fields must come from `from_core` and not have been freed.
    pub(crate) unsafe fn free_fields(&self) {
        free_c_string(self.address);
        free_c_string(self.status);
        self.packages.free_items();
    }
}

impl FfiContact {
    /// # Safety
    /// Fields must come from this module and not have been freed.
    pub(crate) unsafe fn free_fields(&self) {
        free_c_string(self.name);
        free_c_string(self.phone_number);
        free_c_string(self.address);
    }
}

// ---------------------------------------------------------------------------
// Result envelope
// ---------------------------------------------------------------------------

/// Result envelope for all parse operations.
///
/// On success `error_code` is `Ok`, `error_message` is null, and `data`
/// points to the parsed payload (tagged by `data_tag`).
/// On failure `error_code` describes the category, `error_message` is a
/// human-readable C string, and `data` is null.
#[repr(C)]
pub struct FfiDeliveryResult {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub http_status: u16,
    pub data_tag: FfiDataTag,
    pub data: *mut c_void,
}

impl FfiDeliveryResult {
    fn ok(data_tag: FfiDataTag, data: *mut c_void) -> *mut Self {
        Box::into_raw(Box::new(FfiDeliveryResult {
            error_code: FfiErrorCode::Ok,
            error_message: std::ptr::null_mut(),
            http_status: 0,
            data_tag,
            data,
        }))
    }

    fn err(error_code: FfiErrorCode, http_status: u16, msg: &str) -> *mut Self {
        Box::into_raw(Box::new(FfiDeliveryResult {
            error_code,
            error_message: to_c_string(msg),
            http_status,
            data_tag: FfiDataTag::None,
            data: std::ptr::null_mut(),
        }))
    }

    /// Success carrying the session token from `/login`.
    pub(crate) fn ok_token(token: String) -> *mut Self {
        Self::ok(FfiDataTag::Token, to_c_string(token) as *mut c_void)
    }

    /// Success carrying map markers for every delivery that has coordinates.
    pub(crate) fn ok_markers(deliveries: Vec<Delivery>) -> *mut Self {
        let markers: Vec<FfiMarker> = deliveries
            .iter()
            .filter_map(Marker::from_delivery)
            .map(FfiMarker::from_core)
            .collect();
        let (items, len) = into_raw_slice(markers);
        let list = Box::new(FfiMarkerList { items, len });
        Self::ok(FfiDataTag::MarkerList, Box::into_raw(list) as *mut c_void)
    }

    pub(crate) fn ok_delivery(delivery: Delivery) -> *mut Self {
        let delivery = Box::new(FfiDelivery::from_core(delivery));
        Self::ok(FfiDataTag::Delivery, Box::into_raw(delivery) as *mut c_void)
    }

    pub(crate) fn ok_packages(packages: Vec<Package>) -> *mut Self {
        let list = Box::new(FfiPackageList::from_core(packages));
        Self::ok(FfiDataTag::PackageList, Box::into_raw(list) as *mut c_void)
    }

    pub(crate) fn ok_package(package: Package) -> *mut Self {
        let package = Box::new(FfiPackage::from_core(package));
        Self::ok(FfiDataTag::Package, Box::into_raw(package) as *mut c_void)
    }

    pub(crate) fn ok_business(business: Business) -> *mut Self {
        let contact = Box::new(FfiContact {
            name: to_c_string(business.name),
            phone_number: std::ptr::null_mut(),
            address: std::ptr::null_mut(),
        });
        Self::ok(FfiDataTag::Contact, Box::into_raw(contact) as *mut c_void)
    }

    pub(crate) fn ok_customer(customer: Customer) -> *mut Self {
        let contact = Box::new(FfiContact {
            name: to_c_string(customer.full_name()),
            phone_number: to_c_string_opt(customer.phone_number),
            address: to_c_string_opt(customer.address),
        });
        Self::ok(FfiDataTag::Contact, Box::into_raw(contact) as *mut c_void)
    }

    /// Build an error result from an `ApiError`.
    pub(crate) fn from_error(err: ApiError) -> *mut Self {
        let code = match &err {
            ApiError::NotFound => FfiErrorCode::NotFound,
            ApiError::HttpError { .. } => FfiErrorCode::Http,
            ApiError::Transport(_) => FfiErrorCode::Transport,
            ApiError::DeserializationError(_) => FfiErrorCode::Deserialization,
            ApiError::SerializationError(_) => FfiErrorCode::Serialization,
            ApiError::TokenStore(_) => FfiErrorCode::TokenStore,
        };
        Self::err(code, err.status().unwrap_or(0), &err.to_string())
    }

    /// Build an error result for a null argument.
    pub(crate) fn null_arg(name: &str) -> *mut Self {
        Self::err(FfiErrorCode::NullArg, 0, &format!("null argument: {name}"))
    }

    /// Build an error result for a caught panic.
    pub(crate) fn panic(msg: &str) -> *mut Self {
        Self::err(FfiErrorCode::Panic, 0, msg)
    }
}
