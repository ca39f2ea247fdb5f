//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Each type mirrors a core type with C-compatible representations:
//! `*mut c_char` instead of `String`, raw pointer + length instead of `Vec`,
//! and enums with explicit discriminants. Conversions live here so `lib.rs`
//! stays focused on the `extern "C"` surface.

use std::ffi::{c_void, CString};
use std::os::raw::c_char;

use lbs_core::{ApiError, HttpMethod, HttpRequest};

/// Opaque handle to an `LbsClient`. C callers receive a pointer to this and
/// pass it back into every FFI function.
pub struct FfiLbsClient {
    pub(crate) inner: lbs_core::LbsClient,
}

/// Move a Rust string onto the C heap. Null if it holds an interior NUL.
pub(crate) fn c_string(s: String) -> *mut c_char {
    CString::new(s)
        .map(CString::into_raw)
        .unwrap_or(std::ptr::null_mut())
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// HTTP method as a C enum.
#[repr(C)]
pub enum FfiHttpMethod {
    Get = 0,
}

impl From<HttpMethod> for FfiHttpMethod {
    fn from(m: HttpMethod) -> Self {
        match m {
            HttpMethod::Get => FfiHttpMethod::Get,
        }
    }
}

/// One query parameter, unencoded.
#[repr(C)]
pub struct FfiQueryParam {
    pub key: *mut c_char,
    pub value: *mut c_char,
}

/// An HTTP request described as C-compatible plain data.
///
/// `url` is ready to send (endpoint plus encoded query). `path` and `query`
/// are the same request in pieces, for hosts that build URLs themselves.
#[repr(C)]
pub struct FfiHttpRequest {
    pub method: FfiHttpMethod,
    pub url: *mut c_char,
    pub path: *mut c_char,
    pub query: *mut FfiQueryParam,
    pub query_len: u32,
}

impl FfiHttpRequest {
    /// Convert a core `HttpRequest` into a heap-allocated `FfiHttpRequest`.
    pub(crate) fn from_core(req: HttpRequest) -> *mut Self {
        let url = c_string(req.url());
        let path = c_string(req.path);

        let query_len = req.query.len() as u32;
        let query = if req.query.is_empty() {
            std::ptr::null_mut()
        } else {
            let params: Box<[FfiQueryParam]> = req
                .query
                .into_iter()
                .map(|(k, v)| FfiQueryParam {
                    key: c_string(k),
                    value: c_string(v),
                })
                .collect();
            Box::into_raw(params) as *mut FfiQueryParam
        };

        Box::into_raw(Box::new(FfiHttpRequest {
            method: req.method.into(),
            url,
            path,
            query,
            query_len,
        }))
    }
}

// ---------------------------------------------------------------------------
// Response input (caller-provided, not heap-allocated by us)
// ---------------------------------------------------------------------------

/// An HTTP response described as C-compatible plain data.
///
/// The C caller builds this after executing a request and passes a pointer
/// to `lbs_parse_*`. The FFI layer reads but never frees these fields.
#[repr(C)]
pub struct FfiHttpResponse {
    pub status: u16,
    pub body: *const c_char,
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Error codes returned in `FfiLbsResult`.
#[repr(C)]
#[derive(Debug, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    MissingToken = 1,
    Config = 2,
    Transport = 3,
    Http = 4,
    Deserialization = 5,
    NoData = 6,
    StatusNotOk = 7,
    MissingTransformResult = 8,
    Panic = 9,
    NullArg = 10,
    StatusNotInteger = 11,
}

/// Tag that tells `lbs_free_result` what `FfiLbsResult::data` points to.
#[repr(C)]
#[derive(Debug, PartialEq, Eq)]
pub enum FfiDataTag {
    None = 0,
    /// `data` is a NUL-terminated JSON document (`char*`).
    Json = 1,
    /// `data` is an `FfiPoint`.
    Point = 2,
}

/// A converted coordinate pair.
#[repr(C)]
pub struct FfiPoint {
    pub x: f64,
    pub y: f64,
}

/// Result envelope for all parse operations.
///
/// On success `error_code` is `Ok`, `error_message` is null, and `data`
/// points to the payload described by `data_tag`. On failure `data` is null
/// and `error_message` is a human-readable C string. `vendor_status` is only
/// meaningful for `StatusNotOk`, `-1` when the status field was absent or
/// not an integer.
#[repr(C)]
pub struct FfiLbsResult {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub http_status: u16,
    pub vendor_status: i64,
    pub data_tag: FfiDataTag,
    pub data: *mut c_void,
}

impl FfiLbsResult {
    fn boxed(error_code: FfiErrorCode, error_message: *mut c_char, data_tag: FfiDataTag, data: *mut c_void) -> *mut Self {
        Box::into_raw(Box::new(FfiLbsResult {
            error_code,
            error_message,
            http_status: 0,
            vendor_status: 0,
            data_tag,
            data,
        }))
    }

    /// Success carrying the response body re-serialized as JSON text.
    pub(crate) fn ok_json(value: &serde_json::Value) -> *mut Self {
        let text = c_string(value.to_string());
        Self::boxed(FfiErrorCode::Ok, std::ptr::null_mut(), FfiDataTag::Json, text as *mut c_void)
    }

    /// Success carrying a converted point.
    pub(crate) fn ok_point(x: f64, y: f64) -> *mut Self {
        let point = Box::into_raw(Box::new(FfiPoint { x, y }));
        Self::boxed(FfiErrorCode::Ok, std::ptr::null_mut(), FfiDataTag::Point, point as *mut c_void)
    }

    pub(crate) fn from_error(err: ApiError) -> *mut Self {
        let message = c_string(err.to_string());
        let (code, http_status, vendor_status) = match err {
            ApiError::MissingToken => (FfiErrorCode::MissingToken, 0, 0),
            ApiError::Config(_) => (FfiErrorCode::Config, 0, 0),
            ApiError::Transport(_) => (FfiErrorCode::Transport, 0, 0),
            ApiError::Http { status, .. } => (FfiErrorCode::Http, status, 0),
            ApiError::Deserialization(_) => (FfiErrorCode::Deserialization, 0, 0),
            ApiError::NoData => (FfiErrorCode::NoData, 0, 0),
            ApiError::StatusNotOk { status } => (FfiErrorCode::StatusNotOk, 0, status.unwrap_or(-1)),
            ApiError::StatusNotInteger(_) => (FfiErrorCode::StatusNotInteger, 0, -1),
            ApiError::MissingTransformResult => (FfiErrorCode::MissingTransformResult, 0, 0),
        };
        Box::into_raw(Box::new(FfiLbsResult {
            error_code: code,
            error_message: message,
            http_status,
            vendor_status,
            data_tag: FfiDataTag::None,
            data: std::ptr::null_mut(),
        }))
    }

    pub(crate) fn null_arg(name: &str) -> *mut Self {
        Self::boxed(
            FfiErrorCode::NullArg,
            c_string(format!("null or invalid argument: {name}")),
            FfiDataTag::None,
            std::ptr::null_mut(),
        )
    }

    pub(crate) fn panic(msg: &str) -> *mut Self {
        Self::boxed(FfiErrorCode::Panic, c_string(msg.to_string()), FfiDataTag::None, std::ptr::null_mut())
    }
}
