//! C-ABI wrapper around `lbs-core`.
//!
//! # Overview
//! Exposes every LBS endpoint through `extern "C"` functions so a host in any
//! language with a C FFI can build requests and parse responses while keeping
//! the HTTP transport on its own side.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - One `lbs_build_*` per endpoint; two parsers, `lbs_parse_json`
//!   (passthrough) and `lbs_parse_transform` (validated `x`/`y`).
//! - A single `FfiLbsResult` envelope with `FfiDataTag` + `void* data`
//!   carries success payloads and errors uniformly.
//! - The C caller owns all returned pointers and must call the matching
//!   `lbs_free_*` function to release them.

pub mod types;

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::panic::{catch_unwind, AssertUnwindSafe};

use lbs_core::{
    ApiError, ColumnType, ConvSystem, Conversion, HttpRequest, HttpResponse, LbsClient, NewColumn, NewTable,
    Page, PoiInput,
};

use types::*;

/// Borrow a C string as UTF-8. `None` for null or invalid UTF-8.
///
/// `ptr` must be null or point to a NUL-terminated string that outlives `'a`.
fn borrow_str<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(ptr) }.to_str().ok()
}

/// Shared body of the `lbs_build_*` functions. A null client, a rejected
/// argument or a panic all produce a null request.
fn build(
    client: *const FfiLbsClient,
    f: impl FnOnce(&LbsClient) -> Option<HttpRequest>,
) -> *mut FfiHttpRequest {
    catch_unwind(AssertUnwindSafe(|| {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        match f(&client.inner) {
            Some(req) => FfiHttpRequest::from_core(req),
            None => std::ptr::null_mut(),
        }
    }))
    .unwrap_or(std::ptr::null_mut())
}

fn poi_input(title: *const c_char, address: *const c_char, latitude: f64, longitude: f64) -> Option<PoiInput> {
    Some(PoiInput {
        title: borrow_str(title)?.to_string(),
        address: borrow_str(address)?.to_string(),
        latitude,
        longitude,
    })
}

// ---------------------------------------------------------------------------
// Client lifecycle
// ---------------------------------------------------------------------------

/// Create a client for the public endpoint authenticated with `token`.
///
/// Returns null if `token` is null, empty or not UTF-8.
/// The caller must free the returned pointer with `lbs_client_free`.
#[unsafe(no_mangle)]
pub extern "C" fn lbs_client_new(token: *const c_char) -> *mut FfiLbsClient {
    catch_unwind(|| {
        let Some(token) = borrow_str(token) else {
            return std::ptr::null_mut();
        };
        match LbsClient::new(token) {
            Ok(inner) => Box::into_raw(Box::new(FfiLbsClient { inner })),
            Err(_) => std::ptr::null_mut(),
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Like `lbs_client_new`, against an alternative host.
#[unsafe(no_mangle)]
pub extern "C" fn lbs_client_new_with_base_url(
    base_url: *const c_char,
    token: *const c_char,
) -> *mut FfiLbsClient {
    catch_unwind(|| {
        let (Some(base_url), Some(token)) = (borrow_str(base_url), borrow_str(token)) else {
            return std::ptr::null_mut();
        };
        match LbsClient::with_base_url(base_url, token) {
            Ok(inner) => Box::into_raw(Box::new(FfiLbsClient { inner })),
            Err(_) => std::ptr::null_mut(),
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a client created by `lbs_client_new*`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn lbs_client_free(client: *mut FfiLbsClient) {
    if !client.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(client) });
        });
    }
}

// ---------------------------------------------------------------------------
// Build request functions
// ---------------------------------------------------------------------------

/// Geocode `address` within `city`.
#[unsafe(no_mangle)]
pub extern "C" fn lbs_build_search(
    client: *const FfiLbsClient,
    city: *const c_char,
    address: *const c_char,
) -> *mut FfiHttpRequest {
    build(client, |c| Some(c.build_search(borrow_str(city)?, borrow_str(address)?)))
}

#[unsafe(no_mangle)]
pub extern "C" fn lbs_build_list_tables(client: *const FfiLbsClient) -> *mut FfiHttpRequest {
    build(client, |c| Some(c.build_list_tables()))
}

#[unsafe(no_mangle)]
pub extern "C" fn lbs_build_create_table(
    client: *const FfiLbsClient,
    name: *const c_char,
    is_published: bool,
) -> *mut FfiHttpRequest {
    build(client, |c| {
        let table = NewTable {
            name: borrow_str(name)?.to_string(),
            is_published,
        };
        Some(c.build_create_table(&table))
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn lbs_build_delete_table(client: *const FfiLbsClient, id: *const c_char) -> *mut FfiHttpRequest {
    build(client, |c| Some(c.build_delete_table(borrow_str(id)?)))
}

#[unsafe(no_mangle)]
pub extern "C" fn lbs_build_table_detail(client: *const FfiLbsClient, id: *const c_char) -> *mut FfiHttpRequest {
    build(client, |c| Some(c.build_table_detail(borrow_str(id)?)))
}

/// Create a column. `column_type` is 1 (int64), 2 (double), 3 (string) or
/// 4 (image url); any other value returns null.
#[unsafe(no_mangle)]
pub extern "C" fn lbs_build_create_column(
    client: *const FfiLbsClient,
    table_id: *const c_char,
    name: *const c_char,
    key: *const c_char,
    column_type: u8,
    is_search_field: bool,
    is_index_field: bool,
) -> *mut FfiHttpRequest {
    build(client, |c| {
        let column = NewColumn {
            name: borrow_str(name)?.to_string(),
            key: borrow_str(key)?.to_string(),
            column_type: ColumnType::from_code(column_type)?,
            is_search_field,
            is_index_field,
        };
        Some(c.build_create_column(borrow_str(table_id)?, &column))
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn lbs_build_list_columns(
    client: *const FfiLbsClient,
    table_id: *const c_char,
    name: *const c_char,
    key: *const c_char,
) -> *mut FfiHttpRequest {
    build(client, |c| {
        Some(c.build_list_columns(borrow_str(table_id)?, borrow_str(name)?, borrow_str(key)?))
    })
}

/// Create a POI; coordinates are tagged as raw GPS.
#[unsafe(no_mangle)]
pub extern "C" fn lbs_build_create_poi(
    client: *const FfiLbsClient,
    table_id: *const c_char,
    title: *const c_char,
    address: *const c_char,
    latitude: f64,
    longitude: f64,
) -> *mut FfiHttpRequest {
    build(client, |c| {
        let poi = poi_input(title, address, latitude, longitude)?;
        Some(c.build_create_poi(borrow_str(table_id)?, &poi))
    })
}

/// List POIs. The vendor defaults are page 0, size 200.
#[unsafe(no_mangle)]
pub extern "C" fn lbs_build_list_pois(
    client: *const FfiLbsClient,
    table_id: *const c_char,
    page_index: u32,
    page_size: u32,
) -> *mut FfiHttpRequest {
    build(client, |c| {
        let page = Page {
            index: page_index,
            size: page_size,
        };
        Some(c.build_list_pois(borrow_str(table_id)?, page))
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn lbs_build_get_poi(
    client: *const FfiLbsClient,
    table_id: *const c_char,
    poi_id: *const c_char,
) -> *mut FfiHttpRequest {
    build(client, |c| Some(c.build_get_poi(borrow_str(table_id)?, borrow_str(poi_id)?)))
}

#[unsafe(no_mangle)]
pub extern "C" fn lbs_build_update_poi(
    client: *const FfiLbsClient,
    table_id: *const c_char,
    poi_id: *const c_char,
    title: *const c_char,
    address: *const c_char,
    latitude: f64,
    longitude: f64,
) -> *mut FfiHttpRequest {
    build(client, |c| {
        let poi = poi_input(title, address, latitude, longitude)?;
        Some(c.build_update_poi(borrow_str(table_id)?, borrow_str(poi_id)?, &poi))
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn lbs_build_delete_poi(
    client: *const FfiLbsClient,
    table_id: *const c_char,
    poi_id: *const c_char,
) -> *mut FfiHttpRequest {
    build(client, |c| Some(c.build_delete_poi(borrow_str(table_id)?, borrow_str(poi_id)?)))
}

#[unsafe(no_mangle)]
pub extern "C" fn lbs_build_delete_all_pois(
    client: *const FfiLbsClient,
    table_id: *const c_char,
) -> *mut FfiHttpRequest {
    build(client, |c| Some(c.build_delete_all_pois(borrow_str(table_id)?)))
}

#[unsafe(no_mangle)]
pub extern "C" fn lbs_build_nearby(
    client: *const FfiLbsClient,
    table_id: *const c_char,
    latitude: f64,
    longitude: f64,
    radius: u32,
) -> *mut FfiHttpRequest {
    build(client, |c| Some(c.build_nearby(borrow_str(table_id)?, latitude, longitude, radius)))
}

/// Coordinate transform. `from`/`to` are geoconv codes 1..=8 (1 = GPS,
/// 5 = Baidu lat/lng); anything else returns null.
#[unsafe(no_mangle)]
pub extern "C" fn lbs_build_transform(
    client: *const FfiLbsClient,
    latitude: f64,
    longitude: f64,
    from: u8,
    to: u8,
) -> *mut FfiHttpRequest {
    build(client, |c| {
        let conversion = Conversion {
            from: ConvSystem::from_code(from)?,
            to: ConvSystem::from_code(to)?,
        };
        Some(c.build_transform(latitude, longitude, conversion))
    })
}

// ---------------------------------------------------------------------------
// Parse response functions
// ---------------------------------------------------------------------------

/// Convert an `FfiHttpResponse` to a core `HttpResponse`. A null body reads
/// as empty. A 2xx body that is not UTF-8 is a deserialization error; for
/// other statuses it is decoded lossily so the HTTP error still surfaces.
fn ffi_response_to_core(resp: &FfiHttpResponse) -> Result<HttpResponse, ApiError> {
    if resp.body.is_null() {
        return Ok(HttpResponse {
            status: resp.status,
            body: String::new(),
        });
    }
    let bytes = unsafe { CStr::from_ptr(resp.body) }.to_bytes();
    let body = match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) if !(200..300).contains(&resp.status) => String::from_utf8_lossy(bytes).into_owned(),
        Err(e) => {
            return Err(ApiError::Deserialization(format!(
                "response body is not valid UTF-8: {e}"
            )))
        }
    };
    Ok(HttpResponse {
        status: resp.status,
        body,
    })
}

/// Parse any passthrough response. On success `data_tag = Json` and `data`
/// is the body as JSON text.
#[unsafe(no_mangle)]
pub extern "C" fn lbs_parse_json(
    client: *const FfiLbsClient,
    response: *const FfiHttpResponse,
) -> *mut FfiLbsResult {
    catch_unwind(|| {
        if client.is_null() {
            return FfiLbsResult::null_arg("client");
        }
        if response.is_null() {
            return FfiLbsResult::null_arg("response");
        }
        let client = unsafe { &*client };
        let resp = unsafe { &*response };
        match ffi_response_to_core(resp).and_then(|r| client.inner.parse_json(r)) {
            Ok(value) => FfiLbsResult::ok_json(&value),
            Err(e) => FfiLbsResult::from_error(e),
        }
    })
    .unwrap_or_else(|_| FfiLbsResult::panic("panic in lbs_parse_json"))
}

/// Parse a transform response. On success `data_tag = Point`.
#[unsafe(no_mangle)]
pub extern "C" fn lbs_parse_transform(
    client: *const FfiLbsClient,
    response: *const FfiHttpResponse,
) -> *mut FfiLbsResult {
    catch_unwind(|| {
        if client.is_null() {
            return FfiLbsResult::null_arg("client");
        }
        if response.is_null() {
            return FfiLbsResult::null_arg("response");
        }
        let client = unsafe { &*client };
        let resp = unsafe { &*response };
        match ffi_response_to_core(resp).and_then(|r| client.inner.parse_transform(r)) {
            Ok((x, y)) => FfiLbsResult::ok_point(x, y),
            Err(e) => FfiLbsResult::from_error(e),
        }
    })
    .unwrap_or_else(|_| FfiLbsResult::panic("panic in lbs_parse_transform"))
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free an `FfiHttpRequest` returned by any `lbs_build_*` function.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn lbs_free_request(req: *mut FfiHttpRequest) {
    if req.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let req = unsafe { Box::from_raw(req) };
        free_c_string(req.url);
        free_c_string(req.path);
        if !req.query.is_null() && req.query_len > 0 {
            let params = unsafe {
                Box::from_raw(std::ptr::slice_from_raw_parts_mut(req.query, req.query_len as usize))
            };
            for p in params.iter() {
                free_c_string(p.key);
                free_c_string(p.value);
            }
        }
    });
}

/// Free an `FfiLbsResult` returned by any `lbs_parse_*` function.
/// Safe to call with null. Uses `data_tag` to determine what `data` points to.
#[unsafe(no_mangle)]
pub extern "C" fn lbs_free_result(result: *mut FfiLbsResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let result = unsafe { Box::from_raw(result) };
        free_c_string(result.error_message);
        if !result.data.is_null() {
            match result.data_tag {
                FfiDataTag::Json => free_c_string(result.data as *mut c_char),
                FfiDataTag::Point => drop(unsafe { Box::from_raw(result.data as *mut FfiPoint) }),
                FfiDataTag::None => {}
            }
        }
    });
}

fn free_c_string(s: *mut c_char) {
    if !s.is_null() {
        drop(unsafe { CString::from_raw(s) });
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
