//! C-ABI wrapper around `netclient-core`.
//!
//! # Overview
//! Exposes the pure half of the request pipeline through `extern "C"`
//! functions: a C host declares an endpoint, builds it into a prepared
//! request, performs the HTTP exchange (and its retries) itself, then hands
//! the response back to be classified and decoded.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - Decoding targets a JSON value; the host receives it re-serialized as
//!   compact JSON text and maps it onto its own types.
//! - The C caller owns all returned pointers and must call the matching
//!   `netclient_*_free` / `netclient_free_*` function to release them.

pub mod types;

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::panic::catch_unwind;
use std::time::Duration;

use netclient_core::{classify, decode, RawResponse, RetryPolicy};

use types::*;

/// Borrow a C string as `&str`; null or invalid UTF-8 yields `None`.
fn c_str<'a>(s: *const c_char) -> Option<&'a str> {
    if s.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(s) }.to_str().ok()
}

// ---------------------------------------------------------------------------
// Endpoint lifecycle
// ---------------------------------------------------------------------------

/// Create an endpoint for `host` and `path` with every other field at its
/// default (https, GET, JSON content type, 10 s timeout, 3 attempts).
///
/// Returns null if either argument is null or not UTF-8.
/// The caller must free the returned pointer with `netclient_endpoint_free`.
#[unsafe(no_mangle)]
pub extern "C" fn netclient_endpoint_new(host: *const c_char, path: *const c_char) -> *mut FfiEndpoint {
    catch_unwind(|| {
        let (Some(host), Some(path)) = (c_str(host), c_str(path)) else {
            return std::ptr::null_mut();
        };
        let inner = netclient_core::EndpointDescriptor::new(host, path);
        Box::into_raw(Box::new(FfiEndpoint { inner }))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free an endpoint created by `netclient_endpoint_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn netclient_endpoint_free(endpoint: *mut FfiEndpoint) {
    if !endpoint.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(endpoint) });
        });
    }
}

/// Apply `f` to the endpoint behind `endpoint`. Returns false on null or panic.
fn with_endpoint(endpoint: *mut FfiEndpoint, f: impl FnOnce(&mut FfiEndpoint) -> bool) -> bool {
    if endpoint.is_null() {
        return false;
    }
    let endpoint = unsafe { &mut *endpoint };
    catch_unwind(std::panic::AssertUnwindSafe(|| f(endpoint))).unwrap_or(false)
}

// ---------------------------------------------------------------------------
// Endpoint setters
// ---------------------------------------------------------------------------

#[unsafe(no_mangle)]
pub extern "C" fn netclient_endpoint_set_method(endpoint: *mut FfiEndpoint, method: FfiHttpMethod) -> bool {
    with_endpoint(endpoint, |e| {
        e.inner.method = method.into();
        true
    })
}

/// Returns false if `endpoint` or `scheme` is null.
#[unsafe(no_mangle)]
pub extern "C" fn netclient_endpoint_set_scheme(endpoint: *mut FfiEndpoint, scheme: *const c_char) -> bool {
    with_endpoint(endpoint, |e| match c_str(scheme) {
        Some(scheme) => {
            e.inner.scheme = scheme.to_string();
            true
        }
        None => false,
    })
}

/// Insert or replace a header. Returns false if any argument is null.
#[unsafe(no_mangle)]
pub extern "C" fn netclient_endpoint_set_header(
    endpoint: *mut FfiEndpoint,
    name: *const c_char,
    value: *const c_char,
) -> bool {
    with_endpoint(endpoint, |e| match (c_str(name), c_str(value)) {
        (Some(name), Some(value)) => {
            e.inner.headers.insert(name.to_string(), value.to_string());
            true
        }
        _ => false,
    })
}

/// Append a query parameter. Returns false if any argument is null.
#[unsafe(no_mangle)]
pub extern "C" fn netclient_endpoint_add_query(
    endpoint: *mut FfiEndpoint,
    name: *const c_char,
    value: *const c_char,
) -> bool {
    with_endpoint(endpoint, |e| match (c_str(name), c_str(value)) {
        (Some(name), Some(value)) => {
            e.inner
                .query
                .get_or_insert_with(Vec::new)
                .push((name.to_string(), value.to_string()));
            true
        }
        _ => false,
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn netclient_endpoint_set_timeout_ms(endpoint: *mut FfiEndpoint, timeout_ms: u64) -> bool {
    with_endpoint(endpoint, |e| {
        e.inner.timeout = Duration::from_millis(timeout_ms);
        true
    })
}

/// Set the attempt budget. Zero is rejected and leaves the endpoint unchanged.
#[unsafe(no_mangle)]
pub extern "C" fn netclient_endpoint_set_max_attempts(endpoint: *mut FfiEndpoint, max_attempts: u32) -> bool {
    with_endpoint(endpoint, |e| {
        if max_attempts == 0 {
            return false;
        }
        e.inner.max_attempts = max_attempts;
        true
    })
}

// ---------------------------------------------------------------------------
// Build / process
// ---------------------------------------------------------------------------

/// Build the endpoint into a prepared request.
///
/// Returns null if `endpoint` is null or its URL cannot be assembled.
/// The caller must free the returned pointer with `netclient_free_request`.
#[unsafe(no_mangle)]
pub extern "C" fn netclient_build_request(endpoint: *const FfiEndpoint) -> *mut FfiPreparedRequest {
    catch_unwind(|| {
        if endpoint.is_null() {
            return std::ptr::null_mut();
        }
        let endpoint = unsafe { &*endpoint };
        match netclient_core::build(&endpoint.inner) {
            Ok(req) => {
                let policy = RetryPolicy {
                    max_attempts: endpoint.inner.max_attempts,
                    ..RetryPolicy::default()
                };
                FfiPreparedRequest::from_core(req, policy)
            }
            Err(_) => std::ptr::null_mut(),
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Convert an `FfiRawResponse` to a core `RawResponse`.
fn ffi_response_to_core(resp: &FfiRawResponse) -> RawResponse {
    let body = if resp.body.is_null() || resp.body_len == 0 {
        Vec::new()
    } else {
        unsafe { std::slice::from_raw_parts(resp.body, resp.body_len) }.to_vec()
    };
    RawResponse {
        status: u16::try_from(resp.status).ok(),
        content_type: c_str(resp.content_type).map(str::to_string),
        body,
    }
}

/// Classify a completed exchange and decode its JSON body.
///
/// Returns an outcome with `error_code = Ok` and the body as compact JSON on
/// success. The caller must free it with `netclient_free_outcome`.
#[unsafe(no_mangle)]
pub extern "C" fn netclient_process_response(response: *const FfiRawResponse) -> *mut FfiOutcome {
    catch_unwind(|| {
        if response.is_null() {
            return FfiOutcome::null_arg("response");
        }
        let resp = ffi_response_to_core(unsafe { &*response });
        if let Err(e) = classify(&resp).into_result() {
            return FfiOutcome::from_error(e);
        }
        match decode::<serde_json::Value>(&resp.body, resp.content_type.as_deref()) {
            Ok(value) => FfiOutcome::ok_json(&value.to_string()),
            Err(e) => FfiOutcome::from_error(e),
        }
    })
    .unwrap_or_else(|_| FfiOutcome::panic("panic in netclient_process_response"))
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free an `FfiPreparedRequest` returned by `netclient_build_request`.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn netclient_free_request(req: *mut FfiPreparedRequest) {
    if req.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let req = unsafe { Box::from_raw(req) };
        if !req.url.is_null() {
            drop(unsafe { CString::from_raw(req.url) });
        }
        if !req.cache_control.is_null() {
            drop(unsafe { CString::from_raw(req.cache_control) });
        }
        if !req.headers.is_null() && req.headers_len > 0 {
            let headers = unsafe {
                Vec::from_raw_parts(req.headers, req.headers_len as usize, req.headers_len as usize)
            };
            for h in headers {
                if !h.key.is_null() {
                    drop(unsafe { CString::from_raw(h.key) });
                }
                if !h.value.is_null() {
                    drop(unsafe { CString::from_raw(h.value) });
                }
            }
        }
    });
}

/// Free an `FfiOutcome` returned by `netclient_process_response`.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn netclient_free_outcome(outcome: *mut FfiOutcome) {
    if outcome.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let outcome = unsafe { Box::from_raw(outcome) };
        if !outcome.error_message.is_null() {
            drop(unsafe { CString::from_raw(outcome.error_message) });
        }
        if !outcome.json.is_null() {
            drop(unsafe { CString::from_raw(outcome.json) });
        }
    });
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
