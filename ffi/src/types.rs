//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Each type mirrors a core type with C-compatible representations:
//! `*mut c_char` instead of `String`, pointer + length instead of `Vec`, and
//! enums with explicit discriminants. Conversions live here to keep `lib.rs`
//! focused on the `extern "C"` surface.

use std::ffi::CString;
use std::os::raw::c_char;

use netclient_core::{EndpointDescriptor, ErrorKind, HttpMethod, OutcomeError, PreparedRequest, RetryPolicy};

/// Opaque handle to an `EndpointDescriptor`. C callers receive a pointer to
/// this and pass it back into the setter and build functions.
pub struct FfiEndpoint {
    pub(crate) inner: EndpointDescriptor,
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// HTTP method as a C enum.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiHttpMethod {
    Get = 0,
    Post = 1,
    Put = 2,
    Patch = 3,
    Delete = 4,
}

impl From<HttpMethod> for FfiHttpMethod {
    fn from(m: HttpMethod) -> Self {
        match m {
            HttpMethod::Get => FfiHttpMethod::Get,
            HttpMethod::Post => FfiHttpMethod::Post,
            HttpMethod::Put => FfiHttpMethod::Put,
            HttpMethod::Patch => FfiHttpMethod::Patch,
            HttpMethod::Delete => FfiHttpMethod::Delete,
        }
    }
}

impl From<FfiHttpMethod> for HttpMethod {
    fn from(m: FfiHttpMethod) -> Self {
        match m {
            FfiHttpMethod::Get => HttpMethod::Get,
            FfiHttpMethod::Post => HttpMethod::Post,
            FfiHttpMethod::Put => HttpMethod::Put,
            FfiHttpMethod::Patch => HttpMethod::Patch,
            FfiHttpMethod::Delete => HttpMethod::Delete,
        }
    }
}

/// A single HTTP header as a key-value pair of C strings.
#[repr(C)]
pub struct FfiHeader {
    pub key: *mut c_char,
    pub value: *mut c_char,
}

/// A prepared request as C-compatible plain data.
///
/// Built by `netclient_build_request`. The C host executes it, retrying
/// transport failures up to `max_attempts` times with `retry_delay_ms`
/// between attempts, and passes the final response to
/// `netclient_process_response`.
#[repr(C)]
pub struct FfiPreparedRequest {
    pub method: FfiHttpMethod,
    pub url: *mut c_char,
    pub headers: *mut FfiHeader,
    pub headers_len: u32,
    pub timeout_ms: u64,
    /// `Cache-Control` directive for the cache hint, or null.
    pub cache_control: *mut c_char,
    pub max_attempts: u32,
    pub retry_delay_ms: u64,
}

impl FfiPreparedRequest {
    /// Convert a core request into a heap-allocated `FfiPreparedRequest`.
    pub fn from_core(req: PreparedRequest, policy: RetryPolicy) -> *mut FfiPreparedRequest {
        let mut headers: Vec<FfiHeader> = req
            .headers
            .into_iter()
            .map(|(k, v)| FfiHeader {
                key: to_c_string(&k),
                value: to_c_string(&v),
            })
            .collect();
        headers.shrink_to_fit();
        let headers_len = headers.len() as u32;
        let headers_ptr = if headers.is_empty() {
            std::ptr::null_mut()
        } else {
            let mut boxed = headers.into_boxed_slice();
            let ptr = boxed.as_mut_ptr();
            std::mem::forget(boxed);
            ptr
        };

        let cache_control = match req.cache_policy.cache_control() {
            Some(directive) => to_c_string(directive),
            None => std::ptr::null_mut(),
        };

        Box::into_raw(Box::new(FfiPreparedRequest {
            method: req.method.into(),
            url: to_c_string(req.url.as_str()),
            headers: headers_ptr,
            headers_len,
            timeout_ms: req.timeout.as_millis() as u64,
            cache_control,
            max_attempts: policy.max_attempts,
            retry_delay_ms: policy.delay.as_millis() as u64,
        }))
    }
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// A completed exchange handed in by the C host.
///
/// `status` is negative when the reply carried no usable status line.
/// `content_type` may be null. `body` may be null when `body_len` is 0.
#[repr(C)]
pub struct FfiRawResponse {
    pub status: i32,
    pub content_type: *const c_char,
    pub body: *const u8,
    pub body_len: usize,
}

/// Error category of an `FfiOutcome`. `Ok` means `json` holds the body.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    BadUrl = 1,
    InvalidResponse = 2,
    NotFound = 3,
    InternalServerError = 4,
    UnknownError = 5,
    UnsupportedContentType = 6,
    RequestFailed = 7,
    DecodingFailed = 8,
    NullArgument = 9,
    Panic = 10,
}

impl From<ErrorKind> for FfiErrorCode {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::BadUrl => FfiErrorCode::BadUrl,
            ErrorKind::InvalidResponse => FfiErrorCode::InvalidResponse,
            ErrorKind::NotFound => FfiErrorCode::NotFound,
            ErrorKind::InternalServerError => FfiErrorCode::InternalServerError,
            ErrorKind::UnknownError => FfiErrorCode::UnknownError,
            ErrorKind::UnsupportedContentType => FfiErrorCode::UnsupportedContentType,
            ErrorKind::RequestFailed => FfiErrorCode::RequestFailed,
            ErrorKind::DecodingFailed => FfiErrorCode::DecodingFailed,
        }
    }
}

/// Result envelope for `netclient_process_response`.
///
/// On success `error_code` is `Ok` and `json` holds the decoded body
/// re-serialized as compact JSON. On failure `json` is null and
/// `error_message` describes the error; `status_code` is set for
/// `UnknownError`.
#[repr(C)]
pub struct FfiOutcome {
    pub error_code: FfiErrorCode,
    pub status_code: u16,
    pub error_message: *mut c_char,
    pub json: *mut c_char,
}

impl FfiOutcome {
    pub fn ok_json(json: &str) -> *mut FfiOutcome {
        Box::into_raw(Box::new(FfiOutcome {
            error_code: FfiErrorCode::Ok,
            status_code: 0,
            error_message: std::ptr::null_mut(),
            json: to_c_string(json),
        }))
    }

    pub fn from_error(err: OutcomeError) -> *mut FfiOutcome {
        let status_code = match &err {
            OutcomeError::UnknownError { status_code } => *status_code,
            _ => 0,
        };
        Box::into_raw(Box::new(FfiOutcome {
            error_code: err.kind().into(),
            status_code,
            error_message: to_c_string(&err.to_string()),
            json: std::ptr::null_mut(),
        }))
    }

    pub fn null_arg(name: &str) -> *mut FfiOutcome {
        Self::error(FfiErrorCode::NullArgument, &format!("null argument: {name}"))
    }

    pub fn panic(msg: &str) -> *mut FfiOutcome {
        Self::error(FfiErrorCode::Panic, msg)
    }

    fn error(code: FfiErrorCode, msg: &str) -> *mut FfiOutcome {
        Box::into_raw(Box::new(FfiOutcome {
            error_code: code,
            status_code: 0,
            error_message: to_c_string(msg),
            json: std::ptr::null_mut(),
        }))
    }
}

/// Allocate a C string; interior NULs are stripped rather than failing.
pub(crate) fn to_c_string(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(c) => c.into_raw(),
        Err(_) => CString::new(s.replace('\0', ""))
            .map(CString::into_raw)
            .unwrap_or(std::ptr::null_mut()),
    }
}
