//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Handles are opaque boxes around core values. Everything the host reads is
//! plain data: `*mut c_char` strings owned by this library and tagged error
//! codes with explicit discriminants. Conversion functions live here to keep
//! `lib.rs` focused on the `extern "C"` surface.

use std::ffi::{c_void, CString};
use std::os::raw::c_char;
use std::sync::Arc;

use addb_core::{Addb, DrinksQuery, InMemoryDocument, QueryError, Response, ScriptElement};
use serde_json::{json, Value};

/// Opaque handle to an `Addb` client whose transport is an in-memory
/// document the host drains with `addb_next_request`.
pub struct FfiAddbClient {
    pub(crate) inner: Addb,
    pub(crate) document: Arc<InMemoryDocument>,
}

/// Opaque handle to a drinks query. Independent of the client handle once
/// created; both may be freed in any order.
pub struct FfiDrinksQuery {
    pub(crate) inner: DrinksQuery,
}

/// Copy `s` into a C string owned by this library. Interior NULs yield null.
pub(crate) fn into_c_string(s: String) -> *mut c_char {
    CString::new(s)
        .map(CString::into_raw)
        .unwrap_or(std::ptr::null_mut())
}

// ---------------------------------------------------------------------------
// Error codes
// ---------------------------------------------------------------------------

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    Configuration = 1,
    Argument = 2,
    UnsupportedOperation = 3,
    TransportTimeout = 4,
    Payload = 5,
    UnknownCallback = 6,
    Panic = 7,
    NullArg = 8,
}

impl From<&QueryError> for FfiErrorCode {
    fn from(err: &QueryError) -> Self {
        match err {
            QueryError::Configuration(_) => FfiErrorCode::Configuration,
            QueryError::Argument(_) => FfiErrorCode::Argument,
            QueryError::UnsupportedOperation { .. } => FfiErrorCode::UnsupportedOperation,
            QueryError::TransportTimeout { .. } => FfiErrorCode::TransportTimeout,
            QueryError::Payload(_) => FfiErrorCode::Payload,
        }
    }
}

// ---------------------------------------------------------------------------
// Completion callback
// ---------------------------------------------------------------------------

/// Completion handler supplied by the host.
///
/// On success `error_code` is `Ok` and `text` is the response as JSON: a bare
/// entity, or `{"totalResult": n, "result": [...]}` for a listing. On failure
/// `text` is the error message. `text` is only valid during the call.
pub type AddbCompletionFn =
    extern "C" fn(user_data: *mut c_void, error_code: FfiErrorCode, text: *const c_char);

/// Host context pointer carried to the completion thread untouched.
pub(crate) struct UserData(*mut c_void);

// The pointer is never dereferenced on the Rust side.
unsafe impl Send for UserData {}

impl UserData {
    pub(crate) fn new(ptr: *mut c_void) -> Self {
        Self(ptr)
    }

    pub(crate) fn get(&self) -> *mut c_void {
        self.0
    }
}

pub(crate) fn response_json(response: &Response) -> Value {
    match response {
        Response::Collection {
            total_result,
            result,
        } => json!({
            "totalResult": total_result,
            "result": result.iter().map(|e| e.data().clone()).collect::<Vec<_>>(),
        }),
        Response::Single(entity) => entity.data().clone(),
    }
}

/// Adapt a host callback into a core completion.
pub(crate) fn completion(
    callback: AddbCompletionFn,
    user_data: UserData,
) -> impl FnOnce(Result<Response, QueryError>) + Send + 'static {
    move |outcome| {
        let (code, text) = match outcome {
            Ok(response) => (FfiErrorCode::Ok, response_json(&response).to_string()),
            Err(err) => (FfiErrorCode::from(&err), err.to_string()),
        };
        let text = CString::new(text).unwrap_or_default();
        callback(user_data.get(), code, text.as_ptr());
    }
}

// ---------------------------------------------------------------------------
// Pending request
// ---------------------------------------------------------------------------

/// A request the host must perform: GET `src`, then hand the body to
/// `addb_deliver` with `callback_id`.
#[repr(C)]
pub struct FfiScriptRequest {
    pub callback_id: *mut c_char,
    pub src: *mut c_char,
}

impl FfiScriptRequest {
    pub(crate) fn from_core(element: ScriptElement) -> *mut Self {
        Box::into_raw(Box::new(FfiScriptRequest {
            callback_id: into_c_string(element.id),
            src: into_c_string(element.src),
        }))
    }
}

// ---------------------------------------------------------------------------
// Dispatch result
// ---------------------------------------------------------------------------

/// Result envelope for every call that issues a request.
///
/// On success `error_code` is `Ok`, `callback_id` names the pending request
/// and `error_message` is null. On failure `callback_id` is null and no
/// completion will ever fire.
#[repr(C)]
pub struct FfiDispatchResult {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub callback_id: *mut c_char,
}

impl FfiDispatchResult {
    fn boxed(error_code: FfiErrorCode, error_message: *mut c_char, callback_id: *mut c_char) -> *mut Self {
        Box::into_raw(Box::new(FfiDispatchResult {
            error_code,
            error_message,
            callback_id,
        }))
    }

    pub(crate) fn from_core(result: Result<String, QueryError>) -> *mut Self {
        match result {
            Ok(callback_id) => Self::boxed(FfiErrorCode::Ok, std::ptr::null_mut(), into_c_string(callback_id)),
            Err(err) => Self::boxed(
                FfiErrorCode::from(&err),
                into_c_string(err.to_string()),
                std::ptr::null_mut(),
            ),
        }
    }

    pub(crate) fn null_arg(name: &str) -> *mut Self {
        Self::boxed(
            FfiErrorCode::NullArg,
            into_c_string(format!("null argument: {name}")),
            std::ptr::null_mut(),
        )
    }

    pub(crate) fn panic(msg: &str) -> *mut Self {
        Self::boxed(FfiErrorCode::Panic, into_c_string(msg.to_string()), std::ptr::null_mut())
    }
}
