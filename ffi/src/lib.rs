//! C-ABI wrapper around `addb-core`.
//!
//! # Overview
//! Exposes the drinks catalog client through `extern "C"` functions. The
//! host does the network I/O: it drains pending requests with
//! `addb_next_request`, performs each GET, and hands the JSONP body back with
//! `addb_deliver`, which fires the registered completion.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - Terminal calls return an `FfiDispatchResult` carrying the callback id or
//!   the error that stopped the request before it was issued.
//! - A null completion callback is rejected as an argument error; no request
//!   is issued for it.
//! - The C caller owns all returned pointers and must call the matching
//!   `addb_free_*` function to release them.

pub mod types;

use std::ffi::{c_void, CStr, CString};
use std::os::raw::c_char;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use addb_core::transport::parse_jsonp;
use addb_core::{Addb, ConfigOverrides, DrinkFilter, InMemoryDocument, QueryCapabilities, QueryError};
use tracing::warn;

use types::*;

/// Borrow a C string. Null or invalid UTF-8 gives `None`.
fn c_str<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(ptr) }.to_str().ok()
}

// ---------------------------------------------------------------------------
// Client lifecycle
// ---------------------------------------------------------------------------

/// Create a client. `host` may be null for the public service; `app_id` may
/// be null, in which case every terminal call fails with `Configuration`.
/// `timeout_ms` of 0 disables `addb_sweep_expired`.
///
/// The caller must free the returned pointer with `addb_client_free`.
#[unsafe(no_mangle)]
pub extern "C" fn addb_client_new(
    host: *const c_char,
    app_id: *const c_char,
    secure: bool,
    timeout_ms: u64,
) -> *mut FfiAddbClient {
    catch_unwind(AssertUnwindSafe(|| {
        let overrides = ConfigOverrides {
            host: c_str(host).map(str::to_string),
            app_id: c_str(app_id).map(str::to_string),
            secure_origin: Some(secure),
            request_timeout_ms: (timeout_ms > 0).then_some(timeout_ms),
            ..Default::default()
        };
        let document = Arc::new(InMemoryDocument::new());
        let inner = Addb::init(overrides, document.clone());
        Box::into_raw(Box::new(FfiAddbClient { inner, document }))
    }))
    .unwrap_or(std::ptr::null_mut())
}

/// Free a client created by `addb_client_new`. Safe to call with null.
/// Pending requests are dropped without firing.
#[unsafe(no_mangle)]
pub extern "C" fn addb_client_free(client: *mut FfiAddbClient) {
    if !client.is_null() {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            drop(unsafe { Box::from_raw(client) });
        }));
    }
}

// ---------------------------------------------------------------------------
// Drinks query
// ---------------------------------------------------------------------------

/// Start a drinks query. A null `language` means `en`.
#[unsafe(no_mangle)]
pub extern "C" fn addb_drinks_new(
    client: *const FfiAddbClient,
    language: *const c_char,
) -> *mut FfiDrinksQuery {
    catch_unwind(AssertUnwindSafe(|| {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        let inner = client.inner.drinks(c_str(language).unwrap_or("en"));
        Box::into_raw(Box::new(FfiDrinksQuery { inner }))
    }))
    .unwrap_or(std::ptr::null_mut())
}

#[unsafe(no_mangle)]
pub extern "C" fn addb_drinks_free(query: *mut FfiDrinksQuery) {
    if !query.is_null() {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            drop(unsafe { Box::from_raw(query) });
        }));
    }
}

/// Apply an options hash given as JSON, e.g.
/// `{"withIngredient":"vodka","alcoholic":true}`.
#[unsafe(no_mangle)]
pub extern "C" fn addb_drinks_filter(query: *mut FfiDrinksQuery, filter_json: *const c_char) -> FfiErrorCode {
    catch_unwind(AssertUnwindSafe(|| {
        if query.is_null() || filter_json.is_null() {
            return FfiErrorCode::NullArg;
        }
        let query = unsafe { &mut *query };
        let Some(raw) = c_str(filter_json) else {
            return FfiErrorCode::Argument;
        };
        match serde_json::from_str::<DrinkFilter>(raw) {
            Ok(filter) => {
                query.inner.filter(&filter);
                FfiErrorCode::Ok
            }
            Err(_) => FfiErrorCode::Payload,
        }
    }))
    .unwrap_or(FfiErrorCode::Panic)
}

#[unsafe(no_mangle)]
pub extern "C" fn addb_drinks_skip(query: *mut FfiDrinksQuery, amount: u32) -> FfiErrorCode {
    catch_unwind(AssertUnwindSafe(|| {
        if query.is_null() {
            return FfiErrorCode::NullArg;
        }
        let query = unsafe { &mut *query };
        match query.inner.skip(amount) {
            Ok(_) => FfiErrorCode::Ok,
            Err(e) => FfiErrorCode::from(&e),
        }
    }))
    .unwrap_or(FfiErrorCode::Panic)
}

#[unsafe(no_mangle)]
pub extern "C" fn addb_drinks_take(query: *mut FfiDrinksQuery, amount: u32) -> FfiErrorCode {
    catch_unwind(AssertUnwindSafe(|| {
        if query.is_null() {
            return FfiErrorCode::NullArg;
        }
        let query = unsafe { &mut *query };
        query.inner.take(amount);
        FfiErrorCode::Ok
    }))
    .unwrap_or(FfiErrorCode::Panic)
}

/// The URL as currently built. After a `load_set` it still carries that
/// request's `appId` and `callback`. Free with `addb_free_string`.
#[unsafe(no_mangle)]
pub extern "C" fn addb_drinks_url(query: *const FfiDrinksQuery) -> *mut c_char {
    catch_unwind(AssertUnwindSafe(|| {
        if query.is_null() {
            return std::ptr::null_mut();
        }
        let query = unsafe { &*query };
        into_c_string(query.inner.url())
    }))
    .unwrap_or(std::ptr::null_mut())
}

fn require_callback(callback: Option<AddbCompletionFn>) -> Result<AddbCompletionFn, QueryError> {
    callback.ok_or_else(|| QueryError::Argument("you must provide a completion callback".to_string()))
}

/// Load the filtered set. `callback` fires once, from `addb_deliver` or
/// `addb_sweep_expired`.
#[unsafe(no_mangle)]
pub extern "C" fn addb_drinks_load_set(
    query: *mut FfiDrinksQuery,
    callback: Option<AddbCompletionFn>,
    user_data: *mut c_void,
) -> *mut FfiDispatchResult {
    catch_unwind(AssertUnwindSafe(|| {
        if query.is_null() {
            return FfiDispatchResult::null_arg("query");
        }
        let query = unsafe { &mut *query };
        let result = require_callback(callback)
            .and_then(|cb| query.inner.load_set(completion(cb, UserData::new(user_data))));
        FfiDispatchResult::from_core(result)
    }))
    .unwrap_or_else(|_| FfiDispatchResult::panic("panic in addb_drinks_load_set"))
}

/// Load one drink by id.
#[unsafe(no_mangle)]
pub extern "C" fn addb_drinks_load(
    query: *mut FfiDrinksQuery,
    id: *const c_char,
    callback: Option<AddbCompletionFn>,
    user_data: *mut c_void,
) -> *mut FfiDispatchResult {
    catch_unwind(AssertUnwindSafe(|| {
        if query.is_null() {
            return FfiDispatchResult::null_arg("query");
        }
        if id.is_null() {
            return FfiDispatchResult::null_arg("id");
        }
        let query = unsafe { &mut *query };
        let id = c_str(id).unwrap_or("");
        let result = require_callback(callback)
            .and_then(|cb| query.inner.load(id, completion(cb, UserData::new(user_data))));
        FfiDispatchResult::from_core(result)
    }))
    .unwrap_or_else(|_| FfiDispatchResult::panic("panic in addb_drinks_load"))
}

// ---------------------------------------------------------------------------
// Host-driven transport
// ---------------------------------------------------------------------------

/// Next request the host has not fetched yet, or null when there is none.
/// Free with `addb_free_request`.
#[unsafe(no_mangle)]
pub extern "C" fn addb_next_request(client: *const FfiAddbClient) -> *mut FfiScriptRequest {
    catch_unwind(AssertUnwindSafe(|| {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        match client.document.poll() {
            Some(element) => FfiScriptRequest::from_core(element),
            None => std::ptr::null_mut(),
        }
    }))
    .unwrap_or(std::ptr::null_mut())
}

/// Hand the body fetched for `callback_id` back to the client. The body is
/// the JSONP text the server returned. On `Ok` the completion has already
/// run when this returns.
#[unsafe(no_mangle)]
pub extern "C" fn addb_deliver(
    client: *const FfiAddbClient,
    callback_id: *const c_char,
    body: *const c_char,
) -> FfiErrorCode {
    catch_unwind(AssertUnwindSafe(|| {
        if client.is_null() || callback_id.is_null() || body.is_null() {
            return FfiErrorCode::NullArg;
        }
        let client = unsafe { &*client };
        let (Some(callback_id), Some(body)) = (c_str(callback_id), c_str(body)) else {
            return FfiErrorCode::Argument;
        };
        let payload = match parse_jsonp(body, callback_id) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(callback_id = %callback_id, error = %e, "malformed body, ticket left pending");
                return FfiErrorCode::from(&e);
            }
        };
        if client.inner.registry().complete(callback_id, payload) {
            FfiErrorCode::Ok
        } else {
            FfiErrorCode::UnknownCallback
        }
    }))
    .unwrap_or(FfiErrorCode::Panic)
}

/// Fail every request older than the configured timeout. Returns how many
/// completions fired.
#[unsafe(no_mangle)]
pub extern "C" fn addb_sweep_expired(client: *const FfiAddbClient) -> u32 {
    catch_unwind(AssertUnwindSafe(|| {
        if client.is_null() {
            return 0;
        }
        let client = unsafe { &*client };
        client.inner.registry().sweep_expired() as u32
    }))
    .unwrap_or(0)
}

#[unsafe(no_mangle)]
pub extern "C" fn addb_pending_count(client: *const FfiAddbClient) -> u32 {
    catch_unwind(AssertUnwindSafe(|| {
        if client.is_null() {
            return 0;
        }
        let client = unsafe { &*client };
        client.inner.registry().pending_count() as u32
    }))
    .unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Memory management
// ---------------------------------------------------------------------------

/// Free a request returned by `addb_next_request`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn addb_free_request(request: *mut FfiScriptRequest) {
    if request.is_null() {
        return;
    }
    let _ = catch_unwind(AssertUnwindSafe(|| {
        let request = unsafe { Box::from_raw(request) };
        addb_free_string(request.callback_id);
        addb_free_string(request.src);
    }));
}

/// Free a result returned by a terminal call. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn addb_free_dispatch_result(result: *mut FfiDispatchResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(AssertUnwindSafe(|| {
        let result = unsafe { Box::from_raw(result) };
        addb_free_string(result.error_message);
        addb_free_string(result.callback_id);
    }));
}

/// Free a C string allocated by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn addb_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            drop(unsafe { CString::from_raw(s) });
        }));
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    struct Captured {
        calls: Mutex<Vec<(FfiErrorCode, String)>>,
    }

    extern "C" fn record(user_data: *mut c_void, code: FfiErrorCode, text: *const c_char) {
        let captured = unsafe { &*(user_data as *const Captured) };
        let text = unsafe { CStr::from_ptr(text) }.to_str().unwrap().to_string();
        captured.calls.lock().unwrap().push((code, text));
    }

    fn client(app_id: Option<&str>) -> *mut FfiAddbClient {
        let host = CString::new("catalog.test").unwrap();
        let app_id = app_id.map(|id| CString::new(id).unwrap());
        addb_client_new(
            host.as_ptr(),
            app_id.as_ref().map_or(std::ptr::null(), |id| id.as_ptr()),
            false,
            0,
        )
    }

    fn read(ptr: *const c_char) -> String {
        unsafe { CStr::from_ptr(ptr) }.to_str().unwrap().to_string()
    }

    #[test]
    fn client_new_and_free() {
        let c = client(Some("app"));
        assert!(!c.is_null());
        addb_client_free(c);
    }

    #[test]
    fn free_functions_accept_null() {
        addb_client_free(std::ptr::null_mut());
        addb_drinks_free(std::ptr::null_mut());
        addb_free_request(std::ptr::null_mut());
        addb_free_dispatch_result(std::ptr::null_mut());
        addb_free_string(std::ptr::null_mut());
    }

    #[test]
    fn drinks_url_reflects_filter_json() {
        let c = client(Some("app"));
        let q = addb_drinks_new(c, std::ptr::null());
        let filter = CString::new(r#"{"withIngredient":"vodka","alcoholic":false}"#).unwrap();
        assert_eq!(addb_drinks_filter(q, filter.as_ptr()), FfiErrorCode::Ok);
        assert_eq!(addb_drinks_take(q, 5), FfiErrorCode::Ok);

        let url = addb_drinks_url(q);
        assert_eq!(
            read(url),
            "http://catalog.test/drinks/with/vodka/alcoholic/no/?lang=en&pageSize=5"
        );
        addb_free_string(url);
        addb_drinks_free(q);
        addb_client_free(c);
    }

    #[test]
    fn malformed_filter_json_is_a_payload_error() {
        let c = client(Some("app"));
        let q = addb_drinks_new(c, std::ptr::null());
        let filter = CString::new("{not json").unwrap();
        assert_eq!(addb_drinks_filter(q, filter.as_ptr()), FfiErrorCode::Payload);
        addb_drinks_free(q);
        addb_client_free(c);
    }

    #[test]
    fn host_driven_round_trip() {
        let captured = Captured {
            calls: Mutex::new(Vec::new()),
        };
        let c = client(Some("app"));
        let q = addb_drinks_new(c, std::ptr::null());

        let result = addb_drinks_load_set(q, Some(record), &captured as *const Captured as *mut c_void);
        let result_ref = unsafe { &*result };
        assert_eq!(result_ref.error_code, FfiErrorCode::Ok);
        let callback_id = read(result_ref.callback_id);
        assert_eq!(addb_pending_count(c), 1);

        let request = addb_next_request(c);
        assert!(!request.is_null());
        let request_ref = unsafe { &*request };
        assert_eq!(read(request_ref.callback_id), callback_id);
        let src = read(request_ref.src);
        assert!(src.starts_with("http://catalog.test/drinks/?lang=en&pageSize=25&appId=app&callback="));
        assert!(addb_next_request(c).is_null());

        let body = CString::new(format!(
            r#"{callback_id}({{"totalResult":1,"result":[{{"id":"mojito"}}]}});"#
        ))
        .unwrap();
        let id = CString::new(callback_id.clone()).unwrap();
        assert_eq!(addb_deliver(c, id.as_ptr(), body.as_ptr()), FfiErrorCode::Ok);
        assert_eq!(addb_deliver(c, id.as_ptr(), body.as_ptr()), FfiErrorCode::UnknownCallback);
        assert_eq!(addb_pending_count(c), 0);

        let calls = captured.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, FfiErrorCode::Ok);
        let payload: serde_json::Value = serde_json::from_str(&calls[0].1).unwrap();
        assert_eq!(payload["totalResult"], 1);
        assert_eq!(payload["result"][0]["id"], "mojito");
        drop(calls);

        addb_free_request(request);
        addb_free_dispatch_result(result);
        addb_drinks_free(q);
        addb_client_free(c);
    }

    #[test]
    fn url_after_load_set_carries_dispatch_parameters() {
        let c = client(Some("app"));
        let q = addb_drinks_new(c, std::ptr::null());
        let result = addb_drinks_load_set(q, Some(record), std::ptr::null_mut());
        let id = read(unsafe { &*result }.callback_id);

        let url = addb_drinks_url(q);
        assert!(read(url).ends_with(&format!("&appId=app&callback={id}")));

        addb_free_string(url);
        addb_free_dispatch_result(result);
        addb_drinks_free(q);
        addb_client_free(c);
    }

    #[test]
    fn null_callback_is_an_argument_error() {
        let c = client(Some("app"));
        let q = addb_drinks_new(c, std::ptr::null());
        let result = addb_drinks_load_set(q, None, std::ptr::null_mut());
        let result_ref = unsafe { &*result };
        assert_eq!(result_ref.error_code, FfiErrorCode::Argument);
        assert!(result_ref.callback_id.is_null());
        assert_eq!(addb_pending_count(c), 0);
        addb_free_dispatch_result(result);
        addb_drinks_free(q);
        addb_client_free(c);
    }

    #[test]
    fn missing_app_id_is_reported_synchronously() {
        let c = client(None);
        let q = addb_drinks_new(c, std::ptr::null());
        let result = addb_drinks_load_set(q, Some(record), std::ptr::null_mut());
        let result_ref = unsafe { &*result };
        assert_eq!(result_ref.error_code, FfiErrorCode::Configuration);
        assert!(!result_ref.error_message.is_null());
        assert!(addb_next_request(c).is_null());
        addb_free_dispatch_result(result);
        addb_drinks_free(q);
        addb_client_free(c);
    }

    #[test]
    fn empty_id_is_an_argument_error() {
        let c = client(Some("app"));
        let q = addb_drinks_new(c, std::ptr::null());
        let id = CString::new("").unwrap();
        let result = addb_drinks_load(q, id.as_ptr(), Some(record), std::ptr::null_mut());
        assert_eq!(unsafe { &*result }.error_code, FfiErrorCode::Argument);
        addb_free_dispatch_result(result);
        addb_drinks_free(q);
        addb_client_free(c);
    }

    #[test]
    fn foreign_body_is_a_payload_error() {
        let captured = Captured {
            calls: Mutex::new(Vec::new()),
        };
        let c = client(Some("app"));
        let q = addb_drinks_new(c, std::ptr::null());
        let result = addb_drinks_load_set(q, Some(record), &captured as *const Captured as *mut c_void);
        let id = CString::new(read(unsafe { &*result }.callback_id)).unwrap();

        let body = CString::new("somethingElse({});").unwrap();
        assert_eq!(addb_deliver(c, id.as_ptr(), body.as_ptr()), FfiErrorCode::Payload);
        assert_eq!(addb_pending_count(c), 1);
        assert!(captured.calls.lock().unwrap().is_empty());

        addb_free_dispatch_result(result);
        addb_drinks_free(q);
        addb_client_free(c);
    }

    #[test]
    fn sweep_without_timeout_is_a_no_op() {
        let c = client(Some("app"));
        let q = addb_drinks_new(c, std::ptr::null());
        let result = addb_drinks_load_set(q, Some(record), std::ptr::null_mut());
        assert_eq!(addb_sweep_expired(c), 0);
        assert_eq!(addb_pending_count(c), 1);
        addb_free_dispatch_result(result);
        addb_drinks_free(q);
        addb_client_free(c);
    }

    #[test]
    fn sweep_fails_expired_requests() {
        let captured = Captured {
            calls: Mutex::new(Vec::new()),
        };
        let host = CString::new("catalog.test").unwrap();
        let app_id = CString::new("app").unwrap();
        let c = addb_client_new(host.as_ptr(), app_id.as_ptr(), true, 1);
        let q = addb_drinks_new(c, std::ptr::null());
        let result = addb_drinks_load_set(q, Some(record), &captured as *const Captured as *mut c_void);

        std::thread::sleep(Duration::from_millis(10));
        assert_eq!(addb_sweep_expired(c), 1);
        let calls = captured.calls.lock().unwrap();
        assert_eq!(calls[0].0, FfiErrorCode::TransportTimeout);
        drop(calls);

        addb_free_dispatch_result(result);
        addb_drinks_free(q);
        addb_client_free(c);
    }
}
