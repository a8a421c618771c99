//! FFI bindings for SleepGuard
//!
//! This module provides C-compatible functions for calling SleepGuard from the
//! mobile host. All functions use C strings (null-terminated) and return
//! allocated memory that must be freed by the caller using
//! `sleepguard_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use serde::Serialize;

use crate::config::Config;
use crate::pipeline::{reading_to_risk, SleepGuard};
use crate::types::RiskBundle;

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Convert Rust string to C string (caller must free)
fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

/// NULL selects the defaults
unsafe fn config_from_ptr(config_json: *const c_char) -> Result<Config, String> {
    if config_json.is_null() {
        return Ok(Config::default());
    }
    let json = cstr_to_string(config_json).ok_or("Invalid config string pointer")?;
    Config::from_json(&json).map_err(|e| e.to_string())
}

fn respond<T: Serialize>(value: &T) -> *mut c_char {
    match serde_json::to_string(value) {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Stateless API
// ============================================================================

/// Run a reading through the full pipeline and return the action record JSON.
///
/// # Safety
/// - `reading_json` must be a valid null-terminated C string.
/// - `config_json` must be a valid null-terminated C string or NULL for defaults.
/// - Returns a newly allocated string that must be freed with `sleepguard_free_string`.
/// - Returns NULL on error; call `sleepguard_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn sleepguard_assess(
    reading_json: *const c_char,
    config_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let reading = match cstr_to_string(reading_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid reading string pointer");
            return ptr::null_mut();
        }
    };

    let config = match config_from_ptr(config_json) {
        Ok(c) => c,
        Err(e) => {
            set_last_error(&e);
            return ptr::null_mut();
        }
    };

    let result = SleepGuard::from_config(&config).and_then(|guard| guard.process_json(&reading));
    match result {
        Ok(assessment) => respond(&assessment.action),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Compute the risk bundle JSON for a reading. Never touches the network.
///
/// # Safety
/// - `reading_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `sleepguard_free_string`.
/// - Returns NULL on error; call `sleepguard_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn sleepguard_estimate(reading_json: *const c_char) -> *mut c_char {
    clear_last_error();

    let reading = match cstr_to_string(reading_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid reading string pointer");
            return ptr::null_mut();
        }
    };

    match reading_to_risk(reading) {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Decide on an action for a risk bundle JSON using the fallback only.
///
/// # Safety
/// - `bundle_json` must be a valid null-terminated C string.
/// - `config_json` must be a valid null-terminated C string or NULL for defaults.
/// - Returns a newly allocated string that must be freed with `sleepguard_free_string`.
/// - Returns NULL on error; call `sleepguard_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn sleepguard_decide_offline(
    bundle_json: *const c_char,
    config_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let bundle_str = match cstr_to_string(bundle_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid bundle string pointer");
            return ptr::null_mut();
        }
    };

    let bundle: RiskBundle = match serde_json::from_str(&bundle_str) {
        Ok(b) => b,
        Err(e) => {
            set_last_error(&format!("Invalid risk bundle: {}", e));
            return ptr::null_mut();
        }
    };

    let config = match config_from_ptr(config_json) {
        Ok(c) => c,
        Err(e) => {
            set_last_error(&e);
            return ptr::null_mut();
        }
    };

    respond(&SleepGuard::offline(&config).decide_bundle(&bundle))
}

// ============================================================================
// Stateful Processor API
// ============================================================================

/// Opaque handle to a SleepGuard processor
pub struct SleepGuardHandle {
    guard: SleepGuard,
}

/// Create a processor. Non-zero `offline` disables the reasoning service.
///
/// # Safety
/// - `config_json` must be a valid null-terminated C string or NULL for defaults.
/// - Must be freed with `sleepguard_free`.
/// - Returns NULL on error; call `sleepguard_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn sleepguard_new(
    config_json: *const c_char,
    offline: i32,
) -> *mut SleepGuardHandle {
    clear_last_error();

    let config = match config_from_ptr(config_json) {
        Ok(c) => c,
        Err(e) => {
            set_last_error(&e);
            return ptr::null_mut();
        }
    };

    let guard = if offline != 0 {
        SleepGuard::offline(&config)
    } else {
        match SleepGuard::from_config(&config) {
            Ok(g) => g,
            Err(e) => {
                set_last_error(&e.to_string());
                return ptr::null_mut();
            }
        }
    };

    Box::into_raw(Box::new(SleepGuardHandle { guard }))
}

/// Free a processor.
///
/// # Safety
/// - `handle` must be a valid pointer returned by `sleepguard_new`, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn sleepguard_free(handle: *mut SleepGuardHandle) {
    if !handle.is_null() {
        drop(Box::from_raw(handle));
    }
}

/// Run a reading through a processor and return the assessment JSON
/// (`{"risk": ..., "action": ...}`).
///
/// # Safety
/// - `handle` must be a valid pointer returned by `sleepguard_new`.
/// - `reading_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `sleepguard_free_string`.
/// - Returns NULL on error; call `sleepguard_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn sleepguard_process(
    handle: *const SleepGuardHandle,
    reading_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if handle.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }

    let handle = &*handle;

    let reading = match cstr_to_string(reading_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid reading string pointer");
            return ptr::null_mut();
        }
    };

    match handle.guard.process_json(&reading) {
        Ok(assessment) => respond(&assessment),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Decision counters for a processor as JSON.
///
/// # Safety
/// - `handle` must be a valid pointer returned by `sleepguard_new`.
/// - Returns a newly allocated string that must be freed with `sleepguard_free_string`.
#[no_mangle]
pub unsafe extern "C" fn sleepguard_stats(handle: *const SleepGuardHandle) -> *mut c_char {
    clear_last_error();

    if handle.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }

    respond(&(*handle).guard.stats())
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by SleepGuard functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a SleepGuard function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn sleepguard_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Get the last error message.
///
/// # Safety
/// - Returns a pointer to a thread-local error string.
/// - The returned pointer is valid until the next SleepGuard call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn sleepguard_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

// ============================================================================
// Version Information
// ============================================================================

/// Get the SleepGuard library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn sleepguard_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    fn sample_reading() -> CString {
        CString::new(
            r#"{
                "timestamp": "2024-01-15T23:00:00Z",
                "alarm_time": "2024-01-16T07:00:00Z",
                "caffeine_log": [{"mg": 500, "time": "2024-01-15T22:00:00Z"}],
                "screen_total_minutes_last_2hr": 20,
                "brightness_level": 0.2,
                "noise_db_last_5min": 35,
                "sleep_debt_hours": 1.0
            }"#,
        )
        .unwrap()
    }

    unsafe fn take_json(ptr: *mut c_char) -> serde_json::Value {
        assert!(!ptr.is_null());
        let value = serde_json::from_str(CStr::from_ptr(ptr).to_str().unwrap()).unwrap();
        sleepguard_free_string(ptr);
        value
    }

    #[test]
    fn test_ffi_estimate() {
        let reading = sample_reading();
        unsafe {
            let bundle = take_json(sleepguard_estimate(reading.as_ptr()));
            assert!(bundle["remaining_caffeine_mg"].as_f64().unwrap() > 350.0);
            assert_eq!(bundle["time_to_target_sleep"], 8.0);
        }
    }

    #[test]
    fn test_ffi_decide_offline() {
        let bundle = CString::new(
            r#"{"remaining_caffeine_mg":10,"melatonin_suppression_risk":2.0,"noise_disruption_risk":0,"sleep_debt_hours":3.0}"#,
        )
        .unwrap();

        unsafe {
            let record = take_json(sleepguard_decide_offline(bundle.as_ptr(), ptr::null()));
            assert_eq!(record["action"], "DIGITAL_WIND_DOWN");
            assert_eq!(record["source"], "RULE_FALLBACK");
        }
    }

    #[test]
    fn test_ffi_processor_lifecycle() {
        let reading = sample_reading();
        unsafe {
            let handle = sleepguard_new(ptr::null(), 1);
            assert!(!handle.is_null());

            let assessment = take_json(sleepguard_process(handle, reading.as_ptr()));
            // Late 500 mg coffee extends the alarm
            assert_eq!(assessment["action"]["action"], "ADJUST_ALARM");
            assert_eq!(assessment["action"]["value"], "07:30");

            let stats = take_json(sleepguard_stats(handle));
            assert_eq!(stats["decisions"], 1);
            assert_eq!(stats["fallback_decisions"], 1);

            sleepguard_free(handle);
        }
    }

    #[test]
    fn test_ffi_error_handling() {
        unsafe {
            let invalid = CString::new("not json").unwrap();
            let result = sleepguard_assess(invalid.as_ptr(), ptr::null());
            assert!(result.is_null());

            let error = sleepguard_last_error();
            assert!(!error.is_null());
            assert!(!CStr::from_ptr(error).to_str().unwrap().is_empty());

            let bad_config = CString::new(r#"{"arbiter":{"max_attempts":0}}"#).unwrap();
            assert!(sleepguard_new(bad_config.as_ptr(), 1).is_null());
            assert!(!sleepguard_last_error().is_null());

            assert!(sleepguard_process(ptr::null(), invalid.as_ptr()).is_null());
        }
    }

    #[test]
    fn test_ffi_version() {
        unsafe {
            let version = sleepguard_version();
            assert!(!version.is_null());

            let version_str = CStr::from_ptr(version).to_str().unwrap();
            assert_eq!(version_str, crate::SLEEPGUARD_VERSION);
        }
    }
}
