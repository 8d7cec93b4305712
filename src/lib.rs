use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_void};

// Core modules
pub mod config;
pub mod error;
pub mod logger;
pub mod realtime;
pub mod rest;
pub mod runtime;
pub mod types;

// Re-exports for convenience
pub use config::ClientConfig;
pub use error::{Error, ErrorCode, Result};
pub use logger::{LogCallback, LogLevel};
pub use realtime::{Socket, StreamEvent};
pub use rest::{MemoryTokenRepository, RocketChatClient, TokenRepository};
pub use types::{Attachment, ChatRoom, ConnectionState, Message, Room, RoomType, Subscription, Token, User};

// Library version information
pub const VERSION_MAJOR: u32 = 0;
pub const VERSION_MINOR: u32 = 1;
pub const VERSION_PATCH: u32 = 0;
pub const VERSION_STRING: &str = concat!(env!("CARGO_PKG_VERSION"), " (librocketchat)");

/// Borrow a C string argument
fn str_arg<'a>(ptr: *const c_char) -> Result<&'a str> {
    if ptr.is_null() {
        return Err(Error::null_pointer());
    }
    unsafe { CStr::from_ptr(ptr) }
        .to_str()
        .map_err(|_| Error::invalid_utf8())
}

/// Hand a string to the caller; it must be released with `rocketchat_free_string`
fn into_c_string(s: String) -> *mut c_char {
    match CString::new(s) {
        Ok(c_string) => c_string.into_raw(),
        Err(_) => {
            error::set_last_error(Error::new(ErrorCode::InvalidArgument, "String contains a NUL byte"));
            std::ptr::null_mut()
        }
    }
}

/// Record `e` as the last error and return its code
fn fail(e: Error) -> ErrorCode {
    let code = e.code;
    error::set_last_error(e);
    code
}

/// Map a JSON-producing result onto the FFI string convention (NULL on error)
fn json_result(result: Result<String>) -> *mut c_char {
    match result {
        Ok(json) => into_c_string(json),
        Err(e) => {
            error::set_last_error(e);
            std::ptr::null_mut()
        }
    }
}

/// FFI function: Free a string allocated by this library
#[no_mangle]
pub extern "C" fn rocketchat_free_string(s: *mut c_char) {
    if !s.is_null() {
        unsafe {
            let _ = CString::from_raw(s);
        }
    }
}

// ============================================================================
// Library Initialization Pattern
// ============================================================================

/// FFI function: Initialize the library
/// This should be called once before using any client functions
/// Returns ErrorCode indicating success or failure
#[no_mangle]
pub extern "C" fn rocketchat_init() -> ErrorCode {
    error::clear_last_error();

    match runtime::init_runtime() {
        Ok(()) => ErrorCode::Success,
        Err(e) => fail(e),
    }
}

/// FFI function: Cleanup the library
/// Shuts down the async runtime; open sockets are closed
#[no_mangle]
pub extern "C" fn rocketchat_cleanup() {
    error::clear_last_error();
    runtime::shutdown_runtime();
}

// ============================================================================
// Version Information
// ============================================================================

/// FFI function: Get the library version string
/// Returns a static string, do NOT free this pointer
#[no_mangle]
pub extern "C" fn rocketchat_version() -> *const c_char {
    concat!(env!("CARGO_PKG_VERSION"), " (librocketchat)\0").as_ptr() as *const c_char
}

#[no_mangle]
pub extern "C" fn rocketchat_version_major() -> u32 {
    VERSION_MAJOR
}

#[no_mangle]
pub extern "C" fn rocketchat_version_minor() -> u32 {
    VERSION_MINOR
}

#[no_mangle]
pub extern "C" fn rocketchat_version_patch() -> u32 {
    VERSION_PATCH
}

// ============================================================================
// Error Handling FFI
// ============================================================================

/// FFI function: Get the error code of the last error
/// Returns ErrorCode::Success (0) if no error has occurred
#[no_mangle]
pub extern "C" fn rocketchat_last_error_code() -> ErrorCode {
    error::get_last_error()
        .map(|e| e.code)
        .unwrap_or(ErrorCode::Success)
}

/// FFI function: Get the error message of the last error
/// Returns a dynamically allocated string that must be freed with rocketchat_free_string()
/// Returns NULL if no error has occurred
#[no_mangle]
pub extern "C" fn rocketchat_last_error_message() -> *mut c_char {
    match error::get_last_error() {
        Some(e) => CString::new(e.message)
            .map(CString::into_raw)
            .unwrap_or(std::ptr::null_mut()),
        None => std::ptr::null_mut(),
    }
}

/// FFI function: Get a human-readable description of an error code
/// Returns a static string, do NOT free this pointer
#[no_mangle]
pub extern "C" fn rocketchat_error_code_string(code: ErrorCode) -> *const c_char {
    let s = match code {
        ErrorCode::Success => "Success\0",
        ErrorCode::Unknown => "Unknown error\0",
        ErrorCode::InvalidArgument => "Invalid argument\0",
        ErrorCode::NullPointer => "Null pointer\0",
        ErrorCode::OutOfMemory => "Out of memory\0",
        ErrorCode::InvalidUtf8 => "Invalid UTF-8 string\0",
        ErrorCode::NetworkError => "Network error\0",
        ErrorCode::AuthenticationFailed => "Authentication failed\0",
        ErrorCode::NotFound => "Not found\0",
        ErrorCode::PermissionDenied => "Permission denied\0",
        ErrorCode::Timeout => "Timeout\0",
        ErrorCode::InvalidState => "Invalid state\0",
        ErrorCode::RateLimited => "Rate limited\0",
        ErrorCode::ParseError => "Parse error\0",
    };
    s.as_ptr() as *const c_char
}

/// FFI function: Clear the last error
#[no_mangle]
pub extern "C" fn rocketchat_clear_error() {
    error::clear_last_error();
}

// ============================================================================
// Logging
// ============================================================================

/// FFI function: Forward library log records at `level` and above to `callback`
/// `user_data` is passed back untouched and must stay valid until the callback is cleared
#[no_mangle]
pub extern "C" fn rocketchat_set_log_callback(
    callback: LogCallback,
    user_data: *mut c_void,
    level: LogLevel,
) -> ErrorCode {
    error::clear_last_error();

    let max_level = match level {
        LogLevel::Debug => log::LevelFilter::Debug,
        LogLevel::Info => log::LevelFilter::Info,
        LogLevel::Warning => log::LevelFilter::Warn,
        LogLevel::Error => log::LevelFilter::Error,
    };
    logger::set_callback(callback, user_data, max_level);
    ErrorCode::Success
}

/// FFI function: Stop forwarding log records
#[no_mangle]
pub extern "C" fn rocketchat_clear_log_callback() {
    logger::clear_callback();
}

// ============================================================================
// Codec FFI
// ============================================================================

fn normalize_attachment(json: &str) -> Result<String> {
    let attachment = types::attachment::decode_attachment(json)?;
    types::attachment::encode_attachment(attachment.as_ref())
}

fn normalize_message(json: &str) -> Result<String> {
    let message: Message = serde_json::from_str(json)?;
    Ok(serde_json::to_string(&message)?)
}

/// FFI function: Decode one attachment and re-encode it in canonical form
/// Returns "null" when the object matches no attachment shape
/// The caller must free the returned string using rocketchat_free_string()
/// Returns NULL on error (ParseError for malformed input or missing required fields)
#[no_mangle]
pub extern "C" fn rocketchat_attachment_normalize(json: *const c_char) -> *mut c_char {
    error::clear_last_error();
    json_result(str_arg(json).and_then(normalize_attachment))
}

/// FFI function: Parse a message object (REST or stream shape) and return it in canonical form
/// Timestamps come back as epoch milliseconds; attachments as their canonical encoding
/// The caller must free the returned string using rocketchat_free_string()
/// Returns NULL on error
#[no_mangle]
pub extern "C" fn rocketchat_message_parse(json: *const c_char) -> *mut c_char {
    error::clear_last_error();
    json_result(str_arg(json).and_then(normalize_message))
}

// ============================================================================
// Client FFI - Opaque Handle Pattern
// ============================================================================

/// Opaque handle to a RocketChatClient
pub type ClientHandle = *mut RocketChatClient;

/// FFI function: Create a client for a server
/// The handle must be freed with rocketchat_client_destroy()
/// Returns NULL on error
#[no_mangle]
pub extern "C" fn rocketchat_client_create(server_url: *const c_char) -> ClientHandle {
    error::clear_last_error();

    let url = match str_arg(server_url) {
        Ok(url) => url,
        Err(e) => {
            error::set_last_error(e);
            return std::ptr::null_mut();
        }
    };

    match RocketChatClient::new(ClientConfig::new(url)) {
        Ok(client) => Box::into_raw(Box::new(client)),
        Err(e) => {
            error::set_last_error(e);
            std::ptr::null_mut()
        }
    }
}

/// FFI function: Login with username and password
/// Returns ErrorCode indicating success or failure
#[no_mangle]
pub extern "C" fn rocketchat_client_login(
    handle: ClientHandle,
    username: *const c_char,
    password: *const c_char,
) -> ErrorCode {
    error::clear_last_error();

    if handle.is_null() {
        return fail(Error::null_pointer());
    }
    let (username, password) = match (str_arg(username), str_arg(password)) {
        (Ok(u), Ok(p)) => (u, p),
        (Err(e), _) | (_, Err(e)) => return fail(e),
    };

    let client = unsafe { &*handle };
    match runtime::block_on(client.login(username, password, None)).and_then(|r| r) {
        Ok(_) => ErrorCode::Success,
        Err(e) => fail(e),
    }
}

/// FFI function: Resume a session with a stored user id and auth token
/// Returns ErrorCode indicating success or failure
#[no_mangle]
pub extern "C" fn rocketchat_client_login_with_token(
    handle: ClientHandle,
    user_id: *const c_char,
    auth_token: *const c_char,
) -> ErrorCode {
    error::clear_last_error();

    if handle.is_null() {
        return fail(Error::null_pointer());
    }
    let token = match (str_arg(user_id), str_arg(auth_token)) {
        (Ok(u), Ok(t)) => Token::new(u, t),
        (Err(e), _) | (_, Err(e)) => return fail(e),
    };

    let client = unsafe { &*handle };
    match runtime::block_on(client.login_with_token(token)).and_then(|r| r) {
        Ok(_) => ErrorCode::Success,
        Err(e) => fail(e),
    }
}

/// FFI function: Logout and drop the stored token
#[no_mangle]
pub extern "C" fn rocketchat_client_logout(handle: ClientHandle) -> ErrorCode {
    error::clear_last_error();

    if handle.is_null() {
        return fail(Error::null_pointer());
    }

    let client = unsafe { &*handle };
    match runtime::block_on(client.logout()).and_then(|r| r) {
        Ok(()) => ErrorCode::Success,
        Err(e) => fail(e),
    }
}

/// FFI function: Send a text message to a room
/// Returns a JSON string representing the created Message
/// The caller must free the returned string using rocketchat_free_string()
/// Returns NULL on error
#[no_mangle]
pub extern "C" fn rocketchat_client_send_message(
    handle: ClientHandle,
    room_id: *const c_char,
    text: *const c_char,
) -> *mut c_char {
    error::clear_last_error();

    if handle.is_null() {
        error::set_last_error(Error::null_pointer());
        return std::ptr::null_mut();
    }
    let client = unsafe { &*handle };

    json_result((|| {
        let payload = rest::SendMessagePayload::new(str_arg(room_id)?, str_arg(text)?);
        let message = runtime::block_on(client.send_message(&payload))??;
        Ok(serde_json::to_string(&message)?)
    })())
}

/// FFI function: Fetch the latest messages of a room
/// `room_type` is the one-letter room type ("c", "p", "d" or "l")
/// Returns a JSON array of Message objects, newest first
/// The caller must free the returned string using rocketchat_free_string()
/// Returns NULL on error
#[no_mangle]
pub extern "C" fn rocketchat_client_history(
    handle: ClientHandle,
    room_id: *const c_char,
    room_type: *const c_char,
    count: u32,
) -> *mut c_char {
    error::clear_last_error();

    if handle.is_null() {
        error::set_last_error(Error::null_pointer());
        return std::ptr::null_mut();
    }
    let client = unsafe { &*handle };

    json_result((|| {
        let room_id = str_arg(room_id)?;
        let room_type = parse_room_type(str_arg(room_type)?)?;
        let messages = runtime::block_on(client.history(room_id, room_type, count, None))??;
        Ok(serde_json::to_string(&messages)?)
    })())
}

fn parse_room_type(s: &str) -> Result<RoomType> {
    serde_json::from_value(serde_json::Value::String(s.to_string()))
        .map_err(|_| Error::invalid_argument(format!("Unknown room type: {s}")))
}

/// FFI function: Destroy a client and free its memory
/// After calling this, the handle is invalid and must not be used
#[no_mangle]
pub extern "C" fn rocketchat_client_destroy(handle: ClientHandle) {
    if !handle.is_null() {
        unsafe {
            let _ = Box::from_raw(handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c_string(s: &str) -> CString {
        CString::new(s).unwrap()
    }

    /// Take ownership of a string returned by the library
    fn take(ptr: *mut c_char) -> String {
        assert!(!ptr.is_null());
        let s = unsafe { CStr::from_ptr(ptr) }.to_str().unwrap().to_string();
        rocketchat_free_string(ptr);
        s
    }

    #[test]
    fn test_version() {
        assert_eq!(rocketchat_version_major(), VERSION_MAJOR);
        let version = unsafe { CStr::from_ptr(rocketchat_version()) }.to_str().unwrap();
        assert!(version.ends_with("(librocketchat)"));
    }

    #[test]
    fn test_error_code_strings() {
        let s = unsafe { CStr::from_ptr(rocketchat_error_code_string(ErrorCode::ParseError)) };
        assert_eq!(s.to_str().unwrap(), "Parse error");
        let s = unsafe { CStr::from_ptr(rocketchat_error_code_string(ErrorCode::RateLimited)) };
        assert_eq!(s.to_str().unwrap(), "Rate limited");
    }

    #[test]
    fn test_free_null_string() {
        rocketchat_free_string(std::ptr::null_mut());
    }

    #[test]
    fn test_normalize_image_attachment() {
        let input = c_string(
            r#"{"title":"a.png","image_url":"/file-upload/a.png","image_type":"image/png","image_size":10,
                "image_preview":"AAAA","unknown":{"nested":[1,2]}}"#,
        );
        let out: serde_json::Value = serde_json::from_str(&take(rocketchat_attachment_normalize(input.as_ptr()))).unwrap();
        assert_eq!(out["image_url"], "/file-upload/a.png");
        assert_eq!(out["image_preview"], "AAAA");
        assert_eq!(out["title_link_download"], false);
        assert!(out.get("unknown").is_none());
    }

    #[test]
    fn test_normalize_unmatched_attachment() {
        let input = c_string(r#"{"title":"only a title"}"#);
        assert_eq!(take(rocketchat_attachment_normalize(input.as_ptr())), "null");
    }

    #[test]
    fn test_normalize_rejects_incomplete_video() {
        let input = c_string(r#"{"video_url":"/v.mp4","video_size":1}"#);
        assert!(rocketchat_attachment_normalize(input.as_ptr()).is_null());
    }

    #[test]
    fn test_normalize_null_pointer() {
        assert!(rocketchat_attachment_normalize(std::ptr::null()).is_null());
    }

    #[test]
    fn test_message_parse() {
        let input = c_string(
            r#"{"_id":"m1","rid":"GENERAL","msg":"hi","ts":"2017-11-23T13:32:44.798Z",
                "attachments":[{"text":"quoted","ts":{"$date":1511443964798}}, null]}"#,
        );
        let out: serde_json::Value = serde_json::from_str(&take(rocketchat_message_parse(input.as_ptr()))).unwrap();
        assert_eq!(out["ts"], 1511443964798i64);
        assert_eq!(out["attachments"].as_array().unwrap().len(), 1);
        assert_eq!(out["attachments"][0]["text"], "quoted");
    }

    #[test]
    fn test_message_parse_malformed() {
        let input = c_string("{not json");
        assert!(rocketchat_message_parse(input.as_ptr()).is_null());
    }

    #[test]
    fn test_client_lifecycle() {
        let url = c_string("https://chat.example.com");
        let handle = rocketchat_client_create(url.as_ptr());
        assert!(!handle.is_null());
        rocketchat_client_destroy(handle);
    }

    #[test]
    fn test_client_create_invalid_url() {
        let url = c_string("ftp://chat.example.com");
        assert!(rocketchat_client_create(url.as_ptr()).is_null());
    }

    #[test]
    fn test_client_null_handle() {
        let user = c_string("user");
        assert_eq!(
            rocketchat_client_login(std::ptr::null_mut(), user.as_ptr(), user.as_ptr()),
            ErrorCode::NullPointer
        );
        assert_eq!(rocketchat_client_logout(std::ptr::null_mut()), ErrorCode::NullPointer);
    }

    #[test]
    fn test_parse_room_type() {
        assert_eq!(parse_room_type("p").unwrap(), RoomType::PrivateGroup);
        assert_eq!(parse_room_type("x").unwrap_err().code, ErrorCode::InvalidArgument);
    }
}
