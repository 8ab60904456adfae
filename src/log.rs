//! Console logging
//!
//! Thin macros over `web_sys::console`. Off-wasm they compile to nothing, so
//! the pipeline can be exercised by native tests without touching JS imports.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
}

/// Write one line to the browser console.
#[cfg(target_arch = "wasm32")]
pub fn write(level: Level, message: &str) {
    let value = wasm_bindgen::JsValue::from_str(message);
    match level {
        Level::Debug => {
            if cfg!(debug_assertions) {
                web_sys::console::debug_1(&value);
            }
        }
        Level::Info => web_sys::console::log_1(&value),
        Level::Warn => web_sys::console::warn_1(&value),
        Level::Error => web_sys::console::error_1(&value),
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub fn write(_level: Level, _message: &str) {}

#[macro_export]
macro_rules! console_debug {
    ($($arg:tt)*) => {
        $crate::log::write($crate::log::Level::Debug, &format!($($arg)*))
    };
}

#[macro_export]
macro_rules! console_log {
    ($($arg:tt)*) => {
        $crate::log::write($crate::log::Level::Info, &format!($($arg)*))
    };
}

#[macro_export]
macro_rules! console_warn {
    ($($arg:tt)*) => {
        $crate::log::write($crate::log::Level::Warn, &format!($($arg)*))
    };
}

#[macro_export]
macro_rules! console_error {
    ($($arg:tt)*) => {
        $crate::log::write($crate::log::Level::Error, &format!($($arg)*))
    };
}
