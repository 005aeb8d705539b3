pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_MAX_REQUEST_SIZE: usize = 16 * 1024 * 1024; // 16MB
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 10;

pub const HEADER_ALLOW: &str = "allow";
pub const CONTENT_TYPE_JSON: &str = "application/json";
pub const CONTENT_TYPE_TEXT: &str = "text/plain; charset=utf-8";
pub const CONTENT_TYPE_HTML: &str = "text/html; charset=utf-8";
