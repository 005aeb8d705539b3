//! Default configuration values

use crate::foundation::constants::*;

pub struct HttpDefaults;

impl HttpDefaults {
    pub const HOST: &'static str = DEFAULT_HOST;
    pub const PORT: u16 = DEFAULT_PORT;
    pub const MAX_REQUEST_SIZE: usize = DEFAULT_MAX_REQUEST_SIZE;
    pub const SHUTDOWN_TIMEOUT_SECS: u64 = DEFAULT_SHUTDOWN_TIMEOUT_SECS;
}
