use std::sync::LazyLock;

/// Whole-session lifetime in seconds, measured from `start`.
pub static FLOW_SESSION_TTL: LazyLock<u64> = LazyLock::new(|| {
    std::env::var("FLOW_SESSION_TTL")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(3600)
});

/// Default per-stage timeout in seconds, measured from when the stage's
/// challenge was first issued. Bindings may override it per stage.
pub static FLOW_STAGE_TIMEOUT: LazyLock<i64> = LazyLock::new(|| {
    std::env::var("FLOW_STAGE_TIMEOUT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(600) // 10 minutes
});

/// Raw byte length of generated session tokens before base64url encoding.
pub static FLOW_SESSION_TOKEN_LENGTH: LazyLock<usize> = LazyLock::new(|| {
    std::env::var("FLOW_SESSION_TOKEN_LENGTH")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(32)
});

/// Attempts for transient session store faults. Conflicts are never retried.
pub static FLOW_STORE_MAX_RETRIES: LazyLock<u32> = LazyLock::new(|| {
    std::env::var("FLOW_STORE_MAX_RETRIES")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(3)
});

/// Base delay of the exponential backoff between store retries, in ms.
pub static FLOW_STORE_RETRY_BASE_MS: LazyLock<u64> = LazyLock::new(|| {
    std::env::var("FLOW_STORE_RETRY_BASE_MS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(50)
});
