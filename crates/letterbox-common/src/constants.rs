//! Shared constants for Letterbox components.

/// Default HTTP listen address
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8787";

/// Default base URL the admin client talks to
pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8787";

/// Cloudflare Turnstile verification endpoint
pub const DEFAULT_CAPTCHA_VERIFY_URL: &str =
    "https://challenges.cloudflare.com/turnstile/v0/siteverify";

/// Name length bounds (characters, inclusive)
pub const NAME_MIN_CHARS: usize = 2;
pub const NAME_MAX_CHARS: usize = 80;

/// Maximum email length (characters)
pub const EMAIL_MAX_CHARS: usize = 160;

/// Message length bounds (characters, inclusive)
pub const MESSAGE_MIN_CHARS: usize = 3;
pub const MESSAGE_MAX_CHARS: usize = 2000;

/// Minimum spacing between two admitted submissions from one IP (8 seconds)
pub const BURST_INTERVAL_SECS: u64 = 8;

/// Maximum admitted submissions per IP inside the sliding window
pub const HOURLY_REQUEST_CAP: usize = 20;

/// Sliding window length for the volume limit (1 hour)
pub const RATE_WINDOW_SECS: u64 = 3600;

/// Default and maximum page size of the admin listing
pub const DEFAULT_LIST_LIMIT: usize = 50;
pub const MAX_LIST_LIMIT: usize = 50;

/// Longest pathname accepted by the seen toggle
pub const MAX_PATHNAME_CHARS: usize = 200;

/// Messages longer than this are truncated in the inbox view
pub const PREVIEW_CHARS: usize = 240;

/// Envelope format version and algorithm tag
pub const ENVELOPE_VERSION: u8 = 1;
pub const ENVELOPE_ALG: &str = "A256GCM";

/// Blob store key prefixes
pub mod blob_keys {
    /// Encrypted contact records: contacts/{timestamp}-{random}.json
    pub const CONTACTS_PREFIX: &str = "contacts/";

    /// Seen markers: seen/{sha256(pathname)}.json
    pub const SEEN_PREFIX: &str = "seen/";

    /// Suffix of every stored object
    pub const JSON_SUFFIX: &str = ".json";
}

/// HTTP header names
pub mod headers {
    /// Shared admin secret
    pub const X_ADMIN_KEY: &str = "x-admin-key";

    /// Client address chain set by proxies
    pub const X_FORWARDED_FOR: &str = "x-forwarded-for";

    /// Single client address set by some proxies
    pub const X_REAL_IP: &str = "x-real-ip";

    /// Blob service overwrite switch
    pub const X_ALLOW_OVERWRITE: &str = "x-allow-overwrite";
}
