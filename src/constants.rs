/// Platform name constants to ensure consistency across the codebase.
/// These are the keys of the `[platforms.*]` tables in the configuration file.
pub const FACEBOOK: &str = "facebook";
pub const INSTAGRAM: &str = "instagram";
pub const TWITTER: &str = "twitter";
pub const YOUTUBE: &str = "youtube";

/// Cell values that mean "no data was collected" in the source sheets.
/// Compared case-insensitively after trimming.
pub const SENTINEL_TOKENS: [&str; 3] = ["-", "S", "S/"];

/// Path segment some profile links put before the actual handle,
/// e.g. `https://www.facebook.com/pg/<handle>/about`.
pub const PROFILE_PAGE_MARKER: &str = "pg";

/// Time of day attached to every history date (UTC).
pub const DEFAULT_HISTORY_TIME: &str = "02:00:00";

pub const DEFAULT_CONFIG_PATH: &str = "observatory.toml";
pub const DEFAULT_DB_PATH: &str = "observatory.db";

pub const CONFIG_PATH_ENV: &str = "OBSERVATORY_CONFIG";
pub const DB_PATH_ENV: &str = "OBSERVATORY_DB";

/// Get all supported platform names
pub fn get_supported_platforms() -> Vec<&'static str> {
    vec![FACEBOOK, INSTAGRAM, TWITTER, YOUTUBE]
}
