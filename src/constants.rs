/// Source name constants to ensure consistency across the codebase.
/// The lowercase names are what the CLI and config accept; the display
/// names are what ends up in `JavInfo::source`.

// User-friendly source names (used in CLI and config)
pub const FC2_API: &str = "fc2";
pub const JAVLIBRARY_API: &str = "javlibrary";
pub const MISSAV_API: &str = "missav";
pub const TOKYOLIB_API: &str = "tokyolib";

// Display names
pub const FC2_SOURCE: &str = "FC2";
pub const JAVLIBRARY_SOURCE: &str = "JavLibrary";
pub const MISSAV_SOURCE: &str = "MissAV";
pub const TOKYOLIB_SOURCE: &str = "TokyoLib";

// Base domains
pub const FC2_DOMAIN: &str = "https://adult.contents.fc2.com";
pub const JAVLIBRARY_DOMAIN: &str = "https://www.javlibrary.com";
pub const MISSAV_DOMAIN: &str = "https://missav.com";
pub const MISSAV_COVER_DOMAIN: &str = "https://eightcha.com";
pub const TOKYOLIB_DOMAIN: &str = "https://tokyolib.com";

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/77.0.3865.120 Safari/537.36";

/// Get all supported user-friendly source names
pub fn supported_apis() -> Vec<&'static str> {
    vec![JAVLIBRARY_API, MISSAV_API, TOKYOLIB_API, FC2_API]
}
