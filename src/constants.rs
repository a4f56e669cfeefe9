// src/constants.rs

/// Name of the profile that always exists and is selected when nothing else is.
pub const DEFAULT_PROFILE: &str = "Default";

/// Sub-namespace of the persisted root holding the profile tables.
pub const PROFILES_KEY: &str = "profiles";

/// Sub-namespace of the persisted root holding the shared global table.
pub const GLOBAL_KEY: &str = "global";

/// Sub-namespace of the persisted root mapping identity keys to profile names.
pub const PROFILE_KEYS_KEY: &str = "profileKeys";

/// Sub-namespace of the persisted root recording one-time seeded paths.
pub const APPENDED_KEY: &str = "appended";

/// Top-level key of the defaults tree applying to the global table.
pub const DEFAULTS_GLOBAL: &str = "global";

/// Top-level key of the defaults tree applying to every profile table.
pub const DEFAULTS_PROFILE: &str = "profile";

/// Upper bound on parent links walked while checking a binding for cycles.
pub const MAX_PARENT_DEPTH: usize = 64;

/// Name of the application directory inside the system config directory.
pub const APP_DIR_NAME: &str = "tierdb";

/// Extension of the files written by the file storage backend.
pub const STORE_FILE_EXTENSION: &str = "bin";
