//! Shared constants used across the application.

use crate::location::Coordinates;

/// User agent sent with every backend request.
pub const CLIENT_USER_AGENT: &str = concat!("trashtag-lka/", env!("CARGO_PKG_VERSION"));

/// Object storage bucket holding post photos.
pub const DEFAULT_STORAGE_BUCKET: &str = "post-images";

/// Deep link the OAuth provider redirects back to.
pub const DEFAULT_OAUTH_REDIRECT: &str = "trashtaglka://";

/// Colombo city centre; default map centre and jitter origin.
pub const REFERENCE_POINT: Coordinates = Coordinates {
    latitude: 6.9271,
    longitude: 79.8612,
};

/// Base for generated placeholder images.
pub const PLACEHOLDER_BASE: &str = "https://via.placeholder.com";

/// Display name used when a profile has no name.
pub const ANONYMOUS_NAME: &str = "Anonymous User";

/// Longest comment accepted by the comments screen.
pub const MAX_COMMENT_CHARS: usize = 500;

/// Hashtags offered on the create-post screen.
pub const SUGGESTED_HASHTAGS: [&str; 5] = [
    "#TrashTagLKA",
    "#CleanSriLanka",
    "#BeforeAfter",
    "#EnvironmentalCleanup",
    "#MakeADifference",
];
