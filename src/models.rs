//! Backend rows and the view models screens render.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{ANONYMOUS_NAME, PLACEHOLDER_BASE};
use crate::location::{CoordinateSource, Coordinates, LocationType};

/// Column list for posts joined with their author's profile.
pub const POST_WITH_AUTHOR: &str = "*,profiles:user_id(name,avatar_url)";

/// Column list for comments joined with their author's profile.
pub const COMMENT_WITH_AUTHOR: &str = "*,profiles:user_id(name,avatar_url)";

/// Column list for map posts, which only need the author name.
pub const POST_WITH_AUTHOR_NAME: &str = "*,profiles:user_id(name)";

/// Avatar placeholder sizes, in pixels.
pub mod avatar_size {
    pub const FEED: u32 = 50;
    pub const COMMENT: u32 = 40;
    pub const PROFILE: u32 = 100;
}

/// Profile fields embedded in post and comment rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorSummary {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// A row of `posts`, optionally with the joined author profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostRow {
    pub id: String,
    pub user_id: String,
    pub image_url: String,
    #[serde(default)]
    pub caption: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub hashtags: Vec<String>,
    #[serde(default)]
    pub likes_count: u32,
    #[serde(default)]
    pub comments_count: u32,
    #[serde(default)]
    pub is_before_photo: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub profiles: Option<AuthorSummary>,
}

/// A row of `comments`, optionally with the joined author profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentRow {
    pub id: String,
    pub post_id: String,
    pub user_id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub profiles: Option<AuthorSummary>,
}

/// A row of `post_likes` as read by the feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostLikeRow {
    pub post_id: String,
}

/// A row of `profiles`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRow {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub crew: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub total_cleanups: u32,
    #[serde(default)]
    pub total_likes: u32,
    #[serde(default)]
    pub total_points: u32,
    #[serde(default)]
    pub rank: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewPost {
    pub user_id: String,
    pub image_url: String,
    pub caption: String,
    pub location: String,
    pub hashtags: Vec<String>,
    pub is_before_photo: bool,
    pub likes_count: u32,
    pub comments_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewComment {
    pub post_id: String,
    pub user_id: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewPostLike {
    pub post_id: String,
    pub user_id: String,
}

/// Profile fields written by onboarding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileUpsert {
    pub id: String,
    pub name: String,
    pub city: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crew: Option<String>,
}

/// Generated placeholder avatar showing the first letter of `name`.
#[must_use]
pub fn placeholder_avatar(name: Option<&str>, size: u32) -> String {
    let initial = name
        .and_then(|n| n.trim().chars().next())
        .map_or_else(|| "U".to_string(), |c| c.to_uppercase().to_string());
    format!("{PLACEHOLDER_BASE}/{size}x{size}/ffd300/000?text={}", urlencoding::encode(&initial))
}

/// Display name and avatar for the author of a post or comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Author {
    pub name: String,
    pub avatar_url: String,
}

impl Author {
    /// Resolve display fields from a joined profile, substituting the
    /// anonymous name and a generated avatar for missing values.
    #[must_use]
    pub fn from_profile(profile: Option<&AuthorSummary>, avatar_size: u32) -> Self {
        let name = profile
            .and_then(|p| p.name.as_deref())
            .filter(|n| !n.trim().is_empty());
        let avatar_url = profile
            .and_then(|p| p.avatar_url.clone())
            .filter(|a| !a.trim().is_empty())
            .unwrap_or_else(|| placeholder_avatar(name, avatar_size));

        Self {
            name: name.unwrap_or(ANONYMOUS_NAME).to_string(),
            avatar_url,
        }
    }
}

/// A post card in the feed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedPost {
    pub id: String,
    pub user_id: String,
    pub author: Author,
    pub image_url: String,
    pub caption: String,
    pub location: String,
    pub hashtags: Vec<String>,
    pub likes_count: u32,
    pub comments_count: u32,
    pub is_before_photo: bool,
    pub created_at: DateTime<Utc>,
    pub user_has_liked: bool,
}

impl FeedPost {
    #[must_use]
    pub fn from_row(row: PostRow, user_has_liked: bool) -> Self {
        let author = Author::from_profile(row.profiles.as_ref(), avatar_size::FEED);
        Self {
            id: row.id,
            user_id: row.user_id,
            author,
            image_url: row.image_url,
            caption: row.caption,
            location: row.location.unwrap_or_default(),
            hashtags: row.hashtags,
            likes_count: row.likes_count,
            comments_count: row.comments_count,
            is_before_photo: row.is_before_photo,
            created_at: row.created_at,
            user_has_liked,
        }
    }

    /// Flip the liked flag and adjust the counter. Returns the new flag.
    pub fn toggle_like(&mut self) -> bool {
        self.user_has_liked = !self.user_has_liked;
        if self.user_has_liked {
            self.likes_count = self.likes_count.saturating_add(1);
        } else {
            self.likes_count = self.likes_count.saturating_sub(1);
        }
        self.user_has_liked
    }

    /// Badge shown over the photo.
    #[must_use]
    pub fn badge(&self) -> &'static str {
        photo_badge(self.is_before_photo)
    }
}

#[must_use]
pub fn photo_badge(is_before_photo: bool) -> &'static str {
    if is_before_photo {
        "BEFORE"
    } else {
        "AFTER"
    }
}

/// A comment row on the comments screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentView {
    pub id: String,
    pub post_id: String,
    pub user_id: String,
    pub author: Author,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl From<CommentRow> for CommentView {
    fn from(row: CommentRow) -> Self {
        let author = Author::from_profile(row.profiles.as_ref(), avatar_size::COMMENT);
        Self {
            id: row.id,
            post_id: row.post_id,
            user_id: row.user_id,
            author,
            content: row.content,
            created_at: row.created_at,
        }
    }
}

/// Post header on the comments screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostPreview {
    pub id: String,
    pub image_url: String,
    pub caption: String,
    pub location: String,
    pub comments_count: u32,
}

impl From<PostRow> for PostPreview {
    fn from(row: PostRow) -> Self {
        Self {
            id: row.id,
            image_url: row.image_url,
            caption: row.caption,
            location: row.location.unwrap_or_default(),
            comments_count: row.comments_count,
        }
    }
}

/// A pin on the cleanup map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CleanupLocation {
    pub id: String,
    pub name: String,
    pub kind: LocationType,
    pub coordinates: Coordinates,
    pub coordinate_source: CoordinateSource,
    pub description: String,
    pub photos: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub contributor: String,
}

/// Period a challenge runs over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChallengePeriod {
    Daily,
    Weekly,
    Monthly,
}

impl ChallengePeriod {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }
}

/// Share of `progress` towards `target`, as a percentage capped at 100.
#[must_use]
pub fn progress_percent(progress: u32, target: u32) -> f64 {
    if target == 0 {
        return 100.0;
    }
    (f64::from(progress) / f64::from(target) * 100.0).min(100.0)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Challenge {
    pub id: String,
    pub title: String,
    pub description: String,
    pub icon: String,
    pub progress: u32,
    pub target: u32,
    pub reward: String,
    pub reward_icon: String,
    pub deadline: String,
    pub period: ChallengePeriod,
}

impl Challenge {
    #[must_use]
    pub fn progress_percent(&self) -> f64 {
        progress_percent(self.progress, self.target)
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.progress >= self.target
    }

    /// "progress/target" label under the bar.
    #[must_use]
    pub fn progress_label(&self) -> String {
        format!("{}/{}", self.progress, self.target)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub name: String,
    pub avatar_url: String,
    pub points: u32,
    pub cleanups: u32,
}

impl LeaderboardEntry {
    #[must_use]
    pub fn summary(&self) -> String {
        format!("{} cleanups • {} points", self.cleanups, self.points)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reward {
    pub id: String,
    pub title: String,
    pub icon: String,
    pub unlocked: bool,
    pub points: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Achievement {
    pub id: String,
    pub title: String,
    pub description: String,
    pub icon: String,
    pub unlocked: bool,
    pub progress: u32,
    pub max_progress: u32,
}

impl Achievement {
    #[must_use]
    pub fn progress_percent(&self) -> f64 {
        progress_percent(self.progress, self.max_progress)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CleanupHistoryEntry {
    pub id: String,
    pub before_photo: String,
    pub after_photo: String,
    pub location: String,
    pub when: String,
    pub likes: u32,
}

/// The profile screen header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileView {
    pub id: String,
    pub name: String,
    pub avatar_url: String,
    pub city: String,
    pub crew: Option<String>,
    pub join_date: String,
    pub total_cleanups: u32,
    pub total_likes: u32,
    pub total_points: u32,
    pub rank: String,
}

impl From<ProfileRow> for ProfileView {
    fn from(row: ProfileRow) -> Self {
        let name = row.name.filter(|n| !n.trim().is_empty());
        let avatar_url = row
            .avatar_url
            .filter(|a| !a.trim().is_empty())
            .unwrap_or_else(|| placeholder_avatar(name.as_deref(), avatar_size::PROFILE));
        Self {
            id: row.id,
            name: name.unwrap_or_else(|| ANONYMOUS_NAME.to_string()),
            avatar_url,
            city: row.city.unwrap_or_default(),
            crew: row.crew.filter(|c| !c.trim().is_empty()),
            join_date: row
                .created_at
                .map(|ts| ts.format("%B %Y").to_string())
                .unwrap_or_default(),
            total_cleanups: row.total_cleanups,
            total_likes: row.total_likes,
            total_points: row.total_points,
            rank: row.rank.unwrap_or_else(|| "New Cleaner".to_string()),
        }
    }
}
