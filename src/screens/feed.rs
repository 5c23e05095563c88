//! The post feed: newest cleanups, likes and sharing.

use std::collections::HashSet;

use serde_json::json;
use tracing::{debug, error, info, warn};

use super::{AppContext, DataSource, ScreenScope};
use crate::error::{ActionError, ReadError};
use crate::fallback;
use crate::gateway::{fetch_rows, tables, to_row, Direction, Filter, GatewayError, Query};
use crate::models::{FeedPost, NewPostLike, PostLikeRow, PostRow, POST_WITH_AUTHOR};
use crate::navigation::{Route, Tab};
use crate::timefmt::time_ago;

/// Payload for the platform share sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareContent {
    pub message: String,
    pub url: String,
}

/// Build the share-sheet text for a post.
#[must_use]
pub fn share_content(post: &FeedPost) -> ShareContent {
    ShareContent {
        message: format!(
            "Check out this amazing cleanup by {}!\n\n\"{}\"\n\nLocation: {}\n\n#TrashTagLKA #CleanSriLanka",
            post.author.name, post.caption, post.location
        ),
        url: post.image_url.clone(),
    }
}

/// Fetch the newest posts with authors and the viewer's likes.
///
/// # Errors
///
/// Returns the gateway error if the posts query fails. A failed likes
/// lookup only loses the liked flags.
pub async fn fetch_feed(ctx: &AppContext) -> Result<Vec<FeedPost>, GatewayError> {
    let query = Query::from(tables::POSTS)
        .select(POST_WITH_AUTHOR)
        .order("created_at", Direction::Descending)
        .limit(ctx.config.feed_page_size);
    let rows: Vec<PostRow> = fetch_rows(ctx.gateway.as_ref(), &query).await?;

    let liked = match ctx.session_user().await {
        Some(user) => {
            let query = Query::from(tables::POST_LIKES)
                .select("post_id")
                .eq("user_id", user.id.as_str());
            match fetch_rows::<PostLikeRow>(ctx.gateway.as_ref(), &query).await {
                Ok(likes) => likes.into_iter().map(|l| l.post_id).collect(),
                Err(e) => {
                    warn!(error = %e, "Failed to load liked posts");
                    HashSet::new()
                }
            }
        }
        None => HashSet::new(),
    };

    debug!(count = rows.len(), liked = liked.len(), "Fetched feed");

    Ok(rows
        .into_iter()
        .map(|row| {
            let has_liked = liked.contains(&row.id);
            FeedPost::from_row(row, has_liked)
        })
        .collect())
}

pub struct FeedScreen {
    ctx: AppContext,
    scope: ScreenScope,
    posts: Vec<FeedPost>,
    source: Option<DataSource>,
    loading: bool,
    refreshing: bool,
}

impl FeedScreen {
    #[must_use]
    pub fn new(ctx: AppContext) -> Self {
        Self {
            ctx,
            scope: ScreenScope::new(),
            posts: Vec::new(),
            source: None,
            loading: false,
            refreshing: false,
        }
    }

    #[must_use]
    pub fn scope(&self) -> &ScreenScope {
        &self.scope
    }

    #[must_use]
    pub fn posts(&self) -> &[FeedPost] {
        &self.posts
    }

    #[must_use]
    pub fn post(&self, post_id: &str) -> Option<&FeedPost> {
        self.posts.iter().find(|p| p.id == post_id)
    }

    #[must_use]
    pub fn source(&self) -> Option<DataSource> {
        self.source
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    #[must_use]
    pub fn is_refreshing(&self) -> bool {
        self.refreshing
    }

    /// Whether the "No posts yet" state should show.
    #[must_use]
    pub fn shows_empty_state(&self) -> bool {
        self.posts.is_empty() && !self.loading
    }

    /// Load the feed, replacing whatever is on screen.
    ///
    /// # Errors
    ///
    /// Returns `ReadError` only when the fetch fails with demo mode off.
    pub async fn load(&mut self) -> Result<(), ReadError> {
        self.loading = true;
        let now = self.ctx.now();
        let result = fetch_feed(&self.ctx).await;

        if !self.scope.is_mounted() {
            debug!("Feed unmounted before posts arrived, dropping result");
            return Ok(());
        }

        self.loading = false;
        self.refreshing = false;

        let loaded = self
            .ctx
            .read_policy()
            .resolve("posts", result, || fallback::feed_posts(now))?;
        self.posts = loaded.data;
        self.source = Some(loaded.source);
        Ok(())
    }

    /// Pull-to-refresh.
    ///
    /// # Errors
    ///
    /// See [`FeedScreen::load`].
    pub async fn refresh(&mut self) -> Result<(), ReadError> {
        self.refreshing = true;
        self.load().await
    }

    /// Like or unlike a post. Returns the new liked flag.
    ///
    /// The card flips immediately. For backend posts the change is then
    /// written; if that fails the card flips back and the error is returned.
    /// Demo posts only change locally.
    ///
    /// # Errors
    ///
    /// Returns an error if the post is unknown, nobody is signed in, or the
    /// write fails.
    pub async fn toggle_like(&mut self, post_id: &str) -> Result<bool, ActionError> {
        let post = self
            .posts
            .iter_mut()
            .find(|p| p.id == post_id)
            .ok_or_else(|| ActionError::UnknownPost(post_id.to_string()))?;
        let liked = post.toggle_like();
        let likes_count = post.likes_count;

        if self.source != Some(DataSource::Remote) {
            debug!(post_id = %post_id, liked, "Toggled like on demo post");
            return Ok(liked);
        }

        match persist_like(&self.ctx, post_id, liked, likes_count).await {
            Ok(()) => {
                info!(post_id = %post_id, liked, likes_count, "Like saved");
                Ok(liked)
            }
            Err(e) => {
                error!(post_id = %post_id, error = %e, "Failed to save like");
                if self.scope.is_mounted() {
                    if let Some(post) = self.posts.iter_mut().find(|p| p.id == post_id) {
                        post.toggle_like();
                    }
                }
                Err(e)
            }
        }
    }

    /// Relative timestamp for a card.
    #[must_use]
    pub fn time_label(&self, post: &FeedPost) -> String {
        time_ago(post.created_at, self.ctx.now())
    }

    #[must_use]
    pub fn comments_route(post_id: &str) -> Route {
        Route::Comments {
            post_id: post_id.to_string(),
        }
    }

    /// Where the floating camera button leads.
    #[must_use]
    pub fn camera_route() -> Route {
        Route::Tab(Tab::Camera)
    }
}

async fn persist_like(
    ctx: &AppContext,
    post_id: &str,
    liked: bool,
    likes_count: u32,
) -> Result<(), ActionError> {
    let user = ctx
        .session_user()
        .await
        .ok_or(ActionError::NotSignedIn { action: "like posts" })?;
    let gateway = ctx.gateway.as_ref();

    let written = if liked {
        let row = to_row(&NewPostLike {
            post_id: post_id.to_string(),
            user_id: user.id.clone(),
        })
        .map_err(|e| ActionError::backend("update like", e))?;
        gateway.insert(tables::POST_LIKES, row, None).await.map(|_| ())
    } else {
        gateway
            .delete(
                tables::POST_LIKES,
                &[Filter::eq("post_id", post_id), Filter::eq("user_id", user.id.as_str())],
            )
            .await
    };
    written.map_err(|e| ActionError::backend("update like", e))?;

    gateway
        .update(
            tables::POSTS,
            json!({ "likes_count": likes_count }),
            &[Filter::eq("id", post_id)],
        )
        .await
        .map_err(|e| ActionError::backend("update like", e))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::config::Config;
    use crate::gateway::UnconfiguredGateway;
    use crate::screens::FixedClock;

    fn ctx(demo_mode: bool) -> AppContext {
        let config = Config {
            demo_mode,
            ..Config::for_testing()
        };
        AppContext::new(Arc::new(UnconfiguredGateway), config).with_clock(Arc::new(FixedClock(
            Utc.with_ymd_and_hms(2024, 3, 20, 12, 0, 0).unwrap(),
        )))
    }

    #[tokio::test]
    async fn test_unconfigured_feed_shows_demo_posts() {
        let mut screen = FeedScreen::new(ctx(true));
        screen.load().await.unwrap();
        assert_eq!(screen.posts().len(), 3);
        assert_eq!(screen.source(), Some(DataSource::Fallback));
        assert!(!screen.is_loading());
        assert!(!screen.shows_empty_state());
    }

    #[tokio::test]
    async fn test_demo_mode_off_surfaces_error() {
        let mut screen = FeedScreen::new(ctx(false));
        let err = screen.load().await.unwrap_err();
        assert_eq!(err.what, "posts");
        assert!(screen.posts().is_empty());
        assert!(screen.shows_empty_state());
    }

    #[tokio::test]
    async fn test_like_round_trip_on_demo_posts() {
        let mut screen = FeedScreen::new(ctx(true));
        screen.load().await.unwrap();

        let before = screen.post("1").unwrap().likes_count;
        assert!(screen.toggle_like("1").await.unwrap());
        assert_eq!(screen.post("1").unwrap().likes_count, before + 1);
        assert!(!screen.toggle_like("1").await.unwrap());
        assert_eq!(screen.post("1").unwrap().likes_count, before);
    }

    #[tokio::test]
    async fn test_unknown_post_like() {
        let mut screen = FeedScreen::new(ctx(true));
        screen.load().await.unwrap();
        assert!(matches!(
            screen.toggle_like("nope").await,
            Err(ActionError::UnknownPost(_))
        ));
    }

    #[tokio::test]
    async fn test_unmounted_screen_ignores_result() {
        let mut screen = FeedScreen::new(ctx(true));
        screen.scope().unmount_handle().unmount();
        screen.load().await.unwrap();
        assert!(screen.posts().is_empty());
        assert_eq!(screen.source(), None);
    }

    #[tokio::test]
    async fn test_time_labels() {
        let mut screen = FeedScreen::new(ctx(true));
        screen.load().await.unwrap();
        let labels: Vec<String> = screen
            .posts()
            .iter()
            .map(|p| screen.time_label(p))
            .collect();
        assert_eq!(labels, vec!["Just now", "1d ago", "2d ago"]);
    }

    #[test]
    fn test_share_content() {
        let post = fallback::feed_posts(Utc::now()).remove(2);
        let share = share_content(&post);
        insta::assert_snapshot!(share.message, @r###"
        Check out this amazing cleanup by Lakshmi P.!

        "Galle Face Green is now spotless! Small actions, big impact. 🌱"

        Location: Galle Face Green, Colombo

        #TrashTagLKA #CleanSriLanka
        "###);
        assert_eq!(share.url, post.image_url);
    }

    #[test]
    fn test_routes() {
        assert_eq!(
            FeedScreen::comments_route("7").to_path(),
            "/comments?postId=7"
        );
        assert_eq!(FeedScreen::camera_route(), Route::Tab(Tab::Camera));
    }
}
