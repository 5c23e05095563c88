//! Comments for a single post.

use serde_json::json;
use tracing::{debug, error, info, warn};

use super::{AppContext, DataSource, ScreenScope};
use crate::constants::MAX_COMMENT_CHARS;
use crate::error::{ActionError, Field, ReadError, ValidationError};
use crate::fallback;
use crate::gateway::{
    decode_rows, fetch_one, fetch_rows, tables, to_row, Direction, Filter, GatewayError, Query,
};
use crate::models::{CommentRow, CommentView, NewComment, PostPreview, PostRow, COMMENT_WITH_AUTHOR};
use crate::timefmt::time_ago;

/// Trim a draft and check it can be posted.
///
/// # Errors
///
/// Returns a validation error for blank or overlong comments.
pub fn validate_comment(draft: &str) -> Result<&str, ValidationError> {
    let content = draft.trim();
    if content.is_empty() {
        return Err(ValidationError::single(Field::Comment, "Please enter a comment"));
    }
    if content.chars().count() > MAX_COMMENT_CHARS {
        return Err(ValidationError::single(
            Field::Comment,
            format!("Comments are limited to {MAX_COMMENT_CHARS} characters"),
        ));
    }
    Ok(content)
}

async fn fetch_post(ctx: &AppContext, post_id: &str) -> Result<PostPreview, GatewayError> {
    let query = Query::from(tables::POSTS).eq("id", post_id);
    let row: PostRow = fetch_one(ctx.gateway.as_ref(), &query).await?;
    Ok(row.into())
}

async fn fetch_comments(ctx: &AppContext, post_id: &str) -> Result<Vec<CommentView>, GatewayError> {
    let query = Query::from(tables::COMMENTS)
        .select(COMMENT_WITH_AUTHOR)
        .eq("post_id", post_id)
        .order("created_at", Direction::Ascending);
    let rows: Vec<CommentRow> = fetch_rows(ctx.gateway.as_ref(), &query).await?;
    Ok(rows.into_iter().map(CommentView::from).collect())
}

pub struct CommentsScreen {
    ctx: AppContext,
    scope: ScreenScope,
    post_id: String,
    post: Option<PostPreview>,
    comments: Vec<CommentView>,
    source: Option<DataSource>,
    draft: String,
    loading: bool,
    submitting: bool,
}

impl CommentsScreen {
    #[must_use]
    pub fn new(ctx: AppContext, post_id: impl Into<String>) -> Self {
        Self {
            ctx,
            scope: ScreenScope::new(),
            post_id: post_id.into(),
            post: None,
            comments: Vec::new(),
            source: None,
            draft: String::new(),
            loading: false,
            submitting: false,
        }
    }

    #[must_use]
    pub fn scope(&self) -> &ScreenScope {
        &self.scope
    }

    #[must_use]
    pub fn post_id(&self) -> &str {
        &self.post_id
    }

    #[must_use]
    pub fn post(&self) -> Option<&PostPreview> {
        self.post.as_ref()
    }

    #[must_use]
    pub fn comments(&self) -> &[CommentView] {
        &self.comments
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
    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    #[must_use]
    pub fn draft(&self) -> &str {
        &self.draft
    }

    /// Replace the draft text as the user types.
    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    /// Whether the send button is enabled.
    #[must_use]
    pub fn can_send(&self) -> bool {
        !self.submitting && validate_comment(&self.draft).is_ok()
    }

    /// Load the post header and its comments, oldest first.
    ///
    /// Both are masked with demo data together when either fails.
    ///
    /// # Errors
    ///
    /// Returns `ReadError` only when a fetch fails with demo mode off.
    pub async fn load(&mut self) -> Result<(), ReadError> {
        self.loading = true;
        let now = self.ctx.now();

        let result = match fetch_post(&self.ctx, &self.post_id).await {
            Ok(post) => fetch_comments(&self.ctx, &self.post_id)
                .await
                .map(|comments| (post, comments)),
            Err(e) => Err(e),
        };

        if !self.scope.is_mounted() {
            debug!(post_id = %self.post_id, "Comments unmounted before load finished");
            return Ok(());
        }
        self.loading = false;

        let post_id = self.post_id.clone();
        let loaded = self.ctx.read_policy().resolve("comments", result, || {
            (
                fallback::post_preview(&post_id, now),
                fallback::comments(&post_id, now),
            )
        })?;

        let (post, comments) = loaded.data;
        self.post = Some(post);
        self.comments = comments;
        self.source = Some(loaded.source);
        Ok(())
    }

    /// Post the current draft.
    ///
    /// The comment is written first; the list, the counter and the draft
    /// only change once the backend accepted it. Nothing is written while
    /// the screen shows demo data.
    ///
    /// # Errors
    ///
    /// Returns a validation error before touching the backend, or an error
    /// if nobody is signed in, the post is demo data, or a write fails.
    pub async fn add_comment(&mut self) -> Result<CommentView, ActionError> {
        let content = validate_comment(&self.draft)?.to_string();

        self.submitting = true;
        let result = self.submit(content).await;
        self.submitting = false;

        let comment = result.inspect_err(|e| {
            error!(post_id = %self.post_id, error = %e, "Failed to add comment");
        })?;
        info!(post_id = %self.post_id, comment_id = %comment.id, "Comment added");

        if self.scope.is_mounted() {
            self.draft.clear();
            if let Some(post) = self.post.as_mut() {
                post.comments_count = post.comments_count.saturating_add(1);
            }
            self.comments.push(comment.clone());
        }
        Ok(comment)
    }

    async fn submit(&self, content: String) -> Result<CommentView, ActionError> {
        let user = self
            .ctx
            .session_user()
            .await
            .ok_or(ActionError::NotSignedIn { action: "comment" })?;
        if self.source != Some(DataSource::Remote) {
            warn!(post_id = %self.post_id, "Post is demo data, not writing comment");
            return Err(ActionError::DemoData { action: "comment" });
        }
        let gateway = self.ctx.gateway.as_ref();

        let row = to_row(&NewComment {
            post_id: self.post_id.clone(),
            user_id: user.id,
            content,
        })
        .map_err(|e| ActionError::backend("add comment", e))?;

        let inserted = gateway
            .insert(tables::COMMENTS, row, Some(COMMENT_WITH_AUTHOR))
            .await
            .and_then(|rows| decode_rows::<CommentRow>(tables::COMMENTS, rows))
            .map_err(|e| ActionError::backend("add comment", e))?
            .into_iter()
            .next()
            .ok_or_else(|| {
                ActionError::backend("add comment", GatewayError::NoRows(tables::COMMENTS.to_string()))
            })?;

        let count = self
            .post
            .as_ref()
            .map_or(1, |p| p.comments_count.saturating_add(1));
        gateway
            .update(
                tables::POSTS,
                json!({ "comments_count": count }),
                &[Filter::eq("id", self.post_id.as_str())],
            )
            .await
            .map_err(|e| ActionError::backend("add comment", e))?;

        Ok(inserted.into())
    }

    #[must_use]
    pub fn time_label(&self, comment: &CommentView) -> String {
        time_ago(comment.created_at, self.ctx.now())
    }
}
