//! Create a post from a captured photo.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use super::{AppContext, ScreenScope};
use crate::constants::SUGGESTED_HASHTAGS;
use crate::device::{
    Capability, DeviceError, Devices, FileReader, Geocoder, Geolocation, PhotoRef,
};
use crate::error::{ActionError, Alert, Field, ValidationError, Validator};
use crate::gateway::{decode_rows, tables, to_row, GatewayError};
use crate::models::{NewPost, PostRow};
use crate::navigation::{Route, Tab};
use crate::storage::content_type_for;

/// Label used when reverse geocoding finds an address without a city.
pub const UNKNOWN_LOCATION: &str = "Unknown Location";

/// Hashtags in a space-separated string; words without `#` are dropped.
#[must_use]
pub fn parse_hashtags(text: &str) -> Vec<String> {
    text.split(' ')
        .map(str::trim)
        .filter(|tag| tag.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Storage key for a user's photo uploaded at `now`.
#[must_use]
pub fn object_path(user_id: &str, now: DateTime<Utc>) -> String {
    format!("posts/{user_id}/{}.jpg", now.timestamp_millis())
}

pub struct CreatePostScreen {
    ctx: AppContext,
    scope: ScreenScope,
    geolocation: Arc<dyn Geolocation>,
    geocoder: Arc<dyn Geocoder>,
    files: Arc<dyn FileReader>,
    photo: PhotoRef,
    is_before_photo: bool,
    caption: String,
    location: String,
    hashtags: String,
    submitting: bool,
}

impl CreatePostScreen {
    #[must_use]
    pub fn new(ctx: AppContext, devices: &Devices, photo: PhotoRef, is_before_photo: bool) -> Self {
        Self {
            ctx,
            scope: ScreenScope::new(),
            geolocation: Arc::clone(&devices.geolocation),
            geocoder: Arc::clone(&devices.geocoder),
            files: Arc::clone(&devices.files),
            photo,
            is_before_photo,
            caption: String::new(),
            location: String::new(),
            hashtags: String::new(),
            submitting: false,
        }
    }

    /// Build the screen from a `CreatePost` route.
    #[must_use]
    pub fn from_route(ctx: AppContext, devices: &Devices, route: &Route) -> Option<Self> {
        match route {
            Route::CreatePost {
                photo,
                is_before_photo,
            } => Some(Self::new(ctx, devices, photo.clone(), *is_before_photo)),
            _ => None,
        }
    }

    #[must_use]
    pub fn scope(&self) -> &ScreenScope {
        &self.scope
    }

    #[must_use]
    pub fn photo(&self) -> &PhotoRef {
        &self.photo
    }

    #[must_use]
    pub fn is_before_photo(&self) -> bool {
        self.is_before_photo
    }

    #[must_use]
    pub fn caption(&self) -> &str {
        &self.caption
    }

    pub fn set_caption(&mut self, caption: impl Into<String>) {
        self.caption = caption.into();
    }

    #[must_use]
    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn set_location(&mut self, location: impl Into<String>) {
        self.location = location.into();
    }

    #[must_use]
    pub fn hashtags(&self) -> &str {
        &self.hashtags
    }

    pub fn set_hashtags(&mut self, hashtags: impl Into<String>) {
        self.hashtags = hashtags.into();
    }

    #[must_use]
    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    #[must_use]
    pub fn suggested_hashtags() -> &'static [&'static str] {
        &SUGGESTED_HASHTAGS
    }

    /// Append a tag unless it is already present.
    pub fn add_hashtag(&mut self, tag: &str) {
        let mut tags: Vec<&str> = self.hashtags.split(' ').filter(|t| !t.trim().is_empty()).collect();
        if tags.contains(&tag) {
            return;
        }
        tags.push(tag);
        self.hashtags = tags.join(" ");
    }

    #[must_use]
    pub fn parsed_hashtags(&self) -> Vec<String> {
        parse_hashtags(&self.hashtags)
    }

    /// Fill the location from the device position.
    ///
    /// Only an empty location field is filled. Returns the label that was
    /// set, if any.
    ///
    /// # Errors
    ///
    /// Returns a device error when location permission is denied. Other
    /// lookup failures leave the field untouched.
    pub async fn prefill_location(&mut self) -> Result<Option<String>, ActionError> {
        let label = match self.lookup_location().await {
            Ok(label) => label,
            Err(DeviceError::PermissionDenied(capability)) => {
                return Err(DeviceError::PermissionDenied(capability).into());
            }
            Err(e) => {
                warn!(error = %e, "Failed to look up current location");
                None
            }
        };

        if !self.scope.is_mounted() || !self.location.trim().is_empty() {
            return Ok(None);
        }
        if let Some(label) = &label {
            debug!(location = %label, "Prefilled post location");
            self.location.clone_from(label);
        }
        Ok(label)
    }

    async fn lookup_location(&self) -> Result<Option<String>, DeviceError> {
        let status = self.geolocation.request_permission().await?;
        if !status.is_granted() {
            return Err(DeviceError::PermissionDenied(Capability::Location));
        }
        let position = self.geolocation.current_position().await?;
        let addresses = self.geocoder.reverse_geocode(position).await?;
        Ok(addresses.first().map(|address| {
            address
                .short_label()
                .unwrap_or(UNKNOWN_LOCATION)
                .to_string()
        }))
    }

    /// Check the form, reporting every missing field.
    ///
    /// # Errors
    ///
    /// Returns the missing caption and/or location.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut v = Validator::new();
        v.check(
            !self.caption.trim().is_empty(),
            Field::Caption,
            "Please add a caption to your post",
        );
        v.check(
            !self.location.trim().is_empty(),
            Field::Location,
            "Please add a location to your post",
        );
        v.finish()
    }

    /// Upload the photo and create the post.
    ///
    /// # Errors
    ///
    /// Returns a validation error before any backend call, or an error if
    /// nobody is signed in, the photo cannot be read, or the upload or
    /// insert fails.
    pub async fn submit(&mut self) -> Result<PostRow, ActionError> {
        self.validate()?;

        self.submitting = true;
        let result = self.create().await;
        self.submitting = false;

        match &result {
            Ok(post) => info!(post_id = %post.id, "Post created"),
            Err(e) => error!(error = %e, "Failed to create post"),
        }
        result
    }

    async fn create(&self) -> Result<PostRow, ActionError> {
        let user = self
            .ctx
            .session_user()
            .await
            .ok_or(ActionError::NotSignedIn {
                action: "create a post",
            })?;
        let gateway = self.ctx.gateway.as_ref();
        let bucket = self.ctx.config.storage_bucket.as_str();

        let bytes = self.files.read(&self.photo).await?;
        let path = object_path(&user.id, self.ctx.now());
        debug!(path = %path, size = bytes.len(), "Uploading post photo");
        gateway
            .upload(bucket, &path, bytes, &content_type_for(&path))
            .await
            .map_err(|e| ActionError::backend("create post", e))?;
        let image_url = gateway
            .public_url(bucket, &path)
            .map_err(|e| ActionError::backend("create post", e))?;

        let row = to_row(&NewPost {
            user_id: user.id,
            image_url,
            caption: self.caption.trim().to_string(),
            location: self.location.trim().to_string(),
            hashtags: self.parsed_hashtags(),
            is_before_photo: self.is_before_photo,
            likes_count: 0,
            comments_count: 0,
        })
        .map_err(|e| ActionError::backend("create post", e))?;

        gateway
            .insert(tables::POSTS, row, Some("*"))
            .await
            .and_then(|rows| decode_rows::<PostRow>(tables::POSTS, rows))
            .map_err(|e| ActionError::backend("create post", e))?
            .into_iter()
            .next()
            .ok_or_else(|| {
                ActionError::backend("create post", GatewayError::NoRows(tables::POSTS.to_string()))
            })
    }

    /// Dialog shown once the post exists.
    #[must_use]
    pub fn success_alert() -> Alert {
        Alert::new("Success!", "Your cleanup post has been created!")
    }

    /// Where the app goes after a successful submit.
    #[must_use]
    pub fn done_route() -> Route {
        Route::Tab(Tab::Feed)
    }
}
