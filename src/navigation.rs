//! Routes exposed to the host navigation framework.

use std::collections::HashMap;

use crate::device::PhotoRef;

/// Bottom tabs of the main app.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tab {
    Feed,
    Map,
    Camera,
    Challenges,
    Profile,
}

impl Tab {
    pub const ALL: [Self; 5] = [
        Self::Feed,
        Self::Map,
        Self::Camera,
        Self::Challenges,
        Self::Profile,
    ];

    #[must_use]
    pub fn slug(self) -> &'static str {
        match self {
            Self::Feed => "feed",
            Self::Map => "map",
            Self::Camera => "camera",
            Self::Challenges => "challenges",
            Self::Profile => "profile",
        }
    }

    fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.slug() == slug)
    }
}

/// A screen and the parameters it needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Splash,
    Intro,
    Login,
    ProfileSetup,
    Tab(Tab),
    CreatePost { photo: PhotoRef, is_before_photo: bool },
    Comments { post_id: String },
}

impl Route {
    /// Path form, e.g. `/comments?postId=42`.
    #[must_use]
    pub fn to_path(&self) -> String {
        match self {
            Self::Splash => "/splash".to_string(),
            Self::Intro => "/intro".to_string(),
            Self::Login => "/login".to_string(),
            Self::ProfileSetup => "/profile-setup".to_string(),
            Self::Tab(tab) => format!("/main/{}", tab.slug()),
            Self::CreatePost {
                photo,
                is_before_photo,
            } => format!(
                "/create-post?photoUri={}&isBeforePhoto={is_before_photo}",
                urlencoding::encode(photo.as_str())
            ),
            Self::Comments { post_id } => {
                format!("/comments?postId={}", urlencoding::encode(post_id))
            }
        }
    }

    /// Parse a path produced by [`Route::to_path`].
    #[must_use]
    pub fn from_path(path: &str) -> Option<Self> {
        let (route, query) = path.split_once('?').unwrap_or((path, ""));
        let params = parse_query(query)?;

        match route.trim_end_matches('/') {
            "" | "/splash" => Some(Self::Splash),
            "/intro" => Some(Self::Intro),
            "/login" => Some(Self::Login),
            "/profile-setup" => Some(Self::ProfileSetup),
            "/create-post" => {
                let photo = params.get("photoUri").filter(|p| !p.is_empty())?;
                let is_before_photo = match params.get("isBeforePhoto").map(String::as_str) {
                    Some("true") => true,
                    Some("false") | None => false,
                    Some(_) => return None,
                };
                Some(Self::CreatePost {
                    photo: PhotoRef::new(photo.clone()),
                    is_before_photo,
                })
            }
            "/comments" => {
                let post_id = params.get("postId").filter(|p| !p.is_empty())?;
                Some(Self::Comments {
                    post_id: post_id.clone(),
                })
            }
            other => other
                .strip_prefix("/main/")
                .and_then(Tab::from_slug)
                .map(Self::Tab),
        }
    }
}

fn parse_query(query: &str) -> Option<HashMap<String, String>> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let value = urlencoding::decode(value).ok()?;
            Some((key.to_string(), value.into_owned()))
        })
        .collect()
}
