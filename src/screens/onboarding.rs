//! First-run flow: splash, intro slides, login and profile setup.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use tracing::{debug, info, warn};

use super::{AppContext, ScreenScope};
use crate::error::{ActionError, Field, ValidationError, Validator};
use crate::gateway::{tables, to_row, OAuthProvider};
use crate::models::ProfileUpsert;
use crate::navigation::{Route, Tab};

/// How long the splash stays up.
pub const SPLASH_DURATION: Duration = Duration::from_secs(5);

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

#[derive(Debug, Default)]
pub struct SplashScreen {
    scope: ScreenScope,
}

impl SplashScreen {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn scope(&self) -> &ScreenScope {
        &self.scope
    }

    /// Wait out the splash. `None` if the screen went away meanwhile.
    pub async fn wait(&self) -> Option<Route> {
        tokio::time::sleep(SPLASH_DURATION).await;
        self.scope.is_mounted().then_some(Route::Intro)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slide {
    pub title: &'static str,
    pub description: &'static str,
}

pub const SLIDES: [Slide; 3] = [
    Slide {
        title: "Snap the mess",
        description: "Take a before photo of the area.",
    },
    Slide {
        title: "Clean it up",
        description: "Do your part and clean the area.",
    },
    Slide {
        title: "Post & inspire",
        description: "Share your transformation and earn rewards!",
    },
];

#[derive(Debug, Default)]
pub struct IntroScreen {
    index: usize,
}

impl IntroScreen {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub fn slide(&self) -> Slide {
        SLIDES[self.index]
    }

    #[must_use]
    pub fn is_last(&self) -> bool {
        self.index + 1 == SLIDES.len()
    }

    #[must_use]
    pub fn button_label(&self) -> &'static str {
        if self.is_last() {
            "Get Started"
        } else {
            "Next"
        }
    }

    /// Advance one slide; past the last one, go to login.
    pub fn next(&mut self) -> Option<Route> {
        if self.is_last() {
            Some(Route::Login)
        } else {
            self.index += 1;
            None
        }
    }
}

/// Trim an email and check it looks like an address.
///
/// # Errors
///
/// Returns a validation error for blank or malformed input.
pub fn validate_email(email: &str) -> Result<&str, ValidationError> {
    let email = email.trim();
    if EMAIL.is_match(email) {
        Ok(email)
    } else {
        Err(ValidationError::single(
            Field::Email,
            "Please enter a valid email address",
        ))
    }
}

/// What the host should do after a login action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginStep {
    /// Open the URL in a browser to finish signing in.
    OpenUrl(String),
    Navigate(Route),
}

pub struct LoginScreen {
    ctx: AppContext,
    email: String,
    loading: bool,
}

impl LoginScreen {
    #[must_use]
    pub fn new(ctx: AppContext) -> Self {
        Self {
            ctx,
            email: String::new(),
            loading: false,
        }
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn set_email(&mut self, email: impl Into<String>) {
        self.email = email.into();
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Skip straight to profile setup when a session already exists.
    pub async fn resume_session(&self) -> Option<Route> {
        let user = self.ctx.session_user().await?;
        debug!(user_id = %user.id, "Existing session, skipping login");
        Some(Route::ProfileSetup)
    }

    /// Email a sign-in link to the entered address.
    ///
    /// Without a backend and with demo mode on, the flow continues
    /// unauthenticated.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a malformed address, or the backend
    /// failure.
    pub async fn sign_in_with_email(&mut self) -> Result<LoginStep, ActionError> {
        let email = validate_email(&self.email)?.to_string();

        self.loading = true;
        let result = self
            .ctx
            .gateway
            .send_magic_link(&email, &self.ctx.config.oauth_redirect_url)
            .await;
        self.loading = false;

        match result {
            Ok(()) => info!("Sign-in link sent"),
            Err(e) if e.is_not_configured() && self.ctx.config.demo_mode => {
                warn!("Backend not configured, continuing without sign-in");
            }
            Err(e) => return Err(ActionError::backend("send sign-in link", e)),
        }
        Ok(LoginStep::Navigate(Route::ProfileSetup))
    }

    /// Start Google sign-in.
    ///
    /// # Errors
    ///
    /// Returns the backend failure.
    pub fn sign_in_with_google(&self) -> Result<LoginStep, ActionError> {
        match self
            .ctx
            .gateway
            .oauth_url(OAuthProvider::Google, &self.ctx.config.oauth_redirect_url)
        {
            Ok(url) => Ok(LoginStep::OpenUrl(url)),
            Err(e) if e.is_not_configured() && self.ctx.config.demo_mode => {
                warn!("Backend not configured, continuing without sign-in");
                Ok(LoginStep::Navigate(Route::ProfileSetup))
            }
            Err(e) => Err(ActionError::backend("start Google sign-in", e)),
        }
    }
}

pub struct ProfileSetupScreen {
    ctx: AppContext,
    name: String,
    city: String,
    crew: String,
    saving: bool,
}

impl ProfileSetupScreen {
    #[must_use]
    pub fn new(ctx: AppContext) -> Self {
        Self {
            ctx,
            name: String::new(),
            city: String::new(),
            crew: String::new(),
            saving: false,
        }
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn set_city(&mut self, city: impl Into<String>) {
        self.city = city.into();
    }

    pub fn set_crew(&mut self, crew: impl Into<String>) {
        self.crew = crew.into();
    }

    #[must_use]
    pub fn is_saving(&self) -> bool {
        self.saving
    }

    /// # Errors
    ///
    /// Returns every missing required field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut v = Validator::new();
        v.check(!self.name.trim().is_empty(), Field::Name, "Please enter your name");
        v.check(!self.city.trim().is_empty(), Field::City, "Please enter your city");
        v.finish()
    }

    /// Save the profile when signed in and enter the app.
    ///
    /// # Errors
    ///
    /// Returns a validation error, or the backend failure while saving.
    pub async fn submit(&mut self) -> Result<Route, ActionError> {
        self.validate()?;

        let Some(user) = self.ctx.session_user().await else {
            debug!("No session, profile kept on device only");
            return Ok(Route::Tab(Tab::Feed));
        };

        let crew = self.crew.trim();
        let row = to_row(&ProfileUpsert {
            id: user.id,
            name: self.name.trim().to_string(),
            city: self.city.trim().to_string(),
            crew: (!crew.is_empty()).then(|| crew.to_string()),
        })
        .map_err(|e| ActionError::backend("save profile", e))?;

        self.saving = true;
        let result = self.ctx.gateway.upsert(tables::PROFILES, row).await;
        self.saving = false;
        result.map_err(|e| ActionError::backend("save profile", e))?;

        info!("Profile saved");
        Ok(Route::Tab(Tab::Feed))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::Config;
    use crate::gateway::UnconfiguredGateway;

    fn ctx(demo_mode: bool) -> AppContext {
        let config = Config {
            demo_mode,
            ..Config::for_testing()
        };
        AppContext::new(Arc::new(UnconfiguredGateway), config)
    }

    #[tokio::test(start_paused = true)]
    async fn test_splash_moves_on_after_five_seconds() {
        let splash = SplashScreen::new();
        let started = tokio::time::Instant::now();
        assert_eq!(splash.wait().await, Some(Route::Intro));
        assert!(started.elapsed() >= SPLASH_DURATION);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unmounted_splash_goes_nowhere() {
        let splash = SplashScreen::new();
        splash.scope().unmount_handle().unmount();
        assert_eq!(splash.wait().await, None);
    }

    #[test]
    fn test_intro_slides() {
        let mut intro = IntroScreen::new();
        assert_eq!(intro.slide().title, "Snap the mess");
        assert_eq!(intro.button_label(), "Next");
        assert_eq!(intro.next(), None);
        assert_eq!(intro.next(), None);
        assert_eq!(intro.slide().title, "Post & inspire");
        assert_eq!(intro.button_label(), "Get Started");
        assert_eq!(intro.next(), Some(Route::Login));
        assert_eq!(intro.index(), 2);
    }

    #[test]
    fn test_validate_email() {
        assert_eq!(validate_email("  me@example.lk ").unwrap(), "me@example.lk");
        assert!(validate_email("").is_err());
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("a@b").is_err());
        assert!(validate_email("a b@c.lk").is_err());
    }

    #[tokio::test]
    async fn test_demo_login_continues() {
        let mut login = LoginScreen::new(ctx(true));
        assert_eq!(login.resume_session().await, None);

        login.set_email("bad");
        assert!(matches!(
            login.sign_in_with_email().await,
            Err(ActionError::Validation(_))
        ));

        login.set_email("me@example.lk");
        assert_eq!(
            login.sign_in_with_email().await.unwrap(),
            LoginStep::Navigate(Route::ProfileSetup)
        );
        assert_eq!(
            login.sign_in_with_google().unwrap(),
            LoginStep::Navigate(Route::ProfileSetup)
        );
    }

    #[tokio::test]
    async fn test_login_without_backend_or_demo_fails() {
        let mut login = LoginScreen::new(ctx(false));
        login.set_email("me@example.lk");
        let err = login.sign_in_with_email().await.unwrap_err();
        assert_eq!(err.alert().message, "Failed to send sign-in link");
        assert!(login.sign_in_with_google().is_err());
    }

    #[tokio::test]
    async fn test_profile_setup_requires_name_and_city() {
        let mut setup = ProfileSetupScreen::new(ctx(true));
        setup.set_crew("Eco Warriors");
        let err = setup.submit().await.unwrap_err();
        let ActionError::Validation(err) = err else {
            panic!("expected validation error");
        };
        assert!(err.has(Field::Name));
        assert!(err.has(Field::City));

        setup.set_name("Maya");
        setup.set_city("Kandy");
        assert_eq!(setup.submit().await.unwrap(), Route::Tab(Tab::Feed));
    }
}
