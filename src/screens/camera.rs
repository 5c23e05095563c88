//! Camera tab: capture or pick a photo, tag it before/after, continue to
//! the create-post form.

use std::sync::Arc;

use tracing::{debug, warn};

use super::ScreenScope;
use crate::device::{
    Camera, Capability, CaptureOptions, DeviceError, Devices, MediaLibrary, MediaPicker,
    PermissionStatus, PhotoRef, PickOptions,
};
use crate::error::ActionError;
use crate::navigation::Route;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Facing {
    #[default]
    Back,
    Front,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlashMode {
    #[default]
    Off,
    On,
    Auto,
}

impl FlashMode {
    /// Next mode when the flash button is pressed: off, on, auto, off.
    #[must_use]
    pub fn next(self) -> Self {
        match self {
            Self::Off => Self::On,
            Self::On => Self::Auto,
            Self::Auto => Self::Off,
        }
    }

    #[must_use]
    pub fn icon(self) -> &'static str {
        match self {
            Self::Off => "flash-off",
            Self::On => "flash",
            Self::Auto => "flash-outline",
        }
    }
}

pub struct CameraScreen {
    scope: ScreenScope,
    camera: Arc<dyn Camera>,
    picker: Arc<dyn MediaPicker>,
    library: Arc<dyn MediaLibrary>,
    permission: Option<PermissionStatus>,
    captured: Option<PhotoRef>,
    is_before_photo: bool,
    facing: Facing,
    flash: FlashMode,
}

impl CameraScreen {
    #[must_use]
    pub fn new(devices: &Devices) -> Self {
        Self {
            scope: ScreenScope::new(),
            camera: Arc::clone(&devices.camera),
            picker: Arc::clone(&devices.picker),
            library: Arc::clone(&devices.library),
            permission: None,
            captured: None,
            is_before_photo: true,
            facing: Facing::Back,
            flash: FlashMode::Off,
        }
    }

    #[must_use]
    pub fn scope(&self) -> &ScreenScope {
        &self.scope
    }

    /// `None` until the permission prompt has been answered.
    #[must_use]
    pub fn permission(&self) -> Option<PermissionStatus> {
        self.permission
    }

    /// Ask for camera access.
    ///
    /// # Errors
    ///
    /// Returns an error if the device has no camera.
    pub async fn request_permission(&mut self) -> Result<PermissionStatus, ActionError> {
        let status = self.camera.request_permission().await?;
        if self.scope.is_mounted() {
            self.permission = Some(status);
        }
        Ok(status)
    }

    #[must_use]
    pub fn captured(&self) -> Option<&PhotoRef> {
        self.captured.as_ref()
    }

    /// Press the shutter.
    ///
    /// The photo is kept as the current capture only if the screen is still
    /// mounted when the shutter resolves.
    ///
    /// # Errors
    ///
    /// Returns an error if access was not granted or the capture failed.
    pub async fn take_picture(&mut self) -> Result<PhotoRef, ActionError> {
        if !self.permission.is_some_and(PermissionStatus::is_granted) {
            return Err(DeviceError::PermissionDenied(Capability::Camera).into());
        }
        let photo = self
            .camera
            .take_picture(CaptureOptions::default())
            .await
            .inspect_err(|e| warn!(error = %e, "Failed to take picture"))?;
        if !self.scope.is_mounted() {
            debug!(photo = %photo, "Camera unmounted before capture finished");
            return Ok(photo);
        }
        debug!(photo = %photo, "Captured photo");
        self.captured = Some(photo.clone());
        Ok(photo)
    }

    pub fn retake(&mut self) {
        self.captured = None;
    }

    #[must_use]
    pub fn facing(&self) -> Facing {
        self.facing
    }

    pub fn flip(&mut self) -> Facing {
        self.facing = match self.facing {
            Facing::Back => Facing::Front,
            Facing::Front => Facing::Back,
        };
        self.facing
    }

    #[must_use]
    pub fn flash(&self) -> FlashMode {
        self.flash
    }

    pub fn cycle_flash(&mut self) -> FlashMode {
        self.flash = self.flash.next();
        self.flash
    }

    #[must_use]
    pub fn is_before_photo(&self) -> bool {
        self.is_before_photo
    }

    pub fn set_before_photo(&mut self, is_before_photo: bool) {
        self.is_before_photo = is_before_photo;
    }

    /// Pick a photo from the gallery. Cancelling leaves the screen as is.
    ///
    /// # Errors
    ///
    /// Returns an error if library access is denied or the picker fails.
    pub async fn pick_from_gallery(&mut self) -> Result<Option<&PhotoRef>, ActionError> {
        let status = self.picker.request_permission().await?;
        if !status.is_granted() {
            return Err(DeviceError::PermissionDenied(Capability::MediaLibrary).into());
        }

        match self.picker.pick_image(PickOptions::default()).await? {
            Some(photo) if self.scope.is_mounted() => Ok(Some(&*self.captured.insert(photo))),
            Some(_) => Ok(None),
            None => {
                debug!("Gallery pick cancelled");
                Ok(None)
            }
        }
    }

    /// Save the photo to the library when possible and move on to the
    /// create-post form.
    ///
    /// # Errors
    ///
    /// Returns `NothingToSubmit` if no photo has been taken or picked.
    pub async fn proceed(&self) -> Result<Route, ActionError> {
        let photo = self.captured.clone().ok_or(ActionError::NothingToSubmit)?;

        if let Err(e) = self.save_to_library(&photo).await {
            warn!(error = %e, "Failed to save photo to library, continuing");
        }

        Ok(Route::CreatePost {
            photo,
            is_before_photo: self.is_before_photo,
        })
    }

    async fn save_to_library(&self, photo: &PhotoRef) -> Result<(), DeviceError> {
        let status = self.library.request_permission().await?;
        if !status.is_granted() {
            return Err(DeviceError::PermissionDenied(Capability::MediaLibrary));
        }
        self.library.save(photo).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::screens::UnmountHandle;

    struct Shutter;

    #[async_trait]
    impl Camera for Shutter {
        async fn request_permission(&self) -> Result<PermissionStatus, DeviceError> {
            Ok(PermissionStatus::Granted)
        }

        async fn take_picture(&self, options: CaptureOptions) -> Result<PhotoRef, DeviceError> {
            assert!((options.quality - 0.8).abs() < f32::EPSILON);
            Ok(PhotoRef::new("file:///cache/shot.jpg"))
        }
    }

    /// Shutter whose screen goes away while the capture is in flight.
    #[derive(Default)]
    struct SlowShutter {
        unmount: std::sync::OnceLock<UnmountHandle>,
    }

    #[async_trait]
    impl Camera for SlowShutter {
        async fn request_permission(&self) -> Result<PermissionStatus, DeviceError> {
            Ok(PermissionStatus::Granted)
        }

        async fn take_picture(&self, _options: CaptureOptions) -> Result<PhotoRef, DeviceError> {
            if let Some(handle) = self.unmount.get() {
                handle.unmount();
            }
            Ok(PhotoRef::new("file:///cache/late.jpg"))
        }
    }

    struct Gallery {
        granted: bool,
        pick: Option<&'static str>,
    }

    #[async_trait]
    impl MediaPicker for Gallery {
        async fn request_permission(&self) -> Result<PermissionStatus, DeviceError> {
            Ok(if self.granted {
                PermissionStatus::Granted
            } else {
                PermissionStatus::Denied
            })
        }

        async fn pick_image(&self, _options: PickOptions) -> Result<Option<PhotoRef>, DeviceError> {
            Ok(self.pick.map(PhotoRef::new))
        }
    }

    #[derive(Default)]
    struct Library {
        saved: AtomicBool,
    }

    #[async_trait]
    impl MediaLibrary for Library {
        async fn request_permission(&self) -> Result<PermissionStatus, DeviceError> {
            Ok(PermissionStatus::Granted)
        }

        async fn save(&self, _photo: &PhotoRef) -> Result<(), DeviceError> {
            self.saved.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    fn screen(picker: Gallery) -> CameraScreen {
        CameraScreen::new(&Devices {
            camera: Arc::new(Shutter),
            picker: Arc::new(picker),
            ..Devices::headless()
        })
    }

    #[test]
    fn test_flash_cycle() {
        let mut screen = CameraScreen::new(&Devices::headless());
        assert_eq!(screen.flash().icon(), "flash-off");
        assert_eq!(screen.cycle_flash(), FlashMode::On);
        assert_eq!(screen.cycle_flash(), FlashMode::Auto);
        assert_eq!(screen.flash().icon(), "flash-outline");
        assert_eq!(screen.cycle_flash(), FlashMode::Off);
        assert_eq!(screen.flip(), Facing::Front);
        assert_eq!(screen.flip(), Facing::Back);
    }

    #[tokio::test]
    async fn test_capture_requires_permission() {
        let mut screen = screen(Gallery {
            granted: true,
            pick: None,
        });
        assert!(screen.take_picture().await.is_err());

        screen.request_permission().await.unwrap();
        let photo = screen.take_picture().await.unwrap();
        assert_eq!(photo.as_str(), "file:///cache/shot.jpg");

        screen.retake();
        assert!(screen.captured().is_none());
    }

    #[tokio::test]
    async fn test_capture_after_unmount_is_not_kept() {
        let camera = Arc::new(SlowShutter::default());
        let mut screen = CameraScreen::new(&Devices {
            camera: camera.clone(),
            ..Devices::headless()
        });
        screen.request_permission().await.unwrap();
        let _ = camera.unmount.set(screen.scope().unmount_handle());

        let photo = screen.take_picture().await.unwrap();
        assert_eq!(photo.as_str(), "file:///cache/late.jpg");
        assert!(screen.captured().is_none());
        assert!(matches!(
            screen.proceed().await,
            Err(ActionError::NothingToSubmit)
        ));
    }

    #[tokio::test]
    async fn test_gallery_cancel_keeps_state() {
        let mut screen = screen(Gallery {
            granted: true,
            pick: None,
        });
        assert!(screen.pick_from_gallery().await.unwrap().is_none());
        assert!(screen.captured().is_none());
    }

    #[tokio::test]
    async fn test_gallery_denied() {
        let mut screen = screen(Gallery {
            granted: false,
            pick: Some("file:///g.jpg"),
        });
        let err = screen.pick_from_gallery().await.unwrap_err();
        assert_eq!(err.alert().title, "Permission denied");
        assert!(screen.captured().is_none());
    }

    #[tokio::test]
    async fn test_proceed_saves_and_routes() {
        let library = Arc::new(Library::default());
        let mut screen = CameraScreen::new(&Devices {
            picker: Arc::new(Gallery {
                granted: true,
                pick: Some("file:///g.jpg"),
            }),
            library: library.clone(),
            ..Devices::headless()
        });

        assert!(matches!(
            screen.proceed().await,
            Err(ActionError::NothingToSubmit)
        ));

        screen.pick_from_gallery().await.unwrap();
        screen.set_before_photo(false);
        let route = screen.proceed().await.unwrap();
        assert_eq!(route.to_path(), "/create-post?photoUri=file%3A%2F%2F%2Fg.jpg&isBeforePhoto=false");
        assert!(library.saved.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_proceed_without_library_still_routes() {
        let mut screen = screen(Gallery {
            granted: true,
            pick: Some("file:///g.jpg"),
        });
        screen.pick_from_gallery().await.unwrap();
        assert!(matches!(
            screen.proceed().await.unwrap(),
            Route::CreatePost {
                is_before_photo: true,
                ..
            }
        ));
    }
}
