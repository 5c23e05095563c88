//! Device capability adapters.
//!
//! Each trait wraps one device API the screens call directly: camera
//! shutter, gallery picker, media library, foreground location, geocoding
//! and local file reads. The host platform supplies implementations;
//! [`Unavailable`] stands in where a capability does not exist (headless
//! runs, tests).

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::location::Coordinates;

/// A device capability that can be denied or missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Camera,
    MediaLibrary,
    Location,
    Geocoding,
    Files,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Camera => "camera",
            Self::MediaLibrary => "media library",
            Self::Location => "location",
            Self::Geocoding => "geocoding",
            Self::Files => "file access",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
    Undetermined,
}

impl PermissionStatus {
    #[must_use]
    pub fn is_granted(self) -> bool {
        self == Self::Granted
    }
}

#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("{0} permission was denied")]
    PermissionDenied(Capability),
    #[error("{0} is not available on this device")]
    Unavailable(Capability),
    #[error("{capability} failed: {message}")]
    Failed {
        capability: Capability,
        message: String,
    },
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Reference to a photo on the device (a `file://` URI or plain path).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhotoRef(String);

impl PhotoRef {
    #[must_use]
    pub fn new(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Local filesystem path for the photo.
    #[must_use]
    pub fn to_path(&self) -> PathBuf {
        PathBuf::from(self.0.strip_prefix("file://").unwrap_or(&self.0))
    }
}

impl fmt::Display for PhotoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Options for the camera shutter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptureOptions {
    pub quality: f32,
    pub skip_processing: bool,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            quality: 0.8,
            skip_processing: false,
        }
    }
}

/// Options for the gallery picker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickOptions {
    pub allows_editing: bool,
    pub aspect: (u32, u32),
    pub quality: f32,
}

impl Default for PickOptions {
    fn default() -> Self {
        Self {
            allows_editing: true,
            aspect: (4, 3),
            quality: 0.8,
        }
    }
}

/// A reverse-geocoded postal address.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Address {
    pub city: Option<String>,
    pub subregion: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
}

impl Address {
    /// Short label for a post: the city, else the subregion.
    #[must_use]
    pub fn short_label(&self) -> Option<&str> {
        self.city
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .or_else(|| self.subregion.as_deref().filter(|s| !s.trim().is_empty()))
    }
}

#[async_trait]
pub trait Camera: Send + Sync {
    async fn request_permission(&self) -> Result<PermissionStatus, DeviceError>;
    async fn take_picture(&self, options: CaptureOptions) -> Result<PhotoRef, DeviceError>;
}

#[async_trait]
pub trait MediaPicker: Send + Sync {
    async fn request_permission(&self) -> Result<PermissionStatus, DeviceError>;
    /// Returns `None` when the user cancels the picker.
    async fn pick_image(&self, options: PickOptions) -> Result<Option<PhotoRef>, DeviceError>;
}

#[async_trait]
pub trait MediaLibrary: Send + Sync {
    async fn request_permission(&self) -> Result<PermissionStatus, DeviceError>;
    async fn save(&self, photo: &PhotoRef) -> Result<(), DeviceError>;
}

#[async_trait]
pub trait Geolocation: Send + Sync {
    async fn request_permission(&self) -> Result<PermissionStatus, DeviceError>;
    async fn current_position(&self) -> Result<Coordinates, DeviceError>;
}

#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, label: &str) -> Result<Vec<Coordinates>, DeviceError>;
    async fn reverse_geocode(&self, at: Coordinates) -> Result<Vec<Address>, DeviceError>;
}

#[async_trait]
pub trait FileReader: Send + Sync {
    async fn read(&self, photo: &PhotoRef) -> Result<Vec<u8>, DeviceError>;
}

/// Reads photos straight from the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileReader;

#[async_trait]
impl FileReader for LocalFileReader {
    async fn read(&self, photo: &PhotoRef) -> Result<Vec<u8>, DeviceError> {
        let path = photo.to_path();
        debug!(path = %path.display(), "Reading photo from disk");
        tokio::fs::read(&path).await.map_err(|source| DeviceError::Io {
            path: path.display().to_string(),
            source,
        })
    }
}

/// Adapter for a device without any of the capabilities.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unavailable;

#[async_trait]
impl Camera for Unavailable {
    async fn request_permission(&self) -> Result<PermissionStatus, DeviceError> {
        Err(DeviceError::Unavailable(Capability::Camera))
    }

    async fn take_picture(&self, _options: CaptureOptions) -> Result<PhotoRef, DeviceError> {
        Err(DeviceError::Unavailable(Capability::Camera))
    }
}

#[async_trait]
impl MediaPicker for Unavailable {
    async fn request_permission(&self) -> Result<PermissionStatus, DeviceError> {
        Err(DeviceError::Unavailable(Capability::MediaLibrary))
    }

    async fn pick_image(&self, _options: PickOptions) -> Result<Option<PhotoRef>, DeviceError> {
        Err(DeviceError::Unavailable(Capability::MediaLibrary))
    }
}

#[async_trait]
impl MediaLibrary for Unavailable {
    async fn request_permission(&self) -> Result<PermissionStatus, DeviceError> {
        Err(DeviceError::Unavailable(Capability::MediaLibrary))
    }

    async fn save(&self, _photo: &PhotoRef) -> Result<(), DeviceError> {
        Err(DeviceError::Unavailable(Capability::MediaLibrary))
    }
}

#[async_trait]
impl Geolocation for Unavailable {
    async fn request_permission(&self) -> Result<PermissionStatus, DeviceError> {
        Err(DeviceError::Unavailable(Capability::Location))
    }

    async fn current_position(&self) -> Result<Coordinates, DeviceError> {
        Err(DeviceError::Unavailable(Capability::Location))
    }
}

#[async_trait]
impl Geocoder for Unavailable {
    async fn geocode(&self, _label: &str) -> Result<Vec<Coordinates>, DeviceError> {
        Err(DeviceError::Unavailable(Capability::Geocoding))
    }

    async fn reverse_geocode(&self, _at: Coordinates) -> Result<Vec<Address>, DeviceError> {
        Err(DeviceError::Unavailable(Capability::Geocoding))
    }
}

#[async_trait]
impl FileReader for Unavailable {
    async fn read(&self, _photo: &PhotoRef) -> Result<Vec<u8>, DeviceError> {
        Err(DeviceError::Unavailable(Capability::Files))
    }
}

/// The set of adapters handed to screens.
#[derive(Clone)]
pub struct Devices {
    pub camera: Arc<dyn Camera>,
    pub picker: Arc<dyn MediaPicker>,
    pub library: Arc<dyn MediaLibrary>,
    pub geolocation: Arc<dyn Geolocation>,
    pub geocoder: Arc<dyn Geocoder>,
    pub files: Arc<dyn FileReader>,
}

impl Devices {
    /// No device capabilities; files are read from local disk.
    #[must_use]
    pub fn headless() -> Self {
        Self {
            camera: Arc::new(Unavailable),
            picker: Arc::new(Unavailable),
            library: Arc::new(Unavailable),
            geolocation: Arc::new(Unavailable),
            geocoder: Arc::new(Unavailable),
            files: Arc::new(LocalFileReader),
        }
    }
}

impl fmt::Debug for Devices {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Devices").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_photo_ref_strips_file_scheme() {
        let photo = PhotoRef::new("file:///data/cache/IMG_1.jpg");
        assert_eq!(photo.to_path(), PathBuf::from("/data/cache/IMG_1.jpg"));
        assert_eq!(PhotoRef::new("/tmp/a.jpg").to_path(), PathBuf::from("/tmp/a.jpg"));
    }

    #[test]
    fn test_address_short_label_prefers_city() {
        let address = Address {
            city: Some("Colombo".to_string()),
            subregion: Some("Colombo District".to_string()),
            ..Address::default()
        };
        assert_eq!(address.short_label(), Some("Colombo"));

        let address = Address {
            city: Some("  ".to_string()),
            subregion: Some("Galle District".to_string()),
            ..Address::default()
        };
        assert_eq!(address.short_label(), Some("Galle District"));
        assert_eq!(Address::default().short_label(), None);
    }

    #[tokio::test]
    async fn test_local_file_reader_reports_missing_file() {
        let err = LocalFileReader
            .read(&PhotoRef::new("file:///definitely/not/here.jpg"))
            .await
            .unwrap_err();
        assert!(matches!(err, DeviceError::Io { .. }));
    }
}
