//! CameraId - Cheap-to-clone camera identifier
//!
//! Cameras are named by their 1-based registration ordinal (`camera_<i>`).
//! The same ordinal keys the frame queue and the output folder of a camera.
//! Uses Arc<str> internally so the name can be cloned into every callback.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Borrow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::Arc;

const CAMERA_PREFIX: &str = "camera_";

/// Camera identifier with cheap cloning.
///
/// # Examples
/// ```
/// use contracts::CameraId;
///
/// let id = CameraId::from_ordinal(3);
/// assert_eq!(id.as_str(), "camera_3");
/// assert_eq!(id.ordinal(), Some(3));
/// ```
#[derive(Clone, Default)]
pub struct CameraId(Arc<str>);

impl CameraId {
    /// Create a new CameraId from a string slice.
    #[inline]
    pub fn new(s: &str) -> Self {
        Self(Arc::from(s))
    }

    /// Name of the camera registered at `ordinal` (1-based).
    pub fn from_ordinal(ordinal: usize) -> Self {
        Self(Arc::from(format!("{CAMERA_PREFIX}{ordinal}")))
    }

    /// Registration ordinal parsed back from the name.
    ///
    /// Returns `None` for names that do not follow the `camera_<i>` scheme.
    pub fn ordinal(&self) -> Option<usize> {
        self.0
            .strip_prefix(CAMERA_PREFIX)
            .and_then(|rest| rest.parse().ok())
    }

    /// Get the underlying string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for CameraId {
    type Target = str;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for CameraId {
    #[inline]
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for CameraId {
    #[inline]
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CameraId {
    #[inline]
    fn from(s: &str) -> Self {
        Self(Arc::from(s))
    }
}

impl From<String> for CameraId {
    #[inline]
    fn from(s: String) -> Self {
        Self(Arc::from(s))
    }
}

impl fmt::Display for CameraId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for CameraId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CameraId({:?})", self.0)
    }
}

impl PartialEq for CameraId {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0 == other.0
    }
}

impl Eq for CameraId {}

impl PartialEq<str> for CameraId {
    #[inline]
    fn eq(&self, other: &str) -> bool {
        self.0.as_ref() == other
    }
}

impl PartialEq<&str> for CameraId {
    #[inline]
    fn eq(&self, other: &&str) -> bool {
        self.0.as_ref() == *other
    }
}

// Registration order first, so camera_10 sorts after camera_2
impl Ord for CameraId {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        match (self.ordinal(), other.ordinal()) {
            (Some(a), Some(b)) => a.cmp(&b).then_with(|| self.0.cmp(&other.0)),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for CameraId {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

// Same hash as str so HashMap lookups by &str work
impl Hash for CameraId {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state)
    }
}

impl Serialize for CameraId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for CameraId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self::from(s))
    }
}
