//! Allowed image upload types.

use core::fmt;

/// Error returned when an uploaded filename has no allowed extension.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ImageExtensionError {
    /// The filename has no `.` followed by an extension.
    #[error("file has no extension")]
    Missing,
    /// The extension is not on the allow-list.
    #[error("file type not allowed: {0}")]
    NotAllowed(String),
}

/// Image file types accepted for item pictures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageExtension {
    Png,
    Jpg,
    Jpeg,
    Gif,
    Webp,
    Bmp,
}

impl ImageExtension {
    /// Determine the extension of an uploaded filename.
    ///
    /// Only the part after the last `.` is considered, compared
    /// case-insensitively. Directory components in the client-supplied name
    /// are irrelevant because the stored name is derived from the item id.
    ///
    /// # Errors
    ///
    /// Returns `ImageExtensionError::Missing` when there is no extension and
    /// `ImageExtensionError::NotAllowed` when it is not an accepted image type.
    pub fn from_filename(filename: &str) -> Result<Self, ImageExtensionError> {
        let (_, ext) = filename
            .rsplit_once('.')
            .ok_or(ImageExtensionError::Missing)?;

        match ext.to_ascii_lowercase().as_str() {
            "" => Err(ImageExtensionError::Missing),
            "png" => Ok(Self::Png),
            "jpg" => Ok(Self::Jpg),
            "jpeg" => Ok(Self::Jpeg),
            "gif" => Ok(Self::Gif),
            "webp" => Ok(Self::Webp),
            "bmp" => Ok(Self::Bmp),
            other => Err(ImageExtensionError::NotAllowed(other.to_owned())),
        }
    }

    /// Lowercase extension without the dot.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpg => "jpg",
            Self::Jpeg => "jpeg",
            Self::Gif => "gif",
            Self::Webp => "webp",
            Self::Bmp => "bmp",
        }
    }

    /// Stored filename for an item's image, e.g. `12.png`.
    #[must_use]
    pub fn file_name_for(self, item_id: impl fmt::Display) -> String {
        format!("{item_id}.{}", self.as_str())
    }
}

impl fmt::Display for ImageExtension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_extensions_any_case() {
        assert_eq!(
            ImageExtension::from_filename("cat.PNG").unwrap(),
            ImageExtension::Png
        );
        assert_eq!(
            ImageExtension::from_filename("my.holiday.jpeg").unwrap(),
            ImageExtension::Jpeg
        );
        assert_eq!(
            ImageExtension::from_filename("../../etc/x.webp").unwrap(),
            ImageExtension::Webp
        );
    }

    #[test]
    fn test_rejects_missing_and_unknown() {
        assert_eq!(
            ImageExtension::from_filename("README"),
            Err(ImageExtensionError::Missing)
        );
        assert_eq!(
            ImageExtension::from_filename("trailing."),
            Err(ImageExtensionError::Missing)
        );
        assert_eq!(
            ImageExtension::from_filename("shell.sh"),
            Err(ImageExtensionError::NotAllowed("sh".to_owned()))
        );
    }

    #[test]
    fn test_file_name_for_item() {
        assert_eq!(ImageExtension::Gif.file_name_for(12), "12.gif");
    }
}
