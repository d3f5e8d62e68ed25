//! User reference carried by alerts.

use serde::{Deserialize, Serialize};

/// Maximum length of a stored photo reference.
pub const MAX_PHOTO_REF_LEN: usize = 2048;

/// Identity of the signed-in user, as kept in secure storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRef {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_ref: Option<String>,
}

impl UserRef {
    pub fn new(id: i64) -> Self {
        Self { id, photo_ref: None }
    }

    /// Attaches a photo reference, truncated to fit secure storage limits.
    pub fn with_photo(mut self, photo_ref: impl Into<String>) -> Self {
        let mut photo: String = photo_ref.into();
        if photo.len() > MAX_PHOTO_REF_LEN {
            let mut cut = MAX_PHOTO_REF_LEN;
            while !photo.is_char_boundary(cut) {
                cut -= 1;
            }
            photo.truncate(cut);
        }
        self.photo_ref = if photo.is_empty() { None } else { Some(photo) };
        self
    }
}
