//! Image identifiers and the customer's selection.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a selectable photograph, as returned by the image listing.
///
/// The value is opaque: it is usually a file name such as `"a.jpg"` but may
/// contain spaces or other characters that need escaping in URLs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageId(String);

impl ImageId {
    /// Create an image ID from any string-like value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the ID and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ImageId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for ImageId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl AsRef<str> for ImageId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The set of images a customer has picked, in the order they were picked.
///
/// Membership is a set (no duplicates) but the order is kept because the
/// receipt lists images as selected.
///
/// ```
/// use print_counter_core::{ImageId, Selection};
///
/// let mut selection = Selection::default();
/// assert!(selection.toggle(ImageId::from("a.jpg")));
/// assert!(selection.toggle(ImageId::from("b.jpg")));
/// assert!(!selection.toggle(ImageId::from("a.jpg")));
/// assert_eq!(selection.len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<ImageId>", into = "Vec<ImageId>")]
pub struct Selection(Vec<ImageId>);

impl Selection {
    /// Add the image if absent, remove it if present.
    ///
    /// Returns `true` if the image is selected after the call.
    pub fn toggle(&mut self, id: ImageId) -> bool {
        if let Some(pos) = self.0.iter().position(|existing| *existing == id) {
            self.0.remove(pos);
            false
        } else {
            self.0.push(id);
            true
        }
    }

    /// Returns `true` if the image is currently selected.
    #[must_use]
    pub fn contains(&self, id: &ImageId) -> bool {
        self.0.contains(id)
    }

    /// Number of selected images.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if nothing is selected.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the selected images in selection order.
    pub fn iter(&self) -> impl Iterator<Item = &ImageId> {
        self.0.iter()
    }

    /// The selected images in selection order.
    #[must_use]
    pub fn as_slice(&self) -> &[ImageId] {
        &self.0
    }

    /// Deselect everything.
    pub fn clear(&mut self) {
        self.0.clear();
    }
}

impl From<Vec<ImageId>> for Selection {
    /// Build a selection, keeping the first occurrence of any duplicate.
    fn from(ids: Vec<ImageId>) -> Self {
        let mut unique: Vec<ImageId> = Vec::with_capacity(ids.len());
        for id in ids {
            if !unique.contains(&id) {
                unique.push(id);
            }
        }
        Self(unique)
    }
}

impl From<Selection> for Vec<ImageId> {
    fn from(selection: Selection) -> Self {
        selection.0
    }
}

impl<'a> IntoIterator for &'a Selection {
    type Item = &'a ImageId;
    type IntoIter = std::slice::Iter<'a, ImageId>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
