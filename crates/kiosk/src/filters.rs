//! Custom Askama template filters.

use std::fmt::Display;

/// Returns the content hash for main.css.
///
/// The hash is computed at build time from the CSS file content.
///
/// Usage in templates: `{{ ""|css_hash }}`
#[allow(clippy::unnecessary_wraps)]
#[askama::filter_fn]
pub fn css_hash(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<&'static str> {
    Ok(env!("CSS_HASH"))
}

/// Formats an image count with the right noun.
///
/// Usage in templates: `{{ count|images }}`
#[allow(clippy::unnecessary_wraps)]
#[askama::filter_fn]
pub fn images(count: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(image_count_label(&count.to_string()))
}

fn image_count_label(count: &str) -> String {
    if count == "1" {
        "1 image".to_string()
    } else {
        format!("{count} images")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_count_label() {
        assert_eq!(image_count_label("0"), "0 images");
        assert_eq!(image_count_label("1"), "1 image");
        assert_eq!(image_count_label("12"), "12 images");
    }
}
