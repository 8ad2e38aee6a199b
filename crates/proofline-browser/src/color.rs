//! Colors for markers and overlay UI.

use proofline_core::Category;

/// Underline color per category, packed as 0xRRGGBBAA.
pub fn category_color(category: Category) -> u32 {
    match category {
        Category::Spelling => 0xE5484DFF,
        Category::Grammar => 0xF5A524FF,
    }
}

/// Convert RGBA u32 (packed as 0xRRGGBBAA) to CSS rgba() string.
pub fn rgba_u32_to_css(color: u32) -> String {
    let r = (color >> 24) & 0xFF;
    let g = (color >> 16) & 0xFF;
    let b = (color >> 8) & 0xFF;
    let a = (color & 0xFF) as f32 / 255.0;
    format!("rgba({}, {}, {}, {})", r, g, b, a)
}

/// Convert RGBA u32 to CSS rgba() string with a custom alpha value.
///
/// Used for the faint hover fill behind a marker.
pub fn rgba_u32_to_css_alpha(color: u32, alpha: f32) -> String {
    let r = (color >> 24) & 0xFF;
    let g = (color >> 16) & 0xFF;
    let b = (color >> 8) & 0xFF;
    format!("rgba({}, {}, {}, {})", r, g, b, alpha)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_colors() {
        assert_eq!(
            rgba_u32_to_css(category_color(Category::Spelling)),
            "rgba(229, 72, 77, 1)"
        );
        assert_eq!(
            rgba_u32_to_css_alpha(category_color(Category::Grammar), 0.15),
            "rgba(245, 165, 36, 0.15)"
        );
    }

    #[test]
    fn test_rgba_to_css() {
        assert_eq!(rgba_u32_to_css(0x00FF0080), "rgba(0, 255, 0, 0.5019608)");
        assert_eq!(rgba_u32_to_css(0x0000FF00), "rgba(0, 0, 255, 0)");
    }
}
