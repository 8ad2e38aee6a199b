//! The overlay stylesheet, injected once per document.

use proofline_core::{Category, PlatformError};

use crate::color::{category_color, rgba_u32_to_css, rgba_u32_to_css_alpha};

pub const STYLE_ELEMENT_ID: &str = "proofline-style";

/// CSS for markers, tooltip, panel, toasts and the loading state.
pub fn stylesheet(z_index: i32) -> String {
    let mut css = String::new();
    for category in [Category::Spelling, Category::Grammar] {
        let color = category_color(category);
        css.push_str(&format!(
            ".proofline-marker.{class} {{ border-bottom: 2px solid {line}; }}\n\
             .proofline-marker.{class}:hover {{ background: {fill}; }}\n\
             .proofline-panel-excerpt.{class} {{ text-decoration: underline wavy {line}; }}\n",
            class = category.css_class(),
            line = rgba_u32_to_css(color),
            fill = rgba_u32_to_css_alpha(color, 0.15),
        ));
    }
    css.push_str(&format!(
        r#".proofline-overlay {{ position: fixed; pointer-events: none; overflow: hidden; background: transparent; z-index: {z}; }}
.proofline-marker {{ position: absolute; pointer-events: auto; cursor: pointer; box-sizing: border-box; }}
.proofline-tooltip, .proofline-panel, .proofline-toast {{
  position: fixed; z-index: {top}; font: 13px/1.4 system-ui, sans-serif; color: #1c1c1c;
  background: #fff; border: 1px solid #d0d0d0; border-radius: 6px; box-shadow: 0 4px 14px rgba(0, 0, 0, 0.15);
}}
.proofline-tooltip {{ padding: 8px 10px; max-width: 320px; }}
.proofline-message {{ margin-bottom: 6px; }}
.proofline-suggestions {{ display: flex; flex-wrap: wrap; gap: 4px; }}
.proofline-suggestions button {{
  font: inherit; padding: 2px 8px; border: 1px solid #3b82f6; border-radius: 4px;
  background: #eff6ff; color: #1d4ed8; cursor: pointer;
}}
.proofline-panel {{ width: 300px; max-height: 60vh; overflow-y: auto; padding: 8px; }}
.proofline-panel-header {{ display: flex; justify-content: space-between; font-weight: 600; margin-bottom: 6px; }}
.proofline-panel-close {{ border: none; background: none; font-size: 16px; cursor: pointer; }}
.proofline-panel-entry {{ padding: 6px 0; border-top: 1px solid #eee; }}
.proofline-panel-excerpt {{ font-weight: 600; }}
.proofline-toast {{ padding: 6px 12px; }}
.proofline-loading {{ cursor: progress !important; outline: 2px dashed rgba(59, 130, 246, 0.6) !important; }}
"#,
        z = z_index,
        top = z_index.saturating_add(1),
    ));
    css
}

/// Add the stylesheet to `document` unless it's already there.
///
/// Returns true if it was added.
pub fn ensure_stylesheet(document: &web_sys::Document, z_index: i32) -> Result<bool, PlatformError> {
    if document.get_element_by_id(STYLE_ELEMENT_ID).is_some() {
        return Ok(false);
    }
    let style = document
        .create_element("style")
        .map_err(|e| PlatformError(format!("create_element(style) failed: {e:?}")))?;
    style.set_id(STYLE_ELEMENT_ID);
    style.set_text_content(Some(&stylesheet(z_index)));

    let parent: web_sys::Element = match document.head() {
        Some(head) => head.into(),
        None => document.document_element().ok_or("document has no root element")?,
    };
    parent
        .append_child(&style)
        .map_err(|e| PlatformError(format!("append failed: {e:?}")))?;
    tracing::debug!(target: "proofline::style", "stylesheet injected");
    Ok(true)
}
