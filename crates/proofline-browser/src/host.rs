//! DOM host elements.
//!
//! `BrowserHost` wraps the focused element being checked: an `<input>`, a
//! `<textarea>`, or a contenteditable element.

use proofline_core::{
    HostElement, HostKind, PlatformError, Rect, ScrollOffset, TextRange, utf16_to_byte,
};
use wasm_bindgen::JsCast;
use web_sys::{Element, Event, EventInit, HtmlElement, HtmlInputElement, HtmlTextAreaElement, SelectionMode, Text};

/// `<input type=…>` values whose content is free text.
const TEXT_INPUT_TYPES: &[&str] = &["", "text", "search", "email", "url", "tel"];

/// A checkable element.
#[derive(Clone, Debug)]
pub enum BrowserHost {
    Input(HtmlInputElement),
    TextArea(HtmlTextAreaElement),
    Editable(HtmlElement),
}

impl BrowserHost {
    /// Wrap `element` if it's something the checker can work with.
    pub fn from_element(element: &Element) -> Option<Self> {
        if let Some(input) = element.dyn_ref::<HtmlInputElement>() {
            let kind = input.type_().to_ascii_lowercase();
            return TEXT_INPUT_TYPES
                .contains(&kind.as_str())
                .then(|| BrowserHost::Input(input.clone()));
        }
        if let Some(textarea) = element.dyn_ref::<HtmlTextAreaElement>() {
            return Some(BrowserHost::TextArea(textarea.clone()));
        }
        let html = element.dyn_ref::<HtmlElement>()?;
        html.is_content_editable()
            .then(|| BrowserHost::Editable(html.clone()))
    }

    pub fn element(&self) -> &HtmlElement {
        match self {
            BrowserHost::Input(input) => input.unchecked_ref(),
            BrowserHost::TextArea(textarea) => textarea.unchecked_ref(),
            BrowserHost::Editable(element) => element,
        }
    }

    /// The single text node of a flat contenteditable element.
    ///
    /// `Ok(None)` means the element is empty, `Err(())` that it has markup.
    fn flat_text_node(element: &HtmlElement) -> Result<Option<Text>, ()> {
        let children = element.child_nodes();
        match children.length() {
            0 => Ok(None),
            1 => children
                .item(0)
                .and_then(|node| node.dyn_into::<Text>().ok())
                .map(Some)
                .ok_or(()),
            _ => Err(()),
        }
    }

    fn splice_value(value: &str, range: TextRange, replacement: &str) -> Result<String, PlatformError> {
        let start = utf16_to_byte(value, range.start).ok_or("range start is not a char boundary")?;
        let end = utf16_to_byte(value, range.end()).ok_or("range end is not a char boundary")?;
        let mut spliced = String::with_capacity(value.len() + replacement.len());
        spliced.push_str(&value[..start]);
        spliced.push_str(replacement);
        spliced.push_str(&value[end..]);
        Ok(spliced)
    }
}

impl HostElement for BrowserHost {
    fn kind(&self) -> HostKind {
        match self {
            BrowserHost::Input(_) => HostKind::SingleLine,
            BrowserHost::TextArea(_) => HostKind::MultiLine,
            BrowserHost::Editable(_) => HostKind::RichText,
        }
    }

    fn is_attached(&self) -> bool {
        self.element().is_connected()
    }

    fn text(&self) -> Option<String> {
        match self {
            BrowserHost::Input(input) => Some(input.value()),
            BrowserHost::TextArea(textarea) => Some(textarea.value()),
            BrowserHost::Editable(element) => match Self::flat_text_node(element) {
                // Offsets must line up with the node data we'd edit.
                Ok(Some(text)) => Some(text.data()),
                Ok(None) => Some(String::new()),
                Err(()) => Some(element.inner_text()),
            },
        }
    }

    fn bounding_rect(&self) -> Rect {
        let rect = self.element().get_bounding_client_rect();
        Rect::new(rect.x(), rect.y(), rect.width(), rect.height())
    }

    fn scroll_offset(&self) -> ScrollOffset {
        let element = self.element();
        ScrollOffset::new(element.scroll_top() as f64, element.scroll_left() as f64)
    }

    fn style_property(&self, name: &str) -> Option<String> {
        let style = gloo_utils::window()
            .get_computed_style(self.element())
            .ok()
            .flatten()?;
        style.get_property_value(name).ok()
    }

    fn is_flat_text(&self) -> bool {
        match self {
            BrowserHost::Input(_) | BrowserHost::TextArea(_) => true,
            BrowserHost::Editable(element) => Self::flat_text_node(element).is_ok(),
        }
    }

    fn replace_range(&mut self, range: TextRange, replacement: &str) -> Result<(), PlatformError> {
        let start = range.start as u32;
        let end = range.end() as u32;
        match self {
            BrowserHost::Input(input) => {
                // Some input types (email) refuse setRangeText.
                if input
                    .set_range_text_with_start_and_end_and_selection_mode(
                        replacement,
                        start,
                        end,
                        SelectionMode::Select,
                    )
                    .is_err()
                {
                    tracing::debug!(target: "proofline::host", "setRangeText refused, splicing value");
                    input.set_value(&Self::splice_value(&input.value(), range, replacement)?);
                }
            }
            BrowserHost::TextArea(textarea) => {
                if textarea
                    .set_range_text_with_start_and_end_and_mode(
                        replacement,
                        start,
                        end,
                        "select",
                    )
                    .is_err()
                {
                    tracing::debug!(target: "proofline::host", "setRangeText refused, splicing value");
                    textarea.set_value(&Self::splice_value(&textarea.value(), range, replacement)?);
                }
            }
            BrowserHost::Editable(element) => match Self::flat_text_node(element) {
                Ok(Some(text)) => text
                    .replace_data(start, end - start, replacement)
                    .map_err(|e| PlatformError(format!("replaceData failed: {e:?}")))?,
                Ok(None) if range.is_empty() => element.set_text_content(Some(replacement)),
                Ok(None) => return Err("element is empty".into()),
                Err(()) => return Err("element has nested markup".into()),
            },
        }
        Ok(())
    }

    fn notify_input(&self) -> Result<(), PlatformError> {
        let init = EventInit::new();
        init.set_bubbles(true);
        let event = Event::new_with_event_init_dict("input", &init)
            .map_err(|e| PlatformError(format!("could not create input event: {e:?}")))?;
        self.element()
            .dispatch_event(&event)
            .map_err(|e| PlatformError(format!("input dispatch failed: {e:?}")))?;
        Ok(())
    }
}
