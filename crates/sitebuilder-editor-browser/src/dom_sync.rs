//! DOM synchronization for template fields.
//!
//! Reads rendered field content back out of the page and renders stored
//! values into it, plus the direct mutation primitives (native editing
//! commands and inline styles) the formatter drives.

use std::borrow::Cow;

use sitebuilder_editor_core::{
    Alignment, FieldKind, FieldSurface, FieldValue, FormatSurface, NativeCommand, PlatformError, StyleProperty,
};
use wasm_bindgen::JsCast;

use crate::dom::{BrowserPage, element_of};

/// Marks anchors the editor created around linked images.
const IMAGE_LINK_ATTR: &str = "data-image-link";

/// `document.execCommand` name and value for a native command.
pub fn command_args(command: NativeCommand<'_>) -> (&'static str, Option<Cow<'_, str>>) {
    match command {
        NativeCommand::Bold => ("bold", None),
        NativeCommand::Italic => ("italic", None),
        NativeCommand::Underline => ("underline", None),
        NativeCommand::ForeColor(color) => ("foreColor", Some(Cow::Borrowed(color))),
        NativeCommand::FontSize(size) => ("fontSize", Some(Cow::Owned(size.to_string()))),
        NativeCommand::CreateLink(url) => ("createLink", Some(Cow::Borrowed(url))),
        NativeCommand::Unlink => ("unlink", None),
    }
}

fn html_element(node: &web_sys::Node) -> Result<web_sys::HtmlElement, PlatformError> {
    element_of(node)
        .ok_or("node has no element")?
        .dyn_into::<web_sys::HtmlElement>()
        .map_err(|_| "element is not an HtmlElement".into())
}

/// The `<img>` of an image field; the marker may sit on a wrapper.
fn image_element(element: &web_sys::Element) -> Option<web_sys::HtmlImageElement> {
    if let Some(image) = element.dyn_ref::<web_sys::HtmlImageElement>() {
        return Some(image.clone());
    }
    element
        .query_selector("img")
        .ok()
        .flatten()
        .and_then(|found| found.dyn_into().ok())
}

fn link_wrapper(image: &web_sys::Element) -> Option<web_sys::Element> {
    image
        .parent_element()
        .filter(|parent| parent.tag_name().eq_ignore_ascii_case("a"))
}

fn js_err(context: &str) -> impl Fn(wasm_bindgen::JsValue) -> PlatformError + '_ {
    move |e| PlatformError::from(format!("{context} failed: {e:?}"))
}

impl BrowserPage {
    fn html_document(&self) -> Result<&web_sys::HtmlDocument, PlatformError> {
        self.document
            .dyn_ref::<web_sys::HtmlDocument>()
            .ok_or_else(|| "document is not an HtmlDocument".into())
    }

    /// Wrap, rewrite or unwrap the anchor around a field image.
    fn set_image_link(&self, image: &web_sys::Element, link: Option<&str>) -> Result<(), PlatformError> {
        match (link_wrapper(image), link) {
            (Some(anchor), Some(url)) => anchor.set_attribute("href", url).map_err(js_err("set href")),
            (Some(anchor), None) if anchor.has_attribute(IMAGE_LINK_ATTR) => {
                anchor.replace_with_with_node_1(image).map_err(js_err("unwrap image link"))
            }
            (Some(anchor), None) => anchor.remove_attribute("href").map_err(js_err("remove href")),
            (None, Some(url)) => {
                let anchor = self.document.create_element("a").map_err(js_err("create anchor"))?;
                anchor.set_attribute("href", url).map_err(js_err("set href"))?;
                anchor.set_attribute(IMAGE_LINK_ATTR, "").map_err(js_err("mark anchor"))?;
                image.replace_with_with_node_1(&anchor).map_err(js_err("wrap image"))?;
                anchor.append_child(image).map_err(js_err("append image"))?;
                Ok(())
            }
            (None, None) => Ok(()),
        }
    }
}

impl FieldSurface for BrowserPage {
    fn read_field(&self, node: &web_sys::Node, kind: FieldKind) -> Option<FieldValue> {
        if !node.is_connected() {
            return None;
        }
        let element = element_of(node)?;
        let value = match kind {
            FieldKind::Text => {
                let align = element
                    .dyn_ref::<web_sys::HtmlElement>()
                    .and_then(|el| el.style().get_property_value(StyleProperty::TextAlign.css_name()).ok())
                    .and_then(|value| Alignment::from_css(&value));
                FieldValue::Text {
                    html: element.inner_html(),
                    align,
                }
            }
            FieldKind::Image => {
                let image = image_element(&element)?;
                FieldValue::Image {
                    src: image.get_attribute("src").unwrap_or_default(),
                    link_url: link_wrapper(&image)
                        .and_then(|anchor| anchor.get_attribute("href"))
                        .filter(|href| !href.is_empty()),
                }
            }
            FieldKind::Button => FieldValue::Button {
                text: element.text_content().unwrap_or_default().trim().to_string(),
                url: element.get_attribute("href").unwrap_or_default(),
            },
        };
        Some(value)
    }

    fn render_field(&self, node: &web_sys::Node, value: &FieldValue) -> Result<(), PlatformError> {
        if !node.is_connected() {
            return Err("cannot render into a detached node".into());
        }
        let element = element_of(node).ok_or("node has no element")?;
        match value {
            FieldValue::Text { html, align } => {
                element.set_inner_html(html);
                let style = html_element(node)?.style();
                let property = StyleProperty::TextAlign.css_name();
                match align {
                    Some(align) => style.set_property(property, align.as_css()).map_err(js_err("set text-align"))?,
                    None => {
                        style.remove_property(property).map_err(js_err("remove text-align"))?;
                    }
                }
            }
            FieldValue::Image { src, link_url } => {
                let image = image_element(&element).ok_or("image field has no <img>")?;
                image.set_src(src);
                self.set_image_link(&image, link_url.as_deref().filter(|url| !url.is_empty()))?;
            }
            FieldValue::Button { text, url } => {
                element.set_text_content(Some(text));
                element.set_attribute("href", url).map_err(js_err("set href"))?;
            }
        }
        tracing::trace!(target: "sitebuilder::sync", kind = %value.kind(), "rendered field");
        Ok(())
    }
}

impl FormatSurface for BrowserPage {
    fn exec_command(&self, command: NativeCommand<'_>) -> Result<(), PlatformError> {
        let document = self.html_document()?;
        let (name, value) = command_args(command);
        let executed = match value {
            Some(value) => document.exec_command_with_show_ui_and_value(name, false, &value),
            None => document.exec_command(name),
        }
        .map_err(js_err(name))?;
        if executed {
            Ok(())
        } else {
            Err(format!("{name} was not executed").into())
        }
    }

    fn query_command_state(&self, command: NativeCommand<'_>) -> bool {
        let Ok(document) = self.html_document() else {
            return false;
        };
        let (name, _) = command_args(command);
        document.query_command_state(name).unwrap_or(false)
    }

    fn set_style(&self, node: &web_sys::Node, property: StyleProperty, value: Option<&str>) -> Result<(), PlatformError> {
        let style = html_element(node)?.style();
        match value {
            Some(value) => style
                .set_property(property.css_name(), value)
                .map_err(js_err(property.css_name())),
            None => style
                .remove_property(property.css_name())
                .map(|_| ())
                .map_err(js_err(property.css_name())),
        }
    }

    fn computed_style(&self, node: &web_sys::Node, property: StyleProperty) -> Option<String> {
        let element = element_of(node)?;
        let style = self.window.get_computed_style(&element).ok()??;
        style
            .get_property_value(property.css_name())
            .ok()
            .filter(|value| !value.is_empty())
    }
}
