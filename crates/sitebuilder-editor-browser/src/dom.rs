//! Page host over the live DOM.
//!
//! `BrowserPage` implements the core's platform traits for a template page
//! rendered into `root`. Field elements carry a `data-eid` attribute; the tag
//! and ARIA role decide which kind of field (or non-field control) a node is.

use sitebuilder_editor_core::{
    FieldId, NodeRole, PageDom, PlatformError, PositionMode, Rect, Size, Subpanel, ToolbarState, Viewport,
    ViewportMetrics,
};
use wasm_bindgen::JsCast;

/// Attribute naming the field an element is bound to.
pub const FIELD_ATTR: &str = "data-eid";

pub struct BrowserPage {
    pub(crate) window: web_sys::Window,
    pub(crate) document: web_sys::Document,
    root: web_sys::Element,
    toolbar: Option<web_sys::HtmlElement>,
}

impl BrowserPage {
    /// Host the page rendered under the element with id `root_id`.
    pub fn new(root_id: &str) -> Result<Self, PlatformError> {
        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;
        let root = document
            .get_element_by_id(root_id)
            .ok_or_else(|| format!("root element not found: {root_id}"))?;
        Ok(Self {
            window,
            document,
            root,
            toolbar: None,
        })
    }

    /// Register the toolbar element so its rendered size can be measured.
    pub fn set_toolbar(&mut self, toolbar: Option<web_sys::HtmlElement>) {
        self.toolbar = toolbar;
    }

    pub fn root(&self) -> &web_sys::Element {
        &self.root
    }

    pub fn toolbar(&self) -> Option<&web_sys::HtmlElement> {
        self.toolbar.as_ref()
    }

    /// Reflect toolbar state onto the registered toolbar element.
    ///
    /// The open sub-panel is exposed as `data-panel` for the toolbar's own styling.
    pub fn paint_toolbar(&self, state: &ToolbarState, mode: PositionMode) {
        let Some(toolbar) = &self.toolbar else {
            return;
        };
        toolbar.set_hidden(!state.visible);
        let panel = match state.open_subpanel {
            Subpanel::None => "",
            Subpanel::Color => "color",
            Subpanel::FontSize => "font-size",
            Subpanel::Link => "link",
        };
        let style = toolbar.style();
        let position = match mode {
            PositionMode::Fixed => "fixed",
            PositionMode::Document => "absolute",
        };
        let result = toolbar
            .set_attribute("data-panel", panel)
            .and_then(|_| style.set_property("position", position))
            .and_then(|_| style.set_property("top", &format!("{}px", state.position.top)))
            .and_then(|_| style.set_property("left", &format!("{}px", state.position.left)));
        if let Err(err) = result {
            tracing::debug!(target: "sitebuilder::toolbar", ?err, "could not paint toolbar");
        }
    }

    /// Whether `node` is the toolbar or inside it.
    pub fn in_toolbar(&self, node: &web_sys::Node) -> bool {
        self.toolbar
            .as_ref()
            .is_some_and(|toolbar| toolbar.contains(Some(node)))
    }
}

/// Classify a DOM node for the editing core.
///
/// A field element is rich text only when it is `contenteditable` or a
/// `textbox`. Any other field element wrapping an `<img>` is an image field.
pub fn node_role(node: &web_sys::Node) -> NodeRole {
    let Some(element) = node.dyn_ref::<web_sys::Element>() else {
        return NodeRole::Other;
    };
    let tag = element.tag_name().to_ascii_lowercase();
    let role = element.get_attribute("role");
    let is_image = tag == "img";
    let is_button = tag == "button" || role.as_deref() == Some("button");
    let is_editable = role.as_deref() == Some("textbox")
        || element
            .get_attribute("contenteditable")
            .is_some_and(|value| !value.eq_ignore_ascii_case("false"));

    match element.get_attribute(FIELD_ATTR).filter(|eid| !eid.is_empty()) {
        Some(eid) if is_image => NodeRole::ImageField(FieldId::new(eid)),
        Some(eid) if is_button || tag == "a" => NodeRole::ButtonField(FieldId::new(eid)),
        Some(eid) if is_editable => NodeRole::EditableText(FieldId::new(eid)),
        Some(eid) if wraps_image(element) => NodeRole::ImageField(FieldId::new(eid)),
        Some(_) => NodeRole::Other,
        None if is_image => NodeRole::Image,
        None if is_button => NodeRole::Button,
        None => NodeRole::Other,
    }
}

fn wraps_image(element: &web_sys::Element) -> bool {
    element.query_selector("img").ok().flatten().is_some()
}

/// Quote a value for use inside a double-quoted attribute selector.
fn selector_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        if ch == '"' || ch == '\\' {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

pub(crate) fn to_rect(rect: &web_sys::DomRect) -> Rect {
    Rect::new(rect.top(), rect.left(), rect.width(), rect.height())
}

/// Nearest element at or above `node` (text nodes resolve to their parent).
pub(crate) fn element_of(node: &web_sys::Node) -> Option<web_sys::Element> {
    match node.dyn_ref::<web_sys::Element>() {
        Some(element) => Some(element.clone()),
        None => node.parent_element(),
    }
}

impl PageDom for BrowserPage {
    type Node = web_sys::Node;

    fn parent(&self, node: &web_sys::Node) -> Option<web_sys::Node> {
        node.parent_node()
    }

    fn role(&self, node: &web_sys::Node) -> NodeRole {
        node_role(node)
    }

    fn is_connected(&self, node: &web_sys::Node) -> bool {
        node.is_connected()
    }

    fn bounding_rect(&self, node: &web_sys::Node) -> Option<Rect> {
        if !node.is_connected() {
            return None;
        }
        let element = element_of(node)?;
        Some(to_rect(&element.get_bounding_client_rect()))
    }

    fn find_field(&self, id: &FieldId) -> Option<web_sys::Node> {
        let selector = format!("[{FIELD_ATTR}=\"{}\"]", selector_value(id.as_str()));
        match self.root.query_selector(&selector) {
            Ok(found) => found.map(Into::into),
            Err(err) => {
                tracing::debug!(target: "sitebuilder::sync", field = %id, ?err, "field lookup failed");
                None
            }
        }
    }

    fn focus(&self, node: &web_sys::Node) -> Result<(), PlatformError> {
        let element = node
            .dyn_ref::<web_sys::HtmlElement>()
            .ok_or("focus target is not an HtmlElement")?;
        element
            .focus()
            .map_err(|e| PlatformError::from(format!("focus failed: {e:?}")))
    }
}

impl Viewport for BrowserPage {
    fn metrics(&self) -> ViewportMetrics {
        let width = self.window.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
        let height = self.window.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
        let scroll_x = self.window.scroll_x().unwrap_or(0.0);
        let scroll_y = self.window.scroll_y().unwrap_or(0.0);
        ViewportMetrics::new(width, height).with_scroll(scroll_x, scroll_y)
    }

    fn toolbar_size(&self) -> Option<Size> {
        let rect = self.toolbar.as_ref()?.get_bounding_client_rect();
        (rect.width() > 0.0 && rect.height() > 0.0).then(|| Size::new(rect.width(), rect.height()))
    }
}
