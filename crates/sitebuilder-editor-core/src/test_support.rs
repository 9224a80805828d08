//! In-memory page host for tests.
//!
//! `FakePage` implements every platform trait over a small arena of nodes.
//! Each node owns a run of styled characters; native commands toggle marks on
//! the selected characters and field markup is produced by serializing the
//! marks back into the tags a browser would emit.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

use crate::error::PlatformError;
use crate::field::FieldValue;
use crate::platform::{
    DomPoint, DomRange, FieldSurface, FormatSurface, LiveSelection, NativeCommand, NodeRole, PageDom,
    SelectionProvider, StyleProperty, Viewport,
};
use crate::types::{Alignment, FieldId, FieldKind, Rect, Size, ViewportMetrics};

/// Width of one character in the fake layout.
const CHAR_WIDTH: f64 = 8.0;
const LINE_HEIGHT: f64 = 24.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Marks {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub color: Option<String>,
    pub size: Option<u8>,
    pub link: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct StyledChar {
    ch: char,
    marks: Marks,
}

#[derive(Clone, Debug)]
struct FakeNode {
    parent: Option<NodeId>,
    role: NodeRole,
    rect: Rect,
    chars: Vec<StyledChar>,
    styles: BTreeMap<&'static str, String>,
    attached: bool,
    src: String,
    href: Option<String>,
}

pub struct FakePage {
    nodes: RefCell<Vec<FakeNode>>,
    selection: RefCell<Option<DomRange<NodeId>>>,
    focused: Cell<Option<NodeId>>,
    viewport: Cell<ViewportMetrics>,
    toolbar_size: Cell<Option<Size>>,
    fail_range_rect: Cell<bool>,
    exec_log: RefCell<Vec<String>>,
}

impl Default for FakePage {
    fn default() -> Self {
        Self::new()
    }
}

impl FakePage {
    pub fn new() -> Self {
        Self {
            nodes: RefCell::new(Vec::new()),
            selection: RefCell::new(None),
            focused: Cell::new(None),
            viewport: Cell::new(ViewportMetrics::new(1280.0, 800.0)),
            toolbar_size: Cell::new(None),
            fail_range_rect: Cell::new(false),
            exec_log: RefCell::new(Vec::new()),
        }
    }

    fn add_node(&self, parent: Option<NodeId>, role: NodeRole, text: &str) -> NodeId {
        let mut nodes = self.nodes.borrow_mut();
        let index = nodes.len();
        let chars: Vec<StyledChar> = text
            .chars()
            .map(|ch| StyledChar {
                ch,
                marks: Marks::default(),
            })
            .collect();
        let width = (chars.len().max(1) as f64) * CHAR_WIDTH;
        nodes.push(FakeNode {
            parent,
            role,
            rect: Rect::new(200.0 + 40.0 * index as f64, 40.0, width, LINE_HEIGHT),
            chars,
            styles: BTreeMap::new(),
            attached: true,
            src: String::new(),
            href: None,
        });
        NodeId(index)
    }

    pub fn add_text_field(&self, parent: Option<NodeId>, id: &str, text: &str) -> NodeId {
        self.add_node(parent, NodeRole::EditableText(id.into()), text)
    }

    pub fn add_image_field(&self, parent: Option<NodeId>, id: &str, src: &str) -> NodeId {
        let node = self.add_node(parent, NodeRole::ImageField(id.into()), "");
        self.nodes.borrow_mut()[node.0].src = src.to_string();
        node
    }

    pub fn add_button_field(&self, parent: Option<NodeId>, id: &str, text: &str, url: &str) -> NodeId {
        let node = self.add_node(parent, NodeRole::ButtonField(id.into()), text);
        self.nodes.borrow_mut()[node.0].href = Some(url.to_string());
        node
    }

    pub fn add_image(&self, parent: Option<NodeId>) -> NodeId {
        self.add_node(parent, NodeRole::Image, "")
    }

    pub fn add_button(&self, parent: Option<NodeId>, text: &str) -> NodeId {
        self.add_node(parent, NodeRole::Button, text)
    }

    pub fn add_plain(&self, parent: Option<NodeId>, text: &str) -> NodeId {
        self.add_node(parent, NodeRole::Other, text)
    }

    pub fn set_rect(&self, node: NodeId, rect: Rect) {
        self.nodes.borrow_mut()[node.0].rect = rect;
    }

    pub fn set_viewport(&self, viewport: ViewportMetrics) {
        self.viewport.set(viewport);
    }

    pub fn set_toolbar_size(&self, size: Option<Size>) {
        self.toolbar_size.set(size);
    }

    pub fn fail_range_rect(&self, fail: bool) {
        self.fail_range_rect.set(fail);
    }

    /// Select characters `start..end` of a node's own text.
    pub fn select(&self, node: NodeId, start: u32, end: u32) {
        *self.selection.borrow_mut() = Some(DomRange::new(DomPoint::new(node, start), DomPoint::new(node, end)));
    }

    pub fn clear_selection(&self) {
        *self.selection.borrow_mut() = None;
    }

    /// Remove a node (and with it, its subtree) from the page.
    pub fn detach(&self, node: NodeId) {
        self.nodes.borrow_mut()[node.0].attached = false;
    }

    pub fn focused(&self) -> Option<NodeId> {
        self.focused.get()
    }

    pub fn selected_text(&self) -> Option<String> {
        let range = self.selection.borrow().clone()?;
        if range.anchor.node != range.focus.node {
            return None;
        }
        let (lo, hi) = ordered(&range);
        let nodes = self.nodes.borrow();
        let chars = &nodes[range.anchor.node.0].chars;
        Some(chars.get(lo..hi.min(chars.len()))?.iter().map(|c| c.ch).collect())
    }

    pub fn text(&self, node: NodeId) -> String {
        self.nodes.borrow()[node.0].chars.iter().map(|c| c.ch).collect()
    }

    pub fn html(&self, node: NodeId) -> String {
        serialize(&self.nodes.borrow()[node.0].chars)
    }

    pub fn style(&self, node: NodeId, property: StyleProperty) -> Option<String> {
        self.nodes.borrow()[node.0].styles.get(property.css_name()).cloned()
    }

    pub fn image_src(&self, node: NodeId) -> String {
        self.nodes.borrow()[node.0].src.clone()
    }

    pub fn href(&self, node: NodeId) -> Option<String> {
        self.nodes.borrow()[node.0].href.clone()
    }

    /// Native commands executed so far, in order.
    pub fn exec_log(&self) -> Vec<String> {
        self.exec_log.borrow().clone()
    }

    fn attached(&self, node: NodeId) -> bool {
        let nodes = self.nodes.borrow();
        let mut current = Some(node);
        while let Some(id) = current {
            let Some(n) = nodes.get(id.0) else {
                return false;
            };
            if !n.attached {
                return false;
            }
            current = n.parent;
        }
        true
    }

    /// Selected character span, when the selection sits within one attached node.
    fn selected_span(&self) -> Option<(NodeId, usize, usize)> {
        let range = self.selection.borrow().clone()?;
        if range.anchor.node != range.focus.node || !self.attached(range.anchor.node) {
            return None;
        }
        let (lo, hi) = ordered(&range);
        let len = self.nodes.borrow()[range.anchor.node.0].chars.len();
        Some((range.anchor.node, lo.min(len), hi.min(len)))
    }
}

fn ordered(range: &DomRange<NodeId>) -> (usize, usize) {
    let a = range.anchor.offset as usize;
    let b = range.focus.offset as usize;
    (a.min(b), a.max(b))
}

impl PageDom for FakePage {
    type Node = NodeId;

    fn parent(&self, node: &NodeId) -> Option<NodeId> {
        self.nodes.borrow().get(node.0)?.parent
    }

    fn role(&self, node: &NodeId) -> NodeRole {
        self.nodes
            .borrow()
            .get(node.0)
            .map(|n| n.role.clone())
            .unwrap_or(NodeRole::Other)
    }

    fn is_connected(&self, node: &NodeId) -> bool {
        self.attached(*node)
    }

    fn bounding_rect(&self, node: &NodeId) -> Option<Rect> {
        if !self.attached(*node) {
            return None;
        }
        Some(self.nodes.borrow()[node.0].rect)
    }

    fn find_field(&self, id: &FieldId) -> Option<NodeId> {
        let count = self.nodes.borrow().len();
        (0..count).map(NodeId).find(|node| {
            self.attached(*node) && self.role(node).field().is_some_and(|(field, _)| field == id)
        })
    }

    fn focus(&self, node: &NodeId) -> Result<(), PlatformError> {
        if !self.attached(*node) {
            return Err("cannot focus a detached node".into());
        }
        self.focused.set(Some(*node));
        Ok(())
    }
}

impl SelectionProvider for FakePage {
    fn selection(&self) -> Option<LiveSelection<NodeId>> {
        let selection = match self.selection.borrow().clone() {
            Some(range) => LiveSelection {
                is_collapsed: range.is_collapsed(),
                anchor: Some(range.anchor),
                focus: Some(range.focus),
                range_count: 1,
            },
            None => LiveSelection {
                anchor: None,
                focus: None,
                is_collapsed: true,
                range_count: 0,
            },
        };
        Some(selection)
    }

    fn first_range(&self) -> Option<DomRange<NodeId>> {
        self.selection.borrow().clone()
    }

    fn range_rect(&self) -> Result<Rect, PlatformError> {
        if self.fail_range_rect.get() {
            return Err("range has no client rects".into());
        }
        let range = self.selection.borrow().clone().ok_or("no ranges")?;
        let node_rect = self.bounding_rect(&range.anchor.node).ok_or("range is detached")?;
        let (lo, hi) = ordered(&range);
        Ok(Rect::new(
            node_rect.top,
            node_rect.left + lo as f64 * CHAR_WIDTH,
            (hi - lo) as f64 * CHAR_WIDTH,
            node_rect.height,
        ))
    }

    fn select(&self, range: &DomRange<NodeId>) -> Result<(), PlatformError> {
        if !self.attached(range.anchor.node) || !self.attached(range.focus.node) {
            return Err("range endpoints are detached".into());
        }
        *self.selection.borrow_mut() = Some(range.clone());
        Ok(())
    }
}

impl Viewport for FakePage {
    fn metrics(&self) -> ViewportMetrics {
        self.viewport.get()
    }

    fn toolbar_size(&self) -> Option<Size> {
        self.toolbar_size.get()
    }
}

impl FormatSurface for FakePage {
    fn exec_command(&self, command: NativeCommand<'_>) -> Result<(), PlatformError> {
        let (node, lo, hi) = self.selected_span().ok_or("no usable selection")?;
        self.exec_log.borrow_mut().push(format!("{command:?}"));
        if lo == hi {
            return Ok(());
        }

        let mut nodes = self.nodes.borrow_mut();
        let span = &mut nodes[node.0].chars[lo..hi];
        match command {
            NativeCommand::Bold => toggle(span, |m| &mut m.bold),
            NativeCommand::Italic => toggle(span, |m| &mut m.italic),
            NativeCommand::Underline => toggle(span, |m| &mut m.underline),
            NativeCommand::ForeColor(color) => span.iter_mut().for_each(|c| c.marks.color = Some(color.to_string())),
            NativeCommand::FontSize(size) => span.iter_mut().for_each(|c| c.marks.size = Some(size)),
            NativeCommand::CreateLink(url) => span.iter_mut().for_each(|c| c.marks.link = Some(url.to_string())),
            NativeCommand::Unlink => span.iter_mut().for_each(|c| c.marks.link = None),
        }
        Ok(())
    }

    fn query_command_state(&self, command: NativeCommand<'_>) -> bool {
        let Some((node, lo, hi)) = self.selected_span() else {
            return false;
        };
        if lo == hi {
            return false;
        }
        let nodes = self.nodes.borrow();
        let span = &nodes[node.0].chars[lo..hi];
        match command {
            NativeCommand::Bold => span.iter().all(|c| c.marks.bold),
            NativeCommand::Italic => span.iter().all(|c| c.marks.italic),
            NativeCommand::Underline => span.iter().all(|c| c.marks.underline),
            _ => false,
        }
    }

    fn set_style(&self, node: &NodeId, property: StyleProperty, value: Option<&str>) -> Result<(), PlatformError> {
        if !self.attached(*node) {
            return Err("cannot style a detached node".into());
        }
        let mut nodes = self.nodes.borrow_mut();
        let styles = &mut nodes[node.0].styles;
        match value {
            Some(value) => styles.insert(property.css_name(), value.to_string()),
            None => styles.remove(property.css_name()),
        };
        Ok(())
    }

    fn computed_style(&self, node: &NodeId, property: StyleProperty) -> Option<String> {
        let inline = self.nodes.borrow().get(node.0)?.styles.get(property.css_name()).cloned();
        inline.or_else(|| {
            Some(
                match property {
                    StyleProperty::TextAlign => "left",
                    StyleProperty::Color => "rgb(0, 0, 0)",
                    StyleProperty::FontSize => "16px",
                }
                .to_string(),
            )
        })
    }
}

impl FieldSurface for FakePage {
    fn read_field(&self, node: &NodeId, kind: FieldKind) -> Option<FieldValue> {
        if !self.attached(*node) {
            return None;
        }
        let nodes = self.nodes.borrow();
        let n = &nodes[node.0];
        Some(match kind {
            FieldKind::Text => FieldValue::Text {
                html: serialize(&n.chars),
                align: n.styles.get("text-align").and_then(|v| Alignment::from_css(v)),
            },
            FieldKind::Image => FieldValue::Image {
                src: n.src.clone(),
                link_url: n.href.clone(),
            },
            FieldKind::Button => FieldValue::Button {
                text: n.chars.iter().map(|c| c.ch).collect(),
                url: n.href.clone().unwrap_or_default(),
            },
        })
    }

    fn render_field(&self, node: &NodeId, value: &FieldValue) -> Result<(), PlatformError> {
        if !self.attached(*node) {
            return Err("cannot render into a detached node".into());
        }
        let mut nodes = self.nodes.borrow_mut();
        let n = &mut nodes[node.0];
        match value {
            FieldValue::Text { html, align } => {
                n.chars = parse(html);
                match align {
                    Some(align) => n.styles.insert("text-align", align.as_css().to_string()),
                    None => n.styles.remove("text-align"),
                };
            }
            FieldValue::Image { src, link_url } => {
                n.src = src.clone();
                n.href = link_url.clone();
            }
            FieldValue::Button { text, url } => {
                n.chars = text
                    .chars()
                    .map(|ch| StyledChar {
                        ch,
                        marks: Marks::default(),
                    })
                    .collect();
                n.href = Some(url.clone());
            }
        }
        Ok(())
    }
}

fn toggle(span: &mut [StyledChar], flag: impl Fn(&mut Marks) -> &mut bool) {
    let all_set = span.iter_mut().all(|c| *flag(&mut c.marks));
    for c in span.iter_mut() {
        *flag(&mut c.marks) = !all_set;
    }
}

/// Serialize styled characters as a browser would after native commands.
fn serialize(chars: &[StyledChar]) -> String {
    let mut out = String::new();
    let mut i = 0;
    while i < chars.len() {
        let marks = &chars[i].marks;
        let mut j = i;
        while j < chars.len() && &chars[j].marks == marks {
            j += 1;
        }

        let mut close = Vec::new();
        if let Some(link) = &marks.link {
            out.push_str(&format!("<a href=\"{}\">", escape(link)));
            close.push("</a>");
        }
        if let Some(color) = &marks.color {
            out.push_str(&format!("<font color=\"{}\">", escape(color)));
            close.push("</font>");
        }
        if let Some(size) = marks.size {
            out.push_str(&format!("<font size=\"{size}\">"));
            close.push("</font>");
        }
        for (on, open, end) in [
            (marks.bold, "<b>", "</b>"),
            (marks.italic, "<i>", "</i>"),
            (marks.underline, "<u>", "</u>"),
        ] {
            if on {
                out.push_str(open);
                close.push(end);
            }
        }
        let text: String = chars[i..j].iter().map(|c| c.ch).collect();
        out.push_str(&escape(&text));
        for end in close.iter().rev() {
            out.push_str(end);
        }
        i = j;
    }
    out
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Parse the small tag vocabulary `serialize` emits (plus strong/em aliases).
fn parse(html: &str) -> Vec<StyledChar> {
    let mut out = Vec::new();
    let mut stack: Vec<(String, Marks)> = Vec::new();
    let mut marks = Marks::default();
    let mut rest = html;

    while let Some(ch) = rest.chars().next() {
        if ch == '<' {
            let Some(end) = rest.find('>') else {
                break;
            };
            let tag = &rest[1..end];
            rest = &rest[end + 1..];

            if let Some(name) = tag.strip_prefix('/') {
                let name = name.trim().to_ascii_lowercase();
                while let Some((open, saved)) = stack.pop() {
                    marks = saved;
                    if open == name {
                        break;
                    }
                }
                continue;
            }

            let mut parts = tag.splitn(2, char::is_whitespace);
            let name = parts.next().unwrap_or_default().to_ascii_lowercase();
            let attrs = parts.next().unwrap_or_default();
            if name == "br" {
                out.push(StyledChar {
                    ch: '\n',
                    marks: marks.clone(),
                });
                continue;
            }
            stack.push((name.clone(), marks.clone()));
            match name.as_str() {
                "b" | "strong" => marks.bold = true,
                "i" | "em" => marks.italic = true,
                "u" => marks.underline = true,
                "a" => marks.link = attr(attrs, "href"),
                "font" => {
                    if let Some(color) = attr(attrs, "color") {
                        marks.color = Some(color);
                    }
                    if let Some(size) = attr(attrs, "size").and_then(|s| s.parse().ok()) {
                        marks.size = Some(size);
                    }
                }
                _ => {}
            }
        } else if ch == '&' {
            let (decoded, consumed) = match rest.find(';') {
                Some(end) if end <= 6 => match &rest[..=end] {
                    "&amp;" => ('&', end + 1),
                    "&lt;" => ('<', end + 1),
                    "&gt;" => ('>', end + 1),
                    "&quot;" => ('"', end + 1),
                    "&#39;" => ('\'', end + 1),
                    _ => ('&', 1),
                },
                _ => ('&', 1),
            };
            out.push(StyledChar {
                ch: decoded,
                marks: marks.clone(),
            });
            rest = &rest[consumed..];
        } else {
            out.push(StyledChar {
                ch,
                marks: marks.clone(),
            });
            rest = &rest[ch.len_utf8()..];
        }
    }
    out
}

fn attr(attrs: &str, name: &str) -> Option<String> {
    let needle = format!("{name}=\"");
    let start = attrs.find(&needle)? + needle.len();
    let len = attrs[start..].find('"')?;
    let raw = &attrs[start..start + len];
    Some(raw.replace("&quot;", "\"").replace("&lt;", "<").replace("&gt;", ">").replace("&amp;", "&"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markup_survives_render_and_read() {
        let page = FakePage::new();
        let node = page.add_text_field(None, "t", "");
        let html = "<a href=\"/x\">go</a> <b>bold <i>both</i></b> &amp; <font color=\"#ef4444\">red</font>";
        page.render_field(&node, &FieldValue::text(html)).unwrap();
        assert_eq!(page.text(node), "go bold both & red");
        assert_eq!(
            page.html(node),
            "<a href=\"/x\">go</a> <b>bold </b><b><i>both</i></b> &amp; <font color=\"#ef4444\">red</font>"
        );
    }

    #[test]
    fn test_bold_toggle_on_partial_span() {
        let page = FakePage::new();
        let node = page.add_text_field(None, "t", "Hello world");
        page.select(node, 0, 5);
        page.exec_command(NativeCommand::Bold).unwrap();
        assert_eq!(page.html(node), "<b>Hello</b> world");

        // Mixed span: everything becomes bold first.
        page.select(node, 3, 8);
        page.exec_command(NativeCommand::Bold).unwrap();
        assert_eq!(page.html(node), "<b>Hello wo</b>rld");
    }

    #[test]
    fn test_exec_without_selection_fails() {
        let page = FakePage::new();
        page.add_text_field(None, "t", "Hello");
        assert!(page.exec_command(NativeCommand::Bold).is_err());
        assert!(page.range_rect().is_err());
    }
}
