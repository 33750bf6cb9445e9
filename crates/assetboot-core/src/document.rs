//! Document model.
//!
//! The document is the only shared resource the loader writes to: every
//! load attaches an element, marks it loaded or failed, and the racing
//! loader may detach a losing element. Scripts that load successfully can
//! be bound to a global name.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::asset::{AssetKind, AssetSource};

/// Identifier of an element, unique within one document.
pub type ElementId = u64;

/// Load state of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementState {
    Pending,
    Loaded,
    Failed,
}

/// An element attached to the document head.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    pub id: ElementId,
    pub asset: String,
    pub url: String,
    pub kind: AssetKind,
    pub source: AssetSource,
    pub state: ElementState,
    /// Size of the loaded body in bytes, once loaded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<usize>,
}

/// In-memory document.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Attached elements in insertion order.
    elements: Vec<Element>,
    /// Global name -> element id.
    globals: BTreeMap<String, ElementId>,
    #[serde(skip)]
    next_id: ElementId,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a pending element and return its id.
    pub fn attach(
        &mut self,
        asset: &str,
        url: &str,
        kind: AssetKind,
        source: AssetSource,
    ) -> ElementId {
        let id = self.next_id;
        self.next_id += 1;
        self.elements.push(Element {
            id,
            asset: asset.to_string(),
            url: url.to_string(),
            kind,
            source,
            state: ElementState::Pending,
            size: None,
        });
        id
    }

    /// Detach an element. Returns it if it was attached.
    ///
    /// Any global bound to the element is removed with it.
    pub fn detach(&mut self, id: ElementId) -> Option<Element> {
        let index = self.elements.iter().position(|e| e.id == id)?;
        self.globals.retain(|_, bound| *bound != id);
        Some(self.elements.remove(index))
    }

    /// Mark an element loaded. Returns `false` if it is no longer attached.
    pub fn mark_loaded(&mut self, id: ElementId, size: usize) -> bool {
        match self.element_mut(id) {
            Some(element) => {
                element.state = ElementState::Loaded;
                element.size = Some(size);
                true
            }
            None => false,
        }
    }

    /// Mark an element failed. Returns `false` if it is no longer attached.
    pub fn mark_failed(&mut self, id: ElementId) -> bool {
        match self.element_mut(id) {
            Some(element) => {
                element.state = ElementState::Failed;
                true
            }
            None => false,
        }
    }

    /// Bind a global name to a loaded element.
    ///
    /// Rebinding a name replaces the previous binding. Returns `false` if the
    /// element is not attached.
    pub fn bind_global(&mut self, name: &str, id: ElementId) -> bool {
        if !self.is_attached(id) {
            return false;
        }
        self.globals.insert(name.to_string(), id);
        true
    }

    /// Element bound to a global name.
    pub fn global(&self, name: &str) -> Option<&Element> {
        self.globals.get(name).and_then(|id| self.element(*id))
    }

    /// Names of all bound globals, sorted.
    pub fn global_names(&self) -> impl Iterator<Item = &str> {
        self.globals.keys().map(String::as_str)
    }

    pub fn is_attached(&self, id: ElementId) -> bool {
        self.elements.iter().any(|e| e.id == id)
    }

    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.elements.iter().find(|e| e.id == id)
    }

    fn element_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        self.elements.iter_mut().find(|e| e.id == id)
    }

    /// Attached elements in insertion order.
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Attached elements that finished loading.
    pub fn loaded(&self) -> impl Iterator<Item = &Element> {
        self.elements
            .iter()
            .filter(|e| e.state == ElementState::Loaded)
    }

    /// Attached elements still waiting for their outcome.
    pub fn pending(&self) -> impl Iterator<Item = &Element> {
        self.elements
            .iter()
            .filter(|e| e.state == ElementState::Pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attach_and_mark() {
        let mut doc = Document::new();
        let css = doc.attach("Bootstrap CSS", "/css/b.css", AssetKind::Stylesheet, AssetSource::Local);
        let js = doc.attach("Vue", "/js/vue.js", AssetKind::Script, AssetSource::Local);
        assert_ne!(css, js);

        assert!(doc.mark_loaded(css, 120));
        assert!(doc.mark_failed(js));

        assert_eq!(doc.element(css).unwrap().state, ElementState::Loaded);
        assert_eq!(doc.element(css).unwrap().size, Some(120));
        assert_eq!(doc.element(js).unwrap().state, ElementState::Failed);
        assert_eq!(doc.loaded().count(), 1);
        assert_eq!(doc.pending().count(), 0);
    }

    #[test]
    fn test_detached_elements_ignore_updates() {
        let mut doc = Document::new();
        let id = doc.attach("Vue", "/js/vue.js", AssetKind::Script, AssetSource::Local);

        let removed = doc.detach(id).unwrap();
        assert_eq!(removed.state, ElementState::Pending);
        assert!(!doc.is_attached(id));
        assert!(!doc.mark_loaded(id, 10));
        assert!(!doc.bind_global("Vue", id));
        assert!(doc.detach(id).is_none());
        assert!(doc.elements().is_empty());
    }

    #[test]
    fn test_globals_follow_elements() {
        let mut doc = Document::new();
        let local = doc.attach("Vue", "/js/vue.js", AssetKind::Script, AssetSource::Local);
        let cdn = doc.attach("Vue", "https://cdn/vue.js", AssetKind::Script, AssetSource::Cdn);

        assert!(doc.bind_global("Vue", local));
        assert_eq!(doc.global("Vue").unwrap().source, AssetSource::Local);

        assert!(doc.bind_global("Vue", cdn));
        assert_eq!(doc.global("Vue").unwrap().source, AssetSource::Cdn);

        doc.detach(cdn);
        assert!(doc.global("Vue").is_none());
        assert_eq!(doc.global_names().count(), 0);
    }

    #[test]
    fn test_serializes_elements_and_globals() {
        let mut doc = Document::new();
        let id = doc.attach("uPlot", "/js/uPlot.js", AssetKind::Script, AssetSource::Local);
        doc.mark_loaded(id, 5);
        doc.bind_global("uPlot", id);

        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["elements"][0]["state"], "loaded");
        assert_eq!(json["elements"][0]["kind"], "script");
        assert_eq!(json["globals"]["uPlot"], 0);
        assert!(json.get("nextId").is_none());
    }
}
