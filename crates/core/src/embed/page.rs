//! In-memory [`HostPage`] for rendering embed snippets server-side.

use core::fmt::{self, Write as _};

use super::{ElementHandle, EmbedError, HostPage, validate_container_id};

#[derive(Debug, Clone)]
enum Kind {
    Container,
    Style { css: String },
    Script { src: String },
    /// A rendered widget frame.
    Frame,
}

#[derive(Debug, Clone)]
struct Element {
    handle: ElementHandle,
    id: Option<String>,
    parent: Option<String>,
    kind: Kind,
}

/// A flat list of elements grouped by container id.
///
/// Containers are top-level; everything else lives in exactly one container.
#[derive(Debug, Clone, Default)]
pub struct StaticPage {
    elements: Vec<Element>,
    next_handle: u64,
}

impl StaticPage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A page holding a single empty container.
    #[must_use]
    pub fn with_container(container_id: &str) -> Self {
        let mut page = Self::new();
        page.add_container(container_id);
        page
    }

    /// Add a top-level container element.
    pub fn add_container(&mut self, container_id: &str) -> ElementHandle {
        self.push(Some(container_id.to_string()), None, Kind::Container)
    }

    /// Add a rendered widget frame, as if the provider's script had already run.
    ///
    /// # Errors
    ///
    /// Returns an error if the container does not exist.
    pub fn append_widget_instance(
        &mut self,
        container_id: &str,
        element_id: &str,
    ) -> Result<ElementHandle, EmbedError> {
        self.require_container(container_id)?;
        Ok(self.push(
            Some(element_id.to_string()),
            Some(container_id.to_string()),
            Kind::Frame,
        ))
    }

    /// Container id an element currently lives in.
    #[must_use]
    pub fn parent_of(&self, element: ElementHandle) -> Option<&str> {
        self.get(element).and_then(|e| e.parent.as_deref())
    }

    #[must_use]
    pub fn script_count(&self) -> usize {
        self.elements
            .iter()
            .filter(|e| matches!(e.kind, Kind::Script { .. }))
            .count()
    }

    #[must_use]
    pub fn style_count(&self) -> usize {
        self.elements
            .iter()
            .filter(|e| matches!(e.kind, Kind::Style { .. }))
            .count()
    }

    /// Render a container and its children as HTML.
    ///
    /// Returns `None` if the container does not exist or its id is not safe to
    /// write unescaped (see [`validate_container_id`]). Other values are
    /// written as given; they come from a validated [`FormWidget`](super::FormWidget).
    #[must_use]
    pub fn render_container(&self, container_id: &str) -> Option<String> {
        if !self.has_container(container_id) || validate_container_id(container_id).is_err() {
            return None;
        }

        let mut html = String::new();
        self.write_container(&mut html, container_id).ok()?;
        Some(html)
    }

    fn write_container(&self, html: &mut String, container_id: &str) -> fmt::Result {
        writeln!(html, "<div id=\"{container_id}\">")?;
        for element in self
            .elements
            .iter()
            .filter(|e| e.parent.as_deref() == Some(container_id))
        {
            match &element.kind {
                Kind::Style { css } => writeln!(html, "<style>\n{css}\n</style>")?,
                Kind::Script { src } => {
                    writeln!(html, "<script type=\"text/javascript\" src=\"{src}\"></script>")?;
                }
                Kind::Frame => writeln!(
                    html,
                    "<iframe id=\"{}\"></iframe>",
                    element.id.as_deref().unwrap_or_default()
                )?,
                Kind::Container => {}
            }
        }
        writeln!(html, "</div>")
    }

    fn push(&mut self, id: Option<String>, parent: Option<String>, kind: Kind) -> ElementHandle {
        let handle = ElementHandle(self.next_handle);
        self.next_handle += 1;
        self.elements.push(Element {
            handle,
            id,
            parent,
            kind,
        });
        handle
    }

    fn get(&self, element: ElementHandle) -> Option<&Element> {
        self.elements.iter().find(|e| e.handle == element)
    }

    fn require_container(&self, container_id: &str) -> Result<(), EmbedError> {
        if self.has_container(container_id) {
            Ok(())
        } else {
            Err(EmbedError::ContainerNotFound(container_id.to_string()))
        }
    }
}

impl HostPage for StaticPage {
    fn has_container(&self, container_id: &str) -> bool {
        self.elements
            .iter()
            .any(|e| matches!(e.kind, Kind::Container) && e.id.as_deref() == Some(container_id))
    }

    fn find_by_id(&self, element_id: &str) -> Option<ElementHandle> {
        self.elements
            .iter()
            .find(|e| e.id.as_deref() == Some(element_id))
            .map(|e| e.handle)
    }

    fn find_script(&self, src: &str) -> Option<ElementHandle> {
        self.elements
            .iter()
            .find(|e| matches!(&e.kind, Kind::Script { src: s } if s == src))
            .map(|e| e.handle)
    }

    fn move_into(&mut self, element: ElementHandle, container_id: &str) -> Result<(), EmbedError> {
        self.require_container(container_id)?;
        let position = self
            .elements
            .iter()
            .position(|e| e.handle == element)
            .ok_or(EmbedError::ElementNotFound)?;

        // Re-append so the element ends up last in its new container.
        let mut moved = self.elements.remove(position);
        moved.parent = Some(container_id.to_string());
        self.elements.push(moved);
        Ok(())
    }

    fn append_style(&mut self, container_id: &str, css: &str) -> Result<ElementHandle, EmbedError> {
        self.require_container(container_id)?;
        Ok(self.push(
            None,
            Some(container_id.to_string()),
            Kind::Style {
                css: css.to_string(),
            },
        ))
    }

    fn append_script(&mut self, container_id: &str, src: &str) -> Result<ElementHandle, EmbedError> {
        self.require_container(container_id)?;
        Ok(self.push(
            None,
            Some(container_id.to_string()),
            Kind::Script {
                src: src.to_string(),
            },
        ))
    }

    fn remove(&mut self, element: ElementHandle) -> bool {
        let before = self.elements.len();
        self.elements.retain(|e| e.handle != element);
        self.elements.len() != before
    }
}
