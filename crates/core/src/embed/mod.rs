//! Third-party form widget embedding.
//!
//! The widget provider serves one script per form. When loaded, the script
//! renders the form as an iframe next to itself. [`FormEmbedController`] makes
//! sure a page gets exactly one script/style pair per mount, no matter how often
//! it is activated, and cleans up only what it created.
//!
//! The page is reached through the [`HostPage`] trait. [`StaticPage`] is an
//! in-memory implementation used for server-side rendering of the snippet.
//!
//! # Example
//!
//! ```
//! use order_intake_core::embed::{FormEmbedController, FormWidget, MountOutcome, StaticPage};
//!
//! let widget = FormWidget::new("241234567890", "https://form.jotform.com/jsform/", "order-form")
//!     .unwrap();
//! let mut page = StaticPage::with_container("order-form");
//! let mut controller = FormEmbedController::new(widget);
//!
//! assert_eq!(controller.mount(&mut page).unwrap(), MountOutcome::Injected);
//! assert_eq!(controller.mount(&mut page).unwrap(), MountOutcome::AlreadyMounted);
//! assert_eq!(page.script_count(), 1);
//! ```

mod page;

pub use page::StaticPage;

use thiserror::Error;

/// Provider URL prefix for per-form widget scripts.
pub const DEFAULT_SCRIPT_BASE: &str = "https://form.jotform.com/jsform/";

/// Element id prefix the provider gives the iframe it renders.
pub const INSTANCE_ID_PREFIX: &str = "JotFormIFrame-";

/// Errors embedding a form widget.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmbedError {
    /// Form ids are path segments of the script URL; only ASCII alphanumerics are allowed.
    #[error("invalid form id: {0:?}")]
    InvalidFormId(String),

    /// Container ids are written into markup and CSS selectors; they must start
    /// with an ASCII letter followed by ASCII alphanumerics, `-` or `_`.
    #[error("invalid container id: {0:?}")]
    InvalidContainerId(String),

    /// The designated container is not in the page.
    #[error("container not found: #{0}")]
    ContainerNotFound(String),

    /// An element handle no longer refers to an element in the page.
    #[error("element not found")]
    ElementNotFound,
}

/// Check that a container id is safe to write into an `id` attribute and a
/// CSS id selector without escaping.
///
/// # Errors
///
/// Returns [`EmbedError::InvalidContainerId`] if the id is empty, does not
/// start with an ASCII letter, or contains anything other than ASCII
/// alphanumerics, `-` and `_`.
pub fn validate_container_id(container_id: &str) -> Result<(), EmbedError> {
    let mut chars = container_id.chars();
    let valid = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(EmbedError::InvalidContainerId(container_id.to_string()))
    }
}

/// Opaque handle to an element in a [`HostPage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementHandle(pub(crate) u64);

/// The hosting page's document, as far as the embed controller needs it.
pub trait HostPage {
    /// Returns true if an element with this id can hold children.
    fn has_container(&self, container_id: &str) -> bool;

    /// Find any element by its `id` attribute.
    fn find_by_id(&self, element_id: &str) -> Option<ElementHandle>;

    /// Find a script element by its `src` attribute.
    fn find_script(&self, src: &str) -> Option<ElementHandle>;

    /// Move an existing element to the end of a container.
    ///
    /// # Errors
    ///
    /// Returns an error if the element or the container does not exist.
    fn move_into(&mut self, element: ElementHandle, container_id: &str) -> Result<(), EmbedError>;

    /// Append a `<style>` element to a container.
    ///
    /// # Errors
    ///
    /// Returns an error if the container does not exist.
    fn append_style(&mut self, container_id: &str, css: &str) -> Result<ElementHandle, EmbedError>;

    /// Append a `<script src>` element to a container.
    ///
    /// # Errors
    ///
    /// Returns an error if the container does not exist.
    fn append_script(&mut self, container_id: &str, src: &str) -> Result<ElementHandle, EmbedError>;

    /// Remove an element. Returns false if it was already gone.
    fn remove(&mut self, element: ElementHandle) -> bool;
}

/// A provider-hosted form and where it goes in the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormWidget {
    form_id: String,
    script_base: String,
    container_id: String,
}

impl FormWidget {
    /// Describe a form widget.
    ///
    /// `script_base` is the provider's per-form script URL without the form id
    /// (for example `https://form.jotform.com/jsform/`).
    ///
    /// # Errors
    ///
    /// Returns [`EmbedError::InvalidFormId`] if the form id is empty or not
    /// ASCII alphanumeric, and [`EmbedError::InvalidContainerId`] if the
    /// container id fails [`validate_container_id`].
    pub fn new(form_id: &str, script_base: &str, container_id: &str) -> Result<Self, EmbedError> {
        if form_id.is_empty() || !form_id.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(EmbedError::InvalidFormId(form_id.to_string()));
        }
        validate_container_id(container_id)?;

        Ok(Self {
            form_id: form_id.to_string(),
            script_base: script_base.to_string(),
            container_id: container_id.to_string(),
        })
    }

    #[must_use]
    pub fn form_id(&self) -> &str {
        &self.form_id
    }

    #[must_use]
    pub fn container_id(&self) -> &str {
        &self.container_id
    }

    /// The provider's fixed script URL for this form.
    #[must_use]
    pub fn script_url(&self) -> String {
        format!("{}{}", self.script_base, self.form_id)
    }

    /// Element id of a rendered widget instance.
    #[must_use]
    pub fn instance_id(&self) -> String {
        format!("{INSTANCE_ID_PREFIX}{}", self.form_id)
    }

    /// Scoped overrides forcing the widget frame to fill its container.
    #[must_use]
    pub fn stylesheet(&self) -> String {
        format!(
            "#{container} {{ width: 100%; }}\n\
             #{container} iframe[id^=\"{prefix}\"] {{ width: 100% !important; min-width: 100% !important; height: 100% !important; border: none; }}",
            container = self.container_id,
            prefix = INSTANCE_ID_PREFIX,
        )
    }
}

/// What a call to [`FormEmbedController::mount`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountOutcome {
    /// Script and style were added to the container.
    Injected,
    /// A widget instance already in the page was moved into the container.
    Relocated,
    /// The widget script was already in the page; nothing was added.
    AlreadyPresent,
    /// This controller is already mounted; nothing changed.
    AlreadyMounted,
}

/// Elements this controller created, plus the loaded flag.
#[derive(Debug, Default)]
struct MountState {
    loaded: bool,
    script: Option<ElementHandle>,
    style: Option<ElementHandle>,
}

/// Mounts a [`FormWidget`] into a [`HostPage`] at most once.
#[derive(Debug)]
pub struct FormEmbedController {
    widget: FormWidget,
    state: MountState,
}

impl FormEmbedController {
    #[must_use]
    pub fn new(widget: FormWidget) -> Self {
        Self {
            widget,
            state: MountState::default(),
        }
    }

    /// Returns true between a successful mount and the next unmount.
    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        self.state.loaded
    }

    /// Ensure a single widget instance is present in the container.
    ///
    /// # Errors
    ///
    /// Returns [`EmbedError::ContainerNotFound`] if the page has no container
    /// with the widget's container id.
    pub fn mount<P: HostPage + ?Sized>(&mut self, page: &mut P) -> Result<MountOutcome, EmbedError> {
        if self.state.loaded {
            return Ok(MountOutcome::AlreadyMounted);
        }

        let container = self.widget.container_id();
        if !page.has_container(container) {
            return Err(EmbedError::ContainerNotFound(container.to_string()));
        }

        if let Some(instance) = page.find_by_id(&self.widget.instance_id()) {
            page.move_into(instance, container)?;
            self.state.loaded = true;
            tracing::debug!(form_id = %self.widget.form_id(), "Relocated existing form widget");
            return Ok(MountOutcome::Relocated);
        }

        let src = self.widget.script_url();
        if page.find_script(&src).is_some() {
            self.state.loaded = true;
            return Ok(MountOutcome::AlreadyPresent);
        }

        let style = page.append_style(container, &self.widget.stylesheet())?;
        let script = match page.append_script(container, &src) {
            Ok(script) => script,
            Err(e) => {
                page.remove(style);
                return Err(e);
            }
        };

        self.state = MountState {
            loaded: true,
            script: Some(script),
            style: Some(style),
        };
        tracing::debug!(form_id = %self.widget.form_id(), "Injected form widget");
        Ok(MountOutcome::Injected)
    }

    /// Remove the script and style this controller injected.
    ///
    /// A relocated pre-existing instance is left in place. The loaded flag is
    /// reset so a later mount runs again. Returns the number of elements removed.
    pub fn unmount<P: HostPage + ?Sized>(&mut self, page: &mut P) -> usize {
        let removed = [self.state.script.take(), self.state.style.take()]
            .into_iter()
            .flatten()
            .filter(|&element| page.remove(element))
            .count();
        self.state.loaded = false;
        removed
    }
}
