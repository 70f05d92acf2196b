//! Form widget embed snippet.

use order_intake_core::embed::{FormEmbedController, FormWidget, StaticPage};

use super::CliError;

/// Render the container markup for a form, same as `GET /embed/forms/{id}`.
///
/// # Errors
///
/// Returns an error if the form id or container id is not valid.
pub fn snippet(form_id: &str, script_base: &str, container: &str) -> Result<String, CliError> {
    let widget = FormWidget::new(form_id, script_base, container)?;
    let mut page = StaticPage::with_container(container);
    FormEmbedController::new(widget).mount(&mut page)?;

    Ok(page.render_container(container).unwrap_or_default())
}
