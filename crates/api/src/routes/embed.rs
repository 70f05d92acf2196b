//! Form widget embed snippet.

use axum::{
    extract::{Path, State},
    response::Html,
};
use tracing::instrument;

use order_intake_core::embed::{FormEmbedController, FormWidget, StaticPage};

use crate::error::{ApiError, Result};
use crate::state::AppState;

/// Render the container markup for a form widget.
///
/// GET /embed/forms/{form_id}
///
/// The snippet is what the order page drops in place: the container with one
/// scoped style and one widget script.
#[instrument(skip(state))]
pub async fn form(State(state): State<AppState>, Path(form_id): Path<String>) -> Result<Html<String>> {
    let config = &state.config().form_widget;
    let widget = FormWidget::new(&form_id, &config.script_base, &config.container_id)?;

    let mut page = StaticPage::with_container(&config.container_id);
    let mut controller = FormEmbedController::new(widget);
    let outcome = controller.mount(&mut page)?;
    tracing::debug!(?outcome, "Form widget mounted");

    page.render_container(&config.container_id)
        .map(Html)
        .ok_or_else(|| ApiError::Internal("embed container disappeared".to_string()))
}
