// Learning hub: seeded course content with per-visitor completion tracking.

use std::sync::Arc;

use askama::Template;
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};

use crate::error::AppError;
use crate::routes::helpers::render;
use crate::session::ToolVisitor;
use crate::state::{
    AppState, completed_module_ids, get_learning_module, list_learning_modules,
    log_tool_usage, mark_module_complete,
};

#[derive(Template)]
#[template(path = "personal/learning.html")]
struct LearningIndexTemplate {
    rows: Vec<ModuleRow>,
}

struct ModuleRow {
    id: String,
    title: String,
    summary: String,
    completed: bool,
}

pub async fn learning_index(
    State(state): State<Arc<AppState>>,
    visitor: ToolVisitor,
) -> Result<Response, AppError> {
    let completed = completed_module_ids(&state, visitor.user_id(), &visitor.session_id).await?;
    let rows = list_learning_modules(&state)
        .await?
        .into_iter()
        .map(|module| ModuleRow {
            completed: completed.contains(&module.id),
            id: module.id,
            title: module.title,
            summary: module.summary,
        })
        .collect();
    let mut response = render(LearningIndexTemplate { rows })?.into_response();
    visitor.attach_cookie(&mut response);
    Ok(response)
}

#[derive(Template)]
#[template(path = "personal/learning_module.html")]
struct LearningModuleTemplate {
    id: String,
    title: String,
    sections: Vec<String>,
    completed: bool,
}

pub async fn learning_module(
    State(state): State<Arc<AppState>>,
    visitor: ToolVisitor,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let module = get_learning_module(&state, &id)
        .await?
        .ok_or(AppError::NotFound)?;
    let completed = completed_module_ids(&state, visitor.user_id(), &visitor.session_id)
        .await?
        .contains(&module.id);
    log_tool_usage(
        &state,
        "learning_hub",
        visitor.user_id(),
        &visitor.session_id,
        "view_module",
    )
    .await?;
    let mut response = render(LearningModuleTemplate {
        id: module.id,
        title: module.title,
        sections: module.sections,
        completed,
    })?
    .into_response();
    visitor.attach_cookie(&mut response);
    Ok(response)
}

pub async fn learning_complete(
    State(state): State<Arc<AppState>>,
    visitor: ToolVisitor,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    if get_learning_module(&state, &id).await?.is_none() {
        return Err(AppError::NotFound);
    }
    mark_module_complete(&state, visitor.user_id(), &visitor.session_id, &id).await?;
    Ok(Redirect::to(&format!("/personal/learning/{id}")).into_response())
}
