use crate::attachments::read_attachment;
use crate::errors::{AppError, AppResult};
use crate::models::{Subject, Task};
use crate::parser::{format_deadline_input, parse_deadline, parse_title};
use crate::queries::find_task;
use crate::store::Store;
use chrono::{DateTime, Utc};
use std::path::PathBuf;

pub const NOTES_PLACEHOLDER: &str = "Add notes here...";

/// What the task form holds at submit time.
#[derive(Clone, Debug, PartialEq)]
pub struct TaskFormInput {
    pub id: Option<i64>,
    pub title: String,
    pub subject_id: Option<i64>,
    pub deadline: String,
    pub attachment_paths: Vec<PathBuf>,
}

/// The fields copied into the form when a task is edited.
#[derive(Clone, Debug, PartialEq)]
pub struct TaskPrefill {
    pub id: i64,
    pub title: String,
    pub subject_id: i64,
    pub deadline: String,
    pub attachment_names: Vec<String>,
}

pub async fn submit_task_form(store: &Store, input: TaskFormInput) -> AppResult<i64> {
    let title = parse_title(&input.title);
    if title.is_empty() {
        return Err(AppError::InvalidInput("a title is required".to_string()));
    }
    let subject_id = input
        .subject_id
        .ok_or_else(|| AppError::InvalidInput("choose a subject".to_string()))?;
    let deadline = parse_deadline(&input.deadline).ok_or_else(|| {
        AppError::InvalidInput(format!(
            "deadline '{}' is not YYYY-MM-DDTHH:MM",
            input.deadline.trim()
        ))
    })?;

    let mut attachments = Vec::with_capacity(input.attachment_paths.len());
    for path in &input.attachment_paths {
        attachments.push(read_attachment(path).await?);
    }

    let mut task = Task::new(title, subject_id, deadline);
    task.attachments = attachments;

    if let Some(id) = input.id {
        let previous = find_task(store, id).await?;
        task = apply_edit(task, previous);
    }

    let key = store.put(&task).await?;
    tracing::info!(task_id = key, edited = input.id.is_some(), "task saved");
    Ok(key)
}

/// Carries over what an edit never changes: the id, the completion state
/// and, when no new files were chosen, the attachments.
pub fn apply_edit(mut draft: Task, previous: Task) -> Task {
    draft.id = previous.id;
    draft.is_complete = previous.is_complete;
    draft.completed_at = previous.completed_at;
    if draft.attachments.is_empty() {
        draft.attachments = previous.attachments;
    }
    draft
}

pub async fn submit_subject_form(store: &Store, name: &str, teacher: &str) -> AppResult<i64> {
    let name = parse_title(name);
    if name.is_empty() {
        return Err(AppError::InvalidInput("a subject name is required".to_string()));
    }
    let teacher = teacher.trim();
    let subject = Subject {
        id: None,
        name,
        teacher: (!teacher.is_empty()).then(|| teacher.to_string()),
        notes: Some(NOTES_PLACEHOLDER.to_string()),
    };
    let key = store.put(&subject).await?;
    tracing::info!(subject_id = key, "subject created");
    Ok(key)
}

pub async fn toggle_task(
    store: &Store,
    task_id: i64,
    checked: bool,
    now: DateTime<Utc>,
) -> AppResult<Task> {
    let mut task = find_task(store, task_id).await?;
    task.set_complete(checked, now);
    store.put(&task).await?;
    tracing::info!(task_id, complete = checked, "task toggled");
    Ok(task)
}

pub async fn load_task_for_edit(store: &Store, task_id: i64) -> AppResult<TaskPrefill> {
    let task = find_task(store, task_id).await?;
    Ok(TaskPrefill {
        id: task_id,
        title: task.title,
        subject_id: task.subject_id,
        deadline: format_deadline_input(&task.deadline),
        attachment_names: task.attachments.into_iter().map(|a| a.name).collect(),
    })
}
