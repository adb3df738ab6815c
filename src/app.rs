use crate::attachments::{materialize, AttachmentHandle};
use crate::charts::ChartSlot;
use crate::errors::{AppError, AppResult};
use crate::forms::{SubjectForm, TaskField, TaskForm};
use crate::handlers::{
    load_task_for_edit, submit_subject_form, submit_task_form, toggle_task,
};
use crate::nav::{Navigation, Page};
use crate::queries::{find_subject, find_task, list_subjects, list_tasks, list_tasks_for_subject};
use crate::store::Store;
use crate::views::{
    render_home, render_progress, render_subject_detail, render_subjects, HomeView, ProgressView,
    SubjectDetailView, SubjectsView,
};
use chrono::{Local, Locale, Utc};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::widgets::ListState;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    TaskForm,
    SubjectForm,
}

pub struct App {
    store: Store,
    pub locale: Locale,
    pub nav: Navigation,
    pub input_mode: InputMode,
    pub home: HomeView,
    pub subjects: SubjectsView,
    pub detail: Option<SubjectDetailView>,
    pub progress: ProgressView,
    pub subject_progress_chart: ChartSlot,
    pub tasks_per_day_chart: ChartSlot,
    pub tasks_by_subject_chart: ChartSlot,
    pub task_form: TaskForm,
    pub subject_form: SubjectForm,
    pub home_state: ListState,
    pub subjects_state: ListState,
    pub opened_attachments: Vec<AttachmentHandle>,
    pub status: Option<String>,
}

impl App {
    pub fn new(store: Store, locale: Locale) -> App {
        App {
            store,
            locale,
            nav: Navigation::default(),
            input_mode: InputMode::Normal,
            home: HomeView::default(),
            subjects: SubjectsView::default(),
            detail: None,
            progress: ProgressView::default(),
            subject_progress_chart: ChartSlot::new("subject-progress-chart"),
            tasks_per_day_chart: ChartSlot::new("tasks-per-day-chart"),
            tasks_by_subject_chart: ChartSlot::new("tasks-by-subject-chart"),
            task_form: TaskForm::default(),
            subject_form: SubjectForm::default(),
            home_state: ListState::default(),
            subjects_state: ListState::default(),
            opened_attachments: Vec::new(),
            status: None,
        }
    }

    pub async fn initialize(&mut self) -> AppResult<()> {
        self.show_page(Page::Home).await?;
        self.render_subjects().await?;
        self.render_home().await
    }

    pub async fn show_page(&mut self, page: Page) -> AppResult<()> {
        if self.nav.show(page) {
            self.render_progress().await?;
        }
        Ok(())
    }

    pub async fn render_home(&mut self) -> AppResult<()> {
        let tasks = list_tasks(&self.store).await?;
        let subjects = list_subjects(&self.store).await?;
        self.home = render_home(tasks, &subjects, Local::now().naive_local(), self.locale);
        self.opened_attachments.clear();
        clamp_selection(&mut self.home_state, self.home.visible_len());
        Ok(())
    }

    pub async fn render_subjects(&mut self) -> AppResult<()> {
        let subjects = list_subjects(&self.store).await?;
        self.subjects = render_subjects(&subjects);
        clamp_selection(&mut self.subjects_state, self.subjects.cards.len());
        Ok(())
    }

    /// Does nothing when the subject does not exist.
    pub async fn show_subject_detail(&mut self, subject_id: i64) -> AppResult<()> {
        let Some(subject) = find_subject(&self.store, subject_id).await? else {
            tracing::debug!(subject_id, "subject not found, detail view skipped");
            return Ok(());
        };
        let tasks = list_tasks_for_subject(&self.store, subject_id).await?;
        let view = render_subject_detail(&subject, &tasks, self.locale);

        self.nav.set_title(&view.title);
        self.subject_progress_chart.redraw(view.pie_chart());
        self.detail = Some(view);
        self.show_page(Page::SubjectDetail).await
    }

    pub async fn render_progress(&mut self) -> AppResult<()> {
        let tasks = list_tasks(&self.store).await?;
        let subjects = list_subjects(&self.store).await?;
        self.progress = render_progress(&tasks, &subjects, Local::now().date_naive(), self.locale);
        self.tasks_per_day_chart.redraw(self.progress.bar_chart());
        self.tasks_by_subject_chart.redraw(self.progress.donut_chart());
        Ok(())
    }

    fn selection_len(&self) -> usize {
        match self.nav.active() {
            Page::Home => self.home.visible_len(),
            Page::Subjects => self.subjects.cards.len(),
            Page::SubjectDetail | Page::Progress => 0,
        }
    }

    fn selection_state(&mut self) -> Option<&mut ListState> {
        match self.nav.active() {
            Page::Home => Some(&mut self.home_state),
            Page::Subjects => Some(&mut self.subjects_state),
            Page::SubjectDetail | Page::Progress => None,
        }
    }

    pub fn next(&mut self) {
        let len = self.selection_len();
        if len == 0 {
            return;
        }
        if let Some(state) = self.selection_state() {
            let i = match state.selected() {
                Some(i) => {
                    if i >= len - 1 {
                        0
                    } else {
                        i + 1
                    }
                }
                None => 0,
            };
            state.select(Some(i));
        }
    }

    pub fn previous(&mut self) {
        let len = self.selection_len();
        if len == 0 {
            return;
        }
        if let Some(state) = self.selection_state() {
            let i = match state.selected() {
                Some(i) => {
                    if i == 0 {
                        len - 1
                    } else {
                        i - 1
                    }
                }
                None => 0,
            };
            state.select(Some(i));
        }
    }

    pub fn selected_task_id(&self) -> Option<i64> {
        let index = self.home_state.selected()?;
        self.home.visible_tasks().nth(index)?.task_id
    }

    pub fn selected_subject_id(&self) -> Option<i64> {
        let index = self.subjects_state.selected()?;
        self.subjects.cards.get(index)?.subject_id
    }

    pub async fn toggle_selected(&mut self) -> AppResult<()> {
        let Some(task_id) = self.selected_task_id() else {
            return Ok(());
        };
        let checked = !self
            .home
            .visible_tasks()
            .find(|card| card.task_id == Some(task_id))
            .map(|card| card.is_complete)
            .unwrap_or(false);
        toggle_task(&self.store, task_id, checked, Utc::now()).await?;
        self.render_home().await
    }

    pub async fn edit_selected(&mut self) -> AppResult<()> {
        let Some(task_id) = self.selected_task_id() else {
            return Ok(());
        };
        let prefill = load_task_for_edit(&self.store, task_id).await?;
        self.task_form.open_edit(prefill, &self.subjects.options);
        self.input_mode = InputMode::TaskForm;
        Ok(())
    }

    pub fn open_new_task(&mut self) {
        self.task_form.open_new();
        self.input_mode = InputMode::TaskForm;
    }

    /// Writes the selected task's attachments to temporary files.
    pub async fn open_selected_attachments(&mut self) -> AppResult<()> {
        let Some(task_id) = self.selected_task_id() else {
            return Ok(());
        };
        let task = find_task(&self.store, task_id).await?;
        let handles = task
            .attachments
            .iter()
            .map(materialize)
            .collect::<AppResult<Vec<_>>>()?;

        self.status = Some(if handles.is_empty() {
            "No attachments.".to_string()
        } else {
            handles
                .iter()
                .map(|h| format!("{} {} -> {}", h.kind.icon(), h.name, h.path().display()))
                .collect::<Vec<_>>()
                .join("  ")
        });
        self.opened_attachments = handles;
        Ok(())
    }

    pub async fn submit_task_form(&mut self) -> AppResult<()> {
        let input = self.task_form.input(&self.subjects.options);
        submit_task_form(&self.store, input).await?;
        self.task_form.close();
        self.input_mode = InputMode::Normal;
        self.render_home().await
    }

    pub async fn submit_subject_form(&mut self) -> AppResult<()> {
        submit_subject_form(&self.store, &self.subject_form.name, &self.subject_form.teacher).await?;
        self.subject_form.reset_and_hide();
        self.input_mode = InputMode::Normal;
        self.render_subjects().await
    }

    fn report(&mut self, err: AppError) {
        tracing::warn!(error = %err, "operation failed");
        match self.input_mode {
            InputMode::TaskForm => self.task_form.error = Some(err.to_string()),
            InputMode::SubjectForm => self.subject_form.error = Some(err.to_string()),
            InputMode::Normal => self.status = Some(err.to_string()),
        }
    }

    /// Returns true when the user asked to quit.
    pub async fn handle_input(&mut self, key: KeyEvent) -> bool {
        let result = match self.input_mode {
            InputMode::Normal => {
                self.status = None;
                match key.code {
                    KeyCode::Char('q') => return true,
                    KeyCode::Char('j') | KeyCode::Down => {
                        self.next();
                        Ok(())
                    }
                    KeyCode::Char('k') | KeyCode::Up => {
                        self.previous();
                        Ok(())
                    }
                    KeyCode::Char('1') => self.show_page(Page::Home).await,
                    KeyCode::Char('2') => self.show_page(Page::Subjects).await,
                    KeyCode::Char('3') => self.show_page(Page::Progress).await,
                    code => self.handle_page_key(code).await,
                }
            }
            InputMode::TaskForm => match key.code {
                KeyCode::Esc => {
                    self.task_form.close();
                    self.input_mode = InputMode::Normal;
                    Ok(())
                }
                KeyCode::Tab => {
                    self.task_form.next_field();
                    Ok(())
                }
                KeyCode::BackTab => {
                    self.task_form.previous_field();
                    Ok(())
                }
                KeyCode::Left | KeyCode::Right if self.task_form.focus == TaskField::Subject => {
                    let forward = key.code == KeyCode::Right;
                    self.task_form
                        .cycle_subject(forward, self.subjects.options.len());
                    Ok(())
                }
                KeyCode::Enter => self.submit_task_form().await,
                KeyCode::Char(c) => {
                    self.task_form.push_char(c);
                    Ok(())
                }
                KeyCode::Backspace => {
                    self.task_form.backspace();
                    Ok(())
                }
                _ => Ok(()),
            },
            InputMode::SubjectForm => match key.code {
                KeyCode::Esc => {
                    self.subject_form.cancel();
                    self.input_mode = InputMode::Normal;
                    Ok(())
                }
                KeyCode::Tab | KeyCode::BackTab => {
                    self.subject_form.next_field();
                    Ok(())
                }
                KeyCode::Enter => self.submit_subject_form().await,
                KeyCode::Char(c) => {
                    self.subject_form.push_char(c);
                    Ok(())
                }
                KeyCode::Backspace => {
                    self.subject_form.backspace();
                    Ok(())
                }
                _ => Ok(()),
            },
        };

        if let Err(err) = result {
            self.report(err);
        }
        false
    }

    async fn handle_page_key(&mut self, code: KeyCode) -> AppResult<()> {
        match (self.nav.active(), code) {
            (Page::Home, KeyCode::Char('x') | KeyCode::Char(' ')) => self.toggle_selected().await,
            (Page::Home, KeyCode::Char('e')) => self.edit_selected().await,
            (Page::Home, KeyCode::Char('o')) => self.open_selected_attachments().await,
            (Page::Subjects, KeyCode::Char('a')) => {
                self.subject_form.show();
                self.input_mode = InputMode::SubjectForm;
                Ok(())
            }
            (Page::Subjects, KeyCode::Enter) => match self.selected_subject_id() {
                Some(subject_id) => self.show_subject_detail(subject_id).await,
                None => Ok(()),
            },
            (Page::SubjectDetail, KeyCode::Char('b') | KeyCode::Esc) => {
                self.show_page(Page::Subjects).await
            }
            (_, KeyCode::Char('a')) => {
                self.open_new_task();
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

fn clamp_selection(state: &mut ListState, len: usize) {
    match state.selected() {
        _ if len == 0 => state.select(None),
        Some(i) if i >= len => state.select(Some(len - 1)),
        None => state.select(Some(0)),
        Some(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::submit_subject_form as create_subject;
    use crossterm::event::KeyModifiers;
    use tempfile::TempDir;

    async fn app() -> (TempDir, App) {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = Store::open(&dir.path().join("db.sqlite3"), 1).await.unwrap();
        let mut app = App::new(store, Locale::en_US);
        app.initialize().await.unwrap();
        (dir, app)
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    async fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.handle_input(key(KeyCode::Char(c))).await;
        }
    }

    #[tokio::test]
    async fn test_initialize_shows_home_with_placeholder_option() {
        let (_dir, app) = app().await;
        assert_eq!(app.nav.active(), Page::Home);
        assert_eq!(app.nav.title(), "TaskNavy");
        assert_eq!(app.subjects.options.len(), 1);
        assert_eq!(app.home.visible_len(), 0);
        assert_eq!(app.home_state.selected(), None);
    }

    #[tokio::test]
    async fn test_missing_subject_detail_is_a_no_op() {
        let (_dir, mut app) = app().await;
        app.show_page(Page::Subjects).await.unwrap();
        app.show_subject_detail(7).await.unwrap();
        assert_eq!(app.nav.active(), Page::Subjects);
        assert!(app.detail.is_none());
        assert!(app.subject_progress_chart.current().is_none());
    }

    #[tokio::test]
    async fn test_subject_detail_redraws_single_chart() {
        let (_dir, mut app) = app().await;
        let id = create_subject(&app.store, "Math", "Mr. Budi").await.unwrap();

        app.show_subject_detail(id).await.unwrap();
        app.show_subject_detail(id).await.unwrap();

        assert_eq!(app.nav.active(), Page::SubjectDetail);
        assert_eq!(app.nav.title(), "Math");
        assert_eq!(app.subject_progress_chart.live_charts(), 1);
        let chart = app.subject_progress_chart.current().unwrap();
        assert_eq!(chart.instance(), 2);
        assert_eq!(chart.data().values, vec![0, 0]);
    }

    #[tokio::test]
    async fn test_progress_page_rerenders_every_visit() {
        let (_dir, mut app) = app().await;
        app.handle_input(key(KeyCode::Char('3'))).await;
        app.handle_input(key(KeyCode::Char('1'))).await;
        app.handle_input(key(KeyCode::Char('3'))).await;

        assert_eq!(app.nav.title(), "Progress Statistics");
        assert_eq!(app.tasks_per_day_chart.current().unwrap().instance(), 2);
        assert_eq!(app.tasks_by_subject_chart.live_charts(), 1);
        assert_eq!(app.progress.days.len(), 7);
    }

    #[tokio::test]
    async fn test_subject_form_flow_by_keys() {
        let (_dir, mut app) = app().await;
        app.handle_input(key(KeyCode::Char('2'))).await;
        app.handle_input(key(KeyCode::Char('a'))).await;
        assert_eq!(app.input_mode, InputMode::SubjectForm);
        assert!(!app.subject_form.show_add_control());

        type_text(&mut app, "Physics").await;
        app.handle_input(key(KeyCode::Tab)).await;
        type_text(&mut app, "Ms. Ana").await;
        app.handle_input(key(KeyCode::Enter)).await;

        assert_eq!(app.input_mode, InputMode::Normal);
        assert!(app.subject_form.show_add_control());
        assert_eq!(app.subjects.cards.len(), 1);
        assert_eq!(app.subjects.options[1].label, "Physics");

        app.handle_input(key(KeyCode::Enter)).await;
        assert_eq!(app.nav.active(), Page::SubjectDetail);
        assert_eq!(app.detail.as_ref().unwrap().teacher_line, "Teacher: Ms. Ana");

        app.handle_input(key(KeyCode::Char('b'))).await;
        assert_eq!(app.nav.active(), Page::Subjects);
    }

    #[tokio::test]
    async fn test_invalid_task_form_stays_open_with_error() {
        let (_dir, mut app) = app().await;
        app.handle_input(key(KeyCode::Char('a'))).await;
        assert_eq!(app.input_mode, InputMode::TaskForm);
        assert_eq!(app.task_form.heading, "New Task");

        type_text(&mut app, "Quiz").await;
        app.handle_input(key(KeyCode::Enter)).await;

        assert_eq!(app.input_mode, InputMode::TaskForm);
        assert!(app.task_form.visible);
        assert!(app.task_form.error.is_some());

        app.handle_input(key(KeyCode::Esc)).await;
        assert_eq!(app.input_mode, InputMode::Normal);
        assert!(!app.task_form.visible);
    }

    #[tokio::test]
    async fn test_task_form_round_trip_by_keys() {
        let (_dir, mut app) = app().await;
        create_subject(&app.store, "Math", "").await.unwrap();
        app.render_subjects().await.unwrap();

        let tomorrow = (Local::now() + chrono::Duration::days(1)).date_naive();
        let deadline = format!("{}T08:00", tomorrow.format("%Y-%m-%d"));

        app.handle_input(key(KeyCode::Char('a'))).await;
        type_text(&mut app, "HW1").await;
        app.handle_input(key(KeyCode::Tab)).await;
        app.handle_input(key(KeyCode::Right)).await;
        app.handle_input(key(KeyCode::Tab)).await;
        type_text(&mut app, &deadline).await;
        app.handle_input(key(KeyCode::Enter)).await;

        assert_eq!(app.input_mode, InputMode::Normal, "{:?}", app.task_form.error);
        assert_eq!(app.home.upcoming.len(), 1);
        assert_eq!(app.home.upcoming[0].subject_name, "Math");
        assert_eq!(app.selected_task_id(), Some(1));

        app.handle_input(key(KeyCode::Char('e'))).await;
        assert_eq!(app.task_form.heading, "Edit Task");
        assert_eq!(app.task_form.deadline, deadline);
        assert_eq!(app.task_form.subject_index, 1);
        app.handle_input(key(KeyCode::Esc)).await;

        app.handle_input(key(KeyCode::Char('x'))).await;
        assert!(app.home.upcoming.is_empty());
        let task = find_task(&app.store, 1).await.unwrap();
        assert!(task.is_complete);
        assert!(task.completed_at.is_some());
    }

    #[tokio::test]
    async fn test_opening_attachments_creates_temp_files() {
        let (dir, mut app) = app().await;
        let file = dir.path().join("slides.pdf");
        std::fs::write(&file, b"pdf").unwrap();
        let tomorrow = (Local::now() + chrono::Duration::days(1)).date_naive();
        crate::handlers::submit_task_form(
            &app.store,
            crate::handlers::TaskFormInput {
                id: None,
                title: "Slides".to_string(),
                subject_id: Some(1),
                deadline: format!("{}T08:00", tomorrow.format("%Y-%m-%d")),
                attachment_paths: vec![file],
            },
        )
        .await
        .unwrap();
        app.render_home().await.unwrap();

        app.handle_input(key(KeyCode::Char('o'))).await;
        assert_eq!(app.opened_attachments.len(), 1);
        let path = app.opened_attachments[0].path_buf();
        assert_eq!(std::fs::read(&path).unwrap(), b"pdf");
        assert!(app.status.as_deref().unwrap().contains("slides.pdf ->"));

        app.render_home().await.unwrap();
        assert!(app.opened_attachments.is_empty());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_status_clears_on_next_normal_key() {
        let (_dir, mut app) = app().await;
        app.status = Some("store unavailable".to_string());
        app.handle_input(key(KeyCode::Char('3'))).await;
        assert_eq!(app.nav.active(), Page::Progress);
        assert_eq!(app.status, None);

        app.status = Some("store unavailable".to_string());
        app.handle_input(key(KeyCode::Char('j'))).await;
        assert_eq!(app.status, None);
    }
}
