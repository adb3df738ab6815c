//! Pure renderers. Each takes query results and produces the view state the
//! terminal draws; none of them touch the store.

use crate::attachments::AttachmentKind;
use crate::charts::{palette_for, ChartData, ChartKind, ACCENT_LIME, GRAY, NAVY_LIGHT};
use crate::models::{Subject, Task, DEFAULT_SUBJECT_NAME};
use chrono::{DateTime, Duration, Local, Locale, NaiveDate, NaiveDateTime, Utc};
use ratatui::style::Color;

pub const TODAY_PLACEHOLDER: &str = "No tasks today. Relax!";
pub const UPCOMING_PLACEHOLDER: &str = "No upcoming tasks.";
pub const SUBJECT_PLACEHOLDER_OPTION: &str = "Choose a subject...";
pub const NO_NOTES: &str = "No notes.";

/// `[00:00:00.000, 23:59:59.999]` of the given day.
pub fn day_window(date: NaiveDate) -> (NaiveDateTime, NaiveDateTime) {
    let start = date.and_time(chrono::NaiveTime::default());
    let end = start + Duration::days(1) - Duration::milliseconds(1);
    (start, end)
}

fn subject_name(subjects: &[Subject], subject_id: i64) -> String {
    subjects
        .iter()
        .find(|s| s.id == Some(subject_id))
        .map(|s| s.name.clone())
        .unwrap_or_else(|| DEFAULT_SUBJECT_NAME.to_string())
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

#[derive(Clone, Debug, PartialEq)]
pub struct AttachmentLink {
    pub name: String,
    pub kind: AttachmentKind,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TaskCard {
    pub task_id: Option<i64>,
    pub title: String,
    pub subject_name: String,
    pub deadline_label: String,
    pub is_complete: bool,
    pub attachments: Vec<AttachmentLink>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct ProgressRing {
    pub completed: usize,
    pub total: usize,
    pub percentage: u16,
}

impl ProgressRing {
    pub fn new(completed: usize, total: usize) -> ProgressRing {
        let percentage = if total == 0 {
            0
        } else {
            ((completed as f64 / total as f64) * 100.0).round() as u16
        };
        ProgressRing {
            completed,
            total,
            percentage,
        }
    }

    pub fn label(&self) -> String {
        format!("{}/{}", self.completed, self.total)
    }

    /// Sweep of the outer arc drawn over the inner disc.
    pub fn arc_degrees(&self) -> f64 {
        f64::from(self.percentage) * 3.6
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct HomeView {
    pub today: Vec<TaskCard>,
    pub upcoming: Vec<TaskCard>,
    pub ring: ProgressRing,
}

impl HomeView {
    /// Today's cards followed by upcoming ones, the order the list is drawn in.
    pub fn visible_tasks(&self) -> impl Iterator<Item = &TaskCard> {
        self.today.iter().chain(self.upcoming.iter())
    }

    pub fn visible_len(&self) -> usize {
        self.today.len() + self.upcoming.len()
    }
}

pub fn render_home(
    mut tasks: Vec<Task>,
    subjects: &[Subject],
    now: NaiveDateTime,
    locale: Locale,
) -> HomeView {
    tasks.sort_by_key(|task| task.deadline);
    let (day_start, day_end) = day_window(now.date());

    let mut view = HomeView::default();
    let mut today_total = 0;
    let mut today_completed = 0;

    for task in &tasks {
        let is_today = task.deadline >= day_start && task.deadline <= day_end;
        if is_today {
            today_total += 1;
            if task.is_complete {
                today_completed += 1;
            }
        }
        if task.is_complete {
            continue;
        }

        if is_today {
            view.today.push(task_card(task, subjects, locale));
        } else if task.deadline > day_end {
            view.upcoming.push(task_card(task, subjects, locale));
        }
    }

    view.ring = ProgressRing::new(today_completed, today_total);
    view
}

fn task_card(task: &Task, subjects: &[Subject], locale: Locale) -> TaskCard {
    TaskCard {
        task_id: task.id,
        title: task.title.clone(),
        subject_name: subject_name(subjects, task.subject_id),
        deadline_label: format!(
            "{} {}",
            task.deadline.date().format_localized("%x", locale),
            task.deadline.format("%H:%M")
        ),
        is_complete: task.is_complete,
        attachments: task
            .attachments
            .iter()
            .map(|a| AttachmentLink {
                name: a.name.clone(),
                kind: AttachmentKind::from_mime(&a.mime_type),
            })
            .collect(),
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SubjectCard {
    pub subject_id: Option<i64>,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SubjectOption {
    pub value: Option<i64>,
    pub label: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SubjectsView {
    pub cards: Vec<SubjectCard>,
    pub options: Vec<SubjectOption>,
}

impl Default for SubjectsView {
    fn default() -> Self {
        render_subjects(&[])
    }
}

pub fn render_subjects(subjects: &[Subject]) -> SubjectsView {
    let cards = subjects
        .iter()
        .map(|s| SubjectCard {
            subject_id: s.id,
            name: s.name.clone(),
        })
        .collect();

    let mut options = vec![SubjectOption {
        value: None,
        label: SUBJECT_PLACEHOLDER_OPTION.to_string(),
    }];
    options.extend(subjects.iter().map(|s| SubjectOption {
        value: s.id,
        label: s.name.clone(),
    }));

    SubjectsView { cards, options }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CompactTask {
    pub task_id: Option<i64>,
    pub title: String,
    pub deadline_label: String,
    pub is_complete: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SubjectDetailView {
    pub subject_id: Option<i64>,
    pub title: String,
    pub teacher_line: String,
    pub notes: String,
    pub tasks: Vec<CompactTask>,
    pub completed: u64,
    pub remaining: u64,
}

impl SubjectDetailView {
    pub fn pie_chart(&self) -> ChartData {
        ChartData {
            kind: ChartKind::Pie,
            labels: vec!["Completed".to_string(), "Remaining".to_string()],
            dataset_label: None,
            values: vec![self.completed, self.remaining],
            colors: vec![ACCENT_LIME, GRAY],
        }
    }
}

pub fn render_subject_detail(subject: &Subject, tasks: &[Task], locale: Locale) -> SubjectDetailView {
    let completed = tasks.iter().filter(|t| t.is_complete).count() as u64;
    SubjectDetailView {
        subject_id: subject.id,
        title: subject.name.clone(),
        teacher_line: format!("Teacher: {}", non_empty(&subject.teacher).unwrap_or("-")),
        notes: non_empty(&subject.notes).unwrap_or(NO_NOTES).to_string(),
        tasks: tasks
            .iter()
            .map(|t| CompactTask {
                task_id: t.id,
                title: t.title.clone(),
                deadline_label: t.deadline.date().format_localized("%x", locale).to_string(),
                is_complete: t.is_complete,
            })
            .collect(),
        completed,
        remaining: tasks.len() as u64 - completed,
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DayCount {
    pub date: NaiveDate,
    pub label: String,
    pub count: u64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SubjectShare {
    pub name: String,
    pub count: u64,
    pub color: Color,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProgressView {
    pub days: Vec<DayCount>,
    pub shares: Vec<SubjectShare>,
}

impl ProgressView {
    pub fn bar_chart(&self) -> ChartData {
        ChartData {
            kind: ChartKind::Bar,
            labels: self.days.iter().map(|d| d.label.clone()).collect(),
            dataset_label: Some("Tasks completed".to_string()),
            values: self.days.iter().map(|d| d.count).collect(),
            colors: vec![NAVY_LIGHT; self.days.len()],
        }
    }

    pub fn donut_chart(&self) -> ChartData {
        ChartData {
            kind: ChartKind::Doughnut,
            labels: self.shares.iter().map(|s| s.name.clone()).collect(),
            dataset_label: None,
            values: self.shares.iter().map(|s| s.count).collect(),
            colors: self.shares.iter().map(|s| s.color).collect(),
        }
    }
}

pub fn render_progress(
    tasks: &[Task],
    subjects: &[Subject],
    today: NaiveDate,
    locale: Locale,
) -> ProgressView {
    ProgressView {
        days: completions_last_7_days(tasks, today, locale),
        shares: tasks_per_subject(tasks, subjects),
    }
}

fn completed_local(completed_at: &DateTime<Utc>) -> NaiveDateTime {
    completed_at.with_timezone(&Local).naive_local()
}

/// Completions per day for the week ending today, oldest first.
pub fn completions_last_7_days(tasks: &[Task], today: NaiveDate, locale: Locale) -> Vec<DayCount> {
    (0..7)
        .rev()
        .map(|days_ago| {
            let date = today - Duration::days(days_ago);
            let (start, end) = day_window(date);
            let count = tasks
                .iter()
                .filter(|t| t.is_complete)
                .filter_map(|t| t.completed_at.as_ref())
                .map(completed_local)
                .filter(|at| *at >= start && *at <= end)
                .count() as u64;
            DayCount {
                date,
                label: date.format_localized("%a", locale).to_string(),
                count,
            }
        })
        .collect()
}

pub fn tasks_per_subject(tasks: &[Task], subjects: &[Subject]) -> Vec<SubjectShare> {
    let colors = palette_for(subjects.len());
    subjects
        .iter()
        .zip(colors)
        .map(|(subject, color)| SubjectShare {
            name: subject.name.clone(),
            count: tasks
                .iter()
                .filter(|t| Some(t.subject_id) == subject.id)
                .count() as u64,
            color,
        })
        .collect()
}
