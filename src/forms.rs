use crate::handlers::{TaskFormInput, TaskPrefill};
use crate::parser::parse_attachment_paths;
use crate::views::SubjectOption;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskField {
    Title,
    Subject,
    Deadline,
    Attachments,
}

impl TaskField {
    fn next(self) -> TaskField {
        match self {
            TaskField::Title => TaskField::Subject,
            TaskField::Subject => TaskField::Deadline,
            TaskField::Deadline => TaskField::Attachments,
            TaskField::Attachments => TaskField::Title,
        }
    }

    fn previous(self) -> TaskField {
        match self {
            TaskField::Title => TaskField::Attachments,
            TaskField::Subject => TaskField::Title,
            TaskField::Deadline => TaskField::Subject,
            TaskField::Attachments => TaskField::Deadline,
        }
    }
}

/// Buffers of the modal task form.
#[derive(Debug)]
pub struct TaskForm {
    pub visible: bool,
    pub heading: &'static str,
    pub id: Option<i64>,
    pub title: String,
    pub subject_index: usize,
    pub deadline: String,
    pub attachment_paths: String,
    pub existing_attachments: Vec<String>,
    pub focus: TaskField,
    pub error: Option<String>,
}

impl Default for TaskForm {
    fn default() -> Self {
        TaskForm {
            visible: false,
            heading: "New Task",
            id: None,
            title: String::new(),
            subject_index: 0,
            deadline: String::new(),
            attachment_paths: String::new(),
            existing_attachments: Vec::new(),
            focus: TaskField::Title,
            error: None,
        }
    }
}

impl TaskForm {
    pub fn open_new(&mut self) {
        *self = TaskForm {
            visible: true,
            ..TaskForm::default()
        };
    }

    pub fn open_edit(&mut self, prefill: TaskPrefill, options: &[SubjectOption]) {
        let subject_index = options
            .iter()
            .position(|o| o.value == Some(prefill.subject_id))
            .unwrap_or(0);
        *self = TaskForm {
            visible: true,
            heading: "Edit Task",
            id: Some(prefill.id),
            title: prefill.title,
            subject_index,
            deadline: prefill.deadline,
            existing_attachments: prefill.attachment_names,
            ..TaskForm::default()
        };
    }

    pub fn close(&mut self) {
        self.visible = false;
        self.error = None;
    }

    pub fn next_field(&mut self) {
        self.focus = self.focus.next();
    }

    pub fn previous_field(&mut self) {
        self.focus = self.focus.previous();
    }

    pub fn cycle_subject(&mut self, forward: bool, option_count: usize) {
        if option_count == 0 {
            return;
        }
        self.subject_index = if forward {
            (self.subject_index + 1) % option_count
        } else if self.subject_index == 0 {
            option_count - 1
        } else {
            self.subject_index - 1
        };
    }

    fn focused_buffer(&mut self) -> Option<&mut String> {
        match self.focus {
            TaskField::Title => Some(&mut self.title),
            TaskField::Subject => None,
            TaskField::Deadline => Some(&mut self.deadline),
            TaskField::Attachments => Some(&mut self.attachment_paths),
        }
    }

    pub fn push_char(&mut self, c: char) {
        if let Some(buffer) = self.focused_buffer() {
            buffer.push(c);
        }
    }

    pub fn backspace(&mut self) {
        if let Some(buffer) = self.focused_buffer() {
            buffer.pop();
        }
    }

    pub fn input(&self, options: &[SubjectOption]) -> TaskFormInput {
        TaskFormInput {
            id: self.id,
            title: self.title.clone(),
            subject_id: options.get(self.subject_index).and_then(|o| o.value),
            deadline: self.deadline.clone(),
            attachment_paths: parse_attachment_paths(&self.attachment_paths),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubjectField {
    Name,
    Teacher,
}

/// The inline subject form. While it is visible the "add subject" control
/// is hidden.
#[derive(Debug)]
pub struct SubjectForm {
    pub visible: bool,
    pub name: String,
    pub teacher: String,
    pub focus: SubjectField,
    pub error: Option<String>,
}

impl Default for SubjectForm {
    fn default() -> Self {
        SubjectForm {
            visible: false,
            name: String::new(),
            teacher: String::new(),
            focus: SubjectField::Name,
            error: None,
        }
    }
}

impl SubjectForm {
    pub fn show(&mut self) {
        self.visible = true;
    }

    pub fn cancel(&mut self) {
        self.visible = false;
        self.error = None;
    }

    pub fn reset_and_hide(&mut self) {
        *self = SubjectForm::default();
    }

    pub fn show_add_control(&self) -> bool {
        !self.visible
    }

    pub fn next_field(&mut self) {
        self.focus = match self.focus {
            SubjectField::Name => SubjectField::Teacher,
            SubjectField::Teacher => SubjectField::Name,
        };
    }

    pub fn push_char(&mut self, c: char) {
        match self.focus {
            SubjectField::Name => self.name.push(c),
            SubjectField::Teacher => self.teacher.push(c),
        }
    }

    pub fn backspace(&mut self) {
        match self.focus {
            SubjectField::Name => {
                self.name.pop();
            }
            SubjectField::Teacher => {
                self.teacher.pop();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn options() -> Vec<SubjectOption> {
        vec![
            SubjectOption {
                value: None,
                label: "Choose a subject...".to_string(),
            },
            SubjectOption {
                value: Some(4),
                label: "Math".to_string(),
            },
            SubjectOption {
                value: Some(9),
                label: "Art".to_string(),
            },
        ]
    }

    #[test]
    fn test_open_new_clears_previous_edit() {
        let mut form = TaskForm::default();
        form.open_edit(
            TaskPrefill {
                id: 3,
                title: "Essay".to_string(),
                subject_id: 9,
                deadline: "2026-10-20T08:00".to_string(),
                attachment_names: vec!["draft.docx".to_string()],
            },
            &options(),
        );
        assert_eq!(form.heading, "Edit Task");
        assert_eq!(form.subject_index, 2);
        assert_eq!(form.existing_attachments, vec!["draft.docx".to_string()]);

        form.open_new();
        assert!(form.visible);
        assert_eq!(form.heading, "New Task");
        assert_eq!(form.id, None);
        assert!(form.title.is_empty());
        assert!(form.existing_attachments.is_empty());
    }

    #[test]
    fn test_typing_goes_to_focused_field() {
        let mut form = TaskForm::default();
        form.open_new();
        form.push_char('H');
        form.push_char('W');
        form.next_field();
        form.push_char('x');
        form.cycle_subject(true, options().len());
        form.next_field();
        for c in "2026-10-20T08:00".chars() {
            form.push_char(c);
        }
        form.next_field();
        for c in "a.pdf, b.png".chars() {
            form.push_char(c);
        }
        form.backspace();

        let input = form.input(&options());
        assert_eq!(input.title, "HW");
        assert_eq!(input.subject_id, Some(4));
        assert_eq!(input.deadline, "2026-10-20T08:00");
        assert_eq!(
            input.attachment_paths,
            vec![PathBuf::from("a.pdf"), PathBuf::from("b.pn")]
        );
    }

    #[test]
    fn test_subject_cycle_wraps_to_placeholder() {
        let mut form = TaskForm::default();
        form.cycle_subject(false, 3);
        assert_eq!(form.subject_index, 2);
        form.cycle_subject(true, 3);
        assert_eq!(form.subject_index, 0);
        assert_eq!(form.input(&options()).subject_id, None);
        form.previous_field();
        assert_eq!(form.focus, TaskField::Attachments);
    }

    #[test]
    fn test_subject_form_controls() {
        let mut form = SubjectForm::default();
        assert!(form.show_add_control());
        form.show();
        assert!(!form.show_add_control());
        form.push_char('M');
        form.next_field();
        form.push_char('T');
        assert_eq!((form.name.as_str(), form.teacher.as_str()), ("M", "T"));
        form.cancel();
        assert!(form.show_add_control());
        form.show();
        form.reset_and_hide();
        assert!(form.name.is_empty());
        assert!(form.show_add_control());
    }
}
