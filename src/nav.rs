#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Page {
    Home,
    Subjects,
    SubjectDetail,
    Progress,
}

impl Page {
    pub const NAV_CONTROLS: [Page; 3] = [Page::Home, Page::Subjects, Page::Progress];

    pub fn nav_label(&self) -> &'static str {
        match self {
            Page::Home => "Home",
            Page::Subjects | Page::SubjectDetail => "Subjects",
            Page::Progress => "Progress",
        }
    }

    fn default_title(&self) -> Option<&'static str> {
        match self {
            Page::Home => Some("TaskNavy"),
            Page::Subjects => Some("Subjects"),
            Page::Progress => Some("Progress Statistics"),
            // set by the detail view from the subject name
            Page::SubjectDetail => None,
        }
    }

    /// The nav control that is highlighted while this page is shown.
    fn nav_control(&self) -> Page {
        match self {
            Page::SubjectDetail => Page::Subjects,
            page => *page,
        }
    }
}

#[derive(Debug)]
pub struct Navigation {
    active: Page,
    title: String,
}

impl Default for Navigation {
    fn default() -> Self {
        Navigation {
            active: Page::Home,
            title: "TaskNavy".to_string(),
        }
    }
}

impl Navigation {
    /// Makes `page` the only visible page. Returns true when the page must be
    /// fully re-rendered on entry.
    pub fn show(&mut self, page: Page) -> bool {
        self.active = page;
        if let Some(title) = page.default_title() {
            self.title = title.to_string();
        }
        page == Page::Progress
    }

    pub fn set_title(&mut self, title: &str) {
        self.title = title.to_string();
    }

    pub fn active(&self) -> Page {
        self.active
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn is_active_control(&self, control: Page) -> bool {
        self.active.nav_control() == control
    }

    pub fn active_control_index(&self) -> usize {
        Page::NAV_CONTROLS
            .iter()
            .position(|control| self.is_active_control(*control))
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGES: [Page; 4] = [
        Page::Home,
        Page::Subjects,
        Page::SubjectDetail,
        Page::Progress,
    ];

    #[test]
    fn test_exactly_one_nav_control_is_active() {
        let mut nav = Navigation::default();
        for page in PAGES {
            nav.show(page);
            assert_eq!(nav.active(), page);
            let active = Page::NAV_CONTROLS
                .iter()
                .filter(|c| nav.is_active_control(**c))
                .count();
            assert_eq!(active, 1, "{:?}", page);
        }
    }

    #[test]
    fn test_detail_highlights_subjects_and_keeps_its_title() {
        let mut nav = Navigation::default();
        nav.show(Page::Subjects);
        nav.set_title("Math");
        nav.show(Page::SubjectDetail);
        assert_eq!(nav.title(), "Math");
        assert_eq!(nav.active_control_index(), 1);
    }

    #[test]
    fn test_titles_and_rerender_flag() {
        let mut nav = Navigation::default();
        assert!(!nav.show(Page::Subjects));
        assert_eq!(nav.title(), "Subjects");
        assert!(nav.show(Page::Progress));
        assert_eq!(nav.title(), "Progress Statistics");
        assert!(nav.show(Page::Progress));
        assert!(!nav.show(Page::Home));
        assert_eq!(nav.title(), "TaskNavy");
    }
}
