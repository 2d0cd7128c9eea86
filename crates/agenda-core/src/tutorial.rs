//! First-run walkthrough shown until the profile's `tutorial_completed` flag is set.

use crate::i18n::{I18n, Key};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TutorialStep {
    Welcome,
    Sidebar,
    CalendarView,
    NewButton,
    Search,
    Tasks,
    Complete,
}

impl TutorialStep {
    pub const ALL: [TutorialStep; 7] = [
        TutorialStep::Welcome,
        TutorialStep::Sidebar,
        TutorialStep::CalendarView,
        TutorialStep::NewButton,
        TutorialStep::Search,
        TutorialStep::Tasks,
        TutorialStep::Complete,
    ];

    pub fn id(self) -> &'static str {
        match self {
            TutorialStep::Welcome => "welcome",
            TutorialStep::Sidebar => "sidebar",
            TutorialStep::CalendarView => "calendar-view",
            TutorialStep::NewButton => "new-button",
            TutorialStep::Search => "search",
            TutorialStep::Tasks => "tasks",
            TutorialStep::Complete => "complete",
        }
    }

    pub fn title_key(self) -> Key {
        match self {
            TutorialStep::Welcome => Key::TutorialWelcomeTitle,
            TutorialStep::Sidebar => Key::TutorialSidebarTitle,
            TutorialStep::CalendarView => Key::TutorialCalendarTitle,
            TutorialStep::NewButton => Key::TutorialNewButtonTitle,
            TutorialStep::Search => Key::TutorialSearchTitle,
            TutorialStep::Tasks => Key::TutorialTasksTitle,
            TutorialStep::Complete => Key::TutorialCompleteTitle,
        }
    }

    pub fn description_key(self) -> Key {
        match self {
            TutorialStep::Welcome => Key::TutorialWelcomeDescription,
            TutorialStep::Sidebar => Key::TutorialSidebarDescription,
            TutorialStep::CalendarView => Key::TutorialCalendarDescription,
            TutorialStep::NewButton => Key::TutorialNewButtonDescription,
            TutorialStep::Search => Key::TutorialSearchDescription,
            TutorialStep::Tasks => Key::TutorialTasksDescription,
            TutorialStep::Complete => Key::TutorialCompleteDescription,
        }
    }
}

/// What a navigation call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TutorialMove {
    Moved(TutorialStep),
    Stayed,
    /// Past the last step; the caller persists completion.
    Finished,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Tutorial {
    index: usize,
    dismissed: bool,
}

impl Tutorial {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resumes at a stored position; out-of-range indexes clamp to the last step.
    pub fn at(index: usize) -> Self {
        Self {
            index: index.min(TutorialStep::ALL.len() - 1),
            dismissed: false,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn current(&self) -> TutorialStep {
        TutorialStep::ALL[self.index.min(TutorialStep::ALL.len() - 1)]
    }

    pub fn position(&self) -> (usize, usize) {
        (self.index + 1, TutorialStep::ALL.len())
    }

    pub fn is_last(&self) -> bool {
        self.index + 1 >= TutorialStep::ALL.len()
    }

    pub fn is_visible(&self) -> bool {
        !self.dismissed
    }

    pub fn next(&mut self) -> TutorialMove {
        if self.dismissed {
            return TutorialMove::Stayed;
        }
        if self.is_last() {
            self.dismissed = true;
            return TutorialMove::Finished;
        }
        self.index += 1;
        TutorialMove::Moved(self.current())
    }

    pub fn previous(&mut self) -> TutorialMove {
        if self.dismissed || self.index == 0 {
            return TutorialMove::Stayed;
        }
        self.index -= 1;
        TutorialMove::Moved(self.current())
    }

    pub fn skip(&mut self) -> TutorialMove {
        if self.dismissed {
            return TutorialMove::Stayed;
        }
        self.dismissed = true;
        TutorialMove::Finished
    }

    /// Title, description and the "step n of m" line for the current step.
    pub fn describe(&self, i18n: &I18n) -> (String, String, String) {
        let step = self.current();
        let (current, total) = self.position();
        (
            i18n.t(step.title_key()).to_string(),
            i18n.t(step.description_key()).to_string(),
            i18n.tf(
                Key::TutorialStep,
                &[("current", &current.to_string()), ("total", &total.to_string())],
            ),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::Language;

    #[test]
    fn walks_forward_and_finishes_after_last_step() {
        let mut tutorial = Tutorial::new();
        assert_eq!(tutorial.current(), TutorialStep::Welcome);
        for _ in 0..6 {
            assert!(matches!(tutorial.next(), TutorialMove::Moved(_)));
        }
        assert_eq!(tutorial.current(), TutorialStep::Complete);
        assert_eq!(tutorial.next(), TutorialMove::Finished);
        assert!(!tutorial.is_visible());
        assert_eq!(tutorial.next(), TutorialMove::Stayed);
    }

    #[test]
    fn previous_stops_at_first_step() {
        let mut tutorial = Tutorial::new();
        assert_eq!(tutorial.previous(), TutorialMove::Stayed);
        tutorial.next();
        assert_eq!(
            tutorial.previous(),
            TutorialMove::Moved(TutorialStep::Welcome)
        );
    }

    #[test]
    fn resumes_at_clamped_index() {
        assert_eq!(Tutorial::at(3).current(), TutorialStep::NewButton);
        assert_eq!(Tutorial::at(99).current(), TutorialStep::Complete);
        assert_eq!(Tutorial::at(2).index(), 2);
    }

    #[test]
    fn skip_finishes_immediately() {
        let mut tutorial = Tutorial::new();
        tutorial.next();
        assert_eq!(tutorial.skip(), TutorialMove::Finished);
        assert_eq!(tutorial.skip(), TutorialMove::Stayed);
    }

    #[test]
    fn describe_is_localized() {
        let tutorial = Tutorial::new();
        let (title, _, step) = tutorial.describe(&I18n::new(Language::En));
        assert_eq!(title, "Welcome to your Agenda!");
        assert_eq!(step, "Step 1 of 7");
        assert_eq!(TutorialStep::ALL[2].id(), "calendar-view");
    }
}
