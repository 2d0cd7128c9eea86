//! Spanish/English strings behind typed keys.
//!
//! Every [`Key`] keeps the dotted path it is known by (`success.taskCreated`)
//! so stored preferences and log lines can refer to it by name. Month and
//! weekday names are exposed as fixed-size arrays instead of keys.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use anyhow::anyhow;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Es,
    En,
}

impl Language {
    pub fn as_str(self) -> &'static str {
        match self {
            Language::Es => "es",
            Language::En => "en",
        }
    }

    /// `en*` locales map to English, everything else to Spanish.
    pub fn from_locale(locale: &str) -> Self {
        if locale.trim().to_ascii_lowercase().starts_with("en") {
            Language::En
        } else {
            Language::Es
        }
    }

    /// Reads `LC_ALL`, `LC_MESSAGES` then `LANG`.
    pub fn detect_system() -> Self {
        ["LC_ALL", "LC_MESSAGES", "LANG"]
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .find(|value| !value.trim().is_empty())
            .map(|value| Self::from_locale(&value))
            .unwrap_or_default()
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "es" | "spanish" | "español" => Ok(Language::Es),
            "en" | "english" => Ok(Language::En),
            other => Err(anyhow!("unsupported language: {other}")),
        }
    }
}

macro_rules! translation_keys {
    ($($variant:ident => $path:literal { es: $es:literal, en: $en:literal },)*) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Key {
            $($variant,)*
        }

        impl Key {
            pub const ALL: &'static [Key] = &[$(Key::$variant,)*];

            pub fn path(self) -> &'static str {
                match self {
                    $(Key::$variant => $path,)*
                }
            }

            fn text(self, language: Language) -> &'static str {
                match self {
                    $(Key::$variant => match language {
                        Language::Es => $es,
                        Language::En => $en,
                    },)*
                }
            }
        }
    };
}

translation_keys! {
    Calendar => "calendar" { es: "Calendario", en: "Calendar" },
    Projects => "projects" { es: "Proyectos", en: "Projects" },
    Tasks => "tasks" { es: "Tareas", en: "Tasks" },
    Search => "search" { es: "Buscar", en: "Search" },

    SignIn => "auth.signIn" { es: "Iniciar Sesión", en: "Sign In" },
    CreateAccount => "auth.createAccount" { es: "Crear Cuenta", en: "Create Account" },
    FullNameRequired => "auth.fullNameRequired" { es: "El nombre completo es requerido", en: "Full name is required" },
    GenericError => "auth.genericError" { es: "Ocurrió un error. Inténtalo de nuevo.", en: "An error occurred. Please try again." },
    SignOut => "auth.signOut" { es: "Cerrar Sesión", en: "Sign Out" },
    SignedInAs => "auth.signedInAs" { es: "Sesión iniciada como {name} ({email})", en: "Signed in as {name} ({email})" },
    NotSignedIn => "auth.notSignedIn" { es: "No has iniciado sesión", en: "Not signed in" },

    TutorialWelcomeTitle => "tutorial.welcome.title" { es: "¡Bienvenido a tu Agenda!", en: "Welcome to your Agenda!" },
    TutorialWelcomeDescription => "tutorial.welcome.description" {
        es: "Te guiaremos a través de las funciones principales para que puedas aprovechar al máximo tu nueva aplicación de gestión de tareas y proyectos.",
        en: "We'll guide you through the main features so you can make the most of your new task and project management application."
    },
    TutorialSidebarTitle => "tutorial.sidebar.title" { es: "Barra Lateral", en: "Sidebar" },
    TutorialSidebarDescription => "tutorial.sidebar.description" {
        es: "Aquí puedes navegar entre Calendario, Proyectos y Tareas. También puedes crear y gestionar tus calendarios personalizados.",
        en: "Here you can navigate between Calendar, Projects, and Tasks. You can also create and manage your custom calendars."
    },
    TutorialCalendarTitle => "tutorial.calendar.title" { es: "Vista de Calendario", en: "Calendar View" },
    TutorialCalendarDescription => "tutorial.calendar.description" {
        es: "Visualiza todas tus tareas, proyectos y milestones en un calendario mensual, semanal o diario. Los eventos se muestran con colores según su prioridad.",
        en: "View all your tasks, projects, and milestones in a monthly, weekly, or daily calendar. Events are displayed with colors based on their priority."
    },
    TutorialNewButtonTitle => "tutorial.newButton.title" { es: "Botón Nuevo", en: "New Button" },
    TutorialNewButtonDescription => "tutorial.newButton.description" {
        es: "Usa este botón para crear rápidamente nuevas tareas o proyectos según la vista actual. Es tu acceso directo para agregar contenido.",
        en: "Use this button to quickly create new tasks or projects based on the current view. It's your shortcut to add content."
    },
    TutorialSearchTitle => "tutorial.search.title" { es: "Búsqueda", en: "Search" },
    TutorialSearchDescription => "tutorial.search.description" {
        es: "Busca rápidamente entre todas tus tareas, proyectos y milestones. La búsqueda es en tiempo real y funciona con títulos, descripciones y etiquetas.",
        en: "Quickly search through all your tasks, projects, and milestones. Search is real-time and works with titles, descriptions, and tags."
    },
    TutorialTasksTitle => "tutorial.tasks.title" { es: "Gestión de Tareas", en: "Task Management" },
    TutorialTasksDescription => "tutorial.tasks.description" {
        es: "Organiza tus tareas por calendario, marca como completadas, filtra por estado y gestiona toda tu productividad desde aquí.",
        en: "Organize your tasks by calendar, mark as completed, filter by status, and manage all your productivity from here."
    },
    TutorialCompleteTitle => "tutorial.complete.title" { es: "¡Tutorial Completado!", en: "Tutorial Complete!" },
    TutorialCompleteDescription => "tutorial.complete.description" {
        es: "Ya conoces las funciones principales. ¡Comienza a crear tus primeras tareas y proyectos para organizar tu trabajo!",
        en: "You now know the main features. Start creating your first tasks and projects to organize your work!"
    },
    TutorialNext => "tutorial.next" { es: "Siguiente", en: "Next" },
    TutorialPrevious => "tutorial.previous" { es: "Anterior", en: "Previous" },
    TutorialFinish => "tutorial.finish" { es: "Finalizar", en: "Finish" },
    TutorialSkip => "tutorial.skip" { es: "Saltar tutorial", en: "Skip tutorial" },
    TutorialStep => "tutorial.step" { es: "Paso {current} de {total}", en: "Step {current} of {total}" },

    Today => "today" { es: "Hoy", en: "Today" },
    Month => "month" { es: "Mes", en: "Month" },
    Week => "week" { es: "Semana", en: "Week" },
    Day => "day" { es: "Día", en: "Day" },
    UpcomingEvents => "upcomingEvents" { es: "Próximos eventos", en: "Upcoming events" },
    NoEventsScheduled => "noEventsScheduled" { es: "No hay eventos programados", en: "No events scheduled" },
    EventsWillAppear => "eventsWillAppear" {
        es: "Los eventos aparecerán aquí cuando crees proyectos con fechas de entrega o milestones.",
        en: "Events will appear here when you create projects with due dates or milestones."
    },

    NewTask => "newTask" { es: "Nueva tarea", en: "New task" },
    Priority => "priority" { es: "Prioridad", en: "Priority" },
    Project => "project" { es: "Proyecto", en: "Project" },
    AssignedTo => "assignedTo" { es: "Asignado a", en: "Assigned to" },
    DueDate => "dueDate" { es: "Fecha de entrega", en: "Due date" },
    TitleRequired => "titleRequired" { es: "El título es requerido", en: "Title is required" },
    PriorityRequired => "priorityRequired" { es: "La prioridad es requerida", en: "Priority is required" },
    NoTasks => "noTasks" { es: "No hay tareas", en: "No tasks" },
    StartCreatingTasks => "startCreatingTasks" {
        es: "Comienza creando tu primera tarea para organizar tu trabajo.",
        en: "Start by creating your first task to organize your work."
    },
    TasksShown => "tasksShown" { es: "tareas, {shown} mostradas", en: "tasks, {shown} shown" },
    AllTasks => "allTasks" { es: "Todas las tareas", en: "All tasks" },
    Pending => "pending" { es: "Pendientes", en: "Pending" },
    Completed => "completed" { es: "Completadas", en: "Completed" },

    NewProject => "newProject" { es: "Nuevo proyecto", en: "New project" },
    Milestones => "milestones" { es: "Milestones", en: "Milestones" },
    Progress => "progress" { es: "Progreso", en: "Progress" },
    Team => "team" { es: "Equipo", en: "Team" },
    Status => "status" { es: "Estado", en: "Status" },
    NoProjects => "noProjects" { es: "No hay proyectos", en: "No projects" },
    StartCreatingProjects => "startCreatingProjects" {
        es: "Comienza creando tu primer proyecto para organizar tus tareas y milestones.",
        en: "Start by creating your first project to organize your tasks and milestones."
    },
    CopySuffix => "copySuffix" { es: "(Copia)", en: "(Copy)" },

    Calendars => "calendars" { es: "Calendarios", en: "Calendars" },
    CalendarNameRequired => "calendarNameRequired" { es: "El nombre del calendario es requerido", en: "Calendar name is required" },
    NameMinLength => "nameMinLength" { es: "El nombre debe tener al menos 2 caracteres", en: "Name must be at least 2 characters" },
    NoCalendars => "noCalendars" { es: "No hay calendarios", en: "No calendars" },
    DefaultCalendar => "defaultCalendar" { es: "Predeterminado", en: "Default" },

    SearchResults => "searchResults" { es: "Resultados de búsqueda", en: "Search results" },
    ResultsFound => "resultsFound" { es: "Se encontraron {count} resultado{plural}", en: "{count} result{plural} found" },
    NoResultsFound => "noResultsFound" { es: "No se encontraron resultados", en: "No results found" },
    NoMatchingElements => "noMatchingElements" { es: "No hay elementos que coincidan con \"{term}\"", en: "No elements match \"{term}\"" },
    EnterSearchTerm => "enterSearchTerm" {
        es: "Ingresa un término de búsqueda para encontrar tareas, proyectos y milestones",
        en: "Enter a search term to find tasks, projects and milestones"
    },

    RoleViewer => "viewer" { es: "Visualizador", en: "Viewer" },
    RoleEditor => "editor" { es: "Editor", en: "Editor" },
    RoleAdmin => "admin" { es: "Administrador", en: "Administrator" },
    EmailRequired => "emailRequired" { es: "Debe agregar al menos un email", en: "Must add at least one email" },
    InvalidEmails => "invalidEmails" { es: "Emails inválidos: {emails}", en: "Invalid emails: {emails}" },
    RoleRequired => "roleRequired" { es: "Debe seleccionar un rol", en: "Must select a role" },
    AccessRequired => "accessRequired" { es: "Debe seleccionar al menos un calendario o proyecto", en: "Must select at least one calendar or project" },

    PriorityHigh => "priorities.high" { es: "Alta", en: "High" },
    PriorityMedium => "priorities.medium" { es: "Media", en: "Medium" },
    PriorityLow => "priorities.low" { es: "Baja", en: "Low" },
    StatusInProgress => "statuses.in-progress" { es: "En progreso", en: "In progress" },
    StatusNearCompletion => "statuses.near-completion" { es: "Por completar", en: "Near completion" },
    StatusCompleted => "statuses.completed" { es: "Completado", en: "Completed" },

    CalendarCreated => "success.calendarCreated" { es: "Calendario \"{name}\" creado exitosamente", en: "Calendar \"{name}\" created successfully" },
    CalendarUpdated => "success.calendarUpdated" { es: "Calendario \"{name}\" actualizado exitosamente", en: "Calendar \"{name}\" updated successfully" },
    CalendarDeleted => "success.calendarDeleted" { es: "Calendario \"{name}\" eliminado exitosamente", en: "Calendar \"{name}\" deleted successfully" },
    DefaultCalendarSet => "success.defaultCalendarSet" { es: "\"{name}\" es ahora el calendario predeterminado", en: "\"{name}\" is now the default calendar" },
    TaskCreated => "success.taskCreated" { es: "Tarea \"{name}\" creada exitosamente", en: "Task \"{name}\" created successfully" },
    TaskUpdated => "success.taskUpdated" { es: "Tarea \"{name}\" actualizada exitosamente", en: "Task \"{name}\" updated successfully" },
    TaskDeleted => "success.taskDeleted" { es: "Tarea \"{name}\" eliminada exitosamente", en: "Task \"{name}\" deleted successfully" },
    TaskCompleted => "success.taskCompleted" { es: "Tarea \"{name}\" completada", en: "Task \"{name}\" completed" },
    TaskReopened => "success.taskReopened" { es: "Tarea \"{name}\" marcada como pendiente", en: "Task \"{name}\" marked as pending" },
    ProjectCreated => "success.projectCreated" { es: "Proyecto \"{name}\" creado exitosamente", en: "Project \"{name}\" created successfully" },
    ProjectUpdated => "success.projectUpdated" { es: "Proyecto \"{name}\" actualizado exitosamente", en: "Project \"{name}\" updated successfully" },
    ProjectDuplicated => "success.projectDuplicated" { es: "Proyecto \"{name}\" duplicado exitosamente", en: "Project \"{name}\" duplicated successfully" },
    ProjectDeleted => "success.projectDeleted" { es: "Proyecto \"{name}\" eliminado exitosamente", en: "Project \"{name}\" deleted successfully" },
    InvitationsSent => "success.invitationsSent" { es: "Invitaciones enviadas a {count} colaborador(es)", en: "Invitations sent to {count} collaborator(s)" },
    LanguageChanged => "success.languageChanged" { es: "Idioma cambiado a {language}", en: "Language changed to {language}" },

    CreateCalendarFailed => "errors.createCalendar" { es: "Error al crear el calendario", en: "Error creating the calendar" },
    UpdateCalendarFailed => "errors.updateCalendar" { es: "Error al actualizar el calendario", en: "Error updating the calendar" },
    DeleteCalendarFailed => "errors.deleteCalendar" { es: "Error al eliminar el calendario", en: "Error deleting the calendar" },
    CreateTaskFailed => "errors.createTask" { es: "Error al crear la tarea", en: "Error creating the task" },
    UpdateTaskFailed => "errors.updateTask" { es: "Error al actualizar la tarea", en: "Error updating the task" },
    DeleteTaskFailed => "errors.deleteTask" { es: "Error al eliminar la tarea", en: "Error deleting the task" },
    CreateProjectFailed => "errors.createProject" { es: "Error al crear el proyecto", en: "Error creating the project" },
    UpdateProjectFailed => "errors.updateProject" { es: "Error al actualizar el proyecto", en: "Error updating the project" },
    DeleteProjectFailed => "errors.deleteProject" { es: "Error al eliminar el proyecto", en: "Error deleting the project" },
    LoadFailed => "errors.load" { es: "Error al cargar los datos", en: "Error loading data" },
    ProfileUpdateFailed => "errors.updateProfile" { es: "Error al actualizar el perfil", en: "Error updating the profile" },

    Language => "language" { es: "Idioma", en: "Language" },
    Spanish => "spanish" { es: "Español", en: "Español" },
    English => "english" { es: "English", en: "English" },
}

impl Key {
    pub fn from_path(path: &str) -> Option<Key> {
        Key::ALL.iter().copied().find(|key| key.path() == path)
    }
}

const MONTHS_ES: [&str; 12] = [
    "Enero",
    "Febrero",
    "Marzo",
    "Abril",
    "Mayo",
    "Junio",
    "Julio",
    "Agosto",
    "Septiembre",
    "Octubre",
    "Noviembre",
    "Diciembre",
];
const MONTHS_EN: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];
const DAYS_SHORT_ES: [&str; 7] = ["Dom", "Lun", "Mar", "Mié", "Jue", "Vie", "Sáb"];
const DAYS_SHORT_EN: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];
const DAYS_ES: [&str; 7] = [
    "Domingo",
    "Lunes",
    "Martes",
    "Miércoles",
    "Jueves",
    "Viernes",
    "Sábado",
];
const DAYS_EN: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

static PLACEHOLDER_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\{(\w+)\}").ok());

/// Replaces `{name}` placeholders; unknown placeholders are left untouched.
pub fn interpolate(template: &str, params: &[(&str, &str)]) -> String {
    let Some(re) = PLACEHOLDER_RE.as_ref() else {
        return template.to_string();
    };
    re
        .replace_all(template, |caps: &Captures<'_>| {
            let name = &caps[1];
            params
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value).to_string())
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Lookup handle for one language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct I18n {
    language: Language,
}

impl I18n {
    pub fn new(language: Language) -> Self {
        Self { language }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn set_language(&mut self, language: Language) {
        self.language = language;
    }

    pub fn t(&self, key: Key) -> &'static str {
        key.text(self.language)
    }

    pub fn tf(&self, key: Key, params: &[(&str, &str)]) -> String {
        interpolate(self.t(key), params)
    }

    /// Lookup by dotted path; unknown paths come back verbatim.
    pub fn t_path<'a>(&self, path: &'a str) -> &'a str {
        match Key::from_path(path) {
            Some(key) => self.t(key),
            None => path,
        }
    }

    /// January first.
    pub fn month_names(&self) -> [&'static str; 12] {
        match self.language {
            Language::Es => MONTHS_ES,
            Language::En => MONTHS_EN,
        }
    }

    /// Sunday first.
    pub fn weekday_short(&self) -> [&'static str; 7] {
        match self.language {
            Language::Es => DAYS_SHORT_ES,
            Language::En => DAYS_SHORT_EN,
        }
    }

    /// Sunday first.
    pub fn weekday_full(&self) -> [&'static str; 7] {
        match self.language {
            Language::Es => DAYS_ES,
            Language::En => DAYS_EN,
        }
    }

    pub fn month_name(&self, month0: u32) -> &'static str {
        self.month_names()[(month0 % 12) as usize]
    }

    pub fn priority(&self, priority: crate::model::Priority) -> &'static str {
        use crate::model::Priority;
        self.t(match priority {
            Priority::High => Key::PriorityHigh,
            Priority::Medium => Key::PriorityMedium,
            Priority::Low => Key::PriorityLow,
        })
    }

    pub fn status(&self, status: crate::model::ProjectStatus) -> &'static str {
        use crate::model::ProjectStatus;
        self.t(match status {
            ProjectStatus::InProgress => Key::StatusInProgress,
            ProjectStatus::NearCompletion => Key::StatusNearCompletion,
            ProjectStatus::Completed => Key::StatusCompleted,
        })
    }

    pub fn language_name(&self, language: Language) -> &'static str {
        self.t(match language {
            Language::Es => Key::Spanish,
            Language::En => Key::English,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn paths_are_unique_and_round_trip() {
        let mut seen = HashSet::new();
        for key in Key::ALL {
            assert!(seen.insert(key.path()), "duplicate path {}", key.path());
            assert_eq!(Key::from_path(key.path()), Some(*key));
        }
        assert_eq!(Key::from_path("no.such.key"), None);
    }

    #[test]
    fn interpolation_keeps_unknown_placeholders() {
        let es = I18n::new(Language::Es);
        assert_eq!(
            es.tf(Key::ResultsFound, &[("count", "3"), ("plural", "s")]),
            "Se encontraron 3 resultados"
        );
        assert_eq!(interpolate("{a} and {b}", &[("a", "x")]), "x and {b}");
    }

    #[test]
    fn arrays_follow_language() {
        let en = I18n::new(Language::En);
        assert_eq!(en.month_names()[0], "January");
        assert_eq!(en.weekday_short()[0], "Sun");
        assert_eq!(I18n::new(Language::Es).weekday_full()[3], "Miércoles");
    }

    #[test]
    fn locale_detection_prefers_english_prefix() {
        assert_eq!(Language::from_locale("en_US.UTF-8"), Language::En);
        assert_eq!(Language::from_locale("fr_FR"), Language::Es);
        assert_eq!("EN".parse::<Language>().expect("language"), Language::En);
    }

    #[test]
    fn unknown_path_falls_back_to_the_path() {
        let en = I18n::new(Language::En);
        assert_eq!(en.t_path("success.taskCreated"), "Task \"{name}\" created successfully");
        assert_eq!(en.t_path("missing.key"), "missing.key");
    }
}
