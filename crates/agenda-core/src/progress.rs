//! Project progress derived from milestones.

use crate::model::{Milestone, Project, ProjectStatus};

/// `round(100 * completed / total)`, or 0 for a project without milestones.
pub fn progress_for(milestones: &[Milestone]) -> u8 {
    if milestones.is_empty() {
        return 0;
    }
    let completed = milestones.iter().filter(|m| m.completed).count();
    let pct = (completed as f64 / milestones.len() as f64) * 100.0;
    pct.round() as u8
}

pub fn status_for(progress: u8) -> ProjectStatus {
    if progress >= 100 {
        ProjectStatus::Completed
    } else if progress >= 80 {
        ProjectStatus::NearCompletion
    } else {
        ProjectStatus::InProgress
    }
}

/// Returns a copy of `project` with milestone `index` flipped and progress
/// recomputed, or `None` when the index is out of range.
pub fn toggle_milestone(project: &Project, index: usize) -> Option<Project> {
    let mut updated = project.clone();
    let milestone = updated.milestones.get_mut(index)?;
    milestone.completed = !milestone.completed;
    updated.recompute_progress();
    Some(updated)
}

/// Copy used by "duplicate": fresh progress, every milestone reopened.
pub fn duplicate_of(project: &Project, copy_suffix: &str) -> Project {
    let mut copy = project.clone();
    copy.title = format!("{} {}", project.title, copy_suffix);
    copy.progress = 0;
    copy.status = ProjectStatus::InProgress;
    for milestone in &mut copy.milestones {
        milestone.completed = false;
    }
    copy
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use uuid::Uuid;

    use super::*;
    use crate::model::Priority;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn launch() -> Project {
        let mut project = Project {
            id: Uuid::new_v4(),
            title: "Launch".to_string(),
            description: String::new(),
            progress: 0,
            due_date: date(2024, 6, 1),
            priority: Priority::High,
            status: ProjectStatus::InProgress,
            team: vec![],
            milestones: vec![
                Milestone {
                    name: "Design".to_string(),
                    completed: true,
                    due_date: Some(date(2024, 5, 1)),
                },
                Milestone {
                    name: "Build".to_string(),
                    completed: false,
                    due_date: Some(date(2024, 5, 15)),
                },
            ],
            calendar: None,
        };
        project.recompute_progress();
        project
    }

    #[test]
    fn half_done_project_is_in_progress() {
        let project = launch();
        assert_eq!(project.progress, 50);
        assert_eq!(project.status, ProjectStatus::InProgress);
    }

    #[test]
    fn toggling_last_milestone_completes_project() {
        let project = launch();
        let toggled = toggle_milestone(&project, 1).expect("milestone exists");
        assert_eq!(toggled.progress, 100);
        assert_eq!(toggled.status, ProjectStatus::Completed);
        assert!(toggled.milestones[1].completed);
        // source is untouched
        assert!(!project.milestones[1].completed);
    }

    #[test]
    fn toggle_out_of_range_is_none() {
        assert!(toggle_milestone(&launch(), 7).is_none());
    }

    #[test]
    fn status_thresholds() {
        assert_eq!(status_for(0), ProjectStatus::InProgress);
        assert_eq!(status_for(79), ProjectStatus::InProgress);
        assert_eq!(status_for(80), ProjectStatus::NearCompletion);
        assert_eq!(status_for(99), ProjectStatus::NearCompletion);
        assert_eq!(status_for(100), ProjectStatus::Completed);
    }

    #[test]
    fn progress_rounds_to_nearest() {
        let mut milestones = vec![Milestone::new("a", None); 3];
        milestones[0].completed = true;
        assert_eq!(progress_for(&milestones), 33);
        milestones[1].completed = true;
        assert_eq!(progress_for(&milestones), 67);
        assert_eq!(progress_for(&[]), 0);
    }

    #[test]
    fn duplicate_resets_progress_and_milestones() {
        let mut project = launch();
        project.milestones[1].completed = true;
        project.recompute_progress();

        let copy = duplicate_of(&project, "(Copia)");
        assert_eq!(copy.title, "Launch (Copia)");
        assert_eq!(copy.progress, 0);
        assert_eq!(copy.status, ProjectStatus::InProgress);
        assert!(copy.milestones.iter().all(|m| !m.completed));
    }
}
