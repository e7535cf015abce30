//! Schema migration framework.

use crate::ProjectError;
use crate::schema::Project;

pub const LATEST_VERSION: u32 = 1;

pub fn migrate_to_latest(mut project: Project) -> Result<Project, ProjectError> {
    while project.version < LATEST_VERSION {
        project = migrate_one_version(project)?;
    }
    Ok(project)
}

fn migrate_one_version(project: Project) -> Result<Project, ProjectError> {
    match project.version {
        0 => migrate_v0_to_v1(project),
        v => Err(ProjectError::Migration {
            what: format!("No migration path from version {}", v),
        }),
    }
}

fn migrate_v0_to_v1(mut project: Project) -> Result<Project, ProjectError> {
    project.version = 1;
    Ok(project)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::demo_project;

    #[test]
    fn migrate_latest_is_noop() {
        let project = demo_project();
        let migrated = migrate_to_latest(project.clone()).unwrap();
        assert_eq!(migrated, project);
    }

    #[test]
    fn migrate_v0_bumps_version() {
        let mut project = demo_project();
        project.version = 0;
        let migrated = migrate_to_latest(project).unwrap();
        assert_eq!(migrated.version, LATEST_VERSION);
        assert_eq!(migrated.plant, demo_project().plant);
    }

    #[test]
    fn future_version_passes_through() {
        let mut project = demo_project();
        project.version = LATEST_VERSION + 1;
        // Rejected later by validation, not here.
        assert_eq!(migrate_to_latest(project).unwrap().version, LATEST_VERSION + 1);
    }
}
