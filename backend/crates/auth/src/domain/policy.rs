//! Authorization Policy
//!
//! Static role to capability table. Pure lookups, no I/O.

use crate::domain::value_object::{Capability, Role};

use Capability::*;

const ADMIN: &[Capability] = &[
    ViewAllProjects,
    CreateProjectDirect,
    TerminateProject,
    ManageMentors,
    ManageAdmins,
    RemoveInnovators,
    ApproveApplications,
    ViewReports,
];

const MENTOR: &[Capability] = &[
    ViewAllProjects,
    AssignToProject,
    RateProject,
    ManageResources,
    CreateAssessments,
    CreateLearningObjectives,
    RemoveInnovatorsFromAssignedProjects,
];

const PROJECT: &[Capability] = &[ViewOwnProject, ManageTeam, AddInnovators, CommentOnProject];

/// Capabilities granted to `role`
pub const fn capabilities(role: Role) -> &'static [Capability] {
    match role {
        Role::Admin => ADMIN,
        Role::Mentor => MENTOR,
        Role::Project => PROJECT,
    }
}

pub fn has(role: Role, capability: Capability) -> bool {
    capabilities(role).contains(&capability)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_can_approve_but_mentor_cannot() {
        assert!(has(Role::Admin, ApproveApplications));
        assert!(!has(Role::Mentor, ApproveApplications));
        assert!(!has(Role::Project, ApproveApplications));
    }

    #[test]
    fn test_shared_capability() {
        assert!(has(Role::Admin, ViewAllProjects));
        assert!(has(Role::Mentor, ViewAllProjects));
        assert!(!has(Role::Project, ViewAllProjects));
    }

    #[test]
    fn test_project_scope() {
        assert_eq!(capabilities(Role::Project).len(), 4);
        assert!(has(Role::Project, ManageTeam));
        assert!(!has(Role::Project, RateProject));
    }

    #[test]
    fn test_every_capability_is_granted_somewhere() {
        for cap in Capability::ALL {
            assert!(
                Role::ALL.iter().any(|role| has(*role, cap)),
                "{cap} is granted to nobody"
            );
        }
    }
}
