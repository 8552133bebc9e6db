//! Capability tags checked by the authorization policy

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An atomic permission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    ViewAllProjects,
    CreateProjectDirect,
    TerminateProject,
    ManageMentors,
    ManageAdmins,
    RemoveInnovators,
    ApproveApplications,
    ViewReports,
    AssignToProject,
    RateProject,
    ManageResources,
    CreateAssessments,
    CreateLearningObjectives,
    RemoveInnovatorsFromAssignedProjects,
    ViewOwnProject,
    ManageTeam,
    AddInnovators,
    CommentOnProject,
}

impl Capability {
    pub const ALL: [Capability; 18] = [
        Capability::ViewAllProjects,
        Capability::CreateProjectDirect,
        Capability::TerminateProject,
        Capability::ManageMentors,
        Capability::ManageAdmins,
        Capability::RemoveInnovators,
        Capability::ApproveApplications,
        Capability::ViewReports,
        Capability::AssignToProject,
        Capability::RateProject,
        Capability::ManageResources,
        Capability::CreateAssessments,
        Capability::CreateLearningObjectives,
        Capability::RemoveInnovatorsFromAssignedProjects,
        Capability::ViewOwnProject,
        Capability::ManageTeam,
        Capability::AddInnovators,
        Capability::CommentOnProject,
    ];

    pub const fn as_str(&self) -> &'static str {
        use Capability::*;
        match self {
            ViewAllProjects => "view_all_projects",
            CreateProjectDirect => "create_project_direct",
            TerminateProject => "terminate_project",
            ManageMentors => "manage_mentors",
            ManageAdmins => "manage_admins",
            RemoveInnovators => "remove_innovators",
            ApproveApplications => "approve_applications",
            ViewReports => "view_reports",
            AssignToProject => "assign_to_project",
            RateProject => "rate_project",
            ManageResources => "manage_resources",
            CreateAssessments => "create_assessments",
            CreateLearningObjectives => "create_learning_objectives",
            RemoveInnovatorsFromAssignedProjects => "remove_innovators_from_assigned_projects",
            ViewOwnProject => "view_own_project",
            ManageTeam => "manage_team",
            AddInnovators => "add_innovators",
            CommentOnProject => "comment_on_project",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown capability: {0}")]
pub struct UnknownCapability(pub String);

impl FromStr for Capability {
    type Err = UnknownCapability;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Capability::ALL
            .into_iter()
            .find(|cap| cap.as_str() == s)
            .ok_or_else(|| UnknownCapability(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_tags_are_unique_and_parse_back() {
        let tags: HashSet<_> = Capability::ALL.iter().map(|c| c.as_str()).collect();
        assert_eq!(tags.len(), Capability::ALL.len());

        for cap in Capability::ALL {
            assert_eq!(cap.as_str().parse::<Capability>().unwrap(), cap);
        }
    }

    #[test]
    fn test_serde_uses_tag() {
        assert_eq!(
            serde_json::to_string(&Capability::RemoveInnovatorsFromAssignedProjects).unwrap(),
            "\"remove_innovators_from_assigned_projects\""
        );
    }

    #[test]
    fn test_unknown_tag() {
        assert!("launch_rockets".parse::<Capability>().is_err());
    }
}
