use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The three disjoint identity namespaces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Mentor,
    Project,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::Mentor, Role::Project];

    #[inline]
    pub const fn code(&self) -> &'static str {
        use Role::*;
        match self {
            Admin => "admin",
            Mentor => "mentor",
            Project => "project",
        }
    }

    /// Table holding identities of this role
    #[inline]
    pub const fn table(&self) -> &'static str {
        use Role::*;
        match self {
            Admin => "admins",
            Mentor => "mentors",
            Project => "projects",
        }
    }

    #[inline]
    pub const fn id_column(&self) -> &'static str {
        use Role::*;
        match self {
            Admin => "admin_id",
            Mentor => "mentor_id",
            Project => "project_id",
        }
    }

    /// Column the login form's key is matched against
    #[inline]
    pub const fn lookup_column(&self) -> &'static str {
        use Role::*;
        match self {
            Admin => "username",
            Mentor => "email",
            Project => "profile_name",
        }
    }

    #[inline]
    pub const fn login_path(&self) -> &'static str {
        use Role::*;
        match self {
            Admin => "/auth/admin-login",
            Mentor => "/auth/mentor-login",
            Project => "/auth/project-login",
        }
    }

    #[inline]
    pub const fn dashboard_path(&self) -> &'static str {
        use Role::*;
        match self {
            Admin => "/dashboards/admin",
            Mentor => "/dashboards/mentor",
            Project => "/dashboards/project",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Unknown role code
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use Role::*;
        match s {
            "admin" => Ok(Admin),
            "mentor" => Ok(Mentor),
            "project" => Ok(Project),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_from_code() {
        for role in Role::ALL {
            assert_eq!(role.code().parse::<Role>().unwrap(), role);
        }
        assert!("super_admin".parse::<Role>().is_err());
        assert!("Admin".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_display_and_serde() {
        assert_eq!(Role::Mentor.to_string(), "mentor");
        assert_eq!(serde_json::to_string(&Role::Project).unwrap(), "\"project\"");
        let parsed: Role = serde_json::from_str("\"admin\"").unwrap();
        assert_eq!(parsed, Role::Admin);
    }

    #[test]
    fn test_role_storage_metadata() {
        assert_eq!(Role::Admin.lookup_column(), "username");
        assert_eq!(Role::Mentor.lookup_column(), "email");
        assert_eq!(Role::Project.lookup_column(), "profile_name");
        assert_eq!(Role::Project.table(), "projects");
        assert_eq!(Role::Mentor.id_column(), "mentor_id");
    }

    #[test]
    fn test_role_paths() {
        assert_eq!(Role::Admin.dashboard_path(), "/dashboards/admin");
        assert_eq!(Role::Mentor.login_path(), "/auth/mentor-login");
    }
}
