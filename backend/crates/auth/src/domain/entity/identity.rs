//! Identity Entity
//!
//! An account that can log in. Each role has its own table and its own
//! lookup field; the variants never overlap. Identities are created and
//! managed elsewhere; this crate only reads them and stamps
//! `last_login_at`.

use chrono::{DateTime, Utc};
use platform::password::HashedPassword;

use crate::domain::value_object::{IdentityId, LookupKey, Role};

#[derive(Debug, Clone)]
pub struct AdminIdentity {
    pub id: IdentityId,
    pub username: LookupKey,
    pub password_hash: HashedPassword,
    pub active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct MentorIdentity {
    pub id: IdentityId,
    pub email: LookupKey,
    pub password_hash: HashedPassword,
    pub active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct ProjectIdentity {
    pub id: IdentityId,
    pub profile_name: LookupKey,
    pub password_hash: HashedPassword,
    pub active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
}

/// One of the three account kinds
#[derive(Debug, Clone)]
pub enum Identity {
    Admin(AdminIdentity),
    Mentor(MentorIdentity),
    Project(ProjectIdentity),
}

impl Identity {
    /// Build the variant matching `role` from storage columns
    pub fn from_parts(
        role: Role,
        id: IdentityId,
        lookup_key: LookupKey,
        password_hash: HashedPassword,
        active: bool,
        last_login_at: Option<DateTime<Utc>>,
    ) -> Self {
        match role {
            Role::Admin => Identity::Admin(AdminIdentity {
                id,
                username: lookup_key,
                password_hash,
                active,
                last_login_at,
            }),
            Role::Mentor => Identity::Mentor(MentorIdentity {
                id,
                email: lookup_key,
                password_hash,
                active,
                last_login_at,
            }),
            Role::Project => Identity::Project(ProjectIdentity {
                id,
                profile_name: lookup_key,
                password_hash,
                active,
                last_login_at,
            }),
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Identity::Admin(_) => Role::Admin,
            Identity::Mentor(_) => Role::Mentor,
            Identity::Project(_) => Role::Project,
        }
    }

    pub fn id(&self) -> IdentityId {
        match self {
            Identity::Admin(a) => a.id,
            Identity::Mentor(m) => m.id,
            Identity::Project(p) => p.id,
        }
    }

    pub fn lookup_key(&self) -> &LookupKey {
        match self {
            Identity::Admin(a) => &a.username,
            Identity::Mentor(m) => &m.email,
            Identity::Project(p) => &p.profile_name,
        }
    }

    pub fn password_hash(&self) -> &HashedPassword {
        match self {
            Identity::Admin(a) => &a.password_hash,
            Identity::Mentor(m) => &m.password_hash,
            Identity::Project(p) => &p.password_hash,
        }
    }

    pub fn is_active(&self) -> bool {
        match self {
            Identity::Admin(a) => a.active,
            Identity::Mentor(m) => m.active,
            Identity::Project(p) => p.active,
        }
    }

    pub fn last_login_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Identity::Admin(a) => a.last_login_at,
            Identity::Mentor(m) => m.last_login_at,
            Identity::Project(p) => p.last_login_at,
        }
    }
}
