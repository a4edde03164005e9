//! # Acting Parties
//!
//! Every state transition in the Dispatch Stack is authorized against an
//! [`Actor`] — the specific company, driver, or administrator requesting
//! it. Authorization is attribute-based: a transition method checks that
//! the actor owns the job, is the booking's driver, or is an
//! administrator, as appropriate.
//!
//! Session/token mechanics live in outer layers; by the time domain code
//! runs, the caller has been resolved to an `Actor` value.

use serde::{Deserialize, Serialize};

use crate::identity::{AdminId, CompanyId, DriverId};

/// The party requesting a state transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", content = "id", rename_all = "snake_case")]
pub enum Actor {
    /// A company account, identified by its id.
    Company(CompanyId),
    /// A driver account, identified by its id.
    Driver(DriverId),
    /// A platform administrator.
    Admin(AdminId),
}

impl Actor {
    /// Whether this actor is an administrator.
    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin(_))
    }

    /// The company id, if this actor is a company.
    pub fn as_company(&self) -> Option<&CompanyId> {
        match self {
            Self::Company(id) => Some(id),
            _ => None,
        }
    }

    /// The driver id, if this actor is a driver.
    pub fn as_driver(&self) -> Option<&DriverId> {
        match self {
            Self::Driver(id) => Some(id),
            _ => None,
        }
    }

    /// Whether this actor is the given company.
    pub fn is_company(&self, company: &CompanyId) -> bool {
        self.as_company() == Some(company)
    }

    /// Whether this actor is the given driver.
    pub fn is_driver(&self, driver: &DriverId) -> bool {
        self.as_driver() == Some(driver)
    }
}

impl std::fmt::Display for Actor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Company(id) => write!(f, "{id}"),
            Self::Driver(id) => write!(f, "{id}"),
            Self::Admin(id) => write!(f, "{id}"),
        }
    }
}
