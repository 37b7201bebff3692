use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// A kind of authenticated principal.
pub trait User: Send + Sync + 'static {
    const RIGHTS: Rights;
}

/// A registered voter who has passed OTP verification.
#[derive(Debug, Clone, Copy)]
pub struct Voter;

/// An election administrator.
#[derive(Debug, Clone, Copy)]
pub struct Admin;

#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rights {
    Voter,
    Admin,
}

impl Display for Rights {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            formatter,
            "{}",
            match self {
                Self::Voter => "voter",
                Self::Admin => "admin",
            }
        )
    }
}

impl User for Voter {
    const RIGHTS: Rights = Rights::Voter;
}

impl User for Admin {
    const RIGHTS: Rights = Rights::Admin;
}
