// sra-core/src/remediation/actions/mod.rs
//! Concrete remediation actions and the finding categories they answer to.

pub mod remove_public_ip;

pub use remove_public_ip::{RemovePublicIp, RemovePublicIpValues};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    RemovePublicIp,
}

impl ActionKind {
    pub const ALL: &'static [ActionKind] = &[ActionKind::RemovePublicIp];

    pub fn name(self) -> &'static str {
        match self {
            ActionKind::RemovePublicIp => remove_public_ip::ACTION_NAME,
        }
    }

    /// Finding categories this action remediates.
    pub fn categories(self) -> &'static [&'static str] {
        match self {
            ActionKind::RemovePublicIp => remove_public_ip::CATEGORIES,
        }
    }

    /// Routes a finding category (case-insensitive) to its action.
    pub fn for_category(category: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.categories().iter().any(|c| c.eq_ignore_ascii_case(category.trim())))
    }
}
