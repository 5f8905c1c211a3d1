//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod directory;
mod second_factor;

pub use directory::{
    DerefAliases, DirectoryEntry, DirectoryLayout, DirectorySearchRequest, LOGIN_ATTRIBUTE,
    MembershipQuery, Role, SearchScope, escape_dn_value, escape_filter_value,
};
pub use second_factor::{
    AUTOMATIC_SELECTION, RESULT_ALLOW, SECOND_FACTOR_AUTH_PATH, STAT_OK,
    SecondFactorAuthRequest, SecondFactorOutcome, SecondFactorResponse, SecondFactorVerdict,
};
