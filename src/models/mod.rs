pub mod activities;
pub mod activity_members;
pub mod member_fields;
pub mod members;

pub use activities::ActivityRow;
pub use activity_members::ActivityMemberRow;
pub use member_fields::{Nip, SearchField, Section, WorkGroup};
pub use members::{MemberChanges, MemberRow};
