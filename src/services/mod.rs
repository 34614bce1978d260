pub mod activity_service;
pub mod delete_confirmation;
pub mod member_service;
pub mod stats_service;

pub use activity_service::ActivityScheduler;
pub use member_service::MemberRegistry;

/// A successful operation plus the message shown to the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation<T> {
    pub record: T,
    pub message: String,
}

impl<T> Confirmation<T> {
    pub fn new(record: T, message: impl Into<String>) -> Self {
        Self {
            record,
            message: message.into(),
        }
    }
}
