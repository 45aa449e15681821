//! Database layer (Firestore).

pub mod firestore;

pub use firestore::FirestoreDb;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    /// Email uniqueness index (document ID = normalized email)
    pub const USER_EMAILS: &str = "user_emails";
    /// Identity-provider subject uniqueness index (document ID = subject)
    pub const USER_SUBJECTS: &str = "user_subjects";
    pub const SESSIONS: &str = "sessions";
    pub const QUIZZES: &str = "quizzes";
}
