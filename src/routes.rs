pub mod import_export;
pub mod login;
pub mod onboarding;
pub mod password;
pub mod stats;
pub mod students;
