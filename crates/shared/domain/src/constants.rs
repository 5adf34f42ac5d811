//! Table names, role slugs and `OpenAPI` tags.

// Tables
pub const ACCOUNT: &str = "account";
pub const PROFILE: &str = "profile";
pub const USER_ROLE: &str = "user_role";
pub const COURSE: &str = "course";
pub const ATTENDANCE: &str = "attendance";
pub const MIGRATION: &str = "migration";

// Roles
pub const STUDENT: &str = "student";
pub const PROFESSOR: &str = "professor";
pub const ADMIN: &str = "admin";

// OpenAPI tags
pub const SYSTEM_TAG: &str = "System";
pub const IDENTITY_TAG: &str = "Identity";
pub const COURSES_TAG: &str = "Courses";
pub const ATTENDANCE_TAG: &str = "Attendance";
pub const ANALYTICS_TAG: &str = "Analytics";

/// Prefix of every check-in QR payload (`rollcall:v1:<token>.<signature>`).
pub const QR_PAYLOAD_PREFIX: &str = "rollcall:v1:";
