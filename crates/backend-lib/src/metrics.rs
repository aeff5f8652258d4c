// ==============
// crates/backend-lib/src/metrics.rs

//! Central place for metric keys
pub const STUDENT_CREATED: &str = "student.created";
pub const STUDENT_UPDATED: &str = "student.updated";
pub const STUDENT_DELETED: &str = "student.deleted";
pub const CACHE_HIT: &str = "student.cache.hit";
pub const CACHE_MISS: &str = "student.cache.miss";
pub const CACHE_ERROR: &str = "student.cache.error";
pub const SIGN_IN_SUCCESS: &str = "auth.sign_in.success";
pub const SIGN_IN_FAILURE: &str = "auth.sign_in.failure";
pub const REFRESH_SUCCESS: &str = "auth.refresh.success";
pub const REFRESH_FAILURE: &str = "auth.refresh.failure";
pub const LOGOUT: &str = "auth.logout";
pub const REFRESH_TOKENS_PURGED: &str = "auth.refresh_tokens.purged";
