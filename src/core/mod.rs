pub mod coaching;
pub mod gamification;
pub mod guarded;
pub mod router;
pub mod scoring;
pub mod selection;
pub mod storage;
pub mod types;
pub mod validate;
