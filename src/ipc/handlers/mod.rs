pub mod core;
pub mod courses;
pub mod levels;
pub mod semesters;
pub mod summary;
