pub mod ranking;
pub mod summary;
pub mod voice_type;
pub mod walker;
