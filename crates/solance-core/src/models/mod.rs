pub mod conversation;
pub mod endpoint;
pub mod mode;
pub mod notice;
pub mod usage;
