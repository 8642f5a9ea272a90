pub mod entry;
pub mod notification;
pub mod theme;
