pub mod advance;
pub mod init;
pub mod state;
