pub mod decode;
pub mod init;
pub mod resolve;
pub mod verify;
