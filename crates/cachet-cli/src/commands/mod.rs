pub mod forget;
pub mod history;
pub mod identities;
pub mod identity;
pub mod init;
pub mod issue;
pub mod resolve;
pub mod status;
pub mod templates;
pub mod verify;
