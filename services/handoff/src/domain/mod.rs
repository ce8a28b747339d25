pub mod code;
pub mod policy;
pub mod repository;
pub mod state_machine;
pub mod types;
pub mod validator;
