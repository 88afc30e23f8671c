pub mod admin;
pub mod dev;
pub mod form;
pub mod health;
pub mod storage;
pub mod submissions;
