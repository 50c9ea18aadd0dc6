pub mod extractor;
pub mod models;
pub mod teams;
pub mod validator;
