pub mod convert;
pub mod error;
pub mod model;
pub mod overrides;
pub mod parser;
pub mod predicate;
pub mod reader;
pub mod severity;
pub mod validator;
