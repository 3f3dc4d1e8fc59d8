pub mod history;
pub mod scanner;
