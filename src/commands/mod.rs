pub mod apply;
pub mod run;
pub mod settings;
