pub mod cli_args;
pub mod error;
pub mod run;
pub mod settings;
