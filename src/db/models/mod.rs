pub mod run;

pub use run::CompletedRun;
