pub mod access;
pub mod autosave;
pub mod db;
pub mod progress;
pub mod workflow;
