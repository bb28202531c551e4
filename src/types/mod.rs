pub mod idea;
pub mod reports;
pub mod stage;
pub mod state;
