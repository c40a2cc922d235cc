pub mod actions;
pub mod health;
pub mod notices;
pub mod view;
