pub mod admin_controller;
pub mod competition_controller;
