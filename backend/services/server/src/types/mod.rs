pub mod competition_types;
