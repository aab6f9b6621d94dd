//! Domain layer - core business logic and entities

pub mod indicator;
pub mod pair;
