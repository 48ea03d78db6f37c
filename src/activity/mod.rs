pub mod model;
pub mod recorder;
pub mod repo;
