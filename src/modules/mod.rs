pub mod seed;
pub mod status_update;
