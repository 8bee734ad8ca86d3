pub mod consumption;
pub mod interval;
pub mod plan;
pub mod planner;
pub mod quarter;
pub mod season;
pub mod settings;
pub mod solar;
pub mod target;
