pub mod gains;
pub mod inputs;
pub mod model;
pub mod parameters;
pub mod result;
