// Domain layer: API models and the port the command runner talks to.

pub mod model;
pub mod ports;
