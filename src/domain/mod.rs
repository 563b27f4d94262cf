// Domain layer: inventory models and the resource-source port.

pub mod model;
pub mod ports;
