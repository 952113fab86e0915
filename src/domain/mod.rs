// Domain layer: models and ports. Vendor and OS specifics live in adapters.

pub mod model;
pub mod ports;
