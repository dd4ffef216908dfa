// Domain layer: shared enums, export model and ports. Depends on serde only.

pub mod model;
pub mod ports;
