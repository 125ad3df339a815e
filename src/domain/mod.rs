// Domain layer: records, export configuration and the ports the pipeline talks through.

pub mod column_types;
pub mod model;
pub mod ports;
