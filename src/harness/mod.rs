pub mod adapter;
pub mod controller;
pub mod events;
pub mod sink;
pub mod telemetry;
