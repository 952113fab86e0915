// Adapters layer: concrete implementations for external systems (vendor API, OS processes).

pub mod restart;
pub mod tencent;
