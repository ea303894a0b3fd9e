pub mod gate;

pub use gate::request_gate;
