//! Synthetic packet generation and verification

pub mod generator;
pub mod random_signal;
pub mod signal;
pub mod sine;

pub use generator::PacketGenerator;
pub use random_signal::RandomSignal;
pub use signal::SignalModel;
pub use sine::SineWave;
