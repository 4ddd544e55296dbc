pub mod random;

pub use random::RandomPolicy;
