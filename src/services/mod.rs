pub mod assignment;
pub mod audit;
pub mod bootstrap;
pub mod certificate;
pub mod enrollment;
pub mod lead;
pub mod progress;
pub mod review;
pub mod security;
pub mod staff;

pub use audit::*;
pub use security::*;
