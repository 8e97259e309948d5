pub mod coursework;
pub mod curriculum;
pub mod enrollment;
pub mod lead;
pub mod user;

pub use coursework::*;
pub use curriculum::*;
pub use enrollment::*;
pub use lead::*;
pub use user::*;
