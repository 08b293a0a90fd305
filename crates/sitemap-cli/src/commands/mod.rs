//! Command implementations, one module per subcommand group.

mod control;
mod detect;
mod generate;
mod index;
mod schedule;
mod status;
mod worker;

pub use control::{cancel, repair};
pub use detect::detect;
pub use generate::generate;
pub use index::{archive, index, show};
pub use schedule::schedule;
pub use status::status;
pub use worker::worker;
