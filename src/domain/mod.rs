mod account;
mod money;
mod transaction;

pub use account::*;
pub use money::*;
pub use transaction::*;
