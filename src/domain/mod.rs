mod account;
mod journal;
mod ledger;
mod money;
mod operation;
mod user;

pub use account::*;
pub use journal::*;
pub use ledger::*;
pub use money::*;
pub use operation::*;
pub use user::*;
