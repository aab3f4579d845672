mod events;
mod extract;
mod jid;
mod models;
mod timeframe;

pub use events::*;
pub use extract::*;
pub use jid::*;
pub use models::*;
pub use timeframe::*;
