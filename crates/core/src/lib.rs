pub mod config;
pub mod errors;
pub mod ticket;

pub use errors::{ApplicationError, InterfaceError};
pub use ticket::{TicketRequest, TicketRequestError, TicketResult, TicketSubmitter};
