mod business;
mod chat;
mod notification;
mod payment;
mod token;

pub use business::*;
pub use chat::*;
pub use notification::*;
pub use payment::*;
pub use token::*;
