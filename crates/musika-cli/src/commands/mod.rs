pub mod business;
pub mod chat;
pub mod notification;
pub mod payment;
