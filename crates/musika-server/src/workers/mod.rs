pub mod email_dispatcher;
