pub mod prelude;

pub mod dont_send_entry;
pub mod message;
pub mod message_log;
pub mod priority;
pub mod result_code;
