pub use super::dont_send_entry::Entity as DontSendEntry;
pub use super::message::Entity as Message;
pub use super::message_log::Entity as MessageLog;
pub use super::priority::Priority;
pub use super::result_code::ResultCode;
