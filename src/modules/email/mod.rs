pub mod delivery;
pub mod manager;
mod setup;

pub use delivery::{send_mail, CodeDelivery, ConsoleDelivery, SmtpDelivery};
pub use manager::{SecureEmailManager, SmtpCredentials};
pub use setup::setup_email_credentials;
