use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::transport::smtp::PoolConfig;
use lettre::{Message, SmtpTransport, Transport};

use super::manager::SecureEmailManager;

/// Out-of-band channel for handing a one-time code to the user. Whether
/// delivery works never decides a flow transition; the registry write does.
pub trait CodeDelivery {
    fn deliver(&self, email: &str, code: &str) -> Result<(), String>;
}

/// Shows the code to the operator directly, standing in for a real
/// delivery channel.
pub struct ConsoleDelivery;

impl CodeDelivery for ConsoleDelivery {
    fn deliver(&self, email: &str, code: &str) -> Result<(), String> {
        println!("\nA 4-digit code was generated for {}.", email);
        println!("For demonstration purposes the code is: {}", code);
        println!("Enter this code at the next prompt.");
        Ok(())
    }
}

/// Sends the code by mail using the credentials in the system keyring
pub struct SmtpDelivery;

impl CodeDelivery for SmtpDelivery {
    fn deliver(&self, email: &str, code: &str) -> Result<(), String> {
        let body = format!(
            "Hello,\n\
            \n\
            An access code was requested for your account.\n\
            \n\
            Your one-time code:\n\
            \n\
            {}\n\
            \n\
            Enter it on the code screen to continue setting your password.\n\
            \n\
            If you did not request this code, you can ignore this message.",
            code
        );

        send_mail(email, "Your access code", &body)
    }
}

/// Send a plain-text mail using securely stored credentials
pub fn send_mail(to_email: &str, subject: &str, body: &str) -> Result<(), String> {
    let email_manager = SecureEmailManager::new();
    let creds = email_manager.get_credentials()?;

    let email = Message::builder()
        .from(
            format!("First Access <{}>", creds.username)
                .parse()
                .map_err(|e| format!("Invalid from address: {}", e))?,
        )
        .to(to_email
            .parse()
            .map_err(|e| format!("Invalid to address: {}", e))?)
        .subject(subject)
        .header(lettre::message::header::ContentType::TEXT_PLAIN)
        .body(body.to_string())
        .map_err(|e| format!("Failed to create email: {}", e))?;

    let tls_parameters = TlsParameters::builder(creds.host.clone())
        .build()
        .map_err(|e| format!("Failed to build TLS parameters: {}", e))?;

    let mailer = SmtpTransport::relay(&creds.host)
        .map_err(|e| format!("Failed to create SMTP transport: {}", e))?
        .credentials(Credentials::new(creds.username, creds.password))
        .port(creds.port)
        .tls(Tls::Required(tls_parameters))
        .pool_config(PoolConfig::new().max_size(1))
        .timeout(Some(std::time::Duration::from_secs(10)))
        .build();

    match mailer.send(&email) {
        Ok(_) => Ok(()),
        Err(e) => Err(format!("Failed to send email: {}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Delivery double that records what would have gone out
    struct RecordingDelivery {
        sent: std::cell::RefCell<Vec<(String, String)>>,
    }

    impl RecordingDelivery {
        fn new() -> Self {
            Self {
                sent: std::cell::RefCell::new(Vec::new()),
            }
        }
    }

    impl CodeDelivery for RecordingDelivery {
        fn deliver(&self, email: &str, code: &str) -> Result<(), String> {
            self.sent
                .borrow_mut()
                .push((email.to_string(), code.to_string()));
            Ok(())
        }
    }

    #[test]
    fn test_delivery_through_the_trait_object() {
        let recording = RecordingDelivery::new();
        let delivery: &dyn CodeDelivery = &recording;

        delivery.deliver("a@b.com", "1234").unwrap();

        let sent = recording.sent.borrow();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0], ("a@b.com".to_string(), "1234".to_string()));
    }

    #[test]
    fn test_code_mail_template() {
        let code = "1234";
        let body = format!(
            "Hello,\n\
            \n\
            An access code was requested for your account.\n\
            \n\
            Your one-time code:\n\
            \n\
            {}\n\
            \n\
            Enter it on the code screen to continue setting your password.\n\
            \n\
            If you did not request this code, you can ignore this message.",
            code
        );

        // The code stands alone on its own line for visibility
        let lines: Vec<&str> = body.lines().collect();
        let code_line = lines.iter().position(|&l| l == code).unwrap();
        assert_eq!(lines[code_line - 1], "");
        assert_eq!(lines[code_line + 1], "");

        assert!(body.contains("did not request this code"));
    }

    #[test]
    fn test_console_delivery_never_fails() {
        assert!(ConsoleDelivery.deliver("a@b.com", "1234").is_ok());
    }
}
