use super::delivery::send_mail;
use super::SecureEmailManager;
use crate::modules::utils::io::{is_valid_email, prompt_with_confirmation, read_line};

/// Interactive setup for the SMTP delivery channel. Prompts for the relay
/// settings, stores them in the system keyring and offers a test message.
pub fn setup_email_credentials() -> Result<(), String> {
    println!("\n=== Email Delivery Setup ===");

    // Get and validate SMTP server
    let host = loop {
        println!("Enter SMTP server address (e.g., smtp.gmail.com):");
        let input = read_line().map_err(|e| format!("Failed to read input: {}", e))?;

        if input.is_empty() {
            println!("SMTP server cannot be empty. Please try again.");
            continue;
        }
        if !input.contains('.') || input.contains(' ') {
            println!("Invalid SMTP server format. Please enter a valid domain.");
            continue;
        }

        break input;
    };

    // Get and validate SMTP port
    let port = loop {
        println!("Enter SMTP port (default: 587):");
        let input = read_line().map_err(|e| format!("Failed to read input: {}", e))?;

        if input.is_empty() {
            break 587;
        }

        match input.parse::<u16>() {
            Ok(port) if port > 0 => break port,
            _ => {
                println!("Invalid port number. Please enter a number between 1 and 65535.");
                continue;
            }
        }
    };

    // Get and validate the sender address
    let username = loop {
        println!("Enter the sender email address:");
        let input = read_line().map_err(|e| format!("Failed to read input: {}", e))?;

        if !is_valid_email(&input) {
            println!("Invalid email format. Please enter a valid email address.");
            continue;
        }

        break input;
    };

    // Get the relay password without echoing it
    let password = loop {
        println!("Enter the email password or app-specific password:");
        let pass =
            rpassword::read_password().map_err(|e| format!("Failed to read password: {}", e))?;

        if pass.trim().is_empty() {
            println!("Password cannot be empty. Please try again.");
            continue;
        }

        break pass;
    };

    let email_manager = SecureEmailManager::new();
    email_manager.store_credentials(&username, &password, &host, port)?;

    println!("\nEmail configuration saved securely.");

    let send_test = prompt_with_confirmation(
        "A test message can verify the configuration.",
        "Send a test message now?",
    )
    .map_err(|e| format!("Failed to read input: {}", e))?;

    if send_test {
        send_mail(
            &username,
            "First Access - Email Configuration Test",
            "This is a test email to verify your SMTP configuration.",
        )?;
        println!("Test email sent successfully to: {}", username);
    }

    Ok(())
}
