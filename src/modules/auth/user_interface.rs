use super::reset::{ResetFlow, ResetStep};
use super::store::{CredentialStore, StoreError};
use crate::modules::email::CodeDelivery;
use crate::modules::storage::KeyValueStore;
use crate::modules::utils::io::{is_valid_email, prompt_with_confirmation, read_line};
use crate::modules::utils::logging::log_auth_event;
use crate::DASHBOARD_URL;

/// Outcome of one pass through the initial menu
#[derive(Debug)]
enum MenuResult {
    LoggedIn(String),
    Back,
    Exit,
}

/// Function to show initial options when starting the program
pub fn show_initial_options() {
    println!("\n=== First Access ===");
    println!("1. Login                          (or type 'login')");
    println!("2. First access / forgot password (or type 'first')");
    println!("3. Exit                           (or type 'exit')");
    println!("\nEnter your choice (1-3 or command):");
}

/// Main interactive loop. Returns the authenticated email, or None when
/// the user chose to leave.
pub fn main_menu_flow<S: KeyValueStore>(
    store: &CredentialStore<S>,
    delivery: &dyn CodeDelivery,
) -> Option<String> {
    loop {
        show_initial_options();

        let choice = match read_line() {
            Ok(input) => input.to_lowercase(),
            Err(e) => {
                println!("Error reading input: {}", e);
                continue;
            }
        };

        let result = match choice.as_str() {
            "1" | "login" => match handle_login(store) {
                Some(email) => MenuResult::LoggedIn(email),
                None => MenuResult::Back,
            },
            "2" | "first" | "forgot" => {
                handle_first_access(store, delivery);
                MenuResult::Back
            }
            "3" | "exit" | "quit" => MenuResult::Exit,
            _ => {
                println!(
                    "\nInvalid choice. Please enter a number (1-3) or command (login/first/exit)."
                );
                MenuResult::Back
            }
        };

        match result {
            MenuResult::LoggedIn(email) => {
                show_dashboard(&email);
                return Some(email);
            }
            MenuResult::Back => continue,
            MenuResult::Exit => {
                println!("Goodbye!");
                return None;
            }
        }
    }
}

/// Prompt for credentials and check them against the store
fn handle_login<S: KeyValueStore>(store: &CredentialStore<S>) -> Option<String> {
    println!("\nEnter your email (type 'back' to return to the menu):");
    let email = match read_line() {
        Ok(input) => input,
        Err(e) => {
            println!("Error reading input: {}", e);
            return None;
        }
    };
    if email.to_lowercase() == "back" {
        return None;
    }

    println!("Enter your password:");
    let password = match rpassword::read_password() {
        Ok(password) => password,
        Err(e) => {
            println!("Error reading password: {}", e);
            return None;
        }
    };

    if email.is_empty() || password.is_empty() {
        println!("\nPlease fill in every field.");
        return None;
    }

    if store.authenticate(&email, &password) {
        log_auth_event("login", &email, true, None);
        println!("\nLogin successful!");
        Some(email)
    } else {
        log_auth_event("login", &email, false, Some("invalid credentials"));
        println!("\nInvalid email or password. Please try again.");
        None
    }
}

/// The dashboard is a fixed remote page; the terminal front-end hands the
/// user its address instead of embedding it.
fn show_dashboard(email: &str) {
    println!("\nWelcome, {}!", email);
    println!("Your dashboard: {}", DASHBOARD_URL);
}

/// Walk the user through the three-step first-access/reset flow. Each
/// prompt can be cancelled back to the previous one; the flow object holds
/// which step the user is on.
pub fn handle_first_access<S: KeyValueStore>(
    store: &CredentialStore<S>,
    delivery: &dyn CodeDelivery,
) {
    let mut flow = ResetFlow::new(store);

    loop {
        match flow.step() {
            ResetStep::AwaitingEmail => {
                println!("\nEnter your email to receive a code");
                println!("(type 'back' to return to the menu):");

                let email = match read_line() {
                    Ok(input) => input,
                    Err(e) => {
                        println!("Error reading input: {}", e);
                        continue;
                    }
                };
                if email.to_lowercase() == "back" {
                    return;
                }
                if !is_valid_email(&email) {
                    println!("\nPlease enter a valid email address.");
                    continue;
                }

                match flow.request_code(&email) {
                    Ok(code) => {
                        if let Err(e) = delivery.deliver(&email, &code) {
                            // The code is already on the record; a failed
                            // delivery only costs the message
                            println!("\nWarning: could not deliver the code: {}", e);
                            println!("For demonstration purposes the code is: {}", code);
                        }
                    }
                    Err(StoreError::Validation(e)) => println!("\n{}", e),
                    Err(_) => println!(
                        "\nSomething went wrong while sending the code. Please try again."
                    ),
                }
            }
            ResetStep::AwaitingCode => {
                println!("\nEnter the 4-digit code (type 'back' to use another email):");

                let code = match read_line() {
                    Ok(input) => input,
                    Err(e) => {
                        println!("Error reading input: {}", e);
                        continue;
                    }
                };
                if code.to_lowercase() == "back" {
                    flow.back();
                    continue;
                }

                match flow.validate_code(&code) {
                    Ok(()) => {
                        println!("\nCode validated successfully! Now set your password.")
                    }
                    Err(StoreError::Validation(e)) => println!("\n{}", e),
                    Err(_) => println!(
                        "\nSomething went wrong while validating the code. Please try again."
                    ),
                }
            }
            ResetStep::AwaitingNewPassword => {
                println!("\nEnter your new password (leave empty to cancel):");
                let new_password = match rpassword::read_password() {
                    Ok(password) => password,
                    Err(e) => {
                        println!("Error reading password: {}", e);
                        continue;
                    }
                };
                if new_password.is_empty() {
                    flow.back();
                    continue;
                }

                println!("Confirm your new password:");
                let confirm_password = match rpassword::read_password() {
                    Ok(password) => password,
                    Err(e) => {
                        println!("Error reading password: {}", e);
                        continue;
                    }
                };

                match flow.set_password(&new_password, &confirm_password) {
                    Ok(()) => {}
                    Err(StoreError::Validation(e)) => println!("\n{}", e),
                    Err(_) => println!(
                        "\nSomething went wrong while setting the password. Please try again."
                    ),
                }
            }
            ResetStep::Done => {
                log_auth_event("password_reset", flow.email().unwrap_or("-"), true, None);
                println!("\nPassword set successfully! You can log in now.");
                return;
            }
        }
    }
}

/// Confirmed wipe of every registered user
pub fn handle_wipe<S: KeyValueStore>(store: &CredentialStore<S>) {
    match prompt_with_confirmation(
        "This deletes every registered user and cannot be undone.",
        "Wipe all user data?",
    ) {
        Ok(true) => match store.clear_all() {
            Ok(()) => println!("All user data cleared."),
            Err(e) => println!("Failed to clear user data: {}", e),
        },
        Ok(false) => println!("Cancelled."),
        Err(e) => println!("Error reading input: {}", e),
    }
}
