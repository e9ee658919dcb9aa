use clap::{Arg, Command};

use first_access::auth::user_interface::{handle_wipe, main_menu_flow};
use first_access::email::{setup_email_credentials, CodeDelivery, ConsoleDelivery, SmtpDelivery};
use first_access::storage::FileStore;
use first_access::utils::logging::initialize_logging;
use first_access::{CredentialStore, SecureEmailManager};

fn main() {
    if let Err(e) = initialize_logging() {
        eprintln!("Warning: failed to initialize logging: {}", e);
    }

    // Define the command-line interface using clap
    let matches = Command::new("first-access")
        .about("Credential-based login with a first-access/password-reset flow")
        .arg(
            Arg::new("data-dir")
                .long("data-dir")
                .help("Directory holding the user registry")
                .value_name("DIR")
                .default_value("."),
        )
        .subcommand(
            Command::new("setup-email").about("Store SMTP credentials for code delivery"),
        )
        .subcommand(Command::new("wipe").about("Delete every registered user"))
        .get_matches();

    let data_dir = matches.get_one::<String>("data-dir").unwrap();
    let backend = match FileStore::new(data_dir) {
        Ok(backend) => backend,
        Err(e) => {
            eprintln!("Failed to open data directory {}: {}", data_dir, e);
            std::process::exit(1);
        }
    };
    let store = CredentialStore::new(backend);

    match matches.subcommand() {
        Some(("setup-email", _)) => {
            if let Err(e) = setup_email_credentials() {
                eprintln!("Email setup failed: {}", e);
                std::process::exit(1);
            }
        }
        Some(("wipe", _)) => {
            handle_wipe(&store);
        }
        _ => {
            // Deliver codes by mail when a relay is configured, otherwise
            // show them to the user the way the reference app does
            let delivery: Box<dyn CodeDelivery> = if SecureEmailManager::new().has_credentials() {
                Box::new(SmtpDelivery)
            } else {
                Box::new(ConsoleDelivery)
            };

            main_menu_flow(&store, delivery.as_ref());
        }
    }
}
