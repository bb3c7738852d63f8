use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(version, about = "Command-line client for the sales API")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// API base URL, overriding the config file.
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,

    /// Log debug output to stderr (RUST_LOG takes precedence).
    #[arg(long, short = 'v', global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Sign in with phone number and password.
    Login {
        /// Phone number; defaults to the last one used.
        #[arg(long)]
        phone: Option<String>,

        /// Remember the password in the OS keychain.
        #[arg(long, default_value_t = false)]
        remember: bool,
    },

    /// Sign out and discard the saved session.
    Logout {
        /// Also remove the password from the OS keychain.
        #[arg(long, default_value_t = false)]
        forget: bool,

        /// Phone number whose password to forget; defaults to the signed-in
        /// user and the last one used.
        #[arg(long, requires = "forget")]
        phone: Option<String>,
    },

    /// Show the signed-in user.
    Whoami,

    /// Work with sales.
    #[command(subcommand)]
    Sales(SalesCommand),

    /// List customers.
    Customers,

    /// List warehouses.
    Warehouses,

    /// Show a warehouse's inventory.
    Inventory {
        /// Warehouse UUID
        warehouse: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum SalesCommand {
    /// List sales, one page at a time.
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,

        #[arg(long, default_value_t = 10)]
        page_size: u32,

        /// Show sales not yet received instead of received ones.
        #[arg(long, default_value_t = false, conflicts_with = "all")]
        pending: bool,

        /// Show sales regardless of received state.
        #[arg(long, default_value_t = false)]
        all: bool,
    },

    /// Show one sale with its lines.
    Show {
        /// Sale UUID
        uuid: String,

        /// Print the raw JSON returned by the server.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Create a sale from a JSON file.
    Create {
        /// JSON object posted as-is: uuid, date, customer, warehouse,
        /// discount_price, is_received, lines and customer_payment.
        #[arg(long, value_name = "FILE")]
        file: PathBuf,
    },

    /// Delete a sale. This cannot be undone.
    Delete {
        /// Sale UUID
        uuid: String,
    },
}

impl SalesCommand {
    /// Received-state filter for `list`.
    pub fn received_filter(pending: bool, all: bool) -> Option<bool> {
        if all {
            None
        } else {
            Some(!pending)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sales_list() {
        let cli = Cli::parse_from(["salesdesk", "sales", "list", "--page", "3", "--pending"]);
        match cli.command {
            Command::Sales(SalesCommand::List {
                page,
                page_size,
                pending,
                all,
            }) => {
                assert_eq!(page, 3);
                assert_eq!(page_size, 10);
                assert_eq!(SalesCommand::received_filter(pending, all), Some(false));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_pending_conflicts_with_all() {
        assert!(Cli::try_parse_from(["salesdesk", "sales", "list", "--pending", "--all"]).is_err());
    }

    #[test]
    fn test_logout_phone_requires_forget() {
        let cli = Cli::parse_from(["salesdesk", "logout", "--forget", "--phone", "+15550100"]);
        match cli.command {
            Command::Logout { forget, phone } => {
                assert!(forget);
                assert_eq!(phone.as_deref(), Some("+15550100"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert!(Cli::try_parse_from(["salesdesk", "logout", "--phone", "+15550100"]).is_err());
    }

    #[test]
    fn test_global_api_url() {
        let cli = Cli::parse_from(["salesdesk", "customers", "--api-url", "https://api.example"]);
        assert_eq!(cli.api_url.as_deref(), Some("https://api.example"));
    }

    #[test]
    fn test_received_filter() {
        assert_eq!(SalesCommand::received_filter(false, false), Some(true));
        assert_eq!(SalesCommand::received_filter(false, true), None);
    }
}
