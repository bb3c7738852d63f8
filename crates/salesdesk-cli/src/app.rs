//! Command execution.
//!
//! `App` wires the config, the file-backed session store and the
//! authenticated client together, and runs one CLI command against them.
//! It listens on the client event bus: a `Reinitialize` reloads the session
//! from disk, a `LoginRequired` is reported back to `main`.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use salesdesk_core::api::{ApiError, AuthenticatedClient};
use salesdesk_core::auth::{CredentialStore, FileSessionStore, SessionStore};
use salesdesk_core::config::Config;
use salesdesk_core::events::{ClientEvent, ClientEvents};
use salesdesk_core::models::SalesQuery;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::cli::{Command, SalesCommand};
use crate::output;

pub struct App {
    config: Config,
    store: Arc<FileSessionStore>,
    client: AuthenticatedClient,
    events_rx: Mutex<broadcast::Receiver<ClientEvent>>,
    watcher: JoinHandle<()>,
}

impl App {
    pub fn new(api_url: Option<&str>) -> Result<Self> {
        let config = Config::load().context("Failed to load config")?;
        let mut client_config = config.client_config();
        if let Some(url) = api_url {
            client_config.base_url = url.to_string();
        }
        debug!(base_url = %client_config.base_url, "Using API");

        let cache_dir = config.cache_dir()?;
        let events = ClientEvents::new();
        let store = Arc::new(
            FileSessionStore::open(&cache_dir, events.clone())
                .context("Failed to open session store")?,
        );
        let shared: Arc<dyn SessionStore> = store.clone();
        let client = AuthenticatedClient::new(&client_config, shared, events.clone())?;

        let events_rx = Mutex::new(events.subscribe());
        let watcher = tokio::spawn(watch_reinitialize(events.subscribe(), Arc::clone(&store)));

        Ok(Self {
            config,
            store,
            client,
            events_rx,
            watcher,
        })
    }

    /// Whether the session was invalidated since the last call.
    pub fn login_required(&self) -> bool {
        let Ok(mut rx) = self.events_rx.lock() else {
            return false;
        };
        let mut required = false;
        loop {
            match rx.try_recv() {
                Ok(ClientEvent::LoginRequired { reason }) => {
                    debug!(%reason, "Login required");
                    required = true;
                }
                Ok(ClientEvent::Reinitialize) => {}
                Err(TryRecvError::Lagged(_)) => continue,
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
        required
    }

    pub async fn run(&mut self, command: Command) -> Result<()> {
        match command {
            Command::Login { phone, remember } => self.login(phone, remember).await,
            Command::Logout { forget, phone } => self.logout(forget, phone).await,
            Command::Whoami => self.whoami().await,
            Command::Sales(sales) => {
                self.require_session().await?;
                self.sales(sales).await
            }
            Command::Customers => {
                self.require_session().await?;
                let customers = self.client.list_customers().await?;
                output::print_customers(&customers);
                Ok(())
            }
            Command::Warehouses => {
                self.require_session().await?;
                let warehouses = self.client.list_warehouses().await?;
                output::print_warehouses(&warehouses);
                Ok(())
            }
            Command::Inventory { warehouse } => {
                self.require_session().await?;
                let inventory = self.client.warehouse_inventory(&warehouse).await?;
                output::print_inventory(&inventory);
                Ok(())
            }
        }
    }

    async fn sales(&self, command: SalesCommand) -> Result<()> {
        match command {
            SalesCommand::List {
                page,
                page_size,
                pending,
                all,
            } => {
                let query = SalesQuery {
                    page,
                    page_size,
                    is_received: SalesCommand::received_filter(pending, all),
                };
                let sales = self.client.list_sales(&query).await?;
                output::print_sales(&sales, &query);
            }
            SalesCommand::Show { uuid, json } => {
                let detail = self.client.get_sale_detail(&uuid).await?;
                if json {
                    let raw = serde_json::json!({"sale": detail.sale, "lines": detail.lines});
                    println!("{}", serde_json::to_string_pretty(&raw)?);
                } else {
                    output::print_sale_detail(&detail);
                }
            }
            SalesCommand::Create { file } => {
                let contents = std::fs::read_to_string(&file)
                    .with_context(|| format!("Failed to read {}", file.display()))?;
                let sale: serde_json::Value = serde_json::from_str(&contents)
                    .with_context(|| format!("Failed to parse sale from {}", file.display()))?;
                if !sale.is_object() {
                    anyhow::bail!("{} must contain a JSON object", file.display());
                }
                let created = self.client.create_sale(&sale).await?;
                println!(
                    "Created sale {}",
                    output::field(&created, &["number"])
                        .or_else(|| output::field(&created, &["uuid"]))
                        .unwrap_or_else(|| "(no id returned)".to_string())
                );
            }
            SalesCommand::Delete { uuid } => {
                self.client.delete_sale(&uuid).await?;
                println!("Deleted sale {}", uuid.trim());
            }
        }
        Ok(())
    }

    async fn login(&mut self, phone: Option<String>, remember: bool) -> Result<()> {
        let phone = match phone.or_else(|| self.config.last_phone.clone()) {
            Some(phone) => phone,
            None => Self::prompt_phone()?,
        };

        let remembered = CredentialStore::password(&phone).unwrap_or_else(|e| {
            warn!(error = %e, "Keychain unavailable");
            None
        });

        let (session, password) = match remembered {
            Some(password) => {
                debug!("Using password from keychain");
                match self.client.sign_in(&phone, &password).await {
                    Ok(session) => (session, password),
                    Err(e) if credentials_rejected(&e) => {
                        warn!("Remembered password was rejected");
                        eprintln!("The saved password was not accepted.");
                        if !remember {
                            if let Err(e) = CredentialStore::forget(&phone) {
                                warn!(error = %e, "Failed to delete password from keychain");
                            }
                        }
                        let password = rpassword::prompt_password("Password: ")?;
                        (self.client.sign_in(&phone, &password).await?, password)
                    }
                    Err(e) => return Err(e),
                }
            }
            None => {
                let password = rpassword::prompt_password("Password: ")?;
                (self.client.sign_in(&phone, &password).await?, password)
            }
        };

        if remember {
            if let Err(e) = CredentialStore::store(&phone, &password) {
                warn!(error = %e, "Failed to store password in keychain");
            }
        }

        self.config.last_phone = Some(phone);
        if let Err(e) = self.config.save() {
            warn!(error = %e, "Failed to save config");
        }

        println!("Signed in as {}", output::describe_user(&session.user));
        Ok(())
    }

    async fn logout(&mut self, forget: bool, phone: Option<String>) -> Result<()> {
        let signed_in_phone = self
            .store
            .current()
            .await
            .map(|s| s.user.phone)
            .filter(|p| !p.is_empty());

        self.client.sign_out().await;
        // Signing out on purpose is not a failure
        let _ = self.login_required();

        if forget {
            let phones = match phone {
                Some(phone) => vec![phone],
                None => forget_candidates(signed_in_phone, self.config.last_phone.clone()),
            };
            for phone in &phones {
                if let Err(e) = CredentialStore::forget(phone) {
                    warn!(error = %e, "Failed to delete password from keychain");
                }
            }
        }

        println!("Signed out");
        Ok(())
    }

    async fn whoami(&self) -> Result<()> {
        match self.store.current().await {
            Some(session) => output::print_session(&session),
            None => println!("Not signed in"),
        }
        Ok(())
    }

    async fn require_session(&self) -> Result<()> {
        if self.store.current().await.is_none() {
            anyhow::bail!("Not signed in. Run `salesdesk login` first.");
        }
        Ok(())
    }

    fn prompt_phone() -> Result<String> {
        print!("Phone: ");
        io::stdout().flush()?;
        let mut phone = String::new();
        io::stdin().read_line(&mut phone)?;
        let phone = phone.trim().to_string();
        if phone.is_empty() {
            anyhow::bail!("Phone number required");
        }
        Ok(phone)
    }
}

/// Whether a login failed because the server refused the phone/password
/// pair, as opposed to a network or server problem.
fn credentials_rejected(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<ApiError>(),
        Some(ApiError::Unauthorized | ApiError::BadRequest(_) | ApiError::AccessDenied(_))
    )
}

/// Phones whose remembered password `logout --forget` removes when none is
/// given explicitly.
fn forget_candidates(signed_in: Option<String>, last_used: Option<String>) -> Vec<String> {
    let mut phones: Vec<String> = signed_in.into_iter().collect();
    if let Some(last) = last_used {
        if !phones.iter().any(|p| p.trim() == last.trim()) {
            phones.push(last);
        }
    }
    phones
}

impl Drop for App {
    fn drop(&mut self) {
        self.watcher.abort();
    }
}

/// Reload the session from disk whenever the client asks state holders to
/// reinitialize after a token refresh.
async fn watch_reinitialize(
    mut rx: broadcast::Receiver<ClientEvent>,
    store: Arc<FileSessionStore>,
) {
    loop {
        match rx.recv().await {
            Ok(ClientEvent::Reinitialize) => match store.reload().await {
                Ok(present) => debug!(present, "Session reloaded after token refresh"),
                Err(e) => warn!(error = %e, "Failed to reload session"),
            },
            Ok(ClientEvent::LoginRequired { .. }) => {}
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "Missed client events");
            }
            Err(RecvError::Closed) => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_rejected() {
        let refused: Result<()> = Err(ApiError::Unauthorized).context("Login failed");
        assert!(credentials_rejected(&refused.unwrap_err()));

        let bad: Result<()> =
            Err(ApiError::BadRequest("No active account".to_string())).context("Login failed");
        assert!(credentials_rejected(&bad.unwrap_err()));

        let down: Result<()> =
            Err(ApiError::ServerError("boom".to_string())).context("Login failed");
        assert!(!credentials_rejected(&down.unwrap_err()));

        assert!(!credentials_rejected(&anyhow::anyhow!("no tokens")));
    }

    #[test]
    fn test_forget_candidates() {
        assert_eq!(
            forget_candidates(Some("+15550100".into()), Some("+15550199".into())),
            vec!["+15550100".to_string(), "+15550199".to_string()]
        );
        assert_eq!(
            forget_candidates(Some("+15550100".into()), Some("+15550100".into())),
            vec!["+15550100".to_string()]
        );
        assert!(forget_candidates(None, None).is_empty());
    }
}
