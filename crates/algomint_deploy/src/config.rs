use crate::error::DeployError;
use crate::network::AlgorandNetwork;
use crate::stage::DeploymentStage;
use std::env;
use std::time::Duration;
use tokio::sync::broadcast;

const DEFAULT_SUBMIT_TIMEOUT: Duration = Duration::from_secs(15);
const DEFAULT_MAX_ROUNDS_TO_WAIT: u64 = 10;
/// Protocol limit on `last_valid - first_valid`.
const MAX_VALIDITY_WINDOW: u64 = 1000;
const TXID_PLACEHOLDER: &str = "{txid}";

/// Settings for one orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub struct DeployConfig {
    pub network: AlgorandNetwork,
    /// Overrides the network's explorer link; must contain `{txid}`.
    pub explorer_template: Option<String>,
    /// Upper bound on each submission, including the confirmation wait.
    pub submit_timeout: Duration,
    pub max_rounds_to_wait: u64,
    /// When create arguments cannot be encoded, create without them instead of failing.
    pub allow_degraded_create: bool,
    /// Shrinks the suggested validity window to this many rounds.
    pub validity_window: Option<u64>,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            network: AlgorandNetwork::default(),
            explorer_template: None,
            submit_timeout: DEFAULT_SUBMIT_TIMEOUT,
            max_rounds_to_wait: DEFAULT_MAX_ROUNDS_TO_WAIT,
            allow_degraded_create: true,
            validity_window: None,
        }
    }
}

impl DeployConfig {
    pub fn new(network: AlgorandNetwork) -> Self {
        Self {
            network,
            ..Default::default()
        }
    }

    pub fn with_explorer_template(mut self, template: impl Into<String>) -> Self {
        self.explorer_template = Some(template.into());
        self
    }

    pub fn with_submit_timeout(mut self, timeout: Duration) -> Self {
        self.submit_timeout = timeout;
        self
    }

    pub fn with_max_rounds_to_wait(mut self, rounds: u64) -> Self {
        self.max_rounds_to_wait = rounds;
        self
    }

    pub fn with_degraded_create(mut self, allow: bool) -> Self {
        self.allow_degraded_create = allow;
        self
    }

    pub fn with_validity_window(mut self, rounds: u64) -> Self {
        self.validity_window = Some(rounds);
        self
    }

    /// Loads `.env` if present, then reads `ALGOMINT_*` variables over the defaults.
    pub fn from_env() -> Result<Self, DeployError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, DeployError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = DeployConfig::default();

        if let Some(network) = lookup("ALGOMINT_NETWORK") {
            config.network = network.parse()?;
        }
        if let Some(secs) = lookup("ALGOMINT_SUBMIT_TIMEOUT_SECS") {
            config.submit_timeout = Duration::from_secs(parse_number(
                "ALGOMINT_SUBMIT_TIMEOUT_SECS",
                &secs,
            )?);
        }
        if let Some(rounds) = lookup("ALGOMINT_MAX_ROUNDS_TO_WAIT") {
            config.max_rounds_to_wait = parse_number("ALGOMINT_MAX_ROUNDS_TO_WAIT", &rounds)?;
        }
        if let Some(flag) = lookup("ALGOMINT_ALLOW_DEGRADED_CREATE") {
            config.allow_degraded_create = match flag.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" => false,
                other => {
                    return Err(DeployError::validation(format!(
                        "ALGOMINT_ALLOW_DEGRADED_CREATE must be true or false, got '{}'",
                        other
                    )));
                }
            };
        }
        if let Some(template) = lookup("ALGOMINT_EXPLORER_URL") {
            config.explorer_template = Some(template);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), DeployError> {
        if self.submit_timeout.is_zero() {
            return Err(DeployError::validation("Submit timeout must be positive"));
        }
        if self.max_rounds_to_wait == 0 {
            return Err(DeployError::validation(
                "Confirmation must wait at least one round",
            ));
        }
        if let Some(template) = &self.explorer_template {
            if !template.contains(TXID_PLACEHOLDER) {
                return Err(DeployError::validation(format!(
                    "Explorer template '{}' has no {} placeholder",
                    template, TXID_PLACEHOLDER
                )));
            }
        }
        if let Some(window) = self.validity_window {
            if window == 0 || window > MAX_VALIDITY_WINDOW {
                return Err(DeployError::validation(format!(
                    "Validity window must be between 1 and {} rounds, got {}",
                    MAX_VALIDITY_WINDOW, window
                )));
            }
        }
        Ok(())
    }

    pub fn explorer_url(&self, transaction_id: &str) -> String {
        self.explorer_template
            .as_deref()
            .unwrap_or(self.network.default_explorer_template())
            .replace(TXID_PLACEHOLDER, transaction_id)
    }
}

fn parse_number(key: &str, value: &str) -> Result<u64, DeployError> {
    value.trim().parse().map_err(|_| {
        DeployError::validation(format!("{} must be a whole number, got '{}'", key, value))
    })
}

/// Progress notifications a UI can follow.
#[derive(Debug, Clone, PartialEq)]
pub enum DeploymentEvent {
    StageChanged {
        from: DeploymentStage,
        to: DeploymentStage,
        action: String,
    },
    Warning {
        message: String,
    },
    Confirmed {
        app_id: u64,
        transaction_id: String,
    },
}

/// Async event emitter using Tokio broadcast
#[derive(Debug, Clone)]
pub struct DeploymentEvents {
    sender: broadcast::Sender<DeploymentEvent>,
}

impl DeploymentEvents {
    pub fn new(buffer: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(buffer);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DeploymentEvent> {
        self.sender.subscribe()
    }

    pub fn emit(&self, event: DeploymentEvent) {
        // No subscribers is fine
        let _ = self.sender.send(event);
    }
}

impl Default for DeploymentEvents {
    fn default() -> Self {
        Self::new(32)
    }
}
