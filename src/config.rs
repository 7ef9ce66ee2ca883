//! Settings loaded from `config.toml`
//!
//! Secrets can be kept out of the file and supplied through environment
//! variables, which take precedence over the file values:
//! `POSLEDGER_POS_USERNAME`, `POSLEDGER_POS_PASSWORD`, `POSLEDGER_B1_API_KEY`,
//! `POSLEDGER_SMTP_PASSWORD`.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ReportError;

const CONFIG_ENV: &str = "POSLEDGER_CONFIG";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Folder holding exports, reports, `mapping.csv` and the receipt counter
    pub data_folder: PathBuf,
    #[serde(default = "default_shop_name")]
    pub shop_name: String,
    #[serde(default)]
    pub pos: PosSettings,
    #[serde(default)]
    pub b1: B1Settings,
    #[serde(default)]
    pub ledger: LedgerSettings,
    #[serde(default)]
    pub email: EmailSettings,
    #[serde(default)]
    pub daily: DailySettings,
    /// Checked in declared order, first match wins
    #[serde(default)]
    pub prefix_rules: Vec<PrefixRuleSetting>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct PosSettings {
    /// May contain a `{GRID}` placeholder
    pub login_url: String,
    /// May contain a `{GRID}` placeholder
    pub filter_url: String,
    pub export_url: String,
    pub download_url: String,
    pub logout_url: String,
    pub username: String,
    pub password: String,
    pub accept_invalid_certs: bool,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct B1Settings {
    pub base_url: String,
    pub api_key: String,
    pub timeout_secs: Option<u64>,
}

impl Default for B1Settings {
    fn default() -> Self {
        Self {
            base_url: "https://www.b1.lt/api/".to_string(),
            api_key: String::new(),
            timeout_secs: None,
        }
    }
}

/// Fixed identifiers stamped on every cash receipt, plus the counter policy
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LedgerSettings {
    pub client_account_id: i64,
    pub client_id: i64,
    pub currency_id: i64,
    pub currency_code: String,
    pub debit_account_id: i64,
    pub series: String,
    pub document_status_id: i64,
    pub employee_id: i64,
    pub memo_prefix: String,
    /// Total attempts per submission, the first one included
    pub max_attempts: u32,
    /// The counter is only advanced while below this value. Defaults to the
    /// next calendar year's date seed when unset.
    pub counter_ceiling: Option<u64>,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self {
            client_account_id: 195,
            client_id: 2,
            currency_id: 2,
            currency_code: "EUR".to_string(),
            debit_account_id: 510,
            series: "PPK".to_string(),
            document_status_id: 5,
            employee_id: 39,
            memo_prefix: "Inkasuota suma".to_string(),
            max_attempts: 2,
            counter_ceiling: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmailSettings {
    pub smtp_server: String,
    pub smtp_port: u16,
    pub smtp_user: String,
    pub smtp_password: String,
    pub from: String,
    /// Recipient of the weekly discount report
    pub reporting_to: String,
    /// Recipient of the daily Z report
    pub daily_to: String,
}

impl Default for EmailSettings {
    fn default() -> Self {
        Self {
            smtp_server: String::new(),
            smtp_port: 587,
            smtp_user: String::new(),
            smtp_password: String::new(),
            from: String::new(),
            reporting_to: String::new(),
            daily_to: String::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DailySettings {
    /// The daily job does nothing before this local hour
    pub earliest_hour: u32,
    /// When this employee closed the day no receipt email is sent
    pub skip_employee: Option<String>,
}

impl Default for DailySettings {
    fn default() -> Self {
        Self {
            earliest_hour: 15,
            skip_employee: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct PrefixRuleSetting {
    pub prefix: String,
    pub supplier: String,
}

fn default_shop_name() -> String {
    "Demo".to_string()
}

impl Settings {
    /// Load settings from an explicit path, `POSLEDGER_CONFIG`, or the
    /// platform config directory, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => default_config_path()?,
        };

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        let mut settings = Self::from_toml(&content)
            .with_context(|| format!("Failed to parse config file {:?}", path))?;
        settings.apply_env_overrides();
        Ok(settings)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(content)?;
        if settings.ledger.max_attempts == 0 {
            return Err(ReportError::Config("ledger.max_attempts must be at least 1".into()).into());
        }
        if let Some(rule) = settings.prefix_rules.iter().find(|r| r.prefix.is_empty()) {
            return Err(ReportError::Config(format!(
                "empty prefix configured for supplier {}",
                rule.supplier
            ))
            .into());
        }
        Ok(settings)
    }

    fn apply_env_overrides(&mut self) {
        override_from_env(&mut self.pos.username, "POSLEDGER_POS_USERNAME");
        override_from_env(&mut self.pos.password, "POSLEDGER_POS_PASSWORD");
        override_from_env(&mut self.b1.api_key, "POSLEDGER_B1_API_KEY");
        override_from_env(&mut self.email.smtp_password, "POSLEDGER_SMTP_PASSWORD");
    }

    pub fn mapping_path(&self) -> PathBuf {
        self.data_folder.join("mapping.csv")
    }

    pub fn counter_path(&self) -> PathBuf {
        self.data_folder.join("cash_receipt_num.txt")
    }
}

impl PosSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }
}

impl B1Settings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }
}

fn override_from_env(target: &mut String, var: &str) {
    if let Ok(value) = std::env::var(var) {
        if !value.is_empty() {
            *target = value;
        }
    }
}

/// Get the default config path (`<config_home>/posledger/config.toml`)
pub fn default_config_path() -> Result<PathBuf> {
    if let Some(path) = std::env::var_os(CONFIG_ENV) {
        return Ok(PathBuf::from(path));
    }
    let config_dir = dir_spec::config_home()
        .ok_or_else(|| ReportError::Config("Could not determine config directory".into()))?;
    Ok(config_dir.join("posledger").join("config.toml"))
}
