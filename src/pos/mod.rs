//! POS web portal client
//!
//! The portal only offers grid exports behind a form login. A session logs in,
//! sets the grid date filter, triggers an export and downloads the file.
//! Every failure here aborts the run: without the export there is nothing to do.

use anyhow::{Context, Result};
use reqwest::blocking::{Client, Response};
use scraper::{Html, Selector};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::config::PosSettings;
use crate::error::ReportError;

const TOKEN_FIELD: &str = "__RequestVerificationToken";
const GRID_PLACEHOLDER: &str = "{GRID}";

/// Portal grids the jobs export
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grid {
    ZReports,
    Transactions,
}

impl Grid {
    pub fn as_str(&self) -> &'static str {
        match self {
            Grid::ZReports => "ZReports",
            Grid::Transactions => "Transactions",
        }
    }
}

/// Anything that can put a grid export for a date range on disk
pub trait ExportSource {
    /// Download `grid` filtered to `[from, to)` (portal format `YYYY-MM-DD HH:MM`) into `dest`
    fn download_export(&mut self, grid: Grid, from: &str, to: &str, dest: &Path) -> Result<()>;
}

pub struct PosClient {
    client: Client,
    settings: PosSettings,
}

fn session_error(message: impl Into<String>) -> anyhow::Error {
    ReportError::PosSession(message.into()).into()
}

impl PosClient {
    pub fn new(settings: &PosSettings) -> Result<Self> {
        let client = Client::builder()
            .cookie_store(true)
            .danger_accept_invalid_certs(settings.accept_invalid_certs)
            .timeout(settings.timeout())
            .build()
            .context("Failed to build POS HTTP client")?;

        Ok(Self {
            client,
            settings: settings.clone(),
        })
    }

    fn grid_url(template: &str, grid: Grid) -> String {
        template.replace(GRID_PLACEHOLDER, grid.as_str())
    }

    /// Log in and keep the session cookies
    pub fn login(&self, grid: Grid) -> Result<()> {
        let url = Self::grid_url(&self.settings.login_url, grid);
        let page = self
            .client
            .get(&url)
            .send()
            .context("Failed to load POS login page")?
            .text()
            .context("Failed to read POS login page")?;

        let token = extract_verification_token(&page)
            .ok_or_else(|| session_error("could not find RequestVerificationToken on login page"))?;

        let form = [
            (TOKEN_FIELD, token.as_str()),
            ("UserName", self.settings.username.as_str()),
            ("Password", self.settings.password.as_str()),
        ];
        let response = self
            .client
            .post(&url)
            .form(&form)
            .send()
            .context("Failed to post POS login form")?;

        let status = response.status();
        let body = response.text().unwrap_or_default();
        if !status.is_success() || body.contains("Invalid login") {
            return Err(session_error(format!(
                "login failed with status {}; check credentials",
                status
            )));
        }

        info!("POS login successful");
        Ok(())
    }

    /// Set the grid's date range filter
    pub fn filter(&self, grid: Grid, from: &str, to: &str) -> Result<()> {
        let url = Self::grid_url(&self.settings.filter_url, grid);
        let response = self
            .client
            .post(&url)
            .form(&[("dateFrom", from), ("dateTo", to)])
            .send()
            .context("Failed to send POS filter request")?;

        if !response.status().is_success() {
            return Err(session_error(format!(
                "filter request failed: {}",
                response.status()
            )));
        }
        info!("POS filter set: {} .. {}", from, to);
        Ok(())
    }

    /// Ask the portal to prepare a CSV export of the filtered grid
    pub fn export(&self, grid: Grid) -> Result<()> {
        let grid_name = format!("GridView{}", grid.as_str());
        let params = [
            ("OutputFormat", "CSV"),
            ("GridName", grid_name.as_str()),
            ("VID", "undefined"),
        ];
        let response = self
            .client
            .post(&self.settings.export_url)
            .query(&params)
            .send()
            .context("Failed to send POS export request")?;

        if !response.status().is_success() {
            return Err(session_error(format!(
                "export request failed: {}",
                response.status()
            )));
        }
        info!("POS export prepared for {}", grid_name);
        Ok(())
    }

    /// Download the prepared export to `dest`
    pub fn download(&self, dest: &Path) -> Result<()> {
        let response = self
            .client
            .post(&self.settings.download_url)
            .send()
            .context("Failed to send POS download request")?;

        if !response.status().is_success() {
            let status = response.status();
            let message = error_message(response);
            return Err(session_error(format!(
                "download failed with status {}: {}",
                status, message
            )));
        }

        let bytes = response.bytes().context("Failed to read POS download")?;
        fs::write(dest, &bytes).with_context(|| format!("Failed to write export {:?}", dest))?;
        info!("Export downloaded to {:?} ({} bytes)", dest, bytes.len());
        Ok(())
    }

    pub fn logout(&self) {
        match self.client.get(&self.settings.logout_url).send() {
            Ok(r) if r.status().is_success() || r.status().as_u16() == 302 => {
                info!("POS logout successful")
            }
            Ok(r) => warn!("POS logout returned {}", r.status()),
            Err(e) => warn!("POS logout failed: {}", e),
        }
    }
}

impl ExportSource for PosClient {
    fn download_export(&mut self, grid: Grid, from: &str, to: &str, dest: &Path) -> Result<()> {
        self.login(grid)?;
        self.filter(grid, from, to)?;
        self.export(grid)?;
        let downloaded = self.download(dest);
        self.logout();
        downloaded
    }
}

fn error_message(response: Response) -> String {
    let body = response.text().unwrap_or_default();
    extract_popup_message(&body).unwrap_or_else(|| "Unknown error".to_string())
}

/// Anti-forgery token from the login form
pub fn extract_verification_token(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(r#"input[name="__RequestVerificationToken"]"#).ok()?;
    document
        .select(&selector)
        .next()
        .and_then(|input| input.value().attr("value"))
        .map(str::to_string)
}

/// Text of the portal's error popup, if the page shows one
pub fn extract_popup_message(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("div.dxpc-content").ok()?;
    document
        .select(&selector)
        .next()
        .map(|div| div.text().collect::<String>().trim().to_string())
        .filter(|text| !text.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_verification_token() {
        let html = r#"<html><body><form>
            <input type="hidden" name="__RequestVerificationToken" value="abc123" />
            <input name="UserName" />
        </form></body></html>"#;
        assert_eq!(extract_verification_token(html), Some("abc123".to_string()));
        assert_eq!(extract_verification_token("<html></html>"), None);
    }

    #[test]
    fn test_extract_popup_message() {
        let html = r#"<div class="dxpc-content"> Session expired </div>"#;
        assert_eq!(extract_popup_message(html), Some("Session expired".to_string()));
        assert_eq!(extract_popup_message("<p>nothing</p>"), None);
    }

    #[test]
    fn test_grid_url_substitution() {
        assert_eq!(
            PosClient::grid_url("https://pos.test/{GRID}/Login", Grid::ZReports),
            "https://pos.test/ZReports/Login"
        );
        assert_eq!(Grid::Transactions.as_str(), "Transactions");
    }
}
