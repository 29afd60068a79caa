use std::time::Duration;

use color_eyre::eyre::{Result, eyre};
use secrecy::SecretString;

use wifijoin::wifi::{
    CancelToken, ConnectOptions, ConnectOutcome, CredentialPrompt, NetworkRecord, WifiManager,
};

use crate::input;

/// Password prompt backed by the controlling terminal.
pub struct TerminalPrompt;

impl CredentialPrompt for TerminalPrompt {
    fn request(&self, ssid: &str) -> Option<SecretString> {
        let label = format!("Enter password for {ssid}: ");
        match input::read_password(&label) {
            Ok(secret) => secret,
            Err(error) => {
                tracing::error!(%error, "failed to read password from the terminal");
                None
            }
        }
    }
}

pub fn scan(manager: &WifiManager) -> Result<()> {
    let records = manager.scan()?;
    if records.is_empty() {
        println!("No wireless networks in range.");
        return Ok(());
    }

    let width = records
        .iter()
        .map(|record| record.ssid.chars().count())
        .max()
        .unwrap_or(0)
        .max(4);
    println!("   {:<width$}  {:>6}  AUTH", "SSID", "SIGNAL");
    for record in &records {
        let marker = if record.connected { ">" } else { " " };
        println!(
            "{marker}  {:<width$}  {:>6}  {}",
            record.ssid,
            signal_label(record),
            record.auth,
        );
    }
    Ok(())
}

pub fn status(manager: &WifiManager) -> Result<()> {
    match manager.current_ssid()? {
        Some(ssid) => println!("Connected to {ssid}"),
        None => println!("Not connected."),
    }
    Ok(())
}

pub fn connect(
    manager: &WifiManager,
    ssid: &str,
    password: Option<String>,
    timeout_secs: Option<u64>,
) -> Result<()> {
    let mut options = ConnectOptions::default();
    if let Some(secs) = timeout_secs {
        options.timeout = Duration::from_secs(secs);
    }
    let credential = password.map(SecretString::from);
    let cancel = CancelToken::new();

    match manager.connect(ssid, credential, &TerminalPrompt, options, &cancel)? {
        ConnectOutcome::Connected => {
            println!("Connected to {ssid}.");
            Ok(())
        }
        ConnectOutcome::TimedOut => Err(eyre!(
            "connection attempt to {ssid} timed out; check the network status and password"
        )),
        ConnectOutcome::Failed(reason) => Err(eyre!("failed to connect to {ssid}: {reason}")),
        ConnectOutcome::Cancelled => {
            println!("Connection cancelled.");
            Ok(())
        }
    }
}

pub fn disconnect(manager: &WifiManager, ssid: &str) -> Result<()> {
    if manager.disconnect(ssid)? {
        println!("Disconnected from {ssid}.");
    } else {
        println!("Not connected to {ssid}.");
    }
    Ok(())
}

pub fn profiles(manager: &WifiManager) -> Result<()> {
    let profiles = manager.saved_profile_names()?;
    if profiles.is_empty() {
        println!("No saved profiles.");
        return Ok(());
    }
    for name in profiles {
        println!("{name}");
    }
    Ok(())
}

fn signal_label(record: &NetworkRecord) -> String {
    match record.signal {
        Some(signal) => format!("{signal}%"),
        None => "--".to_string(),
    }
}
