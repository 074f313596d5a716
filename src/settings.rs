//! NAT engine settings

use crate::nat::{PortPrediction, TransportAddress};
use crate::nat::predict::{DEFAULT_MAX_CANDIDATES, DEFAULT_SAFETY_FACTOR};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Widest symmetric NAT window accepted from settings, in standard deviations
pub const MAX_SAFETY_FACTOR: f64 = 10.0;

/// Settings for candidate address generation
///
/// Stored as JSON. Missing fields take their default values.
///
/// # Example
/// ```rust,no_run
/// use natlearn::settings::NatSettings;
///
/// let settings = NatSettings::load("nat.json").expect("Failed to load");
/// println!("{} local addresses", settings.local_tas.len());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NatSettings {
    /// Locally configured addresses, advertised after everything learned
    pub local_tas: Vec<TransportAddress>,
    /// Symmetric NAT window half-width, in standard deviations
    pub safety_factor: f64,
    /// Largest port prediction still trusted as a classification
    pub max_predicted_ports: usize,
}

impl NatSettings {
    /// Load settings from a JSON file
    ///
    /// Returns the defaults if the file does not exist or is empty. Loaded
    /// values are validated.
    pub fn load<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            info!("No NAT settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let data = std::fs::read_to_string(path)?;
        if data.trim().is_empty() {
            warn!("NAT settings file {} is empty, using defaults", path.display());
            return Ok(Self::default());
        }

        let settings: Self = serde_json::from_str(&data)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Save settings to a JSON file, creating parent directories
    pub fn save<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Check that the prediction parameters are usable
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=MAX_SAFETY_FACTOR).contains(&self.safety_factor) {
            return Err(Error::Config(format!(
                "safety_factor must be between 0 and {}, got {}",
                MAX_SAFETY_FACTOR, self.safety_factor
            )));
        }
        if self.max_predicted_ports == 0 {
            return Err(Error::Config(
                "max_predicted_ports must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Prediction parameters for the symmetric and Linux-style models
    pub fn prediction(&self) -> PortPrediction {
        PortPrediction::new(self.safety_factor, self.max_predicted_ports)
    }
}

impl Default for NatSettings {
    fn default() -> Self {
        Self {
            local_tas: Vec::new(),
            safety_factor: DEFAULT_SAFETY_FACTOR,
            max_predicted_ports: DEFAULT_MAX_CANDIDATES,
        }
    }
}
