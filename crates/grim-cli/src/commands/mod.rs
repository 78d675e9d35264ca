pub mod batch;
pub mod check;

use std::error::Error;
use std::fs;
use std::path::Path;

use grim_engine::AuditOpts;

/// Loads options from an optional YAML file; absent fields keep defaults.
pub fn load_opts(path: Option<&Path>) -> Result<AuditOpts, Box<dyn Error>> {
    let opts = match path {
        Some(path) => {
            let bytes = fs::read(path)?;
            serde_yaml::from_slice(&bytes)?
        }
        None => AuditOpts::default(),
    };
    Ok(opts)
}
