//! Read-only data sources

pub mod security_groups;

pub use security_groups::{SecurityGroupRecord, SecurityGroups, SecurityGroupsQuery, SecurityGroupsResult};

use std::path::Path;

use serde::Serialize;

use crate::error::{ProviderError, Result};

/// Write data source results as pretty JSON to `path`
pub fn write_result_output_file<T: Serialize>(path: &str, value: &T) -> Result<()> {
    let io_err = |source| ProviderError::OutputFile {
        path: path.to_string(),
        source,
    };

    let content = serde_json::to_string_pretty(value)
        .map_err(|e| io_err(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))?;

    if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    std::fs::write(path, content).map_err(io_err)?;

    tracing::info!("wrote data source results to {}", path);
    Ok(())
}
