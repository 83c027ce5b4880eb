use serde::de::DeserializeOwned;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// Load a deal document (or any typed JSON) from disk.
///
/// Relative paths are taken from the working directory. Errors name the path
/// and say whether it was missing, not a regular file, unreadable or not
/// valid JSON for `T`.
pub fn read_json<T: DeserializeOwned>(path: &str) -> Result<T, Box<dyn std::error::Error>> {
    let path = Path::new(path);
    match fs::metadata(path) {
        Ok(meta) if !meta.is_file() => {
            return Err(format!("Not a file: {}", path.display()).into());
        }
        Ok(_) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(format!("File not found: {}", path.display()).into());
        }
        Err(e) => return Err(format!("Cannot access '{}': {e}", path.display()).into()),
    }

    let bytes = fs::read(path).map_err(|e| format!("Failed to read '{}': {e}", path.display()))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| format!("'{}' is not a valid deal document: {e}", path.display()).into())
}
