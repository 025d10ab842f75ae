pub mod file;
pub mod stdin;

use serde::de::DeserializeOwned;

/// Request body from `--input`, else piped stdin.
pub fn read_request<T: DeserializeOwned>(
    path: Option<&str>,
    command: &str,
) -> Result<T, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        return file::read_json(path);
    }
    match stdin::read_stdin()? {
        Some(data) => Ok(serde_json::from_value(data)?),
        None => Err(format!("--input file or piped JSON is required for {command}").into()),
    }
}
