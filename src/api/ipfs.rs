use anyhow::{anyhow, Context, Result};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::path::Path;
use tracing::info;

pub const DEFAULT_IPFS_API: &str = "https://api.thegraph.com/ipfs";

/// One line of an `/api/v0/add` response.
#[derive(Debug, Deserialize, PartialEq, Eq)]
pub struct Added {
    #[serde(rename = "Name")]
    pub name: String,

    #[serde(rename = "Hash")]
    pub hash: String,

    #[serde(rename = "Size")]
    pub size: String,
}

fn add_url(api: &str) -> String {
    format!("{}/api/v0/add", api.trim_end_matches('/'))
}

/// Parse the add response. Newline-delimited; the first entry is the file.
fn parse_added(body: &str) -> Result<Added> {
    let line = body
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .ok_or_else(|| anyhow!("Empty IPFS response"))?;

    let added: Added = serde_json::from_str(line)?;
    if added.hash.is_empty() {
        return Err(anyhow!("IPFS response has no hash: {}", line));
    }
    Ok(added)
}

/// Upload a market descriptor JSON file and return its IPFS hash.
pub async fn add_descriptor(api: &str, path: &Path) -> Result<Added> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;

    // Catch a broken descriptor before it is pinned forever
    serde_json::from_slice::<serde_json::Value>(&bytes)
        .with_context(|| format!("{} is not valid JSON", path.display()))?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "event.json".to_string());

    let form = Form::new().part("file", Part::bytes(bytes).file_name(file_name));

    let url = add_url(api);
    let client = reqwest::Client::new();
    let response = client.post(&url).multipart(form).send().await?;

    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(anyhow!("IPFS add failed ({}): {}", status, body));
    }

    let added = parse_added(&body)?;
    info!(hash = %added.hash, size = %added.size, "descriptor pinned");
    Ok(added)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_url() {
        assert_eq!(
            add_url("https://api.thegraph.com/ipfs/"),
            "https://api.thegraph.com/ipfs/api/v0/add"
        );
        assert_eq!(add_url(DEFAULT_IPFS_API), "https://api.thegraph.com/ipfs/api/v0/add");
    }

    #[test]
    fn test_parse_added() {
        let body = r#"{"Name":"event.json","Hash":"QmVCHu1bo1j33ik6SHfmVu8seDXZhaB1ZjQ2ZfBqj3wytF","Size":"412"}
"#;
        let added = parse_added(body).unwrap();
        assert_eq!(added.name, "event.json");
        assert_eq!(added.hash, "QmVCHu1bo1j33ik6SHfmVu8seDXZhaB1ZjQ2ZfBqj3wytF");
        assert_eq!(added.size, "412");
    }

    #[test]
    fn test_parse_added_takes_first_entry() {
        let body = "\n{\"Name\":\"event.json\",\"Hash\":\"QmA\",\"Size\":\"1\"}\n{\"Name\":\"\",\"Hash\":\"QmDir\",\"Size\":\"60\"}\n";
        assert_eq!(parse_added(body).unwrap().hash, "QmA");
    }

    #[test]
    fn test_parse_added_rejects_empty() {
        assert!(parse_added("").is_err());
        assert!(parse_added(r#"{"Name":"x","Hash":"","Size":"0"}"#).is_err());
        assert!(parse_added("not json").is_err());
    }

    #[tokio::test]
    async fn test_rejects_invalid_descriptor_before_upload() {
        let path = std::env::temp_dir().join(format!("rc-addmarket-bad-{}.json", std::process::id()));
        tokio::fs::write(&path, b"{ not json").await.unwrap();

        let err = add_descriptor("http://127.0.0.1:9", &path).await.unwrap_err();
        assert!(err.to_string().contains("is not valid JSON"));

        tokio::fs::remove_file(&path).await.unwrap();
    }
}
