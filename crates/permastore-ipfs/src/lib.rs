//! Single-shot client for an IPFS node's HTTP API: add bytes, cat them
//! back by content hash. No chunk or resume semantics here; the node owns
//! content handling end to end.

use anyhow::Context;
use serde_json::Value;

pub struct IpfsClient {
    http: reqwest::Client,
    api_url: String,
}

impl IpfsClient {
    pub fn new(api_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: api_url.trim_end_matches('/').to_string(),
        }
    }

    /// Add content to the node. Returns the content hash (CID).
    pub async fn add(&self, data: Vec<u8>) -> anyhow::Result<String> {
        let form = reqwest::multipart::Form::new()
            .part("file", reqwest::multipart::Part::bytes(data));

        let response: Value = self
            .http
            .post(format!("{}/api/v0/add", self.api_url))
            .multipart(form)
            .send()
            .await
            .context("IPFS add request failed")?
            .error_for_status()?
            .json()
            .await?;

        let cid = parse_add_response(&response)?;
        tracing::info!("added content to IPFS: {cid}");
        Ok(cid)
    }

    /// Retrieve content by hash.
    pub async fn cat(&self, cid: &str) -> anyhow::Result<Vec<u8>> {
        let body = self
            .http
            .post(format!("{}/api/v0/cat?arg={cid}", self.api_url))
            .send()
            .await
            .context("IPFS cat request failed")?
            .error_for_status()?
            .bytes()
            .await?;
        Ok(body.to_vec())
    }
}

fn parse_add_response(response: &Value) -> anyhow::Result<String> {
    response["Hash"]
        .as_str()
        .map(str::to_string)
        .context("missing CID in IPFS add response")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_response_hash_extracted() {
        let response: Value = serde_json::from_str(
            r#"{"Name":"file","Hash":"QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG","Size":"42"}"#,
        )
        .unwrap();
        assert_eq!(
            parse_add_response(&response).unwrap(),
            "QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG"
        );
    }

    #[test]
    fn add_response_without_hash_is_error() {
        let response: Value = serde_json::from_str(r#"{"Name":"file"}"#).unwrap();
        assert!(parse_add_response(&response).is_err());
    }

    #[test]
    fn api_url_trailing_slash_normalized() {
        let client = IpfsClient::new("http://127.0.0.1:5001/");
        assert_eq!(client.api_url, "http://127.0.0.1:5001");
    }
}
