//! Public callback URL discovery through a locally running ngrok agent.

use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Could not reach the ngrok agent: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("The ngrok agent has no open tunnels")]
    NoTunnel,
}

#[derive(Deserialize, Debug)]
struct TunnelList {
    tunnels: Vec<Tunnel>,
}

#[derive(Deserialize, Debug)]
struct Tunnel {
    public_url: String,
    #[serde(default)]
    proto: String,
}

/// Returns the https public URL of the first tunnel reported by the agent at `api_url`.
pub async fn public_url(api_url: &str) -> Result<String, Error> {
    let url = format!("{}/api/tunnels", api_url.trim_end_matches('/'));
    let list: TunnelList = reqwest::get(&url)
        .await?
        .error_for_status()?
        .json()
        .await?;
    log::trace!("ngrok tunnels = {list:#?}");

    let tunnel = list
        .tunnels
        .iter()
        .find(|t| t.proto == "https")
        .or_else(|| list.tunnels.first())
        .ok_or(Error::NoTunnel)?;

    let public_url = match tunnel.public_url.strip_prefix("http://") {
        Some(rest) => format!("https://{rest}"),
        None => tunnel.public_url.clone(),
    };

    Ok(public_url.trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use mockito::Server;
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn test_prefers_https_tunnel() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api/tunnels")
            .with_body(
                json!({
                    "tunnels": [
                        { "public_url": "http://abcd.ngrok.io", "proto": "http" },
                        { "public_url": "https://abcd.ngrok.io", "proto": "https" }
                    ]
                })
                .to_string(),
            )
            .create_async()
            .await;

        assert_eq!(
            public_url(&server.url()).await.unwrap(),
            "https://abcd.ngrok.io"
        );
    }

    #[tokio::test]
    async fn test_upgrades_http_tunnel() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api/tunnels")
            .with_body(
                json!({ "tunnels": [{ "public_url": "http://abcd.ngrok.io/", "proto": "http" }] })
                    .to_string(),
            )
            .create_async()
            .await;

        assert_eq!(
            public_url(&format!("{}/", server.url())).await.unwrap(),
            "https://abcd.ngrok.io"
        );
    }

    #[tokio::test]
    async fn test_no_tunnels() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api/tunnels")
            .with_body(json!({ "tunnels": [] }).to_string())
            .create_async()
            .await;

        assert!(matches!(
            public_url(&server.url()).await,
            Err(Error::NoTunnel)
        ));
    }
}
