// crates/meshgraph-daemon/src/rpc_client.rs
//
// JSON-RPC chain client: POSTs `{method, params}` to the chain endpoint and
// unwraps `{success, result, error}` responses.
//
// Public keys travel as hex strings. Endpoint addresses travel as the decimal
// string of their integer form (see `meshgraph_core::net`), since IPv6 values
// do not fit in a JSON number. Calls that act on behalf of this node carry
// the hotkey and an ed25519 signature over the call's params.

use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use ed25519_dalek::Signer;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;

use meshgraph_core::crypto::Keypair;
use meshgraph_core::net::{int_to_ip, ip_to_int};
use meshgraph_core::{ChainClient, MeshgraphError, NeuronInfo, PublicKey};

/// Request envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub method: String,
    pub params: serde_json::Value,
}

/// Response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub success: bool,
    pub result: Option<serde_json::Value>,
    pub error: Option<String>,
}

impl JsonRpcResponse {
    /// Unwrap the envelope into a typed result.
    pub fn into_result<T: DeserializeOwned>(self) -> Result<T, MeshgraphError> {
        if !self.success {
            return Err(MeshgraphError::Transport(
                self.error.unwrap_or_else(|| "Unknown error".to_string()),
            ));
        }
        let result = self
            .result
            .ok_or_else(|| MeshgraphError::Transport("No result in response".to_string()))?;
        Ok(serde_json::from_value(result)?)
    }
}

/// Endpoint descriptor as the chain reports it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireNeuron {
    pub ip: String,
    pub port: u16,
    pub version: String,
}

impl WireNeuron {
    pub fn from_info(info: &NeuronInfo) -> Self {
        Self {
            ip: ip_to_int(info.address).to_string(),
            port: info.port,
            version: info.version.clone(),
        }
    }

    pub fn into_info(self) -> Result<NeuronInfo, MeshgraphError> {
        let ip: u128 = self
            .ip
            .parse()
            .map_err(|e| {
                MeshgraphError::Serialization(format!("Invalid ip '{}': {}", self.ip, e))
            })?;
        Ok(NeuronInfo {
            address: int_to_ip(ip),
            port: self.port,
            version: self.version,
        })
    }
}

#[derive(Debug, Deserialize)]
struct Emission {
    hotkey: PublicKey,
    block: u64,
}

pub struct JsonRpcChainClient {
    endpoint: String,
    client: reqwest::Client,
    keypair: Keypair,
    connected: AtomicBool,
}

impl JsonRpcChainClient {
    pub fn new(
        endpoint: &str,
        keypair: Keypair,
        request_timeout: Duration,
    ) -> Result<Self, MeshgraphError> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| MeshgraphError::Transport(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            endpoint: endpoint.to_string(),
            client,
            keypair,
            connected: AtomicBool::new(false),
        })
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<T, MeshgraphError> {
        let request = JsonRpcRequest {
            method: method.to_string(),
            params,
        };

        let resp = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| MeshgraphError::Transport(format!("HTTP error on {}: {}", method, e)))?;

        let rpc_resp: JsonRpcResponse = resp
            .json()
            .await
            .map_err(|e| {
                MeshgraphError::Transport(format!("Failed to parse {} response: {}", method, e))
            })?;

        rpc_resp.into_result()
    }

    /// Attach this node's hotkey and a signature over `params`.
    fn signed(&self, params: serde_json::Value) -> Result<serde_json::Value, MeshgraphError> {
        let message = serde_json::to_vec(&params)?;
        let signature = self.keypair.signing_key.sign(&message);
        Ok(json!({
            "hotkey": self.keypair.public_key(),
            "payload": params,
            "signature": hex::encode(signature.to_bytes()),
        }))
    }
}

#[async_trait]
impl ChainClient for JsonRpcChainClient {
    async fn connect(&self) -> Result<(), MeshgraphError> {
        let _: serde_json::Value = self.call("system/health", json!({})).await?;
        self.connected.store(true, Ordering::SeqCst);
        tracing::debug!("Connected to chain at {}", self.endpoint);
        Ok(())
    }

    async fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn current_block(&self) -> Result<u64, MeshgraphError> {
        self.call("chain/current_block", json!({})).await
    }

    async fn last_emission_data(&self) -> Result<Vec<(PublicKey, u64)>, MeshgraphError> {
        let emissions: Vec<Emission> = self.call("chain/last_emission_data", json!({})).await?;
        Ok(emissions.into_iter().map(|e| (e.hotkey, e.block)).collect())
    }

    async fn last_emission(&self, key: &PublicKey) -> Result<u64, MeshgraphError> {
        self.call("chain/last_emission", json!({ "hotkey": key })).await
    }

    async fn stake(&self, key: &PublicKey) -> Result<u64, MeshgraphError> {
        self.call("chain/stake", json!({ "hotkey": key })).await
    }

    async fn neuron_info(&self, key: &PublicKey) -> Result<Option<NeuronInfo>, MeshgraphError> {
        let wire: Option<WireNeuron> = self
            .call("chain/neuron_info", json!({ "hotkey": key }))
            .await?;
        wire.map(WireNeuron::into_info).transpose()
    }

    async fn weight_keys(&self, key: &PublicKey) -> Result<Vec<PublicKey>, MeshgraphError> {
        self.call("chain/weight_keys", json!({ "hotkey": key })).await
    }

    async fn weight_values(&self, key: &PublicKey) -> Result<Vec<u32>, MeshgraphError> {
        self.call("chain/weight_values", json!({ "hotkey": key })).await
    }

    async fn set_weights(
        &self,
        keys: Vec<PublicKey>,
        values: Vec<u32>,
        wait_for_inclusion: bool,
    ) -> Result<(), MeshgraphError> {
        let params = self.signed(json!({
            "dests": keys,
            "values": values,
            "wait_for_inclusion": wait_for_inclusion,
        }))?;
        let _: serde_json::Value = self
            .call("chain/set_weights", params)
            .await
            .map_err(|e| MeshgraphError::Submission(e.to_string()))?;
        Ok(())
    }

    async fn subscribe(&self, address: IpAddr, port: u16) -> Result<(), MeshgraphError> {
        let info = NeuronInfo {
            address,
            port,
            version: env!("CARGO_PKG_VERSION").to_string(),
        };
        let params = self.signed(json!({ "neuron": WireNeuron::from_info(&info) }))?;
        let _: serde_json::Value = self.call("chain/subscribe", params).await?;
        Ok(())
    }

    async fn unsubscribe(&self, timeout: Duration) -> Result<(), MeshgraphError> {
        let params = self.signed(json!({ "timeout_ms": timeout.as_millis() as u64 }))?;
        let _: serde_json::Value = self.call("chain/unsubscribe", params).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::{Signature, Verifier};

    fn client() -> JsonRpcChainClient {
        JsonRpcChainClient::new(
            "http://127.0.0.1:1/rpc",
            Keypair::generate(),
            Duration::from_secs(1),
        )
        .unwrap()
    }

    #[test]
    fn successful_envelope_yields_typed_result() {
        let resp: JsonRpcResponse =
            serde_json::from_str(r#"{"success": true, "result": 4242, "error": null}"#).unwrap();
        let block: u64 = resp.into_result().unwrap();
        assert_eq!(block, 4242);
    }

    #[test]
    fn failed_envelope_is_transport_error() {
        let resp: JsonRpcResponse =
            serde_json::from_str(r#"{"success": false, "result": null, "error": "unknown hotkey"}"#)
                .unwrap();
        let err = resp.into_result::<u64>().unwrap_err();
        assert!(matches!(err, MeshgraphError::Transport(ref m) if m == "unknown hotkey"));
    }

    #[test]
    fn missing_result_is_transport_error() {
        let resp = JsonRpcResponse {
            success: true,
            result: None,
            error: None,
        };
        assert!(matches!(
            resp.into_result::<u64>(),
            Err(MeshgraphError::Transport(_))
        ));
    }

    #[test]
    fn wrong_result_shape_is_serialization_error() {
        let resp = JsonRpcResponse {
            success: true,
            result: Some(json!("not a number")),
            error: None,
        };
        assert!(matches!(
            resp.into_result::<u64>(),
            Err(MeshgraphError::Serialization(_))
        ));
    }

    #[test]
    fn emission_list_parses_hex_keys() {
        let key = PublicKey::new(vec![0xab; 32]);
        let resp = JsonRpcResponse {
            success: true,
            result: Some(json!([{ "hotkey": key.to_hex(), "block": 77 }])),
            error: None,
        };
        let emissions: Vec<Emission> = resp.into_result().unwrap();
        assert_eq!(emissions[0].hotkey, key);
        assert_eq!(emissions[0].block, 77);
    }

    #[test]
    fn wire_neuron_uses_integer_ip() {
        let wire: WireNeuron =
            serde_json::from_value(json!({ "ip": "3468557829", "port": 8091, "version": "0.1.0" }))
                .unwrap();
        let info = wire.into_info().unwrap();
        assert_eq!(info.address, "206.189.254.5".parse::<IpAddr>().unwrap());
        assert_eq!(WireNeuron::from_info(&info).ip, "3468557829");

        let bad = WireNeuron {
            ip: "nope".to_string(),
            port: 1,
            version: String::new(),
        };
        assert!(matches!(bad.into_info(), Err(MeshgraphError::Serialization(_))));
    }

    #[test]
    fn signed_params_verify_against_hotkey() {
        let client = client();
        let payload = json!({ "dests": [], "values": [] });
        let signed = client.signed(payload.clone()).unwrap();

        assert_eq!(signed["hotkey"], json!(client.keypair.public_key().to_hex()));
        let sig_bytes: [u8; 64] = hex::decode(signed["signature"].as_str().unwrap())
            .unwrap()
            .try_into()
            .unwrap();
        let message = serde_json::to_vec(&payload).unwrap();
        assert!(client
            .keypair
            .verifying_key
            .verify(&message, &Signature::from_bytes(&sig_bytes))
            .is_ok());
    }

    #[tokio::test]
    async fn unreachable_endpoint_reports_transport_error() {
        let client = client();
        assert!(!client.is_connected().await);
        assert!(matches!(
            client.connect().await,
            Err(MeshgraphError::Transport(_))
        ));
        assert!(!client.is_connected().await);
    }
}
