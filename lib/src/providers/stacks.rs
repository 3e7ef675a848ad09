//! STX token transfer payments.

use crate::config::Config;
use crate::constants::STX_ASSET;
use crate::error::{Result, Stx402Error};
use crate::http::Transport;
use crate::network::StacksNetwork;
use crate::payment_provider::{DryRunInfo, PaymentProvider};
use crate::signer::StacksSigner;
use crate::stacks::{Memo, NodeClient, Principal, TokenTransfer};
use crate::utils::unix_millis;
use crate::x402::{AssetKind, PaymentOption, PaymentPayload, PaymentRequired};
use async_trait::async_trait;
use std::sync::Arc;

/// Pays by signing an STX transfer to the option's address.
///
/// Nonce and fee come from the node unless the config pins them.
pub struct StacksProvider {
    signer: Arc<StacksSigner>,
    config: Config,
    node: NodeClient,
}

impl StacksProvider {
    pub fn new(signer: Arc<StacksSigner>, config: Config, transport: Arc<dyn Transport>) -> Self {
        let node = NodeClient::new(config.node_url(), transport).timeout(config.timeout());
        Self {
            signer,
            config,
            node,
        }
    }

    pub fn network(&self) -> StacksNetwork {
        self.config.network
    }

    /// The network to pay on; an option naming another chain is refused.
    fn check_network(&self, option: &PaymentOption) -> Result<()> {
        let Some(requested) = option.network() else {
            return Ok(());
        };
        match requested.parse::<StacksNetwork>() {
            Ok(network) if network == self.config.network => Ok(()),
            Ok(network) => Err(Stx402Error::construction(format!(
                "the server asks for payment on {network} but the client is configured for {}",
                self.config.network
            ))),
            Err(_) => Err(Stx402Error::construction(format!(
                "unsupported payment network '{requested}'"
            ))),
        }
    }

    fn recipient(&self, option: &PaymentOption) -> Result<Principal> {
        match option.address() {
            Some(address) => address.parse().map_err(|e| {
                Stx402Error::construction(format!("invalid recipient '{address}': {e}"))
            }),
            None => {
                let fallback = self.config.fallback_recipient()?;
                tracing::debug!(recipient = %fallback, "option has no address, using fallback recipient");
                Ok(fallback)
            }
        }
    }

    fn amount(&self, option: &PaymentOption) -> Result<u64> {
        if let AssetKind::Other(asset) = option.asset_kind() {
            return Err(Stx402Error::construction(format!(
                "asset '{asset}' is not supported, only native {STX_ASSET} transfers can be paid"
            )));
        }
        option
            .amount()
            .and_then(|amount| amount.try_as_u64())
            .map_err(|e| Stx402Error::construction(e.to_string()))
    }

    async fn nonce(&self) -> Result<u64> {
        if let Some(nonce) = self.config.nonce {
            return Ok(nonce);
        }
        let sender = self.signer.address(self.config.network);
        self.node
            .account_nonce(&sender)
            .await
            .map_err(|e| lookup_error("nonce", e))
    }

    async fn fee(&self, tx_len: usize) -> Result<u64> {
        if let Some(fee) = self.config.fee {
            return Ok(fee);
        }
        self.node
            .estimate_fee(tx_len)
            .await
            .map_err(|e| lookup_error("fee", e))
    }
}

/// Timeouts keep their own kind; anything else means the transfer could not be built.
fn lookup_error(what: &str, e: Stx402Error) -> Stx402Error {
    if e.is_timeout() {
        e
    } else {
        Stx402Error::construction(format!("could not look up {what}: {e}"))
    }
}

#[async_trait]
impl PaymentProvider for StacksProvider {
    fn name(&self) -> &str {
        "Stacks"
    }

    fn supports_network(&self, network: &str) -> bool {
        network.parse::<StacksNetwork>().is_ok()
    }

    async fn create_payment(
        &self,
        requirements: &PaymentRequired,
        option: &PaymentOption,
    ) -> Result<PaymentPayload> {
        self.check_network(option)?;
        let recipient = self.recipient(option)?;
        let amount = self.amount(option)?;
        let memo = Memo::for_payment(unix_millis()?);

        let nonce = self.nonce().await?;
        let mut tx = TokenTransfer::new(recipient, amount)
            .network(self.config.network)
            .memo(memo)
            .nonce(nonce)
            .build(&self.signer);
        let fee = self.fee(tx.serialize().len()).await?;
        tx.set_fee(fee);
        tx.sign(&self.signer)?;

        tracing::info!(
            txid = %tx.txid(),
            amount,
            fee,
            nonce,
            recipient = %tx.recipient(),
            memo = tx.memo().as_str(),
            "signed STX transfer"
        );
        tracing::trace!(transaction = %tx.to_hex(), "serialized transfer");

        Ok(PaymentPayload::new(
            requirements.resource.clone(),
            option.clone(),
            tx.to_hex(),
        ))
    }

    fn dry_run(&self, option: &PaymentOption) -> Result<DryRunInfo> {
        self.check_network(option)?;
        let recipient = self.recipient(option)?;
        let amount = self.amount(option)?;
        Ok(DryRunInfo {
            provider: self.name().to_string(),
            network: self.config.network.to_string(),
            amount: amount.to_string(),
            asset: STX_ASSET.to_string(),
            from: self.signer.address(self.config.network).to_string(),
            to: recipient.to_string(),
            memo: Memo::for_payment(unix_millis()?).as_str().to_string(),
        })
    }
}
