use super::{GuardError, Result};
use alloy_primitives::{hex, Address, U256};
use alloy_sol_types::{sol, SolCall};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::str::FromStr;

sol! {
    function approve(address spender, uint256 amount) external returns (bool);
}

/// Transaction object handed to the wallet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionParams {
    pub from: String,
    pub to: String,
    pub data: String,
    pub value: String,
}

/// A signing action, serialised as the `reqParameters` array `[kind, ...args]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionRequest {
    /// Sign a hex-encoded message
    Signature { message: String },
    /// Sign and broadcast a transaction on the given chain
    Transaction {
        tx: TransactionParams,
        chain_id: u64,
    },
}

impl ActionRequest {
    /// Sign a plain-text message
    pub fn sign_message(text: &str) -> Self {
        Self::Signature {
            message: utf8_to_hex(text),
        }
    }

    /// Send `amount_wei` of the chain's native token from `from` to `to`
    pub fn native_transfer(from: &str, to: &str, amount_wei: U256, chain_id: u64) -> Result<Self> {
        parse_address(to)?;
        Ok(Self::Transaction {
            tx: TransactionParams {
                from: from.to_string(),
                to: to.to_string(),
                data: "0x".to_string(),
                value: quantity_hex(amount_wei),
            },
            chain_id,
        })
    }

    /// Call `approve(spender, amount)` on an ERC-20 contract
    pub fn approve(
        from: &str,
        contract: &str,
        spender: &str,
        amount: U256,
        chain_id: u64,
    ) -> Result<Self> {
        parse_address(contract)?;
        Ok(Self::Transaction {
            tx: TransactionParams {
                from: from.to_string(),
                to: contract.to_string(),
                data: encode_approve(spender, amount)?,
                value: quantity_hex(U256::ZERO),
            },
            chain_id,
        })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Signature { .. } => "signature",
            Self::Transaction { .. } => "transaction",
        }
    }

    /// Body value for `reqParameters`
    pub fn to_parameters(&self) -> serde_json::Value {
        match self {
            Self::Signature { message } => json!([self.kind(), message]),
            Self::Transaction { tx, chain_id } => json!([self.kind(), tx, chain_id]),
        }
    }
}

/// `0x`-prefixed lowercase hex of the UTF-8 bytes of `text`
pub fn utf8_to_hex(text: &str) -> String {
    hex::encode_prefixed(text.as_bytes())
}

/// JSON-RPC quantity encoding: `0x` + hex without leading zeros
pub fn quantity_hex(value: U256) -> String {
    format!("0x{:x}", value)
}

/// Parse a `0x`-prefixed 20-byte address; the checksum is not enforced
pub fn parse_address(address: &str) -> Result<Address> {
    if !address.starts_with("0x") {
        return Err(GuardError::InvalidAddress(address.to_string()));
    }
    Address::from_str(address).map_err(|_| GuardError::InvalidAddress(address.to_string()))
}

/// ABI-encode `approve(spender, amount)` calldata
pub fn encode_approve(spender: &str, amount: U256) -> Result<String> {
    let call = approveCall {
        spender: parse_address(spender)?,
        amount,
    };
    Ok(hex::encode_prefixed(call.abi_encode()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONTRACT: &str = "0x78867BbEeF44f2326bF8DDd1941a4439382EF2A7";
    const SPENDER: &str = "0x78867BbEeF44f2326bF8DDd1941a4439382EF2A8";

    #[test]
    fn test_utf8_to_hex() {
        assert_eq!(utf8_to_hex("Hi"), "0x4869");
        assert_eq!(utf8_to_hex(""), "0x");
    }

    #[test]
    fn test_quantity_hex() {
        assert_eq!(quantity_hex(U256::ZERO), "0x0");
        assert_eq!(
            quantity_hex(U256::from(10_000_000_000_000_000u64)),
            "0x2386f26fc10000"
        );
        // 20 tokens, above u64::MAX
        assert_eq!(
            quantity_hex(U256::from_str("20000000000000000000").unwrap()),
            "0x1158e460913d00000"
        );
    }

    #[test]
    fn test_parse_address() {
        assert!(parse_address(CONTRACT).is_ok());
        assert_eq!(
            parse_address("0x0000000000000000000000000000000000000000").unwrap(),
            Address::ZERO
        );
        assert!(matches!(
            parse_address("0xUSER"),
            Err(GuardError::InvalidAddress(_))
        ));
        assert!(parse_address("78867BbEeF44f2326bF8DDd1941a4439382EF2A7").is_err());
        assert!(parse_address("0x78867BbEeF44f2326bF8DDd1941a4439382EF2").is_err());
    }

    #[test]
    fn test_encode_approve() {
        let data = encode_approve(SPENDER, U256::from(100_000_000_000_000_000u64)).unwrap();
        assert_eq!(data.len(), 2 + 8 + 64 + 64);
        assert!(data.starts_with("0x095ea7b3"));
        assert_eq!(
            &data[10..74],
            "00000000000000000000000078867bbeef44f2326bf8ddd1941a4439382ef2a8"
        );
        assert_eq!(
            &data[74..],
            "000000000000000000000000000000000000000000000000016345785d8a0000"
        );
    }

    #[test]
    fn test_encode_approve_full_width_amount() {
        let data = encode_approve(SPENDER, U256::MAX).unwrap();
        assert_eq!(&data[74..], "f".repeat(64));
        assert_eq!(&data[2..10], hex::encode(approveCall::SELECTOR));
    }

    #[test]
    fn test_signature_parameters() {
        let req = ActionRequest::sign_message("Hi");
        assert_eq!(req.kind(), "signature");
        assert_eq!(req.to_parameters(), json!(["signature", "0x4869"]));
    }

    #[test]
    fn test_transfer_parameters() {
        let req = ActionRequest::native_transfer(
            "0xUSER",
            "0x0000000000000000000000000000000000000000",
            U256::from(10_000_000_000_000_000u64),
            97,
        )
        .unwrap();

        assert_eq!(
            req.to_parameters(),
            json!([
                "transaction",
                {
                    "from": "0xUSER",
                    "to": "0x0000000000000000000000000000000000000000",
                    "data": "0x",
                    "value": "0x2386f26fc10000"
                },
                97
            ])
        );
    }

    #[test]
    fn test_approve_rejects_bad_contract() {
        let err = ActionRequest::approve("0xUSER", "0x1234", SPENDER, U256::from(1), 97).unwrap_err();
        assert!(matches!(err, GuardError::InvalidAddress(a) if a == "0x1234"));
    }

    #[test]
    fn test_approve_targets_contract_with_zero_value() {
        let req = ActionRequest::approve(SPENDER, CONTRACT, SPENDER, U256::from(1), 97).unwrap();
        match req {
            ActionRequest::Transaction { tx, chain_id } => {
                assert_eq!(tx.to, CONTRACT);
                assert_eq!(tx.value, "0x0");
                assert_eq!(chain_id, 97);
            }
            other => panic!("unexpected request: {:?}", other),
        }
    }
}
