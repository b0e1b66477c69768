//! The typed-data authorization a user signs to grant a time-boxed decryption.

use std::collections::BTreeMap;

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

pub const PRIMARY_TYPE: &str = "UserDecryptRequestVerification";
const DOMAIN_NAME: &str = "Decryption";
const DOMAIN_VERSION: &str = "1";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypedField {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
}

impl TypedField {
    fn new(name: &str, ty: &str) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainFields {
    pub name: String,
    pub version: String,
    pub chain_id: u64,
    pub verifying_contract: Address,
}

/// Values are rendered the way `eth_signTypedData_v4` expects: bytes as
/// `0x` hex, uint256 as decimal strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDecryptMessage {
    pub public_key: String,
    pub contract_addresses: Vec<Address>,
    pub start_timestamp: String,
    pub duration_days: String,
    pub extra_data: String,
}

/// A complete, signable EIP-712 payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypedDataPayload {
    pub types: BTreeMap<String, Vec<TypedField>>,
    pub primary_type: String,
    pub domain: DomainFields,
    pub message: UserDecryptMessage,
}

impl TypedDataPayload {
    pub fn new(
        gateway_chain_id: u64,
        verifying_contract: Address,
        public_key: &[u8],
        contract_addresses: &[Address],
        start_timestamp: u64,
        duration_days: u64,
    ) -> Self {
        let mut types = BTreeMap::new();
        types.insert(
            "EIP712Domain".to_string(),
            vec![
                TypedField::new("name", "string"),
                TypedField::new("version", "string"),
                TypedField::new("chainId", "uint256"),
                TypedField::new("verifyingContract", "address"),
            ],
        );
        types.insert(
            PRIMARY_TYPE.to_string(),
            vec![
                TypedField::new("publicKey", "bytes"),
                TypedField::new("contractAddresses", "address[]"),
                TypedField::new("startTimestamp", "uint256"),
                TypedField::new("durationDays", "uint256"),
                TypedField::new("extraData", "bytes"),
            ],
        );

        Self {
            types,
            primary_type: PRIMARY_TYPE.to_string(),
            domain: DomainFields {
                name: DOMAIN_NAME.to_string(),
                version: DOMAIN_VERSION.to_string(),
                chain_id: gateway_chain_id,
                verifying_contract,
            },
            message: UserDecryptMessage {
                public_key: format!("0x{}", hex::encode(public_key)),
                contract_addresses: contract_addresses.to_vec(),
                start_timestamp: start_timestamp.to_string(),
                duration_days: duration_days.to_string(),
                extra_data: "0x00".to_string(),
            },
        }
    }

    /// JSON form handed to the wallet.
    pub fn to_json(&self) -> serde_json::Value {
        // Every field is a plain string, number, or list of those.
        serde_json::to_value(self).unwrap_or_default()
    }
}
