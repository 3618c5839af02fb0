//! Reward address encoding
//!
//! PoX reward addresses are carried on chain as a `(version, hashbytes)`
//! pair. The version byte selects the Bitcoin output type:
//!
//! | version | output        | encoding                |
//! |---------|---------------|-------------------------|
//! | 0x00    | P2PKH         | base58check             |
//! | 0x01    | P2SH          | base58check             |
//! | 0x02    | P2SH-P2WPKH   | base58check             |
//! | 0x03    | P2SH-P2WSH    | base58check             |
//! | 0x04    | P2WPKH        | bech32, witness v0      |
//! | 0x05    | P2WSH         | bech32, witness v0      |
//! | 0x06    | P2TR          | bech32m, witness v1     |

use bech32::Hrp;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Bitcoin network the reward addresses are rendered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BitcoinNetwork {
    Mainnet,
    Testnet,
}

impl BitcoinNetwork {
    fn p2pkh_version(self) -> u8 {
        match self {
            BitcoinNetwork::Mainnet => 0x00,
            BitcoinNetwork::Testnet => 0x6f,
        }
    }

    fn p2sh_version(self) -> u8 {
        match self {
            BitcoinNetwork::Mainnet => 0x05,
            BitcoinNetwork::Testnet => 0xc4,
        }
    }

    fn hrp(self) -> Hrp {
        match self {
            BitcoinNetwork::Mainnet => bech32::hrp::BC,
            BitcoinNetwork::Testnet => bech32::hrp::TB,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("unknown reward address version 0x{0:02x}")]
    UnknownVersion(u8),

    #[error("{version:?} hash must be {expected} bytes, got {actual}")]
    InvalidHashLength {
        version: PoxAddressVersion,
        expected: usize,
        actual: usize,
    },

    #[error("segwit encoding failed: {0}")]
    Segwit(String),
}

/// Output type selected by the version byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoxAddressVersion {
    P2pkh,
    P2sh,
    P2shP2wpkh,
    P2shP2wsh,
    P2wpkh,
    P2wsh,
    P2tr,
}

impl PoxAddressVersion {
    fn hash_len(self) -> usize {
        match self {
            PoxAddressVersion::P2pkh
            | PoxAddressVersion::P2sh
            | PoxAddressVersion::P2shP2wpkh
            | PoxAddressVersion::P2shP2wsh
            | PoxAddressVersion::P2wpkh => 20,
            PoxAddressVersion::P2wsh | PoxAddressVersion::P2tr => 32,
        }
    }
}

impl TryFrom<u8> for PoxAddressVersion {
    type Error = AddressError;

    fn try_from(version: u8) -> Result<Self, Self::Error> {
        match version {
            0x00 => Ok(PoxAddressVersion::P2pkh),
            0x01 => Ok(PoxAddressVersion::P2sh),
            0x02 => Ok(PoxAddressVersion::P2shP2wpkh),
            0x03 => Ok(PoxAddressVersion::P2shP2wsh),
            0x04 => Ok(PoxAddressVersion::P2wpkh),
            0x05 => Ok(PoxAddressVersion::P2wsh),
            0x06 => Ok(PoxAddressVersion::P2tr),
            other => Err(AddressError::UnknownVersion(other)),
        }
    }
}

/// Converts an on-chain reward address into its display form.
pub trait AddressCodec: Send + Sync {
    fn encode(
        &self,
        version: u8,
        hash_bytes: &[u8],
        network: BitcoinNetwork,
    ) -> Result<String, AddressError>;
}

/// Renders reward addresses as Bitcoin addresses.
#[derive(Debug, Clone, Copy, Default)]
pub struct BitcoinAddressCodec;

impl AddressCodec for BitcoinAddressCodec {
    fn encode(
        &self,
        version: u8,
        hash_bytes: &[u8],
        network: BitcoinNetwork,
    ) -> Result<String, AddressError> {
        let version = PoxAddressVersion::try_from(version)?;
        if hash_bytes.len() != version.hash_len() {
            return Err(AddressError::InvalidHashLength {
                version,
                expected: version.hash_len(),
                actual: hash_bytes.len(),
            });
        }

        match version {
            PoxAddressVersion::P2pkh => Ok(base58check(network.p2pkh_version(), hash_bytes)),
            PoxAddressVersion::P2sh
            | PoxAddressVersion::P2shP2wpkh
            | PoxAddressVersion::P2shP2wsh => Ok(base58check(network.p2sh_version(), hash_bytes)),
            PoxAddressVersion::P2wpkh | PoxAddressVersion::P2wsh => {
                bech32::segwit::encode_v0(network.hrp(), hash_bytes)
                    .map_err(|e| AddressError::Segwit(e.to_string()))
            }
            PoxAddressVersion::P2tr => bech32::segwit::encode_v1(network.hrp(), hash_bytes)
                .map_err(|e| AddressError::Segwit(e.to_string())),
        }
    }
}

fn base58check(version: u8, payload: &[u8]) -> String {
    bs58::encode(payload).with_check_version(version).into_string()
}
