//! Next-hop addressing.
//!
//! Every layer starts with the address of the hop the peeling relay must
//! forward to, written as a zero-padded decimal string of exactly
//! [`ADDRESS_WIDTH`] characters. Fixed width lets a relay slice the prefix
//! off without a delimiter; this module is the only place that does so.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Width of the encoded next-hop address, identical at every layer.
pub const ADDRESS_WIDTH: usize = 10;

/// Network address of a relay or user (its listening port).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(u32);

impl Address {
    /// Wrap a raw port/identifier
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// The raw port/identifier
    pub const fn value(&self) -> u32 {
        self.0
    }

    /// Fixed-width wire form, e.g. `0000004001`
    pub fn encode(&self) -> String {
        format!("{:0width$}", self.0, width = ADDRESS_WIDTH)
    }

    /// Split a decrypted layer into its address prefix and the remainder.
    pub fn split_prefix(payload: &str) -> Result<(Address, &str)> {
        let prefix = payload.get(..ADDRESS_WIDTH).ok_or_else(|| {
            Error::InvalidAddress(format!(
                "Layer is shorter than the {}-character address prefix",
                ADDRESS_WIDTH
            ))
        })?;

        if !prefix.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::InvalidAddress(format!(
                "Address prefix {:?} is not decimal",
                prefix
            )));
        }

        let value: u32 = prefix
            .parse()
            .map_err(|_| Error::InvalidAddress(format!("Address {} is out of range", prefix)))?;

        Ok((Address(value), &payload[ADDRESS_WIDTH..]))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Port layout of an overlay: where relays and users listen.
///
/// Relay `n` listens on `base_relay_port + n`, user `u` on
/// `base_user_port + u`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressPlan {
    /// Port offset for relay nodes
    pub base_relay_port: u32,
    /// Port offset for users
    pub base_user_port: u32,
}

impl AddressPlan {
    /// Address of relay `node_id`
    pub fn relay_address(&self, node_id: u32) -> Result<Address> {
        offset(self.base_relay_port, node_id, "relay")
    }

    /// Address of user `user_id`
    pub fn user_address(&self, user_id: u32) -> Result<Address> {
        offset(self.base_user_port, user_id, "user")
    }
}

fn offset(base: u32, id: u32, role: &str) -> Result<Address> {
    base.checked_add(id).map(Address).ok_or_else(|| {
        Error::InvalidAddress(format!("{} {} is out of range for base port {}", role, id, base))
    })
}

impl Default for AddressPlan {
    fn default() -> Self {
        Self {
            base_relay_port: 4000,
            base_user_port: 3000,
        }
    }
}
