//! A `serde`-derived JSON snapshot format used only by the demo CLI binary
//! and integration tests, standing in for the real core-dump parsing this
//! subsystem treats as an external collaborator (`spec.md` §1 "Out of
//! scope", §6 "Consumed interfaces"). Not a production input format.

use serde::Deserialize;

use crate::address_map::SparseAddressMap;
use crate::allocation::Allocation;
use crate::finder::SortedFinder;
use crate::offset::{ByteOrder, Offset, Width};
use crate::roots::{FixedRoots, RootDescriptor, RootPointer};
use crate::signature::SignatureDirectory;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FixtureWidth {
    Bits32,
    Bits64,
}

impl From<FixtureWidth> for Width {
    fn from(value: FixtureWidth) -> Self {
        match value {
            FixtureWidth::Bits32 => Width::Bits32,
            FixtureWidth::Bits64 => Width::Bits64,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FixtureOrder {
    Little,
    Big,
}

impl From<FixtureOrder> for ByteOrder {
    fn from(value: FixtureOrder) -> Self {
        match value {
            FixtureOrder::Little => ByteOrder::Little,
            FixtureOrder::Big => ByteOrder::Big,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct FixtureAllocation {
    pub address: String,
    pub size: String,
    pub used: bool,
    /// Hex-encoded raw bytes backing this allocation, if the fixture wants
    /// `reach`/`chain`/`explain` to see pointer contents. Omitted entirely
    /// means "unmapped", per C1's `(bytes, length)` contract.
    #[serde(default)]
    pub bytes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FixtureSignature {
    pub signature: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct FixtureStaticRoot {
    pub static_address: String,
    pub target: String,
}

#[derive(Debug, Deserialize)]
pub struct FixtureStackRoot {
    pub thread_id: u64,
    pub address: String,
    pub target: String,
}

#[derive(Debug, Deserialize)]
pub struct FixtureRegisterRoot {
    pub thread_id: u64,
    pub register: String,
    pub target: String,
}

#[derive(Debug, Deserialize)]
pub struct SnapshotFixture {
    pub width: FixtureWidth,
    pub order: FixtureOrder,
    pub allocations: Vec<FixtureAllocation>,
    #[serde(default)]
    pub signatures: Vec<FixtureSignature>,
    #[serde(default)]
    pub static_roots: Vec<FixtureStaticRoot>,
    #[serde(default)]
    pub stack_roots: Vec<FixtureStackRoot>,
    #[serde(default)]
    pub register_roots: Vec<FixtureRegisterRoot>,
}

/// Everything `load` produces, ready to hand to `Session::new`.
pub struct LoadedFixture {
    pub finder: SortedFinder,
    pub address_map: SparseAddressMap,
    pub signatures: SignatureDirectory,
    pub roots: FixedRoots,
    pub width: Width,
    pub order: ByteOrder,
}

#[derive(Debug, thiserror::Error)]
pub enum FixtureError {
    #[error("\"{0}\" is not a valid hex token in the fixture")]
    InvalidHex(String),
    #[error("allocation addresses in the fixture are not strictly increasing")]
    UnsortedAllocations,
    #[error("{0} is odd-length hex and cannot be decoded as bytes")]
    OddLengthBytes(String),
}

fn parse_offset(token: &str, width: Width) -> Result<Offset, FixtureError> {
    Offset::parse_hex(token, width).ok_or_else(|| FixtureError::InvalidHex(token.to_string()))
}

fn parse_bytes(token: &str) -> Result<Vec<u8>, FixtureError> {
    let trimmed = token.strip_prefix("0x").unwrap_or(token);
    if trimmed.len() % 2 != 0 {
        return Err(FixtureError::OddLengthBytes(token.to_string()));
    }
    (0..trimmed.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&trimmed[i..i + 2], 16)
                .map_err(|_| FixtureError::InvalidHex(token.to_string()))
        })
        .collect()
}

impl SnapshotFixture {
    pub fn load(self) -> Result<LoadedFixture, FixtureError> {
        let width: Width = self.width.into();
        let order: ByteOrder = self.order.into();

        let mut allocations = Vec::with_capacity(self.allocations.len());
        let mut address_map = SparseAddressMap::new();
        for entry in &self.allocations {
            let address = parse_offset(&entry.address, width)?;
            let size = parse_offset(&entry.size, width)?;
            allocations.push(Allocation::new(address, size, entry.used));
            if let Some(hex) = &entry.bytes {
                address_map.insert(address, parse_bytes(hex)?);
            }
        }
        let finder = SortedFinder::new(allocations).ok_or(FixtureError::UnsortedAllocations)?;

        let mut signatures = SignatureDirectory::new();
        for entry in &self.signatures {
            let signature = parse_offset(&entry.signature, width)?;
            signatures.register(signature, entry.name.clone());
        }

        let mut roots = FixedRoots::default();
        for entry in &self.static_roots {
            roots.static_roots.push(RootPointer {
                descriptor: RootDescriptor::Static(parse_offset(&entry.static_address, width)?),
                addr: parse_offset(&entry.target, width)?,
            });
        }
        for entry in &self.stack_roots {
            roots.stack_roots.push(RootPointer {
                descriptor: RootDescriptor::Stack {
                    thread_id: entry.thread_id,
                    address: parse_offset(&entry.address, width)?,
                },
                addr: parse_offset(&entry.target, width)?,
            });
        }
        for entry in &self.register_roots {
            roots.register_roots.push(RootPointer {
                descriptor: RootDescriptor::Register {
                    thread_id: entry.thread_id,
                    register: entry.register.clone(),
                },
                addr: parse_offset(&entry.target, width)?,
            });
        }

        Ok(LoadedFixture {
            finder,
            address_map,
            signatures,
            roots,
            width,
            order,
        })
    }
}
