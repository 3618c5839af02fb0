//! Event decoder
//!
//! Turns a parsed print event tuple into a [`DomainEvent`], keeping only the
//! fields the reconciliation engine reads.

use std::sync::Arc;

use thiserror::Error;
use tracing::trace;

use super::{DomainEvent, EventKind, UNBOUNDED_CYCLE};
use crate::address::{AddressCodec, AddressError, BitcoinNetwork};
use crate::clarity::{parse_event_repr, MalformedValueError, StructuredValue, Tuple};

/// A recognized event with a missing or mistyped field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedEventError {
    #[error("{kind}: missing field `{field}`")]
    MissingField { kind: EventKind, field: &'static str },

    #[error("{kind}: field `{field}` should be {expected}, found {found}")]
    WrongType {
        kind: EventKind,
        field: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    #[error("{kind}: cycle `{field}` out of range: {value}")]
    CycleOutOfRange {
        kind: EventKind,
        field: &'static str,
        value: u128,
    },

    #[error("{kind}: invalid reward address: {source}")]
    RewardAddress {
        kind: EventKind,
        #[source]
        source: AddressError,
    },
}

/// Either stage of decoding a raw event failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("malformed value: {0}")]
    Value(#[from] MalformedValueError),

    #[error("malformed event: {0}")]
    Event(#[from] MalformedEventError),
}

/// How the pool operator filter is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    /// Substring match on the raw text before parsing. Cheap, but accepts an
    /// event that mentions the operator in an unrelated field.
    #[default]
    Prefilter,
    /// Parse first, then require the operator to be the principal acting for
    /// the pool (`delegate-to`, `delegator`, or the committing sender).
    Strict,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The event belongs to another pool.
    ForeignPool,
    /// Not one of the pool-relevant event names.
    Unrecognized(Option<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    Event(DomainEvent),
    Skip(SkipReason),
}

/// Decodes print events for one pool operator.
pub struct EventDecoder {
    pool_operator: String,
    network: BitcoinNetwork,
    match_mode: MatchMode,
    codec: Arc<dyn AddressCodec>,
}

impl EventDecoder {
    pub fn new(
        pool_operator: impl Into<String>,
        network: BitcoinNetwork,
        codec: Arc<dyn AddressCodec>,
    ) -> Self {
        Self {
            pool_operator: pool_operator.into(),
            network,
            match_mode: MatchMode::default(),
            codec,
        }
    }

    pub fn with_match_mode(mut self, match_mode: MatchMode) -> Self {
        self.match_mode = match_mode;
        self
    }

    pub fn pool_operator(&self) -> &str {
        &self.pool_operator
    }

    /// Decode the `repr` text of one print event.
    pub fn decode_repr(&self, repr: &str) -> Result<Decoded, DecodeError> {
        if self.match_mode == MatchMode::Prefilter && !repr.contains(&self.pool_operator) {
            return Ok(Decoded::Skip(SkipReason::ForeignPool));
        }
        let payload = parse_event_repr(repr)?;
        Ok(self.decode_tuple(&payload)?)
    }

    /// Decode an already parsed payload. Anything but a tuple is unrecognized.
    pub fn decode(&self, value: &StructuredValue) -> Result<Decoded, MalformedEventError> {
        match value.as_tuple() {
            Some(tuple) => self.decode_tuple(tuple),
            None => Ok(Decoded::Skip(SkipReason::Unrecognized(None))),
        }
    }

    pub fn decode_tuple(&self, payload: &Tuple) -> Result<Decoded, MalformedEventError> {
        let name = payload.get("name").and_then(|v| v.as_text());
        let Some(kind) = name.and_then(EventKind::from_name) else {
            trace!(name = ?name, "Ignoring unrecognized event");
            return Ok(Decoded::Skip(SkipReason::Unrecognized(name.map(str::to_string))));
        };

        let top = Fields::new(kind, payload);
        let data = top.tuple("data")?;

        if self.match_mode == MatchMode::Strict && !self.is_pool_event(kind, &top, &data) {
            return Ok(Decoded::Skip(SkipReason::ForeignPool));
        }

        let event = match kind {
            EventKind::DelegateStx => DomainEvent::DelegateStx {
                stacker: top.text("stacker")?,
                start_cycle: data.cycle("start-cycle-id")?,
                end_cycle: data.optional_cycle("end-cycle-id")?.unwrap_or(UNBOUNDED_CYCLE),
                amount_ustx: data.uint("amount-ustx")?,
                reward_address: self.reward_address(&data)?,
            },
            EventKind::RevokeDelegateStx => DomainEvent::RevokeDelegateStx {
                stacker: top.text("stacker")?,
            },
            EventKind::DelegateStackStx => DomainEvent::DelegateStackStx {
                stacker: data.text("stacker")?,
                start_cycle: data.cycle("start-cycle-id")?,
                end_cycle: data.cycle("end-cycle-id")?,
                amount_ustx: data.uint("lock-amount")?,
                reward_address: self.reward_address(&data)?,
            },
            EventKind::DelegateStackExtend => DomainEvent::DelegateStackExtend {
                stacker: data.text("stacker")?,
                start_cycle: data.cycle("start-cycle-id")?,
                end_cycle: data.cycle("end-cycle-id")?,
                reward_address: self.reward_address(&data)?,
            },
            EventKind::DelegateStackIncrease => DomainEvent::DelegateStackIncrease {
                stacker: data.text("stacker")?,
                start_cycle: data.cycle("start-cycle-id")?,
                end_cycle: data.cycle("end-cycle-id")?,
                increase_by: data.uint("increase-by")?,
                total_locked: data.uint("total-locked")?,
                reward_address: self.reward_address(&data)?,
            },
            EventKind::StackAggregationCommit => DomainEvent::StackAggregationCommit {
                cycle: data.cycle("reward-cycle")?,
                amount_ustx: data.uint("amount-ustx")?,
                reward_address: self.reward_address(&data)?,
            },
            EventKind::StackAggregationIncrease => DomainEvent::StackAggregationIncrease {
                cycle: data.cycle("reward-cycle")?,
                amount_ustx: data.uint("amount-ustx")?,
                reward_cycle_index: data.optional_uint("reward-cycle-index")?,
                reward_address: self.reward_address(&data)?,
            },
        };

        Ok(Decoded::Event(event))
    }

    /// Whether the principal acting for the pool in this event is the
    /// configured operator, or a contract deployed by it.
    fn is_pool_event(&self, kind: EventKind, top: &Fields<'_>, data: &Fields<'_>) -> bool {
        let candidates = match kind {
            EventKind::DelegateStx | EventKind::RevokeDelegateStx => {
                vec![data.optional_value("delegate-to")]
            }
            EventKind::DelegateStackStx
            | EventKind::DelegateStackExtend
            | EventKind::DelegateStackIncrease => vec![data.optional_value("delegator")],
            EventKind::StackAggregationCommit | EventKind::StackAggregationIncrease => {
                vec![top.optional_value("stacker"), data.optional_value("sender")]
            }
        };

        candidates
            .into_iter()
            .flatten()
            .filter_map(|v| v.as_text())
            .any(|principal| {
                principal == self.pool_operator
                    || principal
                        .strip_prefix(self.pool_operator.as_str())
                        .is_some_and(|rest| rest.starts_with('.'))
            })
    }

    /// `pox-addr` as a display address; `none` or a missing field is `None`.
    fn reward_address(&self, data: &Fields<'_>) -> Result<Option<String>, MalformedEventError> {
        let Some(pox_addr) = data.optional_tuple("pox-addr")? else {
            return Ok(None);
        };
        let version = pox_addr.buffer("version")?;
        let [version] = version else {
            return Err(MalformedEventError::WrongType {
                kind: data.kind,
                field: "version",
                expected: "1-byte buffer",
                found: "buffer",
            });
        };
        let hash_bytes = pox_addr.buffer("hashbytes")?;

        self.codec
            .encode(*version, hash_bytes, self.network)
            .map(Some)
            .map_err(|source| MalformedEventError::RewardAddress {
                kind: data.kind,
                source,
            })
    }
}

/// Typed field access on one tuple of an event payload.
struct Fields<'a> {
    kind: EventKind,
    tuple: &'a Tuple,
}

impl<'a> Fields<'a> {
    fn new(kind: EventKind, tuple: &'a Tuple) -> Self {
        Self { kind, tuple }
    }

    fn missing(&self, field: &'static str) -> MalformedEventError {
        MalformedEventError::MissingField {
            kind: self.kind,
            field,
        }
    }

    fn wrong_type(
        &self,
        field: &'static str,
        expected: &'static str,
        found: &StructuredValue,
    ) -> MalformedEventError {
        MalformedEventError::WrongType {
            kind: self.kind,
            field,
            expected,
            found: found.kind(),
        }
    }

    /// Present and not `none`.
    fn value(&self, field: &'static str) -> Result<&'a StructuredValue, MalformedEventError> {
        self.tuple
            .get(field)
            .and_then(|v| v.unwrap_optional())
            .ok_or_else(|| self.missing(field))
    }

    fn optional_value(&self, field: &'static str) -> Option<&'a StructuredValue> {
        self.tuple.get(field).and_then(|v| v.unwrap_optional())
    }

    fn text(&self, field: &'static str) -> Result<String, MalformedEventError> {
        let value = self.value(field)?;
        value
            .as_text()
            .map(str::to_string)
            .ok_or_else(|| self.wrong_type(field, "text", value))
    }

    fn uint(&self, field: &'static str) -> Result<u128, MalformedEventError> {
        let value = self.value(field)?;
        value.as_uint().ok_or_else(|| self.wrong_type(field, "uint", value))
    }

    fn optional_uint(&self, field: &'static str) -> Result<Option<u128>, MalformedEventError> {
        match self.optional_value(field) {
            None => Ok(None),
            Some(value) => value
                .as_uint()
                .map(Some)
                .ok_or_else(|| self.wrong_type(field, "uint", value)),
        }
    }

    fn cycle(&self, field: &'static str) -> Result<u64, MalformedEventError> {
        let value = self.uint(field)?;
        self.to_cycle(field, value)
    }

    fn optional_cycle(&self, field: &'static str) -> Result<Option<u64>, MalformedEventError> {
        self.optional_uint(field)?
            .map(|value| self.to_cycle(field, value))
            .transpose()
    }

    fn to_cycle(&self, field: &'static str, value: u128) -> Result<u64, MalformedEventError> {
        u64::try_from(value).map_err(|_| MalformedEventError::CycleOutOfRange {
            kind: self.kind,
            field,
            value,
        })
    }

    fn buffer(&self, field: &'static str) -> Result<&'a [u8], MalformedEventError> {
        let value = self.value(field)?;
        value.as_buffer().ok_or_else(|| self.wrong_type(field, "buffer", value))
    }

    fn tuple(&self, field: &'static str) -> Result<Fields<'a>, MalformedEventError> {
        let value = self.value(field)?;
        value
            .as_tuple()
            .map(|tuple| Fields::new(self.kind, tuple))
            .ok_or_else(|| self.wrong_type(field, "tuple", value))
    }

    fn optional_tuple(&self, field: &'static str) -> Result<Option<Fields<'a>>, MalformedEventError> {
        match self.optional_value(field) {
            None => Ok(None),
            Some(value) => value
                .as_tuple()
                .map(|tuple| Some(Fields::new(self.kind, tuple)))
                .ok_or_else(|| self.wrong_type(field, "tuple", value)),
        }
    }
}
