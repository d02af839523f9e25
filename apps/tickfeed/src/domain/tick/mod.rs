//! Tick Domain Types
//!
//! Core types for decoded market data: streaming modes, the market-segment
//! lookup table, and the tick record delivered to consumers. These types are
//! codec-agnostic and represent the canonical internal representation of a
//! tick; the binary wire layout lives in the feed codec.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// =============================================================================
// Instrument Tokens
// =============================================================================

/// Opaque identifier for a tradable instrument.
///
/// The low-order byte encodes the market segment (see [`Segment`]); the rest
/// is assigned by the exchange and carries no meaning for this client.
pub type InstrumentToken = u32;

/// Number of price levels per side in a full market-depth snapshot.
pub const DEPTH_LEVELS: usize = 5;

// =============================================================================
// Streaming Modes
// =============================================================================

/// Verbosity level of a tick subscription.
///
/// Modes are nested: `Full` is a superset of `Quote`, which is a superset of
/// `Ltp`. The ordering derives accordingly, so `Mode::Ltp < Mode::Full`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Last traded price only.
    Ltp,
    /// Price, OHLC, volume and aggregate quantities, without market depth.
    /// This is the feed's default for a bare subscribe.
    #[default]
    Quote,
    /// Everything in `Quote` plus open interest, timestamps, and five-level
    /// market depth.
    Full,
}

impl Mode {
    /// Wire name of the mode, as used in `mode` control frames.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ltp => "ltp",
            Self::Quote => "quote",
            Self::Full => "full",
        }
    }

    /// Parse a mode from its wire name, case-insensitively.
    ///
    /// Unknown names fall back to the default mode.
    #[must_use]
    pub fn from_str_case_insensitive(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "ltp" => Self::Ltp,
            "full" => Self::Full,
            _ => Self::Quote,
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Market Segments
// =============================================================================

/// Bitmask extracting the segment code from an instrument token.
const SEGMENT_MASK: u32 = 0xff;

/// Market segment encoded in an instrument token.
///
/// The segment determines the price-scaling divisor applied to raw integer
/// price fields and whether the instrument is tradable. Codes outside the
/// documented table are preserved as [`Segment::Other`] and behave like
/// equity segments (two decimal places, tradable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Segment {
    /// National Stock Exchange equities (code 1).
    Nse,
    /// NSE futures and options (code 2).
    Nfo,
    /// Currency derivatives (code 3).
    Cds,
    /// Bombay Stock Exchange equities (code 4).
    Bse,
    /// BSE futures and options (code 5).
    Bfo,
    /// BSE currency derivatives (code 6).
    BseCds,
    /// Multi Commodity Exchange (code 7).
    Mcx,
    /// MCX stock exchange (code 8).
    McxSx,
    /// Index pseudo-segment (code 9). Indices are not tradable.
    Indices,
    /// Segment code outside the documented table.
    Other(u8),
}

impl Segment {
    /// Classify the owning segment from an instrument token's low-order byte.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn from_token(token: InstrumentToken) -> Self {
        match (token & SEGMENT_MASK) as u8 {
            1 => Self::Nse,
            2 => Self::Nfo,
            3 => Self::Cds,
            4 => Self::Bse,
            5 => Self::Bfo,
            6 => Self::BseCds,
            7 => Self::Mcx,
            8 => Self::McxSx,
            9 => Self::Indices,
            code => Self::Other(code),
        }
    }

    /// The raw segment code.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Nse => 1,
            Self::Nfo => 2,
            Self::Cds => 3,
            Self::Bse => 4,
            Self::Bfo => 5,
            Self::BseCds => 6,
            Self::Mcx => 7,
            Self::McxSx => 8,
            Self::Indices => 9,
            Self::Other(code) => code,
        }
    }

    /// Decimal places of the segment's price fields.
    ///
    /// Raw prices arrive as integers scaled by `10^price_scale`: currency
    /// derivatives use seven places, BSE currency derivatives four, and
    /// every other segment two (paise).
    #[must_use]
    pub const fn price_scale(self) -> u32 {
        match self {
            Self::Cds => 7,
            Self::BseCds => 4,
            _ => 2,
        }
    }

    /// Whether tokens in this segment are index pseudo-instruments.
    #[must_use]
    pub const fn is_index(self) -> bool {
        matches!(self, Self::Indices)
    }

    /// Whether instruments in this segment can be traded.
    #[must_use]
    pub const fn is_tradable(self) -> bool {
        !self.is_index()
    }

    /// Convert a raw integer price field into a decimal price.
    #[must_use]
    pub fn scale_price(self, raw: u32) -> Decimal {
        Decimal::new(i64::from(raw), self.price_scale())
    }
}

// =============================================================================
// Tick Records
// =============================================================================

/// Open, high, low, and close prices for the trading day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ohlc {
    /// Opening price.
    pub open: Decimal,
    /// Day high.
    pub high: Decimal,
    /// Day low.
    pub low: Decimal,
    /// Previous close.
    pub close: Decimal,
}

impl Ohlc {
    /// Percentage change of `last_price` against the close.
    ///
    /// Zero when the close is zero, matching the feed's convention for
    /// instruments without a prior close.
    #[must_use]
    pub fn percent_change_from(&self, last_price: Decimal) -> Decimal {
        if self.close.is_zero() {
            Decimal::ZERO
        } else {
            (last_price - self.close) * Decimal::ONE_HUNDRED / self.close
        }
    }
}

/// One price level on one side of the order book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepthLevel {
    /// Quantity available at this level.
    pub quantity: u32,
    /// Price of this level.
    pub price: Decimal,
    /// Number of resting orders at this level.
    pub orders: u16,
}

/// Best five bid and ask levels of the order book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketDepth {
    /// Bid levels, best first.
    pub buy: [DepthLevel; DEPTH_LEVELS],
    /// Ask levels, best first.
    pub sell: [DepthLevel; DEPTH_LEVELS],
}

/// Decoded snapshot of one instrument at one point in time.
///
/// Which optional fields are populated depends on the packet layout the tick
/// was decoded from: LTP packets carry only the last price, quote packets add
/// OHLC/volume aggregates, and full packets add open interest, timestamps,
/// and market depth. Index instruments stream a reduced layout without
/// volume or depth. A record is immutable once produced; ownership passes to
/// the consumer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickRecord {
    /// Instrument this tick belongs to.
    pub token: InstrumentToken,
    /// Verbosity the packet was decoded at.
    pub mode: Mode,
    /// Whether the instrument is tradable (false for indices).
    pub tradable: bool,
    /// Last traded price (or index value).
    pub last_price: Decimal,
    /// Quantity of the last trade.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_traded_quantity: Option<u32>,
    /// Volume-weighted average traded price.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_traded_price: Option<Decimal>,
    /// Total volume traded today.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume_traded: Option<u32>,
    /// Total pending buy quantity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_buy_quantity: Option<u32>,
    /// Total pending sell quantity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_sell_quantity: Option<u32>,
    /// Day OHLC.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ohlc: Option<Ohlc>,
    /// Percentage change against the close.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change: Option<Decimal>,
    /// Time of the last trade, exchange clock.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_trade_time: Option<DateTime<Utc>>,
    /// Open interest.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oi: Option<u32>,
    /// Day-high open interest.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oi_day_high: Option<u32>,
    /// Day-low open interest.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oi_day_low: Option<u32>,
    /// Exchange timestamp of the tick.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exchange_timestamp: Option<DateTime<Utc>>,
    /// Five-level market depth (full mode, non-index instruments only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depth: Option<MarketDepth>,
}

impl TickRecord {
    /// Create a record carrying only the mandatory fields; everything
    /// optional starts out absent.
    #[must_use]
    pub const fn new(
        token: InstrumentToken,
        mode: Mode,
        tradable: bool,
        last_price: Decimal,
    ) -> Self {
        Self {
            token,
            mode,
            tradable,
            last_price,
            last_traded_quantity: None,
            average_traded_price: None,
            volume_traded: None,
            total_buy_quantity: None,
            total_sell_quantity: None,
            ohlc: None,
            change: None,
            last_trade_time: None,
            oi: None,
            oi_day_high: None,
            oi_day_low: None,
            exchange_timestamp: None,
            depth: None,
        }
    }

    /// Segment the instrument belongs to.
    #[must_use]
    pub const fn segment(&self) -> Segment {
        Segment::from_token(self.token)
    }
}
