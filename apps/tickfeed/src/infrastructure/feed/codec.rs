//! Feed Codec
//!
//! Decodes the feed's frames into domain types. Binary frames carry tick
//! batches; text frames carry control messages.
//!
//! # Binary Frame Layout
//!
//! All integers are big-endian and unsigned.
//!
//! ```text
//! frame   := count:u16 packet*
//! packet  := length:u16 payload[length]
//! payload := token:u32 fields...
//! ```
//!
//! The payload layout is selected by its length: 8 bytes is an LTP tick,
//! 44 a quote tick, 184 a full tick with five-level depth, and 28/32 the
//! reduced index quote/full layouts without volume or depth. Raw price
//! fields are scaled into decimals by the owning segment's divisor, derived
//! from the token's low-order byte.
//!
//! A frame shorter than the two-byte header is a heartbeat: it decodes to
//! zero ticks but still counts as a liveness signal at the session layer.
//! Any truncation or unknown payload length fails the whole frame; the
//! session drops the frame and keeps streaming.

use chrono::{DateTime, Utc};

use crate::domain::tick::{
    DEPTH_LEVELS, DepthLevel, MarketDepth, Mode, Ohlc, Segment, TickRecord,
};
use crate::infrastructure::feed::messages::ControlMessage;

/// Frame header size: the packet count.
pub const FRAME_HEADER_LEN: usize = 2;

/// Payload length of an LTP tick.
pub const LTP_PACKET_LEN: usize = 8;

/// Payload length of an index quote tick.
pub const INDEX_QUOTE_PACKET_LEN: usize = 28;

/// Payload length of an index full tick.
pub const INDEX_FULL_PACKET_LEN: usize = 32;

/// Payload length of a quote tick.
pub const QUOTE_PACKET_LEN: usize = 44;

/// Payload length of a full tick.
pub const FULL_PACKET_LEN: usize = 184;

/// Codec errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// The frame ended in the middle of a declared structure.
    #[error("frame truncated at offset {offset}: needed {needed} more bytes")]
    Truncated {
        /// Byte offset into the frame where decoding stopped.
        offset: usize,
        /// How many more bytes the structure required.
        needed: usize,
    },

    /// A sub-packet declared a payload length the protocol does not define.
    #[error("unsupported packet length {length} at offset {offset}")]
    UnsupportedPacketLength {
        /// Byte offset of the packet payload within the frame.
        offset: usize,
        /// The declared payload length.
        length: usize,
    },

    /// A text frame did not parse as a control message.
    #[error("malformed control message: {0}")]
    Control(String),
}

/// Decoder for feed frames.
///
/// Pure transform: no I/O, no state.
#[derive(Debug, Default, Clone)]
pub struct TickCodec;

impl TickCodec {
    /// Create a new codec.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Decode a binary frame into its tick batch, preserving packet order.
    ///
    /// Heartbeat frames (shorter than the header) decode to an empty batch.
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] when the frame is truncated mid-structure
    /// or a sub-packet declares an unknown payload length. The error
    /// invalidates the whole frame; no partial batch is returned.
    pub fn decode_ticks(&self, frame: &[u8]) -> Result<Vec<TickRecord>, DecodeError> {
        if frame.len() < FRAME_HEADER_LEN {
            return Ok(Vec::new());
        }

        let mut reader = Reader::new(frame, 0);
        let count = reader.u16()?;

        let mut ticks = Vec::with_capacity(usize::from(count));
        for _ in 0..count {
            let length = usize::from(reader.u16()?);
            let base = reader.position();
            let payload = reader.take(length)?;
            ticks.push(decode_packet(payload, base)?);
        }

        Ok(ticks)
    }

    /// Decode a text frame into a control message.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Control`] when the text is not a valid
    /// control message object.
    pub fn decode_control(&self, text: &str) -> Result<ControlMessage, DecodeError> {
        serde_json::from_str(text).map_err(|e| DecodeError::Control(e.to_string()))
    }
}

// =============================================================================
// Packet Decoding
// =============================================================================

fn decode_packet(payload: &[u8], base: usize) -> Result<TickRecord, DecodeError> {
    let mut reader = Reader::new(payload, base);
    let token = reader.u32()?;
    let segment = Segment::from_token(token);

    match payload.len() {
        LTP_PACKET_LEN => {
            let last_price = segment.scale_price(reader.u32()?);
            Ok(TickRecord::new(
                token,
                Mode::Ltp,
                segment.is_tradable(),
                last_price,
            ))
        }
        INDEX_QUOTE_PACKET_LEN | INDEX_FULL_PACKET_LEN => {
            decode_index_packet(&mut reader, payload.len(), token, segment)
        }
        QUOTE_PACKET_LEN | FULL_PACKET_LEN => {
            decode_instrument_packet(&mut reader, payload.len(), token, segment)
        }
        length => Err(DecodeError::UnsupportedPacketLength {
            offset: base,
            length,
        }),
    }
}

/// Index layout: no volume, no aggregate quantities, no depth, and OHLC
/// transmitted in high/low/open/close order.
fn decode_index_packet(
    reader: &mut Reader<'_>,
    length: usize,
    token: u32,
    segment: Segment,
) -> Result<TickRecord, DecodeError> {
    let mode = if length == INDEX_FULL_PACKET_LEN {
        Mode::Full
    } else {
        Mode::Quote
    };

    let last_price = segment.scale_price(reader.u32()?);
    let high = segment.scale_price(reader.u32()?);
    let low = segment.scale_price(reader.u32()?);
    let open = segment.scale_price(reader.u32()?);
    let close = segment.scale_price(reader.u32()?);
    let ohlc = Ohlc {
        open,
        high,
        low,
        close,
    };

    let mut tick = TickRecord::new(token, mode, segment.is_tradable(), last_price);
    tick.change = Some(ohlc.percent_change_from(last_price));
    tick.ohlc = Some(ohlc);

    if mode == Mode::Full {
        // 24..28 carries the absolute change; recomputed from the close.
        reader.skip(4)?;
        tick.exchange_timestamp = epoch_seconds(reader.u32()?);
    }

    Ok(tick)
}

/// Tradable-instrument layout: quote fields, and for full packets the open
/// interest block, timestamps, and five-level depth.
fn decode_instrument_packet(
    reader: &mut Reader<'_>,
    length: usize,
    token: u32,
    segment: Segment,
) -> Result<TickRecord, DecodeError> {
    let mode = if length == FULL_PACKET_LEN {
        Mode::Full
    } else {
        Mode::Quote
    };

    let last_price = segment.scale_price(reader.u32()?);
    let last_traded_quantity = reader.u32()?;
    let average_traded_price = segment.scale_price(reader.u32()?);
    let volume_traded = reader.u32()?;
    let total_buy_quantity = reader.u32()?;
    let total_sell_quantity = reader.u32()?;
    let open = segment.scale_price(reader.u32()?);
    let high = segment.scale_price(reader.u32()?);
    let low = segment.scale_price(reader.u32()?);
    let close = segment.scale_price(reader.u32()?);
    let ohlc = Ohlc {
        open,
        high,
        low,
        close,
    };

    let mut tick = TickRecord::new(token, mode, segment.is_tradable(), last_price);
    tick.last_traded_quantity = Some(last_traded_quantity);
    tick.average_traded_price = Some(average_traded_price);
    tick.volume_traded = Some(volume_traded);
    tick.total_buy_quantity = Some(total_buy_quantity);
    tick.total_sell_quantity = Some(total_sell_quantity);
    tick.change = Some(ohlc.percent_change_from(last_price));
    tick.ohlc = Some(ohlc);

    if mode == Mode::Full {
        tick.last_trade_time = epoch_seconds(reader.u32()?);
        tick.oi = Some(reader.u32()?);
        tick.oi_day_high = Some(reader.u32()?);
        tick.oi_day_low = Some(reader.u32()?);
        tick.exchange_timestamp = epoch_seconds(reader.u32()?);
        tick.depth = Some(MarketDepth {
            buy: read_depth_side(reader, segment)?,
            sell: read_depth_side(reader, segment)?,
        });
    }

    Ok(tick)
}

fn read_depth_side(
    reader: &mut Reader<'_>,
    segment: Segment,
) -> Result<[DepthLevel; DEPTH_LEVELS], DecodeError> {
    let mut levels = [DepthLevel {
        quantity: 0,
        price: rust_decimal::Decimal::ZERO,
        orders: 0,
    }; DEPTH_LEVELS];

    for level in &mut levels {
        let quantity = reader.u32()?;
        let price = segment.scale_price(reader.u32()?);
        let orders = reader.u16()?;
        // Each 12-byte entry ends with 2 bytes of padding.
        reader.skip(2)?;
        *level = DepthLevel {
            quantity,
            price,
            orders,
        };
    }

    Ok(levels)
}

/// Epoch seconds to a UTC timestamp; zero means absent.
fn epoch_seconds(secs: u32) -> Option<DateTime<Utc>> {
    if secs == 0 {
        None
    } else {
        DateTime::from_timestamp(i64::from(secs), 0)
    }
}

// =============================================================================
// Cursor
// =============================================================================

/// Bounds-checked big-endian cursor reporting absolute frame offsets.
struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
    base: usize,
}

impl<'a> Reader<'a> {
    const fn new(buf: &'a [u8], base: usize) -> Self {
        Self { buf, pos: 0, base }
    }

    const fn position(&self) -> usize {
        self.base + self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        let remaining = self.buf.len() - self.pos;
        if remaining < n {
            return Err(DecodeError::Truncated {
                offset: self.position(),
                needed: n - remaining,
            });
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn skip(&mut self, n: usize) -> Result<(), DecodeError> {
        self.take(n).map(|_| ())
    }

    fn u16(&mut self) -> Result<u16, DecodeError> {
        let bytes = self.take(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    fn u32(&mut self) -> Result<u32, DecodeError> {
        let bytes = self.take(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rust_decimal::Decimal;
    use rust_decimal::prelude::ToPrimitive;
    use test_case::test_case;

    use super::*;

    fn frame_of(payloads: &[Vec<u8>]) -> Vec<u8> {
        let mut frame = Vec::new();
        frame.extend_from_slice(&u16::try_from(payloads.len()).unwrap().to_be_bytes());
        for payload in payloads {
            frame.extend_from_slice(&u16::try_from(payload.len()).unwrap().to_be_bytes());
            frame.extend_from_slice(payload);
        }
        frame
    }

    fn ltp_payload(token: u32, raw_price: u32) -> Vec<u8> {
        let mut payload = Vec::with_capacity(LTP_PACKET_LEN);
        payload.extend_from_slice(&token.to_be_bytes());
        payload.extend_from_slice(&raw_price.to_be_bytes());
        payload
    }

    #[test]
    fn heartbeat_decodes_to_empty_batch() {
        let codec = TickCodec::new();
        assert!(codec.decode_ticks(&[]).unwrap().is_empty());
        assert!(codec.decode_ticks(&[0x00]).unwrap().is_empty());
    }

    #[test]
    fn empty_frame_decodes_to_empty_batch() {
        let codec = TickCodec::new();
        let frame = frame_of(&[]);
        assert!(codec.decode_ticks(&frame).unwrap().is_empty());
    }

    #[test]
    fn ltp_packet_worked_example() {
        // token 5633 (NSE, divisor 100), raw price 229885 -> 2298.85.
        let codec = TickCodec::new();
        let frame = frame_of(&[ltp_payload(5633, 229_885)]);

        let ticks = codec.decode_ticks(&frame).unwrap();
        assert_eq!(ticks.len(), 1);

        let tick = &ticks[0];
        assert_eq!(tick.token, 5633);
        assert_eq!(tick.mode, Mode::Ltp);
        assert!(tick.tradable);
        assert_eq!(tick.last_price, Decimal::new(229_885, 2));
        assert_eq!(tick.last_price.to_string(), "2298.85");
        assert!(tick.ohlc.is_none());
    }

    #[test]
    fn batch_preserves_packet_order() {
        let codec = TickCodec::new();
        let frame = frame_of(&[ltp_payload(5633, 100), ltp_payload(738_561, 200)]);

        let ticks = codec.decode_ticks(&frame).unwrap();
        assert_eq!(ticks.len(), 2);
        assert_eq!(ticks[0].token, 5633);
        assert_eq!(ticks[1].token, 738_561);
    }

    #[test]
    fn currency_segment_uses_seven_decimal_places() {
        // Low byte 3 -> currency derivatives, divisor 1e7.
        let codec = TickCodec::new();
        let frame = frame_of(&[ltp_payload(0x0000_1203, 745_250_000)]);

        let ticks = codec.decode_ticks(&frame).unwrap();
        assert_eq!(ticks[0].last_price, Decimal::new(745_250_000, 7));
        assert_eq!(ticks[0].last_price.to_string(), "74.5250000");
    }

    #[test]
    fn quote_packet_decodes_all_fields() {
        let token: u32 = 5633;
        let mut payload = Vec::with_capacity(QUOTE_PACKET_LEN);
        payload.extend_from_slice(&token.to_be_bytes());
        for raw in [
            229_885u32, // last price
            50,         // last traded quantity
            229_000,    // average traded price
            12_345,     // volume
            400,        // total buy quantity
            300,        // total sell quantity
            228_000,    // open
            230_000,    // high
            227_000,    // low
            226_000,    // close
        ] {
            payload.extend_from_slice(&raw.to_be_bytes());
        }

        let codec = TickCodec::new();
        let ticks = codec.decode_ticks(&frame_of(&[payload])).unwrap();
        let tick = &ticks[0];

        assert_eq!(tick.mode, Mode::Quote);
        assert_eq!(tick.last_traded_quantity, Some(50));
        assert_eq!(tick.average_traded_price, Some(Decimal::new(229_000, 2)));
        assert_eq!(tick.volume_traded, Some(12_345));
        assert_eq!(tick.total_buy_quantity, Some(400));
        assert_eq!(tick.total_sell_quantity, Some(300));

        let ohlc = tick.ohlc.unwrap();
        assert_eq!(ohlc.open, Decimal::new(228_000, 2));
        assert_eq!(ohlc.high, Decimal::new(230_000, 2));
        assert_eq!(ohlc.low, Decimal::new(227_000, 2));
        assert_eq!(ohlc.close, Decimal::new(226_000, 2));

        // (2298.85 - 2260.00) * 100 / 2260.00
        assert_eq!(tick.change, Some(ohlc.percent_change_from(tick.last_price)));
        assert!(tick.depth.is_none());
        assert!(tick.exchange_timestamp.is_none());
    }

    #[test]
    fn index_packet_ohlc_arrives_in_hloc_order() {
        let token: u32 = 0x0000_0109; // indices segment
        let mut payload = Vec::with_capacity(INDEX_QUOTE_PACKET_LEN);
        payload.extend_from_slice(&token.to_be_bytes());
        for raw in [
            1_100_000u32, // last
            1_200_000,    // high
            1_000_000,    // low
            1_050_000,    // open
            1_080_000,    // close
            7,            // absolute change, ignored
        ] {
            payload.extend_from_slice(&raw.to_be_bytes());
        }

        let codec = TickCodec::new();
        let ticks = codec.decode_ticks(&frame_of(&[payload])).unwrap();
        let tick = &ticks[0];

        assert_eq!(tick.mode, Mode::Quote);
        assert!(!tick.tradable);

        let ohlc = tick.ohlc.unwrap();
        assert_eq!(ohlc.high, Decimal::new(1_200_000, 2));
        assert_eq!(ohlc.low, Decimal::new(1_000_000, 2));
        assert_eq!(ohlc.open, Decimal::new(1_050_000, 2));
        assert_eq!(ohlc.close, Decimal::new(1_080_000, 2));
    }

    #[test]
    fn index_full_packet_carries_timestamp() {
        let token: u32 = 0x0000_0109;
        let mut payload = Vec::with_capacity(INDEX_FULL_PACKET_LEN);
        payload.extend_from_slice(&token.to_be_bytes());
        for raw in [
            1_100_000u32,
            1_200_000,
            1_000_000,
            1_050_000,
            1_080_000,
            7,             // absolute change, ignored
            1_700_000_000, // exchange timestamp
        ] {
            payload.extend_from_slice(&raw.to_be_bytes());
        }

        let codec = TickCodec::new();
        let ticks = codec.decode_ticks(&frame_of(&[payload])).unwrap();
        let tick = &ticks[0];

        assert_eq!(tick.mode, Mode::Full);
        assert_eq!(
            tick.exchange_timestamp,
            DateTime::from_timestamp(1_700_000_000, 0)
        );
    }

    #[test]
    fn full_packet_decodes_depth() {
        let codec = TickCodec::new();
        let payload = full_payload(&RawFull::example());
        let ticks = codec.decode_ticks(&frame_of(&[payload])).unwrap();
        let tick = &ticks[0];

        assert_eq!(tick.mode, Mode::Full);
        assert_eq!(tick.oi, Some(9_000));
        assert_eq!(tick.oi_day_high, Some(9_500));
        assert_eq!(tick.oi_day_low, Some(8_500));

        let depth = tick.depth.unwrap();
        assert_eq!(depth.buy[0].quantity, 10);
        assert_eq!(depth.buy[0].price, Decimal::new(229_800, 2));
        assert_eq!(depth.buy[0].orders, 3);
        assert_eq!(depth.sell[4].quantity, 19);
        assert_eq!(depth.sell[4].orders, 12);
    }

    #[test]
    fn zero_timestamps_decode_as_absent() {
        let mut raw = RawFull::example();
        raw.last_trade_time = 0;
        raw.exchange_timestamp = 0;

        let codec = TickCodec::new();
        let ticks = codec.decode_ticks(&frame_of(&[full_payload(&raw)])).unwrap();
        assert!(ticks[0].last_trade_time.is_none());
        assert!(ticks[0].exchange_timestamp.is_none());
    }

    #[test_case(LTP_PACKET_LEN, Mode::Ltp; "ltp")]
    #[test_case(QUOTE_PACKET_LEN, Mode::Quote; "quote")]
    #[test_case(FULL_PACKET_LEN, Mode::Full; "full")]
    fn packet_length_classifies_mode(length: usize, expected: Mode) {
        let mut payload = vec![0u8; length];
        payload[..4].copy_from_slice(&1u32.to_be_bytes()); // NSE token

        let codec = TickCodec::new();
        let ticks = codec.decode_ticks(&frame_of(&[payload])).unwrap();
        assert_eq!(ticks[0].mode, expected);
    }

    #[test]
    fn unknown_packet_length_fails_the_frame() {
        let codec = TickCodec::new();
        let frame = frame_of(&[vec![0u8; 12]]);

        let err = codec.decode_ticks(&frame).unwrap_err();
        assert_eq!(
            err,
            DecodeError::UnsupportedPacketLength {
                offset: 4,
                length: 12
            }
        );
    }

    #[test]
    fn declared_length_past_frame_end_is_truncation() {
        let codec = TickCodec::new();
        // Claims one 44-byte packet but carries only 8 payload bytes.
        let mut frame = Vec::new();
        frame.extend_from_slice(&1u16.to_be_bytes());
        frame.extend_from_slice(&44u16.to_be_bytes());
        frame.extend_from_slice(&[0u8; 8]);

        let err = codec.decode_ticks(&frame).unwrap_err();
        assert_eq!(
            err,
            DecodeError::Truncated {
                offset: 4,
                needed: 36
            }
        );
    }

    #[test]
    fn missing_second_packet_is_truncation() {
        let codec = TickCodec::new();
        let mut frame = frame_of(&[ltp_payload(5633, 100)]);
        // Overwrite the count: claims two packets, carries one.
        frame[..2].copy_from_slice(&2u16.to_be_bytes());

        let err = codec.decode_ticks(&frame).unwrap_err();
        assert!(matches!(err, DecodeError::Truncated { offset: 12, .. }));
    }

    #[test]
    fn control_message_text_decodes() {
        let codec = TickCodec::new();
        let msg = codec
            .decode_control(r#"{"type":"order","data":{"status":"COMPLETE"}}"#)
            .unwrap();
        assert!(msg.is_order());
    }

    #[test]
    fn malformed_control_text_fails() {
        let codec = TickCodec::new();
        assert!(matches!(
            codec.decode_control("not json"),
            Err(DecodeError::Control(_))
        ));
    }

    // =========================================================================
    // Round-trip property
    // =========================================================================

    /// Raw field values of one full packet, as carried on the wire.
    #[derive(Debug, Clone)]
    struct RawFull {
        token: u32,
        last_price: u32,
        last_traded_quantity: u32,
        average_traded_price: u32,
        volume_traded: u32,
        total_buy_quantity: u32,
        total_sell_quantity: u32,
        open: u32,
        high: u32,
        low: u32,
        close: u32,
        last_trade_time: u32,
        oi: u32,
        oi_day_high: u32,
        oi_day_low: u32,
        exchange_timestamp: u32,
        depth: [(u32, u32, u16); DEPTH_LEVELS * 2],
    }

    impl RawFull {
        fn example() -> Self {
            let mut depth = [(0u32, 0u32, 0u16); DEPTH_LEVELS * 2];
            for (i, entry) in depth.iter_mut().enumerate() {
                let i = u32::try_from(i).unwrap();
                *entry = (10 + i, 229_800 + i * 10, u16::try_from(3 + i).unwrap());
            }
            Self {
                token: 5633,
                last_price: 229_885,
                last_traded_quantity: 50,
                average_traded_price: 229_000,
                volume_traded: 12_345,
                total_buy_quantity: 400,
                total_sell_quantity: 300,
                open: 228_000,
                high: 230_000,
                low: 227_000,
                close: 226_000,
                last_trade_time: 1_700_000_000,
                oi: 9_000,
                oi_day_high: 9_500,
                oi_day_low: 8_500,
                exchange_timestamp: 1_700_000_005,
                depth,
            }
        }
    }

    fn full_payload(raw: &RawFull) -> Vec<u8> {
        let mut payload = Vec::with_capacity(FULL_PACKET_LEN);
        for field in [
            raw.token,
            raw.last_price,
            raw.last_traded_quantity,
            raw.average_traded_price,
            raw.volume_traded,
            raw.total_buy_quantity,
            raw.total_sell_quantity,
            raw.open,
            raw.high,
            raw.low,
            raw.close,
            raw.last_trade_time,
            raw.oi,
            raw.oi_day_high,
            raw.oi_day_low,
            raw.exchange_timestamp,
        ] {
            payload.extend_from_slice(&field.to_be_bytes());
        }
        for (quantity, price, orders) in raw.depth {
            payload.extend_from_slice(&quantity.to_be_bytes());
            payload.extend_from_slice(&price.to_be_bytes());
            payload.extend_from_slice(&orders.to_be_bytes());
            payload.extend_from_slice(&[0u8; 2]);
        }
        assert_eq!(payload.len(), FULL_PACKET_LEN);
        payload
    }

    /// Undo the segment's price scaling back to the wire integer.
    fn unscale(price: Decimal, segment: Segment) -> u32 {
        (price * Decimal::from(10u32.pow(segment.price_scale())))
            .to_u32()
            .unwrap()
    }

    fn timestamp_raw(ts: Option<DateTime<Utc>>) -> u32 {
        ts.map_or(0, |dt| u32::try_from(dt.timestamp()).unwrap())
    }

    /// Re-encode a decoded full tick back into its wire payload.
    fn reencode_full(tick: &TickRecord) -> Vec<u8> {
        let segment = tick.segment();
        let ohlc = tick.ohlc.unwrap();
        let depth = tick.depth.unwrap();
        let mut entries = [(0u32, 0u32, 0u16); DEPTH_LEVELS * 2];
        for (i, level) in depth.buy.iter().chain(depth.sell.iter()).enumerate() {
            entries[i] = (level.quantity, unscale(level.price, segment), level.orders);
        }
        full_payload(&RawFull {
            token: tick.token,
            last_price: unscale(tick.last_price, segment),
            last_traded_quantity: tick.last_traded_quantity.unwrap(),
            average_traded_price: unscale(tick.average_traded_price.unwrap(), segment),
            volume_traded: tick.volume_traded.unwrap(),
            total_buy_quantity: tick.total_buy_quantity.unwrap(),
            total_sell_quantity: tick.total_sell_quantity.unwrap(),
            open: unscale(ohlc.open, segment),
            high: unscale(ohlc.high, segment),
            low: unscale(ohlc.low, segment),
            close: unscale(ohlc.close, segment),
            last_trade_time: timestamp_raw(tick.last_trade_time),
            oi: tick.oi.unwrap(),
            oi_day_high: tick.oi_day_high.unwrap(),
            oi_day_low: tick.oi_day_low.unwrap(),
            exchange_timestamp: timestamp_raw(tick.exchange_timestamp),
            depth: entries,
        })
    }

    prop_compose! {
        fn arb_raw_full()(
            token in any::<u32>(),
            prices in proptest::array::uniform8(any::<u32>()),
            quantities in proptest::array::uniform5(any::<u32>()),
            timestamps in proptest::array::uniform2(any::<u32>()),
            depth in proptest::array::uniform10((any::<u32>(), any::<u32>(), any::<u16>())),
        ) -> RawFull {
            RawFull {
                token,
                last_price: prices[0],
                average_traded_price: prices[1],
                open: prices[2],
                high: prices[3],
                low: prices[4],
                close: prices[5],
                last_traded_quantity: quantities[0],
                volume_traded: quantities[1],
                total_buy_quantity: quantities[2],
                total_sell_quantity: quantities[3],
                oi: quantities[4],
                oi_day_high: prices[6],
                oi_day_low: prices[7],
                last_trade_time: timestamps[0],
                exchange_timestamp: timestamps[1],
                depth,
            }
        }
    }

    proptest! {
        #[test]
        fn full_packet_round_trips(raw in arb_raw_full()) {
            let payload = full_payload(&raw);
            let codec = TickCodec::new();
            let ticks = codec.decode_ticks(&frame_of(&[payload.clone()])).unwrap();
            prop_assert_eq!(ticks.len(), 1);
            prop_assert_eq!(reencode_full(&ticks[0]), payload);
        }
    }
}
