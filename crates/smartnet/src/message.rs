//! Demodulator messages

use std::convert::TryFrom;

use thiserror::Error;

/// Protocol identifier for SmartNet messages
pub const PROTOCOL_SMARTNET: u16 = 2;

/// Message subtype: one decoded OSW
pub const M_SMARTNET_OSW: u16 = 0x0000;

/// Message subtype: control channel timeout
pub const M_SMARTNET_TIMEOUT: u16 = 0xffff;

/// Message subtype: bad frame, synchronization lost
pub const M_SMARTNET_BAD_OSW: u16 = 0xfffe;

/// Length of an OSW payload, in bytes
pub const OSW_PAYLOAD_LEN: usize = 5;

/// A message from the demodulator
///
/// The demodulator reports every decoded OSW and every
/// detected loss of synchronization. Messages are usually
/// constructed from a tagged raw message with
/// [`try_from()`](DecoderMessage::try_from):
///
/// ```
/// use std::convert::TryFrom;
/// use smartnet::DecoderMessage;
///
/// let raw_type = (2u32 << 16) | 0x0000;
/// let msg = DecoderMessage::try_from((raw_type, 12.5, &[0x24u8, 0x60, 0x01, 0x01, 0x00][..]));
/// assert_eq!(
///     Ok(DecoderMessage::Osw { ts: 12.5, addr: 0x2460, group: true, cmd: 0x100 }),
///     msg
/// );
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DecoderMessage {
    /// One outbound signaling word
    Osw {
        /// Time of reception (s)
        ts: f64,
        /// Address field
        addr: u16,
        /// Group flag
        group: bool,
        /// Command field
        cmd: u16,
    },

    /// Bad frame: the demodulator lost synchronization
    BadFrame {
        /// Time of reception (s)
        ts: f64,
    },

    /// No OSWs were received for a while
    Timeout {
        /// Time of reception (s)
        ts: f64,
    },
}

/// Error decoding a demodulator message
#[derive(Error, Clone, Debug, PartialEq, Eq, Hash)]
pub enum MessageDecodeErr {
    /// The message is for some other trunking protocol
    #[error("invalid message: unknown protocol {0}")]
    UnknownProtocol(u16),

    /// The message subtype is not recognized
    #[error("invalid message: unknown message type {0:#06x}")]
    UnknownType(u16),

    /// The OSW payload is too short
    #[error("invalid message: OSW payload too short ({0} bytes)")]
    TooShort(usize),
}

impl DecoderMessage {
    /// Time of reception (s)
    pub fn ts(&self) -> f64 {
        match self {
            DecoderMessage::Osw { ts, .. } => *ts,
            DecoderMessage::BadFrame { ts } => *ts,
            DecoderMessage::Timeout { ts } => *ts,
        }
    }

    /// Pack a raw message type from protocol and subtype
    pub fn raw_type(protocol: u16, subtype: u16) -> u32 {
        ((protocol as u32) << 16) | subtype as u32
    }
}

impl TryFrom<(u32, f64, &[u8])> for DecoderMessage {
    type Error = MessageDecodeErr;

    /// Decode from a raw tagged message
    ///
    /// The tuple contains the raw message type, the time of
    /// reception, and the payload. The upper 16 bits of the raw
    /// message type are the protocol, and the lower 16 bits
    /// are the subtype.
    ///
    /// OSW payloads are five bytes: a big-endian address, a
    /// group flag byte, and a big-endian command. Trailing
    /// bytes are ignored.
    fn try_from(inp: (u32, f64, &[u8])) -> Result<Self, Self::Error> {
        let (raw_type, ts, payload) = inp;
        let protocol = (raw_type >> 16) as u16;
        let subtype = (raw_type & 0xffff) as u16;

        if protocol != PROTOCOL_SMARTNET {
            return Err(MessageDecodeErr::UnknownProtocol(protocol));
        }

        match subtype {
            M_SMARTNET_OSW => {
                if payload.len() < OSW_PAYLOAD_LEN {
                    return Err(MessageDecodeErr::TooShort(payload.len()));
                }
                Ok(DecoderMessage::Osw {
                    ts,
                    addr: u16::from_be_bytes([payload[0], payload[1]]),
                    group: payload[2] != 0,
                    cmd: u16::from_be_bytes([payload[3], payload[4]]),
                })
            }
            M_SMARTNET_BAD_OSW => Ok(DecoderMessage::BadFrame { ts }),
            M_SMARTNET_TIMEOUT => Ok(DecoderMessage::Timeout { ts }),
            other => Err(MessageDecodeErr::UnknownType(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OSW_TYPE: u32 = (PROTOCOL_SMARTNET as u32) << 16;

    #[test]
    fn test_decode_osw() {
        let msg = DecoderMessage::try_from((OSW_TYPE, 1.0, &[0x1f, 0x00, 0x00, 0x02, 0xd0][..]));
        assert_eq!(
            Ok(DecoderMessage::Osw {
                ts: 1.0,
                addr: 0x1f00,
                group: false,
                cmd: 0x2d0
            }),
            msg
        );

        // any nonzero group byte is a group
        let msg = DecoderMessage::try_from((OSW_TYPE, 1.0, &[0, 1, 0x80, 0, 2, 0xff][..]));
        assert_eq!(
            Ok(DecoderMessage::Osw {
                ts: 1.0,
                addr: 1,
                group: true,
                cmd: 2
            }),
            msg
        );
    }

    #[test]
    fn test_decode_errors() {
        assert_eq!(
            Err(MessageDecodeErr::TooShort(4)),
            DecoderMessage::try_from((OSW_TYPE, 1.0, &[0, 1, 2, 3][..]))
        );
        assert_eq!(
            Err(MessageDecodeErr::UnknownProtocol(1)),
            DecoderMessage::try_from((1u32 << 16, 1.0, &[0, 1, 2, 3, 4][..]))
        );
        assert_eq!(
            Err(MessageDecodeErr::UnknownType(0x0042)),
            DecoderMessage::try_from((OSW_TYPE | 0x42, 1.0, &[][..]))
        );
    }

    #[test]
    fn test_decode_signals() {
        let bad = DecoderMessage::raw_type(PROTOCOL_SMARTNET, M_SMARTNET_BAD_OSW);
        assert_eq!(
            Ok(DecoderMessage::BadFrame { ts: 3.0 }),
            DecoderMessage::try_from((bad, 3.0, &[][..]))
        );

        let timeout = DecoderMessage::raw_type(PROTOCOL_SMARTNET, M_SMARTNET_TIMEOUT);
        let msg = DecoderMessage::try_from((timeout, 4.0, &[][..])).unwrap();
        assert_eq!(DecoderMessage::Timeout { ts: 4.0 }, msg);
        assert_eq!(4.0, msg.ts());
    }
}
