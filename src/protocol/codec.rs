use bytes::{Buf, BufMut, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::core::{ConnectionId, Error, Innings, Overs, Result, ScoreData, PROTOCOL_VERSION};
use super::message::{Message, MessageTag};

/// First two bytes of every datagram
pub const MAGIC: [u8; 2] = *b"CS";

/// Magic, version and tag
pub const HEADER_LEN: usize = 4;

/// Connection id field
pub const ID_LEN: usize = 4;

/// Total, wickets, completed overs, balls, innings
pub const SCORE_LEN: usize = 7;

/// Size of the largest message, a score update
pub const MAX_ENCODED_LEN: usize = HEADER_LEN + ID_LEN + SCORE_LEN;

/// Fixed-layout codec, one message per datagram.
///
/// All multi-byte fields are big endian:
///
/// ```text
/// 0  magic "CS"      2 bytes
/// 2  version         1
/// 3  tag             1   1 Lookout, 2 Hello, 3 Ack, 4 ScoreUpdate
/// 4  connection id   4   Hello, Ack, ScoreUpdate
/// 8  total           2   ScoreUpdate only
/// 10 wickets         1
/// 11 overs           2
/// 13 balls           1
/// 14 innings         1
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct DatagramCodec;

impl DatagramCodec {
    /// Creates a new datagram codec
    pub fn new() -> Self {
        DatagramCodec
    }
}

impl Decoder for DatagramCodec {
    type Item = Message;
    type Error = Error;

    /// Treats the whole buffer as one datagram
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        if src.is_empty() {
            return Ok(None);
        }
        let datagram = src.split();
        decode(&datagram).map(Some)
    }
}

impl Encoder<Message> for DatagramCodec {
    type Error = Error;

    fn encode(&mut self, item: Message, dst: &mut BytesMut) -> Result<()> {
        dst.reserve(MAX_ENCODED_LEN);
        dst.put_slice(&MAGIC);
        dst.put_u8(PROTOCOL_VERSION);
        dst.put_u8(item.tag() as u8);

        match item {
            Message::Lookout => {}
            Message::Hello { id } | Message::Ack { id } => dst.put_u32(id.0),
            Message::ScoreUpdate { id, score } => {
                dst.put_u32(id.0);
                dst.put_u16(score.total());
                dst.put_u8(score.wickets());
                dst.put_u16(score.overs().completed());
                dst.put_u8(score.overs().balls());
                dst.put_u8(score.innings().number());
            }
        }

        Ok(())
    }
}

/// Encodes a message into a standalone datagram
pub fn encode(message: &Message) -> Bytes {
    let mut buf = BytesMut::with_capacity(MAX_ENCODED_LEN);
    // Writing into a BytesMut cannot fail
    let _ = DatagramCodec.encode(*message, &mut buf);
    buf.freeze()
}

/// Decodes one datagram. Anything short, long, or out of range is a
/// `MalformedMessage` for the caller to drop.
pub fn decode(datagram: &[u8]) -> Result<Message> {
    let mut buf = datagram;
    if buf.remaining() < HEADER_LEN {
        return Err(Error::malformed(format!(
            "{} byte datagram is shorter than the header",
            datagram.len()
        )));
    }

    let mut magic = [0u8; 2];
    buf.copy_to_slice(&mut magic);
    if magic != MAGIC {
        return Err(Error::malformed(format!("bad magic {:02x?}", magic)));
    }

    let version = buf.get_u8();
    if version != PROTOCOL_VERSION {
        return Err(Error::malformed(format!("unsupported protocol version {}", version)));
    }

    let message = match MessageTag::try_from(buf.get_u8())? {
        MessageTag::Lookout => Message::Lookout,
        MessageTag::Hello => Message::Hello { id: read_id(&mut buf)? },
        MessageTag::Ack => Message::Ack { id: read_id(&mut buf)? },
        MessageTag::ScoreUpdate => {
            let id = read_id(&mut buf)?;
            let score = read_score(&mut buf)?;
            Message::ScoreUpdate { id, score }
        }
    };

    if buf.has_remaining() {
        return Err(Error::malformed(format!(
            "{} trailing bytes after {:?}",
            buf.remaining(),
            message.tag()
        )));
    }

    Ok(message)
}

fn read_id(buf: &mut &[u8]) -> Result<ConnectionId> {
    if buf.remaining() < ID_LEN {
        return Err(Error::malformed("truncated connection id"));
    }
    Ok(ConnectionId(buf.get_u32()))
}

fn read_score(buf: &mut &[u8]) -> Result<ScoreData> {
    if buf.remaining() < SCORE_LEN {
        return Err(Error::malformed("truncated score"));
    }
    let total = buf.get_u16();
    let wickets = buf.get_u8();
    let overs = Overs::new(buf.get_u16(), buf.get_u8())?;
    let innings = Innings::new(buf.get_u8())?;
    ScoreData::new(total, wickets, overs, innings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score() -> ScoreData {
        ScoreData::new(10, 1, Overs::new(2, 0).unwrap(), Innings::first()).unwrap()
    }

    #[test]
    fn test_lookout_layout() {
        assert_eq!(&encode(&Message::Lookout)[..], &[b'C', b'S', 1, 1]);
    }

    #[test]
    fn test_score_update_layout() {
        let score = ScoreData::new(258, 7, Overs::new(45, 3).unwrap(), Innings::new(2).unwrap()).unwrap();
        let bytes = encode(&Message::ScoreUpdate { id: ConnectionId(0x01020304), score });
        assert_eq!(
            &bytes[..],
            &[b'C', b'S', 1, 4, 1, 2, 3, 4, 0x01, 0x02, 7, 0, 45, 3, 2]
        );
        assert_eq!(bytes.len(), MAX_ENCODED_LEN);
        assert_eq!(decode(&bytes).unwrap(), Message::ScoreUpdate { id: ConnectionId(0x01020304), score });
    }

    #[test]
    fn test_codec_trait_hello() {
        let mut codec = DatagramCodec::new();
        let mut bytes = BytesMut::new();

        codec.encode(Message::Hello { id: ConnectionId(99) }, &mut bytes).unwrap();
        assert_eq!(bytes.len(), HEADER_LEN + ID_LEN);

        let decoded = codec.decode(&mut bytes).unwrap();
        assert_eq!(decoded, Some(Message::Hello { id: ConnectionId(99) }));
        assert!(bytes.is_empty());
        assert_eq!(codec.decode(&mut bytes).unwrap(), None);
    }

    #[test]
    fn test_truncated_payloads_rejected() {
        let full = encode(&Message::ScoreUpdate { id: ConnectionId(5), score: score() });
        for len in 0..full.len() {
            let result = decode(&full[..len]);
            assert!(
                matches!(result, Err(Error::MalformedMessage(_))),
                "prefix of {} bytes decoded as {:?}",
                len,
                result
            );
        }
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let mut bytes = encode(&Message::Lookout).to_vec();
        bytes.push(0);
        assert!(matches!(decode(&bytes), Err(Error::MalformedMessage(_))));
    }

    #[test]
    fn test_bad_header_rejected() {
        assert!(decode(b"XS\x01\x01").is_err());
        assert!(decode(b"CS\x02\x01").is_err());
        assert!(decode(b"CS\x01\x09").is_err());
    }

    #[test]
    fn test_out_of_range_fields_rejected() {
        let mut bytes = encode(&Message::ScoreUpdate { id: ConnectionId(5), score: score() }).to_vec();
        bytes[10] = 11; // wickets
        assert!(decode(&bytes).is_err());

        let mut bytes = encode(&Message::ScoreUpdate { id: ConnectionId(5), score: score() }).to_vec();
        bytes[14] = 0; // innings
        assert!(decode(&bytes).is_err());
    }
}
