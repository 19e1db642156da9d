use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{ProtocolError, ProtocolResult};
use crate::message::{RelayMessage, MAX_MESSAGE_SIZE};

/// Length of the frame header: 4 bytes length, 1 byte type tag.
const HEADER_LEN: usize = 5;

/// Codec for encoding/decoding relay protocol messages.
pub struct RelayCodec;

impl RelayCodec {
    /// Encode a message with framing: [4 bytes len][1 byte tag][payload]
    pub fn encode(msg: &RelayMessage) -> ProtocolResult<Vec<u8>> {
        let payload =
            bincode::serialize(msg).map_err(|e| ProtocolError::Serialization(e.to_string()))?;
        if payload.len() > MAX_MESSAGE_SIZE {
            return Err(ProtocolError::MessageTooLarge {
                size: payload.len(),
                max: MAX_MESSAGE_SIZE,
            });
        }
        let len = (payload.len() + 1) as u32;
        let mut buf = Vec::with_capacity(HEADER_LEN + payload.len());
        buf.extend_from_slice(&len.to_be_bytes());
        buf.push(msg.type_tag());
        buf.extend_from_slice(&payload);
        Ok(buf)
    }

    /// Write one framed message and flush.
    pub async fn write_frame<W>(writer: &mut W, msg: &RelayMessage) -> ProtocolResult<()>
    where
        W: AsyncWrite + Unpin,
    {
        let buf = Self::encode(msg)?;
        writer.write_all(&buf).await?;
        writer.flush().await?;
        Ok(())
    }

    /// Read one framed message.
    ///
    /// Returns `Ok(None)` when the peer closed the connection cleanly between
    /// frames. A close in the middle of a frame is a framing error.
    pub async fn read_frame<R>(reader: &mut R) -> ProtocolResult<Option<RelayMessage>>
    where
        R: AsyncRead + Unpin,
    {
        let mut len_buf = [0u8; 4];
        let first = reader.read(&mut len_buf).await?;
        if first == 0 {
            return Ok(None);
        }
        if first < len_buf.len() {
            read_exact_or_truncated(reader, &mut len_buf[first..]).await?;
        }
        let len = frame_len(&len_buf)?;
        let mut body = vec![0u8; len];
        read_exact_or_truncated(reader, &mut body).await?;
        decode_body(body[0], &body[1..]).map(Some)
    }
}

/// Validate the length prefix and return the number of bytes that follow it.
fn frame_len(prefix: &[u8; 4]) -> ProtocolResult<usize> {
    let len = u32::from_be_bytes(*prefix) as usize;
    if len < 1 {
        return Err(ProtocolError::FramingError("zero-length frame".into()));
    }
    if len - 1 > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge {
            size: len - 1,
            max: MAX_MESSAGE_SIZE,
        });
    }
    Ok(len)
}

fn decode_body(tag: u8, payload: &[u8]) -> ProtocolResult<RelayMessage> {
    let msg: RelayMessage = bincode::deserialize(payload)
        .map_err(|e| ProtocolError::Deserialization(e.to_string()))?;
    if msg.type_tag() != tag {
        return Err(ProtocolError::InvalidMessageType(tag));
    }
    Ok(msg)
}

async fn read_exact_or_truncated<R>(reader: &mut R, buf: &mut [u8]) -> ProtocolResult<()>
where
    R: AsyncRead + Unpin,
{
    match reader.read_exact(buf).await {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            Err(ProtocolError::FramingError("connection closed mid-frame".into()))
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_types::{Block, BlockHeight};
    use uuid::Uuid;

    fn publish() -> RelayMessage {
        RelayMessage::Publish {
            message_id: Uuid::now_v7(),
            exchange: "iroha".into(),
            routing_key: "blocks".into(),
            height: BlockHeight::new(3),
            payload: vec![1, 2, 3],
        }
    }

    #[tokio::test]
    async fn block_frame_survives_the_wire() {
        let block = Block::new(BlockHeight::new(12), b"block bytes".to_vec());
        let encoded = RelayCodec::encode(&RelayMessage::block(&block)).unwrap();
        assert_eq!(u32::from_be_bytes(encoded[..4].try_into().unwrap()) as usize, encoded.len() - 4);
        let mut reader = encoded.as_slice();
        match RelayCodec::read_frame(&mut reader).await.unwrap() {
            Some(RelayMessage::Block { height, payload }) => {
                assert_eq!(height, block.height);
                assert_eq!(payload, block.payload);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(reader.is_empty());
    }

    #[test]
    fn type_tags_unique() {
        let id = Uuid::nil();
        let msgs = [
            RelayMessage::Block { height: BlockHeight::ZERO, payload: vec![] },
            publish(),
            RelayMessage::PublishAck { message_id: id },
            RelayMessage::PublishNack { message_id: id, reason: String::new() },
            RelayMessage::Error { code: 0, message: String::new() },
        ];
        let mut tags: Vec<u8> = msgs.iter().map(|m| m.type_tag()).collect();
        tags.push(1); // Subscribe
        let len = tags.len();
        tags.sort();
        tags.dedup();
        assert_eq!(tags.len(), len, "type tags should be unique");
    }

    #[tokio::test]
    async fn zero_length_frame_rejected() {
        let mut reader: &[u8] = &[0, 0, 0, 0, 0];
        let err = RelayCodec::read_frame(&mut reader).await.unwrap_err();
        assert!(matches!(err, ProtocolError::FramingError(_)));
    }

    #[tokio::test]
    async fn oversized_frame_rejected_before_reading_body() {
        let len = (MAX_MESSAGE_SIZE as u32 + 2).to_be_bytes();
        let mut reader: &[u8] = &[len[0], len[1], len[2], len[3], 2];
        let err = RelayCodec::read_frame(&mut reader).await.unwrap_err();
        assert!(matches!(err, ProtocolError::MessageTooLarge { .. }));
    }

    #[tokio::test]
    async fn mismatched_tag_rejected() {
        let mut encoded = RelayCodec::encode(&publish()).unwrap();
        encoded[4] = 2;
        let mut reader = encoded.as_slice();
        let err = RelayCodec::read_frame(&mut reader).await.unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidMessageType(2)));
    }

    #[tokio::test]
    async fn truncated_length_prefix_is_framing_error() {
        let mut reader: &[u8] = &[0, 0, 0];
        let err = RelayCodec::read_frame(&mut reader).await.unwrap_err();
        assert!(matches!(err, ProtocolError::FramingError(_)));
    }

    #[tokio::test]
    async fn frames_over_a_pipe() {
        let (mut client, mut server) = tokio::io::duplex(1024);
        RelayCodec::write_frame(&mut client, &publish()).await.unwrap();
        RelayCodec::write_frame(&mut client, &RelayMessage::PublishAck { message_id: Uuid::nil() })
            .await
            .unwrap();
        drop(client);

        let first = RelayCodec::read_frame(&mut server).await.unwrap().unwrap();
        assert_eq!(first.type_name(), "Publish");
        let second = RelayCodec::read_frame(&mut server).await.unwrap().unwrap();
        assert_eq!(second.type_name(), "PublishAck");
        assert!(RelayCodec::read_frame(&mut server).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn close_mid_frame_is_framing_error() {
        let (mut client, mut server) = tokio::io::duplex(1024);
        let encoded = RelayCodec::encode(&publish()).unwrap();
        tokio::io::AsyncWriteExt::write_all(&mut client, &encoded[..encoded.len() - 2])
            .await
            .unwrap();
        drop(client);
        let err = RelayCodec::read_frame(&mut server).await.unwrap_err();
        assert!(matches!(err, ProtocolError::FramingError(_)));
    }
}
