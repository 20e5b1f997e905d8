//! Stream framing for VISCA.
//!
//! TCP (and serial) connections deliver bytes in arbitrary chunks, so replies
//! are split on the terminator rather than on reads.
use crate::protocol::frame_length;
use bytes::{Bytes, BytesMut};
use std::io::Error as IoError;
use tokio_util::codec::{Decoder, Encoder};

/// [Decoder] and [Encoder] for VISCA messages.
#[derive(Debug, Default, Clone, Copy)]
pub struct ViscaCodec;

impl ViscaCodec {
    /// Longest run of bytes without a terminator we'll hold on to.
    ///
    /// VISCA messages are at most 16 bytes.
    const MAX_PENDING: usize = 64;
}

impl Decoder for ViscaCodec {
    type Item = BytesMut;
    type Error = IoError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(len) = frame_length(src) {
            return Ok(Some(src.split_to(len)));
        }

        if src.len() > Self::MAX_PENDING {
            warn!(
                "discarding {} bytes without a terminator: {}",
                src.len(),
                hex::encode(&src[..])
            );
            src.clear();
        }
        Ok(None)
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let frame = self.decode(buf)?;
        if frame.is_none() && !buf.is_empty() {
            warn!(
                "discarding partial message at end of stream: {}",
                hex::encode(&buf[..])
            );
            buf.clear();
        }
        Ok(frame)
    }
}

impl Encoder<Bytes> for ViscaCodec {
    type Error = IoError;

    fn encode(&mut self, item: Bytes, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.extend_from_slice(&item);
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::Result;

    #[test]
    fn split_frames() -> Result<()> {
        let _ = tracing_subscriber::fmt().try_init();
        let mut codec = ViscaCodec;
        let mut buf = BytesMut::from(&hex::decode("9041ff9051ff90")?[..]);

        assert_eq!(hex::decode("9041ff")?, codec.decode(&mut buf)?.unwrap());
        assert_eq!(hex::decode("9051ff")?, codec.decode(&mut buf)?.unwrap());
        assert!(codec.decode(&mut buf)?.is_none());

        // The rest of the frame arrives in a later read
        buf.extend_from_slice(&hex::decode("5003ff")?);
        assert_eq!(hex::decode("905003ff")?, codec.decode(&mut buf)?.unwrap());
        assert!(buf.is_empty());
        Ok(())
    }

    #[test]
    fn junk() -> Result<()> {
        let _ = tracing_subscriber::fmt().try_init();
        let mut codec = ViscaCodec;
        let mut buf = BytesMut::from(&[0x55; 100][..]);
        assert!(codec.decode(&mut buf)?.is_none());
        assert!(buf.is_empty());

        let mut buf = BytesMut::from(&hex::decode("9050")?[..]);
        assert!(codec.decode_eof(&mut buf)?.is_none());
        assert!(buf.is_empty());
        Ok(())
    }

    #[test]
    fn encode() -> Result<()> {
        let mut codec = ViscaCodec;
        let mut buf = BytesMut::new();
        codec.encode(Bytes::from(hex::decode("8101060602ff")?), &mut buf)?;
        codec.encode(Bytes::from(hex::decode("81090606ff")?), &mut buf)?;
        assert_eq!(hex::decode("8101060602ff81090606ff")?, buf);
        Ok(())
    }
}
