//! Length-prefixed framing over async byte streams.
//!
//! Each frame is a big-endian `u32` payload length followed by the payload.
//! The transport guarantees per-connection ordering; this module adds only
//! message boundaries and an upper size bound.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::NetError;

/// Default upper bound for a single frame.
pub const MAX_FRAME_BYTES: usize = 64 * 1024;

/// Write one length-prefixed frame.
///
/// # Errors
///
/// Returns [`NetError::FrameTooLarge`] if the payload exceeds `max`, or
/// [`NetError::Io`] on a socket failure.
pub async fn write_frame<W: AsyncWrite + Unpin>(
    writer: &mut W,
    payload: &[u8],
    max: usize,
) -> Result<(), NetError> {
    // The length prefix is a u32; a larger configured max cannot be honored.
    let max = max.min(u32::MAX as usize);
    if payload.len() > max {
        return Err(NetError::FrameTooLarge {
            len: payload.len(),
            max,
        });
    }
    writer.write_u32(payload.len() as u32).await?;
    writer.write_all(payload).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one length-prefixed frame.
///
/// Returns `Ok(None)` on a clean end-of-stream between frames.
///
/// # Errors
///
/// - [`NetError::FrameTooLarge`] — declared length exceeds `max`.
/// - [`NetError::ConnectionClosed`] — the stream ended mid-frame.
/// - [`NetError::Io`] — socket failure.
pub async fn read_frame<R: AsyncRead + Unpin>(
    reader: &mut R,
    max: usize,
) -> Result<Option<Vec<u8>>, NetError> {
    let len = match reader.read_u32().await {
        Ok(len) => len as usize,
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(NetError::Io(e)),
    };

    if len > max {
        return Err(NetError::FrameTooLarge { len, max });
    }

    let mut payload = vec![0u8; len];
    reader
        .read_exact(&mut payload)
        .await
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::UnexpectedEof => NetError::ConnectionClosed,
            _ => NetError::Io(e),
        })?;
    Ok(Some(payload))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_frame_roundtrip() {
        let (mut a, mut b) = tokio::io::duplex(256);

        write_frame(&mut a, b"hello", MAX_FRAME_BYTES).await.unwrap();
        write_frame(&mut a, b"", MAX_FRAME_BYTES).await.unwrap();

        let first = read_frame(&mut b, MAX_FRAME_BYTES).await.unwrap();
        assert_eq!(first.as_deref(), Some(&b"hello"[..]));
        let second = read_frame(&mut b, MAX_FRAME_BYTES).await.unwrap();
        assert_eq!(second.as_deref(), Some(&b""[..]));
    }

    #[tokio::test]
    async fn test_clean_eof_reads_as_none() {
        let (a, mut b) = tokio::io::duplex(64);
        drop(a);
        let frame = read_frame(&mut b, MAX_FRAME_BYTES).await.unwrap();
        assert!(frame.is_none());
    }

    #[tokio::test]
    async fn test_eof_mid_frame_is_connection_closed() {
        let (mut a, mut b) = tokio::io::duplex(64);
        // Announce 10 bytes but deliver only 3.
        a.write_u32(10).await.unwrap();
        a.write_all(b"abc").await.unwrap();
        drop(a);

        let err = read_frame(&mut b, MAX_FRAME_BYTES).await.unwrap_err();
        assert!(matches!(err, NetError::ConnectionClosed));
    }

    #[tokio::test]
    async fn test_oversize_frame_rejected_on_write() {
        let (mut a, _b) = tokio::io::duplex(64);
        let err = write_frame(&mut a, &[0u8; 32], 16).await.unwrap_err();
        assert!(matches!(err, NetError::FrameTooLarge { len: 32, max: 16 }));
    }

    #[tokio::test]
    async fn test_write_limit_clamped_to_prefix_range() {
        // A configured max beyond what the u32 prefix can express must not
        // let the length cast wrap; the effective limit is clamped instead.
        let (mut a, mut b) = tokio::io::duplex(64);
        write_frame(&mut a, b"ok", usize::MAX).await.unwrap();
        let frame = read_frame(&mut b, MAX_FRAME_BYTES).await.unwrap();
        assert_eq!(frame.as_deref(), Some(&b"ok"[..]));
    }

    #[tokio::test]
    async fn test_oversize_frame_rejected_on_read() {
        let (mut a, mut b) = tokio::io::duplex(64);
        a.write_u32(1_000_000).await.unwrap();
        let err = read_frame(&mut b, 1024).await.unwrap_err();
        assert!(matches!(err, NetError::FrameTooLarge { .. }));
    }
}
