//! Pkt-line framing.
//!
//! Both discovery responses and upload-pack requests are sequences of
//! packets, each prefixed with a 4-character hex length that counts the
//! prefix itself. `0000` is a flush packet and carries no content.

use crate::{GitError, Result};
use std::io::{ErrorKind, Read, Write};

/// Largest encoded packet, prefix included.
pub const MAX_PKT_LEN: usize = 65520;

/// A pkt-line packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PktLine {
    /// Data line with content.
    Data(Vec<u8>),
    /// Flush packet (0000).
    Flush,
}

impl PktLine {
    /// Creates a data packet from a string slice.
    pub fn from_string(s: &str) -> Self {
        Self::Data(s.as_bytes().to_vec())
    }

    /// Creates a data packet from bytes.
    pub fn from_bytes(b: impl Into<Vec<u8>>) -> Self {
        Self::Data(b.into())
    }

    /// Encodes the packet to bytes.
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Self::Data(data) => {
                let len = data.len() + 4; // 4 bytes for the length prefix
                let mut result = format!("{:04x}", len).into_bytes();
                result.extend_from_slice(data);
                result
            }
            Self::Flush => b"0000".to_vec(),
        }
    }

    /// Returns true if this is a flush packet.
    pub fn is_flush(&self) -> bool {
        matches!(self, Self::Flush)
    }

    /// Returns the data content, or None for flush.
    pub fn data(&self) -> Option<&[u8]> {
        match self {
            Self::Data(data) => Some(data),
            Self::Flush => None,
        }
    }

    /// Returns the data as a string, trimming any trailing newline.
    pub fn as_str(&self) -> Option<&str> {
        self.data()
            .and_then(|d| std::str::from_utf8(d).ok())
            .map(|s| s.trim_end_matches('\n'))
    }
}

/// Reader for pkt-line format.
pub struct PktLineReader<R> {
    reader: R,
}

impl<R: Read> PktLineReader<R> {
    /// Creates a new pkt-line reader.
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    /// Reads the next packet. Returns `None` once fewer than four bytes
    /// remain, since no further length prefix can be read.
    pub fn read(&mut self) -> Result<Option<PktLine>> {
        let mut len_buf = [0u8; 4];
        match self.reader.read_exact(&mut len_buf) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e.into()),
        }

        let len_str = std::str::from_utf8(&len_buf)
            .map_err(|_| GitError::InvalidPktLine("invalid length prefix".to_string()))?;
        if !len_str.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(GitError::InvalidPktLine(format!(
                "invalid length {:?}",
                len_str
            )));
        }

        let len = usize::from_str_radix(len_str, 16)
            .map_err(|_| GitError::InvalidPktLine("invalid length".to_string()))?;

        if len == 0 {
            return Ok(Some(PktLine::Flush));
        }
        if len < 4 {
            return Err(GitError::InvalidPktLine(format!("length {len} too small")));
        }

        let mut data = vec![0u8; len - 4];
        self.reader.read_exact(&mut data).map_err(|e| match e.kind() {
            ErrorKind::UnexpectedEof => {
                GitError::InvalidPktLine(format!("truncated packet of length {len}"))
            }
            _ => GitError::Io(e),
        })?;

        Ok(Some(PktLine::Data(data)))
    }

    /// Reads every remaining packet. Flush packets are kept in place.
    pub fn read_all(&mut self) -> Result<Vec<PktLine>> {
        let mut packets = Vec::new();
        while let Some(pkt) = self.read()? {
            packets.push(pkt);
        }
        Ok(packets)
    }

    /// Consumes the reader and returns the inner reader.
    pub fn into_inner(self) -> R {
        self.reader
    }
}

/// Parses a complete pkt-line buffer.
pub fn parse(buf: &[u8]) -> Result<Vec<PktLine>> {
    PktLineReader::new(buf).read_all()
}

/// Writer for pkt-line format.
pub struct PktLineWriter<W> {
    writer: W,
}

impl<W: Write> PktLineWriter<W> {
    /// Creates a new pkt-line writer.
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Writes a packet.
    pub fn write(&mut self, pkt: &PktLine) -> Result<()> {
        if let PktLine::Data(data) = pkt {
            if data.len() + 4 > MAX_PKT_LEN {
                return Err(GitError::InvalidPktLine(format!(
                    "{} byte payload exceeds maximum packet size",
                    data.len()
                )));
            }
        }
        self.writer.write_all(&pkt.encode())?;
        Ok(())
    }

    /// Writes a data line.
    pub fn write_data(&mut self, data: &[u8]) -> Result<()> {
        self.write(&PktLine::Data(data.to_vec()))
    }

    /// Writes a string line (with newline).
    pub fn write_line(&mut self, s: &str) -> Result<()> {
        let mut data = s.as_bytes().to_vec();
        if !s.ends_with('\n') {
            data.push(b'\n');
        }
        self.write(&PktLine::Data(data))
    }

    /// Writes a flush packet.
    pub fn flush_pkt(&mut self) -> Result<()> {
        self.write(&PktLine::Flush)
    }

    /// Flushes the underlying writer.
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    /// Returns the inner writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_pktline_encode() {
        assert_eq!(PktLine::from_string("NAK\n").encode(), b"0008NAK\n");
        assert_eq!(PktLine::Flush.encode(), b"0000");
    }

    #[test]
    fn test_parse_line_then_flush() {
        let packets = parse(b"0006a\n0000").unwrap();
        assert_eq!(packets, vec![PktLine::from_string("a\n"), PktLine::Flush]);
    }

    #[test]
    fn test_flush_does_not_stop_parsing() {
        let packets = parse(b"00000006b\n").unwrap();
        assert_eq!(packets, vec![PktLine::Flush, PktLine::from_string("b\n")]);
    }

    #[test]
    fn test_trailing_partial_prefix_stops() {
        let packets = parse(b"0006a\n00").unwrap();
        assert_eq!(packets, vec![PktLine::from_string("a\n")]);
    }

    #[test]
    fn test_service_header_sections() {
        let body = b"001e# service=git-upload-pack\n0000\
            003dce013625030ba8dba906f756967f9e9ca394464a refs/heads/main\n\
            0000";
        let mut reader = PktLineReader::new(Cursor::new(body.to_vec()));
        let packets = reader.read_all().unwrap();

        assert_eq!(packets.len(), 4);
        assert_eq!(packets[0].as_str(), Some("# service=git-upload-pack"));
        assert!(packets[1].is_flush());
        assert!(packets[2].as_str().unwrap().ends_with(" refs/heads/main"));
        assert!(packets[3].is_flush());
        assert!(packets[3].data().is_none());
    }

    #[test]
    fn test_pktline_as_str() {
        assert_eq!(PktLine::from_string("hello\n").as_str(), Some("hello"));
        let line = PktLine::from_string("no newline");
        assert_eq!(line.as_str(), Some("no newline"));
        assert!(PktLine::from_bytes(vec![0xff, 0xfe]).as_str().is_none());
    }

    #[test]
    fn test_length_below_prefix_size() {
        for prefix in [b"0001", b"0002", b"0003"] {
            assert!(matches!(parse(prefix), Err(GitError::InvalidPktLine(_))));
        }
    }

    #[test]
    fn test_pktline_read_non_hex_length() {
        assert!(matches!(parse(b"PACK"), Err(GitError::InvalidPktLine(_))));
        assert!(matches!(parse(b"+00a"), Err(GitError::InvalidPktLine(_))));
    }

    #[test]
    fn test_pktline_truncated_payload() {
        assert!(matches!(
            parse(b"000ahel"),
            Err(GitError::InvalidPktLine(_))
        ));
    }

    #[test]
    fn test_empty_body() {
        let mut reader = PktLineReader::new(Cursor::new(Vec::<u8>::new()));
        assert!(reader.read().unwrap().is_none());
        assert_eq!(reader.into_inner().position(), 0);
    }

    #[test]
    fn test_write_line_appends_newline_once() {
        let mut writer = PktLineWriter::new(Vec::new());
        writer.write_line("done").unwrap();
        writer.write_line("NAK\n").unwrap();
        writer.flush().unwrap();
        assert_eq!(writer.into_inner(), b"0009done\n0008NAK\n");
    }

    #[test]
    fn test_write_band_data() {
        let mut writer = PktLineWriter::new(Vec::new());
        writer.write_data(b"\x01PACK").unwrap();
        writer.flush_pkt().unwrap();
        assert_eq!(writer.into_inner(), b"0009\x01PACK0000");
    }

    #[test]
    fn test_pktline_writer_rejects_oversized() {
        let mut writer = PktLineWriter::new(Vec::new());
        assert!(writer.write_data(&vec![0u8; MAX_PKT_LEN - 4]).is_ok());
        assert!(writer.write_data(&vec![0u8; MAX_PKT_LEN - 3]).is_err());
    }

    #[test]
    fn test_pktline_empty_data() {
        let encoded = PktLine::from_bytes(Vec::new()).encode();
        assert_eq!(encoded, b"0004");
        assert_eq!(parse(&encoded).unwrap(), vec![PktLine::Data(Vec::new())]);
    }
}
