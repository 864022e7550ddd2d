use core::mem;

/// SNTP packet size, both for requests and replies
pub const NTP_PACKET_SIZE: usize = 48;

// First day UNIX era offset https://www.rfc-editor.org/rfc/rfc5905
pub(crate) const NTP_TIMESTAMP_DELTA: u32 = 2_208_988_800u32;

/// LI = 3 (clock unsynchronized), VN = 4, Mode = 3 (client)
const LI_VN_MODE: u8 = 0b1110_0011;
/// Stratum unspecified
const STRATUM: u8 = 0;
/// Polling interval, log2 seconds
const POLL: u8 = 6;
/// Peer clock precision
const PRECISION: u8 = 0xEC;
/// Reference identifier sent by the client
const REF_ID: [u8; 4] = [49, 0x4E, 49, 52];

const REF_ID_OFFSET: usize = 12;
const TX_TIMESTAMP_OFFSET: usize = 40;

/// Raw 48-byte SNTP datagram
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct RawNtpPacket(pub(crate) [u8; NTP_PACKET_SIZE]);

impl Default for RawNtpPacket {
    fn default() -> Self {
        RawNtpPacket([0u8; NTP_PACKET_SIZE])
    }
}

impl RawNtpPacket {
    /// Build a client request
    pub(crate) fn request() -> Self {
        let mut packet = RawNtpPacket::default();

        packet.0[0] = LI_VN_MODE;
        packet.0[1] = STRATUM;
        packet.0[2] = POLL;
        packet.0[3] = PRECISION;
        packet.0[REF_ID_OFFSET..REF_ID_OFFSET + REF_ID.len()]
            .copy_from_slice(&REF_ID);

        packet
    }

    /// Seconds part of the transmit timestamp: seconds since 1900-01-01 UTC
    pub(crate) fn tx_seconds(&self) -> u32 {
        let mut temp_buf = [0u8; mem::size_of::<u32>()];
        temp_buf.copy_from_slice(
            &self.0[TX_TIMESTAMP_OFFSET..TX_TIMESTAMP_OFFSET + 4],
        );

        u32::from_be_bytes(temp_buf)
    }

    /// Transmit timestamp converted to UNIX time, `0` for an unset timestamp
    ///
    /// The seconds field wraps on 2036-02-07; wrapping subtraction maps
    /// era 1 values onto the `u32` UNIX range up to 2106.
    pub(crate) fn unix_seconds(&self) -> u32 {
        match self.tx_seconds() {
            0 => 0,
            seconds => seconds.wrapping_sub(NTP_TIMESTAMP_DELTA),
        }
    }
}

#[cfg(test)]
mod packet_tests {
    use super::*;

    #[test]
    fn test_request_layout() {
        let packet = RawNtpPacket::request();

        assert_eq!(0xE3, packet.0[0]);
        assert_eq!(0, packet.0[1]);
        assert_eq!(6, packet.0[2]);
        assert_eq!(0xEC, packet.0[3]);
        assert_eq!([49, 0x4E, 49, 52], packet.0[12..16]);

        for (i, byte) in packet.0.iter().enumerate() {
            if !(0..4).contains(&i) && !(12..16).contains(&i) {
                assert_eq!(0, *byte, "byte {i} is not zero");
            }
        }
    }

    #[test]
    fn test_reply_decoding() {
        let mut packet = RawNtpPacket::default();
        packet.0[40..44].copy_from_slice(&[0xE4, 0x2D, 0x2F, 0xA4]);

        assert_eq!(3_828_166_564, packet.tx_seconds());
        assert_eq!(1_619_177_764, packet.unix_seconds());
    }

    #[test]
    fn test_reply_fraction_ignored() {
        let mut packet = RawNtpPacket::default();
        packet.0[40..48]
            .copy_from_slice(&[0xE4, 0x2D, 0x2F, 0xA4, 0xFF, 0xFF, 0xFF, 0xFF]);

        assert_eq!(1_619_177_764, packet.unix_seconds());
    }

    #[test]
    fn test_empty_reply_is_zero() {
        assert_eq!(0, RawNtpPacket::default().unix_seconds());

        let mut packet = RawNtpPacket::default();
        packet.0[40..44].copy_from_slice(&NTP_TIMESTAMP_DELTA.to_be_bytes());
        assert_eq!(0, packet.unix_seconds());
    }

    #[test]
    fn test_era_rollover() {
        let mut packet = RawNtpPacket::default();

        // 2036-02-07 06:28:15 UTC, last second of era 0
        packet.0[40..44].copy_from_slice(&u32::MAX.to_be_bytes());
        assert_eq!(2_085_978_495, packet.unix_seconds());

        // 2036-02-07 06:28:17 UTC, era 1
        packet.0[40..44].copy_from_slice(&1u32.to_be_bytes());
        assert_eq!(2_085_978_497, packet.unix_seconds());

        // 2040-01-01 00:00:00 UTC
        packet.0[40..44].copy_from_slice(&123_010_304u32.to_be_bytes());
        assert_eq!(2_208_988_800, packet.unix_seconds());
    }
}
