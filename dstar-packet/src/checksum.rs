//! Internet checksum (RFC 1071) for IPv4 headers and UDP datagrams

/// Calculates the Internet Checksum as defined in RFC 1071.
///
/// The data is summed as big-endian 16-bit words, an odd trailing byte is
/// padded with zero, and the one's complement of the folded sum is returned.
pub fn internet_checksum(data: &[u8]) -> u16 {
    !fold(accumulate(0, data))
}

/// UDP checksum including the IPv4 pseudo-header.
///
/// `segment` is the UDP header (with a zeroed checksum field) followed by
/// the payload. A computed value of zero is transmitted as `0xFFFF`, since
/// zero on the wire means "no checksum".
pub fn udp_checksum(src_ip: &[u8; 4], dst_ip: &[u8; 4], protocol: u8, segment: &[u8]) -> u16 {
    let mut pseudo_header = [0u8; 12];
    pseudo_header[0..4].copy_from_slice(src_ip);
    pseudo_header[4..8].copy_from_slice(dst_ip);
    pseudo_header[9] = protocol;
    pseudo_header[10..12].copy_from_slice(&(segment.len() as u16).to_be_bytes());

    let sum = accumulate(accumulate(0, &pseudo_header), segment);
    match !fold(sum) {
        0 => 0xFFFF,
        checksum => checksum,
    }
}

/// Validates a buffer whose checksum field is already filled in
pub fn validate_checksum(data: &[u8]) -> bool {
    let result = internet_checksum(data);
    result == 0 || result == 0xFFFF
}

fn accumulate(mut sum: u32, data: &[u8]) -> u32 {
    let mut chunks = data.chunks_exact(2);
    for chunk in &mut chunks {
        sum += u16::from_be_bytes([chunk[0], chunk[1]]) as u32;
    }

    if let Some(&byte) = chunks.remainder().first() {
        sum += (byte as u32) << 8;
    }

    sum
}

fn fold(mut sum: u32) -> u16 {
    while (sum >> 16) != 0 {
        sum = (sum & 0xFFFF) + (sum >> 16);
    }
    sum as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_internet_checksum_empty() {
        assert_eq!(internet_checksum(&[]), 0xFFFF);
    }

    #[test]
    fn test_internet_checksum_rfc1071_sample() {
        // Sum of the RFC 1071 example words is 0xddf2
        let data = [0x00, 0x01, 0xf2, 0x03, 0xf4, 0xf5, 0xf6, 0xf7];
        assert_eq!(internet_checksum(&data), !0xddf2u16);
    }

    #[test]
    fn test_known_ipv4_header() {
        // Classic example header with checksum 0xb861
        let mut header = [
            0x45, 0x00, 0x00, 0x73, 0x00, 0x00, 0x40, 0x00, 0x40, 0x11, 0x00, 0x00, 0xc0, 0xa8,
            0x00, 0x01, 0xc0, 0xa8, 0x00, 0xc7,
        ];
        assert_eq!(internet_checksum(&header), 0xb861);

        header[10] = 0xb8;
        header[11] = 0x61;
        assert!(validate_checksum(&header));
    }

    #[test]
    fn test_udp_checksum_validates() {
        let src = [0, 0, 0, 0];
        let dst = [255, 255, 255, 255];
        let mut segment = vec![0x00, 0x44, 0x00, 0x43, 0x00, 0x0b, 0x00, 0x00, 0xde, 0xad, 0x01];

        let checksum = udp_checksum(&src, &dst, 17, &segment);
        segment[6..8].copy_from_slice(&checksum.to_be_bytes());

        // Re-summing with the checksum in place yields all ones
        let sum = accumulate(
            accumulate(0, &[0, 0, 0, 0, 255, 255, 255, 255, 0, 17, 0, 11]),
            &segment,
        );
        assert_eq!(fold(sum), 0xFFFF);
    }
}
