use std::convert::TryFrom;
use std::fmt;
use std::str::FromStr;

/// The common datatype that all packet structures share to represent their data
pub type PacketData = Vec<u8>;

/// Marker for buffer-backed packet views
pub trait Packet: Clone {}

pub const ARP_ETHER_TYPE: u16 = 0x0806;
pub const IPV4_ETHER_TYPE: u16 = 0x0800;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MacAddr {
    pub bytes: [u8; 6],
}

impl MacAddr {
    pub const BROADCAST: MacAddr = MacAddr { bytes: [0xff; 6] };
    pub const ZERO: MacAddr = MacAddr { bytes: [0; 6] };

    pub fn new(bytes: [u8; 6]) -> MacAddr {
        MacAddr { bytes }
    }

    pub fn is_broadcast(&self) -> bool {
        *self == MacAddr::BROADCAST
    }
}

impl TryFrom<&[u8]> for MacAddr {
    type Error = &'static str;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let bytes = <[u8; 6]>::try_from(bytes).map_err(|_| "MAC address must be 6 bytes")?;
        Ok(MacAddr::new(bytes))
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let b = &self.bytes;
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            b[0], b[1], b[2], b[3], b[4], b[5]
        )
    }
}

impl FromStr for MacAddr {
    type Err = &'static str;

    /// Parses the colon separated hex form, e.g. `de:ad:be:ef:00:01`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; 6];
        let mut octets = s.split(':');
        for byte in bytes.iter_mut() {
            let octet = octets.next().ok_or("MAC address has fewer than 6 octets")?;
            if octet.is_empty() || octet.len() > 2 {
                return Err("MAC address octet is malformed");
            }
            *byte = u8::from_str_radix(octet, 16).map_err(|_| "MAC address octet is not hex")?;
        }
        if octets.next().is_some() {
            return Err("MAC address has more than 6 octets");
        }
        Ok(MacAddr::new(bytes))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IpProtocol {
    ICMP,
    TCP,
    UDP,
    Other(u8),
}

impl From<u8> for IpProtocol {
    fn from(protocol: u8) -> Self {
        match protocol {
            1 => IpProtocol::ICMP,
            6 => IpProtocol::TCP,
            17 => IpProtocol::UDP,
            other => IpProtocol::Other(other),
        }
    }
}

impl From<IpProtocol> for u8 {
    fn from(protocol: IpProtocol) -> Self {
        match protocol {
            IpProtocol::ICMP => 1,
            IpProtocol::TCP => 6,
            IpProtocol::UDP => 17,
            IpProtocol::Other(other) => other,
        }
    }
}

/// One's complement sum of 16 bit words, folded and inverted (RFC 1071).
/// An odd trailing byte is padded with zero.
pub fn internet_checksum(data: &[u8]) -> u16 {
    let mut sum = data.chunks(2).fold(0u32, |acc, word| {
        let hi = u32::from(word[0]) << 8;
        let lo = word.get(1).copied().map(u32::from).unwrap_or(0);
        acc + (hi | lo)
    });
    while sum >> 16 != 0 {
        sum = (sum & 0xFFFF) + (sum >> 16);
    }
    !(sum as u16)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mac_display_and_parse() {
        let mac = MacAddr::new([0xde, 0xad, 0xbe, 0xef, 0x00, 0x01]);
        assert_eq!(mac.to_string(), "de:ad:be:ef:00:01");
        assert_eq!("de:ad:be:ef:00:01".parse::<MacAddr>(), Ok(mac));
        assert!("de:ad:be:ef:00".parse::<MacAddr>().is_err());
        assert!("de:ad:be:ef:00:01:02".parse::<MacAddr>().is_err());
        assert!("zz:ad:be:ef:00:01".parse::<MacAddr>().is_err());
    }

    #[test]
    fn protocol_numbers() {
        assert_eq!(IpProtocol::from(17), IpProtocol::UDP);
        assert_eq!(u8::from(IpProtocol::ICMP), 1);
        assert_eq!(IpProtocol::from(89), IpProtocol::Other(89));
    }

    #[test]
    fn checksum_of_known_header() {
        // Header from RFC 1071 style worked example, checksum field zeroed
        let header = [
            0x45, 0x00, 0x00, 0x14, 0x00, 0x00, 0x40, 0x00, 0x40, 0x11, 0x00, 0x00, 0xc0, 0xa8,
            0x00, 0x01, 0xc0, 0xa8, 0x00, 0xc7,
        ];
        assert_eq!(internet_checksum(&header), 0xb8c0);
    }

    #[test]
    fn checksum_odd_length() {
        assert_eq!(internet_checksum(&[0x01]), !0x0100);
    }
}
