//! 802.11 information element decoding.
//!
//! `NL80211_BSS_INFORMATION_ELEMENTS` carries the raw elements of the last
//! beacon or probe response. Only the SSID element is decoded, and only when
//! it is the first element of the blob.

/// Element id of the SSID element.
pub const WLAN_EID_SSID: u8 = 0;

/// Maximum SSID length in bytes.
pub const SSID_MAX_LEN: usize = 32;

/// Extract the SSID bytes from an information-element blob.
///
/// Returns `None` when the blob is empty, does not start with an SSID
/// element, declares more than 32 bytes or declares more bytes than it
/// carries. A hidden network yields `Some(&[])`.
///
/// ```
/// use nlscan::nl80211::ie::parse_ssid;
///
/// assert_eq!(parse_ssid(&[0, 3, b'A', b'B', b'C']), Some(&b"ABC"[..]));
/// assert_eq!(parse_ssid(&[1, 3, b'A', b'B', b'C']), None);
/// ```
pub fn parse_ssid(ies: &[u8]) -> Option<&[u8]> {
    let [id, len, rest @ ..] = ies else {
        return None;
    };
    let len = *len as usize;

    if *id != WLAN_EID_SSID || len > SSID_MAX_LEN || len > rest.len() {
        return None;
    }

    Some(&rest[..len])
}
