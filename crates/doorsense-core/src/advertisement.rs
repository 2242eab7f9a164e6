//! Legacy BLE advertising data framing.
//!
//! The radio receives the complete advertising data, not just the BTHome
//! service data. It is made of three AD structures, each prefixed with its
//! length and type:
//!
//! | AD type | Content |
//! |---|---|
//! | `0x01` Flags | LE General Discoverable, BR/EDR not supported |
//! | `0x09` / `0x08` Local name | device name, shortened if it does not fit |
//! | `0x16` Service data (16-bit UUID) | the BTHome payload |

use heapless::Vec;

use crate::error::AdvertisementError;

/// Maximum size of legacy advertising data.
pub const MAX_ADV_DATA_LEN: usize = 31;

pub type AdvertisingData = Vec<u8, MAX_ADV_DATA_LEN>;

const AD_TYPE_FLAGS: u8 = 0x01;
const AD_TYPE_SHORTENED_NAME: u8 = 0x08;
const AD_TYPE_COMPLETE_NAME: u8 = 0x09;
const AD_TYPE_SERVICE_DATA_16: u8 = 0x16;

const FLAG_LE_GENERAL_DISCOVERABLE: u8 = 0x02;
const FLAG_BR_EDR_NOT_SUPPORTED: u8 = 0x04;

/// Length + type header of an AD structure.
const AD_HEADER_LEN: usize = 2;
const FLAGS_AD_LEN: usize = AD_HEADER_LEN + 1;

/// Frame `service_data` (UUID included) together with the flags and device
/// name.
///
/// The service data always wins the space: the name is shortened, or dropped
/// entirely, to make it fit.
pub fn build(name: &str, service_data: &[u8]) -> Result<AdvertisingData, AdvertisementError> {
    let service_ad_len = AD_HEADER_LEN + service_data.len();
    let needed = FLAGS_AD_LEN + service_ad_len;
    if needed > MAX_ADV_DATA_LEN {
        return Err(AdvertisementError::TooLong {
            needed,
            available: MAX_ADV_DATA_LEN,
        });
    }

    let mut data = AdvertisingData::new();
    push_ad(
        &mut data,
        AD_TYPE_FLAGS,
        &[FLAG_LE_GENERAL_DISCOVERABLE | FLAG_BR_EDR_NOT_SUPPORTED],
    )?;

    let name_space = MAX_ADV_DATA_LEN - needed;
    if !name.is_empty() && name_space > AD_HEADER_LEN {
        let mut len = name.len().min(name_space - AD_HEADER_LEN);
        while !name.is_char_boundary(len) {
            len -= 1;
        }

        if len > 0 {
            let ad_type = if len == name.len() {
                AD_TYPE_COMPLETE_NAME
            } else {
                AD_TYPE_SHORTENED_NAME
            };
            push_ad(&mut data, ad_type, &name.as_bytes()[..len])?;
        }
    }

    push_ad(&mut data, AD_TYPE_SERVICE_DATA_16, service_data)?;

    Ok(data)
}

fn push_ad(
    data: &mut AdvertisingData,
    ad_type: u8,
    content: &[u8],
) -> Result<(), AdvertisementError> {
    let needed = data.len() + AD_HEADER_LEN + content.len();
    let overflow = AdvertisementError::TooLong {
        needed,
        available: MAX_ADV_DATA_LEN,
    };

    // The length byte counts the type byte plus the content
    data.push((content.len() + 1) as u8).map_err(|_| overflow)?;
    data.push(ad_type).map_err(|_| overflow)?;
    data.extend_from_slice(content).map_err(|_| overflow)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SERVICE_DATA: [u8; 9] = [0xD2, 0xFC, 0x44, 0x2D, 0x00, 0x2D, 0x01, 0x01, 0x64];

    #[test]
    fn test_full_advertisement() {
        let data = build("Door", &SERVICE_DATA).unwrap();

        assert_eq!(&data[..3], &[0x02, 0x01, 0x06]);
        assert_eq!(&data[3..9], &[0x05, 0x09, b'D', b'o', b'o', b'r']);
        assert_eq!(&data[9..11], &[0x0A, 0x16]);
        assert_eq!(&data[11..], &SERVICE_DATA);
    }

    #[test]
    fn test_long_name_is_shortened() {
        let data = build("A very long door sensor name", &SERVICE_DATA).unwrap();

        assert_eq!(data.len(), MAX_ADV_DATA_LEN);
        // 31 - 3 (flags) - 11 (service data) - 2 (name header)
        assert_eq!(data[3], 15 + 1);
        assert_eq!(data[4], AD_TYPE_SHORTENED_NAME);
        assert_eq!(&data[5..20], b"A very long doo");
        assert_eq!(&data[20..22], &[0x0A, 0x16]);
        assert_eq!(&data[22..], &SERVICE_DATA);
    }

    #[test]
    fn test_name_truncated_on_char_boundary() {
        // 14 ASCII bytes followed by a two byte character crossing the limit
        let data = build("abcdefghijklmnä", &SERVICE_DATA).unwrap();
        assert_eq!(data[3], 14 + 1);
        assert_eq!(&data[5..19], b"abcdefghijklmn");
    }

    #[test]
    fn test_empty_name_is_omitted() {
        let data = build("", &SERVICE_DATA).unwrap();
        assert_eq!(data.len(), 3 + 2 + SERVICE_DATA.len());
        assert_eq!(data[4], AD_TYPE_SERVICE_DATA_16);
    }

    #[test]
    fn test_oversized_service_data() {
        let service_data = [0u8; 27];
        assert_eq!(
            build("Door", &service_data),
            Err(AdvertisementError::TooLong {
                needed: 32,
                available: MAX_ADV_DATA_LEN
            })
        );
    }
}
