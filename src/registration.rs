use crate::error::Error;

/// Network registration codes reported in the second field of a `+CREG`
/// reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegistrationStatus {
    Disabled,
    HomeNetwork,
    Searching,
    Denied,
    NoSignal,
    Roaming,
    HomeSmsOnly,
    RoamingSmsOnly,
}

impl RegistrationStatus {
    /// Only full home or roaming service counts as registered.
    pub fn registered(self) -> bool {
        matches!(self, Self::HomeNetwork | Self::Roaming)
    }

    /// Parse the payload of a `+CREG: <n>,<stat>[,...]` reply.
    ///
    /// The first field is the URC reporting mode and is ignored here.
    pub(crate) fn from_reply(reply: &[u8]) -> Result<Self, Error> {
        let stat = reply
            .split(|b| *b == b',')
            .nth(1)
            .and_then(|field| field.first())
            .ok_or(Error::InvalidResponse)?;
        Self::from_code(*stat)
    }

    fn from_code(code: u8) -> Result<Self, Error> {
        Ok(match code {
            b'0' => Self::Disabled,
            b'1' => Self::HomeNetwork,
            b'2' => Self::Searching,
            b'3' => Self::Denied,
            b'4' => Self::NoSignal,
            b'5' => Self::Roaming,
            b'6' => Self::HomeSmsOnly,
            b'7' => Self::RoamingSmsOnly,
            _ => return Err(Error::InvalidResponse),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stat_codes() {
        assert_eq!(
            RegistrationStatus::from_reply(b"0,0"),
            Ok(RegistrationStatus::Disabled)
        );
        assert_eq!(
            RegistrationStatus::from_reply(b"0,1"),
            Ok(RegistrationStatus::HomeNetwork)
        );
        assert_eq!(
            RegistrationStatus::from_reply(b"0,2"),
            Ok(RegistrationStatus::Searching)
        );
        assert_eq!(
            RegistrationStatus::from_reply(b"0,3"),
            Ok(RegistrationStatus::Denied)
        );
        assert_eq!(
            RegistrationStatus::from_reply(b"0,4"),
            Ok(RegistrationStatus::NoSignal)
        );
        assert_eq!(
            RegistrationStatus::from_reply(b"0,5"),
            Ok(RegistrationStatus::Roaming)
        );
        assert_eq!(
            RegistrationStatus::from_reply(b"0,6"),
            Ok(RegistrationStatus::HomeSmsOnly)
        );
        assert_eq!(
            RegistrationStatus::from_reply(b"0,7"),
            Ok(RegistrationStatus::RoamingSmsOnly)
        );
    }

    #[test]
    fn extended_reply_still_parses() {
        // +CREG=2 style reply with location fields appended
        assert_eq!(
            RegistrationStatus::from_reply(b"2,5,\"1A2B\",\"0C3D7E4F\",7"),
            Ok(RegistrationStatus::Roaming)
        );
    }

    #[test]
    fn only_home_and_roaming_are_registered() {
        assert!(RegistrationStatus::HomeNetwork.registered());
        assert!(RegistrationStatus::Roaming.registered());
        for status in [
            RegistrationStatus::Disabled,
            RegistrationStatus::Searching,
            RegistrationStatus::Denied,
            RegistrationStatus::NoSignal,
            RegistrationStatus::HomeSmsOnly,
            RegistrationStatus::RoamingSmsOnly,
        ] {
            assert!(!status.registered());
        }
    }

    #[test]
    fn malformed_replies_are_rejected() {
        assert_eq!(
            RegistrationStatus::from_reply(b""),
            Err(Error::InvalidResponse)
        );
        assert_eq!(
            RegistrationStatus::from_reply(b"0"),
            Err(Error::InvalidResponse)
        );
        assert_eq!(
            RegistrationStatus::from_reply(b"0,x"),
            Err(Error::InvalidResponse)
        );
        assert_eq!(
            RegistrationStatus::from_reply(b"0,8"),
            Err(Error::InvalidResponse)
        );
    }
}
