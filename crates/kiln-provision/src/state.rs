use std::fmt;

/// Where a provisioning run currently is.
///
/// ```text
/// NotStarted -> CheckingChecksum -> Downloading -> Extracting -> Ready
///                                -> Ready
///      (any) -> Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ProvisioningState {
    NotStarted = 0,
    CheckingChecksum = 1,
    Downloading = 2,
    Extracting = 3,
    Ready = 4,
    Failed = 5,
}

impl ProvisioningState {
    pub(crate) fn from_u8(raw: u8) -> Self {
        match raw {
            1 => Self::CheckingChecksum,
            2 => Self::Downloading,
            3 => Self::Extracting,
            4 => Self::Ready,
            5 => Self::Failed,
            _ => Self::NotStarted,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Ready | Self::Failed)
    }

    pub fn can_transition_to(self, next: Self) -> bool {
        use ProvisioningState::*;
        match (self, next) {
            (Ready | Failed, _) => false,
            (_, Failed) => true,
            (NotStarted, CheckingChecksum) => true,
            (CheckingChecksum, Downloading | Ready) => true,
            (Downloading, Extracting) => true,
            (Extracting, Ready) => true,
            _ => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotStarted => "not-started",
            Self::CheckingChecksum => "checking-checksum",
            Self::Downloading => "downloading",
            Self::Extracting => "extracting",
            Self::Ready => "ready",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for ProvisioningState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::ProvisioningState::*;
    use super::*;

    #[test]
    fn raw_round_trip() {
        for state in [NotStarted, CheckingChecksum, Downloading, Extracting, Ready, Failed] {
            assert_eq!(ProvisioningState::from_u8(state as u8), state);
        }
    }

    #[test]
    fn legal_transitions() {
        assert!(NotStarted.can_transition_to(CheckingChecksum));
        assert!(CheckingChecksum.can_transition_to(Ready));
        assert!(Extracting.can_transition_to(Failed));
        assert!(!NotStarted.can_transition_to(Downloading));
        assert!(!Ready.can_transition_to(Failed));
        assert!(!Failed.can_transition_to(CheckingChecksum));
    }
}
