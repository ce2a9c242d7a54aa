use std::fmt;

/// What went wrong.
///
/// The web form and the CLI pick their banner from this: a missing key,
/// missing input and a failed persona each read differently to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    Unexpected,
    /// e.g. a meme model id outside the known set
    Unsupported,
    /// Persona catalog or provider settings are unusable
    ConfigInvalid,

    CredentialMissing,
    /// Provider answered 401/403
    AuthenticationFailed,
    /// Support request with neither feelings nor screenshots
    InputMissing,

    /// One upload could not be written to the staging directory
    ImageStagingFailed,
    /// Aborts the whole support run
    PersonaInvocationFailed,
    AutomationFailed,

    /// The model call went through but gave nothing usable
    InferenceFailed,
    ProviderUnavailable,
    RateLimited,

    FileNotFound,
    PermissionDenied,
    IoFailed,
    NetworkFailed,

    ParseFailed,
    InvalidArgument,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        use ErrorKind::*;
        match self {
            Unexpected => "Unexpected",
            Unsupported => "Unsupported",
            ConfigInvalid => "ConfigInvalid",
            CredentialMissing => "CredentialMissing",
            AuthenticationFailed => "AuthenticationFailed",
            InputMissing => "InputMissing",
            ImageStagingFailed => "ImageStagingFailed",
            PersonaInvocationFailed => "PersonaInvocationFailed",
            AutomationFailed => "AutomationFailed",
            InferenceFailed => "InferenceFailed",
            ProviderUnavailable => "ProviderUnavailable",
            RateLimited => "RateLimited",
            FileNotFound => "FileNotFound",
            PermissionDenied => "PermissionDenied",
            IoFailed => "IoFailed",
            NetworkFailed => "NetworkFailed",
            ParseFailed => "ParseFailed",
            InvalidArgument => "InvalidArgument",
        }
    }

    /// Transient provider or network trouble
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorKind::InferenceFailed
                | ErrorKind::NetworkFailed
                | ErrorKind::RateLimited
                | ErrorKind::ProviderUnavailable
        )
    }

    /// Problems that stop a workflow before the first persona runs
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            ErrorKind::CredentialMissing | ErrorKind::AuthenticationFailed | ErrorKind::ConfigInvalid
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_matches_variant_name() {
        assert_eq!(ErrorKind::CredentialMissing.to_string(), "CredentialMissing");
        assert_eq!(format!("{:?}", ErrorKind::PersonaInvocationFailed), ErrorKind::PersonaInvocationFailed.as_str());
    }

    #[test]
    fn test_retryable_kinds() {
        assert!(ErrorKind::NetworkFailed.is_retryable());
        assert!(ErrorKind::RateLimited.is_retryable());
        assert!(!ErrorKind::CredentialMissing.is_retryable());
        assert!(!ErrorKind::ImageStagingFailed.is_retryable());
    }

    #[test]
    fn test_configuration_kinds() {
        assert!(ErrorKind::CredentialMissing.is_configuration());
        assert!(ErrorKind::AuthenticationFailed.is_configuration());
        assert!(!ErrorKind::PersonaInvocationFailed.is_configuration());
    }
}
