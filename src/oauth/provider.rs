use std::fmt;
use std::str::FromStr;

/// Supported social login providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Google,
    Facebook,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Google => "google",
            Provider::Facebook => "facebook",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Provider::Google => "Google",
            Provider::Facebook => "Facebook",
        }
    }

    pub fn authorize_endpoint(&self) -> &'static str {
        match self {
            Provider::Google => "https://accounts.google.com/o/oauth2/v2/auth",
            Provider::Facebook => "https://www.facebook.com/v18.0/dialog/oauth",
        }
    }

    pub fn token_endpoint(&self) -> &'static str {
        match self {
            Provider::Google => "https://oauth2.googleapis.com/token",
            Provider::Facebook => "https://graph.facebook.com/v18.0/oauth/access_token",
        }
    }

    pub fn profile_endpoint(&self) -> &'static str {
        match self {
            Provider::Google => "https://www.googleapis.com/oauth2/v2/userinfo",
            Provider::Facebook => "https://graph.facebook.com/me?fields=id,first_name,last_name,email,picture.type(large)",
        }
    }

    pub fn scope(&self) -> &'static str {
        match self {
            Provider::Google => "openid email profile",
            Provider::Facebook => "email,public_profile",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "google" => Ok(Provider::Google),
            "facebook" => Ok(Provider::Facebook),
            other => Err(format!("unknown OAuth provider '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_path_segment() {
        assert_eq!("google".parse::<Provider>(), Ok(Provider::Google));
        assert_eq!("facebook".parse::<Provider>(), Ok(Provider::Facebook));
        assert!("github".parse::<Provider>().is_err());
    }
}
