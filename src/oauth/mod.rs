// Google and Facebook sign-in: provider endpoints, the code exchange and
// mapping a provider identity onto a local account.

mod client;
mod profile;
mod provider;
mod resolve;

pub use self::client::{OAuthClient, is_placeholder};
pub use self::profile::{
    OAuthProfile, dev_profile, parse_facebook_profile, parse_google_profile, parse_profile,
    parse_token_response,
};
pub use self::provider::Provider;
pub use self::resolve::{generate_unique_username, plan_link, resolve_user, username_base};
