use std::sync::Arc;

use sftools::auth::{FileProfileStore, SfConfig, PRODUCTION_PROFILE};
use sftools::query::{Session, Sf, SfOptions};

/// A client for the integration test profile.
///
/// Panics with instructions if the profile is not usable. Tests should
/// fail, not skip, when the org is unavailable.
pub fn connect(options: SfOptions) -> Sf {
    let profile = std::env::var("SF_PROFILE").unwrap_or_else(|_| PRODUCTION_PROFILE.to_string());
    let store = FileProfileStore::new().expect("no profile directory");

    let config = SfConfig::load(&store, &profile)
        .unwrap_or_else(|e| panic!("Cannot load profile '{profile}': {e}"));
    if config.refresh_token.is_none() {
        panic!(
            "\n\nProfile '{profile}' has no refresh token.\n\
             Run `sfq --profile {profile} login` first, or point SF_PROFILE \
             at a profile that has one.\n\n"
        );
    }

    let session = Session::from_config(&config)
        .unwrap_or_else(|e| panic!("Invalid profile '{profile}': {e}"))
        .with_store(Arc::new(store), profile);
    Sf::new(session, options)
}
