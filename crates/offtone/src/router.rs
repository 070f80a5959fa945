//! # Request Router
//!
//! Classifies every intercepted request into exactly one request class using
//! an ordered, first-match-wins rule list built once at bootstrap. Order is
//! significant: the audio-download endpoint must be matched before the generic
//! API prefix or it is never reached.

use tracing::trace;

use crate::ProxyConfig;
use crate::request::{Destination, ProxyRequest};
use crate::store::StoreKind;

/// The caching policy a route dispatches to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Policy {
    NetworkFirst,
    CacheFirst,
    /// Cache-first with multi-variant key matching and a synthesized offline
    /// placeholder instead of propagated failures
    CacheFirstAudioFallback,
    StaleWhileRevalidate,
}

/// One classification rule: predicate, policy, target store
pub struct Route {
    pub name: &'static str,
    pub policy: Policy,
    pub store: StoreKind,
    matcher: Box<dyn Fn(&ProxyRequest) -> bool + Send + Sync>,
}

impl Route {
    pub fn new(
        name: &'static str,
        policy: Policy,
        store: StoreKind,
        matcher: impl Fn(&ProxyRequest) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            name,
            policy,
            store,
            matcher: Box::new(matcher),
        }
    }

    pub fn matches(&self, request: &ProxyRequest) -> bool {
        (self.matcher)(request)
    }
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("name", &self.name)
            .field("policy", &self.policy)
            .field("store", &self.store)
            .finish()
    }
}

const AUDIO_EXTENSIONS: &[&str] = &["mp3", "m4a", "aac", "ogg", "opus", "wav", "flac"];
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "svg", "ico", "avif"];

fn has_extension(request: &ProxyRequest, extensions: &[&str]) -> bool {
    request
        .path_extension()
        .is_some_and(|ext| extensions.contains(&ext.as_str()))
}

/// Ordered first-match-wins classification table
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    /// Build a router from an explicit, already ordered rule list.
    ///
    /// The last route must match every request; `standard` guarantees that
    /// with its catch-all default.
    pub fn new(routes: Vec<Route>) -> Self {
        Self { routes }
    }

    /// The standard classification table
    pub fn standard(config: &ProxyConfig) -> Self {
        let api_prefix = config.api_prefix.clone();
        let audio_endpoint_prefix = format!("{}audio/", config.api_prefix);

        let download_prefix = audio_endpoint_prefix.clone();
        let player_prefix = audio_endpoint_prefix;
        let generic_prefix = api_prefix;

        Self::new(vec![
            Route::new(
                "audio-download",
                Policy::CacheFirstAudioFallback,
                StoreKind::Audio,
                move |req| {
                    req.url.path().starts_with(&download_prefix) && req.path_ends_with("/download")
                },
            ),
            Route::new(
                "audio-player",
                Policy::NetworkFirst,
                StoreKind::Api,
                move |req| {
                    req.url.path().starts_with(&player_prefix) && req.path_ends_with("/player")
                },
            ),
            Route::new("api", Policy::NetworkFirst, StoreKind::Api, move |req| {
                req.url.path().starts_with(&generic_prefix)
            }),
            Route::new("audio", Policy::CacheFirst, StoreKind::Audio, |req| {
                req.destination == Destination::Audio
                    || has_extension(req, AUDIO_EXTENSIONS)
                    || req.url.path().starts_with("/audio/")
            }),
            Route::new("image", Policy::CacheFirst, StoreKind::Image, |req| {
                req.destination == Destination::Image || has_extension(req, IMAGE_EXTENSIONS)
            }),
            Route::new(
                "shell-asset",
                Policy::StaleWhileRevalidate,
                StoreKind::Shell,
                |req| {
                    matches!(req.destination, Destination::Script | Destination::Style)
                        || has_extension(req, &["js", "css"])
                },
            ),
            Route::new(
                "navigation",
                Policy::NetworkFirst,
                StoreKind::Shell,
                |req| req.is_navigation(),
            ),
            Route::new("default", Policy::NetworkFirst, StoreKind::Shell, |_| true),
        ])
    }

    /// Classify a request into its first matching route
    pub fn classify(&self, request: &ProxyRequest) -> &Route {
        let route = self
            .routes
            .iter()
            .find(|route| route.matches(request))
            .unwrap_or_else(|| self.routes.last().expect("router has no routes"));

        trace!(url = %request.url, route = route.name, "request classified");
        route
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn router() -> Router {
        Router::standard(&ProxyConfig::default())
    }

    fn name_of(router: &Router, url: &str) -> &'static str {
        router.classify(&ProxyRequest::parse(url).unwrap()).name
    }

    #[test]
    fn test_audio_download_precedes_api_prefix() {
        let r = router();
        assert_eq!(name_of(&r, "http://o.test/api/audio/5/download"), "audio-download");
        assert_eq!(name_of(&r, "http://o.test/api/audio/5/download/"), "audio-download");
        assert_eq!(name_of(&r, "http://o.test/api/audio/5/download?s=1"), "audio-download");
    }

    #[test]
    fn test_audio_player_precedes_api_prefix() {
        let r = router();
        let route = r.classify(&ProxyRequest::parse("http://o.test/api/audio/5/player").unwrap());
        assert_eq!(route.name, "audio-player");
        assert_eq!(route.policy, Policy::NetworkFirst);
        assert_eq!(route.store, StoreKind::Api);
    }

    #[test]
    fn test_generic_api() {
        let r = router();
        assert_eq!(name_of(&r, "http://o.test/api/playlists/"), "api");
        assert_eq!(name_of(&r, "http://o.test/api/audio/5/"), "api");
    }

    #[test]
    fn test_audio_by_extension_and_destination() {
        let r = router();
        assert_eq!(name_of(&r, "http://o.test/media/track.mp3"), "audio");

        let req = ProxyRequest::parse("http://o.test/stream/77")
            .unwrap()
            .with_destination(Destination::Audio);
        assert_eq!(r.classify(&req).name, "audio");
    }

    #[test]
    fn test_image() {
        let r = router();
        assert_eq!(name_of(&r, "http://o.test/covers/album.webp"), "image");
    }

    #[test]
    fn test_shell_assets_use_stale_while_revalidate() {
        let r = router();
        let route = r.classify(&ProxyRequest::parse("http://o.test/static/js/main.js").unwrap());
        assert_eq!(route.name, "shell-asset");
        assert_eq!(route.policy, Policy::StaleWhileRevalidate);
        assert_eq!(route.store, StoreKind::Shell);
    }

    #[test]
    fn test_navigation_and_default() {
        let r = router();
        let nav = ProxyRequest::parse("http://o.test/playlists/42").unwrap();
        assert_eq!(r.classify(&nav.clone().with_destination(Destination::Document)).name, "navigation");
        assert_eq!(r.classify(&nav).name, "default");
    }
}
